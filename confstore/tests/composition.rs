//! Layered sources, nil safety, and change detection.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use anyhow::{Result, anyhow, ensure};
use confstore::{
    Bind, CompositeStorage, FlatStorage, PathSyntax, Storage, StorageExt, TreeStorage,
    ValidatingStorage, storage_eq,
};
use rstest::{fixture, rstest};
use serde_json::json;

#[derive(Clone, Debug, Default, PartialEq, Bind)]
struct Auth {
    user: String,
}

#[derive(Clone, Debug, Default, PartialEq, Bind)]
struct Settings {
    name: String,
    port: u16,
    debug: bool,
    auth: Option<Auth>,
    features: BTreeMap<String, bool>,
    peers: Vec<String>,
}

fn shared(storage: impl Storage + 'static) -> Arc<dyn Storage> {
    Arc::new(storage)
}

fn seeded() -> Settings {
    Settings {
        name: "seed".to_owned(),
        port: 1,
        debug: true,
        auth: Some(Auth {
            user: "root".to_owned(),
        }),
        features: BTreeMap::from([("beta".to_owned(), true)]),
        peers: vec!["p1".to_owned()],
    }
}

#[fixture]
fn layers() -> CompositeStorage {
    let file = TreeStorage::new(json!({
        "app": {
            "name": "from-file",
            "port": 8000,
            "features": {"beta": true, "gamma": false},
            "peers": ["a", "b"],
        },
    }));
    let env = FlatStorage::new(
        [
            ("APP_PORT", json!("9000")),
            ("APP_FEATURES_gamma", json!("true")),
            ("APP_AUTH_USER", json!("svc")),
        ],
        PathSyntax::env(),
    );
    CompositeStorage::new([Some(shared(file)), None, Some(shared(env))])
}

#[rstest]
fn later_sources_override_only_what_they_supply(layers: CompositeStorage) -> Result<()> {
    let settings: Settings = layers.sub("app").get()?;
    ensure!(settings.name == "from-file", "{}", settings.name);
    ensure!(settings.port == 9000, "{}", settings.port);
    ensure!(
        settings.features
            == BTreeMap::from([("beta".to_owned(), true), ("gamma".to_owned(), true)]),
        "{:?}",
        settings.features
    );
    ensure!(settings.peers == ["a", "b"], "{:?}", settings.peers);
    ensure!(
        settings.auth == Some(Auth { user: "svc".to_owned() }),
        "{:?}",
        settings.auth
    );
    Ok(())
}

#[rstest]
#[case::tree(shared(TreeStorage::new(json!({"app": {}}))))]
#[case::flat(shared(FlatStorage::new([("APP_PORT", json!("1"))], PathSyntax::env())))]
#[case::composite(shared(CompositeStorage::new([
    Some(shared(TreeStorage::new(json!({"other": 1})))),
    None,
])))]
#[case::validating(shared(ValidatingStorage::new(shared(TreeStorage::new(json!({}))))))]
fn missing_paths_never_touch_destinations(#[case] storage: Arc<dyn Storage>) -> Result<()> {
    let missing = storage.sub("does.not.exist");
    ensure!(missing.is_nil(), "expected nil sub-storage");
    let further = missing.sub("deeper[3]");
    ensure!(further.is_nil(), "nil must stay nil when chained");

    let mut record = seeded();
    let mut absent: Option<Auth> = None;
    let mut present = Some(Auth { user: "kept".to_owned() });
    let mut scalar = 42_u16;
    let mut map = BTreeMap::from([("k".to_owned(), 1_i32)]);
    let mut list = vec![1_u8, 2];
    missing.convert_to(&mut record)?;
    further.convert_to(&mut absent)?;
    missing.convert_to(&mut present)?;
    missing.convert_to(&mut scalar)?;
    missing.convert_to(&mut map)?;
    missing.convert_to(&mut list)?;
    ensure!(record == seeded(), "record mutated: {record:?}");
    ensure!(absent.is_none(), "nil allocated an option");
    ensure!(present.is_some_and(|auth| auth.user == "kept"), "option mutated");
    ensure!(scalar == 42 && map.len() == 1 && list == [1, 2], "scalars mutated");
    Ok(())
}

#[rstest]
fn absent_keys_preserve_options_and_present_keys_allocate() -> Result<()> {
    let mut settings = Settings::default();
    TreeStorage::new(json!({"name": "x"})).convert_to(&mut settings)?;
    ensure!(settings.auth.is_none(), "absent key allocated");

    TreeStorage::new(json!({"auth": {}})).convert_to(&mut settings)?;
    ensure!(settings.auth == Some(Auth::default()), "empty object did not allocate");

    let mut preset = seeded();
    TreeStorage::new(json!({"port": 2})).convert_to(&mut preset)?;
    ensure!(preset.auth == seeded().auth, "absent key replaced a seeded value");

    TreeStorage::new(json!({"auth": {}})).convert_to(&mut preset)?;
    ensure!(
        preset.auth == Some(Auth::default()),
        "present key kept stale contents: {:?}",
        preset.auth
    );
    Ok(())
}

#[rstest]
fn update_storage_reports_real_changes(layers: CompositeStorage) -> Result<()> {
    let replacement = FlatStorage::new(
        [
            ("APP_FEATURES_gamma", json!("true")),
            ("APP_AUTH_USER", json!("svc")),
            ("APP_PORT", json!("9000")),
        ],
        PathSyntax::env(),
    );
    ensure!(
        !layers.update_storage(2, Some(shared(replacement)))?,
        "reordered keys reported as a change"
    );
    ensure!(!layers.update_storage(1, Some(shared(TreeStorage::nil())))?, "nil to nil changed");
    ensure!(
        layers.update_storage(1, Some(shared(TreeStorage::new(json!({})))))?,
        "nil to empty must count as a change"
    );
    ensure!(
        layers.update_storage(2, Some(shared(TreeStorage::new(json!({"app": {"port": 1}})))))?,
        "new data not detected"
    );
    let port: u16 = layers.sub("app.port").get()?;
    ensure!(port == 1, "update not visible: {port}");
    ensure!(layers.update_storage(9, None).is_err(), "out of range index accepted");
    Ok(())
}

#[rstest]
fn nil_and_empty_are_not_equal() {
    let nil = TreeStorage::nil();
    let empty_map = TreeStorage::new(json!({}));
    let empty_list = TreeStorage::new(json!([]));
    assert!(nil.equals(&FlatStorage::nil()));
    assert!(nil.equals(&CompositeStorage::new([None])));
    assert!(!nil.equals(&empty_map));
    assert!(!empty_list.equals(&nil));
    assert!(!empty_map.equals(&empty_list));
    let nil_ref: &dyn Storage = &nil;
    let empty_ref: &dyn Storage = &empty_map;
    assert!(storage_eq(None, Some(nil_ref)));
    assert!(!storage_eq(Some(empty_ref), None));
}

#[rstest]
fn validating_wrappers_compare_by_their_inner_storage() {
    let tree = shared(TreeStorage::new(json!({"a": 1})));
    let wrapped = ValidatingStorage::new(Arc::clone(&tree));
    let twin = ValidatingStorage::new(shared(TreeStorage::new(json!({"a": 1}))));
    assert!(wrapped.equals(tree.as_ref()));
    assert!(wrapped.equals(&twin));
    assert!(ValidatingStorage::default().equals(&TreeStorage::nil()));
    assert!(!ValidatingStorage::default().equals(&TreeStorage::new(json!({}))));
}

#[rstest]
fn readers_observe_whole_generations() -> Result<()> {
    let composite = Arc::new(CompositeStorage::new([Some(shared(TreeStorage::new(
        json!({"left": 0, "right": 0}),
    )))]));
    let writer = {
        let composite = Arc::clone(&composite);
        thread::spawn(move || -> Result<()> {
            for generation in 1..=50_u32 {
                let next = TreeStorage::new(json!({"left": generation, "right": generation}));
                composite.update_storage(0, Some(shared(next)))?;
            }
            Ok(())
        })
    };
    for _ in 0..50 {
        let pair: BTreeMap<String, u32> = composite.get()?;
        ensure!(
            pair.get("left") == pair.get("right"),
            "torn read across one member: {pair:?}"
        );
    }
    writer
        .join()
        .map_err(|_| anyhow!("writer thread panicked"))??;
    Ok(())
}
