//! Tests for tree, composite, and validating storages and the equality rules.

use std::collections::BTreeMap;

use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::error::StorageError;
use crate::path::PathSyntax;
use crate::value::Value;

#[fixture]
fn tree() -> TreeStorage {
    TreeStorage::new(json!({
        "database": {
            "host": "localhost",
            "pools": [{"host": "db1"}, {"host": "db2"}],
        },
        "empty": {},
        "nothing": null,
    }))
}

fn shared(storage: impl Storage + 'static) -> Arc<dyn Storage> {
    Arc::new(storage)
}

#[rstest]
#[case("database.pools[1].host", json!("db2"))]
#[case("DATABASE.Host", json!("localhost"))]
#[case("database.pools[0]", json!({"host": "db1"}))]
#[case("empty", json!({}))]
fn tree_sub_walks_members_and_indices(tree: TreeStorage, #[case] path: &str, #[case] expected: Value) {
    assert_eq!(tree.sub(path).value(), Some(&expected));
}

#[rstest]
#[case("missing")]
#[case("nothing")]
#[case("database.pools[2]")]
#[case("database.pools[-1]")]
#[case("database.pools[x]")]
#[case("database.host.deeper")]
#[case("database..host")]
#[case(".database")]
fn tree_sub_yields_nil_for_unresolvable_paths(tree: TreeStorage, #[case] path: &str) {
    let sub = tree.sub(path);
    assert!(Storage::is_nil(&sub));
    assert!(Storage::is_nil(&sub.sub("further.down")));
}

#[rstest]
fn tree_empty_path_is_identity(tree: TreeStorage) {
    assert!(tree.equals(&tree.sub("")));
}

#[rstest]
fn tree_sub_inherits_policy_and_syntax() {
    let storage = TreeStorage::new(json!({"a": {"b": [1, 2]}}))
        .with_syntax(PathSyntax::env())
        .with_defaults(false);
    let sub = storage.sub("a_b_1");
    assert_eq!(sub.value(), Some(&json!(2)));
    assert!(!sub.defaults_enabled());
    assert!(!storage.sub("missing").defaults_enabled());
}

#[rstest]
fn from_serialize_wraps_records() {
    #[derive(serde::Serialize)]
    struct Seed {
        name: &'static str,
        ports: [u16; 2],
    }
    let storage = TreeStorage::from_serialize(&Seed {
        name: "svc",
        ports: [80, 443],
    })
    .expect("serialises");
    let port: u16 = storage.sub("ports[1]").get().expect("binds");
    assert_eq!(port, 443);
}

#[rstest]
fn tree_conversion_errors_carry_paths(tree: TreeStorage) {
    let mut dest: BTreeMap<String, u16> = BTreeMap::new();
    let err = tree
        .sub("database")
        .convert_to(&mut dest)
        .expect_err("host is not a number");
    let conversion = err.as_conversion().expect("conversion error");
    assert_eq!(conversion.path(), "host");
    assert_eq!(conversion.target(), "u16");
}

#[rstest]
fn nil_binds_leave_destinations_untouched(tree: TreeStorage) {
    let nil = tree.sub("missing");
    let mut port = 7_u16;
    let mut seeded = Some("kept".to_owned());
    let mut absent: Option<String> = None;
    let mut map = BTreeMap::from([("k".to_owned(), 1_u8)]);
    nil.convert_to(&mut port).expect("no-op");
    nil.convert_to(&mut seeded).expect("no-op");
    nil.convert_to(&mut absent).expect("no-op");
    nil.convert_to(&mut map).expect("no-op");
    assert_eq!(port, 7);
    assert_eq!(seeded.as_deref(), Some("kept"));
    assert_eq!(absent, None);
    assert_eq!(map.len(), 1);
}

#[rstest]
fn equality_distinguishes_nil_from_empty() {
    let nil = TreeStorage::nil();
    let empty = TreeStorage::new(json!({}));
    assert!(nil.equals(&TreeStorage::new(Value::Null)));
    assert!(nil.equals(&FlatStorage::nil()));
    assert!(!nil.equals(&empty));
    assert!(!empty.equals(&nil));
    assert!(empty.equals(&TreeStorage::new(json!({}))));
    assert!(!empty.equals(&FlatStorage::from_value(&json!({"a": 1}), PathSyntax::default())));
}

#[rstest]
#[case(None, None, true)]
#[case(None, Some(TreeStorage::nil()), true)]
#[case(Some(TreeStorage::nil()), None, true)]
#[case(None, Some(TreeStorage::new(json!({}))), false)]
#[case(Some(TreeStorage::new(json!(1))), Some(TreeStorage::new(json!(1))), true)]
#[case(Some(TreeStorage::new(json!(1))), Some(TreeStorage::new(json!(2))), false)]
fn storage_eq_treats_none_as_nil(
    #[case] left: Option<TreeStorage>,
    #[case] right: Option<TreeStorage>,
    #[case] expected: bool,
) {
    fn as_dyn(storage: &TreeStorage) -> &dyn Storage {
        storage
    }
    assert_eq!(
        storage_eq(left.as_ref().map(as_dyn), right.as_ref().map(as_dyn)),
        expected
    );
}

#[fixture]
fn layered() -> CompositeStorage {
    CompositeStorage::new([
        Some(shared(TreeStorage::new(json!({"host": "a", "port": 1, "tags": {"x": "1"}})))),
        None,
        Some(shared(TreeStorage::new(json!({"port": 2, "tags": {"y": "2"}})))),
    ])
}

#[rstest]
fn composite_later_members_win(layered: CompositeStorage) {
    let merged: Value = layered.get().expect("binds");
    assert_eq!(
        merged,
        json!({"host": "a", "port": 2, "tags": {"x": "1", "y": "2"}})
    );
}

#[rstest]
fn composite_maps_merge_incrementally(layered: CompositeStorage) {
    let tags: BTreeMap<String, String> = layered.sub("tags").get().expect("binds");
    assert_eq!(tags.len(), 2);
    assert_eq!(tags.get("y").map(String::as_str), Some("2"));
}

#[rstest]
fn composite_sub_preserves_member_nil_ness(layered: CompositeStorage) {
    let sub = layered.sub("host");
    let members = sub.members();
    assert_eq!(members.len(), 3);
    assert!(members.get(1).is_some_and(Option::is_none));
    assert!(
        members
            .get(2)
            .and_then(Option::as_ref)
            .is_some_and(|member| member.is_nil())
    );
    assert!(!Storage::is_nil(&sub));
    assert!(Storage::is_nil(&layered.sub("missing")));
}

#[rstest]
fn composite_reports_failing_member(layered: CompositeStorage) {
    layered.push(Some(shared(TreeStorage::new(json!({"port": "high"})))));
    let mut tags: BTreeMap<String, u16> = BTreeMap::new();
    layered
        .sub("tags")
        .convert_to(&mut tags)
        .expect("the failing member has no tags");
    assert_eq!(tags.len(), 2);

    let mut port = 0_u16;
    let failure = layered
        .sub("port")
        .convert_to(&mut port)
        .expect_err("last member is not numeric");
    assert!(matches!(failure, StorageError::Member { index: 3, .. }));
    assert_eq!(port, 2);
}

#[rstest]
fn update_storage_detects_changes(layered: CompositeStorage) {
    let same = shared(TreeStorage::new(json!({"port": 2, "tags": {"y": "2"}})));
    let different = shared(TreeStorage::new(json!({"port": 3})));
    assert!(!layered.update_storage(2, Some(same)).expect("in range"));
    assert!(layered.update_storage(2, Some(different)).expect("in range"));
    assert!(!layered.update_storage(1, None).expect("in range"));
    assert!(
        !layered
            .update_storage(1, Some(shared(TreeStorage::nil())))
            .expect("in range")
    );
    assert!(
        layered
            .update_storage(1, Some(shared(TreeStorage::new(json!({})))))
            .expect("in range")
    );
    let port: u16 = layered.sub("port").get().expect("binds");
    assert_eq!(port, 3);
}

#[rstest]
fn update_storage_rejects_out_of_range(layered: CompositeStorage) {
    let err = layered.update_storage(3, None).expect_err("out of range");
    assert!(matches!(err, StorageError::Composition { .. }));
}

#[rstest]
fn composite_equality_is_pairwise(layered: CompositeStorage) {
    let twin = CompositeStorage::new(layered.members());
    assert!(layered.equals(&layered));
    assert!(layered.equals(&twin));
    twin.push(None);
    assert!(!layered.equals(&twin));
    assert!(CompositeStorage::new([None, None]).equals(&TreeStorage::nil()));
}

#[rstest]
fn nil_composites_compare_member_counts() {
    let single = CompositeStorage::new([None]);
    let pair = CompositeStorage::new([None, None]);
    assert!(!single.equals(&pair));
    assert!(!pair.equals(&single));
    assert!(single.equals(&CompositeStorage::new([None])));
    let nil_member: Option<Arc<dyn Storage>> = Some(shared(TreeStorage::nil()));
    assert!(!single.equals(&CompositeStorage::new([nil_member.clone(), None])));
    assert!(pair.equals(&CompositeStorage::new([nil_member, None])));
}

#[rstest]
fn validating_delegates_sub_and_equality(tree: TreeStorage) {
    let validating = ValidatingStorage::new(shared(tree.clone()));
    assert!(validating.equals(&tree));
    assert!(validating.sub("database.host").equals(&tree.sub("database.host")));
    let nil = validating.sub("missing");
    assert!(Storage::is_nil(&nil));
    let mut port = 9_u16;
    nil.convert_to(&mut port).expect("nil is a no-op");
    assert_eq!(port, 9);
}

#[rstest]
fn validating_passes_conversion_errors_through(tree: TreeStorage) {
    let validating = ValidatingStorage::new(shared(tree));
    let mut port = 0_u16;
    let err = validating
        .sub("database.host")
        .convert_to(&mut port)
        .expect_err("not a number");
    assert!(matches!(err, StorageError::Conversion(_)));
}
