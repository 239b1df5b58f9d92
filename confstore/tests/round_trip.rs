//! Flattening, reconstruction, and decoder output feeding storages.

use anyhow::{Result, ensure};
use confstore::{
    Bind, FlatStorage, PathSyntax, Storage, StorageExt, TreeStorage, Value, flatten, unflatten,
};
use proptest::prelude::*;
use rstest::rstest;
use serde_json::json;

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-z ]{0,8}".prop_map(Value::from),
    ]
}

fn document() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 1..4)
                .prop_map(|fields| Value::Object(fields.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn unflatten_inverts_flatten(value in document()) {
        for syntax in [PathSyntax::default(), PathSyntax::env()] {
            let entries = flatten(&value, &syntax);
            prop_assert_eq!(&unflatten(entries, &syntax), &value);
        }
    }

    #[test]
    fn flat_and_tree_storages_agree(value in document()) {
        let tree = TreeStorage::new(value.clone());
        let flat = FlatStorage::from_value(&value, PathSyntax::default());
        let from_tree: Value = tree.get().map_err(|err| TestCaseError::fail(err.to_string()))?;
        let from_flat: Value = flat.get().map_err(|err| TestCaseError::fail(err.to_string()))?;
        prop_assert_eq!(from_tree, from_flat);
    }
}

#[rstest]
#[case::scalar(json!("solo"), &[("", json!("solo"))])]
#[case::list(json!([1, 2]), &[("[0]", json!(1)), ("[1]", json!(2))])]
#[case::records(
    json!({"pools": [{"host": "a"}], "port": 1}),
    &[("pools[0].host", json!("a")), ("port", json!(1))]
)]
#[case::empty_containers(json!({"a": {}, "b": []}), &[("a", json!({})), ("b", json!([]))])]
fn flatten_produces_canonical_keys(#[case] value: Value, #[case] expected: &[(&str, Value)]) {
    let mut entries = flatten(&value, &PathSyntax::default());
    entries.sort_by(|left, right| left.0.cmp(&right.0));
    let rendered: Vec<(&str, &Value)> = entries
        .iter()
        .map(|(key, item)| (key.as_str(), item))
        .collect();
    let wanted: Vec<(&str, &Value)> = expected.iter().map(|(key, item)| (*key, item)).collect();
    assert_eq!(rendered, wanted);
}

#[derive(Debug, Default, Bind)]
struct Upstream {
    name: String,
    weight: u8,
}

#[derive(Debug, Default, Bind)]
struct Proxy {
    listen: String,
    #[config(toml = "read-timeout", default = "5s")]
    read_timeout: std::time::Duration,
    upstreams: Vec<Upstream>,
}

#[rstest]
fn toml_documents_bind_through_tree_storage() -> Result<()> {
    let document: Value = toml::from_str(
        r#"
        [proxy]
        listen = "0.0.0.0:443"
        read-timeout = "2m"

        [[proxy.upstreams]]
        name = "blue"
        weight = 3

        [[proxy.upstreams]]
        name = "green"
        weight = 7
        "#,
    )?;
    let storage = TreeStorage::new(document);
    let proxy: Proxy = storage.sub("proxy").get()?;
    ensure!(proxy.listen == "0.0.0.0:443", "{}", proxy.listen);
    ensure!(proxy.read_timeout.as_secs() == 120, "{:?}", proxy.read_timeout);
    let weights: Vec<(&str, u8)> = proxy
        .upstreams
        .iter()
        .map(|upstream| (upstream.name.as_str(), upstream.weight))
        .collect();
    ensure!(weights == [("blue", 3), ("green", 7)], "{weights:?}");
    let green: String = storage.sub("proxy.upstreams[1].name").get()?;
    ensure!(green == "green", "{green}");
    Ok(())
}

#[rstest]
fn flattened_toml_round_trips_through_flat_storage() -> Result<()> {
    let document: Value = toml::from_str("[db]\nhost = \"h\"\nports = [1, 2]\n")?;
    let flat = FlatStorage::from_value(&document, PathSyntax::env());
    let mut keys: Vec<String> = flat.entries().map(|(key, _)| key).collect();
    keys.sort();
    ensure!(keys == ["db_host", "db_ports_0", "db_ports_1"], "{keys:?}");
    ensure!(flat.value().as_ref() == Some(&document), "reconstruction differs");
    ensure!(!flat.equals(&TreeStorage::new(document.clone())), "cross-type equality");
    Ok(())
}

#[derive(Debug, Default, PartialEq, Bind, serde::Serialize)]
struct Listener {
    #[serde(rename = "bind-host")]
    host: String,
    #[serde(rename = "svc-port")]
    #[config(name = "port")]
    port: u16,
}

#[rstest]
fn serialised_records_use_serde_names() -> Result<()> {
    let original = Listener {
        host: "10.0.0.1".to_owned(),
        port: 8443,
    };
    let storage = TreeStorage::from_serialize(&original)?;
    let written: u16 = storage.sub("svc-port").get()?;
    ensure!(written == 8443, "serde name not used: {written}");
    ensure!(storage.sub("port").is_nil(), "config tag leaked into serialised keys");

    let restored: Listener = storage.get()?;
    ensure!(restored.host == original.host, "agreeing names must round-trip");
    ensure!(restored.port == 0, "config tag matched a serde-only key: {}", restored.port);
    Ok(())
}
