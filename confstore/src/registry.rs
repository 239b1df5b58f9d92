//! Explicit registry of storage factories keyed by namespace and type name.
//!
//! Orchestration code looks storages up by name (for example from a
//! configuration file that says `type = "flat"`), so factories are
//! registered up front with [`Registry::register`] instead of through
//! side-effecting initialisers.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;

use crate::error::{StorageError, StorageResult};
use crate::options::StorageOptions;
use crate::storage::{FlatStorage, Storage, TreeStorage, flatten};
use crate::value::Value;

/// Builds a storage from decoded data and its options.
pub type StorageFactory = fn(Value, &StorageOptions) -> StorageResult<Arc<dyn Storage>>;

/// Namespace used by the built-in factories.
pub const BUILTIN_NAMESPACE: &str = "storage";

/// Map from `(namespace, type_name)` to a storage factory.
///
/// # Examples
///
/// ```
/// use confstore::{Registry, Storage, StorageOptions};
/// use serde_json::json;
///
/// let mut registry = Registry::new();
/// registry.register_builtin().expect("fresh registry");
/// let storage = registry
///     .build("storage", "tree", json!({"a": 1}), &StorageOptions::default())
///     .expect("tree factory is registered");
/// assert!(!storage.is_nil());
/// ```
#[derive(Default)]
pub struct Registry {
    factories: HashMap<(String, String), StorageFactory>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.factories.keys().collect();
        keys.sort();
        f.debug_struct("Registry").field("factories", &keys).finish()
    }
}

impl Registry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `namespace` and `type_name`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Registry`] when the pair is already taken.
    pub fn register(
        &mut self,
        namespace: &str,
        type_name: &str,
        factory: StorageFactory,
    ) -> StorageResult<()> {
        let key = (namespace.to_owned(), type_name.to_owned());
        if self.factories.contains_key(&key) {
            return Err(StorageError::registry(format!(
                "`{namespace}/{type_name}` is already registered"
            )));
        }
        self.factories.insert(key, factory);
        tracing::debug!(namespace, type_name, "registered storage factory");
        Ok(())
    }

    /// Register the tree and flat storages under [`BUILTIN_NAMESPACE`].
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Registry`] when either name is already taken.
    pub fn register_builtin(&mut self) -> StorageResult<()> {
        self.register(BUILTIN_NAMESPACE, "tree", tree_factory)?;
        self.register(BUILTIN_NAMESPACE, "flat", flat_factory)
    }

    /// The factory registered for `namespace` and `type_name`.
    #[must_use]
    pub fn get(&self, namespace: &str, type_name: &str) -> Option<StorageFactory> {
        self.factories
            .get(&(namespace.to_owned(), type_name.to_owned()))
            .copied()
    }

    /// Whether a factory is registered for `namespace` and `type_name`.
    #[must_use]
    pub fn contains(&self, namespace: &str, type_name: &str) -> bool {
        self.get(namespace, type_name).is_some()
    }

    /// Build a storage with the factory for `namespace` and `type_name`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Registry`] for an unknown pair, or whatever
    /// the factory reports.
    pub fn build(
        &self,
        namespace: &str,
        type_name: &str,
        data: Value,
        options: &StorageOptions,
    ) -> StorageResult<Arc<dyn Storage>> {
        let factory = self.get(namespace, type_name).ok_or_else(|| {
            StorageError::registry(format!("no storage registered as `{namespace}/{type_name}`"))
        })?;
        factory(data, options)
    }
}

fn tree_factory(data: Value, options: &StorageOptions) -> StorageResult<Arc<dyn Storage>> {
    Ok(Arc::new(TreeStorage::with_options(data, options)?))
}

/// Flat data may arrive either as a map of flat keys or as a nested value;
/// both are flattened in the configured syntax.
fn flat_factory(data: Value, options: &StorageOptions) -> StorageResult<Arc<dyn Storage>> {
    let syntax = options.syntax()?;
    let entries = flatten(&data, &syntax);
    Ok(Arc::new(FlatStorage::new(entries, syntax).with_defaults(options.defaults)))
}

static GLOBAL: LazyLock<RwLock<Registry>> = LazyLock::new(|| RwLock::new(Registry::new()));

/// The process-wide registry. It starts empty; call
/// [`Registry::register_builtin`] during startup to install the built-in
/// storages.
///
/// # Examples
///
/// ```
/// let mut registry = confstore::registry::global().write();
/// if !registry.contains("storage", "tree") {
///     registry.register_builtin().expect("built-ins not yet registered");
/// }
/// ```
#[must_use]
pub fn global() -> &'static RwLock<Registry> {
    &GLOBAL
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageExt;
    use rstest::rstest;
    use serde_json::json;

    fn custom(_: Value, _: &StorageOptions) -> StorageResult<Arc<dyn Storage>> {
        Ok(Arc::new(TreeStorage::nil()))
    }

    #[rstest]
    fn duplicate_registration_fails() {
        let mut registry = Registry::new();
        registry.register("app", "custom", custom).expect("first registration");
        let err = registry
            .register("app", "custom", custom)
            .expect_err("duplicate must fail");
        assert!(matches!(err, StorageError::Registry { .. }));
        assert!(registry.contains("app", "custom"));
        assert!(!registry.contains("storage", "custom"));
    }

    #[rstest]
    fn unknown_pair_fails_to_build() {
        let err = Registry::new()
            .build("storage", "tree", Value::Null, &StorageOptions::default())
            .expect_err("nothing registered");
        assert!(err.to_string().contains("storage/tree"));
    }

    #[rstest]
    fn flat_factory_honours_options() {
        let mut registry = Registry::new();
        registry.register_builtin().expect("fresh registry");
        let storage = registry
            .build(
                BUILTIN_NAMESPACE,
                "flat",
                json!({"DB_PORT": "5432"}),
                &StorageOptions::env(),
            )
            .expect("flat factory");
        let port: u16 = storage.sub("db.port").get().expect("port binds");
        assert_eq!(port, 5432);
        assert!(storage.as_any().is::<FlatStorage>());
    }

    #[rstest]
    fn tree_factory_rejects_bad_syntax() {
        let mut registry = Registry::new();
        registry.register_builtin().expect("fresh registry");
        let options = StorageOptions {
            index_format: "[]".to_owned(),
            ..StorageOptions::default()
        };
        let err = registry
            .build(BUILTIN_NAMESPACE, "tree", json!({}), &options)
            .expect_err("invalid index format");
        assert!(matches!(err, StorageError::Path(_)));
    }
}
