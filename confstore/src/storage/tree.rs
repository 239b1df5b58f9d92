//! Storage over a single nested value tree.

use std::any::Any;
use std::sync::Arc;

use serde::Serialize;

use super::{Storage, nil_equality};
use crate::bind::{Bind, BindContext, find_key};
use crate::error::{PathError, StorageResult};
use crate::options::StorageOptions;
use crate::path::{PathSegment, PathSyntax};
use crate::value::Value;

/// Storage wrapping one nested [`Value`], as produced by a structured
/// decoder.
///
/// Sub-storages share nothing mutable with their parent and inherit its path
/// syntax and defaults policy.
///
/// # Examples
///
/// ```
/// use confstore::{StorageExt, TreeStorage};
/// use serde_json::json;
///
/// let storage = TreeStorage::new(json!({
///     "database": {"pools": [{"host": "db1"}, {"host": "db2"}]}
/// }));
/// let host: String = storage.sub("database.pools[1].host").get().expect("host binds");
/// assert_eq!(host, "db2");
/// ```
#[derive(Clone, Debug)]
pub struct TreeStorage {
    value: Option<Arc<Value>>,
    syntax: PathSyntax,
    defaults: bool,
}

impl TreeStorage {
    /// Wrap `value` with the default path syntax and defaults enabled.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self {
            value: Some(Arc::new(value)),
            syntax: PathSyntax::default(),
            defaults: true,
        }
    }

    /// A storage holding no data.
    #[must_use]
    pub fn nil() -> Self {
        Self {
            value: None,
            syntax: PathSyntax::default(),
            defaults: true,
        }
    }

    /// Wrap `value` using the knobs in `options`.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] when the configured syntax is invalid.
    pub fn with_options(value: Value, options: &StorageOptions) -> Result<Self, PathError> {
        Ok(Self {
            value: Some(Arc::new(value)),
            syntax: options.syntax()?,
            defaults: options.defaults,
        })
    }

    /// Wrap the serialised form of `source`.
    ///
    /// Keys are the names serde writes, so `#[serde(rename)]` and
    /// `#[serde(rename_all)]` apply while `#[config(...)]` key tags do not.
    /// Binding the result back into the same type only round-trips when both
    /// attribute sets agree on each field's key.
    ///
    /// # Errors
    ///
    /// Returns the serialisation error when `source` cannot be represented as
    /// a [`Value`].
    pub fn from_serialize<T: Serialize + ?Sized>(source: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(source).map(Self::new)
    }

    /// Set the defaults policy inherited by every sub-storage.
    #[must_use]
    pub const fn with_defaults(mut self, enabled: bool) -> Self {
        self.defaults = enabled;
        self
    }

    /// Set the path syntax used by [`TreeStorage::sub`].
    #[must_use]
    pub fn with_syntax(mut self, syntax: PathSyntax) -> Self {
        self.syntax = syntax;
        self
    }

    /// The wrapped value, unless this storage is nil.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.value.as_deref().filter(|value| !value.is_null())
    }

    /// Scope to the node at `path`.
    ///
    /// Member segments match map keys exactly, then ignoring ASCII case.
    /// Index segments are bounds-checked. Anything unresolvable yields
    /// [`TreeStorage::nil`] with this storage's syntax and policy.
    #[must_use]
    pub fn sub(&self, path: &str) -> Self {
        if path.is_empty() {
            return self.clone();
        }
        let Some(root) = self.value() else {
            return self.emptied();
        };
        let segments = match self.syntax.parse(path) {
            Ok(segments) => segments,
            Err(err) => {
                tracing::debug!(path, error = %err, "malformed path addresses nothing");
                return self.emptied();
            }
        };
        match walk(root, &segments) {
            Some(node) if !node.is_null() => Self {
                value: Some(Arc::new(node.clone())),
                syntax: self.syntax.clone(),
                defaults: self.defaults,
            },
            _ => self.emptied(),
        }
    }

    fn emptied(&self) -> Self {
        Self {
            value: None,
            syntax: self.syntax.clone(),
            defaults: self.defaults,
        }
    }
}

impl Default for TreeStorage {
    fn default() -> Self {
        Self::nil()
    }
}

fn walk<'v>(root: &'v Value, segments: &[PathSegment]) -> Option<&'v Value> {
    segments
        .iter()
        .try_fold(root, |node, segment| match (segment, node) {
            (PathSegment::Member(name), Value::Object(fields)) => find_key(fields, name),
            (PathSegment::Index(index), Value::Array(items)) => items.get(*index),
            _ => None,
        })
}

impl Storage for TreeStorage {
    fn sub(&self, path: &str) -> Arc<dyn Storage> {
        Arc::new(Self::sub(self, path))
    }

    fn overlay(&self, dest: &mut dyn Bind) -> StorageResult<()> {
        if let Some(value) = self.value() {
            dest.bind(value, &BindContext::new(self.defaults))?;
        }
        Ok(())
    }

    fn equals(&self, other: &dyn Storage) -> bool {
        nil_equality(self, other).unwrap_or_else(|| {
            other
                .as_any()
                .downcast_ref::<Self>()
                .is_some_and(|tree| self.value() == tree.value())
        })
    }

    fn is_nil(&self) -> bool {
        self.value().is_none()
    }

    fn defaults_enabled(&self) -> bool {
        self.defaults
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
