//! Storage over flattened `(key, value)` entries such as environment
//! variables.
//!
//! Keys are parsed into path segments once, at construction. Sub-storages
//! keep the entries under a prefix with that prefix stripped, and nested
//! structure is only rebuilt when a bind needs it.

use std::any::Any;
use std::sync::Arc;

use super::{Storage, nil_equality};
use crate::bind::{Bind, BindContext};
use crate::error::{PathError, StorageResult};
use crate::options::StorageOptions;
use crate::path::{PathSegment, PathSyntax};
use crate::value::Value;

mod reconstruct;

use reconstruct::{Node, collect, key_segments};
pub use reconstruct::{flatten, unflatten};

#[derive(Clone, Debug, PartialEq)]
struct Entry {
    segments: Vec<PathSegment>,
    value: Value,
}

/// Storage over flat entries whose keys are paths in a [`PathSyntax`].
///
/// An empty flat storage is nil.
///
/// # Examples
///
/// ```
/// use confstore::{FlatStorage, PathSyntax, StorageExt};
/// use serde_json::json;
///
/// let storage = FlatStorage::new(
///     [("DATABASE_HOST", json!("db1.com")), ("DATABASE_PORT", json!(5432))],
///     PathSyntax::env(),
/// );
/// let port: u16 = storage.sub("database.port").get().expect("port binds");
/// assert_eq!(port, 5432);
/// ```
#[derive(Clone, Debug)]
pub struct FlatStorage {
    entries: Arc<[Entry]>,
    syntax: PathSyntax,
    defaults: bool,
}

impl FlatStorage {
    /// Build from `(key, value)` pairs whose keys are written in `syntax`.
    ///
    /// Keys that do not parse are kept as a single literal member.
    #[must_use]
    pub fn new<K, I>(entries: I, syntax: PathSyntax) -> Self
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let parsed = entries
            .into_iter()
            .map(|(key, value)| Entry {
                segments: key_segments(key.as_ref(), &syntax),
                value,
            })
            .collect();
        Self {
            entries: parsed,
            syntax,
            defaults: true,
        }
    }

    /// An empty storage with the default syntax.
    #[must_use]
    pub fn nil() -> Self {
        Self::new(Vec::<(String, Value)>::new(), PathSyntax::default())
    }

    /// Build using the knobs in `options`.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] when the configured syntax is invalid.
    pub fn with_options<K, I>(entries: I, options: &StorageOptions) -> Result<Self, PathError>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Ok(Self::new(entries, options.syntax()?).with_defaults(options.defaults))
    }

    /// Flatten `value` into a storage using `syntax`.
    #[must_use]
    pub fn from_value(value: &Value, syntax: PathSyntax) -> Self {
        let mut entries = Vec::new();
        collect(value, &mut Vec::new(), &mut |segments: &[PathSegment], leaf: &Value| {
            entries.push(Entry {
                segments: segments.to_vec(),
                value: leaf.clone(),
            });
        });
        Self {
            entries: entries.into(),
            syntax,
            defaults: true,
        }
    }

    /// Build from string pairs, such as a snapshot of the process
    /// environment.
    ///
    /// Only keys starting with `prefix` are kept, with the prefix removed;
    /// keys that are empty after stripping are dropped. Values stay strings
    /// and are coerced when bound.
    ///
    /// # Examples
    ///
    /// ```
    /// use confstore::{FlatStorage, PathSyntax, StorageExt};
    ///
    /// let vars = [("APP_PORT", "8080"), ("HOME", "/root")];
    /// let storage = FlatStorage::from_vars(vars, "APP_", PathSyntax::env());
    /// let port: u16 = storage.sub("port").get().expect("port binds");
    /// assert_eq!(port, 8080);
    /// assert!(storage.sub("home").is_empty());
    /// ```
    #[must_use]
    pub fn from_vars<K, V, I>(vars: I, prefix: &str, syntax: PathSyntax) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let kept: Vec<(String, Value)> = vars
            .into_iter()
            .filter_map(|(key, value)| {
                let name = key.as_ref().strip_prefix(prefix)?;
                (!name.is_empty()).then(|| (name.to_owned(), Value::String(value.into())))
            })
            .collect();
        Self::new(kept, syntax)
    }

    /// Set the defaults policy inherited by every sub-storage.
    #[must_use]
    pub const fn with_defaults(mut self, enabled: bool) -> Self {
        self.defaults = enabled;
        self
    }

    /// The key syntax of this storage.
    #[must_use]
    pub const fn syntax(&self) -> &PathSyntax {
        &self.syntax
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether this storage holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries with their keys rendered in this storage's syntax.
    pub fn entries(&self) -> impl Iterator<Item = (String, &Value)> {
        self.entries
            .iter()
            .map(|entry| (self.syntax.render(&entry.segments), &entry.value))
    }

    /// Rebuild the nested value these entries describe, unless the storage
    /// is nil.
    #[must_use]
    pub fn value(&self) -> Option<Value> {
        if self.is_empty() {
            return None;
        }
        let mut root = Node::default();
        for entry in self.entries.iter() {
            root.insert(&entry.segments, entry.value.clone());
        }
        Some(root.into_value())
    }

    /// Scope to the entries under `path`.
    ///
    /// The path is read in the default syntax first and, when that matches
    /// nothing, in this storage's own syntax, so both `database.host` and
    /// `DATABASE_HOST` address the same entries of an environment storage.
    #[must_use]
    pub fn sub(&self, path: &str) -> Self {
        if path.is_empty() {
            return self.clone();
        }
        let canonical = PathSyntax::default();
        let own = (self.syntax != canonical).then_some(&self.syntax);
        for syntax in std::iter::once(&canonical).chain(own) {
            match syntax.parse(path) {
                Ok(prefix) => {
                    let matched = self.under(&prefix);
                    if !matched.is_empty() {
                        return self.with_entries(matched);
                    }
                }
                Err(err) => {
                    tracing::debug!(path, error = %err, "malformed path addresses nothing");
                }
            }
        }
        self.with_entries(Vec::new())
    }

    /// Entries under `prefix`, stripped of it.
    ///
    /// Keys that continue with a member or end at the prefix win; keys that
    /// continue with an index token are used only when there are none.
    fn under(&self, prefix: &[PathSegment]) -> Vec<Entry> {
        let mut direct = Vec::new();
        let mut indexed = Vec::new();
        for entry in self.entries.iter() {
            let Some((head, rest)) = entry.segments.split_at_checked(prefix.len()) else {
                continue;
            };
            if !head.iter().zip(prefix).all(|(have, want)| have.matches(want)) {
                continue;
            }
            let stripped = Entry {
                segments: rest.to_vec(),
                value: entry.value.clone(),
            };
            if matches!(rest.first(), Some(PathSegment::Index(_))) {
                indexed.push(stripped);
            } else {
                direct.push(stripped);
            }
        }
        if direct.is_empty() { indexed } else { direct }
    }

    fn with_entries(&self, entries: Vec<Entry>) -> Self {
        Self {
            entries: entries.into(),
            syntax: self.syntax.clone(),
            defaults: self.defaults,
        }
    }
}

impl Default for FlatStorage {
    fn default() -> Self {
        Self::nil()
    }
}

impl Storage for FlatStorage {
    fn sub(&self, path: &str) -> Arc<dyn Storage> {
        Arc::new(Self::sub(self, path))
    }

    fn overlay(&self, dest: &mut dyn Bind) -> StorageResult<()> {
        if let Some(value) = self.value() {
            let ctx = BindContext::new(self.defaults).with_compound_separator(self.syntax.separator());
            dest.bind(&value, &ctx)?;
        }
        Ok(())
    }

    fn equals(&self, other: &dyn Storage) -> bool {
        nil_equality(self, other).unwrap_or_else(|| {
            other
                .as_any()
                .downcast_ref::<Self>()
                .is_some_and(|flat| self.value() == flat.value())
        })
    }

    fn is_nil(&self) -> bool {
        self.is_empty()
    }

    fn defaults_enabled(&self) -> bool {
        self.defaults
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
