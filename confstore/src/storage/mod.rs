//! Path-addressable storages and the contract they share.
//!
//! A [`Storage`] is a read handle over a region of configuration data. Callers
//! navigate with [`Storage::sub`] and materialise typed values with
//! [`Storage::convert_to`]. Missing data is modelled as a *nil* storage of
//! the same concrete type, which binds as a no-op, so chains such as
//! `storage.sub("a").sub("b").convert_to(&mut dest)` never need guarding.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::bind::{Bind, BindContext};
use crate::error::StorageResult;

mod composite;
mod flat;
mod tree;
mod validating;

pub use composite::CompositeStorage;
pub use flat::{FlatStorage, flatten, unflatten};
pub use tree::TreeStorage;
pub use validating::ValidatingStorage;

/// Uniform read access to configuration data.
pub trait Storage: fmt::Debug + Send + Sync {
    /// Scope to the node addressed by `path`.
    ///
    /// An empty path yields an equivalent handle. Paths that address nothing,
    /// including malformed ones, yield a nil storage of the same concrete
    /// type.
    fn sub(&self, path: &str) -> Arc<dyn Storage>;

    /// Bind this storage's data into `dest`.
    ///
    /// A nil storage leaves `dest` untouched. Otherwise declared defaults are
    /// applied first when the defaults policy is enabled, then the data is
    /// overlaid.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::Conversion`] when the data does not fit
    /// the destination; `dest` may be partially written.
    fn convert_to(&self, dest: &mut dyn Bind) -> StorageResult<()> {
        if self.is_nil() {
            return Ok(());
        }
        if self.defaults_enabled() {
            dest.apply_defaults(&BindContext::new(true))?;
        }
        self.overlay(dest)
    }

    /// Bind this storage's data into `dest` without the root defaults pass.
    ///
    /// # Errors
    ///
    /// As for [`Storage::convert_to`].
    fn overlay(&self, dest: &mut dyn Bind) -> StorageResult<()>;

    /// Deep content equality.
    ///
    /// Nil storages equal each other regardless of concrete type; a nil
    /// storage never equals a non-nil one, even one holding an empty map.
    fn equals(&self, other: &dyn Storage) -> bool;

    /// Whether this storage holds no data.
    fn is_nil(&self) -> bool;

    /// Whether default annotations apply when binding from this storage.
    fn defaults_enabled(&self) -> bool;

    /// Upcast for concrete-type comparisons.
    fn as_any(&self) -> &dyn Any;
}

/// Compare two optional storages, treating `None` like a nil storage.
///
/// # Examples
///
/// ```
/// use confstore::{Storage, TreeStorage, storage_eq};
/// use serde_json::json;
///
/// let nil = TreeStorage::nil();
/// let empty = TreeStorage::new(json!({}));
/// assert!(storage_eq(None, Some(&nil)));
/// assert!(!storage_eq(Some(&nil), Some(&empty)));
/// ```
#[must_use]
pub fn storage_eq(left: Option<&dyn Storage>, right: Option<&dyn Storage>) -> bool {
    let left_nil = left.is_none_or(|s| s.is_nil());
    let right_nil = right.is_none_or(|s| s.is_nil());
    match (left, right) {
        (Some(a), Some(b)) if !left_nil && !right_nil => a.equals(b),
        _ => left_nil && right_nil,
    }
}

/// The nil half of [`Storage::equals`]: `Some` when either side is nil.
pub(crate) fn nil_equality(left: &dyn Storage, right: &dyn Storage) -> Option<bool> {
    match (left.is_nil(), right.is_nil()) {
        (false, false) => None,
        (a, b) => Some(a && b),
    }
}

/// Convenience methods available on every storage.
pub trait StorageExt: Storage {
    /// Bind into a fresh `T::default()` and return it.
    ///
    /// # Errors
    ///
    /// As for [`Storage::convert_to`].
    ///
    /// # Examples
    ///
    /// ```
    /// use confstore::{StorageExt, TreeStorage};
    /// use serde_json::json;
    ///
    /// let storage = TreeStorage::new(json!({"port": "8080"}));
    /// let port: u16 = storage.sub("port").get().expect("port binds");
    /// assert_eq!(port, 8080);
    /// ```
    fn get<T: Bind + Default>(&self) -> StorageResult<T> {
        let mut out = T::default();
        self.convert_to(&mut out)?;
        Ok(out)
    }
}

impl<S: Storage + ?Sized> StorageExt for S {}

#[cfg(test)]
mod tests;
