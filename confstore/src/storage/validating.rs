//! Decorator that validates destinations after a successful bind.

use std::any::Any;
use std::sync::Arc;

use super::{Storage, TreeStorage};
use crate::bind::Bind;
use crate::error::StorageResult;

/// Wraps a storage so that [`Storage::convert_to`] also checks the
/// destination's declared constraints.
///
/// Records opt in with `#[config(validate)]` alongside
/// `#[derive(validator::Validate)]`; every violation is reported in one
/// [`crate::StorageError::Validation`].
#[derive(Clone, Debug)]
pub struct ValidatingStorage {
    inner: Arc<dyn Storage>,
}

impl ValidatingStorage {
    /// Wrap `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn Storage>) -> Self {
        Self { inner }
    }

    /// The wrapped storage.
    #[must_use]
    pub fn inner(&self) -> &Arc<dyn Storage> {
        &self.inner
    }

    /// Validate the wrapped sub-storage at `path`.
    #[must_use]
    pub fn sub(&self, path: &str) -> Self {
        Self::new(self.inner.sub(path))
    }
}

impl Default for ValidatingStorage {
    fn default() -> Self {
        Self::new(Arc::new(TreeStorage::nil()))
    }
}

impl Storage for ValidatingStorage {
    fn sub(&self, path: &str) -> Arc<dyn Storage> {
        Arc::new(Self::sub(self, path))
    }

    fn convert_to(&self, dest: &mut dyn Bind) -> StorageResult<()> {
        if self.inner.is_nil() {
            return Ok(());
        }
        self.inner.convert_to(dest)?;
        dest.validate().map_err(|errors| {
            tracing::debug!(%errors, "bound value failed validation");
            errors.into()
        })
    }

    fn overlay(&self, dest: &mut dyn Bind) -> StorageResult<()> {
        self.inner.overlay(dest)
    }

    fn equals(&self, other: &dyn Storage) -> bool {
        match other.as_any().downcast_ref::<Self>() {
            Some(that) => self.inner.equals(that.inner.as_ref()),
            None => self.inner.equals(other),
        }
    }

    fn is_nil(&self) -> bool {
        self.inner.is_nil()
    }

    fn defaults_enabled(&self) -> bool {
        self.inner.defaults_enabled()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
