//! Constructors and accessors for the storage error types.

use std::borrow::Cow;

use super::{ConversionError, StorageError};
use crate::value::ValueKind;

impl ConversionError {
    /// Build a conversion error for a `from` value that could not become `to`
    /// at `path`.
    ///
    /// # Examples
    ///
    /// ```
    /// use confstore::{ConversionError, ValueKind};
    /// let err = ConversionError::new(ValueKind::List, "record `Db`", "database");
    /// assert_eq!(err.to_string(), "cannot convert list into record `Db` at `database`");
    /// ```
    #[must_use]
    pub fn new(
        from: ValueKind,
        to: impl Into<Cow<'static, str>>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            from,
            to: to.into(),
            path: path.into(),
            detail: None,
        }
    }

    /// Attach a detail message, typically the underlying parse failure.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Kind of the source value that failed to convert.
    #[must_use]
    pub const fn from_kind(&self) -> ValueKind {
        self.from
    }

    /// Description of the destination shape.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.to
    }

    /// Field path of the failure, empty at the root.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Additional detail, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl StorageError {
    /// Construct a composition error.
    ///
    /// # Examples
    ///
    /// ```
    /// use confstore::StorageError;
    /// let e = StorageError::composition("index 3 out of range");
    /// assert!(matches!(e, StorageError::Composition { .. }));
    /// ```
    #[must_use]
    pub fn composition(message: impl Into<String>) -> Self {
        Self::Composition {
            message: message.into(),
        }
    }

    /// Wrap `source` as the failure of composite member `index`.
    #[must_use]
    pub fn member(index: usize, source: Self) -> Self {
        Self::Member {
            index,
            source: Box::new(source),
        }
    }

    /// Construct a registry error.
    #[must_use]
    pub fn registry(message: impl Into<String>) -> Self {
        Self::Registry {
            message: message.into(),
        }
    }

    /// Returns the innermost conversion error, looking through member
    /// wrappers.
    #[must_use]
    pub fn as_conversion(&self) -> Option<&ConversionError> {
        match self {
            Self::Conversion(err) => Some(err),
            Self::Member { source, .. } => source.as_conversion(),
            _ => None,
        }
    }
}
