//! Primary error enums for storage access and binding.

use std::borrow::Cow;

use thiserror::Error;

use crate::value::ValueKind;

/// Result alias used by storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// A source value could not be coerced into the requested destination shape.
///
/// Carries the kind of the offending source value, a description of the
/// destination, and the field path (empty at the root of a bind).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("cannot convert {from} into {to}{}{}", location(.path), suffix(.detail))]
pub struct ConversionError {
    pub(crate) from: ValueKind,
    pub(crate) to: Cow<'static, str>,
    pub(crate) path: String,
    pub(crate) detail: Option<String>,
}

fn location(path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!(" at `{path}`")
    }
}

fn suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map_or_else(String::new, |text| format!(": {text}"))
}

/// Malformed path syntax or path-syntax configuration.
///
/// `Storage::sub` never surfaces this error; a malformed path simply
/// addresses nothing and yields a nil storage.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum PathError {
    /// A member segment between two separators was empty.
    #[error("empty segment in path `{path}`")]
    EmptySegment {
        /// Path text that failed to parse.
        path: String,
    },

    /// An index-format template did not contain exactly one `%d`.
    #[error("index format `{template}` must contain exactly one `%d`")]
    InvalidIndexFormat {
        /// Offending template.
        template: String,
    },

    /// The key separator was empty.
    #[error("path separator must not be empty")]
    EmptySeparator,
}

/// Errors returned by storage operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// A source value could not be coerced into the destination.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// Path syntax configuration was invalid.
    #[error(transparent)]
    Path(#[from] PathError),

    /// The bound destination violated its declared constraints.
    #[error("validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// A composite storage was used incorrectly.
    #[error("composition error: {message}")]
    Composition {
        /// Human-readable explanation of the misuse.
        message: String,
    },

    /// A composite member failed while replaying its bind.
    #[error("storage member {index} failed: {source}")]
    Member {
        /// Position of the failing member; higher indices have priority.
        index: usize,
        /// Error reported by the member.
        #[source]
        source: Box<StorageError>,
    },

    /// A registry lookup or registration failed.
    #[error("registry error: {message}")]
    Registry {
        /// Human-readable explanation of the failure.
        message: String,
    },
}
