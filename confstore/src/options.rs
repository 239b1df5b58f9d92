//! Per-storage configuration knobs.

use serde::{Deserialize, Serialize};

use crate::error::PathError;
use crate::path::{IndexFormat, PathSyntax};

/// Knobs shared by every storage constructor: the defaults policy and the
/// key syntax.
///
/// Missing fields fall back to their defaults, so an orchestration layer can
/// load partial options from any format.
///
/// # Examples
///
/// ```
/// use confstore::StorageOptions;
///
/// let options: StorageOptions = serde_json::from_str(r#"{"separator": "__"}"#)
///     .expect("options deserialise");
/// assert!(options.defaults);
/// assert_eq!(options.index_format, "[%d]");
/// assert_eq!(options.syntax().expect("valid syntax").separator(), "__");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageOptions {
    /// Apply `#[config(default = ...)]` annotations when binding.
    pub defaults: bool,
    /// Separator between member segments.
    pub separator: String,
    /// Index-format template containing one `%d`.
    pub index_format: String,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            defaults: true,
            separator: ".".to_owned(),
            index_format: "[%d]".to_owned(),
        }
    }
}

impl StorageOptions {
    /// Environment-style options: `_` separator and `_%d` indices.
    #[must_use]
    pub fn env() -> Self {
        Self {
            separator: "_".to_owned(),
            index_format: "_%d".to_owned(),
            ..Self::default()
        }
    }

    /// Validate the separator and index format into a [`PathSyntax`].
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] when the separator is empty or the index format
    /// lacks exactly one `%d`.
    pub fn syntax(&self) -> Result<PathSyntax, PathError> {
        PathSyntax::new(self.separator.clone(), IndexFormat::new(self.index_format.clone())?)
    }
}
