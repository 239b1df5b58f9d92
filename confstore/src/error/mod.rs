//! Error types produced while addressing and binding configuration storage.

mod constructors;
mod types;

pub use types::{ConversionError, PathError, StorageError, StorageResult};
