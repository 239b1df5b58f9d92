//! Path-addressable configuration storage that binds dynamic trees into
//! typed records.
//!
//! Decoders hand this crate loosely typed [`Value`] trees or flat key sets.
//! A [`Storage`] wraps that data, lets callers navigate it with
//! [`Storage::sub`], and binds it into any [`Bind`] destination with
//! [`Storage::convert_to`]. Records implement [`Bind`] through the derive
//! macro re-exported from the companion `confstore_macros` crate.
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use confstore::{
//!     Bind, CompositeStorage, FlatStorage, PathSyntax, Storage, StorageExt, TreeStorage,
//! };
//! use serde_json::json;
//!
//! #[derive(Debug, Default, Bind)]
//! struct Server {
//!     host: String,
//!     #[config(default = 8080)]
//!     port: u16,
//!     #[config(default = "30s")]
//!     timeout: Duration,
//! }
//!
//! let file: Arc<dyn Storage> = Arc::new(TreeStorage::new(json!({"server": {"host": "example.org"}})));
//! let env: Arc<dyn Storage> = Arc::new(FlatStorage::new(
//!     [("SERVER_PORT", json!("9090"))],
//!     PathSyntax::env(),
//! ));
//! let merged = CompositeStorage::new([Some(file), Some(env)]);
//!
//! let server: Server = merged.sub("server").get().expect("server binds");
//! assert_eq!(server.host, "example.org");
//! assert_eq!(server.port, 9090);
//! assert_eq!(server.timeout, Duration::from_secs(30));
//! ```

extern crate self as confstore;

pub mod bind;
mod error;
mod options;
pub mod path;
pub mod registry;
mod storage;
mod value;

pub use bind::{Bind, BindContext, Shape};
pub use confstore_macros::Bind;
pub use error::{ConversionError, PathError, StorageError, StorageResult};
pub use options::StorageOptions;
pub use path::{IndexFormat, PathSegment, PathSyntax};
pub use registry::{Registry, StorageFactory};
pub use storage::{
    CompositeStorage, FlatStorage, Storage, StorageExt, TreeStorage, ValidatingStorage, flatten,
    storage_eq, unflatten,
};
pub use value::{Map, Number, Value, ValueKind};

/// Paths used by `#[derive(Bind)]` expansions; not part of the public API.
#[doc(hidden)]
pub mod __private {
    pub use validator::{Validate, ValidationErrors};
}
