//! Procedural macros for `confstore`.
//!
//! `#[derive(Bind)]` describes a record to the binding engine: which source
//! key feeds each field, which defaults apply, and whether the record is
//! validated after binding.
//!
//! Supported attributes:
//!
//! - struct: `#[config(rename_all = "...")]`, `#[config(validate)]`,
//!   `#[config(crate = "...")]`; `#[serde(rename_all = "...")]` is honoured
//!   when no `config` convention is given.
//! - field: `#[config(name | json | yaml | toml | ini = "...")]`,
//!   `#[config(default = <literal>)]`, `#[config(flatten)]`,
//!   `#[config(skip)]`; `#[serde(rename = "...")]` is honoured below the
//!   `config` tags.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod derive;

/// Derive macro for `confstore::Bind`.
#[proc_macro_derive(Bind, attributes(config))]
pub fn derive_bind(input: TokenStream) -> TokenStream {
    let derive_input = parse_macro_input!(input as DeriveInput);
    derive::expand(&derive_input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
