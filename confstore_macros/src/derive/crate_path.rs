//! Crate path resolution for dependency aliasing support.
//!
//! Converts the optional `#[config(crate = "...")]` attribute value into the
//! tokens that prefix every `confstore::` path in generated code.

use proc_macro2::TokenStream;
use quote::quote;

/// Resolve the crate path from the parsed struct attribute, defaulting to
/// `confstore`.
pub(crate) fn resolve(crate_path: Option<&syn::Path>) -> TokenStream {
    crate_path.map_or_else(|| quote! { confstore }, |path| quote! { #path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::default(None, "confstore")]
    #[case::custom(Some("settings"), "settings")]
    #[case::nested(Some("app::confstore"), "app :: confstore")]
    fn resolve_produces_expected_tokens(#[case] input: Option<&str>, #[case] expected: &str) {
        let parsed = input.map(|s| syn::parse_str::<syn::Path>(s).expect("valid path"));
        assert_eq!(resolve(parsed.as_ref()).to_string(), expected);
    }
}
