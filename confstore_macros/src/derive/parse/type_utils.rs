//! Type introspection helpers.
//!
//! These utilities perform shallow inspection of `syn::Type` values to
//! recognise `Option<T>` fields, whose defaults only fill empty slots.

use syn::{GenericArgument, PathArguments, Type};

/// Returns the first type argument if `ty` is the provided wrapper.
///
/// The check is shallow: only the final path segment is compared, so
/// `Option<T>`, `std::option::Option<T>`, and `core::option::Option<T>` all
/// match. The function is not recursive.
fn type_inner<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(p) = ty else {
        return None;
    };
    let last = p.path.segments.last()?;
    if last.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &last.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

/// Returns the inner type if `ty` is `Option<T>`.
///
/// Only the outermost layer is inspected, so `Option<Vec<T>>` yields
/// `Vec<T>`.
pub(crate) fn option_inner(ty: &Type) -> Option<&Type> {
    type_inner(ty, "Option")
}
