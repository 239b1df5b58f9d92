//! Literal parsing helpers for `#[config(...)]` attributes.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Expr, ExprLit, ExprUnary, Lit, LitStr, UnOp};

/// Parses a literal from an attribute value using `extractor`.
fn parse_lit<T, F>(
    meta: &syn::meta::ParseNestedMeta,
    key: &str,
    expected: &str,
    extractor: F,
) -> Result<T, syn::Error>
where
    F: FnOnce(Lit) -> Option<T>,
{
    let literal = meta.value()?.parse::<Lit>()?;
    let span = literal.span();
    extractor(literal).ok_or_else(|| syn::Error::new(span, format!("{key} must be a {expected}")))
}

/// Parses a string literal from an attribute value.
pub(crate) fn lit_str(meta: &syn::meta::ParseNestedMeta, key: &str) -> Result<LitStr, syn::Error> {
    parse_lit(meta, key, "string", |lit| match lit {
        Lit::Str(s) => Some(s),
        _ => None,
    })
}

/// A `default = ...` literal, kept in the shape it was written in.
///
/// The generated code turns it into a dynamic value and binds it with the
/// ordinary coercion rules, so `"30s"` feeds a duration and `"a,b"` a list.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum DefaultLiteral {
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Bool(bool),
}

impl DefaultLiteral {
    /// Parse the right-hand side of `default = ...`.
    ///
    /// Accepts string, integer, float, and boolean literals, plus negated
    /// numbers.
    pub(crate) fn parse(meta: &syn::meta::ParseNestedMeta) -> syn::Result<Self> {
        let expr = meta.value()?.parse::<Expr>()?;
        Self::from_expr(&expr)
    }

    fn from_expr(expr: &Expr) -> syn::Result<Self> {
        match expr {
            Expr::Lit(ExprLit { lit, .. }) => Self::from_lit(lit, false),
            Expr::Unary(ExprUnary {
                op: UnOp::Neg(_),
                expr: inner,
                ..
            }) => match inner.as_ref() {
                Expr::Lit(ExprLit { lit, .. }) => Self::from_lit(lit, true),
                other => Err(unsupported(other)),
            },
            Expr::Group(group) => Self::from_expr(&group.expr),
            other => Err(unsupported(other)),
        }
    }

    fn from_lit(lit: &Lit, negative: bool) -> syn::Result<Self> {
        match (lit, negative) {
            (Lit::Int(int), false) => match int.base10_parse::<i64>() {
                Ok(value) => Ok(Self::Int(value)),
                Err(_) => int.base10_parse::<u64>().map(Self::UInt),
            },
            (Lit::Int(int), true) => format!("-{}", int.base10_digits())
                .parse::<i64>()
                .map(Self::Int)
                .map_err(|err| syn::Error::new(int.span(), err)),
            (Lit::Float(float), _) => {
                let sign = if negative { "-" } else { "" };
                format!("{sign}{}", float.base10_digits())
                    .parse::<f64>()
                    .map(Self::Float)
                    .map_err(|err| syn::Error::new(float.span(), err))
            }
            (Lit::Str(s), false) => Ok(Self::Str(s.value())),
            (Lit::Bool(b), false) => Ok(Self::Bool(b.value)),
            (other, _) => Err(syn::Error::new(
                other.span(),
                "default must be a string, integer, float, or boolean literal",
            )),
        }
    }

    /// Tokens building the equivalent dynamic value.
    pub(crate) fn to_value_tokens(&self, krate: &TokenStream) -> TokenStream {
        match self {
            Self::Int(value) => quote! { #krate::Value::from(#value) },
            Self::UInt(value) => quote! { #krate::Value::from(#value) },
            Self::Float(value) => quote! { #krate::Value::from(#value) },
            Self::Str(value) => quote! { #krate::Value::from(#value) },
            Self::Bool(value) => quote! { #krate::Value::from(#value) },
        }
    }
}

fn unsupported(expr: &Expr) -> syn::Error {
    syn::Error::new_spanned(
        expr,
        "default must be a string, integer, float, or boolean literal",
    )
}
