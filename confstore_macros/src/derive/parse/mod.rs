//! Parsing utilities for the `Bind` derive macro.
//!
//! Attributes are read from `#[config(...)]` first, falling back to the
//! `#[serde(...)]` renames a record may already carry. Unknown keys inside
//! either attribute are skipped so other derives can share them.

use syn::meta::ParseNestedMeta;
use syn::{Attribute, Data, DeriveInput, Fields, Token, parenthesized};

mod literals;
mod rename;
mod type_utils;

pub(crate) use literals::DefaultLiteral;
use literals::lit_str;
pub(crate) use rename::RenameAll;
use rename::{serde_field_rename, serde_rename_all};
pub(crate) use type_utils::option_inner;

/// Struct-level attributes recognised by `#[derive(Bind)]`.
#[derive(Default, Clone)]
pub(crate) struct StructAttrs {
    /// Convention applied to field names without an explicit key.
    pub rename_all: Option<RenameAll>,
    /// Forward `Bind::validate` to `validator::Validate`.
    pub validate: bool,
    /// Overrides the generated crate path for dependency aliasing.
    pub crate_path: Option<syn::Path>,
}

/// Field-level attributes recognised by `#[derive(Bind)]`.
///
/// - `name` and the format tags `json`, `yaml`, `toml`, `ini` pick the source
///   key, in that order of priority.
/// - `default` supplies a literal bound into the field when defaults are on.
/// - `flatten` binds the field from the enclosing record's own value.
/// - `skip` leaves the field out of binding entirely.
#[derive(Default, Clone)]
pub(crate) struct FieldAttrs {
    pub name: Option<String>,
    pub json: Option<String>,
    pub yaml: Option<String>,
    pub toml: Option<String>,
    pub ini: Option<String>,
    pub default: Option<DefaultLiteral>,
    pub flatten: bool,
    pub skip: bool,
    pub serde_rename: Option<String>,
}

impl FieldAttrs {
    /// Source key for `field_name`, following tag priority.
    pub(crate) fn key(&self, field_name: &str, rename_all: Option<RenameAll>) -> String {
        [&self.name, &self.json, &self.yaml, &self.toml, &self.ini, &self.serde_rename]
            .into_iter()
            .find_map(Clone::clone)
            .unwrap_or_else(|| {
                rename_all.map_or_else(|| field_name.to_owned(), |rule| rule.apply(field_name))
            })
    }
}

/// Iterate all `#[config(...)]` attributes once and apply a callback.
fn parse_config<F>(attrs: &[Attribute], mut f: F) -> syn::Result<()>
where
    F: FnMut(&ParseNestedMeta) -> syn::Result<()>,
{
    for attr in attrs.iter().filter(|a| a.path().is_ident("config")) {
        attr.parse_nested_meta(|meta| f(&meta))?;
    }
    Ok(())
}

/// Consumes an unrecognised key-value or list without recording it.
fn discard_unknown(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<proc_macro2::TokenStream>()?;
    } else if meta.input.peek(syn::token::Paren) {
        let content;
        parenthesized!(content in meta.input);
        content.parse::<proc_macro2::TokenStream>()?;
    }
    Ok(())
}

fn assign_str(target: &mut Option<String>, meta: &ParseNestedMeta, key: &str) -> syn::Result<()> {
    *target = Some(lit_str(meta, key)?.value());
    Ok(())
}

/// Parses struct-level `#[config(...)]` attributes.
pub(crate) fn parse_struct_attrs(attrs: &[Attribute]) -> syn::Result<StructAttrs> {
    let mut out = StructAttrs::default();
    parse_config(attrs, |meta| {
        if meta.path.is_ident("rename_all") {
            let value = lit_str(meta, "rename_all")?;
            out.rename_all = Some(RenameAll::parse(&value)?);
        } else if meta.path.is_ident("validate") {
            out.validate = true;
        } else if meta.path.is_ident("crate") {
            let value = lit_str(meta, "crate")?;
            out.crate_path = Some(value.parse::<syn::Path>()?);
        } else {
            discard_unknown(meta)?;
        }
        Ok(())
    })?;
    if out.rename_all.is_none() {
        out.rename_all = serde_rename_all(attrs)?;
    }
    Ok(out)
}

/// Parses field-level `#[config(...)]` attributes.
pub(crate) fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut out = FieldAttrs::default();
    parse_config(attrs, |meta| {
        let Some(ident) = meta.path.get_ident().map(ToString::to_string) else {
            return discard_unknown(meta);
        };
        match ident.as_str() {
            "name" => assign_str(&mut out.name, meta, "name"),
            "json" => assign_str(&mut out.json, meta, "json"),
            "yaml" => assign_str(&mut out.yaml, meta, "yaml"),
            "toml" => assign_str(&mut out.toml, meta, "toml"),
            "ini" => assign_str(&mut out.ini, meta, "ini"),
            "default" => {
                out.default = Some(DefaultLiteral::parse(meta)?);
                Ok(())
            }
            "flatten" => {
                out.flatten = true;
                Ok(())
            }
            "skip" => {
                out.skip = true;
                Ok(())
            }
            _ => discard_unknown(meta),
        }
    })?;
    out.serde_rename = serde_field_rename(attrs)?;
    Ok(out)
}

/// Parsed derive input: the record identifier, its named fields, and the
/// attribute metadata for both.
pub(crate) struct ParsedInput {
    pub ident: syn::Ident,
    pub generics: syn::Generics,
    pub fields: Vec<syn::Field>,
    pub struct_attrs: StructAttrs,
    pub field_attrs: Vec<FieldAttrs>,
}

/// Gathers information from the user-provided struct, failing fast on
/// enums, unions, and tuple structs.
pub(crate) fn parse_input(input: &DeriveInput) -> syn::Result<ParsedInput> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named.named.iter().cloned().collect::<Vec<_>>(),
            _ => {
                return Err(syn::Error::new_spanned(
                    data.struct_token,
                    "Bind requires named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Bind can only be derived for structs",
            ));
        }
    };
    let struct_attrs = parse_struct_attrs(&input.attrs)?;
    let field_attrs = fields
        .iter()
        .map(|field| parse_field_attrs(&field.attrs))
        .collect::<syn::Result<Vec<_>>>()?;
    for (field, attrs) in fields.iter().zip(&field_attrs) {
        if attrs.flatten && attrs.default.is_some() {
            return Err(syn::Error::new_spanned(
                field,
                "a flattened field cannot declare a default",
            ));
        }
    }
    Ok(ParsedInput {
        ident: input.ident.clone(),
        generics: input.generics.clone(),
        fields,
        struct_attrs,
        field_attrs,
    })
}
