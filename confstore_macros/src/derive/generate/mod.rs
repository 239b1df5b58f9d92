//! Code generation for the `Bind` implementation.
//!
//! Each field contributes one statement to `bind` and one to
//! `apply_defaults`; the remaining trait items are derived from the struct
//! attributes.

use proc_macro2::TokenStream;
use quote::quote;
use syn::parse_quote;

use super::crate_path;
use super::parse::{FieldAttrs, ParsedInput, option_inner};


/// A named field ready for code generation.
struct FieldPlan<'a> {
    member: &'a syn::Ident,
    ty: &'a syn::Type,
    key: String,
    attrs: &'a FieldAttrs,
}

impl FieldPlan<'_> {
    fn bind_tokens(&self, krate: &TokenStream) -> TokenStream {
        let member = self.member;
        let key = &self.key;
        if self.attrs.flatten {
            return quote! {
                #krate::Bind::bind(&mut self.#member, value, ctx)?;
            };
        }
        quote! {
            if let ::core::option::Option::Some(item) = ctx.lookup(&__fields, #key) {
                #krate::Bind::bind(&mut self.#member, item, &ctx.member(#key))?;
            }
        }
    }

    fn defaults_tokens(&self, krate: &TokenStream) -> TokenStream {
        let member = self.member;
        let key = &self.key;
        if self.attrs.flatten {
            return quote! {
                #krate::Bind::apply_defaults(&mut self.#member, ctx)?;
            };
        }
        let Some(literal) = &self.attrs.default else {
            return quote! {
                #krate::Bind::apply_defaults(&mut self.#member, &ctx.member(#key))?;
            };
        };
        let value = literal.to_value_tokens(krate);
        let inject = quote! {
            #krate::bind::inject_default(&mut self.#member, &#value, &ctx.member(#key))?;
        };
        if option_inner(self.ty).is_some() {
            quote! {
                if self.#member.is_none() {
                    #inject
                }
            }
        } else {
            inject
        }
    }

    fn has_defaults_tokens(&self, krate: &TokenStream) -> TokenStream {
        if self.attrs.default.is_some() {
            return quote! { true };
        }
        let ty = self.ty;
        quote! { <#ty as #krate::Bind>::has_defaults() }
    }
}

fn plan_fields(input: &ParsedInput) -> Vec<FieldPlan<'_>> {
    input
        .fields
        .iter()
        .zip(&input.field_attrs)
        .filter(|(_, attrs)| !attrs.skip)
        .filter_map(|(field, attrs)| {
            let member = field.ident.as_ref()?;
            let key = attrs.key(&member.to_string(), input.struct_attrs.rename_all);
            Some(FieldPlan {
                member,
                ty: &field.ty,
                key,
                attrs,
            })
        })
        .collect()
}

/// Add `Bind + Default` bounds to every type parameter.
fn bounded_generics(generics: &syn::Generics, krate: &TokenStream) -> syn::Generics {
    let mut bounded = generics.clone();
    let params: Vec<_> = bounded
        .type_params()
        .map(|param| param.ident.clone())
        .collect();
    let where_clause = bounded.make_where_clause();
    for param in params {
        where_clause
            .predicates
            .push(parse_quote!(#param: #krate::Bind + ::core::default::Default));
    }
    bounded
}

/// Generate the `Bind` implementation for a parsed record.
pub(crate) fn bind_impl(input: &ParsedInput) -> TokenStream {
    let krate = crate_path::resolve(input.struct_attrs.crate_path.as_ref());
    let ident = &input.ident;
    let generics = bounded_generics(&input.generics, &krate);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let plans = plan_fields(input);
    let binds = plans.iter().map(|plan| plan.bind_tokens(&krate));
    let defaults = plans.iter().map(|plan| plan.defaults_tokens(&krate));
    let has_defaults = plans
        .iter()
        .map(|plan| plan.has_defaults_tokens(&krate))
        .reduce(|acc, term| quote! { #acc || #term })
        .unwrap_or_else(|| quote! { false });
    let validate = input.struct_attrs.validate.then(|| {
        quote! {
            fn validate(&self) -> ::core::result::Result<(), #krate::__private::ValidationErrors> {
                #krate::__private::Validate::validate(self)
            }
        }
    });

    quote! {
        impl #impl_generics #krate::Bind for #ident #ty_generics #where_clause {
            fn bind(
                &mut self,
                value: &#krate::Value,
                ctx: &#krate::BindContext<'_>,
            ) -> ::core::result::Result<(), #krate::ConversionError> {
                let ::core::option::Option::Some(__fields) = #krate::bind::record_fields(
                    value,
                    ctx,
                    <Self as #krate::Bind>::shape(),
                )?
                else {
                    return ::core::result::Result::Ok(());
                };
                #( #binds )*
                ::core::result::Result::Ok(())
            }

            fn apply_defaults(
                &mut self,
                ctx: &#krate::BindContext<'_>,
            ) -> ::core::result::Result<(), #krate::ConversionError> {
                if !ctx.defaults_enabled() {
                    return ::core::result::Result::Ok(());
                }
                #( #defaults )*
                ::core::result::Result::Ok(())
            }

            fn has_defaults() -> bool {
                #has_defaults
            }

            fn shape() -> #krate::Shape {
                #krate::Shape::Record(::core::stringify!(#ident))
            }

            #validate
        }
    }
}
