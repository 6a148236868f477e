//! Implementation of the `#[derive(Record)]` macro.
//!
//! Generates an implementation of the `Record` trait and attribute name
//! constants for building queries without string typos.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{spanned::Spanned, Data, DeriveInput, Error, Fields, Result, Type};

use super::attrs::{is_selector, parse_rsql_attrs};

/// Main implementation of the Record derive macro.
pub fn record_derive_impl(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;
    let type_name = struct_name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    // Ensure we have a struct with named fields
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new(
                    input.span(),
                    "Record can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new(
                input.span(),
                "Record can only be derived for structs",
            ))
        }
    };

    let mut names: Vec<String> = Vec::new();
    let mut const_names: Vec<String> = Vec::new();
    let mut type_arms: Vec<TokenStream> = Vec::new();
    let mut read_arms: Vec<TokenStream> = Vec::new();
    let mut field_constants: Vec<TokenStream> = Vec::new();
    let mut base: Option<TokenStream> = None;

    for field in fields.iter() {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new(field.span(), "expected named field"))?;
        let ty = &field.ty;

        let attrs = parse_rsql_attrs(&field.attrs)?;

        if attrs.skip {
            continue;
        }

        if attrs.base {
            if base.is_some() {
                return Err(Error::new(
                    field.span(),
                    "only one field can be marked #[rsql(base)]",
                ));
            }
            base = Some(quote! {
                ::core::option::Option::Some(&self.#field_name as &dyn ::rsql_filter::Record)
            });
            continue;
        }

        // Strip the raw identifier prefix so `r#type` queries as `type`
        let query_name = attrs
            .rename
            .unwrap_or_else(|| field_name.to_string().trim_start_matches("r#").to_string());

        if !is_selector(&query_name) {
            return Err(Error::new(
                field.span(),
                format!(
                    "field '{}' is not a valid query selector; add #[rsql(rename = \"...\")]",
                    query_name
                ),
            ));
        }

        if names.contains(&query_name) {
            return Err(Error::new(
                field.span(),
                format!("duplicate attribute name '{}'", query_name),
            ));
        }

        let const_name = to_screaming_snake_case(&query_name);
        if syn::parse_str::<syn::Ident>(&const_name).is_err() {
            return Err(Error::new(
                field.span(),
                format!("'{}' cannot be used as an attribute name", query_name),
            ));
        }
        if const_names.contains(&const_name) {
            return Err(Error::new(
                field.span(),
                format!(
                    "attribute name '{}' collides with another attribute's constant {}",
                    query_name, const_name
                ),
            ));
        }
        let const_ident = format_ident!("{}", const_name);
        const_names.push(const_name);
        field_constants.push(quote! {
            /// Attribute name constant for building queries.
            pub const #const_ident: &'static str = #query_name;
        });

        let (domain, value) = if attrs.other {
            let reader = if is_option(ty) {
                quote! { ::rsql_filter::display_option_value(&self.#field_name) }
            } else {
                quote! { ::rsql_filter::display_value(&self.#field_name) }
            };
            (quote! { ::rsql_filter::DomainType::Other }, reader)
        } else {
            (
                quote! { <#ty as ::rsql_filter::AttributeValue>::DOMAIN },
                quote! { ::rsql_filter::AttributeValue::to_value(&self.#field_name) },
            )
        };

        type_arms.push(quote! {
            #query_name => ::core::option::Option::Some(#domain),
        });
        read_arms.push(quote! {
            #query_name => ::core::result::Result::Ok(#value),
        });
        names.push(query_name);
    }

    let base_fn = base.map(|expr| {
        quote! {
            fn base(&self) -> ::core::option::Option<&dyn ::rsql_filter::Record> {
                #expr
            }
        }
    });

    let expanded = quote! {
        impl #impl_generics #struct_name #ty_generics #where_clause {
            #(#field_constants)*
        }

        impl #impl_generics ::rsql_filter::Record for #struct_name #ty_generics #where_clause {
            fn type_name(&self) -> &'static str {
                #type_name
            }

            fn attribute_names(&self) -> &'static [&'static str] {
                &[#(#names),*]
            }

            fn attribute_type(&self, name: &str) -> ::core::option::Option<::rsql_filter::DomainType> {
                match name {
                    #(#type_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            fn read_attribute(
                &self,
                name: &str,
            ) -> ::core::result::Result<::rsql_filter::Value<'_>, ::rsql_filter::AccessError> {
                match name {
                    #(#read_arms)*
                    _ => ::core::result::Result::Err(::rsql_filter::AccessError::Unavailable),
                }
            }

            #base_fn
        }
    };

    Ok(expanded)
}

/// Returns `true` if the type is spelled `Option<...>`.
fn is_option(ty: &Type) -> bool {
    match ty {
        Type::Path(path) if path.qself.is_none() => path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Option"),
        _ => false,
    }
}

/// Convert a string to SCREAMING_SNAKE_CASE.
fn to_screaming_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_was_lower = false;

    for c in s.chars() {
        if c.is_uppercase() {
            if prev_was_lower {
                result.push('_');
            }
            result.push(c);
            prev_was_lower = false;
        } else if c == '_' || c == '-' || c == '.' {
            result.push('_');
            prev_was_lower = false;
        } else {
            result.push(c.to_ascii_uppercase());
            prev_was_lower = c.is_alphanumeric();
        }
    }

    result
}
