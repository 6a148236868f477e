//! Attribute parsing for the Record derive macro.
//!
//! Parses the `#[rsql(...)]` field attributes.

use proc_macro2::Span;
use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Error, Lit, Meta, Result, Token,
};

/// Field-level attributes from `#[rsql(...)]`.
#[derive(Debug, Clone)]
pub struct RsqlAttr {
    /// Exclude this field from queries.
    pub skip: bool,
    /// Custom attribute name for queries (default: field name).
    pub rename: Option<String>,
    /// Read the field through `Display` as the "other" domain type.
    pub other: bool,
    /// The field is the embedded base record.
    pub base: bool,
    /// The span for error reporting.
    pub span: Span,
}

impl Default for RsqlAttr {
    fn default() -> Self {
        RsqlAttr {
            skip: false,
            rename: None,
            other: false,
            base: false,
            span: Span::call_site(),
        }
    }
}

impl Parse for RsqlAttr {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut attr = RsqlAttr {
            span: input.span(),
            ..RsqlAttr::default()
        };

        let content: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;

        for meta in content {
            match &meta {
                Meta::Path(p) if p.is_ident("skip") => attr.skip = true,
                Meta::Path(p) if p.is_ident("other") => attr.other = true,
                Meta::Path(p) if p.is_ident("base") => attr.base = true,

                Meta::NameValue(nv) if nv.path.is_ident("rename") => {
                    if let syn::Expr::Lit(syn::ExprLit {
                        lit: Lit::Str(s), ..
                    }) = &nv.value
                    {
                        if !is_selector(&s.value()) {
                            return Err(Error::new(
                                s.span(),
                                format!(
                                    "rename '{}' is not a valid query selector. Expected letters, digits and '_', not starting with a digit",
                                    s.value()
                                ),
                            ));
                        }
                        attr.rename = Some(s.value());
                    } else {
                        return Err(Error::new(
                            nv.value.span(),
                            "rename must be a string literal",
                        ));
                    }
                }

                _ => {
                    return Err(Error::new(
                        meta.span(),
                        "unknown rsql attribute. Expected: skip, other, base, or rename = \"...\"",
                    ));
                }
            }
        }

        if attr.base && (attr.skip || attr.other || attr.rename.is_some()) {
            return Err(Error::new(
                attr.span,
                "base cannot be combined with skip, other, or rename",
            ));
        }
        if attr.skip && (attr.other || attr.rename.is_some()) {
            return Err(Error::new(
                attr.span,
                "skip cannot be combined with other attributes",
            ));
        }

        Ok(attr)
    }
}

/// Returns `true` if `name` is usable as a query selector.
pub fn is_selector(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Extract `#[rsql(...)]` attributes from a field's attributes.
pub fn parse_rsql_attrs(attrs: &[Attribute]) -> Result<RsqlAttr> {
    for attr in attrs {
        if attr.path().is_ident("rsql") {
            return attr.parse_args::<RsqlAttr>();
        }
    }
    Ok(RsqlAttr::default())
}
