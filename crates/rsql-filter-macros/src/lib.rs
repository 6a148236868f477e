//! Proc macros for rsql-filter.
//!
//! This crate provides the [`Record`] derive, which exposes a struct's
//! fields as attributes that RSQL queries can filter on. Use it through the
//! `derive` feature of `rsql-filter` rather than depending on it directly.
//!
//! # Examples
//!
//! For working examples, see `rsql-filter/tests/record_derive.rs`.

mod record;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives the `Record` trait for filterable structs.
///
/// Every named field becomes a queryable attribute unless it is skipped. The
/// domain type comes from the field's `AttributeValue` implementation, so
/// `String`, integers, floats, `bool` and `Option` of those work out of the
/// box. `Option` fields read `None` as null.
///
/// # Field Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `skip` | Exclude this field from queries |
/// | `rename = "..."` | Use a custom name for queries |
/// | `other` | Read the field through `Display`, as the "other" domain type |
/// | `base` | The field is an embedded record whose attributes are inherited |
///
/// # Generated Code
///
/// The macro generates:
///
/// 1. Attribute name constants (e.g., `Task::NAME`, `Task::PRIORITY`)
/// 2. An implementation of `rsql_filter::Record`
///
/// # Example
///
/// ```ignore
/// use rsql_filter::{make_filter_tool, Record};
///
/// #[derive(Record)]
/// struct Audit {
///     owner: String,
/// }
///
/// #[derive(Record)]
/// struct Task {
///     #[rsql(base)]
///     audit: Audit,
///
///     name: String,
///
///     #[rsql(rename = "prio")]
///     priority: Option<u8>,
///
///     #[rsql(other)]
///     status: Status,
///
///     #[rsql(skip)]
///     internal_id: u64,
/// }
///
/// let query = format!("{}==alice;{}=in=(1,2)", Audit::OWNER, Task::PRIO);
/// let results = make_filter_tool().filter(&tasks, &query)?;
/// ```
#[proc_macro_derive(Record, attributes(rsql))]
pub fn record_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::record_derive_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
