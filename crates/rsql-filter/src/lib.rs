//! rsql-filter - In-memory RSQL/FIQL filtering for Rust collections.
//!
//! rsql-filter parses RSQL query text (`name==foo;status=in=(open,stale)`)
//! and applies it to slices of records. It supports:
//!
//! - The eight default RSQL operators plus a registrable `=like=` token
//! - AND (`;`), OR (`,`) and parenthesized grouping
//! - Quoted arguments and multi-value argument groups
//! - Attribute lookup through embedded base records
//! - Coercion of query arguments to each attribute's declared type
//!
//! # Quick Start
//!
//! ```rust
//! # #[cfg(feature = "derive")]
//! # {
//! use rsql_filter::{make_filter_tool, Record};
//!
//! #[derive(Record)]
//! struct Task {
//!     name: String,
//!     priority: Option<i32>,
//!     archived: bool,
//! }
//!
//! let tasks = vec![
//!     Task { name: "Write docs".into(), priority: Some(3), archived: false },
//!     Task { name: "Fix bug".into(), priority: Some(5), archived: false },
//!     Task { name: "Old task".into(), priority: None, archived: true },
//! ];
//!
//! let tool = make_filter_tool();
//! let results = tool
//!     .filter(&tasks, "priority=in=(3,5);archived==false")
//!     .unwrap();
//! assert_eq!(results.len(), 2);
//! assert_eq!(results[1].name, "Fix bug");
//! # }
//! ```
//!
//! # Evaluation Semantics
//!
//! | Operator | Null attribute | Otherwise |
//! |----------|----------------|-----------|
//! | `==`     | true iff no arguments | equal to the first argument |
//! | `!=`     | negation of `==` | negation of `==` |
//! | `=in=`   | false | equal to some argument |
//! | `=out=`  | true | equal to no argument |
//!
//! The ordering operators (`=gt=`, `>`, ...) and `=like=` parse, but
//! applying them to a non-empty collection fails with
//! [`FilterError::UnsupportedOperator`].
//!
//! Arguments are converted to the attribute's declared [`DomainType`]
//! before comparison: integers are parsed, booleans are `true` when the
//! text is `true` in any case and `false` otherwise.
//!
//! # Errors
//!
//! Every failure is a [`FilterError`]. [`FilterError::status`] maps it to an
//! HTTP-style status code for services that expose filtering to clients.

mod ast;
mod config;
mod error;
mod op;
mod parser;
mod predicate;
mod record;
mod tool;
mod value;

// Re-export public API
pub use ast::{Comparison, Connective, Logical, Node};
pub use config::{FilterConfig, ParseErrorPolicy};
pub use error::{AccessError, FilterError, ParseError, ParseErrorKind, Result};
pub use op::{InvalidToken, Operator, OperatorCatalog, OperatorSpec};
pub use parser::Parser;
pub use predicate::{compile, ComparisonPredicate, Predicate};
pub use record::{describe, resolve, visible_attributes, Record, Resolved};
pub use tool::{make_filter_tool, CompiledQuery, FilterTool};
pub use value::{
    coerce, coerce_one, display_option_value, display_value, AttributeValue, CoercionFailure,
    DomainType, Literal, Value,
};

#[cfg(feature = "derive")]
pub use rsql_filter_macros::Record;
