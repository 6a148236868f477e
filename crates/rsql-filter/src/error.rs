//! Error types for the rsql-filter crate.
//!
//! All failures surface through [`FilterError`]. Each variant carries an
//! HTTP-style status code (see [`FilterError::status`]) so callers sitting
//! behind a web layer can map errors without matching on every variant.

use std::fmt;

use thiserror::Error;

use crate::op::Operator;
use crate::value::DomainType;

/// Errors that can occur when parsing a query or applying it to records.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    /// The query text is malformed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The selector is not declared anywhere in the record's type chain.
    #[error("attribute '{attribute}' is not valid for records of type {type_name}")]
    UnknownAttribute {
        attribute: String,
        type_name: &'static str,
    },

    /// The attribute exists but its reader failed or is unavailable.
    #[error("failed to read attribute '{attribute}' on {type_name}: {source}")]
    AttributeAccess {
        attribute: String,
        type_name: &'static str,
        #[source]
        source: AccessError,
    },

    /// A textual argument could not be converted to the attribute's domain type.
    #[error("cannot convert '{value}' to {target} for attribute '{attribute}'")]
    Coercion {
        attribute: String,
        value: String,
        target: DomainType,
    },

    /// The operator parsed, but no evaluator exists for it.
    #[error("operator '{operator}' is not implemented")]
    UnsupportedOperator { operator: Operator },
}

impl FilterError {
    /// Returns the HTTP-style status code associated with this error.
    pub fn status(&self) -> u16 {
        match self {
            FilterError::Parse(_) => 400,
            FilterError::UnknownAttribute { .. } => 400,
            FilterError::AttributeAccess { .. } => 500,
            FilterError::Coercion { .. } => 400,
            FilterError::UnsupportedOperator { .. } => 501,
        }
    }

    /// Returns `true` if this error was raised while parsing the query text.
    pub fn is_parse(&self) -> bool {
        matches!(self, FilterError::Parse(_))
    }
}

/// Failure reported by a [`Record`](crate::Record) when reading an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// The record declares the attribute but exposes no reader for it.
    #[error("no reader available")]
    Unavailable,

    /// The reader ran and failed.
    #[error("{0}")]
    Failed(String),
}

/// A malformed query, with the byte offset where the problem was detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at position {position}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub position: usize,
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, position: usize) -> Self {
        ParseError { kind, position }
    }
}

/// The specific reason a query failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Input ended where more was expected.
    UnexpectedEnd,
    /// A character that cannot appear at this point.
    UnexpectedCharacter(char),
    /// A `(` without its `)`, or a stray `)`.
    UnbalancedParenthesis,
    /// An operator token not present in the catalog.
    UnknownOperator(String),
    /// `()` given as an argument list.
    EmptyArgumentGroup,
    /// A selector that is not an identifier, such as one starting with a digit.
    InvalidSelector(String),
    /// A quoted value without its closing quote.
    UnterminatedQuote,
    /// A single-valued operator received more than one argument.
    TooManyArguments { operator: Operator, count: usize },
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::UnexpectedEnd => write!(f, "unexpected end of input"),
            ParseErrorKind::UnexpectedCharacter(c) => write!(f, "unexpected character '{}'", c),
            ParseErrorKind::UnbalancedParenthesis => write!(f, "unbalanced parenthesis"),
            ParseErrorKind::UnknownOperator(token) => write!(f, "unknown operator '{}'", token),
            ParseErrorKind::EmptyArgumentGroup => write!(f, "empty argument group"),
            ParseErrorKind::InvalidSelector(s) => write!(f, "invalid selector '{}'", s),
            ParseErrorKind::UnterminatedQuote => write!(f, "unterminated quoted value"),
            ParseErrorKind::TooManyArguments { operator, count } => write!(
                f,
                "operator '{}' expects a single argument, got {}",
                operator, count
            ),
        }
    }
}

/// Result type for rsql-filter operations.
pub type Result<T> = std::result::Result<T, FilterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        let parse = FilterError::from(ParseError::new(ParseErrorKind::UnexpectedEnd, 0));
        assert_eq!(parse.status(), 400);
        assert!(parse.is_parse());

        let unknown = FilterError::UnknownAttribute {
            attribute: "x".into(),
            type_name: "Task",
        };
        assert_eq!(unknown.status(), 400);

        let access = FilterError::AttributeAccess {
            attribute: "x".into(),
            type_name: "Task",
            source: AccessError::Unavailable,
        };
        assert_eq!(access.status(), 500);

        let unsupported = FilterError::UnsupportedOperator {
            operator: Operator::Like,
        };
        assert_eq!(unsupported.status(), 501);
        assert!(!unsupported.is_parse());
    }

    #[test]
    fn messages() {
        let err = ParseError::new(ParseErrorKind::UnknownOperator("=foo=".into()), 4);
        assert_eq!(err.to_string(), "unknown operator '=foo=' at position 4");

        let err = FilterError::Coercion {
            attribute: "count".into(),
            value: "abc".into(),
            target: DomainType::Int32,
        };
        assert_eq!(
            err.to_string(),
            "cannot convert 'abc' to int32 for attribute 'count'"
        );

        let err = FilterError::UnsupportedOperator {
            operator: Operator::Like,
        };
        assert_eq!(err.to_string(), "operator '=like=' is not implemented");
    }
}
