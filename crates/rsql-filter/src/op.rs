//! Comparison operators and the token catalog.
//!
//! The [`Operator`] enum is the closed set of operator identities. An
//! [`OperatorCatalog`] maps textual tokens such as `==` or `=in=` onto those
//! identities. Several tokens may share an identity (`>` and `=gt=`).

use std::collections::HashMap;
use std::fmt;

use serde::{Serialize, Serializer};

/// Comparison operator identity.
///
/// Equality, inequality and set membership have evaluators. The ordering
/// operators and `Like` parse normally but fail when applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `=gt=` or `>`
    GreaterThan,
    /// `=ge=` or `>=`
    GreaterThanOrEqual,
    /// `=lt=` or `<`
    LessThan,
    /// `=le=` or `<=`
    LessThanOrEqual,
    /// `=in=`
    In,
    /// `=out=`
    NotIn,
    /// `=like=`, an extension outside the default RSQL set.
    Like,
}

impl Operator {
    /// Every operator identity, in catalog order.
    pub const ALL: [Operator; 9] = [
        Operator::Equal,
        Operator::NotEqual,
        Operator::GreaterThan,
        Operator::GreaterThanOrEqual,
        Operator::LessThan,
        Operator::LessThanOrEqual,
        Operator::In,
        Operator::NotIn,
        Operator::Like,
    ];

    /// Returns the canonical token for this operator.
    pub fn token(self) -> &'static str {
        match self {
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::GreaterThan => "=gt=",
            Operator::GreaterThanOrEqual => "=ge=",
            Operator::LessThan => "=lt=",
            Operator::LessThanOrEqual => "=le=",
            Operator::In => "=in=",
            Operator::NotIn => "=out=",
            Operator::Like => "=like=",
        }
    }

    /// Returns `true` if the operator accepts more than one argument.
    pub fn is_multi_value(self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }

    /// Returns `true` if the predicate compiler has an evaluator for this operator.
    pub fn is_supported(self) -> bool {
        matches!(
            self,
            Operator::Equal | Operator::NotEqual | Operator::In | Operator::NotIn
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.token())
    }
}

/// Catalog entry: the identity a token maps to, plus its arity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorSpec {
    pub operator: Operator,
    pub multi_value: bool,
}

/// Rejected [`OperatorCatalog::register`] call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid operator token")]
pub struct InvalidToken(pub String);

/// Lookup table from operator token to [`OperatorSpec`].
///
/// Immutable once handed to a parser, so it can be shared freely between
/// threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorCatalog {
    entries: HashMap<String, OperatorSpec>,
}

impl OperatorCatalog {
    /// Creates a catalog with no operators.
    pub fn empty() -> Self {
        OperatorCatalog {
            entries: HashMap::new(),
        }
    }

    /// Creates a catalog with the eight default RSQL operators.
    ///
    /// Ordering operators are registered under both their FIQL and symbolic
    /// spellings.
    pub fn rsql_defaults() -> Self {
        let mut catalog = OperatorCatalog::empty();
        let defaults: [(&str, Operator); 12] = [
            ("==", Operator::Equal),
            ("!=", Operator::NotEqual),
            ("=gt=", Operator::GreaterThan),
            (">", Operator::GreaterThan),
            ("=ge=", Operator::GreaterThanOrEqual),
            (">=", Operator::GreaterThanOrEqual),
            ("=lt=", Operator::LessThan),
            ("<", Operator::LessThan),
            ("=le=", Operator::LessThanOrEqual),
            ("<=", Operator::LessThanOrEqual),
            ("=in=", Operator::In),
            ("=out=", Operator::NotIn),
        ];
        for (token, operator) in defaults {
            catalog.insert(token, operator, operator.is_multi_value());
        }
        catalog
    }

    /// Registers `token` for `operator`, replacing any existing entry.
    ///
    /// The token must be either a FIQL form (`=` then lowercase letters
    /// then `=`) or one of the symbolic forms the lexer recognizes.
    pub fn register(
        &mut self,
        token: &str,
        operator: Operator,
        multi_value: bool,
    ) -> std::result::Result<&mut Self, InvalidToken> {
        if !is_valid_token(token) {
            return Err(InvalidToken(token.to_string()));
        }
        self.insert(token, operator, multi_value);
        Ok(self)
    }

    pub(crate) fn insert(&mut self, token: &str, operator: Operator, multi_value: bool) {
        self.entries.insert(
            token.to_string(),
            OperatorSpec {
                operator,
                multi_value,
            },
        );
    }

    /// Looks up a token.
    pub fn get(&self, token: &str) -> Option<OperatorSpec> {
        self.entries.get(token).copied()
    }

    /// Returns `true` if the token is registered.
    pub fn contains(&self, token: &str) -> bool {
        self.entries.contains_key(token)
    }

    /// Returns the registered tokens, sorted.
    pub fn tokens(&self) -> Vec<&str> {
        let mut tokens: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        tokens.sort_unstable();
        tokens
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for OperatorCatalog {
    fn default() -> Self {
        OperatorCatalog::rsql_defaults()
    }
}

fn is_valid_token(token: &str) -> bool {
    if matches!(token, "==" | "!=" | "<" | "<=" | ">" | ">=") {
        return true;
    }
    token.len() >= 2
        && token.starts_with('=')
        && token.ends_with('=')
        && token[1..token.len() - 1]
            .chars()
            .all(|c| c.is_ascii_lowercase())
}
