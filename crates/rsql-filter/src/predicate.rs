//! Predicate compiler.
//!
//! [`compile`] folds an expression tree into a [`Predicate`], a reusable
//! test over records. Argument coercion happens each time a comparison is
//! applied, using the declared type of the attribute on the record at hand,
//! so one predicate works across record types.
//!
//! # Comparison Semantics
//!
//! | Operator | Null attribute | No arguments | Otherwise |
//! |----------|----------------|--------------|-----------|
//! | `==` | true iff no arguments | false | value equals first argument |
//! | `!=` | negation of `==` | negation of `==` | negation of `==` |
//! | `=in=` | false | false | value equals any argument |
//! | `=out=` | true | true | value equals no argument |
//!
//! Ordering operators and `=like=` fail with
//! [`FilterError::UnsupportedOperator`] when applied, never when compiled.

use tracing::warn;

use crate::ast::{Comparison, Connective, Logical, Node};
use crate::error::{FilterError, Result};
use crate::op::Operator;
use crate::record::{resolve, Record, Resolved};
use crate::value::{coerce, coerce_one, CoercionFailure, DomainType, Literal};

/// A compiled query: a pure function from record to match/no-match.
///
/// Predicates own their data and hold no state, so they are `Send + Sync`
/// and can be applied to any number of collections.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches nothing.
    Never,
    /// Matches when every child matches. Stops at the first non-match.
    All(Vec<Predicate>),
    /// Matches when some child matches. Stops at the first match.
    Any(Vec<Predicate>),
    /// A single attribute comparison.
    Compare(ComparisonPredicate),
}

/// Compiles an expression tree into a predicate.
pub fn compile(node: &Node) -> Predicate {
    match node {
        Node::Comparison(comparison) => Predicate::Compare(ComparisonPredicate::new(comparison)),
        Node::Logical(logical) => compile_logical(logical),
    }
}

fn compile_logical(logical: &Logical) -> Predicate {
    if logical.children.is_empty() {
        warn!(
            connective = ?logical.connective,
            "logical node has no children, compiling to a predicate that matches nothing"
        );
        return Predicate::Never;
    }
    if logical.children.len() == 1 {
        return compile(&logical.children[0]);
    }
    let children = logical.children.iter().map(compile).collect();
    match logical.connective {
        Connective::And => Predicate::All(children),
        Connective::Or => Predicate::Any(children),
    }
}

impl Predicate {
    /// Tests a record.
    ///
    /// The first error aborts evaluation. Because children are
    /// short-circuited, comparisons after the deciding child are not run.
    pub fn test(&self, record: &dyn Record) -> Result<bool> {
        match self {
            Predicate::Never => Ok(false),
            Predicate::All(children) => {
                for child in children {
                    if !child.test(record)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Predicate::Any(children) => {
                for child in children {
                    if child.test(record)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Predicate::Compare(comparison) => comparison.test(record),
        }
    }
}

/// Compiled form of a single [`Comparison`].
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonPredicate {
    selector: String,
    operator: Operator,
    arguments: Vec<String>,
}

impl ComparisonPredicate {
    fn new(comparison: &Comparison) -> Self {
        ComparisonPredicate {
            selector: comparison.selector.clone(),
            operator: comparison.operator,
            arguments: comparison.arguments.clone(),
        }
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Evaluates the comparison against a record.
    pub fn test(&self, record: &dyn Record) -> Result<bool> {
        match self.operator {
            Operator::Equal => self.equal(record),
            Operator::NotEqual => self.equal(record).map(|matched| !matched),
            Operator::In => self.member(record),
            Operator::NotIn => self.not_member(record),
            Operator::GreaterThan
            | Operator::GreaterThanOrEqual
            | Operator::LessThan
            | Operator::LessThanOrEqual
            | Operator::Like => {
                warn!(
                    operator = %self.operator,
                    selector = %self.selector,
                    "operator has no evaluator"
                );
                Err(FilterError::UnsupportedOperator {
                    operator: self.operator,
                })
            }
        }
    }

    fn equal(&self, record: &dyn Record) -> Result<bool> {
        let Resolved { domain, value } = resolve(record, &self.selector)?;
        if value.is_null() {
            return Ok(self.arguments.is_empty());
        }
        let Some(first) = self.arguments.first() else {
            return Ok(false);
        };
        let literal = coerce_one(first, domain).map_err(|e| self.coercion_error(e))?;
        Ok(value.matches(&literal))
    }

    fn member(&self, record: &dyn Record) -> Result<bool> {
        let Resolved { domain, value } = resolve(record, &self.selector)?;
        if value.is_null() || self.arguments.is_empty() {
            return Ok(false);
        }
        let literals = self.coerce_all(domain)?;
        Ok(literals.iter().any(|literal| value.matches(literal)))
    }

    fn not_member(&self, record: &dyn Record) -> Result<bool> {
        let Resolved { domain, value } = resolve(record, &self.selector)?;
        if value.is_null() || self.arguments.is_empty() {
            return Ok(true);
        }
        let literals = self.coerce_all(domain)?;
        Ok(!literals.iter().any(|literal| value.matches(literal)))
    }

    fn coerce_all(&self, domain: DomainType) -> Result<Vec<Literal<'_>>> {
        coerce(&self.arguments, domain).map_err(|e| self.coercion_error(e))
    }

    fn coercion_error(&self, failure: CoercionFailure<'_>) -> FilterError {
        warn!(
            selector = %self.selector,
            value = failure.value,
            target = %failure.target,
            "query argument does not fit attribute type"
        );
        FilterError::Coercion {
            attribute: self.selector.clone(),
            value: failure.value.to_string(),
            target: failure.target,
        }
    }
}
