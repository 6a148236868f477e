//! Filter façade: parse, compile, apply.
//!
//! [`FilterTool`] is the entry point. It owns a parser and a configuration
//! and is otherwise stateless. [`CompiledQuery`] holds a parsed and compiled
//! query for reuse across collections.

use tracing::{debug, warn};

use crate::ast::Node;
use crate::config::{FilterConfig, ParseErrorPolicy};
use crate::error::{FilterError, Result};
use crate::op::{Operator, OperatorCatalog};
use crate::parser::Parser;
use crate::predicate::{compile, Predicate};
use crate::record::Record;

/// Creates a filter tool with the default RSQL operators plus `=like=`.
pub fn make_filter_tool() -> FilterTool {
    FilterTool::new()
}

/// Filters record collections with RSQL query text.
///
/// # Example
///
/// ```
/// use rsql_filter::{make_filter_tool, AccessError, AttributeValue, DomainType, Record, Value};
///
/// struct Task {
///     name: String,
///     done: bool,
/// }
///
/// impl Record for Task {
///     fn type_name(&self) -> &'static str {
///         "Task"
///     }
///
///     fn attribute_names(&self) -> &'static [&'static str] {
///         &["name", "done"]
///     }
///
///     fn attribute_type(&self, name: &str) -> Option<DomainType> {
///         match name {
///             "name" => Some(DomainType::Text),
///             "done" => Some(DomainType::Bool),
///             _ => None,
///         }
///     }
///
///     fn read_attribute(&self, name: &str) -> Result<Value<'_>, AccessError> {
///         match name {
///             "name" => Ok(self.name.to_value()),
///             "done" => Ok(self.done.to_value()),
///             _ => Err(AccessError::Unavailable),
///         }
///     }
/// }
///
/// let tasks = vec![
///     Task { name: "Write docs".into(), done: false },
///     Task { name: "Fix bug".into(), done: true },
/// ];
///
/// let tool = make_filter_tool();
/// let open = tool.filter(&tasks, "done==false").unwrap();
/// assert_eq!(open.len(), 1);
/// assert_eq!(open[0].name, "Write docs");
/// ```
#[derive(Debug, Clone)]
pub struct FilterTool {
    parser: Parser,
    config: FilterConfig,
}

impl FilterTool {
    /// Creates a tool with the default configuration.
    pub fn new() -> Self {
        FilterTool::with_config(FilterConfig::new())
    }

    /// Creates a tool with the given configuration.
    pub fn with_config(config: FilterConfig) -> Self {
        let mut catalog = OperatorCatalog::rsql_defaults();
        if config.like_operator {
            catalog.insert("=like=", Operator::Like, false);
        }
        FilterTool {
            parser: Parser::new(catalog),
            config,
        }
    }

    /// Creates a tool around a custom parser, for catalogs with extra
    /// aliases or without some default operators.
    pub fn with_parser(parser: Parser, config: FilterConfig) -> Self {
        FilterTool { parser, config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    /// Parses query text into an expression tree.
    pub fn parse(&self, query: &str) -> Result<Node> {
        match self.parser.parse(query) {
            Ok(node) => {
                debug!(query = %node, "parsed query");
                Ok(node)
            }
            Err(err) => {
                warn!(query, error = %err, "failed to parse query");
                Err(err.into())
            }
        }
    }

    /// Parses and compiles query text for repeated use.
    pub fn compile(&self, query: &str) -> Result<CompiledQuery> {
        self.parse(query).map(CompiledQuery::new)
    }

    /// Returns the records matching `query`, in input order.
    ///
    /// Fails on the first error raised by any record; partial results are
    /// never returned. Parse failures follow the configured
    /// [`ParseErrorPolicy`].
    pub fn filter<'a, R: Record>(&self, records: &'a [R], query: &str) -> Result<Vec<&'a R>> {
        match self.compile(query) {
            Ok(compiled) => compiled.filter(records),
            Err(FilterError::Parse(err)) => match self.config.on_parse_error {
                ParseErrorPolicy::Propagate => Err(FilterError::Parse(err)),
                ParseErrorPolicy::MatchAll => {
                    warn!(count = records.len(), "query rejected, returning every record");
                    Ok(records.iter().collect())
                }
                ParseErrorPolicy::MatchNone => {
                    warn!("query rejected, returning no records");
                    Ok(Vec::new())
                }
            },
            Err(other) => Err(other),
        }
    }

    /// Like [`filter`](FilterTool::filter), cloning the matching records.
    pub fn filter_cloned<R: Record + Clone>(&self, records: &[R], query: &str) -> Result<Vec<R>> {
        Ok(self.filter(records, query)?.into_iter().cloned().collect())
    }
}

impl Default for FilterTool {
    fn default() -> Self {
        FilterTool::new()
    }
}

/// A parsed and compiled query.
///
/// Immutable and `Send + Sync`; apply it to as many collections as needed.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    node: Node,
    predicate: Predicate,
}

impl CompiledQuery {
    /// Compiles an expression tree.
    pub fn new(node: Node) -> Self {
        let predicate = compile(&node);
        CompiledQuery { node, predicate }
    }

    /// The expression tree this query was compiled from.
    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Tests a single record.
    pub fn matches<R: Record>(&self, record: &R) -> Result<bool> {
        self.predicate.test(record)
    }

    /// Returns the matching records, in input order.
    pub fn filter<'a, R: Record>(&self, records: &'a [R]) -> Result<Vec<&'a R>> {
        let mut results = Vec::new();
        for record in records {
            if self.predicate.test(record)? {
                results.push(record);
            }
        }
        Ok(results)
    }

    /// Filters and clones matching records.
    pub fn filter_cloned<R: Record + Clone>(&self, records: &[R]) -> Result<Vec<R>> {
        Ok(self.filter(records)?.into_iter().cloned().collect())
    }

    /// Keeps only matching records. On error the vector is left unchanged.
    pub fn retain<R: Record>(&self, records: &mut Vec<R>) -> Result<()> {
        let mut keep = Vec::with_capacity(records.len());
        for record in records.iter() {
            keep.push(self.predicate.test(record)?);
        }
        let mut flags = keep.into_iter();
        records.retain(|_| flags.next().unwrap_or(false));
        Ok(())
    }

    /// Counts the matching records.
    pub fn count<R: Record>(&self, records: &[R]) -> Result<usize> {
        let mut count = 0;
        for record in records {
            if self.predicate.test(record)? {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Finds the first matching record.
    pub fn find<'a, R: Record>(&self, records: &'a [R]) -> Result<Option<&'a R>> {
        for record in records {
            if self.predicate.test(record)? {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }
}
