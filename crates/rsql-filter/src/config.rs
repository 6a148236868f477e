//! Filter tool configuration.
//!
//! [`FilterConfig`] is plain data with serde support, so it can live in an
//! application's own config file:
//!
//! ```
//! use rsql_filter::{FilterConfig, ParseErrorPolicy};
//!
//! let config: FilterConfig = serde_json::from_str(r#"{ "on_parse_error": "match_all" }"#).unwrap();
//! assert_eq!(config.on_parse_error, ParseErrorPolicy::MatchAll);
//! ```

use serde::{Deserialize, Serialize};

/// What the filter façade does when the query text does not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorPolicy {
    /// Return the parse error to the caller.
    #[default]
    Propagate,
    /// Log a warning and return every input record.
    MatchAll,
    /// Log a warning and return no records.
    MatchNone,
}

/// Settings for a [`FilterTool`](crate::FilterTool).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Handling of malformed query text.
    pub on_parse_error: ParseErrorPolicy,
    /// Register the `=like=` operator token. On by default.
    pub like_operator: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig::new()
    }
}

impl FilterConfig {
    pub fn new() -> Self {
        FilterConfig {
            on_parse_error: ParseErrorPolicy::Propagate,
            like_operator: true,
        }
    }

    /// Sets the parse error policy.
    pub fn on_parse_error(mut self, policy: ParseErrorPolicy) -> Self {
        self.on_parse_error = policy;
        self
    }

    /// Enables or disables the `=like=` operator token.
    pub fn like_operator(mut self, enabled: bool) -> Self {
        self.like_operator = enabled;
        self
    }
}
