//! Expression tree produced by the parser.
//!
//! A query is a tree of [`Comparison`] leaves joined by [`Logical`] nodes.
//! Trees hold no reference to the query text or to any record, so they can
//! be cached and reused freely. `Display` renders a tree back to canonical
//! query text.

use std::fmt;

use serde::Serialize;

use crate::op::Operator;

/// A node of the expression tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Comparison(Comparison),
    Logical(Logical),
}

/// `selector operator arguments`, e.g. `status=in=(open,blocked)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub selector: String,
    pub operator: Operator,
    pub arguments: Vec<String>,
}

/// Children joined by a single connective.
///
/// The parser never mixes connectives within one node; precedence is
/// encoded by nesting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Logical {
    pub connective: Connective,
    pub children: Vec<Node>,
}

/// Boolean connective of a [`Logical`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Connective {
    /// `;`
    And,
    /// `,`
    Or,
}

impl Connective {
    /// The separator character used in query text.
    pub fn symbol(self) -> char {
        match self {
            Connective::And => ';',
            Connective::Or => ',',
        }
    }
}

impl Node {
    /// Creates a comparison node.
    pub fn comparison<S, I, A>(selector: S, operator: Operator, arguments: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Node::Comparison(Comparison {
            selector: selector.into(),
            operator,
            arguments: arguments.into_iter().map(Into::into).collect(),
        })
    }

    /// Creates an AND node.
    pub fn and(children: Vec<Node>) -> Self {
        Node::Logical(Logical {
            connective: Connective::And,
            children,
        })
    }

    /// Creates an OR node.
    pub fn or(children: Vec<Node>) -> Self {
        Node::Logical(Logical {
            connective: Connective::Or,
            children,
        })
    }

    /// Returns every selector referenced in the tree, in order of appearance.
    pub fn selectors(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_selectors(&mut out);
        out
    }

    fn collect_selectors<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Node::Comparison(c) => out.push(&c.selector),
            Node::Logical(l) => {
                for child in &l.children {
                    child.collect_selectors(out);
                }
            }
        }
    }

    /// Returns every operator used in the tree, in order of appearance.
    pub fn operators(&self) -> Vec<Operator> {
        match self {
            Node::Comparison(c) => vec![c.operator],
            Node::Logical(l) => l.children.iter().flat_map(Node::operators).collect(),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Comparison(c) => c.fmt(f),
            Node::Logical(l) => l.fmt(f),
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.selector, self.operator)?;
        if self.arguments.len() == 1 && !self.operator.is_multi_value() {
            return write_argument(f, &self.arguments[0]);
        }
        f.write_str("(")?;
        for (i, arg) in self.arguments.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write_argument(f, arg)?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for Logical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.children.is_empty() {
            return f.write_str("()");
        }
        for (i, child) in self.children.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", self.connective.symbol())?;
            }
            let grouped = match child {
                Node::Logical(inner) => {
                    !(self.connective == Connective::Or && inner.connective == Connective::And)
                }
                Node::Comparison(_) => false,
            };
            if grouped {
                write!(f, "({})", child)?;
            } else {
                write!(f, "{}", child)?;
            }
        }
        Ok(())
    }
}

fn write_argument(f: &mut fmt::Formatter<'_>, arg: &str) -> fmt::Result {
    let needs_quotes = arg.is_empty()
        || arg.starts_with(['\'', '"'])
        || arg
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, ',' | ';' | '(' | ')'));
    if !needs_quotes {
        return f.write_str(arg);
    }
    if arg.contains('\'') {
        write!(f, "\"{}\"", arg)
    } else {
        write!(f, "'{}'", arg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eq(selector: &str, arg: &str) -> Node {
        Node::comparison(selector, Operator::Equal, [arg])
    }

    #[test]
    fn display_comparison() {
        assert_eq!(eq("name", "f1").to_string(), "name==f1");
        assert_eq!(
            Node::comparison("name", Operator::In, ["a", "b"]).to_string(),
            "name=in=(a,b)"
        );
        assert_eq!(
            Node::comparison("name", Operator::NotIn, ["a"]).to_string(),
            "name=out=(a)"
        );
    }

    #[test]
    fn display_quotes_when_needed() {
        assert_eq!(eq("name", "two words").to_string(), "name=='two words'");
        assert_eq!(eq("name", "it's").to_string(), "name==\"it's\"");
        assert_eq!(eq("name", "").to_string(), "name==''");
        assert_eq!(eq("name", "a,b").to_string(), "name=='a,b'");
        assert_eq!(eq("name", "a=b").to_string(), "name==a=b");
    }

    #[test]
    fn display_logical_precedence() {
        let tree = Node::or(vec![
            eq("a", "1"),
            Node::and(vec![eq("b", "2"), eq("c", "3")]),
        ]);
        assert_eq!(tree.to_string(), "a==1,b==2;c==3");

        let tree = Node::and(vec![
            eq("a", "1"),
            Node::or(vec![eq("b", "2"), eq("c", "3")]),
        ]);
        assert_eq!(tree.to_string(), "a==1;(b==2,c==3)");

        let tree = Node::and(vec![Node::and(vec![eq("a", "1"), eq("b", "2")]), eq("c", "3")]);
        assert_eq!(tree.to_string(), "(a==1;b==2);c==3");
    }

    #[test]
    fn selectors_and_operators() {
        let tree = Node::or(vec![
            eq("a", "1"),
            Node::and(vec![
                Node::comparison("b", Operator::NotEqual, ["2"]),
                Node::comparison("c", Operator::In, ["3"]),
            ]),
        ]);
        assert_eq!(tree.selectors(), vec!["a", "b", "c"]);
        assert_eq!(
            tree.operators(),
            vec![Operator::Equal, Operator::NotEqual, Operator::In]
        );
    }

    #[test]
    fn serializes_with_node_tag() {
        let json = serde_json::to_value(Node::and(vec![eq("a", "1")])).unwrap();
        assert_eq!(json["node"], "logical");
        assert_eq!(json["connective"], "and");
        assert_eq!(json["children"][0]["node"], "comparison");
        assert_eq!(json["children"][0]["operator"], "==");
        assert_eq!(json["children"][0]["arguments"][0], "1");
    }
}
