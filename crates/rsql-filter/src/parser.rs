//! Recursive-descent parser for RSQL/FIQL query text.
//!
//! # Grammar
//!
//! ```text
//! query      = or_expr
//! or_expr    = and_expr { "," and_expr }
//! and_expr   = atom { ";" atom }
//! atom       = "(" query ")" | comparison
//! comparison = selector operator arguments
//! arguments  = value | "(" value { "," value } ")"
//! value      = unquoted | "'" chars "'" | '"' chars '"'
//! ```
//!
//! `;` (AND) binds tighter than `,` (OR). Chains of the same connective
//! produce one [`Logical`](crate::Logical) node with every operand as a
//! child; a single operand is returned as-is. Whitespace is ignored around
//! operators, separators and parentheses.
//!
//! Quoted values have no escape sequences: they run to the next matching
//! quote. Unquoted values run until whitespace or one of `, ; ( )`.

use crate::ast::Node;
use crate::error::{ParseError, ParseErrorKind};
use crate::op::{OperatorCatalog, OperatorSpec};

type ParseResult<T> = std::result::Result<T, ParseError>;

/// Query parser bound to an operator catalog.
///
/// Parsing is pure and the parser is immutable, so one instance can serve
/// any number of threads.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    catalog: OperatorCatalog,
}

impl Parser {
    /// Creates a parser recognizing the operators in `catalog`.
    pub fn new(catalog: OperatorCatalog) -> Self {
        Parser { catalog }
    }

    /// Returns the catalog this parser recognizes.
    pub fn catalog(&self) -> &OperatorCatalog {
        &self.catalog
    }

    /// Parses query text into an expression tree.
    pub fn parse(&self, input: &str) -> ParseResult<Node> {
        let mut state = ParseState {
            cursor: Cursor::new(input),
            catalog: &self.catalog,
        };
        let node = state.or_expr()?;
        state.cursor.skip_whitespace();
        match state.cursor.peek() {
            None => Ok(node),
            Some(')') => Err(state.cursor.error(ParseErrorKind::UnbalancedParenthesis)),
            Some(c) => Err(state.cursor.error(ParseErrorKind::UnexpectedCharacter(c))),
        }
    }
}

struct ParseState<'a, 'c> {
    cursor: Cursor<'a>,
    catalog: &'c OperatorCatalog,
}

impl<'a, 'c> ParseState<'a, 'c> {
    fn or_expr(&mut self) -> ParseResult<Node> {
        let mut children = vec![self.and_expr()?];
        loop {
            self.cursor.skip_whitespace();
            if !self.cursor.eat(',') {
                break;
            }
            children.push(self.and_expr()?);
        }
        Ok(collapse(children, Node::or))
    }

    fn and_expr(&mut self) -> ParseResult<Node> {
        let mut children = vec![self.atom()?];
        loop {
            self.cursor.skip_whitespace();
            if !self.cursor.eat(';') {
                break;
            }
            children.push(self.atom()?);
        }
        Ok(collapse(children, Node::and))
    }

    fn atom(&mut self) -> ParseResult<Node> {
        self.cursor.skip_whitespace();
        match self.cursor.peek() {
            Some('(') => {
                let open = self.cursor.pos;
                self.cursor.bump();
                let node = self.or_expr()?;
                self.cursor.skip_whitespace();
                match self.cursor.peek() {
                    Some(')') => {
                        self.cursor.bump();
                        Ok(node)
                    }
                    None => Err(ParseError::new(ParseErrorKind::UnbalancedParenthesis, open)),
                    Some(c) => Err(self.cursor.error(ParseErrorKind::UnexpectedCharacter(c))),
                }
            }
            Some(')') => Err(self.cursor.error(ParseErrorKind::UnexpectedCharacter(')'))),
            Some(_) => self.comparison(),
            None => Err(self.cursor.error(ParseErrorKind::UnexpectedEnd)),
        }
    }

    fn comparison(&mut self) -> ParseResult<Node> {
        let selector = self.selector()?;
        self.cursor.skip_whitespace();
        let operator_pos = self.cursor.pos;
        let spec = self.operator()?;
        let arguments = self.arguments()?;

        if !spec.multi_value && arguments.len() > 1 {
            return Err(ParseError::new(
                ParseErrorKind::TooManyArguments {
                    operator: spec.operator,
                    count: arguments.len(),
                },
                operator_pos,
            ));
        }

        Ok(Node::comparison(selector, spec.operator, arguments))
    }

    fn selector(&mut self) -> ParseResult<&'a str> {
        let start = self.cursor.pos;
        let text = self
            .cursor
            .take_while(|c| !c.is_whitespace() && !is_reserved(c) && !is_operator_start(c));
        if text.is_empty() {
            return Err(match self.cursor.peek() {
                None => self.cursor.error(ParseErrorKind::UnexpectedEnd),
                Some(c) => self.cursor.error(ParseErrorKind::UnexpectedCharacter(c)),
            });
        }
        if !is_identifier(text) {
            return Err(ParseError::new(
                ParseErrorKind::InvalidSelector(text.to_string()),
                start,
            ));
        }
        Ok(text)
    }

    fn operator(&mut self) -> ParseResult<OperatorSpec> {
        self.cursor.skip_whitespace();
        let start = self.cursor.pos;
        match self.cursor.peek() {
            Some('=') => {
                self.cursor.bump();
                self.cursor.take_while(|c| c.is_ascii_lowercase());
                self.cursor.eat('=');
            }
            Some('!') => {
                self.cursor.bump();
                self.cursor.eat('=');
            }
            Some('<') | Some('>') => {
                self.cursor.bump();
                self.cursor.eat('=');
            }
            Some(c) => return Err(self.cursor.error(ParseErrorKind::UnexpectedCharacter(c))),
            None => return Err(self.cursor.error(ParseErrorKind::UnexpectedEnd)),
        }
        let token = self.cursor.since(start);
        self.catalog.get(token).ok_or_else(|| {
            ParseError::new(ParseErrorKind::UnknownOperator(token.to_string()), start)
        })
    }

    fn arguments(&mut self) -> ParseResult<Vec<String>> {
        self.cursor.skip_whitespace();
        if self.cursor.peek() != Some('(') {
            return Ok(vec![self.value()?.to_string()]);
        }

        let open = self.cursor.pos;
        self.cursor.bump();
        self.cursor.skip_whitespace();
        if self.cursor.eat(')') {
            return Err(ParseError::new(ParseErrorKind::EmptyArgumentGroup, open));
        }

        let mut values = Vec::new();
        loop {
            self.cursor.skip_whitespace();
            values.push(self.value()?.to_string());
            self.cursor.skip_whitespace();
            match self.cursor.peek() {
                Some(',') => self.cursor.bump(),
                Some(')') => {
                    self.cursor.bump();
                    return Ok(values);
                }
                None => return Err(ParseError::new(ParseErrorKind::UnbalancedParenthesis, open)),
                Some(c) => return Err(self.cursor.error(ParseErrorKind::UnexpectedCharacter(c))),
            }
        }
    }

    fn value(&mut self) -> ParseResult<&'a str> {
        match self.cursor.peek() {
            Some(quote @ ('\'' | '"')) => {
                let open = self.cursor.pos;
                self.cursor.bump();
                let inner = self.cursor.take_while(|c| c != quote);
                if !self.cursor.eat(quote) {
                    return Err(ParseError::new(ParseErrorKind::UnterminatedQuote, open));
                }
                Ok(inner)
            }
            Some(c) if c.is_whitespace() || is_reserved(c) => {
                Err(self.cursor.error(ParseErrorKind::UnexpectedCharacter(c)))
            }
            Some(_) => Ok(self
                .cursor
                .take_while(|c| !c.is_whitespace() && !is_reserved(c))),
            None => Err(self.cursor.error(ParseErrorKind::UnexpectedEnd)),
        }
    }
}

/// A single operand stands for itself; several become one logical node.
fn collapse(mut children: Vec<Node>, join: fn(Vec<Node>) -> Node) -> Node {
    if children.len() == 1 {
        children.remove(0)
    } else {
        join(children)
    }
}

fn is_reserved(c: char) -> bool {
    matches!(c, ',' | ';' | '(' | ')')
}

fn is_operator_start(c: char) -> bool {
    matches!(c, '=' | '!' | '<' | '>')
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Byte cursor over the query text.
struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Cursor { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        let input = self.input;
        &input[start..self.pos]
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }

    fn since(&self, start: usize) -> &'a str {
        let input = self.input;
        &input[start..self.pos]
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(kind, self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Connective, Logical};
    use crate::op::Operator;

    fn parser() -> Parser {
        let mut catalog = OperatorCatalog::rsql_defaults();
        catalog.register("=like=", Operator::Like, false).unwrap();
        Parser::new(catalog)
    }

    fn parse(input: &str) -> Node {
        parser().parse(input).unwrap()
    }

    fn parse_err(input: &str) -> ParseError {
        parser().parse(input).unwrap_err()
    }

    fn eq(selector: &str, arg: &str) -> Node {
        Node::comparison(selector, Operator::Equal, [arg])
    }

    // ==================== Comparisons ====================

    #[test]
    fn simple_comparison() {
        assert_eq!(parse("field1==f1"), eq("field1", "f1"));
    }

    #[test]
    fn whitespace_is_ignored() {
        assert_eq!(parse(" field1==f1"), eq("field1", "f1"));
        assert_eq!(parse("  field1 ==  f1 \t"), eq("field1", "f1"));
        assert_eq!(
            parse(" ( a==1 ; b==2 ) , c==3 "),
            parse("(a==1;b==2),c==3")
        );
        assert_eq!(parse("a=in=( x , y )"), parse("a=in=(x,y)"));
    }

    #[test]
    fn every_default_operator() {
        let cases = [
            ("a==1", Operator::Equal),
            ("a!=1", Operator::NotEqual),
            ("a=gt=1", Operator::GreaterThan),
            ("a>1", Operator::GreaterThan),
            ("a=ge=1", Operator::GreaterThanOrEqual),
            ("a>=1", Operator::GreaterThanOrEqual),
            ("a=lt=1", Operator::LessThan),
            ("a<1", Operator::LessThan),
            ("a=le=1", Operator::LessThanOrEqual),
            ("a<=1", Operator::LessThanOrEqual),
            ("a=in=1", Operator::In),
            ("a=out=1", Operator::NotIn),
            ("a=like=1", Operator::Like),
        ];
        for (input, expected) in cases {
            assert_eq!(
                parse(input),
                Node::comparison("a", expected, ["1"]),
                "input: {}",
                input
            );
        }
    }

    #[test]
    fn multi_value_arguments() {
        assert_eq!(
            parse("field1=in=(f1,f2,f3)"),
            Node::comparison("field1", Operator::In, ["f1", "f2", "f3"])
        );
        assert_eq!(
            parse("field1=out=(f1)"),
            Node::comparison("field1", Operator::NotIn, ["f1"])
        );
    }

    #[test]
    fn scalar_operator_accepts_single_grouped_value() {
        assert_eq!(parse("a==(x)"), eq("a", "x"));
    }

    #[test]
    fn quoted_values() {
        assert_eq!(parse("a=='hello world'"), eq("a", "hello world"));
        assert_eq!(parse("a==\"it's\""), eq("a", "it's"));
        assert_eq!(parse("a==''"), eq("a", ""));
        assert_eq!(parse("a=='x,y;(z)'"), eq("a", "x,y;(z)"));
        assert_eq!(
            parse("a=in=('one two', \"three\")"),
            Node::comparison("a", Operator::In, ["one two", "three"])
        );
    }

    #[test]
    fn unquoted_values_may_contain_operator_characters() {
        assert_eq!(parse("a==b=c"), eq("a", "b=c"));
        assert_eq!(parse("a==<>!"), eq("a", "<>!"));
        assert_eq!(parse("a==é"), eq("a", "é"));
    }

    // ==================== Logical structure ====================

    #[test]
    fn and_chain_is_flattened() {
        assert_eq!(
            parse("a==1;b==2;c==3"),
            Node::and(vec![eq("a", "1"), eq("b", "2"), eq("c", "3")])
        );
    }

    #[test]
    fn or_chain_is_flattened() {
        assert_eq!(
            parse("a==1,b==2,c==3"),
            Node::or(vec![eq("a", "1"), eq("b", "2"), eq("c", "3")])
        );
    }

    #[test]
    fn and_binds_tighter_than_or() {
        assert_eq!(
            parse("a==1,b==2;c==3"),
            Node::or(vec![
                eq("a", "1"),
                Node::and(vec![eq("b", "2"), eq("c", "3")])
            ])
        );
        assert_eq!(
            parse("a==1;b==2,c==3"),
            Node::or(vec![
                Node::and(vec![eq("a", "1"), eq("b", "2")]),
                eq("c", "3")
            ])
        );
    }

    #[test]
    fn parentheses_override_precedence() {
        assert_eq!(
            parse("field1==f1,(field2!=1;field3==false)"),
            Node::or(vec![
                eq("field1", "f1"),
                Node::and(vec![
                    Node::comparison("field2", Operator::NotEqual, ["1"]),
                    eq("field3", "false"),
                ])
            ])
        );
        assert_eq!(
            parse("(a==1,b==2);c==3"),
            Node::and(vec![
                Node::or(vec![eq("a", "1"), eq("b", "2")]),
                eq("c", "3")
            ])
        );
    }

    #[test]
    fn redundant_parentheses_collapse() {
        assert_eq!(parse("((a==1))"), eq("a", "1"));
    }

    #[test]
    fn logical_nodes_never_mix_connectives() {
        fn check(node: &Node) {
            if let Node::Logical(Logical { connective, children }) = node {
                assert!(children.len() >= 2);
                for child in children {
                    if let Node::Logical(inner) = child {
                        if *connective == Connective::Or {
                            assert_eq!(inner.connective, Connective::And);
                        }
                    }
                    check(child);
                }
            }
        }
        check(&parse("a==1;b==2,c==3;(d==4,e==5),f==6"));
    }

    #[test]
    fn display_round_trips() {
        for input in [
            "a==1",
            "a==1;b==2,c==3",
            "a==1;(b==2,c==3)",
            "(a==1;b==2);c==3",
            "a=in=(x,'y z')",
            "a=out=(x)",
            "a=='it,s'",
        ] {
            let tree = parse(input);
            assert_eq!(parse(&tree.to_string()), tree, "input: {}", input);
        }
    }

    // ==================== Errors ====================

    #[test]
    fn empty_input() {
        assert_eq!(parse_err("").kind, ParseErrorKind::UnexpectedEnd);
        assert_eq!(parse_err("   ").kind, ParseErrorKind::UnexpectedEnd);
    }

    #[test]
    fn unexpected_end() {
        assert_eq!(parse_err("a").kind, ParseErrorKind::UnexpectedEnd);
        assert_eq!(parse_err("a==").kind, ParseErrorKind::UnexpectedEnd);
        assert_eq!(parse_err("a==1;").kind, ParseErrorKind::UnexpectedEnd);
        assert_eq!(parse_err("a==1,").kind, ParseErrorKind::UnexpectedEnd);
    }

    #[test]
    fn unbalanced_parentheses() {
        let err = parse_err("(a==1");
        assert_eq!(err.kind, ParseErrorKind::UnbalancedParenthesis);
        assert_eq!(err.position, 0);

        let err = parse_err("a==1)");
        assert_eq!(err.kind, ParseErrorKind::UnbalancedParenthesis);
        assert_eq!(err.position, 4);

        assert_eq!(
            parse_err("a=in=(x,y").kind,
            ParseErrorKind::UnbalancedParenthesis
        );
    }

    #[test]
    fn unknown_operator() {
        let err = parse_err("a=foo=1");
        assert_eq!(err.kind, ParseErrorKind::UnknownOperator("=foo=".into()));
        assert_eq!(err.position, 1);

        assert_eq!(
            parse_err("a!1").kind,
            ParseErrorKind::UnknownOperator("!".into())
        );
        assert_eq!(
            parse_err("a=b").kind,
            ParseErrorKind::UnknownOperator("=b".into())
        );
    }

    #[test]
    fn like_is_unknown_without_registration() {
        let err = Parser::default().parse("a=like=x").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnknownOperator("=like=".into()));
    }

    #[test]
    fn empty_argument_group() {
        let err = parse_err("a=in=()");
        assert_eq!(err.kind, ParseErrorKind::EmptyArgumentGroup);
        assert_eq!(err.position, 5);
        assert_eq!(
            parse_err("a=in=(  )").kind,
            ParseErrorKind::EmptyArgumentGroup
        );
    }

    #[test]
    fn selector_starting_with_digit() {
        assert_eq!(
            parse_err("1field==x").kind,
            ParseErrorKind::InvalidSelector("1field".into())
        );
    }

    #[test]
    fn selector_with_dots_is_invalid() {
        assert_eq!(
            parse_err("a.b==x").kind,
            ParseErrorKind::InvalidSelector("a.b".into())
        );
    }

    #[test]
    fn unterminated_quote() {
        let err = parse_err("a=='abc");
        assert_eq!(err.kind, ParseErrorKind::UnterminatedQuote);
        assert_eq!(err.position, 3);
    }

    #[test]
    fn too_many_arguments_for_scalar_operator() {
        assert_eq!(
            parse_err("a==(x,y)").kind,
            ParseErrorKind::TooManyArguments {
                operator: Operator::Equal,
                count: 2
            }
        );
    }

    #[test]
    fn trailing_garbage() {
        assert_eq!(
            parse_err("a==1 b==2").kind,
            ParseErrorKind::UnexpectedCharacter('b')
        );
    }

    #[test]
    fn missing_selector() {
        assert_eq!(
            parse_err("==1").kind,
            ParseErrorKind::UnexpectedCharacter('=')
        );
        assert_eq!(parse_err("()").kind, ParseErrorKind::UnexpectedCharacter(')'));
    }
}
