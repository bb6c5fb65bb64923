//! Recursive-descent parser producing [`Expr`] trees.
//!
//! Precedence, loosest first: statements (`;`), filter chain (`|`),
//! `throw`, assignment, `||`, `&&`, equality, relational, additive,
//! multiplicative, unary, primary with postfix calls, indexing and field
//! access. `||`, additive and multiplicative loop and associate left;
//! `&&`, equality and relational recurse into themselves and associate
//! right.

use crate::compiler::Expression;
use crate::declaration::{EntityDecl, WatchDecl};
use crate::error::ParseError;
use crate::expr::{Expr, Literal, PipeCall};
use crate::functions::{FunctionRegistry, Functions};
use crate::lexer::Lexer;
use crate::operators::{BinaryOp, Operator, UnaryOp};
use crate::token::{Token, TokenKind};
use crate::util;
use std::sync::Arc;

pub struct Parser<'a> {
    text: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    functions: &'a Functions,
}

impl<'a> Parser<'a> {
    /// Tokenizes `text` up front; lexical errors surface here.
    pub fn new(text: &'a str, parse_dates: bool, functions: &'a Functions) -> Result<Self, ParseError> {
        Ok(Parser {
            text,
            tokens: Lexer::tokenize(text, parse_dates)?,
            pos: 0,
            functions,
        })
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    // ------------------------------------------------------------ cursor

    fn has_tokens(&self) -> bool {
        self.pos < self.tokens.len()
    }

    fn peek_token(&self) -> Result<&Token, ParseError> {
        self.tokens.get(self.pos).ok_or_else(|| ParseError::UnexpectedEnd {
            text: self.text.to_string(),
        })
    }

    /// Next token if its text is one of `expected`; an empty list matches
    /// any token.
    fn peek(&self, expected: &[&str]) -> Option<&Token> {
        let token = self.tokens.get(self.pos)?;
        if expected.is_empty() || expected.iter().any(|e| token.is(e)) {
            Some(token)
        } else {
            None
        }
    }

    fn expect(&mut self, expected: &[&str]) -> Option<Token> {
        let token = self.peek(expected)?.clone();
        self.pos += 1;
        Some(token)
    }

    fn expect_any(&mut self) -> Result<Token, ParseError> {
        let token = self.peek_token()?.clone();
        self.pos += 1;
        Ok(token)
    }

    fn expect_binary(&mut self, symbols: &[&str]) -> Option<BinaryOp> {
        match self.peek(symbols)?.operator()? {
            Operator::Binary(op) => {
                self.pos += 1;
                Some(op)
            }
            _ => None,
        }
    }

    fn consume(&mut self, expected: &'static str) -> Result<(), ParseError> {
        if self.expect(&[expected]).is_some() {
            return Ok(());
        }
        let token = self.peek_token()?;
        Err(ParseError::Expected {
            expected,
            column: token.column(),
            text: self.text.to_string(),
            rest: util::tail(self.text, token.index),
        })
    }

    pub fn assert_all_consumed(&self) -> Result<(), ParseError> {
        match self.tokens.get(self.pos) {
            Some(token) => Err(ParseError::Unconsumed {
                rest: util::tail(self.text, token.index),
                text: self.text.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Character offset of the next token, or the end of the text.
    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or_else(|| self.text.chars().count(), |t| t.index)
    }

    fn source(&self, start: usize, end: usize) -> String {
        self.text
            .chars()
            .skip(start)
            .take(end.saturating_sub(start))
            .collect::<String>()
            .trim()
            .to_string()
    }

    fn unexpected(&self, token: &Token, message: &'static str) -> ParseError {
        ParseError::UnexpectedToken {
            token: token.text.clone(),
            message,
            column: token.column(),
            text: self.text.to_string(),
            rest: util::tail(self.text, token.index),
        }
    }

    // ------------------------------------------------------------ grammar

    /// `;`-separated filter chains. Stops before a closing bracket so
    /// closure bodies and blocks can reuse it.
    pub fn statements(&mut self) -> Result<Expr, ParseError> {
        let mut statements = Vec::new();
        loop {
            if self.has_tokens() && self.peek(&["}", ")", ";", "]"]).is_none() {
                statements.push(self.filter_chain()?);
            }
            if self.expect(&[";"]).is_none() {
                break;
            }
        }
        if statements.len() == 1 {
            if let Some(single) = statements.pop() {
                return Ok(single);
            }
        }
        Ok(Expr::Statements(statements))
    }

    fn filter_chain(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.expression()?;
        while self.expect(&["|"]).is_some() {
            let filter = self.filter()?;
            left = Expr::FilterPipe {
                input: Box::new(left),
                filter,
            };
        }
        Ok(left)
    }

    pub fn filter(&mut self) -> Result<PipeCall, ParseError> {
        let functions = self.functions;
        self.pipe_function(&functions.filters)
    }

    pub fn validator(&mut self) -> Result<PipeCall, ParseError> {
        let functions = self.functions;
        self.pipe_function(&functions.validators)
    }

    /// `name(:arg)*`, resolved against `registry` now rather than at
    /// evaluation time.
    fn pipe_function(&mut self, registry: &FunctionRegistry) -> Result<PipeCall, ParseError> {
        let token = self.expect_any()?;
        let function = registry
            .resolve(&token.text)
            .ok_or_else(|| ParseError::UndefinedFunction {
                name: token.text.clone(),
                column: token.column(),
                text: self.text.to_string(),
            })?;
        let mut args = Vec::new();
        while self.expect(&[":"]).is_some() {
            args.push(self.expression()?);
        }
        Ok(PipeCall {
            name: token.text,
            function,
            args,
        })
    }

    fn expression(&mut self) -> Result<Expr, ParseError> {
        if self.tokens.get(self.pos).is_some_and(|t| t.is_keyword("throw")) {
            self.pos += 1;
            return Ok(Expr::Throw(Box::new(self.assignment()?)));
        }
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, ParseError> {
        let left = self.logical_or()?;
        let Some(token) = self.expect(&["="]) else {
            return Ok(left);
        };
        let name = match left.assignable_name() {
            Some(name) => name.to_string(),
            None => {
                return Err(ParseError::NotAssignable {
                    left: util::head(self.text, token.index),
                    rest: util::tail(self.text, token.index),
                })
            }
        };
        Ok(Expr::Assign {
            name,
            value: Box::new(self.logical_or()?),
        })
    }

    fn logical_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.logical_and()?;
        while let Some(op) = self.expect_binary(&["||"]) {
            left = binary(left, op, self.logical_and()?);
        }
        Ok(left)
    }

    fn logical_and(&mut self) -> Result<Expr, ParseError> {
        let left = self.equality()?;
        match self.expect_binary(&["&&"]) {
            Some(op) => Ok(binary(left, op, self.logical_and()?)),
            None => Ok(left),
        }
    }

    fn equality(&mut self) -> Result<Expr, ParseError> {
        let left = self.relational()?;
        match self.expect_binary(&["==", "!="]) {
            Some(op) => Ok(binary(left, op, self.equality()?)),
            None => Ok(left),
        }
    }

    fn relational(&mut self) -> Result<Expr, ParseError> {
        let left = self.additive()?;
        match self.expect_binary(&["<", ">", "<=", ">="]) {
            Some(op) => Ok(binary(left, op, self.relational()?)),
            None => Ok(left),
        }
    }

    fn additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.multiplicative()?;
        while let Some(op) = self.expect_binary(&["+", "-"]) {
            left = binary(left, op, self.multiplicative()?);
        }
        Ok(left)
    }

    fn multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.unary()?;
        while let Some(op) = self.expect_binary(&["*", "/", "%"]) {
            left = binary(left, op, self.unary()?);
        }
        Ok(left)
    }

    /// Unary `+` is a no-op; `-x` is `0 - x`.
    fn unary(&mut self) -> Result<Expr, ParseError> {
        if self.expect(&["+"]).is_some() {
            self.primary()
        } else if self.expect(&["-"]).is_some() {
            Ok(binary(Expr::number(0.0), BinaryOp::Sub, self.unary()?))
        } else if self.expect(&["!"]).is_some() {
            Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(self.unary()?),
            })
        } else {
            self.primary()
        }
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let mut primary = if self.expect(&["("]).is_some() {
            let expression = self.filter_chain()?;
            self.consume(")")?;
            expression
        } else if self.expect(&["["]).is_some() {
            self.array()?
        } else if self.expect(&["{"]).is_some() {
            self.object()?
        } else if self.expect(&["{:"]).is_some() {
            self.closure(false)?
        } else if self.expect(&["{("]).is_some() {
            self.closure(true)?
        } else {
            let token = self.expect_any()?;
            self.atom(token)?
        };
        while let Some(next) = self.expect(&["(", "[", "."]) {
            primary = match next.text.as_str() {
                "(" => self.function_call(primary)?,
                "[" => self.object_index(primary)?,
                _ => self.field_access(primary)?,
            };
        }
        Ok(primary)
    }

    fn atom(&self, token: Token) -> Result<Expr, ParseError> {
        let literal = match token.kind {
            TokenKind::Identifier => return Ok(Expr::Identifier(token.text)),
            TokenKind::Constant(constant) => Literal::Constant(constant),
            TokenKind::Number(n) => Literal::Number(n),
            TokenKind::String { value, as_date } => Literal::String { value, as_date },
            TokenKind::RegExp(re) => Literal::RegExp(re),
            TokenKind::Punctuation | TokenKind::Operator(_) => {
                return Err(self.unexpected(&token, "not a primary expression"))
            }
        };
        Ok(Expr::Literal(literal))
    }

    /// `{: statements }` or `{( a, b ): statements }`; the opening token is
    /// already consumed.
    fn closure(&mut self, has_params: bool) -> Result<Expr, ParseError> {
        let mut params = Vec::new();
        if has_params {
            if self.expect(&[")"]).is_none() {
                params.push(self.expect_any()?.text);
                while self.expect(&[","]).is_some() {
                    params.push(self.expect_any()?.text);
                }
                self.consume(")")?;
            }
            self.consume(":")?;
        }
        let body = self.statements()?;
        self.consume("}")?;
        Ok(Expr::Closure {
            params: Arc::from(params),
            body: Arc::new(body),
        })
    }

    fn field_access(&mut self, object: Expr) -> Result<Expr, ParseError> {
        let field = self.expect_any()?.text;
        Ok(Expr::FieldAccess {
            object: Box::new(object),
            field,
        })
    }

    /// `[index]`, or `[index] = value` which writes into the base.
    fn object_index(&mut self, object: Expr) -> Result<Expr, ParseError> {
        let index = Box::new(self.expression()?);
        self.consume("]")?;
        if self.expect(&["="]).is_some() {
            return Ok(Expr::IndexAssign {
                object: Box::new(object),
                index,
                value: Box::new(self.expression()?),
            });
        }
        Ok(Expr::Index {
            object: Box::new(object),
            index,
        })
    }

    fn function_call(&mut self, callee: Expr) -> Result<Expr, ParseError> {
        let args = self.list(")")?;
        Ok(Expr::Call {
            callee: Box::new(callee),
            args,
        })
    }

    fn array(&mut self) -> Result<Expr, ParseError> {
        Ok(Expr::ArrayLit(self.list("]")?))
    }

    /// Comma-separated expressions up to and including `close`.
    fn list(&mut self, close: &'static str) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        if !self.peek_token()?.is(close) {
            loop {
                items.push(self.expression()?);
                if self.expect(&[","]).is_none() {
                    break;
                }
            }
        }
        self.consume(close)?;
        Ok(items)
    }

    /// Keys are bare words or quoted strings.
    fn object(&mut self) -> Result<Expr, ParseError> {
        let mut entries = Vec::new();
        if !self.peek_token()?.is("}") {
            loop {
                let token = self.expect_any()?;
                let key = match token.kind {
                    TokenKind::String { value, .. } => value,
                    _ => token.text,
                };
                self.consume(":")?;
                entries.push((key, self.expression()?));
                if self.expect(&[","]).is_none() {
                    break;
                }
            }
        }
        self.consume("}")?;
        Ok(Expr::ObjectLit(entries))
    }

    // ------------------------------------------------------------ declarations

    /// `Name`, `alias=Name`, each optionally followed by `: defaults`,
    /// separated by `;`.
    pub fn entity_declaration(&mut self) -> Result<Vec<EntityDecl>, ParseError> {
        let mut decls = Vec::new();
        while self.has_tokens() {
            decls.push(self.entity_decl()?);
            if self.expect(&[";"]).is_none() {
                self.assert_all_consumed()?;
            }
        }
        Ok(decls)
    }

    fn entity_decl(&mut self) -> Result<EntityDecl, ParseError> {
        let mut entity = self.expect_any()?.text;
        let mut instance = None;
        if self.expect(&["="]).is_some() {
            instance = Some(entity);
            entity = self.expect_any()?.text;
        }
        let defaults = match self.expect(&[":"]) {
            Some(_) => Some(self.primary()?),
            None => None,
        };
        Ok(EntityDecl {
            entity,
            instance,
            defaults,
        })
    }

    /// `anchor: expression` or `anchor: { statements }`, separated by `;`.
    pub fn watch(&mut self) -> Result<Vec<WatchDecl>, ParseError> {
        let mut decls = Vec::new();
        while self.has_tokens() {
            decls.push(self.watch_decl()?);
            if self.expect(&[";"]).is_none() {
                self.assert_all_consumed()?;
            }
        }
        self.assert_all_consumed()?;
        Ok(decls)
    }

    fn watch_decl(&mut self) -> Result<WatchDecl, ParseError> {
        let anchor = self.expect_any()?.text;
        self.consume(":")?;
        let (root, start, end) = if self.peek_token()?.is("{") {
            self.consume("{")?;
            let start = self.offset();
            let body = self.statements()?;
            let end = self.offset();
            self.consume("}")?;
            (body, start, end)
        } else {
            let start = self.offset();
            let body = self.expression()?;
            (body, start, self.offset())
        };
        Ok(WatchDecl {
            anchor,
            expression: Expression::new(&self.source(start, end), root),
        })
    }
}

fn binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Expr, ParseError> {
        let functions = Functions::standard();
        let mut parser = Parser::new(text, false, &functions)?;
        let expr = parser.statements()?;
        parser.assert_all_consumed()?;
        Ok(expr)
    }

    fn is_binary(expr: &Expr, expected: BinaryOp) -> bool {
        matches!(expr, Expr::Binary { op, .. } if *op == expected)
    }

    #[test]
    fn test_additive_is_left_associative() {
        match parse("1 - 2 - 3").unwrap() {
            Expr::Binary { left, op, right } => {
                assert_eq!(op, BinaryOp::Sub);
                assert!(is_binary(&left, BinaryOp::Sub));
                assert!(matches!(*right, Expr::Literal(Literal::Number(n)) if n == 3.0));
            }
            other => panic!("unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_relational_is_right_associative() {
        match parse("1 < 2 < 3").unwrap() {
            Expr::Binary { left, op, right } => {
                assert_eq!(op, BinaryOp::Lt);
                assert!(matches!(*left, Expr::Literal(Literal::Number(n)) if n == 1.0));
                assert!(is_binary(&right, BinaryOp::Lt));
            }
            other => panic!("unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_multiplication_binds_tighter_than_addition() {
        match parse("1 + 2 * 3").unwrap() {
            Expr::Binary { right, op, .. } => {
                assert_eq!(op, BinaryOp::Add);
                assert!(is_binary(&right, BinaryOp::Mul));
            }
            other => panic!("unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_unary_minus_is_zero_minus() {
        match parse("-x").unwrap() {
            Expr::Binary { left, op, right } => {
                assert_eq!(op, BinaryOp::Sub);
                assert!(matches!(*left, Expr::Literal(Literal::Number(n)) if n == 0.0));
                assert!(matches!(*right, Expr::Identifier(ref name) if name == "x"));
            }
            other => panic!("unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_double_negation_nests() {
        match parse("!!x").unwrap() {
            Expr::Unary { operand, .. } => assert!(matches!(*operand, Expr::Unary { .. })),
            other => panic!("unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_postfix_chain() {
        let expr = parse("a.b(1)[2].c").unwrap();
        assert_eq!(expr.assignable_name(), Some("c"));
        match expr {
            Expr::FieldAccess { object, .. } => match *object {
                Expr::Index { object, .. } => assert!(matches!(*object, Expr::Call { .. })),
                other => panic!("unexpected tree {:?}", other),
            },
            other => panic!("unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_index_assignment() {
        assert!(matches!(parse("a[0] = 1").unwrap(), Expr::IndexAssign { .. }));
    }

    #[test]
    fn test_statements_keep_empty_slots_out() {
        match parse("a=1;;b=2;").unwrap() {
            Expr::Statements(statements) => assert_eq!(statements.len(), 2),
            other => panic!("unexpected tree {:?}", other),
        }
        assert!(matches!(parse("").unwrap(), Expr::Statements(s) if s.is_empty()));
    }

    #[test]
    fn test_closure_params() {
        match parse("{(a, b): a + b}").unwrap() {
            Expr::Closure { params, .. } => assert_eq!(&*params, &["a".to_string(), "b".to_string()]),
            other => panic!("unexpected tree {:?}", other),
        }
        assert!(matches!(parse("{:$}").unwrap(), Expr::Closure { params, .. } if params.is_empty()));
    }

    #[test]
    fn test_object_keys_from_strings() {
        match parse("{'a b': 1, c: 2}").unwrap() {
            Expr::ObjectLit(entries) => {
                let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
                assert_eq!(keys, vec!["a b", "c"]);
            }
            other => panic!("unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_not_assignable() {
        let err = parse("1+1 = 2").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Left hand side '1+1 ' of assignment '= 2' is not assignable."
        );
    }

    #[test]
    fn test_unexpected_end() {
        let err = parse("1 +").unwrap_err();
        assert_eq!(err, ParseError::UnexpectedEnd { text: "1 +".to_string() });
    }

    #[test]
    fn test_unconsumed_tokens() {
        let err = parse("a b").unwrap_err();
        assert_eq!(err.to_string(), "Did not understand 'b' while evaluating 'a b'.");
    }

    #[test]
    fn test_expected_token() {
        let err = parse("(1 2").unwrap_err();
        assert_eq!(err.to_string(), "Expecting ')' at column '4' in '(1 2' got '2'.");
    }

    #[test]
    fn test_not_a_primary_expression() {
        let err = parse("*").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Token '*' is not a primary expression at column='1' of expression '*' starting at '*'."
        );
    }

    #[test]
    fn test_undefined_filter() {
        let err = parse("x | nope").unwrap_err();
        assert_eq!(err.to_string(), "Function 'nope' at column '5' in 'x | nope' is not defined.");
    }

    #[test]
    fn test_regexp_literal_is_never_punctuation() {
        match parse("/-/.test(x)").unwrap() {
            Expr::Call { callee, .. } => match *callee {
                Expr::FieldAccess { object, .. } => {
                    assert!(matches!(*object, Expr::Literal(Literal::RegExp(_))))
                }
                other => panic!("unexpected tree {:?}", other),
            },
            other => panic!("unexpected tree {:?}", other),
        }
        assert!(matches!(parse("[/-/]").unwrap(), Expr::ArrayLit(items) if items.len() == 1));
        assert!(matches!(parse("[/,/]").unwrap(), Expr::ArrayLit(items) if items.len() == 1));
        assert!(matches!(parse("{k: /:/}").unwrap(), Expr::ObjectLit(entries) if entries.len() == 1));
    }

    #[test]
    fn test_quoted_operator_is_a_string() {
        match parse("'-' + '('").unwrap() {
            Expr::Binary { left, op, .. } => {
                assert_eq!(op, BinaryOp::Add);
                assert!(matches!(*left, Expr::Literal(Literal::String { .. })));
            }
            other => panic!("unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_entity_declaration() {
        let functions = Functions::standard();
        let mut parser = Parser::new("Book; book=Book:{a:1}", false, &functions).unwrap();
        let decls = parser.entity_declaration().unwrap();
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].entity, "Book");
        assert!(decls[0].instance.is_none());
        assert_eq!(decls[1].instance.as_deref(), Some("book"));
        assert!(decls[1].defaults.is_some());
    }

    #[test]
    fn test_watch_sources() {
        let functions = Functions::standard();
        let mut parser = Parser::new("a: x = 1; b: { y = 2; z = 3 }", false, &functions).unwrap();
        let decls = parser.watch().unwrap();
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].anchor, "a");
        assert_eq!(decls[0].expression.source(), "x = 1");
        assert_eq!(decls[1].expression.source(), "y = 2; z = 3");
    }
}
