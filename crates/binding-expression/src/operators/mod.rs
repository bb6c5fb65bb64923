//! The fixed operator table.
//!
//! Every symbol the lexer accepts maps to one [`Operator`]; binary ones
//! dispatch through [`BinaryOp::apply`] to the per-family modules.

pub mod arithmetic;
pub mod bitwise;
pub mod comparison;
pub mod logical;

use crate::value::Value;

/// Named constants that lex like identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constant {
    Null,
    True,
    False,
    Undefined,
}

impl Constant {
    pub fn from_keyword(word: &str) -> Option<Constant> {
        match word {
            "null" => Some(Constant::Null),
            "true" => Some(Constant::True),
            "false" => Some(Constant::False),
            "undefined" => Some(Constant::Undefined),
            _ => None,
        }
    }

    pub fn value(self) -> Value {
        match self {
            Constant::Null => Value::Null,
            Constant::True => Value::Bool(true),
            Constant::False => Value::Bool(false),
            Constant::Undefined => Value::Undefined,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitXor,
    BitAnd,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
}

impl BinaryOp {
    pub fn apply(self, left: &Value, right: &Value) -> Value {
        match self {
            BinaryOp::Add => arithmetic::add(left, right),
            BinaryOp::Sub => arithmetic::subtract(left, right),
            BinaryOp::Mul => arithmetic::multiply(left, right),
            BinaryOp::Div => arithmetic::divide(left, right),
            BinaryOp::Rem => arithmetic::remainder(left, right),
            BinaryOp::BitXor => bitwise::xor(left, right),
            BinaryOp::BitAnd => bitwise::and(left, right),
            BinaryOp::Eq => comparison::eq(left, right),
            BinaryOp::NotEq => comparison::ne(left, right),
            BinaryOp::Lt => comparison::lt(left, right),
            BinaryOp::Gt => comparison::gt(left, right),
            BinaryOp::LtEq => comparison::lte(left, right),
            BinaryOp::GtEq => comparison::gte(left, right),
            BinaryOp::And => logical::and(left, right),
            BinaryOp::Or => logical::or(left, right),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
}

impl UnaryOp {
    pub fn apply(self, operand: &Value) -> Value {
        match self {
            UnaryOp::Not => logical::not(operand),
        }
    }
}

/// Every operator symbol, including the ones the parser handles
/// structurally (`=` and the `|` pipe).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Binary(BinaryOp),
    Unary(UnaryOp),
    Assign,
    Pipe,
}

const SYMBOLS: &[(&str, Operator)] = &[
    ("+", Operator::Binary(BinaryOp::Add)),
    ("-", Operator::Binary(BinaryOp::Sub)),
    ("*", Operator::Binary(BinaryOp::Mul)),
    ("/", Operator::Binary(BinaryOp::Div)),
    ("%", Operator::Binary(BinaryOp::Rem)),
    ("^", Operator::Binary(BinaryOp::BitXor)),
    ("=", Operator::Assign),
    ("==", Operator::Binary(BinaryOp::Eq)),
    ("!=", Operator::Binary(BinaryOp::NotEq)),
    ("<", Operator::Binary(BinaryOp::Lt)),
    (">", Operator::Binary(BinaryOp::Gt)),
    ("<=", Operator::Binary(BinaryOp::LtEq)),
    (">=", Operator::Binary(BinaryOp::GtEq)),
    ("&&", Operator::Binary(BinaryOp::And)),
    ("||", Operator::Binary(BinaryOp::Or)),
    ("&", Operator::Binary(BinaryOp::BitAnd)),
    ("|", Operator::Pipe),
    ("!", Operator::Unary(UnaryOp::Not)),
];

impl Operator {
    pub fn from_symbol(symbol: &str) -> Option<Operator> {
        SYMBOLS
            .iter()
            .find(|(s, _)| *s == symbol)
            .map(|(_, op)| *op)
    }

    pub fn symbol(self) -> &'static str {
        SYMBOLS
            .iter()
            .find(|(_, op)| *op == self)
            .map(|(s, _)| *s)
            .unwrap_or("?")
    }
}
