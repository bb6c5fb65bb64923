use crate::operators::{Constant, Operator};
use crate::value::RegExpValue;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum TokenKind {
    /// Brackets and separators: `( ) [ ] { } {: {( : . , ;`.
    Punctuation,
    Operator(Operator),
    Constant(Constant),
    /// A name, possibly dotted (`a.b.c`), read from scope.
    Identifier,
    Number(f64),
    /// Decoded string contents; `as_date` marks it for date parsing at
    /// evaluation time.
    String { value: String, as_date: bool },
    RegExp(Arc<RegExpValue>),
}

/// One lexical item. `index` is the character offset in the source.
#[derive(Debug, Clone)]
pub struct Token {
    pub index: usize,
    /// Source text; for regexps the pattern between the slashes.
    pub text: String,
    pub kind: TokenKind,
}

impl Token {
    pub fn new(index: usize, text: impl Into<String>, kind: TokenKind) -> Self {
        Token {
            index,
            text: text.into(),
            kind,
        }
    }

    /// True for the punctuation or operator token spelled `text`. Literal
    /// tokens never match, whatever their source text.
    pub fn is(&self, text: &str) -> bool {
        matches!(self.kind, TokenKind::Punctuation | TokenKind::Operator(_)) && self.text == text
    }

    /// True for the bare word `word`, such as `throw`.
    pub fn is_keyword(&self, word: &str) -> bool {
        matches!(self.kind, TokenKind::Identifier) && self.text == word
    }

    /// 1-based column for diagnostics.
    pub fn column(&self) -> usize {
        self.index + 1
    }

    /// The name this token can be assigned through, if any.
    pub fn assignable_name(&self) -> Option<&str> {
        match self.kind {
            TokenKind::Identifier => Some(&self.text),
            _ => None,
        }
    }

    pub fn operator(&self) -> Option<Operator> {
        match self.kind {
            TokenKind::Operator(op) => Some(op),
            _ => None,
        }
    }
}
