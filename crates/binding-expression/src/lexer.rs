//! Expression tokenizer.
//!
//! A single left-to-right scan. The only state carried between tokens is
//! whether a `/` here may open a regular-expression literal: true at the
//! start and after anything that cannot end an operand, false after
//! identifiers, numbers, strings, regexps and closing brackets.

use crate::error::LexError;
use crate::operators::{Constant, Operator};
use crate::token::{Token, TokenKind};
use crate::util;
use crate::value::RegExpValue;
use log::trace;
use std::sync::Arc;

/// Decoded strings of exactly this many characters are read as UTC
/// timestamps (`2010-10-10T10:10:10Z`) when date parsing is on. This is a
/// length check only; the contents are not validated here.
pub const DATE_STRING_LENGTH: usize = 20;

pub struct Lexer<'a> {
    text: &'a str,
    chars: Vec<char>,
    index: usize,
    parse_dates: bool,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    /// Splits `text` into tokens.
    pub fn tokenize(text: &'a str, parse_dates: bool) -> Result<Vec<Token>, LexError> {
        let mut lexer = Lexer {
            text,
            chars: text.chars().collect(),
            index: 0,
            parse_dates,
            tokens: Vec::new(),
        };
        lexer.run()?;
        trace!("lexed {} tokens from '{}'", lexer.tokens.len(), text);
        Ok(lexer.tokens)
    }

    fn run(&mut self) -> Result<(), LexError> {
        let mut can_start_regexp = true;
        while let Some(ch) = self.current() {
            match ch {
                '"' | '\'' => {
                    self.read_string(ch)?;
                    can_start_regexp = false;
                }
                '(' | '[' => {
                    self.push_punctuation(ch.to_string(), 1);
                    can_start_regexp = true;
                }
                '{' => {
                    match self.peek() {
                        Some(next @ (':' | '(')) => self.push_punctuation(format!("{{{}", next), 2),
                        _ => self.push_punctuation("{".to_string(), 1),
                    }
                    can_start_regexp = true;
                }
                ')' | ']' | '}' => {
                    self.push_punctuation(ch.to_string(), 1);
                    can_start_regexp = false;
                }
                ':' | '.' | ',' | ';' => {
                    self.push_punctuation(ch.to_string(), 1);
                    can_start_regexp = true;
                }
                '/' if can_start_regexp => {
                    self.read_regexp()?;
                    can_start_regexp = false;
                }
                _ if ch.is_ascii_digit() => {
                    self.read_number();
                    can_start_regexp = false;
                }
                _ if is_ident_start(ch) => {
                    self.read_ident();
                    can_start_regexp = false;
                }
                _ if is_whitespace(ch) => {
                    self.index += 1;
                }
                _ => {
                    self.read_operator(ch)?;
                    can_start_regexp = true;
                }
            }
        }
        Ok(())
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index + 1).copied()
    }

    fn rest_from(&self, index: usize) -> String {
        util::tail(self.text, index)
    }

    fn push_punctuation(&mut self, text: String, width: usize) {
        self.tokens
            .push(Token::new(self.index, text, TokenKind::Punctuation));
        self.index += width;
    }

    /// Longest match wins: two characters, then one.
    fn read_operator(&mut self, ch: char) -> Result<(), LexError> {
        if let Some(next) = self.peek() {
            let pair: String = [ch, next].iter().collect();
            if let Some(op) = Operator::from_symbol(&pair) {
                self.tokens
                    .push(Token::new(self.index, pair, TokenKind::Operator(op)));
                self.index += 2;
                return Ok(());
            }
        }
        let single = ch.to_string();
        match Operator::from_symbol(&single) {
            Some(op) => {
                self.tokens
                    .push(Token::new(self.index, single, TokenKind::Operator(op)));
                self.index += 1;
                Ok(())
            }
            None => Err(LexError::UnexpectedCharacter {
                rest: self.rest_from(self.index),
                text: self.text.to_string(),
                column: self.index + 1,
            }),
        }
    }

    /// Digits and dots; anything that does not parse (`1.2.3`) is `NaN`.
    fn read_number(&mut self) {
        let start = self.index;
        while let Some(ch) = self.current() {
            if ch == '.' || ch.is_ascii_digit() {
                self.index += 1;
            } else {
                break;
            }
        }
        let text: String = self.chars[start..self.index].iter().collect();
        let value = text.parse::<f64>().unwrap_or(f64::NAN);
        self.tokens
            .push(Token::new(start, text, TokenKind::Number(value)));
    }

    /// Identifier characters, digits and embedded dots, so `a.b.c` is one
    /// token.
    fn read_ident(&mut self) {
        let start = self.index;
        while let Some(ch) = self.current() {
            if ch == '.' || is_ident_start(ch) || ch.is_ascii_digit() {
                self.index += 1;
            } else {
                break;
            }
        }
        let text: String = self.chars[start..self.index].iter().collect();
        let kind = match Constant::from_keyword(&text) {
            Some(constant) => TokenKind::Constant(constant),
            None => TokenKind::Identifier,
        };
        self.tokens.push(Token::new(start, text, kind));
    }

    fn read_string(&mut self, quote: char) -> Result<(), LexError> {
        let start = self.index;
        self.index += 1;
        let mut value = String::new();
        let mut escape = false;
        while let Some(ch) = self.current() {
            if escape {
                if ch == 'u' {
                    let hex: String = self.chars.iter().skip(self.index + 1).take(4).collect();
                    self.index += 4;
                    let decoded = u32::from_str_radix(&hex, 16)
                        .ok()
                        .map(|code| char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
                        .unwrap_or('\0');
                    value.push(decoded);
                } else {
                    value.push(unescape(ch));
                }
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == quote {
                self.index += 1;
                let raw: String = self.chars[start..self.index].iter().collect();
                let as_date = self.parse_dates && value.chars().count() == DATE_STRING_LENGTH;
                self.tokens
                    .push(Token::new(start, raw, TokenKind::String { value, as_date }));
                return Ok(());
            } else {
                value.push(ch);
            }
            self.index += 1;
        }
        Err(LexError::UnterminatedQuote {
            rest: self.rest_from(start),
            text: self.text.to_string(),
            column: start + 1,
        })
    }

    /// Pattern up to an unescaped `/`, then letter flags.
    fn read_regexp(&mut self) -> Result<(), LexError> {
        let start = self.index;
        self.index += 1;
        let mut pattern = String::new();
        let mut escape = false;
        while let Some(ch) = self.current() {
            if escape {
                pattern.push(ch);
                escape = false;
            } else if ch == '\\' {
                pattern.push(ch);
                escape = true;
            } else if ch == '/' {
                self.index += 1;
                let flags_start = self.index;
                // Flags are an identifier run; anything but i/m/s/g fails below.
                if matches!(self.current(), Some(c) if is_ident_start(c)) {
                    while matches!(self.current(), Some(c) if is_ident_start(c) || c.is_ascii_digit()) {
                        self.index += 1;
                    }
                }
                let flags: String = self.chars[flags_start..self.index].iter().collect();
                let compiled = RegExpValue::new(&pattern, &flags).map_err(|reason| {
                    LexError::InvalidRegExp {
                        pattern: pattern.clone(),
                        flags: flags.clone(),
                        text: self.text.to_string(),
                        column: start + 1,
                        reason,
                    }
                })?;
                self.tokens.push(Token::new(
                    start,
                    pattern,
                    TokenKind::RegExp(Arc::new(compiled)),
                ));
                return Ok(());
            } else {
                pattern.push(ch);
            }
            self.index += 1;
        }
        Err(LexError::UnterminatedRegExp {
            rest: self.rest_from(start),
            text: self.text.to_string(),
            column: start + 1,
        })
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
}

fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\r' | '\t' | '\n' | '\u{000B}')
}

fn unescape(ch: char) -> char {
    match ch {
        'n' => '\n',
        'f' => '\u{000C}',
        'r' => '\r',
        't' => '\t',
        'v' => '\u{000B}',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::BinaryOp;

    fn texts(src: &str) -> Vec<String> {
        Lexer::tokenize(src, false)
            .unwrap()
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_dotted_identifier_is_one_token() {
        let tokens = Lexer::tokenize("a.b.c + $x_1", false).unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].assignable_name(), Some("a.b.c"));
        assert_eq!(tokens[1].operator(), Some(Operator::Binary(BinaryOp::Add)));
        assert_eq!(tokens[2].text, "$x_1");
        assert_eq!(tokens[2].index, 8);
    }

    #[test]
    fn test_longest_operator_wins() {
        assert_eq!(texts("a<=b==c!=d&&e||f"), vec!["a", "<=", "b", "==", "c", "!=", "d", "&&", "e", "||", "f"]);
        assert_eq!(texts("a<b"), vec!["a", "<", "b"]);
        assert_eq!(texts("!a|f"), vec!["!", "a", "|", "f"]);
    }

    #[test]
    fn test_closure_markers() {
        assert_eq!(texts("{:$}"), vec!["{:", "$", "}"]);
        assert_eq!(texts("{(a):a}"), vec!["{(", "a", ")", ":", "a", "}"]);
        assert_eq!(texts("{a:1}"), vec!["{", "a", ":", "1", "}"]);
    }

    #[test]
    fn test_keywords_are_constants() {
        let tokens = Lexer::tokenize("null true false undefined nullish", false).unwrap();
        assert!(matches!(tokens[0].kind, TokenKind::Constant(Constant::Null)));
        assert!(matches!(tokens[3].kind, TokenKind::Constant(Constant::Undefined)));
        assert!(matches!(tokens[4].kind, TokenKind::Identifier));
        assert_eq!(tokens[0].assignable_name(), None);
    }

    #[test]
    fn test_numbers() {
        let tokens = Lexer::tokenize("12.5 7 1.2.3", false).unwrap();
        assert!(matches!(tokens[0].kind, TokenKind::Number(n) if n == 12.5));
        assert!(matches!(tokens[1].kind, TokenKind::Number(n) if n == 7.0));
        assert!(matches!(tokens[2].kind, TokenKind::Number(n) if n.is_nan()));
    }

    #[test]
    fn test_string_escapes() {
        let tokens = Lexer::tokenize(r#"'a\nb\'c' "A\t""#, false).unwrap();
        match &tokens[0].kind {
            TokenKind::String { value, .. } => assert_eq!(value, "a\nb'c"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(tokens[0].text, r#"'a\nb\'c'"#);
        match &tokens[1].kind {
            TokenKind::String { value, .. } => assert_eq!(value, "A\t"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_date_length_heuristic() {
        let src = "'2010-10-10T10:10:10Z' 'short'";
        let on = Lexer::tokenize(src, true).unwrap();
        assert!(matches!(on[0].kind, TokenKind::String { as_date: true, .. }));
        assert!(matches!(on[1].kind, TokenKind::String { as_date: false, .. }));
        let off = Lexer::tokenize(src, false).unwrap();
        assert!(matches!(off[0].kind, TokenKind::String { as_date: false, .. }));
    }

    #[test]
    fn test_regexp_vs_division() {
        let tokens = Lexer::tokenize("6 / 2 / 1", false).unwrap();
        assert_eq!(tokens.len(), 5);
        assert!(tokens[1].operator().is_some());

        let tokens = Lexer::tokenize("/a\\/b/gi.test(x)", false).unwrap();
        match &tokens[0].kind {
            TokenKind::RegExp(re) => {
                assert_eq!(re.source(), "a\\/b");
                assert_eq!(re.flags(), "gi");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(tokens[1].text, ".");
        assert_eq!(tokens[2].text, "test");

        let tokens = Lexer::tokenize("(a) / 2", false).unwrap();
        assert!(tokens[3].operator().is_some());
    }

    #[test]
    fn test_errors() {
        let err = Lexer::tokenize("a # b", false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Lexer Error: Unexpected next character [# b] in expression 'a # b' at column '3'."
        );
        assert!(matches!(
            Lexer::tokenize("'abc", false),
            Err(LexError::UnterminatedQuote { column: 1, .. })
        ));
        assert!(matches!(
            Lexer::tokenize("x = /abc", false),
            Err(LexError::UnterminatedRegExp { column: 5, .. })
        ));
        assert!(matches!(
            Lexer::tokenize("/(/", false),
            Err(LexError::InvalidRegExp { .. })
        ));
    }

    #[test]
    fn test_regexp_flags_take_the_whole_word() {
        match Lexer::tokenize("/a/g1", false) {
            Err(LexError::InvalidRegExp { flags, .. }) => assert_eq!(flags, "g1"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            Lexer::tokenize("/a/i_x", false),
            Err(LexError::InvalidRegExp { .. })
        ));
        let tokens = Lexer::tokenize("/a/ 1", false).unwrap();
        assert_eq!(tokens.len(), 2);
    }
}
