use crate::value::Value;
use thiserror::Error;

/// Failure while splitting an expression into tokens.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexError {
    #[error("Lexer Error: Unexpected next character [{rest}] in expression '{text}' at column '{column}'.")]
    UnexpectedCharacter {
        rest: String,
        text: String,
        column: usize,
    },

    #[error("Lexer Error: Unterminated quote [{rest}] starting at column '{column}' in expression '{text}'.")]
    UnterminatedQuote {
        rest: String,
        text: String,
        column: usize,
    },

    #[error("Lexer Error: Unterminated RegExp [{rest}] starting at column '{column}' in expression '{text}'.")]
    UnterminatedRegExp {
        rest: String,
        text: String,
        column: usize,
    },

    #[error("Lexer Error: Invalid RegExp /{pattern}/{flags} at column '{column}' in expression '{text}': {reason}")]
    InvalidRegExp {
        pattern: String,
        flags: String,
        text: String,
        column: usize,
        reason: String,
    },
}

/// Failure while turning tokens into an evaluator tree.
///
/// `NotAFunction` is the one variant raised while evaluating: callability is
/// only known once the callee value exists.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("Unexpected end of expression: {text}")]
    UnexpectedEnd { text: String },

    #[error("Did not understand '{rest}' while evaluating '{text}'.")]
    Unconsumed { rest: String, text: String },

    #[error("Left hand side '{left}' of assignment '{rest}' is not assignable.")]
    NotAssignable { left: String, rest: String },

    #[error("Function '{name}' at column '{column}' in '{text}' is not defined.")]
    UndefinedFunction {
        name: String,
        column: usize,
        text: String,
    },

    #[error("Token '{token}' is {message} at column='{column}' of expression '{text}' starting at '{rest}'.")]
    UnexpectedToken {
        token: String,
        message: &'static str,
        column: usize,
        text: String,
        rest: String,
    },

    #[error("Expecting '{expected}' at column '{column}' in '{text}' got '{rest}'.")]
    Expected {
        expected: &'static str,
        column: usize,
        text: String,
        rest: String,
    },

    #[error("Expression '{name}' is not a function.")]
    NotAFunction { name: String },
}

/// Failure while running a compiled expression against a context.
#[derive(Error, Debug, Clone)]
pub enum EvalError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Value raised by a `throw` expression.
    #[error("{0}")]
    Thrown(Value),

    #[error("Execution context has no {0}.")]
    MissingCollaborator(&'static str),

    /// Error reported by a host function (filter, validator, bound method).
    #[error("{0}")]
    Host(String),
}

impl EvalError {
    pub fn host(message: impl Into<String>) -> Self {
        EvalError::Host(message.into())
    }
}
