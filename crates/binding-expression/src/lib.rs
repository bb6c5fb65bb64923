//! Expression language for two-way data-binding templates.
//!
//! # Overview
//!
//! Expressions such as `user.name | uppercase` or `items[0].price * qty`
//! are compiled once into an immutable [`Expression`] and then evaluated
//! against an [`EvalCtx`] whose [`Scope`] supplies and receives values.
//! The language has JavaScript's dynamic values, filters and validators
//! reached through `|`, and small anonymous functions written `{: ... }`
//! or `{(a, b): ... }`.
//!
//! # Example
//!
//! ```
//! use binding_expression::{compile, EvalCtx, ScopeChain, Value};
//! use serde_json::json;
//! use std::rc::Rc;
//!
//! let expr = compile("greeting + ', ' + name | uppercase", false).unwrap();
//! let scope = ScopeChain::from_json(json!({"greeting": "hello", "name": "world"}));
//! let ctx = EvalCtx::new(Rc::new(scope));
//!
//! assert_eq!(expr.eval(&ctx).unwrap(), Value::from("HELLO, WORLD"));
//! ```

pub mod compiler;
pub mod declaration;
pub mod error;
pub mod eval_ctx;
pub mod expr;
pub mod functions;
pub mod lexer;
pub mod member;
pub mod operators;
pub mod parser;
pub mod scope;
pub mod token;
pub mod util;
pub mod value;

pub use compiler::{compile, CompileOptions, Compiler, Expression, PipeFunction};
pub use declaration::{EntityDeclaration, WatchDeclaration};
pub use error::{EvalError, LexError, ParseError};
pub use eval_ctx::{Datastore, EvalCtx, Listeners};
pub use expr::Expr;
pub use functions::{FunctionDefinition, FunctionRegistry, Functions};
pub use lexer::Lexer;
pub use scope::{Scope, ScopeChain};
pub use token::{Token, TokenKind};
pub use value::{Function, RegExpValue, Value};
