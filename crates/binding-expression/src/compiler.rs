//! Compilation entry points.
//!
//! Text goes through the lexer and parser once; the result is an immutable
//! tree that can be evaluated any number of times, from any thread that
//! owns its own contexts.

use crate::declaration::{EntityDeclaration, WatchDeclaration};
use crate::error::{EvalError, ParseError};
use crate::eval_ctx::EvalCtx;
use crate::expr::{Expr, PipeCall};
use crate::functions::Functions;
use crate::parser::Parser;
use crate::value::Value;
use log::debug;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// A compiled expression together with its source text.
#[derive(Clone)]
pub struct Expression {
    source: Arc<str>,
    root: Arc<Expr>,
}

impl Expression {
    pub fn new(source: &str, root: Expr) -> Self {
        Expression {
            source: Arc::from(source),
            root: Arc::new(root),
        }
    }

    pub fn eval(&self, ctx: &EvalCtx) -> Result<Value, EvalError> {
        self.root.eval(ctx)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &Expr {
        &self.root
    }

    /// Set when the whole expression can be written through, e.g. `a.b`.
    pub fn assignable_name(&self) -> Option<&str> {
        self.root.assignable_name()
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Expression").field(&self.source).finish()
    }
}

/// A lone filter or validator invocation such as `number:2`.
#[derive(Debug, Clone)]
pub struct PipeFunction {
    source: Arc<str>,
    call: Arc<PipeCall>,
}

impl PipeFunction {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn name(&self) -> &str {
        &self.call.name
    }

    /// Runs the function on `input`; arguments are evaluated against `ctx`.
    pub fn invoke(&self, ctx: &EvalCtx, input: Value) -> Result<Value, EvalError> {
        self.call.invoke(ctx, input)
    }
}

/// Options for [`Compiler`].
#[derive(Clone)]
pub struct CompileOptions {
    /// Read 20-character string literals as UTC dates.
    pub parse_dates: bool,
    pub functions: Arc<Functions>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            parse_dates: false,
            functions: standard_functions(),
        }
    }
}

fn standard_functions() -> Arc<Functions> {
    static STANDARD: OnceLock<Arc<Functions>> = OnceLock::new();
    Arc::clone(STANDARD.get_or_init(|| Arc::new(Functions::standard())))
}

/// Compiles expression text with a fixed set of options.
#[derive(Clone, Default)]
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Compiler { options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    fn parser<'a>(&'a self, text: &'a str) -> Result<Parser<'a>, ParseError> {
        let parser = Parser::new(text, self.options.parse_dates, &self.options.functions)?;
        debug!("compiling '{}' ({} tokens)", text, parser.token_count());
        Ok(parser)
    }

    /// Compiles `;`-separated statements; the value is the last one's.
    pub fn compile(&self, text: &str) -> Result<Expression, ParseError> {
        let mut parser = self.parser(text)?;
        let root = parser.statements()?;
        parser.assert_all_consumed()?;
        Ok(Expression::new(text, root))
    }

    pub fn compile_filter(&self, text: &str) -> Result<PipeFunction, ParseError> {
        let mut parser = self.parser(text)?;
        let call = parser.filter()?;
        parser.assert_all_consumed()?;
        Ok(PipeFunction {
            source: Arc::from(text),
            call: Arc::new(call),
        })
    }

    pub fn compile_validator(&self, text: &str) -> Result<PipeFunction, ParseError> {
        let mut parser = self.parser(text)?;
        let call = parser.validator()?;
        parser.assert_all_consumed()?;
        Ok(PipeFunction {
            source: Arc::from(text),
            call: Arc::new(call),
        })
    }

    pub fn compile_entity_declaration(&self, text: &str) -> Result<EntityDeclaration, ParseError> {
        let mut parser = self.parser(text)?;
        let decls = parser.entity_declaration()?;
        parser.assert_all_consumed()?;
        Ok(EntityDeclaration::new(decls))
    }

    pub fn compile_watch(&self, text: &str) -> Result<WatchDeclaration, ParseError> {
        let mut parser = self.parser(text)?;
        let decls = parser.watch()?;
        Ok(WatchDeclaration::new(decls))
    }
}

/// Compiles `text` against the built-in filters and validators.
pub fn compile(text: &str, parse_dates: bool) -> Result<Expression, ParseError> {
    Compiler::new(CompileOptions {
        parse_dates,
        ..CompileOptions::default()
    })
    .compile(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::ScopeChain;
    use std::rc::Rc;

    fn ctx() -> EvalCtx {
        EvalCtx::new(Rc::new(ScopeChain::new()))
    }

    #[test]
    fn test_expressions_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Expression>();
        assert_send_sync::<PipeFunction>();
        assert_send_sync::<Compiler>();
    }

    #[test]
    fn test_compiled_expression_is_reusable() {
        let expr = compile("a = a + 1", false).unwrap();
        let ctx = ctx();
        assert_eq!(expr.eval(&ctx).unwrap(), Value::from(1));
        assert_eq!(expr.eval(&ctx).unwrap(), Value::from(2));
        assert_eq!(expr.eval(&self::ctx()).unwrap(), Value::from(1));
    }

    #[test]
    fn test_compile_filter() {
        let compiler = Compiler::default();
        let filter = compiler.compile_filter("number:1").unwrap();
        assert_eq!(filter.name(), "number");
        let out = filter.invoke(&ctx(), Value::from(1234.56)).unwrap();
        assert_eq!(out, Value::from("1,234.6"));
        assert!(compiler.compile_filter("nope").is_err());
    }

    #[test]
    fn test_compile_validator() {
        let validator = Compiler::default().compile_validator("number:0:10").unwrap();
        assert_eq!(validator.invoke(&ctx(), Value::from(5)).unwrap(), Value::Null);
        assert_eq!(
            validator.invoke(&ctx(), Value::from(11)).unwrap(),
            Value::from("Value can not be greater than 10.")
        );
    }

    #[test]
    fn test_custom_functions() {
        let mut functions = Functions::standard();
        functions
            .filters
            .register("double", |_, args| Ok(Value::from(crate::util::to_number(&args[0]) * 2.0)));
        let compiler = Compiler::new(CompileOptions {
            parse_dates: false,
            functions: Arc::new(functions),
        });
        let expr = compiler.compile("5 | double").unwrap();
        assert_eq!(expr.eval(&ctx()).unwrap(), Value::from(10));
        assert!(compile("5 | double", false).is_err());
    }
}
