//! The compiled evaluator tree.
//!
//! The parser emits an [`Expr`] per grammar production; no other syntax
//! tree is kept. Nodes hold only immutable data, so one tree can be
//! evaluated any number of times against different contexts.

use crate::error::{EvalError, ParseError};
use crate::eval_ctx::EvalCtx;
use crate::functions::PipeFn;
use crate::member;
use crate::operators::{BinaryOp, Constant, UnaryOp};
use crate::scope::{Scope, ScopeChain};
use crate::util;
use crate::value::{RegExpValue, Value};
use indexmap::IndexMap;
use log::trace;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum Literal {
    Number(f64),
    String { value: String, as_date: bool },
    RegExp(Arc<RegExpValue>),
    Constant(Constant),
}

impl Literal {
    fn value(&self) -> Value {
        match self {
            Literal::Number(n) => Value::Number(*n),
            Literal::String { value, as_date } => {
                if *as_date {
                    if let Some(date) = util::parse_utc_date(value) {
                        return Value::Date(date);
                    }
                }
                Value::String(value.clone())
            }
            Literal::RegExp(re) => Value::RegExp(Arc::clone(re)),
            Literal::Constant(c) => c.value(),
        }
    }
}

/// A filter or validator resolved at compile time plus its argument
/// expressions (`name:arg1:arg2`).
#[derive(Clone)]
pub struct PipeCall {
    pub name: String,
    pub function: PipeFn,
    pub args: Vec<Expr>,
}

impl PipeCall {
    /// Calls the function with `input` prepended to the evaluated
    /// arguments and the context state as receiver.
    pub fn invoke(&self, ctx: &EvalCtx, input: Value) -> Result<Value, EvalError> {
        let mut args = Vec::with_capacity(self.args.len() + 1);
        args.push(input);
        for arg in &self.args {
            args.push(arg.eval(ctx)?);
        }
        (self.function)(&ctx.state, &args)
    }
}

impl fmt::Debug for PipeCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipeCall")
            .field("name", &self.name)
            .field("args", &self.args)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Literal),
    Identifier(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Assign {
        name: String,
        value: Box<Expr>,
    },
    FieldAccess {
        object: Box<Expr>,
        field: String,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    IndexAssign {
        object: Box<Expr>,
        index: Box<Expr>,
        value: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    ArrayLit(Vec<Expr>),
    /// Keys in source order; a repeated key keeps the last value.
    ObjectLit(Vec<(String, Expr)>),
    Closure {
        params: Arc<[String]>,
        body: Arc<Expr>,
    },
    FilterPipe {
        input: Box<Expr>,
        filter: PipeCall,
    },
    Throw(Box<Expr>),
    /// `;`-separated statements; yields the last value.
    Statements(Vec<Expr>),
}

impl Expr {
    pub fn number(n: f64) -> Expr {
        Expr::Literal(Literal::Number(n))
    }

    /// The name an assignment to this expression writes through: a bare
    /// identifier, or the trailing field of a field access.
    pub fn assignable_name(&self) -> Option<&str> {
        match self {
            Expr::Identifier(name) => Some(name),
            Expr::FieldAccess { field, .. } => Some(field),
            _ => None,
        }
    }

    pub fn eval(&self, ctx: &EvalCtx) -> Result<Value, EvalError> {
        match self {
            Expr::Literal(lit) => Ok(lit.value()),
            Expr::Identifier(name) => Ok(ctx.scope.get(name)),
            Expr::Unary { op, operand } => Ok(op.apply(&operand.eval(ctx)?)),
            Expr::Binary { left, op, right } => {
                let l = left.eval(ctx)?;
                let r = right.eval(ctx)?;
                Ok(op.apply(&l, &r))
            }
            Expr::Assign { name, value } => {
                let v = value.eval(ctx)?;
                Ok(ctx.scope.set(name, v))
            }
            Expr::FieldAccess { object, field } => Ok(member::get_path(&object.eval(ctx)?, field)),
            Expr::Index { object, index } => {
                let o = object.eval(ctx)?;
                let i = index.eval(ctx)?;
                Ok(member::get_index(&o, &i))
            }
            Expr::IndexAssign { object, index, value } => {
                let o = object.eval(ctx)?;
                let i = index.eval(ctx)?;
                let v = value.eval(ctx)?;
                member::set_index(&o, &i, v.clone());
                Ok(v)
            }
            Expr::Call { callee, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(arg.eval(ctx)?);
                }
                match callee.eval(ctx)? {
                    Value::Function(f) => f.call(ctx, &values),
                    _ => Err(ParseError::NotAFunction {
                        name: callee.assignable_name().unwrap_or("undefined").to_string(),
                    }
                    .into()),
                }
            }
            Expr::ArrayLit(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(item.eval(ctx)?);
                }
                Ok(Value::array(values))
            }
            Expr::ObjectLit(entries) => {
                let mut object = IndexMap::with_capacity(entries.len());
                for (key, value) in entries {
                    object.insert(key.clone(), value.eval(ctx)?);
                }
                Ok(Value::object(object))
            }
            Expr::Closure { params, body } => Ok(make_closure(ctx, params, body)),
            Expr::FilterPipe { input, filter } => {
                let value = input.eval(ctx)?;
                filter.invoke(ctx, value)
            }
            Expr::Throw(value) => Err(EvalError::Thrown(value.eval(ctx)?)),
            Expr::Statements(statements) => {
                let mut last = Value::Undefined;
                for statement in statements {
                    last = statement.eval(ctx)?;
                }
                Ok(last)
            }
        }
    }
}

/// Captures the current scope. Each call runs `body` in a fresh child of
/// it with `$` bound to the first argument and `params` bound by position.
fn make_closure(ctx: &EvalCtx, params: &Arc<[String]>, body: &Arc<Expr>) -> Value {
    let captured = ctx.clone();
    let params = Arc::clone(params);
    let body = Arc::clone(body);
    Value::function("closure", move |_caller, args| {
        trace!("invoking closure with {} argument(s)", args.len());
        let scope = ScopeChain::child(Rc::clone(&captured.scope));
        scope.define("$", args.first().cloned().unwrap_or_default());
        for (i, param) in params.iter().enumerate() {
            scope.set(param, args.get(i).cloned().unwrap_or_default());
        }
        body.eval(&captured.with_scope(Rc::new(scope)))
    })
}
