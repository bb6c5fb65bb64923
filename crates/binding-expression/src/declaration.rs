//! Entity and watch declarations.
//!
//! Both reuse the expression parser; evaluating them registers things with
//! the context's collaborators instead of producing a plain value.

use crate::compiler::Expression;
use crate::error::{EvalError, ParseError};
use crate::eval_ctx::EvalCtx;
use crate::expr::Expr;
use crate::member;
use crate::scope::ScopeChain;
use crate::util;
use crate::value::Value;
use log::trace;
use std::rc::Rc;
use std::sync::Arc;

/// One `[alias=]Name[: defaults]` item.
#[derive(Debug, Clone)]
pub struct EntityDecl {
    pub entity: String,
    pub instance: Option<String>,
    pub defaults: Option<Expr>,
}

impl EntityDecl {
    /// Registers the entity in scope. With an alias, also creates an
    /// anchored document and returns the code that reloads it from the
    /// anchor.
    fn declare(&self, ctx: &EvalCtx) -> Result<String, EvalError> {
        let defaults = match &self.defaults {
            // Defaults are constant data; they see no names.
            Some(expr) => expr.eval(&EvalCtx::new(Rc::new(ScopeChain::new())))?,
            None => Value::Undefined,
        };
        let constructor = ctx.datastore()?.entity(&self.entity, defaults)?;
        ctx.scope.set(&self.entity, constructor.clone());
        trace!("declared entity {}", self.entity);

        let Some(instance) = &self.instance else {
            return Ok(String::new());
        };
        let document = match &constructor {
            Value::Function(f) => f.call(ctx, &[])?,
            _ => {
                return Err(ParseError::NotAFunction {
                    name: self.entity.clone(),
                }
                .into())
            }
        };
        member::set_member(&document, "$$anchor", Value::from(instance.as_str()));
        ctx.scope.set(instance, document);
        Ok(format!(
            "$anchor.{i}:{{{i}={e}.load($anchor.{i});{i}.$$anchor={q};}};",
            i = instance,
            e = self.entity,
            q = util::quote(instance),
        ))
    }
}

/// A compiled entity declaration list.
#[derive(Debug, Clone)]
pub struct EntityDeclaration {
    decls: Arc<[EntityDecl]>,
}

impl EntityDeclaration {
    pub(crate) fn new(decls: Vec<EntityDecl>) -> Self {
        EntityDeclaration {
            decls: Arc::from(decls),
        }
    }

    pub fn decls(&self) -> &[EntityDecl] {
        &self.decls
    }

    /// Declares every entity in order and returns the concatenated anchor
    /// code of the aliased ones.
    pub fn declare(&self, ctx: &EvalCtx) -> Result<String, EvalError> {
        let mut code = String::new();
        for decl in self.decls.iter() {
            code.push_str(&decl.declare(ctx)?);
        }
        Ok(code)
    }
}

/// One `anchor: expression` item.
#[derive(Debug, Clone)]
pub struct WatchDecl {
    pub anchor: String,
    pub expression: Expression,
}

/// A compiled watch declaration list.
#[derive(Debug, Clone)]
pub struct WatchDeclaration {
    decls: Arc<[WatchDecl]>,
}

impl WatchDeclaration {
    pub(crate) fn new(decls: Vec<WatchDecl>) -> Self {
        WatchDeclaration {
            decls: Arc::from(decls),
        }
    }

    pub fn decls(&self) -> &[WatchDecl] {
        &self.decls
    }

    /// Hands every watch to the context's listeners.
    pub fn register(&self, ctx: &EvalCtx) -> Result<(), EvalError> {
        let listeners = ctx.listeners()?;
        for decl in self.decls.iter() {
            trace!("watching {} -> {}", decl.anchor, decl.expression.source());
            listeners.add_listener(&decl.anchor, decl.expression.clone());
        }
        Ok(())
    }
}
