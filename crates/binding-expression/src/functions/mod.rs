//! Filter and validator registries used by the `|` pipe.
//!
//! Names are resolved when an expression is compiled, so an unknown filter
//! is a compile error. A registered function receives the context state and
//! the piped value followed by the evaluated `:`-arguments.

pub mod filters;
pub mod validators;

use crate::error::EvalError;
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub type PipeFn = Arc<dyn Fn(&Value, &[Value]) -> Result<Value, EvalError> + Send + Sync>;

/// Plain function form used by the built-in definitions.
pub type PipeEvalFn = fn(&Value, &[Value]) -> Result<Value, EvalError>;

/// A built-in filter or validator.
pub struct FunctionDefinition {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub eval_fn: PipeEvalFn,
}

/// Map of (possibly dotted) names to functions.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, PipeFn>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: &str, function: F) -> &mut Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        self.functions.insert(name.to_string(), Arc::new(function));
        self
    }

    pub fn resolve(&self, name: &str) -> Option<PipeFn> {
        self.functions.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}

/// Builds a registry from a list of definitions, aliases included.
pub fn definitions_to_registry(definitions: &[FunctionDefinition]) -> FunctionRegistry {
    let mut registry = FunctionRegistry::new();
    for def in definitions {
        registry.register(def.name, def.eval_fn);
        for alias in def.aliases {
            registry.register(alias, def.eval_fn);
        }
    }
    registry
}

/// The two registries an expression may pipe through.
#[derive(Clone, Default)]
pub struct Functions {
    pub filters: FunctionRegistry,
    pub validators: FunctionRegistry,
}

impl Functions {
    /// Empty registries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registries preloaded with the built-in filters and validators.
    pub fn standard() -> Self {
        Functions {
            filters: definitions_to_registry(filters::DEFINITIONS),
            validators: definitions_to_registry(validators::DEFINITIONS),
        }
    }
}

pub(crate) fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or_default()
}
