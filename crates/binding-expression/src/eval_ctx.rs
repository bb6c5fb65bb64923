use crate::compiler::Expression;
use crate::error::EvalError;
use crate::scope::Scope;
use crate::value::Value;
use std::rc::Rc;

/// Source of entity constructors for entity declarations.
pub trait Datastore {
    /// Returns a callable that creates documents of entity `name`.
    fn entity(&self, name: &str, defaults: Value) -> Result<Value, EvalError>;
}

/// Receiver of watch declarations.
pub trait Listeners {
    fn add_listener(&self, name: &str, handler: Expression);
}

/// The context every compiled expression is evaluated against.
///
/// Supplied fresh by the caller for each evaluation; compiled expressions
/// never hold on to it.
#[derive(Clone)]
pub struct EvalCtx {
    pub scope: Rc<dyn Scope>,
    /// Receiver handed to filters and validators.
    pub state: Value,
    pub datastore: Option<Rc<dyn Datastore>>,
    pub listeners: Option<Rc<dyn Listeners>>,
}

impl EvalCtx {
    pub fn new(scope: Rc<dyn Scope>) -> Self {
        EvalCtx {
            scope,
            state: Value::Undefined,
            datastore: None,
            listeners: None,
        }
    }

    pub fn with_state(mut self, state: Value) -> Self {
        self.state = state;
        self
    }

    pub fn with_datastore(mut self, datastore: Rc<dyn Datastore>) -> Self {
        self.datastore = Some(datastore);
        self
    }

    pub fn with_listeners(mut self, listeners: Rc<dyn Listeners>) -> Self {
        self.listeners = Some(listeners);
        self
    }

    /// Same collaborators, different scope.
    pub fn with_scope(&self, scope: Rc<dyn Scope>) -> Self {
        EvalCtx {
            scope,
            ..self.clone()
        }
    }

    pub fn datastore(&self) -> Result<&Rc<dyn Datastore>, EvalError> {
        self.datastore
            .as_ref()
            .ok_or(EvalError::MissingCollaborator("datastore"))
    }

    pub fn listeners(&self) -> Result<&Rc<dyn Listeners>, EvalError> {
        self.listeners
            .as_ref()
            .ok_or(EvalError::MissingCollaborator("listeners"))
    }
}
