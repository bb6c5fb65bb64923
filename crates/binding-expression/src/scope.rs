//! Chained name lookup and assignment.

use crate::member;
use crate::util;
use crate::value::Value;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;

/// Namespace an expression reads from and assigns into.
///
/// Names may be dotted paths (`user.address.city`); how far up a chain a
/// lookup falls back is up to the implementation.
pub trait Scope {
    /// Returns `undefined` for unknown names.
    fn get(&self, name: &str) -> Value;

    /// Returns the assigned value.
    fn set(&self, name: &str, value: Value) -> Value;
}

/// Bindings with an optional parent. Reads fall back to the parent; plain
/// writes always land locally and shadow the parent.
#[derive(Default)]
pub struct ScopeChain {
    bindings: RefCell<IndexMap<String, Value>>,
    parent: Option<Rc<dyn Scope>>,
}

impl ScopeChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn child(parent: Rc<dyn Scope>) -> Self {
        ScopeChain {
            bindings: RefCell::new(IndexMap::new()),
            parent: Some(parent),
        }
    }

    /// Root scope seeded from the members of a JSON object. Anything other
    /// than an object yields an empty scope.
    pub fn from_json(value: serde_json::Value) -> Self {
        let scope = ScopeChain::new();
        if let serde_json::Value::Object(entries) = value {
            for (k, v) in entries {
                scope.define(&k, Value::from(v));
            }
        }
        scope
    }

    /// Binds `name` in this scope without path resolution.
    pub fn define(&self, name: &str, value: Value) {
        self.bindings.borrow_mut().insert(name.to_string(), value);
    }

    pub fn has_own(&self, name: &str) -> bool {
        self.bindings.borrow().contains_key(name)
    }

    fn lookup(&self, name: &str) -> Value {
        if let Some(v) = self.bindings.borrow().get(name) {
            return v.clone();
        }
        match &self.parent {
            Some(parent) => parent.get(name),
            None => Value::Undefined,
        }
    }

    /// Resolves `path` to a container, creating empty objects for missing
    /// or non-truthy steps.
    fn ensure_path(&self, path: &str) -> Value {
        let mut keys = path.split('.');
        let head = keys.next().unwrap_or_default();
        let mut current = self.lookup(head);
        if !util::to_boolean(&current) {
            current = Value::empty_object();
            self.define(head, current.clone());
        }
        for key in keys {
            let mut next = member::get_member(&current, key);
            if !util::to_boolean(&next) {
                next = Value::empty_object();
                member::set_member(&current, key, next.clone());
            }
            current = next;
        }
        current
    }
}

impl Scope for ScopeChain {
    fn get(&self, name: &str) -> Value {
        match name.split_once('.') {
            None => self.lookup(name),
            Some((head, rest)) => member::get_path(&self.lookup(head), rest),
        }
    }

    fn set(&self, name: &str, value: Value) -> Value {
        match name.rsplit_once('.') {
            None => self.define(name, value.clone()),
            Some((path, key)) => {
                let target = self.ensure_path(path);
                member::set_member(&target, key, value.clone());
            }
        }
        value
    }
}
