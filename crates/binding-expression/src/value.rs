//! Dynamic values produced and consumed by compiled expressions.
//!
//! Arrays and objects are shared handles: cloning a [`Value`] clones the
//! handle, so writes through `obj[key] = v` are visible to every holder,
//! including the scope the object was read from.

use crate::error::EvalError;
use crate::eval_ctx::EvalCtx;
use crate::util;
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

pub type Array = Rc<RefCell<Vec<Value>>>;
pub type Object = Rc<RefCell<IndexMap<String, Value>>>;

/// Signature of every host callable reachable from an expression.
pub type NativeFn = dyn Fn(&EvalCtx, &[Value]) -> Result<Value, EvalError>;

/// A callable value: closures, bound built-in methods, entity constructors.
#[derive(Clone)]
pub struct Function {
    name: Rc<str>,
    call: Rc<NativeFn>,
}

impl Function {
    pub fn new<F>(name: &str, call: F) -> Self
    where
        F: Fn(&EvalCtx, &[Value]) -> Result<Value, EvalError> + 'static,
    {
        Function {
            name: Rc::from(name),
            call: Rc::new(call),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, ctx: &EvalCtx, args: &[Value]) -> Result<Value, EvalError> {
        (self.call)(ctx, args)
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.call, &other.call)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({})", self.name)
    }
}

/// A compiled regular-expression literal together with its source text.
#[derive(Debug)]
pub struct RegExpValue {
    regex: Regex,
    source: String,
    flags: String,
}

impl RegExpValue {
    /// Compiles `source` with host-style flags: `i`, `m`, `s` change
    /// matching, `g` is recorded only.
    pub fn new(source: &str, flags: &str) -> Result<Self, String> {
        let mut builder = RegexBuilder::new(source);
        for flag in flags.chars() {
            match flag {
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                'g' => {}
                other => return Err(format!("invalid flag '{}'", other)),
            }
        }
        let regex = builder.build().map_err(|e| e.to_string())?;
        Ok(RegExpValue {
            regex,
            source: source.to_string(),
            flags: flags.to_string(),
        })
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }
}

/// Any value an expression can produce.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Array),
    Object(Object),
    Function(Function),
    RegExp(Arc<RegExpValue>),
    Date(DateTime<Utc>),
}

impl Value {
    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object(entries: IndexMap<String, Value>) -> Value {
        Value::Object(Rc::new(RefCell::new(entries)))
    }

    pub fn empty_object() -> Value {
        Value::object(IndexMap::new())
    }

    pub fn function<F>(name: &str, call: F) -> Value
    where
        F: Fn(&EvalCtx, &[Value]) -> Result<Value, EvalError> + 'static,
    {
        Value::Function(Function::new(name, call))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// `null` or `undefined`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Type name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
            Value::RegExp(_) => "regexp",
            Value::Date(_) => "date",
        }
    }

    /// Converts to JSON. Integral numbers become JSON integers, `undefined`
    /// and functions become `null`, dates become ISO-8601 strings. A
    /// container that contains itself converts to `null` where it repeats.
    pub fn to_json(&self) -> serde_json::Value {
        self.to_json_inner(&mut Vec::new())
    }

    fn to_json_inner(&self, seen: &mut Vec<*const ()>) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Undefined | Value::Null | Value::Function(_) => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => Json::String(s.clone()),
            Value::Array(items) => {
                let ptr = Rc::as_ptr(items) as *const ();
                if seen.contains(&ptr) {
                    return Json::Null;
                }
                seen.push(ptr);
                let out = items.borrow().iter().map(|v| v.to_json_inner(seen)).collect();
                seen.pop();
                Json::Array(out)
            }
            Value::Object(entries) => {
                let ptr = Rc::as_ptr(entries) as *const ();
                if seen.contains(&ptr) {
                    return Json::Null;
                }
                seen.push(ptr);
                let out = entries
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json_inner(seen)))
                    .collect();
                seen.pop();
                Json::Object(out)
            }
            Value::RegExp(_) => Json::Object(serde_json::Map::new()),
            Value::Date(d) => Json::String(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE {
        serde_json::Value::Number(serde_json::Number::from(n as i64))
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        structural_eq(self, other, &mut Vec::new())
    }
}

/// Containers compare element-wise. A pair already being compared further up
/// counts as equal, so self-containing values terminate.
fn structural_eq(a: &Value, b: &Value, seen: &mut Vec<(*const (), *const ())>) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) => true,
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            if Rc::ptr_eq(a, b) {
                return true;
            }
            let pair = (Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ());
            if seen.contains(&pair) {
                return true;
            }
            let (a, b) = (a.borrow(), b.borrow());
            if a.len() != b.len() {
                return false;
            }
            seen.push(pair);
            let equal = a.iter().zip(b.iter()).all(|(x, y)| structural_eq(x, y, seen));
            seen.pop();
            equal
        }
        (Value::Object(a), Value::Object(b)) => {
            if Rc::ptr_eq(a, b) {
                return true;
            }
            let pair = (Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ());
            if seen.contains(&pair) {
                return true;
            }
            let (a, b) = (a.borrow(), b.borrow());
            if a.len() != b.len() {
                return false;
            }
            seen.push(pair);
            let equal = a
                .iter()
                .all(|(k, x)| b.get(k).is_some_and(|y| structural_eq(x, y, seen)));
            seen.pop();
            equal
        }
        (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
        (Value::RegExp(a), Value::RegExp(b)) => a.source == b.source && a.flags == b.flags,
        (Value::Date(a), Value::Date(b)) => a == b,
        _ => false,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&util::to_js_string(self))
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match v {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::array(items.into_iter().map(Value::from).collect()),
            Json::Object(entries) => Value::object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_round_trip_keeps_integers_and_key_order() {
        let v = Value::from(json!({"b": 1, "a": [1.5, "x", null, true]}));
        assert_eq!(v.to_json(), json!({"b": 1, "a": [1.5, "x", null, true]}));
        let keys: Vec<String> = match &v {
            Value::Object(o) => o.borrow().keys().cloned().collect(),
            _ => panic!("expected object"),
        };
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn shared_handles_see_writes() {
        let a = Value::array(vec![Value::from(1)]);
        let alias = a.clone();
        if let Value::Array(items) = &alias {
            items.borrow_mut().push(Value::from(2));
        }
        assert_eq!(a.to_json(), json!([1, 2]));
    }

    #[test]
    fn regexp_flags() {
        let re = RegExpValue::new("ab", "i").unwrap();
        assert!(re.regex().is_match("xABx"));
        assert!(RegExpValue::new("ab", "q").is_err());
        assert!(RegExpValue::new("(", "").is_err());
    }

    #[test]
    fn undefined_and_functions_serialize_as_null() {
        assert_eq!(Value::Undefined.to_json(), json!(null));
        let f = Value::function("f", |_, _| Ok(Value::Undefined));
        assert_eq!(f.to_json(), json!(null));
        assert_eq!(Value::Number(f64::NAN).to_json(), json!(null));
    }

    #[test]
    fn self_containing_values_convert_and_compare() {
        let a = Value::array(vec![Value::from(1)]);
        if let Value::Array(items) = &a {
            items.borrow_mut().push(a.clone());
        }
        assert_eq!(a.to_json(), json!([1, null]));

        let o = Value::empty_object();
        if let Value::Object(entries) = &o {
            entries.borrow_mut().insert("self".to_string(), o.clone());
        }
        assert_eq!(o.to_json(), json!({"self": null}));

        let b = Value::array(vec![Value::from(1)]);
        if let Value::Array(items) = &b {
            items.borrow_mut().push(b.clone());
        }
        assert!(a == b);
        assert!(a != Value::from(json!([1, [1]])));
    }
}
