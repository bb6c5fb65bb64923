//! Host-language coercion helpers shared by operators, members and filters.

use crate::value::{Array, Value};
use chrono::{DateTime, SecondsFormat, Utc};
use std::cmp::Ordering;
use std::rc::Rc;

// ----------------------------------------------------------------- Truthiness

/// `false`, `0`, `NaN`, `""`, `null` and `undefined` are falsy.
pub fn to_boolean(value: &Value) -> bool {
    match value {
        Value::Undefined | Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => !(n.is_nan() || *n == 0.0),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

// ----------------------------------------------------------------- Numbers

pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Undefined => f64::NAN,
        Value::Null => 0.0,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) => *n,
        Value::String(s) => string_to_number(s),
        Value::Date(d) => d.timestamp_millis() as f64,
        Value::Array(_) | Value::Object(_) | Value::Function(_) | Value::RegExp(_) => {
            match to_primitive(value, Hint::Number) {
                Value::String(s) => string_to_number(&s),
                other => to_number(&other),
            }
        }
    }
}

fn string_to_number(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }
    // Rust accepts "inf"/"nan" spellings the host does not.
    if s.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return f64::NAN;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

/// Host `ToInt32`: wrapping, not saturating.
pub fn to_int32(value: &Value) -> i32 {
    let n = to_number(value);
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(4_294_967_296.0) as u32 as i32
}

/// Formats a number the way the host prints it: no trailing `.0`.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == 0.0 {
        "0".to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        // Exponent form, with an explicit sign on positive exponents.
        let s = format!("{:e}", n);
        match s.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => s,
        }
    } else if n.fract() == 0.0 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

// ----------------------------------------------------------------- Strings

pub fn to_js_string(value: &Value) -> String {
    match value {
        Value::Undefined => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_to_string(*n),
        Value::String(s) => s.clone(),
        Value::Array(items) => join(items, ","),
        Value::Object(_) => "[object Object]".to_string(),
        Value::Function(f) => format!("function {}() {{ [native code] }}", f.name()),
        Value::RegExp(re) => format!("/{}/{}", re.source(), re.flags()),
        Value::Date(d) => date_to_string(d),
    }
}

/// Host `Array.prototype.join`: nullish items print empty, and an array met
/// again while it is being joined prints empty too.
pub fn join(items: &Array, separator: &str) -> String {
    join_inner(items, separator, &mut Vec::new())
}

fn join_inner(items: &Array, separator: &str, seen: &mut Vec<*const ()>) -> String {
    let ptr = Rc::as_ptr(items) as *const ();
    if seen.contains(&ptr) {
        return String::new();
    }
    seen.push(ptr);
    let parts: Vec<String> = items
        .borrow()
        .iter()
        .map(|v| match v {
            Value::Undefined | Value::Null => String::new(),
            Value::Array(inner) => join_inner(inner, ",", seen),
            other => to_js_string(other),
        })
        .collect();
    seen.pop();
    parts.join(separator)
}

pub fn date_to_string(d: &DateTime<Utc>) -> String {
    d.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses a UTC timestamp such as `2010-10-10T10:10:10Z`.
pub fn parse_utc_date(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Quotes a string as a JSON string literal.
pub fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// Escapes the characters significant in HTML text and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut last = 0;
    for (i, ch) in s.char_indices() {
        let escaped = match ch {
            '&' => "&amp;",
            '<' => "&lt;",
            '>' => "&gt;",
            '"' => "&quot;",
            _ => continue,
        };
        result.push_str(&s[last..i]);
        result.push_str(escaped);
        last = i + ch.len_utf8();
    }
    result.push_str(&s[last..]);
    result
}

// ----------------------------------------------------------------- Primitives

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hint {
    Number,
    Default,
}

/// Host `ToPrimitive`. Dates prefer strings except under a number hint.
pub fn to_primitive(value: &Value, hint: Hint) -> Value {
    match value {
        Value::Date(d) => match hint {
            Hint::Number => Value::Number(d.timestamp_millis() as f64),
            Hint::Default => Value::String(date_to_string(d)),
        },
        Value::Array(_) | Value::Object(_) | Value::Function(_) | Value::RegExp(_) => {
            Value::String(to_js_string(value))
        }
        other => other.clone(),
    }
}

fn is_primitive(value: &Value) -> bool {
    matches!(
        value,
        Value::Undefined | Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)
    )
}

// ----------------------------------------------------------------- Equality

/// Identity comparison: containers and functions compare by handle.
pub fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Array(x), Value::Array(y)) => std::rc::Rc::ptr_eq(x, y),
        (Value::Object(x), Value::Object(y)) => std::rc::Rc::ptr_eq(x, y),
        (Value::RegExp(x), Value::RegExp(y)) => std::sync::Arc::ptr_eq(x, y),
        _ => a == b,
    }
}

/// Host `==` with its type coercions.
pub fn loose_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
        (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::String(_)) => *x == to_number(b),
        (Value::String(_), Value::Number(y)) => to_number(a) == *y,
        (Value::Bool(_), _) => loose_equals(&Value::Number(to_number(a)), b),
        (_, Value::Bool(_)) => loose_equals(a, &Value::Number(to_number(b))),
        _ if is_primitive(a) && !is_primitive(b) => loose_equals(a, &to_primitive(b, Hint::Default)),
        _ if !is_primitive(a) && is_primitive(b) => loose_equals(&to_primitive(a, Hint::Default), b),
        _ => strict_equals(a, b),
    }
}

// ----------------------------------------------------------------- Ordering

/// Host abstract relational comparison; `None` when either side is `NaN`.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    let pa = to_primitive(a, Hint::Number);
    let pb = to_primitive(b, Hint::Number);
    if let (Value::String(x), Value::String(y)) = (&pa, &pb) {
        return Some(x.cmp(y));
    }
    to_number(&pa).partial_cmp(&to_number(&pb))
}

pub fn js_lt(a: &Value, b: &Value) -> bool {
    compare(a, b) == Some(Ordering::Less)
}

pub fn js_gt(a: &Value, b: &Value) -> bool {
    compare(a, b) == Some(Ordering::Greater)
}

pub fn js_lte(a: &Value, b: &Value) -> bool {
    matches!(compare(a, b), Some(Ordering::Less | Ordering::Equal))
}

pub fn js_gte(a: &Value, b: &Value) -> bool {
    matches!(compare(a, b), Some(Ordering::Greater | Ordering::Equal))
}

// ----------------------------------------------------------------- Text positions

/// Text from character `index` to the end.
pub fn tail(text: &str, index: usize) -> String {
    text.chars().skip(index).collect()
}

/// Text before character `index`.
pub fn head(text: &str, index: usize) -> String {
    text.chars().take(index).collect()
}
