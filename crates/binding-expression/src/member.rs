//! Property reads and writes on values, including the built-in members of
//! strings, arrays, regular expressions and dates.
//!
//! Built-in methods come back as [`Function`](crate::value::Function)s bound
//! to their receiver, so `'abc'.toUpperCase()` goes through the same call
//! path as any scope function.

use crate::error::EvalError;
use crate::util;
use crate::value::Value;

/// Reads `key` off `value`. Missing members and nullish receivers yield
/// `undefined`.
pub fn get_member(value: &Value, key: &str) -> Value {
    match value {
        Value::Object(entries) => entries.borrow().get(key).cloned().unwrap_or_default(),
        Value::Array(items) => match key {
            "length" => Value::from(items.borrow().len()),
            "join" => bind(value, "join", array_join),
            "indexOf" => bind(value, "indexOf", array_index_of),
            "push" => bind(value, "push", array_push),
            _ => match array_index(key) {
                Some(i) => items.borrow().get(i).cloned().unwrap_or_default(),
                None => Value::Undefined,
            },
        },
        Value::String(s) => match key {
            "length" => Value::from(s.chars().count()),
            "toUpperCase" => bind(value, "toUpperCase", |s, _| Ok(Value::from(util::to_js_string(s).to_uppercase()))),
            "toLowerCase" => bind(value, "toLowerCase", |s, _| Ok(Value::from(util::to_js_string(s).to_lowercase()))),
            "trim" => bind(value, "trim", |s, _| Ok(Value::from(util::to_js_string(s).trim()))),
            "indexOf" => bind(value, "indexOf", string_index_of),
            "charAt" => bind(value, "charAt", string_char_at),
            "substring" => bind(value, "substring", string_substring),
            "split" => bind(value, "split", string_split),
            _ => match array_index(key) {
                Some(i) => s.chars().nth(i).map(|c| Value::from(c.to_string())).unwrap_or_default(),
                None => Value::Undefined,
            },
        },
        Value::RegExp(re) => match key {
            "source" => Value::from(re.source()),
            "global" => Value::from(re.flags().contains('g')),
            "ignoreCase" => Value::from(re.flags().contains('i')),
            "multiline" => Value::from(re.flags().contains('m')),
            "test" => bind(value, "test", regexp_test),
            "exec" => bind(value, "exec", regexp_exec),
            _ => Value::Undefined,
        },
        Value::Date(_) => match key {
            "getTime" => bind(value, "getTime", |d, _| Ok(Value::Number(util::to_number(d)))),
            "toISOString" => bind(value, "toISOString", |d, _| match d {
                Value::Date(d) => Ok(Value::from(util::date_to_string(d))),
                _ => Ok(Value::Undefined),
            }),
            _ => Value::Undefined,
        },
        _ => Value::Undefined,
    }
}

/// Reads a dotted path such as `a.b.c`, stopping at the first nullish step.
pub fn get_path(value: &Value, path: &str) -> Value {
    let mut current = value.clone();
    for key in path.split('.').filter(|k| !k.is_empty()) {
        if current.is_nullish() {
            return Value::Undefined;
        }
        current = get_member(&current, key);
    }
    current
}

/// Reads `target[index]`; a numeric index addresses array elements.
pub fn get_index(target: &Value, index: &Value) -> Value {
    if target.is_nullish() {
        return Value::Undefined;
    }
    match (target, index) {
        (Value::Array(items), Value::Number(n)) if n.fract() == 0.0 && *n >= 0.0 => {
            items.borrow().get(*n as usize).cloned().unwrap_or_default()
        }
        _ => get_member(target, &util::to_js_string(index)),
    }
}

/// Writes `target[key] = value`. Returns `false` when `target` cannot hold
/// properties.
pub fn set_member(target: &Value, key: &str, value: Value) -> bool {
    match target {
        Value::Object(entries) => {
            entries.borrow_mut().insert(key.to_string(), value);
            true
        }
        Value::Array(items) => match array_index(key) {
            Some(i) => {
                let mut items = items.borrow_mut();
                if i >= items.len() {
                    // Arrays are dense; a far write would allocate every hole.
                    if i - items.len() >= MAX_ARRAY_GROWTH {
                        return false;
                    }
                    items.resize(i + 1, Value::Undefined);
                }
                items[i] = value;
                true
            }
            None => false,
        },
        _ => false,
    }
}

pub fn set_index(target: &Value, index: &Value, value: Value) -> bool {
    set_member(target, &util::to_js_string(index), value)
}

/// Largest number of holes a single index write may add to an array.
pub const MAX_ARRAY_GROWTH: usize = 1 << 16;

/// Host array indices stop at 2^32 - 2.
const MAX_ARRAY_INDEX: u64 = 4_294_967_294;

fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if key.len() > 1 && key.starts_with('0') {
        return None;
    }
    let index: u64 = key.parse().ok()?;
    if index > MAX_ARRAY_INDEX {
        return None;
    }
    usize::try_from(index).ok()
}

fn bind(receiver: &Value, name: &str, method: fn(&Value, &[Value]) -> Result<Value, EvalError>) -> Value {
    let receiver = receiver.clone();
    Value::function(name, move |_ctx, args| method(&receiver, args))
}

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or_default()
}

// ----------------------------------------------------------------- Arrays

fn array_join(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let sep = match args.first() {
        None | Some(Value::Undefined) => ",".to_string(),
        Some(v) => util::to_js_string(v),
    };
    let Value::Array(items) = receiver else {
        return Ok(Value::Undefined);
    };
    Ok(Value::from(util::join(items, &sep)))
}

fn array_index_of(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let needle = arg(args, 0);
    let Value::Array(items) = receiver else {
        return Ok(Value::from(-1));
    };
    let pos = items.borrow().iter().position(|v| util::strict_equals(v, &needle));
    Ok(pos.map(Value::from).unwrap_or(Value::from(-1)))
}

fn array_push(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let Value::Array(items) = receiver else {
        return Ok(Value::Undefined);
    };
    let mut items = items.borrow_mut();
    items.extend(args.iter().cloned());
    Ok(Value::from(items.len()))
}

// ----------------------------------------------------------------- Strings

fn string_index_of(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let s = util::to_js_string(receiver);
    let needle = util::to_js_string(&arg(args, 0));
    Ok(match s.find(&needle) {
        Some(byte) => Value::from(s[..byte].chars().count()),
        None => Value::from(-1),
    })
}

fn string_char_at(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let s = util::to_js_string(receiver);
    let i = util::to_int32(&arg(args, 0));
    if i < 0 {
        return Ok(Value::from(""));
    }
    Ok(Value::from(s.chars().nth(i as usize).map(String::from).unwrap_or_default()))
}

fn string_substring(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let chars: Vec<char> = util::to_js_string(receiver).chars().collect();
    let len = chars.len() as i64;
    let clamp = |v: &Value, default: i64| -> usize {
        if v.is_undefined() {
            return default as usize;
        }
        let n = util::to_number(v);
        if n.is_nan() {
            0
        } else {
            (n.trunc() as i64).clamp(0, len) as usize
        }
    };
    let mut start = clamp(&arg(args, 0), 0);
    let mut end = clamp(&arg(args, 1), len);
    if start > end {
        std::mem::swap(&mut start, &mut end);
    }
    Ok(Value::from(chars[start..end].iter().collect::<String>()))
}

fn string_split(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let s = util::to_js_string(receiver);
    let parts: Vec<Value> = match args.first() {
        None | Some(Value::Undefined) => vec![Value::from(s)],
        Some(Value::RegExp(re)) => re.regex().split(&s).map(Value::from).collect(),
        Some(sep) => {
            let sep = util::to_js_string(sep);
            if sep.is_empty() {
                s.chars().map(|c| Value::from(c.to_string())).collect()
            } else {
                s.split(sep.as_str()).map(Value::from).collect()
            }
        }
    };
    Ok(Value::array(parts))
}

// ----------------------------------------------------------------- RegExps

fn regexp_test(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let Value::RegExp(re) = receiver else {
        return Ok(Value::from(false));
    };
    let subject = util::to_js_string(&arg(args, 0));
    Ok(Value::from(re.regex().is_match(&subject)))
}

fn regexp_exec(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let Value::RegExp(re) = receiver else {
        return Ok(Value::Null);
    };
    let subject = util::to_js_string(&arg(args, 0));
    Ok(match re.regex().captures(&subject) {
        Some(caps) => Value::array(
            caps.iter()
                .map(|m| m.map(|m| Value::from(m.as_str())).unwrap_or_default())
                .collect(),
        ),
        None => Value::Null,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval_ctx::EvalCtx;
    use crate::scope::ScopeChain;
    use crate::value::RegExpValue;
    use serde_json::json;
    use std::rc::Rc;
    use std::sync::Arc;

    fn call(value: &Value, args: &[Value]) -> Value {
        let ctx = EvalCtx::new(Rc::new(ScopeChain::new()));
        value.as_function().expect("bound method").call(&ctx, args).unwrap()
    }

    #[test]
    fn object_and_array_members() {
        let v = Value::from(json!({"a": {"b": [10, 20]}}));
        assert_eq!(get_path(&v, "a.b.1"), Value::from(20));
        assert_eq!(get_path(&v, "a.b.length"), Value::from(2));
        assert_eq!(get_path(&v, "a.x.y"), Value::Undefined);
    }

    #[test]
    fn string_methods() {
        let s = Value::from("Hello");
        assert_eq!(call(&get_member(&s, "toUpperCase"), &[]), Value::from("HELLO"));
        assert_eq!(call(&get_member(&s, "indexOf"), &[Value::from("l")]), Value::from(2));
        assert_eq!(
            call(&get_member(&s, "substring"), &[Value::from(4), Value::from(1)]),
            Value::from("ell")
        );
        assert_eq!(
            call(&get_member(&Value::from("a,b"), "split"), &[Value::from(",")]).to_json(),
            json!(["a", "b"])
        );
    }

    #[test]
    fn regexp_methods() {
        let re = Value::RegExp(Arc::new(RegExpValue::new("a(b)?", "").unwrap()));
        assert_eq!(call(&get_member(&re, "test"), &[Value::from("xa")]), Value::from(true));
        assert_eq!(call(&get_member(&re, "exec"), &[Value::from("ab")]).to_json(), json!(["ab", "b"]));
        assert_eq!(call(&get_member(&re, "exec"), &[Value::from("zz")]), Value::Null);
    }

    #[test]
    fn writes() {
        let arr = Value::from(json!([1]));
        assert!(set_index(&arr, &Value::from(2), Value::from(3)));
        assert_eq!(arr.to_json(), json!([1, null, 3]));
        assert!(!set_member(&Value::from(1), "x", Value::Null));
        let push = get_member(&arr, "push");
        assert_eq!(call(&push, &[Value::from(4)]), Value::from(4));
    }

    #[test]
    fn far_index_writes_do_not_grow_arrays() {
        let arr = Value::array(Vec::new());
        assert!(!set_member(&arr, "1000000000000000000", Value::from(1)));
        assert!(!set_member(&arr, "1000000000", Value::from(1)));
        assert_eq!(get_member(&arr, "length"), Value::from(0));
        assert!(set_member(&arr, "2", Value::from(1)));
        assert_eq!(arr.to_json(), json!([null, null, 1]));
    }

    #[test]
    fn join_skips_self_references() {
        let arr = Value::array(vec![Value::from(1)]);
        set_member(&arr, "1", arr.clone());
        assert_eq!(call(&get_member(&arr, "join"), &[Value::from("-")]), Value::from("1-"));
    }
}
