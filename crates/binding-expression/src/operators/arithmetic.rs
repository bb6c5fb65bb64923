//! Arithmetic operators.
//!
//! `+` and `-` read an `undefined` operand as `0` so templates over
//! partially loaded data render numbers instead of `NaN`.

use crate::util::{self, Hint};
use crate::value::Value;

fn or_zero(value: &Value) -> Value {
    if value.is_undefined() {
        Value::Number(0.0)
    } else {
        value.clone()
    }
}

/// Concatenates when either primitive side is a string, adds otherwise.
pub fn add(left: &Value, right: &Value) -> Value {
    let a = util::to_primitive(&or_zero(left), Hint::Default);
    let b = util::to_primitive(&or_zero(right), Hint::Default);
    if matches!(a, Value::String(_)) || matches!(b, Value::String(_)) {
        let mut s = util::to_js_string(&a);
        s.push_str(&util::to_js_string(&b));
        return Value::String(s);
    }
    Value::Number(util::to_number(&a) + util::to_number(&b))
}

pub fn subtract(left: &Value, right: &Value) -> Value {
    Value::Number(util::to_number(&or_zero(left)) - util::to_number(&or_zero(right)))
}

pub fn multiply(left: &Value, right: &Value) -> Value {
    Value::Number(util::to_number(left) * util::to_number(right))
}

/// Division by zero follows IEEE-754: `Infinity` or `NaN`.
pub fn divide(left: &Value, right: &Value) -> Value {
    Value::Number(util::to_number(left) / util::to_number(right))
}

/// Sign follows the dividend, as in the host language.
pub fn remainder(left: &Value, right: &Value) -> Value {
    Value::Number(util::to_number(left) % util::to_number(right))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_is_zero_for_add_and_subtract_only() {
        assert_eq!(add(&Value::Undefined, &Value::from(2)), Value::from(2));
        assert_eq!(subtract(&Value::from(5), &Value::Undefined), Value::from(5));
        assert!(multiply(&Value::Undefined, &Value::from(2)).as_f64().unwrap().is_nan());
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(add(&Value::from("a"), &Value::from(1)), Value::from("a1"));
        assert_eq!(add(&Value::from(1.5), &Value::from("x")), Value::from("1.5x"));
        assert_eq!(add(&Value::Null, &Value::from(1)), Value::from(1));
    }

    #[test]
    fn ieee_division() {
        assert_eq!(divide(&Value::from(1), &Value::from(0)), Value::Number(f64::INFINITY));
        assert_eq!(remainder(&Value::from(-7), &Value::from(3)), Value::from(-1));
    }
}
