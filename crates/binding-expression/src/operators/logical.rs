//! Logical operators. Both operands are already evaluated; the result is
//! the deciding operand, not a coerced boolean.

use crate::util;
use crate::value::Value;

pub fn and(left: &Value, right: &Value) -> Value {
    if util::to_boolean(left) {
        right.clone()
    } else {
        left.clone()
    }
}

pub fn or(left: &Value, right: &Value) -> Value {
    if util::to_boolean(left) {
        left.clone()
    } else {
        right.clone()
    }
}

pub fn not(operand: &Value) -> Value {
    Value::Bool(!util::to_boolean(operand))
}
