//! Bitwise operators over 32-bit integers.

use crate::util;
use crate::value::Value;

pub fn and(left: &Value, right: &Value) -> Value {
    Value::from(util::to_int32(left) & util::to_int32(right))
}

pub fn xor(left: &Value, right: &Value) -> Value {
    Value::from(util::to_int32(left) ^ util::to_int32(right))
}
