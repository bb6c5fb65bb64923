//! Equality and relational operators, with host coercions.

use crate::util;
use crate::value::Value;

pub fn eq(left: &Value, right: &Value) -> Value {
    Value::Bool(util::loose_equals(left, right))
}

pub fn ne(left: &Value, right: &Value) -> Value {
    Value::Bool(!util::loose_equals(left, right))
}

pub fn lt(left: &Value, right: &Value) -> Value {
    Value::Bool(util::js_lt(left, right))
}

pub fn gt(left: &Value, right: &Value) -> Value {
    Value::Bool(util::js_gt(left, right))
}

pub fn lte(left: &Value, right: &Value) -> Value {
    Value::Bool(util::js_lte(left, right))
}

pub fn gte(left: &Value, right: &Value) -> Value {
    Value::Bool(util::js_gte(left, right))
}
