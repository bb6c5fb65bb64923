//! Built-in validators. Each returns `null` for a valid input and an error
//! message string otherwise. Empty input is valid; requiredness is the
//! caller's concern.

use super::{arg, FunctionDefinition};
use crate::error::EvalError;
use crate::util;
use crate::value::{RegExpValue, Value};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[-\w.]+@[-\w]+(\.[-\w]+)*$").unwrap())
}

fn date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d\d?)/(\d\d?)/(\d\d\d\d)$").unwrap())
}

fn whole_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*[\d+]*\s*$").unwrap())
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Undefined | Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn valid() -> Result<Value, EvalError> {
    Ok(Value::Null)
}

fn invalid(message: impl Into<String>) -> Result<Value, EvalError> {
    Ok(Value::String(message.into()))
}

/// `regexp:pattern[:message]`; the pattern may be a regexp literal or a
/// string.
fn regexp_eval(_state: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let input = arg(args, 0);
    if is_empty(&input) {
        return valid();
    }
    let pattern = arg(args, 1);
    let matched = match &pattern {
        Value::RegExp(re) => re.regex().is_match(&util::to_js_string(&input)),
        other => {
            let re = RegExpValue::new(&util::to_js_string(other), "").map_err(EvalError::host)?;
            re.regex().is_match(&util::to_js_string(&input))
        }
    };
    if matched {
        return valid();
    }
    match arg(args, 2) {
        Value::Undefined => invalid(format!(
            "Value does not match expected format {}.",
            util::to_js_string(&pattern)
        )),
        message => invalid(util::to_js_string(&message)),
    }
}

/// `number[:min[:max]]`
fn number_eval(_state: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let input = arg(args, 0);
    if is_empty(&input) {
        return valid();
    }
    let num = util::to_number(&input);
    if num.is_nan() {
        return invalid("Not a number");
    }
    let min = arg(args, 1);
    if !min.is_undefined() && num < util::to_number(&min) {
        return invalid(format!("Value can not be less than {}.", util::to_js_string(&min)));
    }
    let max = arg(args, 2);
    if !max.is_undefined() && num > util::to_number(&max) {
        return invalid(format!("Value can not be greater than {}.", util::to_js_string(&max)));
    }
    valid()
}

/// `integer[:min[:max]]`
fn integer_eval(state: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let number_error = number_eval(state, args)?;
    if !number_error.is_nullish() {
        return Ok(number_error);
    }
    let input = arg(args, 0);
    if is_empty(&input) {
        return valid();
    }
    let num = util::to_number(&input);
    if !whole_number_regex().is_match(&util::to_js_string(&input)) || num != num.round() {
        return invalid("Not a whole number");
    }
    valid()
}

fn email_eval(_state: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let input = arg(args, 0);
    if is_empty(&input) || email_regex().is_match(&util::to_js_string(&input)) {
        return valid();
    }
    invalid("Email needs to be in username@host.com format.")
}

/// `MM/DD/YYYY` with a real calendar date.
fn date_eval(_state: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let input = arg(args, 0);
    if is_empty(&input) {
        return valid();
    }
    let text = util::to_js_string(&input);
    let is_date = date_regex().captures(&text).is_some_and(|caps| {
        let month = caps[1].parse().unwrap_or(0);
        let day = caps[2].parse().unwrap_or(0);
        let year = caps[3].parse().unwrap_or(0);
        NaiveDate::from_ymd_opt(year, month, day).is_some()
    });
    if is_date {
        valid()
    } else {
        invalid("Value is not a date. (Expecting format: 12/31/2009).")
    }
}

pub const DEFINITIONS: &[FunctionDefinition] = &[
    FunctionDefinition {
        name: "regexp",
        aliases: &[],
        eval_fn: regexp_eval,
    },
    FunctionDefinition {
        name: "number",
        aliases: &[],
        eval_fn: number_eval,
    },
    FunctionDefinition {
        name: "integer",
        aliases: &[],
        eval_fn: integer_eval,
    },
    FunctionDefinition {
        name: "email",
        aliases: &[],
        eval_fn: email_eval,
    },
    FunctionDefinition {
        name: "date",
        aliases: &[],
        eval_fn: date_eval,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    fn check(f: fn(&Value, &[Value]) -> Result<Value, EvalError>, args: &[Value]) -> Value {
        f(&Value::Undefined, args).unwrap()
    }

    #[test]
    fn number_bounds() {
        assert_eq!(check(number_eval, &[Value::from("12")]), Value::Null);
        assert_eq!(check(number_eval, &[Value::from("x")]), Value::from("Not a number"));
        assert_eq!(
            check(number_eval, &[Value::from(1), Value::from(2)]),
            Value::from("Value can not be less than 2.")
        );
        assert_eq!(
            check(number_eval, &[Value::from(9), Value::from(2), Value::from(5)]),
            Value::from("Value can not be greater than 5.")
        );
    }

    #[test]
    fn integers() {
        assert_eq!(check(integer_eval, &[Value::from("42")]), Value::Null);
        assert_eq!(check(integer_eval, &[Value::from("4.2")]), Value::from("Not a whole number"));
    }

    #[test]
    fn dates_and_emails() {
        assert_eq!(check(date_eval, &[Value::from("12/31/2009")]), Value::Null);
        assert!(matches!(check(date_eval, &[Value::from("02/30/2009")]), Value::String(_)));
        assert_eq!(check(email_eval, &[Value::from("a.b@host.com")]), Value::Null);
        assert!(matches!(check(email_eval, &[Value::from("nope")]), Value::String(_)));
    }

    #[test]
    fn regexp_with_custom_message() {
        assert_eq!(check(regexp_eval, &[Value::from("abc"), Value::from("^a")]), Value::Null);
        assert_eq!(
            check(regexp_eval, &[Value::from("xyz"), Value::from("^a"), Value::from("starts with a")]),
            Value::from("starts with a")
        );
        assert_eq!(
            check(regexp_eval, &[Value::from("xyz"), Value::from("^a")]),
            Value::from("Value does not match expected format ^a.")
        );
    }
}
