//! Built-in filters.

use super::{arg, FunctionDefinition};
use crate::error::EvalError;
use crate::util;
use crate::value::Value;

fn json_eval(_state: &Value, args: &[Value]) -> Result<Value, EvalError> {
    serde_json::to_string_pretty(&arg(args, 0).to_json())
        .map(Value::from)
        .map_err(|e| EvalError::host(e.to_string()))
}

fn lowercase_eval(_state: &Value, args: &[Value]) -> Result<Value, EvalError> {
    Ok(match arg(args, 0) {
        Value::String(s) => Value::from(s.to_lowercase()),
        other => other,
    })
}

fn uppercase_eval(_state: &Value, args: &[Value]) -> Result<Value, EvalError> {
    Ok(match arg(args, 0) {
        Value::String(s) => Value::from(s.to_uppercase()),
        other => other,
    })
}

fn trim_eval(_state: &Value, args: &[Value]) -> Result<Value, EvalError> {
    Ok(match arg(args, 0) {
        Value::String(s) => Value::from(s.trim()),
        other => other,
    })
}

fn html_eval(_state: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let input = arg(args, 0);
    if input.is_nullish() {
        return Ok(Value::from(""));
    }
    Ok(Value::from(util::escape_html(&util::to_js_string(&input))))
}

/// `number[:fractionDigits]`: thousands separators, fixed fraction digits
/// (default 2), empty string for non-finite input.
fn number_eval(_state: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let amount = util::to_number(&arg(args, 0));
    if !amount.is_finite() {
        return Ok(Value::from(""));
    }
    let digits = match arg(args, 1) {
        Value::Undefined => 2,
        v => util::to_int32(&v).clamp(0, 20) as usize,
    };
    Ok(Value::from(format_number(amount, digits)))
}

pub fn format_number(amount: f64, digits: usize) -> String {
    let fixed = format!("{:.*}", digits, amount.abs());
    let (whole, fraction) = match fixed.split_once('.') {
        Some((w, f)) => (w.to_string(), Some(f.to_string())),
        None => (fixed.clone(), None),
    };
    let mut text = String::new();
    if amount < 0.0 && fixed_is_nonzero(&whole, fraction.as_deref()) {
        text.push('-');
    }
    let len = whole.len();
    for (i, ch) in whole.chars().enumerate() {
        if i != 0 && (len - i) % 3 == 0 {
            text.push(',');
        }
        text.push(ch);
    }
    if let Some(fraction) = fraction {
        text.push('.');
        text.push_str(&fraction);
    }
    text
}

fn fixed_is_nonzero(whole: &str, fraction: Option<&str>) -> bool {
    whole.chars().chain(fraction.unwrap_or_default().chars()).any(|c| c != '0')
}

pub const DEFINITIONS: &[FunctionDefinition] = &[
    FunctionDefinition {
        name: "json",
        aliases: &[],
        eval_fn: json_eval,
    },
    FunctionDefinition {
        name: "lowercase",
        aliases: &[],
        eval_fn: lowercase_eval,
    },
    FunctionDefinition {
        name: "uppercase",
        aliases: &[],
        eval_fn: uppercase_eval,
    },
    FunctionDefinition {
        name: "trim",
        aliases: &[],
        eval_fn: trim_eval,
    },
    FunctionDefinition {
        name: "html",
        aliases: &["escape"],
        eval_fn: html_eval,
    },
    FunctionDefinition {
        name: "number",
        aliases: &[],
        eval_fn: number_eval,
    },
];
