//! Property tests for evaluation order and compile purity.

use binding_expression::{compile, EvalCtx, ScopeChain, Value};
use proptest::prelude::*;
use serde_json::json;
use std::rc::Rc;

fn empty_ctx() -> EvalCtx {
    EvalCtx::new(Rc::new(ScopeChain::new()))
}

proptest! {
    #[test]
    fn additive_chains_fold_left(a in -1000i32..1000, b in -1000i32..1000, c in -1000i32..1000) {
        let text = format!("{} - {} - {}", a, b, c);
        let value = compile(&text, false).unwrap().eval(&empty_ctx()).unwrap();
        prop_assert_eq!(value, Value::from(f64::from(a) - f64::from(b) - f64::from(c)));
    }

    #[test]
    fn multiplicative_chains_fold_left(a in 1i32..1000, b in 1i32..1000, c in 1i32..1000) {
        let text = format!("{} / {} / {}", a, b, c);
        let value = compile(&text, false).unwrap().eval(&empty_ctx()).unwrap();
        prop_assert_eq!(value, Value::from(f64::from(a) / f64::from(b) / f64::from(c)));
    }

    #[test]
    fn arithmetic_on_missing_names_treats_them_as_zero(a in -1000i32..1000) {
        let plus = compile(&format!("missing + {}", a), false).unwrap().eval(&empty_ctx()).unwrap();
        let minus = compile(&format!("{} - missing", a), false).unwrap().eval(&empty_ctx()).unwrap();
        prop_assert_eq!(plus, Value::from(a));
        prop_assert_eq!(minus, Value::from(a));
    }

    #[test]
    fn compiling_twice_gives_independent_equal_results(x in -100i32..100, y in -100i32..100) {
        let text = "total = x * 2 + y; [total, x < y, {x: x, y: y}]";
        let first = compile(text, false).unwrap();
        let second = compile(text, false).unwrap();
        let data = json!({"x": x, "y": y});
        let one = first.eval(&EvalCtx::new(Rc::new(ScopeChain::from_json(data.clone())))).unwrap();
        let two = second.eval(&EvalCtx::new(Rc::new(ScopeChain::from_json(data)))).unwrap();
        prop_assert_eq!(one.to_json(), two.to_json());
        prop_assert_eq!(one.to_json()[0].clone(), json!(x * 2 + y));
    }

    #[test]
    fn string_literals_round_trip(s in "[a-zA-Z0-9 ,.!?]{0,30}") {
        let value = compile(&format!("'{}'", s), false).unwrap().eval(&empty_ctx()).unwrap();
        prop_assert_eq!(value, Value::from(s.as_str()));
    }
}
