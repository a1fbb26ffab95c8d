// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use conduit::{
	Compiler, Error, ErrorKind, Signature, Value,
	expr::{Expr, caught, naive, this, try_},
};

fn eval(expr: &Expr, input: serde_json::Value) -> conduit::Result<Value> {
	Compiler::default().compile(expr, &Signature::new()).unwrap().call(Value::from(input), ())
}

#[test]
fn test_first_matching_handler_wins() {
	let ratio = try_(this().item("a") / this().item("b"))
		.except_(ErrorKind::ARITHMETIC, naive(0))
		.except_(ErrorKind::LOOKUP, naive(-1));
	let expr = this().list_comp(ratio);
	assert_eq!(
		eval(&expr, serde_json::json!([{"a": 4, "b": 2}, {"a": 1, "b": 0}, {"a": 1}])).unwrap(),
		Value::list(vec![Value::float(2.0), Value::int(0), Value::int(-1)])
	);
}

#[test]
fn test_uncaught_kind_propagates() {
	let expr = try_(this() + naive(1)).except_(ErrorKind::LOOKUP, naive(0));
	assert!(matches!(eval(&expr, serde_json::json!("x")), Err(Error::TypeMismatch { .. })));
}

#[test]
fn test_handler_reads_caught_message() {
	let expr = try_(naive(1) / this()).except_(ErrorKind::ANY, caught());
	assert_eq!(eval(&expr, serde_json::json!(0)).unwrap(), Value::utf8("division by zero"));
	assert_eq!(eval(&expr, serde_json::json!(4)).unwrap(), Value::float(0.25));
}

#[test]
fn test_reraise_skips_later_handlers() {
	let expr = try_(naive(1) / this().item("d"))
		.except_unless(ErrorKind::ARITHMETIC, naive(0), this().item("strict"))
		.except_(ErrorKind::ANY, naive(1));
	assert!(matches!(eval(&expr, serde_json::json!({"d": 0, "strict": true})), Err(Error::DivisionByZero)));
	assert_eq!(eval(&expr, serde_json::json!({"d": 0, "strict": false})).unwrap(), Value::int(0));
}

#[test]
fn test_nested_handlers_see_their_own_error() {
	let inner = try_(this().item("missing")).except_(ErrorKind::ANY, caught());
	let expr = try_(naive(1) / naive(0)).except_(ErrorKind::ANY, conduit::expr::tuple([inner, caught()]));
	let value = eval(&expr, serde_json::json!({})).unwrap();
	let Value::Tuple(items) = value else {
		panic!("expected a tuple, got {value:?}");
	};
	assert_ne!(items[0], Value::utf8("division by zero"));
	assert_eq!(items[1], Value::utf8("division by zero"));
}
