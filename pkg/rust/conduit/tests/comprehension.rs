// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use conduit::{
	Compiler, Error, Signature, Value,
	expr::{Builtin, naive, param, this},
};

fn eval(expr: &conduit::expr::Expr, input: Value) -> conduit::Result<Value> {
	Compiler::default().compile(expr, &Signature::new()).unwrap().call(input, ())
}

fn numbers() -> Value {
	Value::from(serde_json::json!([3, 1, 4, 1, 5]))
}

#[test]
fn test_collection_kinds() {
	let doubled = this() * naive(2);
	assert_eq!(
		eval(&this().set_comp(doubled.clone()), numbers()).unwrap(),
		Value::set(vec![Value::int(6), Value::int(2), Value::int(8), Value::int(10)])
	);
	assert_eq!(
		eval(&this().tuple_comp(doubled), numbers()).unwrap(),
		Value::tuple([6, 2, 8, 2, 10].map(Value::int))
	);
	assert_eq!(
		eval(&this().dict_comp(this(), this() * this()), numbers()).unwrap(),
		Value::dict([3, 1, 4, 5].map(|n| (Value::int(n), Value::int(n * n))))
	);
}

#[test]
fn test_filter_and_sort() {
	let expr = this().filter(this().gt(naive(1))).sort(None, true).list_comp(this());
	assert_eq!(eval(&expr, numbers()).unwrap(), Value::list([5, 4, 3].map(Value::int)));
}

#[test]
fn test_sort_by_several_keys() {
	let input = Value::from(serde_json::json!([
		{"n": "a", "s": 1},
		{"n": "b", "s": null},
		{"n": "c", "s": 3},
		{"n": "d", "s": 1},
	]));
	let names = |expr: conduit::expr::Expr| expr.list_comp(this().item("n"));

	let by_score = names(this().sort_by([this().item("s").desc().nulls_last(), this().item("n").asc()], false));
	assert_eq!(eval(&by_score, input.clone()).unwrap(), Value::list(["c", "a", "d", "b"].map(Value::utf8)));

	let reversed = names(this().sort_by([this().item("s").asc().nulls_first()], true));
	assert_eq!(eval(&reversed, input.clone()).unwrap(), Value::list(["c", "a", "d", "b"].map(Value::utf8)));

	let natural = this().sort_by([this().item("s")], false);
	assert!(matches!(eval(&natural, input), Err(Error::NotComparable { .. })));
}

#[test]
fn test_lazy_iteration_stops_at_error() {
	let expr = this().iter(naive(10).binary(conduit::expr::BinaryOp::FloorDiv, this()));
	let exe = Compiler::default().compile(&expr, &Signature::new()).unwrap();
	let mut items = exe.iter(Value::from(serde_json::json!([5, 2, 0, 1])), ()).unwrap();
	assert_eq!(items.next().unwrap().unwrap(), Value::int(2));
	assert_eq!(items.next().unwrap().unwrap(), Value::int(5));
	assert!(matches!(items.next(), Some(Err(Error::DivisionByZero))));
	assert!(items.next().is_none());
}

#[test]
fn test_access_defaults_and_builtins() {
	let input = Value::from(serde_json::json!({"name": "  Ada  ", "tags": ["x", "y"]}));
	let expr = conduit::expr::tuple([
		this().item("name").method(Builtin::Strip, []).method(Builtin::Upper, []),
		this().item("tags").len(),
		this().item_or("missing", naive("n/a")),
		this().item("tags").item_or(5, param("fallback")),
	]);
	let exe = Compiler::default().compile(&expr, &Signature::new().param("fallback")).unwrap();
	assert_eq!(
		exe.call(input, vec![Value::utf8("none")]).unwrap(),
		Value::tuple(vec![Value::utf8("ADA"), Value::int(2), Value::utf8("n/a"), Value::utf8("none")])
	);
}

#[test]
fn test_pipe_evaluates_consumer_against_producer() {
	let expr = this().item("rows").pipe(this().len() + this().item(0));
	assert_eq!(eval(&expr, Value::from(serde_json::json!({"rows": [7, 8]}))).unwrap(), Value::int(9));
}
