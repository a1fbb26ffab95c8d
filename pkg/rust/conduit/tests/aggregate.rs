// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use conduit::{
	CompileError, Compiler, Error, Signature, Value,
	expr::{aggregate, group_by, naive, this, tuple},
	reduce,
};

fn rows(json: serde_json::Value) -> Value {
	Value::from(json)
}

fn pair(key: &str, value: i64) -> Value {
	Value::tuple(vec![Value::utf8(key), Value::int(value)])
}

#[test]
fn test_grouped_sum_keeps_first_seen_order() {
	let input = Value::list(vec![pair("2019-01-01", 15), pair("2019-01-01", 10), pair("2019-01-02", 10)]);
	let expr = group_by([this().item(0)]).aggregate(tuple([this().item(0), reduce::sum(this().item(1))]));

	let exe = Compiler::default().compile(&expr, &Signature::new()).unwrap();
	assert_eq!(
		exe.call(input, ()).unwrap(),
		Value::list(vec![pair("2019-01-01", 25), pair("2019-01-02", 10)])
	);
}

#[test]
fn test_ungrouped_empty_input_reports_defaults() {
	let expr = aggregate(tuple([reduce::sum(this()), reduce::max(this())]));
	let exe = Compiler::default().compile(&expr, &Signature::new()).unwrap();
	assert_eq!(exe.call(Value::list(vec![]), ()).unwrap(), Value::tuple(vec![Value::int(0), Value::Null]));
}

#[test]
fn test_grouped_empty_input_is_empty() {
	let expr = group_by([this().item("k")]).aggregate(reduce::count());
	let exe = Compiler::default().compile(&expr, &Signature::new()).unwrap();
	assert_eq!(exe.call(Value::list(vec![]), ()).unwrap(), Value::list(vec![]));
}

#[test]
fn test_declared_default_on_empty_input() {
	let expr = aggregate(tuple([reduce::max(this()).or_default(naive(-1)), reduce::count()]));
	let exe = Compiler::default().compile(&expr, &Signature::new()).unwrap();
	assert_eq!(exe.call(Value::list(vec![]), ()).unwrap(), Value::tuple(vec![Value::int(-1), Value::int(0)]));
}

#[test]
fn test_keyed_sum() {
	let input = Value::list(vec![pair("a", 1), pair("a", 2), pair("b", 5)]);
	let expr = aggregate(reduce::dict_sum(this().item(0), this().item(1)));
	let exe = Compiler::default().compile(&expr, &Signature::new()).unwrap();
	assert_eq!(
		exe.call(input, ()).unwrap(),
		Value::dict(vec![(Value::utf8("a"), Value::int(3)), (Value::utf8("b"), Value::int(5))])
	);
}

#[test]
fn test_staggered_slot_initialization() {
	let input = rows(serde_json::json!([
		{"k": "a", "i": 1, "x": 1},
		{"k": "b", "i": 2, "x": 10},
		{"k": "a", "i": 2, "x": 2},
		{"k": "a", "i": 3, "x": 4},
	]));
	let late = reduce::sum(this().item("x")).where_(this().item("i").gte(3));
	let early = reduce::sum(this().item("x"));
	let expr = group_by([this().item("k")]).aggregate(tuple([this().item("k"), late, early]));

	let exe = Compiler::default().compile(&expr, &Signature::new()).unwrap();
	assert_eq!(
		exe.call(input, ()).unwrap(),
		Value::list(vec![
			Value::tuple(vec![Value::utf8("a"), Value::int(4), Value::int(7)]),
			Value::tuple(vec![Value::utf8("b"), Value::int(0), Value::int(10)]),
		])
	);
}

#[test]
fn test_declaration_order_does_not_change_results() {
	let input = rows(serde_json::json!([3, 1, 2]));
	let a = aggregate(tuple([reduce::sum(this()), reduce::max(this()), reduce::array(this())]));
	let b = aggregate(tuple([reduce::array(this()), reduce::max(this()), reduce::sum(this())]));

	let compiler = Compiler::default();
	let a = compiler.compile(&a, &Signature::new()).unwrap().call(input.clone(), ()).unwrap();
	let b = compiler.compile(&b, &Signature::new()).unwrap().call(input, ()).unwrap();

	let ordered = Value::list(vec![Value::int(3), Value::int(1), Value::int(2)]);
	assert_eq!(a, Value::tuple(vec![Value::int(6), Value::int(3), ordered.clone()]));
	assert_eq!(b, Value::tuple(vec![ordered, Value::int(3), Value::int(6)]));
}

#[test]
fn test_initial_value() {
	let expr = aggregate(reduce::sum(this()).initial(naive(100)));
	let exe = Compiler::default().compile(&expr, &Signature::new()).unwrap();
	assert_eq!(exe.call(Value::list(vec![]), ()).unwrap(), Value::int(100));
	assert_eq!(exe.call(rows(serde_json::json!([1, 2])), ()).unwrap(), Value::int(103));
}

#[test]
fn test_initial_read_from_first_accepted_row() {
	let input = rows(serde_json::json!([
		{"k": "a", "ok": false, "b": 100, "x": 1},
		{"k": "a", "ok": true, "b": 5, "x": 2},
	]));
	let expr = group_by([this().item("k")])
		.aggregate(reduce::sum(this().item("x")).initial(this().item("b")).where_(this().item("ok")));
	let exe = Compiler::default().compile(&expr, &Signature::new()).unwrap();
	assert_eq!(exe.call(input, ()).unwrap(), Value::list(vec![Value::int(7)]));
}

#[test]
fn test_row_dependent_initial() {
	let input = rows(serde_json::json!([{"b": 10, "x": 1}, {"b": 20, "x": 2}]));
	let expr = aggregate(tuple([
		reduce::sum(this().item("x")).initial(this().item("b")),
		reduce::max(this().item("x")).initial(this().item("b")),
	]));
	let exe = Compiler::default().compile(&expr, &Signature::new()).unwrap();
	assert_eq!(exe.call(input, ()).unwrap(), Value::tuple(vec![Value::int(13), Value::int(10)]));
}

#[test]
fn test_initial_with_null_first_value() {
	let expr = aggregate(tuple([
		reduce::sum(this()).initial(naive(10)),
		reduce::max(this()).initial(naive(4)),
		reduce::sum_or_null(this()).initial(naive(10)),
	]));
	let exe = Compiler::default().compile(&expr, &Signature::new()).unwrap();
	assert_eq!(
		exe.call(rows(serde_json::json!([null, 5, 3])), ()).unwrap(),
		Value::tuple(vec![Value::int(18), Value::int(5), Value::Null])
	);
}

#[test]
fn test_filtered_out_group_reports_constant_initial() {
	let input = rows(serde_json::json!([
		{"k": "a", "ok": true, "x": 1},
		{"k": "b", "ok": false, "x": 2},
	]));
	let expr = group_by([this().item("k")]).aggregate(tuple([
		this().item("k"),
		reduce::sum(this().item("x")).initial(naive(100)).where_(this().item("ok")),
	]));
	let exe = Compiler::default().compile(&expr, &Signature::new()).unwrap();
	assert_eq!(
		exe.call(input, ()).unwrap(),
		Value::list(vec![
			Value::tuple(vec![Value::utf8("a"), Value::int(101)]),
			Value::tuple(vec![Value::utf8("b"), Value::int(100)]),
		])
	);
}

#[test]
fn test_statistics_over_nulls_and_ties() {
	let expr = aggregate(tuple([
		reduce::average(this()),
		reduce::mode(this()),
		reduce::percentile(this(), 50.0, conduit::expr::Interpolation::Nearest),
	]));
	let exe = Compiler::default().compile(&expr, &Signature::new()).unwrap();
	assert_eq!(
		exe.call(rows(serde_json::json!([10, null, 20, 10, 20])), ()).unwrap(),
		Value::tuple(vec![Value::float(12.0), Value::int(20), Value::int(10)])
	);
}

#[test]
fn test_top_k_of_zero_is_rejected() {
	let err = Compiler::default().compile(&aggregate(reduce::top_k(this(), 0)), &Signature::new()).unwrap_err();
	assert!(matches!(err, CompileError::InvalidReducer { .. }));
}

#[test]
fn test_row_outside_group_key_is_rejected() {
	let expr = group_by([this().item("k")]).aggregate(tuple([this().item("v"), reduce::count()]));
	let err = Compiler::default().compile(&expr, &Signature::new()).unwrap_err();
	assert!(matches!(err, CompileError::MissingGroupByField { .. }));
}

#[test]
fn test_nested_reducer_is_rejected() {
	let expr = aggregate(reduce::sum(reduce::max(this())));
	let err = Compiler::default().compile(&expr, &Signature::new()).unwrap_err();
	assert!(matches!(err, CompileError::NestedReducer { .. }));
}

#[test]
fn test_filter_errors_propagate() {
	let expr = aggregate(reduce::sum(this()).where_(this().gt(naive(1))));
	let exe = Compiler::default().compile(&expr, &Signature::new()).unwrap();
	let err = exe.call(rows(serde_json::json!([2, "three"])), ()).unwrap_err();
	assert!(matches!(err, Error::NotComparable { .. }));
}

#[test]
fn test_aggregate_per_comprehension_item() {
	let input = rows(serde_json::json!([[1, 2, 3], [], [10]]));
	let expr = this().list_comp(aggregate(tuple([reduce::count(), reduce::sum(this())])));
	let exe = Compiler::default().compile(&expr, &Signature::new()).unwrap();
	assert_eq!(
		exe.call(input, ()).unwrap(),
		Value::list(vec![
			Value::tuple(vec![Value::int(3), Value::int(6)]),
			Value::tuple(vec![Value::int(0), Value::int(0)]),
			Value::tuple(vec![Value::int(1), Value::int(10)]),
		])
	);
}
