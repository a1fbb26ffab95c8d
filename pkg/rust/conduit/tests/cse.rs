// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};

use conduit::{
	Compiler, Function, Signature, Value,
	expr::{Expr, call, cond, naive, this, tuple},
};

fn counting(name: &str, pure: bool) -> (Function, Arc<AtomicUsize>) {
	let calls = Arc::new(AtomicUsize::new(0));
	let counter = calls.clone();
	let body = move |args: &[Value]| {
		counter.fetch_add(1, Ordering::SeqCst);
		args[0].add(&Value::int(1))
	};
	let function = if pure {
		Function::pure(name, body)
	} else {
		Function::new(name, body)
	};
	(function, calls)
}

fn eval(expr: &Expr, input: Value) -> Value {
	Compiler::default().compile(expr, &Signature::new()).unwrap().call(input, ()).unwrap()
}

#[test]
fn test_shared_side_effect_runs_once() {
	let (f, calls) = counting("bump", false);
	let shared = call(&f, [this()]);
	let expr = tuple([shared.clone(), shared.clone() * naive(2), shared]);

	assert_eq!(eval(&expr, Value::int(1)), Value::tuple(vec![Value::int(2), Value::int(4), Value::int(2)]));
	assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_shared_result_matches_independent_copies() {
	let (f, _) = counting("bump", true);
	let shared = call(&f, [this().item("x")]);
	let reused = tuple([shared.clone(), shared]);
	let copied = tuple([call(&f, [this().item("x")]), call(&f, [this().item("x")])]);

	let input = Value::from(serde_json::json!({"x": 41}));
	assert_eq!(eval(&reused, input.clone()), eval(&copied, input));
}

#[test]
fn test_impure_copies_are_not_merged() {
	let (f, calls) = counting("bump", false);
	let expr = tuple([call(&f, [this()]), call(&f, [this()])]);
	eval(&expr, Value::int(0));
	assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_expensive_pure_copies_are_merged() {
	let (f, calls) = counting("bump", true);
	let expr = tuple([call(&f, [this().item("x")]), call(&f, [this().item("x")])]);
	eval(&expr, Value::from(serde_json::json!({"x": 1})));
	assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_shared_subtree_runs_once_per_item() {
	let (f, calls) = counting("bump", false);
	let shared = call(&f, [this()]);
	let expr = this().list_comp(tuple([shared.clone(), shared]));

	let result = eval(&expr, Value::list(vec![Value::int(1), Value::int(2), Value::int(3)]));
	assert_eq!(
		result,
		Value::list(vec![
			Value::tuple(vec![Value::int(2), Value::int(2)]),
			Value::tuple(vec![Value::int(3), Value::int(3)]),
			Value::tuple(vec![Value::int(4), Value::int(4)]),
		])
	);
	assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_untaken_branch_is_not_evaluated() {
	let (f, calls) = counting("bump", false);
	let shared = call(&f, [this()]);
	let expr = cond(this().gt(naive(0)), tuple([shared.clone(), shared]), naive("skipped"));

	assert_eq!(eval(&expr, Value::int(-1)), Value::utf8("skipped"));
	assert_eq!(calls.load(Ordering::SeqCst), 0);
	eval(&expr, Value::int(1));
	assert_eq!(calls.load(Ordering::SeqCst), 1);
}
