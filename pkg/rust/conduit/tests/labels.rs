// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use conduit::{
	CompileError, Compiler, Signature, Value,
	expr::{Expr, cond, label, naive, this, tuple},
};

fn compile(expr: &Expr) -> Result<conduit::Executable, CompileError> {
	Compiler::default().compile(expr, &Signature::new())
}

#[test]
fn test_label_read_after_write() {
	let expr = tuple([this().item("a").label_as("a"), label("a") + this().item("b")]);
	let exe = compile(&expr).unwrap();
	let input = Value::from(serde_json::json!({"a": 1, "b": 2}));
	assert_eq!(exe.call(input, ()).unwrap(), Value::tuple(vec![Value::int(1), Value::int(3)]));
}

#[test]
fn test_read_before_write_is_rejected() {
	let expr = tuple([label("a"), this().label_as("a")]);
	assert_eq!(
		compile(&expr).unwrap_err(),
		CompileError::UnresolvedLabel {
			name: "a".to_string()
		}
	);
}

#[test]
fn test_label_set_on_one_branch_only() {
	let expr = tuple([cond(this(), naive(1).label_as("x"), naive(2)), label("x")]);
	assert!(matches!(compile(&expr), Err(CompileError::UnresolvedLabel { .. })));

	let both = tuple([cond(this(), naive(1).label_as("x"), naive(2).label_as("x")), label("x")]);
	let exe = compile(&both).unwrap();
	assert_eq!(exe.call(false, ()).unwrap(), Value::tuple(vec![Value::int(2), Value::int(2)]));
}

#[test]
fn test_comprehension_labels_stay_inside() {
	let inside = this().list_comp(tuple([this().label_as("item"), label("item")]));
	assert!(compile(&inside).is_ok());

	let leaked = tuple([this().list_comp(this().label_as("item")), label("item")]);
	assert!(matches!(compile(&leaked), Err(CompileError::UnresolvedLabel { .. })));
}

#[test]
fn test_label_can_be_overwritten() {
	let expr = tuple([naive(1).label_as("x"), naive(2).label_as("x"), label("x")]);
	let exe = compile(&expr).unwrap();
	assert_eq!(exe.call(Value::Null, ()).unwrap(), Value::tuple(vec![Value::int(1), Value::int(2), Value::int(2)]));
}
