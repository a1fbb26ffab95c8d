// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::thread;

use conduit::{
	Compiler, CompilerConfig, Signature, Value,
	expr::{naive, param, this},
};

#[test]
fn test_same_shape_is_a_cache_hit() {
	let compiler = Compiler::default();
	let first = compiler.compile(&(this() + naive(1)), &Signature::new()).unwrap();
	let second = compiler.compile(&(this() + naive(1)), &Signature::new()).unwrap();
	assert_eq!(first.name(), second.name());
	assert_eq!(compiler.cache_len(), 1);

	compiler.compile(&(this() + naive(2)), &Signature::new()).unwrap();
	assert_eq!(compiler.cache_len(), 2);
}

#[test]
fn test_capacity_bounds_retained_executables() {
	let compiler = Compiler::new(CompilerConfig::new().cache_capacity(2));
	for n in 0..5 {
		compiler.compile(&(this() * naive(n)), &Signature::new()).unwrap();
	}
	assert_eq!(compiler.cache_len(), 2);
}

#[test]
fn test_executable_is_shared_across_threads() {
	let exe = Compiler::default()
		.compile(&(this() * param("k")), &Signature::new().param_with_default("k", 10))
		.unwrap();

	let handles: Vec<_> = (0..4)
		.map(|i| {
			let exe = exe.clone();
			thread::spawn(move || exe.call(i, ()).unwrap())
		})
		.collect();
	let results: Vec<Value> = handles.into_iter().map(|h| h.join().unwrap()).collect();
	assert_eq!(results, vec![Value::int(0), Value::int(10), Value::int(20), Value::int(30)]);
}

#[test]
fn test_config_from_json() {
	let config = CompilerConfig::from_json(r#"{"cache_capacity": 1}"#).unwrap();
	let compiler = Compiler::new(config);
	compiler.compile(&this(), &Signature::new()).unwrap();
	compiler.compile(&(this() + naive(1)), &Signature::new()).unwrap();
	assert_eq!(compiler.cache_len(), 1);
}
