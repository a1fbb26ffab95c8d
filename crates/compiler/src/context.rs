// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::HashMap;

use conduit_type::Value;

use crate::{frame::FrameLayout, program::Binding, signature::Signature};

/// Hands out names that are unique across one whole compilation, including
/// nested scopes.
#[derive(Debug, Default)]
pub(crate) struct NameAllocator {
	counter: usize,
}

impl NameAllocator {
	pub fn fresh(&mut self, prefix: &str) -> String {
		self.counter += 1;
		format!("{prefix}_{}", self.counter)
	}
}

/// Identity-preserving table of the constants and callables an executable
/// closes over. Equal values share one entry; functions and objects are only
/// equal to themselves.
#[derive(Debug, Default)]
pub(crate) struct ConstantRegistry {
	entries: Vec<(String, Value)>,
	index: HashMap<Value, usize>,
}

impl ConstantRegistry {
	pub fn register(&mut self, names: &mut NameAllocator, value: &Value) -> String {
		if let Some(&i) = self.index.get(value) {
			return self.entries[i].0.clone();
		}
		let name = names.fresh("const");
		self.index.insert(value.clone(), self.entries.len());
		self.entries.push((name.clone(), value.clone()));
		name
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn into_entries(self) -> Vec<(String, Value)> {
		self.entries
	}
}

/// Mutable state threaded through one lowering pass.
pub(crate) struct CodeGenContext {
	pub names: NameAllocator,
	pub constants: ConstantRegistry,
	pub signature: Signature,
	labels: HashMap<String, Binding>,
	slots: usize,
	groups: usize,
}

impl CodeGenContext {
	pub fn new(signature: Signature) -> Self {
		Self {
			names: NameAllocator::default(),
			constants: ConstantRegistry::default(),
			signature,
			labels: HashMap::new(),
			slots: 0,
			groups: 0,
		}
	}

	pub fn constant(&mut self, value: &Value) -> String {
		self.constants.register(&mut self.names, value)
	}

	pub fn alloc_slot(&mut self, prefix: &str) -> Binding {
		let slot = self.slots;
		self.slots += 1;
		Binding {
			slot,
			name: self.names.fresh(prefix),
		}
	}

	/// The single slot shared by every read and write of `name`.
	pub fn label(&mut self, name: &str) -> Binding {
		if let Some(binding) = self.labels.get(name) {
			return binding.clone();
		}
		let binding = Binding {
			slot: self.slots,
			name: format!("label_{name}"),
		};
		self.slots += 1;
		self.labels.insert(name.to_string(), binding.clone());
		binding
	}

	pub fn alloc_group(&mut self) -> usize {
		self.groups += 1;
		self.groups - 1
	}

	/// Position of a parameter; undeclared parameters become required.
	pub fn param(&mut self, name: &str) -> usize {
		match self.signature.index_of(name) {
			Some(index) => index,
			None => self.signature.push_required(name),
		}
	}

	pub fn layout(&self) -> FrameLayout {
		FrameLayout {
			slots: self.slots,
			groups: self.groups,
		}
	}
}

#[cfg(test)]
mod tests {
	use conduit_type::Function;

	use super::*;

	#[test]
	fn test_names_are_unique() {
		let mut names = NameAllocator::default();
		let a = names.fresh("v");
		let b = names.fresh("v");
		let c = names.fresh("row");
		assert_ne!(a, b);
		assert_ne!(b, c);
	}

	#[test]
	fn test_constants_deduplicate_by_identity() {
		let mut cx = CodeGenContext::new(Signature::new());
		let f = Function::new("f", |_| Ok(Value::Null));
		let g = Function::new("f", |_| Ok(Value::Null));

		let a = cx.constant(&Value::Function(f.clone()));
		let b = cx.constant(&Value::Function(f));
		let c = cx.constant(&Value::Function(g));
		let d = cx.constant(&Value::int(1));
		let e = cx.constant(&Value::int(1));
		assert_eq!(a, b);
		assert_ne!(a, c);
		assert_eq!(d, e);
		assert_eq!(cx.constants.len(), 3);
	}

	#[test]
	fn test_labels_share_a_slot() {
		let mut cx = CodeGenContext::new(Signature::new());
		let a = cx.label("x");
		cx.alloc_slot("v");
		let b = cx.label("x");
		assert_eq!(a, b);
		assert_eq!(cx.layout().slots, 2);
	}

	#[test]
	fn test_undeclared_params_are_appended() {
		let mut cx = CodeGenContext::new(Signature::new().param("a"));
		assert_eq!(cx.param("a"), 0);
		assert_eq!(cx.param("b"), 1);
		assert_eq!(cx.param("b"), 1);
		assert!(cx.signature.params()[1].is_required());
	}
}
