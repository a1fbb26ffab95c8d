// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use conduit_type::{Error, Result, Value};

/// Finalized state of the group currently being emitted by an aggregate.
#[derive(Debug, Clone)]
pub(crate) struct GroupView {
	pub key: Vec<Value>,
	/// Finished slot values; `None` when no row reached the slot
	pub values: Vec<Option<Value>>,
}

/// Sizes of the per-call storage an executable needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct FrameLayout {
	pub slots: usize,
	pub groups: usize,
}

/// Per-call mutable state: lazy bindings, labels, join rows and group views.
///
/// A frame is created for every call, so executables can be shared across
/// threads and invoked re-entrantly.
#[derive(Debug)]
pub(crate) struct Frame {
	slots: Vec<Option<Value>>,
	params: Vec<Value>,
	groups: Vec<Option<GroupView>>,
}

impl Frame {
	pub fn new(layout: FrameLayout, params: Vec<Value>) -> Self {
		Self {
			slots: vec![None; layout.slots],
			params,
			groups: vec![None; layout.groups],
		}
	}

	pub fn slot(&self, slot: usize) -> Option<&Value> {
		self.slots[slot].as_ref()
	}

	pub fn set_slot(&mut self, slot: usize, value: Value) {
		self.slots[slot] = Some(value);
	}

	/// Forgets the given bindings at the start of a scope instance.
	pub fn reset(&mut self, slots: &[usize]) {
		for &slot in slots {
			self.slots[slot] = None;
		}
	}

	pub fn param(&self, index: usize) -> &Value {
		&self.params[index]
	}

	pub fn label(&self, slot: usize, name: &str) -> Result<Value> {
		self.slots[slot].clone().ok_or_else(|| Error::UnboundLabel {
			name: name.to_string(),
		})
	}

	pub fn group(&self, group: usize) -> Option<&GroupView> {
		self.groups[group].as_ref()
	}

	/// Installs a group view, returning the one it replaces.
	pub fn set_group(&mut self, group: usize, view: Option<GroupView>) -> Option<GroupView> {
		std::mem::replace(&mut self.groups[group], view)
	}
}
