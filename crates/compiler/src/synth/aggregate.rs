// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use conduit_expr::ReducerKind;
use conduit_type::{Result, Value};
use indexmap::{IndexMap, map::Entry};
use smallvec::SmallVec;

use super::{CompiledExpr, Synthesizer};
use crate::{
	frame::{Frame, GroupView},
	program::AggregateOp,
	reduce::{self, Slot},
};

type GroupKey = SmallVec<[Value; 4]>;

struct CompiledSlot {
	kind: ReducerKind,
	args: Vec<CompiledExpr>,
	filter: Option<CompiledExpr>,
	initial: Option<CompiledExpr>,
	seed_empty: bool,
}

struct Record {
	key: Vec<Value>,
	slots: Vec<Slot>,
}

/// Single pass over the input feeding every reducer slot, grouped by the
/// normalized key values in first-seen order.
pub(crate) struct CompiledAggregate {
	group: usize,
	source: CompiledExpr,
	row_resets: Vec<usize>,
	keys: Vec<CompiledExpr>,
	slots: Vec<CompiledSlot>,
	output_resets: Vec<usize>,
	output: CompiledExpr,
}

impl CompiledAggregate {
	pub(super) fn compile(synth: &mut Synthesizer, op: &AggregateOp) -> Self {
		let source = synth.compile(&op.source);
		let row_resets = synth.compile_scope(&op.row_scope);
		let keys = synth.compile_all(&op.keys);
		let slots = op
			.slots
			.iter()
			.map(|slot| CompiledSlot {
				kind: slot.kind.clone(),
				args: synth.compile_all(&slot.args),
				filter: slot.filter.as_ref().map(|f| synth.compile(f)),
				initial: slot.initial.as_ref().map(|i| synth.compile(i)),
				seed_empty: slot.seed_empty,
			})
			.collect();
		let output_resets = synth.compile_scope(&op.output_scope);
		let output = synth.compile(&op.output);
		Self {
			group: op.group,
			source,
			row_resets,
			keys,
			slots,
			output_resets,
			output,
		}
	}

	pub fn run(&self, input: &Value, frame: &mut Frame) -> Result<Value> {
		let rows = self.source.eval(input, frame)?.into_elements()?;

		let mut groups: IndexMap<GroupKey, Record> = IndexMap::new();
		for row in &rows {
			frame.reset(&self.row_resets);
			let mut key = Vec::with_capacity(self.keys.len());
			for expr in &self.keys {
				key.push(expr.eval(row, frame)?);
			}
			let normalized: GroupKey = key.iter().map(Value::hash_key).collect();

			let record = match groups.entry(normalized) {
				Entry::Occupied(entry) => entry.into_mut(),
				Entry::Vacant(entry) => entry.insert(Record {
					key,
					slots: vec![Slot::Unset; self.slots.len()],
				}),
			};
			for (slot, state) in self.slots.iter().zip(record.slots.iter_mut()) {
				slot.update(state, row, frame)?;
			}
		}

		if self.keys.is_empty() {
			let record = match groups.pop() {
				Some((_, record)) => record,
				None => {
					frame.reset(&self.row_resets);
					Record {
						key: Vec::new(),
						slots: self.seed_empty(input, frame)?,
					}
				}
			};
			return self.emit(record, input, frame);
		}

		let mut out = Vec::with_capacity(groups.len());
		for (_, record) in groups {
			out.push(self.emit(record, input, frame)?);
		}
		Ok(Value::List(out))
	}

	/// Slot states of an ungrouped aggregate that saw no rows. Only initial
	/// values that do not depend on a row are applied.
	fn seed_empty(&self, input: &Value, frame: &mut Frame) -> Result<Vec<Slot>> {
		let mut states = Vec::with_capacity(self.slots.len());
		for slot in &self.slots {
			let state = match &slot.initial {
				Some(initial) if slot.seed_empty => Slot::Set(reduce::seed(initial.eval(input, frame)?)),
				_ => Slot::Unset,
			};
			states.push(state);
		}
		Ok(states)
	}

	fn emit(&self, record: Record, input: &Value, frame: &mut Frame) -> Result<Value> {
		let mut values = Vec::with_capacity(record.slots.len());
		for (state, slot) in record.slots.into_iter().zip(&self.slots) {
			values.push(reduce::finish_slot(&slot.kind, state)?);
		}

		let previous = frame.set_group(
			self.group,
			Some(GroupView {
				key: record.key,
				values,
			}),
		);
		frame.reset(&self.output_resets);
		let result = self.output.eval(input, frame);
		frame.set_group(self.group, previous);
		result
	}
}

impl CompiledSlot {
	fn update(&self, state: &mut Slot, row: &Value, frame: &mut Frame) -> Result<()> {
		if let Some(filter) = &self.filter {
			if !filter.eval(row, frame)?.is_truthy() {
				return Ok(());
			}
		}
		let mut args: SmallVec<[Value; 3]> = SmallVec::with_capacity(self.args.len());
		for arg in &self.args {
			args.push(arg.eval(row, frame)?);
		}

		match state {
			Slot::Set(acc) => reduce::combine(&self.kind, acc, &args),
			Slot::Unset => {
				let Some(first) = reduce::first(&self.kind, &args)? else {
					return Ok(());
				};
				// the initial value is taken from the first row the slot accepts
				let acc = match &self.initial {
					Some(initial) => {
						let mut acc = reduce::seed(initial.eval(row, frame)?);
						reduce::combine(&self.kind, &mut acc, &args)?;
						acc
					}
					None => first,
				};
				*state = Slot::Set(acc);
				Ok(())
			}
		}
	}
}
