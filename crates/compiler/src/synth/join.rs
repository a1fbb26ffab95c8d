// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	collections::{HashMap, VecDeque},
	vec,
};

use conduit_expr::JoinHow;
use conduit_type::{Result, Value};
use smallvec::SmallVec;

use super::CompiledExpr;
use crate::frame::Frame;

type JoinKey = SmallVec<[Value; 2]>;

/// Keys and filter evaluated for one row of one join side.
pub(crate) struct CompiledSide {
	pub resets: Vec<usize>,
	pub keys: Vec<CompiledExpr>,
	pub filter: Option<CompiledExpr>,
}

impl CompiledSide {
	fn accepts(&self, input: &Value, frame: &mut Frame) -> Result<bool> {
		match &self.filter {
			Some(filter) => Ok(filter.eval(input, frame)?.is_truthy()),
			None => Ok(true),
		}
	}

	fn key(&self, input: &Value, frame: &mut Frame) -> Result<JoinKey> {
		let mut key = JoinKey::with_capacity(self.keys.len());
		for expr in &self.keys {
			key.push(expr.eval(input, frame)?.hash_key());
		}
		Ok(key)
	}
}

/// Secondary rows that passed their filter.
enum Candidates {
	/// Indexed by normalized key values
	Hash(HashMap<JoinKey, Vec<usize>>),
	/// Every row is a candidate for every primary row
	All(Vec<usize>),
}

/// A join between two row sequences.
///
/// The primary side is scanned row by row and determines output order: the
/// right input for a right join, the left input otherwise. The secondary side
/// is filtered once up front and, when the condition has equality keys,
/// indexed by them.
pub(crate) struct CompiledJoin {
	how: JoinHow,
	left: CompiledExpr,
	right: CompiledExpr,
	left_row: usize,
	right_row: usize,
	pre_filter: Option<CompiledExpr>,
	left_side: CompiledSide,
	right_side: CompiledSide,
	pair_resets: Vec<usize>,
	residual: Option<CompiledExpr>,
}

/// Progress of a join being consumed.
pub(crate) struct JoinState {
	primary: vec::IntoIter<Value>,
	secondary: Vec<Value>,
	candidates: Candidates,
	matched: Vec<bool>,
	/// False when the condition fails independently of the rows
	enabled: bool,
	pending: VecDeque<Value>,
	/// Next secondary row checked for the unmatched tail of an outer join
	tail: usize,
}

impl CompiledJoin {
	#[allow(clippy::too_many_arguments)]
	pub(super) fn new(
		how: JoinHow,
		left: CompiledExpr,
		right: CompiledExpr,
		(left_row, right_row): (usize, usize),
		pre_filter: Option<CompiledExpr>,
		(left_side, right_side): (CompiledSide, CompiledSide),
		pair_resets: Vec<usize>,
		residual: Option<CompiledExpr>,
	) -> Self {
		Self {
			how,
			left,
			right,
			left_row,
			right_row,
			pre_filter,
			left_side,
			right_side,
			pair_resets,
			residual,
		}
	}

	fn swapped(&self) -> bool {
		self.how == JoinHow::Right
	}

	fn preserves_primary(&self) -> bool {
		matches!(self.how, JoinHow::Left | JoinHow::Right | JoinHow::Outer)
	}

	/// Primary side and its row register, then the same for the secondary side.
	fn sides(&self) -> ((&CompiledSide, usize), (&CompiledSide, usize)) {
		let left = (&self.left_side, self.left_row);
		let right = (&self.right_side, self.right_row);
		if self.swapped() {
			(right, left)
		} else {
			(left, right)
		}
	}

	fn pair(&self, primary: Value, secondary: Value) -> Value {
		if self.swapped() {
			Value::Tuple(vec![secondary, primary])
		} else {
			Value::Tuple(vec![primary, secondary])
		}
	}

	/// Evaluates both inputs and prepares the secondary side.
	pub fn start(&self, input: &Value, frame: &mut Frame) -> Result<JoinState> {
		let left = self.left.eval(input, frame)?.into_elements()?;
		let right = self.right.eval(input, frame)?.into_elements()?;
		let (primary, secondary) = if self.swapped() {
			(right, left)
		} else {
			(left, right)
		};

		let enabled = match &self.pre_filter {
			Some(filter) => filter.eval(input, frame)?.is_truthy(),
			None => true,
		};

		let (_, (side, register)) = self.sides();
		let mut candidates = if side.keys.is_empty() {
			Candidates::All(Vec::new())
		} else {
			Candidates::Hash(HashMap::new())
		};
		if enabled {
			for (index, row) in secondary.iter().enumerate() {
				frame.set_slot(register, row.clone());
				frame.reset(&side.resets);
				if !side.accepts(input, frame)? {
					continue;
				}
				match &mut candidates {
					Candidates::Hash(index_by_key) => {
						index_by_key.entry(side.key(input, frame)?).or_default().push(index)
					}
					Candidates::All(all) => all.push(index),
				}
			}
		}

		Ok(JoinState {
			primary: primary.into_iter(),
			matched: vec![false; secondary.len()],
			secondary,
			candidates,
			enabled,
			pending: VecDeque::new(),
			tail: 0,
		})
	}

	/// Next joined pair, `None` once the join is exhausted.
	pub fn next(&self, state: &mut JoinState, input: &Value, frame: &mut Frame) -> Option<Result<Value>> {
		loop {
			if let Some(pair) = state.pending.pop_front() {
				return Some(Ok(pair));
			}
			if let Some(row) = state.primary.next() {
				if let Err(e) = self.match_row(state, row, input, frame) {
					return Some(Err(e));
				}
				continue;
			}
			if self.how == JoinHow::Outer {
				while state.tail < state.secondary.len() {
					let index = state.tail;
					state.tail += 1;
					if !state.matched[index] {
						return Some(Ok(self.pair(Value::Null, state.secondary[index].clone())));
					}
				}
			}
			return None;
		}
	}

	fn match_row(&self, state: &mut JoinState, row: Value, input: &Value, frame: &mut Frame) -> Result<()> {
		let ((side, register), (_, other_register)) = self.sides();
		frame.set_slot(register, row.clone());
		frame.reset(&side.resets);

		let candidates: Vec<usize> = if state.enabled && side.accepts(input, frame)? {
			match &state.candidates {
				Candidates::Hash(index_by_key) => {
					index_by_key.get(&side.key(input, frame)?).cloned().unwrap_or_default()
				}
				Candidates::All(all) => all.clone(),
			}
		} else {
			Vec::new()
		};

		let mut found = false;
		for index in candidates {
			let other = state.secondary[index].clone();
			frame.set_slot(other_register, other.clone());
			frame.reset(&self.pair_resets);
			if let Some(residual) = &self.residual {
				if !residual.eval(input, frame)?.is_truthy() {
					continue;
				}
			}
			found = true;
			state.matched[index] = true;
			state.pending.push_back(self.pair(row.clone(), other));
		}

		if !found && self.preserves_primary() {
			state.pending.push_back(self.pair(row, Value::Null));
		}
		Ok(())
	}

	pub fn collect(&self, input: &Value, frame: &mut Frame) -> Result<Value> {
		let mut state = self.start(input, frame)?;
		let mut out = Vec::new();
		while let Some(pair) = self.next(&mut state, input, frame) {
			out.push(pair?);
		}
		Ok(Value::List(out))
	}
}
