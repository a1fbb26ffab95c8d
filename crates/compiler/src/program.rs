// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Lowered program: the explicit intermediate form between the expression
//! tree and the synthesized closures. It is what the debug rendering prints.

use conduit_expr::{BinaryOp, Builtin, CollectionKind, ComprehensionKind, JoinHow, NullOrder, ReducerKind, UnaryOp};
use conduit_type::{ErrorKind, Function, Value};

use crate::{frame::FrameLayout, signature::ParamSpec};

/// A named frame slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Binding {
	pub slot: usize,
	pub name: String,
}

#[derive(Debug, Clone)]
pub(crate) enum Step {
	Key(Op),
	Attr(String),
}

#[derive(Debug, Clone)]
pub(crate) enum Op {
	Input,
	Const {
		name: String,
		value: Value,
	},
	Param {
		index: usize,
		name: String,
	},
	Access {
		source: Box<Op>,
		steps: Vec<Step>,
		default: Option<Box<Op>>,
	},
	Call {
		name: String,
		function: Function,
		args: Vec<Op>,
	},
	Builtin {
		op: Builtin,
		args: Vec<Op>,
	},
	Binary {
		op: BinaryOp,
		left: Box<Op>,
		right: Box<Op>,
	},
	Unary {
		op: UnaryOp,
		operand: Box<Op>,
	},
	And(Vec<Op>),
	Or(Vec<Op>),
	Collection {
		kind: CollectionKind,
		items: Vec<Op>,
	},
	Dict(Vec<(Op, Op)>),
	Loop(Box<LoopOp>),
	Sort(Box<SortOp>),
	Try(Box<TryOp>),
	/// Error held by the enclosing handler
	Caught(Binding),
	Cond {
		condition: Box<Op>,
		then: Box<Op>,
		otherwise: Box<Op>,
	},
	/// Producer evaluated once, consumer evaluated against its result
	Pipe {
		producer: Box<Op>,
		consumer: Box<Op>,
	},
	/// Lazily evaluated binding of the enclosing scope
	Memo(Binding),
	SetLabel {
		label: Binding,
		value: Box<Op>,
	},
	GetLabel(Binding),
	/// Current row of one join side
	Register(Binding),
	Aggregate(Box<AggregateOp>),
	Join(Box<JoinOp>),
	GroupKey {
		group: usize,
		index: usize,
	},
	SlotValue {
		group: usize,
		index: usize,
		default: Box<Op>,
	},
}

#[derive(Debug, Clone)]
pub(crate) struct Memo {
	pub binding: Binding,
	pub op: Op,
}

/// Lazy bindings owned by one scope; forgotten whenever the scope is entered.
#[derive(Debug, Clone, Default)]
pub(crate) struct Scope {
	pub memos: Vec<Memo>,
}

impl Scope {
	pub fn resets(&self) -> Vec<usize> {
		self.memos.iter().map(|m| m.binding.slot).collect()
	}
}

#[derive(Debug, Clone)]
pub(crate) struct LoopOp {
	pub kind: ComprehensionKind,
	pub var: String,
	pub source: Op,
	pub scope: Scope,
	pub filter: Option<Op>,
	pub key: Option<Op>,
	pub element: Op,
}

/// Direction and null placement of one sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct KeyOrder {
	pub descending: bool,
	pub nulls: NullOrder,
}

#[derive(Debug, Clone)]
pub(crate) struct SortKeyOp {
	pub op: Op,
	pub order: KeyOrder,
}

#[derive(Debug, Clone)]
pub(crate) struct SortOp {
	pub var: String,
	pub source: Op,
	pub scope: Scope,
	/// Empty sorts the elements themselves
	pub keys: Vec<SortKeyOp>,
	pub reverse: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct HandlerOp {
	pub kinds: Vec<ErrorKind>,
	pub value: Op,
	pub reraise_if: Option<Op>,
}

#[derive(Debug, Clone)]
pub(crate) struct TryOp {
	pub body: Op,
	pub handlers: Vec<HandlerOp>,
	/// Holds the message of the error being handled
	pub caught: Binding,
}

#[derive(Debug, Clone)]
pub(crate) struct SlotOp {
	pub kind: ReducerKind,
	pub args: Vec<Op>,
	pub filter: Option<Op>,
	pub initial: Option<Op>,
	/// `initial` does not read the row, so it also seeds an empty aggregate
	pub seed_empty: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct AggregateOp {
	pub group: usize,
	pub row: String,
	pub source: Op,
	pub row_scope: Scope,
	pub keys: Vec<Op>,
	pub slots: Vec<SlotOp>,
	pub output_scope: Scope,
	pub output: Op,
}

impl AggregateOp {
	pub fn grouped(&self) -> bool {
		!self.keys.is_empty()
	}
}

/// Per-side key expressions and filter of a join.
#[derive(Debug, Clone, Default)]
pub(crate) struct JoinSideOp {
	pub scope: Scope,
	pub keys: Vec<Op>,
	pub filter: Option<Op>,
}

#[derive(Debug, Clone)]
pub(crate) struct JoinOp {
	pub how: JoinHow,
	pub left: Op,
	pub right: Op,
	pub left_row: Binding,
	pub right_row: Binding,
	/// Conjuncts reading neither side, evaluated once per join
	pub pre_filter: Option<Op>,
	pub left_side: JoinSideOp,
	pub right_side: JoinSideOp,
	pub pair_scope: Scope,
	pub residual: Option<Op>,
}

impl JoinOp {
	pub fn is_hash_join(&self) -> bool {
		!self.left_side.keys.is_empty()
	}
}

#[derive(Debug, Clone)]
pub(crate) struct Program {
	pub name: String,
	pub params: Vec<ParamSpec>,
	pub input: String,
	pub constants: Vec<(String, Value)>,
	pub scope: Scope,
	pub body: Op,
	pub layout: FrameLayout,
}
