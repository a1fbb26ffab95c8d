// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{self, Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
	Add,
	Sub,
	Mul,
	Div,
	FloorDiv,
	Mod,
	Pow,
	Eq,
	NotEq,
	Lt,
	LtE,
	Gt,
	GtE,
	In,
	NotIn,
}

impl BinaryOp {
	pub fn is_arithmetic(&self) -> bool {
		matches!(
			self,
			BinaryOp::Add
				| BinaryOp::Sub | BinaryOp::Mul
				| BinaryOp::Div | BinaryOp::FloorDiv
				| BinaryOp::Mod | BinaryOp::Pow
		)
	}

	pub fn symbol(&self) -> &'static str {
		match self {
			BinaryOp::Add => "+",
			BinaryOp::Sub => "-",
			BinaryOp::Mul => "*",
			BinaryOp::Div => "/",
			BinaryOp::FloorDiv => "//",
			BinaryOp::Mod => "%",
			BinaryOp::Pow => "**",
			BinaryOp::Eq => "==",
			BinaryOp::NotEq => "!=",
			BinaryOp::Lt => "<",
			BinaryOp::LtE => "<=",
			BinaryOp::Gt => ">",
			BinaryOp::GtE => ">=",
			BinaryOp::In => "in",
			BinaryOp::NotIn => "not in",
		}
	}
}

impl Display for BinaryOp {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(self.symbol())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
	Not,
	Neg,
	IsNull,
	IsNotNull,
}

/// Builtin operations evaluated without going through an external callable.
///
/// The first argument is the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
	Len,
	Str,
	Int,
	Float,
	Bool,
	Abs,
	Round,
	Lower,
	Upper,
	Strip,
	Split,
	Join,
	Keys,
	Values,
	Items,
	Sorted,
	Reversed,
	Sum,
	Min,
	Max,
	Enumerate,
	Zip,
	Flatten,
	Contains,
	StartsWith,
	EndsWith,
}

impl Builtin {
	pub fn name(&self) -> &'static str {
		match self {
			Builtin::Len => "len",
			Builtin::Str => "str",
			Builtin::Int => "int",
			Builtin::Float => "float",
			Builtin::Bool => "bool",
			Builtin::Abs => "abs",
			Builtin::Round => "round",
			Builtin::Lower => "lower",
			Builtin::Upper => "upper",
			Builtin::Strip => "strip",
			Builtin::Split => "split",
			Builtin::Join => "join",
			Builtin::Keys => "keys",
			Builtin::Values => "values",
			Builtin::Items => "items",
			Builtin::Sorted => "sorted",
			Builtin::Reversed => "reversed",
			Builtin::Sum => "sum",
			Builtin::Min => "min",
			Builtin::Max => "max",
			Builtin::Enumerate => "enumerate",
			Builtin::Zip => "zip",
			Builtin::Flatten => "flatten",
			Builtin::Contains => "contains",
			Builtin::StartsWith => "startswith",
			Builtin::EndsWith => "endswith",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
	List,
	Tuple,
	Set,
}

/// Shape of a comprehension's result. `Iter` is lazy when it is the
/// outermost expression and materialized as a list otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComprehensionKind {
	Iter,
	List,
	Tuple,
	Set,
	Dict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinHow {
	Inner,
	Left,
	Right,
	Outer,
	Cross,
}

impl Display for JoinHow {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			JoinHow::Inner => "inner",
			JoinHow::Left => "left",
			JoinHow::Right => "right",
			JoinHow::Outer => "outer",
			JoinHow::Cross => "cross",
		})
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinSide {
	Left,
	Right,
}
