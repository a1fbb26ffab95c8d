// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{self, Display, Formatter};

use conduit_type::{Function, OrderedF64, Value};

use crate::Expr;

/// How a percentile falls between two neighbouring samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interpolation {
	#[default]
	Linear,
	Lower,
	Higher,
	Midpoint,
	Nearest,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReducerKind {
	Sum,
	SumOrNull,
	Max,
	Min,
	MaxRow,
	MinRow,
	Count,
	CountDistinct,
	First,
	Last,
	Average,
	Median,
	Percentile {
		percentile: OrderedF64,
		interpolation: Interpolation,
	},
	Mode,
	TopK(usize),
	Array,
	ArrayDistinct,
	ArraySorted {
		reverse: bool,
	},
	Dict,
	DictArray,
	DictArrayDistinct,
	DictSum,
	DictSumOrNull,
	DictMax,
	DictMin,
	DictCount,
	DictCountDistinct,
	DictFirst,
	DictLast,
	Reduce(Function),
}

impl ReducerKind {
	/// Per-key reducer of a keyed (`Dict*`) kind.
	pub fn keyed_inner(&self) -> Option<ReducerKind> {
		Some(match self {
			ReducerKind::Dict => ReducerKind::Last,
			ReducerKind::DictArray => ReducerKind::Array,
			ReducerKind::DictArrayDistinct => ReducerKind::ArrayDistinct,
			ReducerKind::DictSum => ReducerKind::Sum,
			ReducerKind::DictSumOrNull => ReducerKind::SumOrNull,
			ReducerKind::DictMax => ReducerKind::Max,
			ReducerKind::DictMin => ReducerKind::Min,
			ReducerKind::DictCount => ReducerKind::Count,
			ReducerKind::DictCountDistinct => ReducerKind::CountDistinct,
			ReducerKind::DictFirst => ReducerKind::First,
			ReducerKind::DictLast => ReducerKind::Last,
			_ => return None,
		})
	}

	/// Value reported when no qualifying row was seen.
	pub fn static_default(&self) -> Value {
		match self {
			ReducerKind::Sum | ReducerKind::Count | ReducerKind::CountDistinct => Value::Int(0),
			_ => Value::Null,
		}
	}

	/// Accepted argument counts, inclusive.
	pub fn arity(&self) -> (usize, usize) {
		match self {
			ReducerKind::Count => (0, 1),
			ReducerKind::Average => (1, 2),
			ReducerKind::MaxRow | ReducerKind::MinRow => (2, 2),
			ReducerKind::DictCount => (1, 2),
			ReducerKind::Reduce(_) => (1, usize::MAX),
			kind if kind.keyed_inner().is_some() => (2, 2),
			_ => (1, 1),
		}
	}

	/// Whether an `initial` accumulator value makes sense for this kind.
	pub fn accepts_initial(&self) -> bool {
		matches!(
			self,
			ReducerKind::Sum
				| ReducerKind::SumOrNull
				| ReducerKind::Max | ReducerKind::Min
				| ReducerKind::First | ReducerKind::Last
				| ReducerKind::Reduce(_)
		)
	}

	pub fn name(&self) -> &'static str {
		match self {
			ReducerKind::Sum => "sum",
			ReducerKind::SumOrNull => "sum_or_null",
			ReducerKind::Max => "max",
			ReducerKind::Min => "min",
			ReducerKind::MaxRow => "max_row",
			ReducerKind::MinRow => "min_row",
			ReducerKind::Count => "count",
			ReducerKind::CountDistinct => "count_distinct",
			ReducerKind::First => "first",
			ReducerKind::Last => "last",
			ReducerKind::Average => "average",
			ReducerKind::Median => "median",
			ReducerKind::Percentile {
				..
			} => "percentile",
			ReducerKind::Mode => "mode",
			ReducerKind::TopK(_) => "top_k",
			ReducerKind::Array => "array",
			ReducerKind::ArrayDistinct => "array_distinct",
			ReducerKind::ArraySorted {
				..
			} => "array_sorted",
			ReducerKind::Dict => "dict",
			ReducerKind::DictArray => "dict_array",
			ReducerKind::DictArrayDistinct => "dict_array_distinct",
			ReducerKind::DictSum => "dict_sum",
			ReducerKind::DictSumOrNull => "dict_sum_or_null",
			ReducerKind::DictMax => "dict_max",
			ReducerKind::DictMin => "dict_min",
			ReducerKind::DictCount => "dict_count",
			ReducerKind::DictCountDistinct => "dict_count_distinct",
			ReducerKind::DictFirst => "dict_first",
			ReducerKind::DictLast => "dict_last",
			ReducerKind::Reduce(_) => "reduce",
		}
	}
}

impl Display for ReducerKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			ReducerKind::Percentile {
				percentile,
				interpolation,
			} => write!(f, "percentile[{percentile}, {interpolation:?}]"),
			ReducerKind::TopK(k) => write!(f, "top_k[{k}]"),
			ReducerKind::ArraySorted {
				reverse: true,
			} => f.write_str("array_sorted[reverse]"),
			ReducerKind::Reduce(func) => write!(f, "reduce[{}]", func.name()),
			other => f.write_str(other.name()),
		}
	}
}

/// A reduction declared inside an aggregate's output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reducer {
	pub kind: ReducerKind,
	pub args: Vec<Expr>,
	/// Rows for which this evaluates falsy are ignored by this reducer
	pub filter: Option<Expr>,
	/// Overrides the kind's static default
	pub default: Option<Expr>,
	/// Starting accumulator value, read from the first row this reducer accepts
	pub initial: Option<Expr>,
}

impl Reducer {
	pub fn new(kind: ReducerKind, args: Vec<Expr>) -> Self {
		Self {
			kind,
			args,
			filter: None,
			default: None,
			initial: None,
		}
	}

	pub(crate) fn children(&self) -> Vec<&Expr> {
		let mut out = Vec::with_capacity(self.args.len() + 3);
		out.extend(self.filter.iter());
		out.extend(self.args.iter());
		out.extend(self.initial.iter());
		out.extend(self.default.iter());
		out
	}

	/// Identity of the accumulation: reducers equal under this key share one slot.
	pub fn slot_key(&self) -> (&ReducerKind, &[Expr], Option<&Expr>, Option<&Expr>) {
		(&self.kind, &self.args, self.filter.as_ref(), self.initial.as_ref())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_static_defaults() {
		assert_eq!(ReducerKind::Sum.static_default(), Value::int(0));
		assert_eq!(ReducerKind::Count.static_default(), Value::int(0));
		assert_eq!(ReducerKind::Max.static_default(), Value::Null);
		assert_eq!(ReducerKind::DictSum.static_default(), Value::Null);
	}

	#[test]
	fn test_keyed_inner() {
		assert_eq!(ReducerKind::DictSum.keyed_inner(), Some(ReducerKind::Sum));
		assert_eq!(ReducerKind::Dict.keyed_inner(), Some(ReducerKind::Last));
		assert_eq!(ReducerKind::Sum.keyed_inner(), None);
		assert_eq!(ReducerKind::DictMax.arity(), (2, 2));
		assert_eq!(ReducerKind::DictCount.arity(), (1, 2));
	}
}
