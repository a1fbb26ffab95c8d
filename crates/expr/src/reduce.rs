// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Reducer constructors for use inside an aggregate's output.
//!
//! Options are attached afterwards with [`Expr::where_`], [`Expr::or_default`]
//! and [`Expr::initial`].

use conduit_type::{Function, OrderedF64};

use crate::{Expr, Interpolation, Node, Reducer, ReducerKind, this};

fn reducer(kind: ReducerKind, args: Vec<Expr>) -> Expr {
	Expr::new(Node::Reducer(Reducer::new(kind, args)))
}

/// Sum; nulls count as zero.
pub fn sum(expr: impl Into<Expr>) -> Expr {
	reducer(ReducerKind::Sum, vec![expr.into()])
}

/// Sum that becomes null as soon as a null is seen.
pub fn sum_or_null(expr: impl Into<Expr>) -> Expr {
	reducer(ReducerKind::SumOrNull, vec![expr.into()])
}

pub fn max(expr: impl Into<Expr>) -> Expr {
	reducer(ReducerKind::Max, vec![expr.into()])
}

pub fn min(expr: impl Into<Expr>) -> Expr {
	reducer(ReducerKind::Min, vec![expr.into()])
}

/// The row holding the largest `key`.
pub fn max_row(key: impl Into<Expr>) -> Expr {
	reducer(ReducerKind::MaxRow, vec![key.into(), this()])
}

/// The row holding the smallest `key`.
pub fn min_row(key: impl Into<Expr>) -> Expr {
	reducer(ReducerKind::MinRow, vec![key.into(), this()])
}

/// Number of rows.
pub fn count() -> Expr {
	reducer(ReducerKind::Count, vec![])
}

/// Number of non-null values.
pub fn count_of(expr: impl Into<Expr>) -> Expr {
	reducer(ReducerKind::Count, vec![expr.into()])
}

pub fn count_distinct(expr: impl Into<Expr>) -> Expr {
	reducer(ReducerKind::CountDistinct, vec![expr.into()])
}

pub fn first(expr: impl Into<Expr>) -> Expr {
	reducer(ReducerKind::First, vec![expr.into()])
}

pub fn last(expr: impl Into<Expr>) -> Expr {
	reducer(ReducerKind::Last, vec![expr.into()])
}

/// Sum over the number of accepted rows; a null counts as 0.
pub fn average(expr: impl Into<Expr>) -> Expr {
	reducer(ReducerKind::Average, vec![expr.into()])
}

pub fn weighted_average(expr: impl Into<Expr>, weight: impl Into<Expr>) -> Expr {
	reducer(ReducerKind::Average, vec![expr.into(), weight.into()])
}

pub fn median(expr: impl Into<Expr>) -> Expr {
	reducer(ReducerKind::Median, vec![expr.into()])
}

/// `percentile` in `0..=100`.
///
/// # Panics
///
/// Panics if `percentile` is NaN.
pub fn percentile(expr: impl Into<Expr>, percentile: f64, interpolation: Interpolation) -> Expr {
	let percentile = OrderedF64::try_from(percentile).expect("percentile must not be NaN");
	reducer(
		ReducerKind::Percentile {
			percentile,
			interpolation,
		},
		vec![expr.into()],
	)
}

/// Most frequent non-null value; among equal counts the value first seen
/// last wins.
pub fn mode(expr: impl Into<Expr>) -> Expr {
	reducer(ReducerKind::Mode, vec![expr.into()])
}

/// The `k` most frequent values, most frequent first.
pub fn top_k(expr: impl Into<Expr>, k: usize) -> Expr {
	reducer(ReducerKind::TopK(k), vec![expr.into()])
}

pub fn array(expr: impl Into<Expr>) -> Expr {
	reducer(ReducerKind::Array, vec![expr.into()])
}

pub fn array_distinct(expr: impl Into<Expr>) -> Expr {
	reducer(ReducerKind::ArrayDistinct, vec![expr.into()])
}

pub fn array_sorted(expr: impl Into<Expr>, reverse: bool) -> Expr {
	reducer(
		ReducerKind::ArraySorted {
			reverse,
		},
		vec![expr.into()],
	)
}

/// Mapping of key to the last value seen for it.
pub fn dict(key: impl Into<Expr>, value: impl Into<Expr>) -> Expr {
	reducer(ReducerKind::Dict, vec![key.into(), value.into()])
}

pub fn dict_array(key: impl Into<Expr>, value: impl Into<Expr>) -> Expr {
	reducer(ReducerKind::DictArray, vec![key.into(), value.into()])
}

pub fn dict_array_distinct(key: impl Into<Expr>, value: impl Into<Expr>) -> Expr {
	reducer(ReducerKind::DictArrayDistinct, vec![key.into(), value.into()])
}

pub fn dict_sum(key: impl Into<Expr>, value: impl Into<Expr>) -> Expr {
	reducer(ReducerKind::DictSum, vec![key.into(), value.into()])
}

pub fn dict_sum_or_null(key: impl Into<Expr>, value: impl Into<Expr>) -> Expr {
	reducer(ReducerKind::DictSumOrNull, vec![key.into(), value.into()])
}

pub fn dict_max(key: impl Into<Expr>, value: impl Into<Expr>) -> Expr {
	reducer(ReducerKind::DictMax, vec![key.into(), value.into()])
}

pub fn dict_min(key: impl Into<Expr>, value: impl Into<Expr>) -> Expr {
	reducer(ReducerKind::DictMin, vec![key.into(), value.into()])
}

/// Number of rows per key.
pub fn dict_count(key: impl Into<Expr>) -> Expr {
	reducer(ReducerKind::DictCount, vec![key.into()])
}

/// Number of non-null values per key.
pub fn dict_count_of(key: impl Into<Expr>, value: impl Into<Expr>) -> Expr {
	reducer(ReducerKind::DictCount, vec![key.into(), value.into()])
}

pub fn dict_count_distinct(key: impl Into<Expr>, value: impl Into<Expr>) -> Expr {
	reducer(ReducerKind::DictCountDistinct, vec![key.into(), value.into()])
}

pub fn dict_first(key: impl Into<Expr>, value: impl Into<Expr>) -> Expr {
	reducer(ReducerKind::DictFirst, vec![key.into(), value.into()])
}

pub fn dict_last(key: impl Into<Expr>, value: impl Into<Expr>) -> Expr {
	reducer(ReducerKind::DictLast, vec![key.into(), value.into()])
}

/// Fold with `function(accumulator, args...)`. Without an initial value the
/// first row's value seeds the accumulator (only the first argument then).
pub fn reduce(function: &Function, args: impl IntoIterator<Item = Expr>) -> Expr {
	reducer(ReducerKind::Reduce(function.clone()), args.into_iter().collect())
}
