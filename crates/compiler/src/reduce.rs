// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Accumulator state machine shared by every reducer kind.
//!
//! A slot starts [`Slot::Unset`]. The first qualifying row runs [`first`],
//! which may decline (null skipping) and leave the slot unset; later rows run
//! [`combine`]. [`finish`] converts a set accumulator into the reduced value;
//! unset slots report the reducer's default instead.

use std::cmp::Ordering;

use conduit_expr::{Interpolation, ReducerKind};
use conduit_type::{Error, Result, Value};
use indexmap::IndexMap;

use crate::builtin::sort_values;

#[derive(Debug, Clone)]
pub(crate) enum Slot {
	Unset,
	Set(Acc),
}

#[derive(Debug, Clone)]
pub(crate) enum Acc {
	Value(Value),
	Count(i64),
	Row {
		key: Value,
		row: Value,
	},
	Mean {
		total: Value,
		weight: Value,
	},
	List(Vec<Value>),
	/// Normalized value to first-seen representation
	Distinct(IndexMap<Value, Value>),
	/// Normalized value to first-seen representation and occurrences
	Counter(IndexMap<Value, (Value, i64)>),
	Keyed(IndexMap<Value, Acc>),
}

/// Accumulator for a slot seeded with an explicit `initial` value.
pub(crate) fn seed(initial: Value) -> Acc {
	Acc::Value(initial)
}

/// Accumulator for the first qualifying row, `None` when the row is skipped.
pub(crate) fn first(kind: &ReducerKind, args: &[Value]) -> Result<Option<Acc>> {
	if let Some(inner) = kind.keyed_inner() {
		let (key, rest) = split_key(kind, args)?;
		return Ok(first(&inner, rest)?.map(|acc| Acc::Keyed(IndexMap::from([(key.clone(), acc)]))));
	}

	let value = args.first().cloned().unwrap_or(Value::Null);
	let acc = match kind {
		ReducerKind::Sum => Acc::Value(if value.is_null() {
			Value::Int(0)
		} else {
			value
		}),
		ReducerKind::SumOrNull | ReducerKind::First | ReducerKind::Last => Acc::Value(value),
		ReducerKind::Max | ReducerKind::Min => {
			if value.is_null() {
				return Ok(None);
			}
			Acc::Value(value)
		}
		ReducerKind::MaxRow | ReducerKind::MinRow => {
			if value.is_null() {
				return Ok(None);
			}
			Acc::Row {
				key: value,
				row: args.get(1).cloned().unwrap_or(Value::Null),
			}
		}
		ReducerKind::Count => {
			if !args.is_empty() && value.is_null() {
				return Ok(None);
			}
			Acc::Count(1)
		}
		ReducerKind::CountDistinct | ReducerKind::ArrayDistinct => {
			Acc::Distinct(IndexMap::from([(value.hash_key(), value)]))
		}
		ReducerKind::Average => {
			let (value, weight) = weighted(args);
			Acc::Mean {
				total: value.mul(&weight)?,
				weight,
			}
		}
		ReducerKind::Median
		| ReducerKind::Percentile {
			..
		} => {
			if value.is_null() {
				return Ok(None);
			}
			Acc::List(vec![value])
		}
		ReducerKind::Array
		| ReducerKind::ArraySorted {
			..
		} => Acc::List(vec![value]),
		ReducerKind::Mode if value.is_null() => return Ok(None),
		ReducerKind::Mode | ReducerKind::TopK(_) => Acc::Counter(IndexMap::from([(value.hash_key(), (value, 1))])),
		ReducerKind::Reduce(_) => Acc::Value(value),
		keyed => return Err(corrupt(keyed)),
	};
	Ok(Some(acc))
}

pub(crate) fn combine(kind: &ReducerKind, acc: &mut Acc, args: &[Value]) -> Result<()> {
	if let Some(inner) = kind.keyed_inner() {
		let (key, rest) = split_key(kind, args)?;
		let Acc::Keyed(map) = acc else {
			return Err(corrupt(kind));
		};
		match map.get_mut(key) {
			Some(entry) => combine(&inner, entry, rest)?,
			None => {
				if let Some(entry) = first(&inner, rest)? {
					map.insert(key.clone(), entry);
				}
			}
		}
		return Ok(());
	}

	let value = args.first().cloned().unwrap_or(Value::Null);
	match (kind, acc) {
		(ReducerKind::Sum, Acc::Value(total)) => {
			if !value.is_null() {
				*total = total.add(&value)?;
			}
		}
		(ReducerKind::SumOrNull, Acc::Value(total)) => {
			if !total.is_null() {
				*total = if value.is_null() {
					Value::Null
				} else {
					total.add(&value)?
				};
			}
		}
		(ReducerKind::Max, Acc::Value(best)) => {
			if !value.is_null() && (best.is_null() || value.compare(best)? == Ordering::Greater) {
				*best = value;
			}
		}
		(ReducerKind::Min, Acc::Value(best)) => {
			if !value.is_null() && (best.is_null() || value.compare(best)? == Ordering::Less) {
				*best = value;
			}
		}
		(
			ReducerKind::MaxRow,
			Acc::Row {
				key,
				row,
			},
		) => {
			if !value.is_null() && value.compare(key)? == Ordering::Greater {
				*key = value;
				*row = args.get(1).cloned().unwrap_or(Value::Null);
			}
		}
		(
			ReducerKind::MinRow,
			Acc::Row {
				key,
				row,
			},
		) => {
			if !value.is_null() && value.compare(key)? == Ordering::Less {
				*key = value;
				*row = args.get(1).cloned().unwrap_or(Value::Null);
			}
		}
		(ReducerKind::Count, Acc::Count(n)) => {
			if args.is_empty() || !value.is_null() {
				*n += 1;
			}
		}
		(ReducerKind::CountDistinct | ReducerKind::ArrayDistinct, Acc::Distinct(seen)) => {
			seen.entry(value.hash_key()).or_insert(value);
		}
		(ReducerKind::First, Acc::Value(_)) => {}
		(ReducerKind::Last, Acc::Value(last)) => *last = value,
		(
			ReducerKind::Average,
			Acc::Mean {
				total,
				weight,
			},
		) => {
			let (value, w) = weighted(args);
			*total = total.add(&value.mul(&w)?)?;
			*weight = weight.add(&w)?;
		}
		(
			ReducerKind::Median
			| ReducerKind::Percentile {
				..
			},
			Acc::List(values),
		) => {
			if !value.is_null() {
				values.push(value);
			}
		}
		(
			ReducerKind::Array
			| ReducerKind::ArraySorted {
				..
			},
			Acc::List(values),
		) => values.push(value),
		(ReducerKind::Mode, Acc::Counter(_)) if value.is_null() => {}
		(ReducerKind::Mode | ReducerKind::TopK(_), Acc::Counter(counts)) => {
			counts.entry(value.hash_key()).or_insert((value, 0)).1 += 1;
		}
		(ReducerKind::Reduce(function), Acc::Value(state)) => {
			let mut call_args = Vec::with_capacity(args.len() + 1);
			call_args.push(state.clone());
			call_args.extend_from_slice(args);
			*state = function.call(&call_args)?;
		}
		(kind, _) => return Err(corrupt(kind)),
	}
	Ok(())
}

pub(crate) fn finish(kind: &ReducerKind, acc: Acc) -> Result<Value> {
	if let Some(inner) = kind.keyed_inner() {
		let Acc::Keyed(map) = acc else {
			return Err(corrupt(kind));
		};
		return map
			.into_iter()
			.map(|(key, entry)| Ok((key, finish(&inner, entry)?)))
			.collect::<Result<_>>()
			.map(Value::Dict);
	}

	match (kind, acc) {
		(_, Acc::Value(value)) => Ok(value),
		(_, Acc::Count(n)) => Ok(Value::Int(n)),
		(
			_,
			Acc::Row {
				row,
				..
			},
		) => Ok(row),
		(
			_,
			Acc::Mean {
				total,
				weight,
			},
		) => total.div(&weight),
		(ReducerKind::CountDistinct, Acc::Distinct(seen)) => Ok(Value::Int(seen.len() as i64)),
		(_, Acc::Distinct(seen)) => Ok(Value::List(seen.into_values().collect())),
		(ReducerKind::Median, Acc::List(values)) => percentile(values, 50.0, Interpolation::Linear),
		(
			ReducerKind::Percentile {
				percentile: p,
				interpolation,
			},
			Acc::List(values),
		) => percentile(values, p.value(), *interpolation),
		(
			ReducerKind::ArraySorted {
				reverse,
			},
			Acc::List(mut values),
		) => {
			sort_values(&mut values, *reverse)?;
			Ok(Value::List(values))
		}
		(_, Acc::List(values)) => Ok(Value::List(values)),
		(ReducerKind::TopK(k), Acc::Counter(counts)) => {
			let mut entries: Vec<(Value, i64)> = counts.into_values().collect();
			// stable: equal counts keep first-seen order
			entries.sort_by(|a, b| b.1.cmp(&a.1));
			Ok(Value::List(entries.into_iter().take(*k).map(|(v, _)| v).collect()))
		}
		(_, Acc::Counter(counts)) => {
			// among equal counts the value first seen last wins
			let mut best: Option<(Value, i64)> = None;
			for (value, count) in counts.into_values() {
				if best.as_ref().is_none_or(|(_, n)| count >= *n) {
					best = Some((value, count));
				}
			}
			Ok(best.map(|(v, _)| v).unwrap_or(Value::Null))
		}
		(kind, Acc::Keyed(_)) => Err(corrupt(kind)),
	}
}

/// Reduced value of a slot, `None` when the reducer's default applies.
pub(crate) fn finish_slot(kind: &ReducerKind, slot: Slot) -> Result<Option<Value>> {
	match slot {
		Slot::Unset => Ok(None),
		// a zero total weight has no mean
		Slot::Set(Acc::Mean {
			weight,
			..
		}) if !weight.is_truthy() => Ok(None),
		Slot::Set(acc) => finish(kind, acc).map(Some),
	}
}

/// Value and weight of an average's row; nulls count as 0 and the weight
/// defaults to 1.
fn weighted(args: &[Value]) -> (Value, Value) {
	let or_zero = |value: Value| {
		if value.is_null() {
			Value::Int(0)
		} else {
			value
		}
	};
	let value = or_zero(args.first().cloned().unwrap_or(Value::Null));
	let weight = args.get(1).cloned().map_or(Value::Int(1), or_zero);
	(value, weight)
}

fn split_key<'a>(kind: &ReducerKind, args: &'a [Value]) -> Result<(&'a Value, &'a [Value])> {
	args.split_first().ok_or_else(|| Error::invalid_argument(kind.name(), "missing key argument"))
}

fn corrupt(kind: &ReducerKind) -> Error {
	Error::invalid_argument(kind.name(), "accumulator does not match reducer kind")
}

fn percentile(mut values: Vec<Value>, p: f64, interpolation: Interpolation) -> Result<Value> {
	if values.is_empty() {
		return Ok(Value::Null);
	}
	sort_values(&mut values, false)?;

	let position = (p / 100.0).clamp(0.0, 1.0) * (values.len() - 1) as f64;
	let lower = position.floor() as usize;
	let fraction = position - lower as f64;
	let lo = &values[lower];
	let hi = values.get(lower + 1).unwrap_or(lo);
	match interpolation {
		Interpolation::Lower => Ok(lo.clone()),
		Interpolation::Higher if fraction > 0.0 => Ok(hi.clone()),
		Interpolation::Higher => Ok(lo.clone()),
		// an exact half goes to the lower sample
		Interpolation::Nearest if fraction > 0.5 => Ok(hi.clone()),
		Interpolation::Nearest => Ok(lo.clone()),
		Interpolation::Midpoint if fraction == 0.0 => Ok(lo.clone()),
		Interpolation::Midpoint => lo.add(&hi.sub(lo)?.mul(&Value::float(0.5))?),
		// always a float for numbers, even on an exact sample
		Interpolation::Linear => lo.add(&hi.sub(lo)?.mul(&Value::float(fraction))?),
	}
}
