// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::cmp::Ordering;

use conduit_expr::{Builtin, NullOrder};
use conduit_type::{Error, Result, Value};

use crate::program::KeyOrder;

/// Sorts in place, stable; a single incomparable pair fails the whole sort.
pub(crate) fn sort_values(values: &mut [Value], reverse: bool) -> Result<()> {
	let mut error = None;
	values.sort_by(|a, b| {
		let (a, b) = if reverse {
			(b, a)
		} else {
			(a, b)
		};
		a.compare(b).unwrap_or_else(|e| {
			error.get_or_insert(e);
			Ordering::Equal
		})
	});
	match error {
		Some(e) => Err(e),
		None => Ok(()),
	}
}

/// Sorts `values` by their precomputed key tuples, stable. `orders` holds
/// one entry per key component.
pub(crate) fn sort_by_keys(
	values: Vec<Value>,
	keys: Vec<Vec<Value>>,
	orders: &[KeyOrder],
	reverse: bool,
) -> Result<Vec<Value>> {
	let mut pairs: Vec<(Vec<Value>, Value)> = keys.into_iter().zip(values).collect();
	let mut error = None;
	pairs.sort_by(|(a, _), (b, _)| {
		let (a, b) = if reverse {
			(b, a)
		} else {
			(a, b)
		};
		compare_keys(a, b, orders).unwrap_or_else(|e| {
			error.get_or_insert(e);
			Ordering::Equal
		})
	});
	match error {
		Some(e) => Err(e),
		None => Ok(pairs.into_iter().map(|(_, v)| v).collect()),
	}
}

fn compare_keys(a: &[Value], b: &[Value], orders: &[KeyOrder]) -> Result<Ordering> {
	for ((a, b), order) in a.iter().zip(b).zip(orders) {
		let placed = match order.nulls {
			NullOrder::Natural => Ordering::Equal,
			NullOrder::First => b.is_null().cmp(&a.is_null()),
			NullOrder::Last => a.is_null().cmp(&b.is_null()),
		};
		if placed != Ordering::Equal {
			return Ok(placed);
		}
		// equal components are skipped without an ordering check, so two nulls tie
		if a.equals(b) {
			continue;
		}
		let ordering = a.compare(b)?;
		return Ok(if order.descending {
			ordering.reverse()
		} else {
			ordering
		});
	}
	Ok(Ordering::Equal)
}

pub(crate) fn apply(op: Builtin, args: &[Value]) -> Result<Value> {
	let receiver = arg(op, args, 0)?;
	match op {
		Builtin::Len => match receiver {
			Value::Utf8(s) => Ok(Value::Int(s.chars().count() as i64)),
			Value::List(v) | Value::Tuple(v) => Ok(Value::Int(v.len() as i64)),
			Value::Set(v) => Ok(Value::Int(v.len() as i64)),
			Value::Dict(v) => Ok(Value::Int(v.len() as i64)),
			other => Err(Error::type_mismatch("len()", &[other])),
		},
		Builtin::Str => Ok(Value::Utf8(receiver.to_string())),
		Builtin::Int => match receiver {
			Value::Int(_) => Ok(receiver.clone()),
			Value::Bool(b) => Ok(Value::Int(*b as i64)),
			Value::Float(f) => {
				let truncated = f.trunc();
				if truncated.abs() < 9.2e18 {
					Ok(Value::Int(truncated as i64))
				} else {
					Err(Error::Overflow {
						operation: "int()".to_string(),
					})
				}
			}
			Value::Utf8(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
				Error::invalid_argument("int", format!("invalid literal {}", receiver.repr()))
			}),
			other => Err(Error::type_mismatch("int()", &[other])),
		},
		Builtin::Float => match receiver {
			Value::Float(_) => Ok(receiver.clone()),
			Value::Int(v) => Ok(Value::float(*v as f64)),
			Value::Bool(b) => Ok(Value::float(*b as i64 as f64)),
			Value::Utf8(s) => s.trim().parse::<f64>().map(Value::float).map_err(|_| {
				Error::invalid_argument("float", format!("invalid literal {}", receiver.repr()))
			}),
			other => Err(Error::type_mismatch("float()", &[other])),
		},
		Builtin::Bool => Ok(Value::Bool(receiver.is_truthy())),
		Builtin::Abs => match receiver {
			Value::Int(v) => v.checked_abs().map(Value::Int).ok_or_else(|| Error::Overflow {
				operation: "abs()".to_string(),
			}),
			Value::Float(f) => Ok(Value::float(f.abs())),
			other => Err(Error::type_mismatch("abs()", &[other])),
		},
		Builtin::Round => round(receiver, args.get(1)),
		Builtin::Lower => Ok(Value::Utf8(string(op, receiver)?.to_lowercase())),
		Builtin::Upper => Ok(Value::Utf8(string(op, receiver)?.to_uppercase())),
		Builtin::Strip => Ok(Value::Utf8(string(op, receiver)?.trim().to_string())),
		Builtin::Split => {
			let s = string(op, receiver)?;
			let parts: Vec<Value> = match args.get(1) {
				None | Some(Value::Null) => s.split_whitespace().map(Value::utf8).collect(),
				Some(sep) => {
					let sep = string(op, sep)?;
					if sep.is_empty() {
						return Err(Error::invalid_argument("split", "empty separator"));
					}
					s.split(sep).map(Value::utf8).collect()
				}
			};
			Ok(Value::List(parts))
		}
		Builtin::Join => {
			let sep = match args.get(1) {
				Some(sep) => string(op, sep)?,
				None => "",
			};
			let parts = receiver
				.elements()?
				.iter()
				.map(|item| string(op, item).map(str::to_string))
				.collect::<Result<Vec<_>>>()?;
			Ok(Value::Utf8(parts.join(sep)))
		}
		Builtin::Keys => Ok(Value::List(dict(op, receiver)?.keys().cloned().collect())),
		Builtin::Values => Ok(Value::List(dict(op, receiver)?.values().cloned().collect())),
		Builtin::Items => Ok(Value::List(
			dict(op, receiver)?.iter().map(|(k, v)| Value::Tuple(vec![k.clone(), v.clone()])).collect(),
		)),
		Builtin::Sorted => {
			let reverse = args.get(1).is_some_and(Value::is_truthy);
			let mut items = receiver.elements()?;
			sort_values(&mut items, reverse)?;
			Ok(Value::List(items))
		}
		Builtin::Reversed => {
			let mut items = receiver.elements()?;
			items.reverse();
			Ok(Value::List(items))
		}
		Builtin::Sum => {
			let start = args.get(1).cloned().unwrap_or(Value::Int(0));
			receiver.elements()?.iter().try_fold(start, |acc, item| acc.add(item))
		}
		Builtin::Min | Builtin::Max => {
			let wanted = if op == Builtin::Min {
				Ordering::Less
			} else {
				Ordering::Greater
			};
			let mut best: Option<Value> = None;
			for item in receiver.elements()? {
				best = match best {
					Some(current) if item.compare(&current)? != wanted => Some(current),
					_ => Some(item),
				};
			}
			best.ok_or_else(|| Error::invalid_argument(op.name(), "empty sequence"))
		}
		Builtin::Enumerate => Ok(Value::List(
			receiver.elements()?
				.into_iter()
				.enumerate()
				.map(|(i, v)| Value::Tuple(vec![Value::Int(i as i64), v]))
				.collect(),
		)),
		Builtin::Zip => {
			let columns = args.iter().map(Value::elements).collect::<Result<Vec<_>>>()?;
			let len = columns.iter().map(Vec::len).min().unwrap_or(0);
			Ok(Value::List(
				(0..len).map(|i| Value::Tuple(columns.iter().map(|c| c[i].clone()).collect())).collect(),
			))
		}
		Builtin::Flatten => {
			let mut out = Vec::new();
			for item in receiver.elements()? {
				out.extend(item.into_elements()?);
			}
			Ok(Value::List(out))
		}
		Builtin::Contains => Ok(Value::Bool(receiver.contains(arg(op, args, 1)?)?)),
		Builtin::StartsWith => {
			let prefix = string(op, arg(op, args, 1)?)?;
			Ok(Value::Bool(string(op, receiver)?.starts_with(prefix)))
		}
		Builtin::EndsWith => {
			let suffix = string(op, arg(op, args, 1)?)?;
			Ok(Value::Bool(string(op, receiver)?.ends_with(suffix)))
		}
	}
}

fn arg(op: Builtin, args: &[Value], index: usize) -> Result<&Value> {
	args.get(index).ok_or_else(|| Error::invalid_argument(op.name(), format!("expected at least {} arguments", index + 1)))
}

fn string(op: Builtin, value: &Value) -> Result<&str> {
	value.as_str().ok_or_else(|| Error::type_mismatch(op.name(), &[value]))
}

fn dict(op: Builtin, value: &Value) -> Result<&indexmap::IndexMap<Value, Value>> {
	match value {
		Value::Dict(map) => Ok(map),
		other => Err(Error::type_mismatch(op.name(), &[other])),
	}
}

fn round(value: &Value, digits: Option<&Value>) -> Result<Value> {
	let digits = match digits {
		None | Some(Value::Null) => None,
		Some(Value::Int(d)) => Some(*d),
		Some(other) => return Err(Error::type_mismatch("round()", &[value, other])),
	};
	match (value, digits) {
		(Value::Int(_), _) => Ok(value.clone()),
		(Value::Float(f), None) => {
			let rounded = f.round_ties_even();
			if rounded.abs() < 9.2e18 {
				Ok(Value::Int(rounded as i64))
			} else {
				Err(Error::Overflow {
					operation: "round()".to_string(),
				})
			}
		}
		(Value::Float(f), Some(d)) => {
			let scale = 10f64.powi(d.clamp(-308, 308) as i32);
			Ok(Value::float((f.value() * scale).round_ties_even() / scale))
		}
		(other, _) => Err(Error::type_mismatch("round()", &[other])),
	}
}
