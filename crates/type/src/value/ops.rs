// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::cmp::Ordering;

use crate::{Error, Result, Value};

#[derive(Clone, Copy)]
enum Number {
	Int(i64),
	Float(f64),
}

impl Value {
	fn number(&self) -> Option<Number> {
		match self {
			Value::Int(v) => Some(Number::Int(*v)),
			Value::Float(v) => Some(Number::Float(v.value())),
			_ => None,
		}
	}

	fn numeric(&self, other: &Value, operation: &str) -> Result<(Number, Number)> {
		match (self.number(), other.number()) {
			(Some(a), Some(b)) => Ok((a, b)),
			_ => Err(Error::type_mismatch(operation, &[self, other])),
		}
	}

	// ─────────────────────────────────────────────────────────────────────────────
	// Arithmetic
	// ─────────────────────────────────────────────────────────────────────────────

	pub fn add(&self, other: &Value) -> Result<Value> {
		match (self, other) {
			(Value::Utf8(a), Value::Utf8(b)) => Ok(Value::Utf8(format!("{a}{b}"))),
			(Value::List(a), Value::List(b)) => Ok(Value::List(a.iter().chain(b).cloned().collect())),
			(Value::Tuple(a), Value::Tuple(b)) => Ok(Value::Tuple(a.iter().chain(b).cloned().collect())),
			_ => match self.numeric(other, "+")? {
				(Number::Int(a), Number::Int(b)) => a.checked_add(b).map(Value::Int).ok_or_else(|| overflow("+")),
				(a, b) => Ok(Value::float(a.as_f64() + b.as_f64())),
			},
		}
	}

	pub fn sub(&self, other: &Value) -> Result<Value> {
		match self.numeric(other, "-")? {
			(Number::Int(a), Number::Int(b)) => a.checked_sub(b).map(Value::Int).ok_or_else(|| overflow("-")),
			(a, b) => Ok(Value::float(a.as_f64() - b.as_f64())),
		}
	}

	pub fn mul(&self, other: &Value) -> Result<Value> {
		match self.numeric(other, "*")? {
			(Number::Int(a), Number::Int(b)) => a.checked_mul(b).map(Value::Int).ok_or_else(|| overflow("*")),
			(a, b) => Ok(Value::float(a.as_f64() * b.as_f64())),
		}
	}

	/// True division, always producing a float.
	pub fn div(&self, other: &Value) -> Result<Value> {
		let (a, b) = self.numeric(other, "/")?;
		let divisor = b.as_f64();
		if divisor == 0.0 {
			return Err(Error::DivisionByZero);
		}
		Ok(Value::float(a.as_f64() / divisor))
	}

	pub fn floor_div(&self, other: &Value) -> Result<Value> {
		match self.numeric(other, "//")? {
			(Number::Int(_), Number::Int(0)) => Err(Error::DivisionByZero),
			(Number::Int(a), Number::Int(b)) => {
				let q = a.checked_div(b).ok_or_else(|| overflow("//"))?;
				if (a % b != 0) && ((a < 0) != (b < 0)) {
					Ok(Value::Int(q - 1))
				} else {
					Ok(Value::Int(q))
				}
			}
			(a, b) => {
				let divisor = b.as_f64();
				if divisor == 0.0 {
					return Err(Error::DivisionByZero);
				}
				Ok(Value::float((a.as_f64() / divisor).floor()))
			}
		}
	}

	/// Modulo taking the sign of the divisor.
	pub fn rem(&self, other: &Value) -> Result<Value> {
		match self.numeric(other, "%")? {
			(Number::Int(_), Number::Int(0)) => Err(Error::DivisionByZero),
			(Number::Int(a), Number::Int(b)) => {
				let r = a.checked_rem_euclid(b).ok_or_else(|| overflow("%"))?;
				Ok(Value::Int(if b < 0 && r != 0 {
					r + b
				} else {
					r
				}))
			}
			(a, b) => {
				let divisor = b.as_f64();
				if divisor == 0.0 {
					return Err(Error::DivisionByZero);
				}
				let r = a.as_f64() % divisor;
				Ok(Value::float(if r != 0.0 && (r < 0.0) != (divisor < 0.0) {
					r + divisor
				} else {
					r
				}))
			}
		}
	}

	pub fn pow(&self, other: &Value) -> Result<Value> {
		match self.numeric(other, "**")? {
			(Number::Int(a), Number::Int(b)) if b >= 0 => {
				let exp = u32::try_from(b).map_err(|_| overflow("**"))?;
				a.checked_pow(exp).map(Value::Int).ok_or_else(|| overflow("**"))
			}
			(a, b) => Ok(Value::float(a.as_f64().powf(b.as_f64()))),
		}
	}

	pub fn neg(&self) -> Result<Value> {
		match self {
			Value::Int(v) => v.checked_neg().map(Value::Int).ok_or_else(|| overflow("unary -")),
			Value::Float(v) => Ok(Value::float(-v.value())),
			other => Err(Error::type_mismatch("unary -", &[other])),
		}
	}

	// ─────────────────────────────────────────────────────────────────────────────
	// Comparison
	// ─────────────────────────────────────────────────────────────────────────────

	/// Equality with numeric promotion at the top level.
	pub fn equals(&self, other: &Value) -> bool {
		match (self.number(), other.number()) {
			(Some(Number::Int(a)), Some(Number::Int(b))) => a == b,
			(Some(a), Some(b)) => a.as_f64() == b.as_f64(),
			_ => self == other,
		}
	}

	/// Ordering between comparable values.
	pub fn compare(&self, other: &Value) -> Result<Ordering> {
		match (self, other) {
			(Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
			(Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
			(Value::Utf8(a), Value::Utf8(b)) => Ok(a.cmp(b)),
			(Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
				for (x, y) in a.iter().zip(b) {
					match x.compare(y)? {
						Ordering::Equal => continue,
						ordering => return Ok(ordering),
					}
				}
				Ok(a.len().cmp(&b.len()))
			}
			_ => match (self.number(), other.number()) {
				(Some(a), Some(b)) => {
					a.as_f64().partial_cmp(&b.as_f64()).ok_or_else(|| Error::not_comparable(self, other))
				}
				_ => Err(Error::not_comparable(self, other)),
			},
		}
	}

	/// Membership test: `item in self`.
	pub fn contains(&self, item: &Value) -> Result<bool> {
		match self {
			Value::List(items) | Value::Tuple(items) => Ok(items.iter().any(|v| v.equals(item))),
			Value::Set(items) => Ok(items.contains(item) || items.contains(&item.hash_key())),
			Value::Dict(map) => Ok(map.contains_key(item) || map.contains_key(&item.hash_key())),
			Value::Utf8(s) => match item {
				Value::Utf8(needle) => Ok(s.contains(needle.as_str())),
				other => Err(Error::type_mismatch("in", &[other, self])),
			},
			other => Err(Error::not_iterable(other)),
		}
	}

	// ─────────────────────────────────────────────────────────────────────────────
	// Iteration and lookup
	// ─────────────────────────────────────────────────────────────────────────────

	/// Elements produced by iterating the value; dicts yield their keys.
	pub fn elements(&self) -> Result<Vec<Value>> {
		match self {
			Value::List(items) | Value::Tuple(items) => Ok(items.clone()),
			Value::Set(items) => Ok(items.iter().cloned().collect()),
			Value::Dict(map) => Ok(map.keys().cloned().collect()),
			Value::Utf8(s) => Ok(s.chars().map(|c| Value::Utf8(c.to_string())).collect()),
			other => Err(Error::not_iterable(other)),
		}
	}

	pub fn into_elements(self) -> Result<Vec<Value>> {
		match self {
			Value::List(items) | Value::Tuple(items) => Ok(items),
			Value::Set(items) => Ok(items.into_iter().collect()),
			Value::Dict(map) => Ok(map.into_keys().collect()),
			other => other.elements(),
		}
	}

	/// Indexed lookup: `self[key]`.
	pub fn get_item(&self, key: &Value) -> Result<Value> {
		match self {
			Value::Dict(map) => map
				.get(key)
				.or_else(|| map.get(&key.hash_key()))
				.cloned()
				.ok_or_else(|| Error::KeyNotFound {
					key: key.to_string(),
				}),
			Value::List(items) | Value::Tuple(items) => {
				let index = key.as_int().ok_or_else(|| Error::type_mismatch("index", &[self, key]))?;
				resolve_index(index, items.len()).map(|i| items[i].clone())
			}
			Value::Utf8(s) => {
				let index = key.as_int().ok_or_else(|| Error::type_mismatch("index", &[self, key]))?;
				let chars: Vec<char> = s.chars().collect();
				resolve_index(index, chars.len()).map(|i| Value::Utf8(chars[i].to_string()))
			}
			Value::Object(object) => match key {
				Value::Utf8(name) => object.attribute(name).ok_or_else(|| Error::KeyNotFound {
					key: key.to_string(),
				}),
				_ => Err(Error::type_mismatch("index", &[self, key])),
			},
			other => Err(Error::type_mismatch("index", &[other, key])),
		}
	}

	/// Attribute lookup: string-keyed dict entries or object attributes.
	pub fn get_attr(&self, name: &str) -> Result<Value> {
		match self {
			Value::Dict(map) => {
				map.get(&Value::Utf8(name.to_string())).cloned().ok_or_else(|| Error::AttributeNotFound {
					name: name.to_string(),
					type_name: self.type_name().to_string(),
				})
			}
			Value::Object(object) => object.attribute(name).ok_or_else(|| Error::AttributeNotFound {
				name: name.to_string(),
				type_name: object.type_name().to_string(),
			}),
			other => Err(Error::AttributeNotFound {
				name: name.to_string(),
				type_name: other.type_name().to_string(),
			}),
		}
	}
}

impl Number {
	fn as_f64(self) -> f64 {
		match self {
			Number::Int(v) => v as f64,
			Number::Float(v) => v,
		}
	}
}

fn overflow(operation: &str) -> Error {
	Error::Overflow {
		operation: operation.to_string(),
	}
}

fn resolve_index(index: i64, len: usize) -> Result<usize> {
	let resolved = if index < 0 {
		len as i64 + index
	} else {
		index
	};
	if resolved < 0 || resolved >= len as i64 {
		return Err(Error::IndexOutOfRange {
			index,
			len,
		});
	}
	Ok(resolved as usize)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_int_float_promotion() {
		assert_eq!(Value::int(1).add(&Value::float(0.5)).unwrap(), Value::float(1.5));
		assert_eq!(Value::int(7).div(&Value::int(2)).unwrap(), Value::float(3.5));
		assert_eq!(Value::int(7).floor_div(&Value::int(2)).unwrap(), Value::int(3));
		assert_eq!(Value::int(-7).floor_div(&Value::int(2)).unwrap(), Value::int(-4));
	}

	#[test]
	fn test_rem_follows_divisor_sign() {
		assert_eq!(Value::int(-7).rem(&Value::int(3)).unwrap(), Value::int(2));
		assert_eq!(Value::int(7).rem(&Value::int(-3)).unwrap(), Value::int(-2));
		assert_eq!(Value::int(6).rem(&Value::int(3)).unwrap(), Value::int(0));
	}

	#[test]
	fn test_division_by_zero() {
		assert_eq!(Value::int(1).div(&Value::int(0)), Err(Error::DivisionByZero));
		assert_eq!(Value::int(1).floor_div(&Value::int(0)), Err(Error::DivisionByZero));
	}

	#[test]
	fn test_concatenation() {
		assert_eq!(Value::utf8("ab").add(&Value::utf8("c")).unwrap(), Value::utf8("abc"));
		assert_eq!(
			Value::list(vec![Value::int(1)]).add(&Value::list(vec![Value::int(2)])).unwrap(),
			Value::list(vec![Value::int(1), Value::int(2)])
		);
	}

	#[test]
	fn test_type_mismatch() {
		assert!(matches!(Value::int(1).add(&Value::utf8("a")), Err(Error::TypeMismatch { .. })));
		assert!(matches!(Value::Null.add(&Value::int(1)), Err(Error::TypeMismatch { .. })));
	}

	#[test]
	fn test_compare() {
		assert_eq!(Value::int(1).compare(&Value::float(1.5)).unwrap(), Ordering::Less);
		assert_eq!(
			Value::tuple(vec![Value::int(1), Value::int(2)])
				.compare(&Value::tuple(vec![Value::int(1)]))
				.unwrap(),
			Ordering::Greater
		);
		assert!(Value::Null.compare(&Value::int(1)).is_err());
	}

	#[test]
	fn test_equals_promotes_numbers() {
		assert!(Value::int(2).equals(&Value::float(2.0)));
		assert!(!Value::int(2).equals(&Value::utf8("2")));
		assert!(Value::Null.equals(&Value::Null));
	}

	#[test]
	fn test_get_item() {
		let list = Value::list(vec![Value::int(10), Value::int(20)]);
		assert_eq!(list.get_item(&Value::int(-1)).unwrap(), Value::int(20));
		assert!(matches!(list.get_item(&Value::int(5)), Err(Error::IndexOutOfRange { .. })));

		let dict = Value::dict(vec![(Value::utf8("a"), Value::int(1))]);
		assert_eq!(dict.get_item(&Value::utf8("a")).unwrap(), Value::int(1));
		assert!(matches!(dict.get_item(&Value::utf8("b")), Err(Error::KeyNotFound { .. })));
		assert_eq!(dict.get_attr("a").unwrap(), Value::int(1));
	}

	#[test]
	fn test_contains() {
		let list = Value::list(vec![Value::int(1), Value::int(2)]);
		assert!(list.contains(&Value::float(2.0)).unwrap());
		assert!(Value::utf8("hello").contains(&Value::utf8("ell")).unwrap());
		assert!(Value::int(1).contains(&Value::int(1)).is_err());
	}
}
