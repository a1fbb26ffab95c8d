// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	hash::{Hash, Hasher},
	mem,
};

use indexmap::{IndexMap, IndexSet};

use crate::{Function, Object};

mod display;
mod into;
mod json;
mod ops;
mod ordered_f64;

pub use into::IntoValue;
pub use ordered_f64::{NanError, OrderedF64};

/// A dynamically typed value flowing through compiled expressions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
	/// Absence of a value
	Null,
	Bool(bool),
	/// A 64-bit signed integer
	Int(i64),
	/// A non-NaN 64-bit float
	Float(OrderedF64),
	/// A UTF-8 string
	Utf8(String),
	List(Vec<Value>),
	Tuple(Vec<Value>),
	/// Insertion ordered set
	Set(IndexSet<Value>),
	/// Insertion ordered mapping
	Dict(IndexMap<Value, Value>),
	/// External callable used as a value
	Function(Function),
	/// Opaque host object
	Object(Object),
}

impl Value {
	pub fn null() -> Self {
		Value::Null
	}

	pub fn bool(v: impl Into<bool>) -> Self {
		Value::Bool(v.into())
	}

	pub fn int(v: impl Into<i64>) -> Self {
		Value::Int(v.into())
	}

	/// A float value; NaN becomes `Null`.
	pub fn float(v: impl Into<f64>) -> Self {
		OrderedF64::try_from(v.into()).map(Value::Float).unwrap_or(Value::Null)
	}

	pub fn utf8(v: impl Into<String>) -> Self {
		Value::Utf8(v.into())
	}

	pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
		Value::List(items.into_iter().collect())
	}

	pub fn tuple(items: impl IntoIterator<Item = Value>) -> Self {
		Value::Tuple(items.into_iter().collect())
	}

	pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
		Value::Set(items.into_iter().collect())
	}

	pub fn dict(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
		Value::Dict(entries.into_iter().collect())
	}

	pub fn object(value: impl crate::ObjectValue) -> Self {
		Value::Object(Object::new(value))
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	pub fn type_name(&self) -> &'static str {
		match self {
			Value::Null => "null",
			Value::Bool(_) => "bool",
			Value::Int(_) => "int",
			Value::Float(_) => "float",
			Value::Utf8(_) => "str",
			Value::List(_) => "list",
			Value::Tuple(_) => "tuple",
			Value::Set(_) => "set",
			Value::Dict(_) => "dict",
			Value::Function(_) => "function",
			Value::Object(_) => "object",
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::Utf8(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_int(&self) -> Option<i64> {
		match self {
			Value::Int(v) => Some(*v),
			_ => None,
		}
	}

	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Value::Int(v) => Some(*v as f64),
			Value::Float(v) => Some(v.value()),
			_ => None,
		}
	}

	/// Truthiness: null, false, zero and empty containers are falsy.
	pub fn is_truthy(&self) -> bool {
		match self {
			Value::Null => false,
			Value::Bool(v) => *v,
			Value::Int(v) => *v != 0,
			Value::Float(v) => v.value() != 0.0,
			Value::Utf8(v) => !v.is_empty(),
			Value::List(v) | Value::Tuple(v) => !v.is_empty(),
			Value::Set(v) => !v.is_empty(),
			Value::Dict(v) => !v.is_empty(),
			Value::Function(_) | Value::Object(_) => true,
		}
	}

	/// Key used for equality-based grouping and hashing.
	///
	/// Integral floats collapse onto ints so that `1` and `1.0` meet in the
	/// same hash bucket, matching [`Value::equals`].
	pub fn hash_key(&self) -> Value {
		match self {
			Value::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Value::Int(f.value() as i64),
			other => other.clone(),
		}
	}
}

impl Hash for Value {
	fn hash<H: Hasher>(&self, state: &mut H) {
		mem::discriminant(self).hash(state);
		match self {
			Value::Null => {}
			Value::Bool(v) => v.hash(state),
			Value::Int(v) => v.hash(state),
			Value::Float(v) => v.hash(state),
			Value::Utf8(v) => v.hash(state),
			Value::List(v) | Value::Tuple(v) => v.hash(state),
			// equality on these is order-insensitive
			Value::Set(v) => v.len().hash(state),
			Value::Dict(v) => v.len().hash(state),
			Value::Function(v) => v.hash(state),
			Value::Object(v) => v.hash(state),
		}
	}
}

impl Default for Value {
	fn default() -> Self {
		Value::Null
	}
}
