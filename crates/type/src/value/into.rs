// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::{Function, Object, Value};

/// Conversion of native Rust values into [`Value`].
pub trait IntoValue {
	fn into_value(self) -> Value;
}

impl IntoValue for Value {
	fn into_value(self) -> Value {
		self
	}
}

impl IntoValue for &Value {
	fn into_value(self) -> Value {
		self.clone()
	}
}

impl IntoValue for bool {
	fn into_value(self) -> Value {
		Value::Bool(self)
	}
}

macro_rules! impl_into_value_int {
	($($t:ty),*) => {
		$(
			impl IntoValue for $t {
				fn into_value(self) -> Value {
					Value::Int(self as i64)
				}
			}
		)*
	};
}

impl_into_value_int!(i8, i16, i32, i64, u8, u16, u32, usize);

impl IntoValue for f32 {
	fn into_value(self) -> Value {
		Value::float(self as f64)
	}
}

impl IntoValue for f64 {
	fn into_value(self) -> Value {
		Value::float(self)
	}
}

impl IntoValue for &str {
	fn into_value(self) -> Value {
		Value::Utf8(self.to_string())
	}
}

impl IntoValue for String {
	fn into_value(self) -> Value {
		Value::Utf8(self)
	}
}

impl IntoValue for Function {
	fn into_value(self) -> Value {
		Value::Function(self)
	}
}

impl IntoValue for Object {
	fn into_value(self) -> Value {
		Value::Object(self)
	}
}

impl<T: IntoValue> IntoValue for Option<T> {
	fn into_value(self) -> Value {
		match self {
			Some(v) => v.into_value(),
			None => Value::Null,
		}
	}
}

impl<T: IntoValue> IntoValue for Vec<T> {
	fn into_value(self) -> Value {
		Value::List(self.into_iter().map(IntoValue::into_value).collect())
	}
}

impl<A: IntoValue, B: IntoValue> IntoValue for (A, B) {
	fn into_value(self) -> Value {
		Value::Tuple(vec![self.0.into_value(), self.1.into_value()])
	}
}

impl<A: IntoValue, B: IntoValue, C: IntoValue> IntoValue for (A, B, C) {
	fn into_value(self) -> Value {
		Value::Tuple(vec![self.0.into_value(), self.1.into_value(), self.2.into_value()])
	}
}

impl IntoValue for serde_json::Value {
	fn into_value(self) -> Value {
		Value::from(self)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_scalars() {
		assert_eq!(42i32.into_value(), Value::Int(42));
		assert_eq!(true.into_value(), Value::Bool(true));
		assert_eq!("x".into_value(), Value::utf8("x"));
		assert_eq!(None::<i64>.into_value(), Value::Null);
	}

	#[test]
	fn test_collections() {
		assert_eq!(
			vec![("a", 1), ("b", 2)].into_value(),
			Value::list(vec![
				Value::tuple(vec![Value::utf8("a"), Value::int(1)]),
				Value::tuple(vec![Value::utf8("b"), Value::int(2)]),
			])
		);
	}
}
