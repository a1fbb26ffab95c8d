// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use serde_json::{Map, Number};

use crate::Value;

impl From<serde_json::Value> for Value {
	fn from(json: serde_json::Value) -> Self {
		match json {
			serde_json::Value::Null => Value::Null,
			serde_json::Value::Bool(v) => Value::Bool(v),
			serde_json::Value::Number(n) => match n.as_i64() {
				Some(i) => Value::Int(i),
				None => n.as_f64().map(Value::float).unwrap_or(Value::Null),
			},
			serde_json::Value::String(s) => Value::Utf8(s),
			serde_json::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
			serde_json::Value::Object(map) => {
				Value::Dict(map.into_iter().map(|(k, v)| (Value::Utf8(k), Value::from(v))).collect())
			}
		}
	}
}

impl Value {
	/// Lossy conversion to JSON: tuples and sets become arrays, dict keys are
	/// stringified and opaque values render as strings.
	pub fn to_json(&self) -> serde_json::Value {
		match self {
			Value::Null => serde_json::Value::Null,
			Value::Bool(v) => serde_json::Value::Bool(*v),
			Value::Int(v) => serde_json::Value::Number((*v).into()),
			Value::Float(v) => Number::from_f64(v.value()).map(serde_json::Value::Number).unwrap_or_default(),
			Value::Utf8(s) => serde_json::Value::String(s.clone()),
			Value::List(items) | Value::Tuple(items) => {
				serde_json::Value::Array(items.iter().map(Value::to_json).collect())
			}
			Value::Set(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
			Value::Dict(map) => {
				let mut out = Map::with_capacity(map.len());
				for (k, v) in map {
					out.insert(k.to_string(), v.to_json());
				}
				serde_json::Value::Object(out)
			}
			Value::Function(_) | Value::Object(_) => serde_json::Value::String(self.to_string()),
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn test_from_json() {
		let value = Value::from(json!({"id": 1, "tags": ["a"], "score": 0.5, "missing": null}));
		assert_eq!(value.get_attr("id").unwrap(), Value::int(1));
		assert_eq!(value.get_attr("tags").unwrap(), Value::list(vec![Value::utf8("a")]));
		assert_eq!(value.get_attr("score").unwrap(), Value::float(0.5));
		assert_eq!(value.get_attr("missing").unwrap(), Value::Null);
	}

	#[test]
	fn test_to_json() {
		let value = Value::tuple(vec![Value::utf8("2019-01-01"), Value::int(25)]);
		assert_eq!(value.to_json(), json!(["2019-01-01", 25]));
	}
}
