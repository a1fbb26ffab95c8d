// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{self, Display, Formatter};

use crate::Value;

impl Display for Value {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Value::Utf8(s) => f.write_str(s),
			other => write_repr(other, f),
		}
	}
}

impl Value {
	/// Representation with strings quoted, as used inside containers.
	pub fn repr(&self) -> String {
		Repr(self).to_string()
	}
}

struct Repr<'a>(&'a Value);

impl Display for Repr<'_> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write_repr(self.0, f)
	}
}

fn write_repr(value: &Value, f: &mut Formatter<'_>) -> fmt::Result {
	match value {
		Value::Null => f.write_str("null"),
		Value::Bool(v) => write!(f, "{v}"),
		Value::Int(v) => write!(f, "{v}"),
		Value::Float(v) => write!(f, "{v}"),
		Value::Utf8(s) => write!(f, "{s:?}"),
		Value::List(items) => {
			f.write_str("[")?;
			write_items(items.iter(), f)?;
			f.write_str("]")
		}
		Value::Tuple(items) => {
			f.write_str("(")?;
			write_items(items.iter(), f)?;
			if items.len() == 1 {
				f.write_str(",")?;
			}
			f.write_str(")")
		}
		Value::Set(items) => {
			f.write_str("{")?;
			write_items(items.iter(), f)?;
			f.write_str("}")
		}
		Value::Dict(map) => {
			f.write_str("{")?;
			for (i, (k, v)) in map.iter().enumerate() {
				if i > 0 {
					f.write_str(", ")?;
				}
				write!(f, "{}: {}", Repr(k), Repr(v))?;
			}
			f.write_str("}")
		}
		Value::Function(func) => write!(f, "<function {}>", func.name()),
		Value::Object(object) => write!(f, "<{}>", object.type_name()),
	}
}

fn write_items<'a>(items: impl Iterator<Item = &'a Value>, f: &mut Formatter<'_>) -> fmt::Result {
	for (i, item) in items.enumerate() {
		if i > 0 {
			f.write_str(", ")?;
		}
		write_repr(item, f)?;
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_display() {
		assert_eq!(Value::utf8("plain").to_string(), "plain");
		assert_eq!(Value::utf8("quoted").repr(), "\"quoted\"");
		assert_eq!(Value::tuple(vec![Value::int(1)]).to_string(), "(1,)");
		assert_eq!(
			Value::dict(vec![(Value::utf8("a"), Value::list(vec![Value::float(1.0), Value::Null]))]).to_string(),
			"{\"a\": [1.0, null]}"
		);
	}
}
