// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	any::Any,
	fmt,
	hash::{Hash, Hasher},
	sync::Arc,
};

use crate::Value;

/// Host object that can flow through expressions without being copied.
pub trait ObjectValue: Any + Send + Sync + fmt::Debug {
	fn type_name(&self) -> &str;

	fn attribute(&self, _name: &str) -> Option<Value> {
		None
	}
}

/// Identity-compared handle to an [`ObjectValue`].
#[derive(Clone)]
pub struct Object(Arc<dyn ObjectValue>);

impl Object {
	pub fn new(value: impl ObjectValue) -> Self {
		Self(Arc::new(value))
	}

	pub fn type_name(&self) -> &str {
		self.0.type_name()
	}

	pub fn attribute(&self, name: &str) -> Option<Value> {
		self.0.attribute(name)
	}

	pub fn downcast_ref<T: ObjectValue>(&self) -> Option<&T> {
		let any: &dyn Any = self.0.as_ref();
		any.downcast_ref::<T>()
	}

	fn addr(&self) -> usize {
		Arc::as_ptr(&self.0) as *const () as usize
	}
}

impl PartialEq for Object {
	fn eq(&self, other: &Self) -> bool {
		self.addr() == other.addr()
	}
}

impl Eq for Object {}

impl Hash for Object {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.addr().hash(state);
	}
}

impl fmt::Debug for Object {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&self.0, f)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Debug)]
	struct Point {
		x: i64,
	}

	impl ObjectValue for Point {
		fn type_name(&self) -> &str {
			"Point"
		}

		fn attribute(&self, name: &str) -> Option<Value> {
			match name {
				"x" => Some(Value::int(self.x)),
				_ => None,
			}
		}
	}

	#[test]
	fn test_identity() {
		let a = Object::new(Point {
			x: 1,
		});
		let b = Object::new(Point {
			x: 1,
		});
		assert_eq!(a, a.clone());
		assert_ne!(a, b);
	}

	#[test]
	fn test_attribute_and_downcast() {
		let p = Object::new(Point {
			x: 7,
		});
		assert_eq!(p.attribute("x"), Some(Value::int(7)));
		assert_eq!(p.attribute("y"), None);
		assert_eq!(p.downcast_ref::<Point>().map(|p| p.x), Some(7));
	}
}
