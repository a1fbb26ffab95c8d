// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt,
	hash::{Hash, Hasher},
	sync::Arc,
};

use crate::{Result, Value};

pub type NativeFn = dyn Fn(&[Value]) -> Result<Value> + Send + Sync;

/// An external callable referenced from an expression.
///
/// Two `Function`s are equal only if they are the same registration, so
/// cloning a handle keeps identity while wrapping the same closure twice does
/// not. Functions are treated as side-effecting unless created with
/// [`Function::pure`].
#[derive(Clone)]
pub struct Function {
	inner: Arc<FunctionInner>,
}

struct FunctionInner {
	name: String,
	pure: bool,
	func: Box<NativeFn>,
}

impl Function {
	pub fn new<F>(name: impl Into<String>, func: F) -> Self
	where
		F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
	{
		Self {
			inner: Arc::new(FunctionInner {
				name: name.into(),
				pure: false,
				func: Box::new(func),
			}),
		}
	}

	/// A callable without side effects; repeated uses may be merged.
	pub fn pure<F>(name: impl Into<String>, func: F) -> Self
	where
		F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
	{
		Self {
			inner: Arc::new(FunctionInner {
				name: name.into(),
				pure: true,
				func: Box::new(func),
			}),
		}
	}

	pub fn name(&self) -> &str {
		&self.inner.name
	}

	pub fn is_pure(&self) -> bool {
		self.inner.pure
	}

	#[inline]
	pub fn call(&self, args: &[Value]) -> Result<Value> {
		(self.inner.func)(args)
	}

	/// Address of the registration, stable for the lifetime of any clone.
	pub fn id(&self) -> usize {
		Arc::as_ptr(&self.inner) as usize
	}
}

impl PartialEq for Function {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}
}

impl Eq for Function {}

impl Hash for Function {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id().hash(state);
	}
}

impl fmt::Debug for Function {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Function({})", self.inner.name)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_identity_equality() {
		let a = Function::new("f", |_| Ok(Value::Null));
		let b = Function::new("f", |_| Ok(Value::Null));
		assert_eq!(a, a.clone());
		assert_ne!(a, b);
	}

	#[test]
	fn test_call() {
		let double = Function::pure("double", |args| args[0].mul(&Value::int(2)));
		assert!(double.is_pure());
		assert_eq!(double.call(&[Value::int(21)]).unwrap(), Value::int(42));
	}
}
