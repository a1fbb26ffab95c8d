// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::HashSet;

use conduit_type::{Error, IntoValue, Params, Result, Value};

use crate::CompileError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamSpec {
	pub name: String,
	pub default: Option<Value>,
}

impl ParamSpec {
	pub fn is_required(&self) -> bool {
		self.default.is_none()
	}
}

/// Declared call-time parameters of an executable, in positional order.
///
/// Parameters referenced by an expression but not declared here are appended
/// as required parameters when the expression is compiled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Signature {
	params: Vec<ParamSpec>,
}

impl Signature {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn param(mut self, name: impl Into<String>) -> Self {
		self.params.push(ParamSpec {
			name: name.into(),
			default: None,
		});
		self
	}

	pub fn param_with_default(mut self, name: impl Into<String>, default: impl IntoValue) -> Self {
		self.params.push(ParamSpec {
			name: name.into(),
			default: Some(default.into_value()),
		});
		self
	}

	pub fn params(&self) -> &[ParamSpec] {
		&self.params
	}

	pub fn index_of(&self, name: &str) -> Option<usize> {
		self.params.iter().position(|p| p.name == name)
	}

	pub(crate) fn from_params(params: Vec<ParamSpec>) -> Self {
		Self {
			params,
		}
	}

	pub(crate) fn push_required(&mut self, name: &str) -> usize {
		self.params.push(ParamSpec {
			name: name.to_string(),
			default: None,
		});
		self.params.len() - 1
	}

	pub fn validate(&self) -> std::result::Result<(), CompileError> {
		let mut seen = HashSet::new();
		let mut defaulted = false;
		for param in &self.params {
			if !is_identifier(&param.name) {
				return Err(malformed(format!("'{}' is not a valid parameter name", param.name)));
			}
			if !seen.insert(param.name.as_str()) {
				return Err(malformed(format!("parameter '{}' is declared twice", param.name)));
			}
			match (&param.default, defaulted) {
				(Some(_), _) => defaulted = true,
				(None, true) => {
					return Err(malformed(format!(
						"required parameter '{}' follows a parameter with a default",
						param.name
					)));
				}
				(None, false) => {}
			}
		}
		Ok(())
	}

	/// Resolves call-time parameters into one value per declared parameter.
	pub fn bind(&self, params: Params) -> Result<Vec<Value>> {
		let mut bound: Vec<Option<Value>> = vec![None; self.params.len()];
		match params {
			Params::None => {}
			Params::Positional(values) => {
				if values.len() > self.params.len() {
					return Err(Error::UnknownParameter {
						name: format!("#{}", self.params.len()),
					});
				}
				for (slot, value) in bound.iter_mut().zip(values) {
					*slot = Some(value);
				}
			}
			Params::Named(map) => {
				for (name, value) in map {
					let index = self.index_of(&name).ok_or_else(|| Error::UnknownParameter {
						name: name.clone(),
					})?;
					bound[index] = Some(value);
				}
			}
		}

		bound.into_iter()
			.zip(&self.params)
			.map(|(value, spec)| match value {
				Some(value) => Ok(value),
				None => spec.default.clone().ok_or_else(|| Error::MissingParameter {
					name: spec.name.clone(),
				}),
			})
			.collect()
	}
}

fn malformed(reason: String) -> CompileError {
	CompileError::MalformedSignature {
		reason,
	}
}

fn is_identifier(name: &str) -> bool {
	let mut chars = name.chars();
	match chars.next() {
		Some(c) if c == '_' || c.is_ascii_alphabetic() => chars.all(|c| c == '_' || c.is_ascii_alphanumeric()),
		_ => false,
	}
}

#[cfg(test)]
mod tests {
	use conduit_type::params;

	use super::*;

	fn signature() -> Signature {
		Signature::new().param("threshold").param_with_default("limit", 10)
	}

	#[test]
	fn test_validate() {
		assert!(signature().validate().is_ok());
		assert!(matches!(
			Signature::new().param("a").param("a").validate(),
			Err(CompileError::MalformedSignature { .. })
		));
		assert!(matches!(
			Signature::new().param("1st").validate(),
			Err(CompileError::MalformedSignature { .. })
		));
		assert!(matches!(
			Signature::new().param_with_default("a", 1).param("b").validate(),
			Err(CompileError::MalformedSignature { .. })
		));
	}

	#[test]
	fn test_bind_named_with_default() {
		let bound = signature().bind(params! { threshold: 3 }).unwrap();
		assert_eq!(bound, vec![Value::int(3), Value::int(10)]);
	}

	#[test]
	fn test_bind_positional() {
		let bound = signature().bind(params![1, 2]).unwrap();
		assert_eq!(bound, vec![Value::int(1), Value::int(2)]);
	}

	#[test]
	fn test_bind_errors() {
		assert_eq!(
			signature().bind(Params::None),
			Err(Error::MissingParameter {
				name: "threshold".to_string()
			})
		);
		assert_eq!(
			signature().bind(params! { threshold: 1, other: 2 }),
			Err(Error::UnknownParameter {
				name: "other".to_string()
			})
		);
		assert!(matches!(signature().bind(params![1, 2, 3]), Err(Error::UnknownParameter { .. })));
	}
}
