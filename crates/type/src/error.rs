// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::Value;

/// Errors raised while evaluating a compiled expression.
///
/// These propagate unmodified out of `Executable::call`; errors returned by
/// external callables are passed through as-is.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
	#[error("key {key} not found")]
	KeyNotFound {
		key: String,
	},

	#[error("index {index} out of range for length {len}")]
	IndexOutOfRange {
		index: i64,
		len: usize,
	},

	#[error("{type_name} has no attribute '{name}'")]
	AttributeNotFound {
		name: String,
		type_name: String,
	},

	#[error("unsupported operand type(s) for {operation}: {types}")]
	TypeMismatch {
		operation: String,
		types: String,
	},

	#[error("'{left}' and '{right}' are not comparable")]
	NotComparable {
		left: String,
		right: String,
	},

	#[error("division by zero")]
	DivisionByZero,

	#[error("integer overflow in {operation}")]
	Overflow {
		operation: String,
	},

	#[error("'{type_name}' is not iterable")]
	NotIterable {
		type_name: String,
	},

	#[error("missing required parameter '{name}'")]
	MissingParameter {
		name: String,
	},

	#[error("unknown parameter '{name}'")]
	UnknownParameter {
		name: String,
	},

	#[error("label '{name}' read before it was set")]
	UnboundLabel {
		name: String,
	},

	#[error("invalid argument for {function}: {message}")]
	InvalidArgument {
		function: String,
		message: String,
	},

	#[error("{name}: {message}")]
	Function {
		name: String,
		message: String,
	},
}

/// Fieldless classification of [`Error`], used to select which errors a
/// `try_` handler catches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
	KeyNotFound,
	IndexOutOfRange,
	AttributeNotFound,
	TypeMismatch,
	NotComparable,
	DivisionByZero,
	Overflow,
	NotIterable,
	MissingParameter,
	UnknownParameter,
	UnboundLabel,
	InvalidArgument,
	Function,
}

impl ErrorKind {
	/// No kinds; a handler given none catches every error.
	pub const ANY: [ErrorKind; 0] = [];

	/// Failed lookups of a key, index or attribute.
	pub const LOOKUP: [ErrorKind; 3] =
		[ErrorKind::KeyNotFound, ErrorKind::IndexOutOfRange, ErrorKind::AttributeNotFound];

	/// Failed arithmetic.
	pub const ARITHMETIC: [ErrorKind; 2] = [ErrorKind::DivisionByZero, ErrorKind::Overflow];
}

impl Error {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Error::KeyNotFound {
				..
			} => ErrorKind::KeyNotFound,
			Error::IndexOutOfRange {
				..
			} => ErrorKind::IndexOutOfRange,
			Error::AttributeNotFound {
				..
			} => ErrorKind::AttributeNotFound,
			Error::TypeMismatch {
				..
			} => ErrorKind::TypeMismatch,
			Error::NotComparable {
				..
			} => ErrorKind::NotComparable,
			Error::DivisionByZero => ErrorKind::DivisionByZero,
			Error::Overflow {
				..
			} => ErrorKind::Overflow,
			Error::NotIterable {
				..
			} => ErrorKind::NotIterable,
			Error::MissingParameter {
				..
			} => ErrorKind::MissingParameter,
			Error::UnknownParameter {
				..
			} => ErrorKind::UnknownParameter,
			Error::UnboundLabel {
				..
			} => ErrorKind::UnboundLabel,
			Error::InvalidArgument {
				..
			} => ErrorKind::InvalidArgument,
			Error::Function {
				..
			} => ErrorKind::Function,
		}
	}

	pub fn type_mismatch(operation: impl Into<String>, operands: &[&Value]) -> Self {
		let types = operands.iter().map(|v| format!("'{}'", v.type_name())).collect::<Vec<_>>().join(" and ");
		Error::TypeMismatch {
			operation: operation.into(),
			types,
		}
	}

	pub fn not_comparable(left: &Value, right: &Value) -> Self {
		Error::NotComparable {
			left: left.type_name().to_string(),
			right: right.type_name().to_string(),
		}
	}

	pub fn not_iterable(value: &Value) -> Self {
		Error::NotIterable {
			type_name: value.type_name().to_string(),
		}
	}

	pub fn invalid_argument(function: impl Into<String>, message: impl Into<String>) -> Self {
		Error::InvalidArgument {
			function: function.into(),
			message: message.into(),
		}
	}

	/// Error raised from inside an external callable.
	pub fn function(name: impl Into<String>, message: impl Into<String>) -> Self {
		Error::Function {
			name: name.into(),
			message: message.into(),
		}
	}
}
