// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

/// Errors detected while compiling, before any row is processed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
	#[error("label '{name}' is read before it is set on every path")]
	UnresolvedLabel {
		name: String,
	},

	#[error("aggregate output uses the row outside of a group-by key: {expression}")]
	MissingGroupByField {
		expression: String,
	},

	#[error("aggregate output expression matches {matches} group-by keys")]
	AmbiguousGroupByField {
		matches: usize,
	},

	#[error("reducer {reducer} is nested inside another reducer")]
	NestedReducer {
		reducer: String,
	},

	#[error("reducer {reducer} is used outside of an aggregate output")]
	ReducerOutsideAggregate {
		reducer: String,
	},

	#[error("reducer {reducer} input must not set labels")]
	LabelInReducer {
		reducer: String,
	},

	#[error("invalid reducer {reducer}: {reason}")]
	InvalidReducer {
		reducer: String,
		reason: String,
	},

	#[error("join row referenced outside of a join condition")]
	JoinRowOutsideJoin,

	#[error("caught error referenced outside of an except handler")]
	CaughtOutsideHandler,

	#[error("malformed signature: {reason}")]
	MalformedSignature {
		reason: String,
	},
}
