// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Relative evaluation costs, in units where a plain step costs 100.

pub const STEP: u64 = 100;
pub const LOGICAL: u64 = 97;
pub const DICT_LOOKUP: u64 = 139;
pub const ATTR_LOOKUP: u64 = 132;
pub const MATH_SIMPLE: u64 = 165;
pub const TUPLE_INIT: u64 = 246;
pub const LIST_INIT: u64 = 310;
pub const SET_INIT: u64 = 573;
pub const DICT_INIT: u64 = 742;
pub const FUNCTION_CALL: u64 = 358;
pub const UNPREDICTABLE: u64 = 74200;

/// Overhead of binding a value to a name and reading it back.
pub fn binding_threshold() -> f64 {
	FUNCTION_CALL as f64 * 1.33
}

/// Whether re-evaluating a subtree of `weight` for every one of `uses` is
/// cheaper than binding it once.
pub fn is_simple_for_n_uses(weight: u64, uses: usize, threshold: f64) -> bool {
	if uses <= 1 {
		return true;
	}
	(weight as f64) * ((uses - 1) as f64) < threshold
}
