// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::path::PathBuf;

use conduit_expr::weights;
use serde::{Deserialize, Serialize};

const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// Compiler settings, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
	/// Persist the lowered program of an executable on its first failure
	pub debug: bool,
	/// Number of executables kept; 0 disables caching
	pub cache_capacity: usize,
	/// Cost of binding a value once, compared against duplicated evaluation
	pub inline_threshold: f64,
	/// Directory for the default file sink when `debug` is set
	pub debug_dir: Option<PathBuf>,
}

impl Default for CompilerConfig {
	fn default() -> Self {
		Self {
			debug: false,
			cache_capacity: DEFAULT_CACHE_CAPACITY,
			inline_threshold: weights::binding_threshold(),
			debug_dir: None,
		}
	}
}

impl CompilerConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_json(json: &str) -> serde_json::Result<Self> {
		serde_json::from_str(json)
	}

	pub fn debug(mut self, debug: bool) -> Self {
		self.debug = debug;
		self
	}

	pub fn cache_capacity(mut self, capacity: usize) -> Self {
		self.cache_capacity = capacity;
		self
	}

	pub fn inline_threshold(mut self, threshold: f64) -> Self {
		self.inline_threshold = threshold;
		self
	}

	pub fn debug_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.debug_dir = Some(dir.into());
		self
	}
}
