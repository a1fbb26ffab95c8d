// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{collections::HashMap, sync::Arc};

use conduit_core::{
	hash::{Hash128, hash128_of},
	util::lru::LruCache,
};
use conduit_expr::Expr;
use tracing::{debug, instrument};

use crate::{
	CompileError,
	config::CompilerConfig,
	debug::{DebugSink, FileSink},
	executable::Executable,
	lower::lower,
	signature::Signature,
};

/// Compiles expressions into [`Executable`]s, caching them by shape.
///
/// Two expressions share a cache entry when they are structurally equal, reuse
/// their subtrees the same way and are compiled against the same signature
/// and settings. Cloning is cheap; clones share the cache.
#[derive(Clone)]
pub struct Compiler {
	inner: Arc<CompilerInner>,
}

struct CompilerInner {
	config: CompilerConfig,
	sink: Option<Arc<dyn DebugSink>>,
	cache: Option<LruCache<Hash128, Executable>>,
}

impl Compiler {
	/// In debug mode with a `debug_dir`, failed executables are written
	/// there; without one, the rendering is only exposed through
	/// [`Executable::debug_rendering`].
	pub fn new(config: CompilerConfig) -> Self {
		let sink = match (&config.debug, &config.debug_dir) {
			(true, Some(dir)) => Some(Arc::new(FileSink::new(dir.clone())) as Arc<dyn DebugSink>),
			_ => None,
		};
		Self::build(config, sink)
	}

	/// Uses `sink` for failed executables; implies debug mode.
	pub fn with_sink(config: CompilerConfig, sink: Arc<dyn DebugSink>) -> Self {
		Self::build(config.debug(true), Some(sink))
	}

	fn build(config: CompilerConfig, sink: Option<Arc<dyn DebugSink>>) -> Self {
		let cache = (config.cache_capacity > 0).then(|| LruCache::new(config.cache_capacity));
		Self {
			inner: Arc::new(CompilerInner {
				config,
				sink,
				cache,
			}),
		}
	}

	pub fn config(&self) -> &CompilerConfig {
		&self.inner.config
	}

	#[instrument(name = "compiler::compile", level = "debug", skip_all)]
	pub fn compile(&self, expr: &Expr, signature: &Signature) -> Result<Executable, CompileError> {
		signature.validate()?;

		let key = self.cache_key(expr, signature);
		if let Some(cache) = &self.inner.cache
			&& let Some(executable) = cache.get(&key)
		{
			debug!(name = executable.name(), "cache hit");
			return Ok(executable);
		}

		let name = format!("conduit_{:016x}", (key.0 >> 64) as u64);
		debug!(%name, "cache miss");
		let program = lower(expr, signature, self.inner.config.inline_threshold, name)?;
		let debug = self.inner.config.debug;
		let sink = if debug {
			self.inner.sink.clone()
		} else {
			None
		};
		let executable = Executable::new(&program, debug, sink);

		if let Some(cache) = &self.inner.cache {
			cache.put(key, executable.clone());
		}
		Ok(executable)
	}

	pub fn clear_cache(&self) {
		if let Some(cache) = &self.inner.cache {
			cache.clear();
		}
	}

	pub fn cache_len(&self) -> usize {
		self.inner.cache.as_ref().map_or(0, |cache| cache.len())
	}

	fn cache_key(&self, expr: &Expr, signature: &Signature) -> Hash128 {
		let config = &self.inner.config;
		hash128_of(&(expr, sharing_pattern(expr), signature, config.inline_threshold.to_bits(), config.debug))
	}
}

impl Default for Compiler {
	fn default() -> Self {
		Self::new(CompilerConfig::default())
	}
}

/// Pre-order walk numbering physical nodes by first visit. A repeated node
/// contributes its earlier number and is not descended into, so structurally
/// equal trees with different reuse produce different patterns.
fn sharing_pattern(root: &Expr) -> Vec<usize> {
	let mut numbers: HashMap<usize, usize> = HashMap::new();
	let mut pattern = Vec::new();
	let mut stack = vec![root];
	while let Some(expr) = stack.pop() {
		let next = numbers.len();
		match numbers.get(&expr.id()) {
			Some(&number) => pattern.push(number),
			None => {
				numbers.insert(expr.id(), next);
				pattern.push(next);
				stack.extend(expr.node().children().into_iter().rev());
			}
		}
	}
	pattern
}
