// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Conduit compiles expression trees over dynamic values into executables.
//!
//! Expressions are built with the functions re-exported from [`expr`]; a
//! subtree cloned into several places is evaluated once per evaluation of its
//! enclosing scope. Aggregations fold their input in a single pass and joins
//! use a hash index whenever the condition has equality keys.
//!
//! ```ignore
//! use conduit::{Compiler, CompilerConfig, Signature, expr::*, reduce};
//!
//! let compiler = Compiler::new(CompilerConfig::default());
//! let totals = group_by([this().item(0)]).aggregate(tuple([this().item(0), reduce::sum(this().item(1))]));
//! let exe = compiler.compile(&totals, &Signature::new())?;
//! ```

pub use conduit_compiler::{
	CompileError, Compiler, CompilerConfig, DebugSink, Executable, FileSink, MemorySink, ParamSpec, Signature,
	ValueIter, compile,
};
pub use conduit_core as core;
pub use conduit_expr as expr;
pub use conduit_expr::reduce;
pub use conduit_type::{Error, ErrorKind, Function, IntoValue, Object, ObjectValue, Params, Result, Value, params};
use tracing_subscriber::EnvFilter;

/// Installs a formatting subscriber filtered by `RUST_LOG`, `info` when unset.
///
/// Does nothing when a global subscriber is already installed.
pub fn init_logging() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.try_init();
}
