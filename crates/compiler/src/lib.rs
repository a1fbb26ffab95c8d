// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Compiler from conduit expression trees to reusable executables.
//!
//! Compilation happens in three steps:
//! - lowering resolves labels, group-by keys and join plans, and hoists
//!   repeated subtrees into lazily evaluated bindings
//! - synthesis turns the lowered program into nested closures
//! - the resulting [`Executable`] is cached by expression shape
//!
//! ```ignore
//! use conduit_compiler::{Signature, compile};
//! use conduit_expr::{param, this};
//!
//! let exe = compile(&(this().item("price") * param("qty")), &Signature::new().param("qty"))?;
//! let total = exe.call(row, vec![Value::int(3)])?;
//! ```

mod builtin;
mod compiler;
mod config;
mod context;
mod debug;
mod error;
mod executable;
mod frame;
mod lower;
mod program;
mod reduce;
mod render;
mod signature;
mod synth;

pub use compiler::Compiler;
pub use config::CompilerConfig;
use conduit_expr::Expr;
pub use debug::{DebugSink, FileSink, MemorySink};
pub use error::CompileError;
pub use executable::{Executable, ValueIter};
use once_cell::sync::Lazy;
pub use signature::{ParamSpec, Signature};

pub type Result<T> = std::result::Result<T, CompileError>;

static DEFAULT_COMPILER: Lazy<Compiler> = Lazy::new(Compiler::default);

/// Compiles with a process-wide compiler using the default configuration.
pub fn compile(expr: &Expr, signature: &Signature) -> Result<Executable> {
	DEFAULT_COMPILER.compile(expr, signature)
}
