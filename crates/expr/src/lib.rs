// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Expression IR for conduit.
//!
//! Expressions are immutable trees of [`Node`]s behind cheap-clone [`Expr`]
//! handles. Cloning a handle and using it in several places expresses "the
//! same subtree referenced N times"; the compiler evaluates such a subtree
//! once per logical use.

pub mod analysis;
mod builder;
mod node;
mod op;
pub mod reduce;
mod reducer;
pub mod weights;

pub use analysis::{Analysis, Analyzer, Sides, reference_counts};
pub use builder::*;
pub use node::{Expr, Handler, Node, NullOrder, PathStep, SortKey};
pub use op::{BinaryOp, Builtin, CollectionKind, ComprehensionKind, JoinHow, JoinSide, UnaryOp};
pub use reducer::{Interpolation, Reducer, ReducerKind};
