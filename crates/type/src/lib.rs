// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Runtime value model for conduit.
//!
//! Expressions built with `conduit-expr` are evaluated over [`Value`]s. External
//! callables are wrapped in [`Function`] and opaque host objects in [`Object`];
//! both compare by identity so that the compiler can treat them as registered
//! constants.

pub mod error;
mod function;
mod object;
mod params;
pub mod value;

pub use error::{Error, ErrorKind};
pub use function::{Function, NativeFn};
pub use object::{Object, ObjectValue};
pub use params::Params;
pub use value::{IntoValue, OrderedF64, Value};

pub type Result<T> = std::result::Result<T, Error>;
