// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt,
	sync::{
		Arc,
		atomic::{AtomicBool, Ordering},
	},
	vec,
};

use conduit_type::{Error, IntoValue, Params, Result, Value};
use tracing::{debug, warn};

use crate::{
	debug::DebugSink,
	frame::{Frame, FrameLayout},
	program::Program,
	render::render,
	signature::{ParamSpec, Signature},
	synth::{CompiledJoin, CompiledLoop, JoinState, Root, synthesize},
};

/// A compiled expression, callable any number of times from any thread.
///
/// Cloning is cheap; clones share the compiled closures and the debug state.
#[derive(Clone)]
pub struct Executable {
	inner: Arc<Inner>,
}

struct Inner {
	name: String,
	signature: Signature,
	root: Root,
	layout: FrameLayout,
	rendering: String,
	debug: bool,
	sink: Option<Arc<dyn DebugSink>>,
	/// Set once the rendering has been handed to the sink
	reported: AtomicBool,
}

impl Executable {
	pub(crate) fn new(program: &Program, debug: bool, sink: Option<Arc<dyn DebugSink>>) -> Self {
		Self {
			inner: Arc::new(Inner {
				name: program.name.clone(),
				signature: Signature::from_params(program.params.clone()),
				root: synthesize(program),
				layout: program.layout,
				rendering: render(program),
				debug,
				sink,
				reported: AtomicBool::new(false),
			}),
		}
	}

	pub fn name(&self) -> &str {
		&self.inner.name
	}

	/// Parameters accepted by [`call`](Self::call), including the ones the
	/// expression referenced without declaring them.
	pub fn params(&self) -> &[ParamSpec] {
		self.inner.signature.params()
	}

	/// Readable rendering of the lowered program.
	pub fn render(&self) -> &str {
		&self.inner.rendering
	}

	/// The rendering, if the executable was compiled in debug mode.
	pub fn debug_rendering(&self) -> Option<&str> {
		self.inner.debug.then_some(self.inner.rendering.as_str())
	}

	/// Evaluates the expression against `input`.
	///
	/// A top-level iterator comprehension or join is materialized into a list;
	/// use [`iter`](Self::iter) to consume it lazily.
	pub fn call(&self, input: impl IntoValue, params: impl Into<Params>) -> Result<Value> {
		let input = input.into_value();
		let result = self.frame(params.into()).and_then(|mut frame| match &self.inner.root {
			Root::Value(root) => root.eval(&input, &mut frame),
			Root::Loop(looped) => looped.collect(&input, &mut frame),
			Root::Join(join) => join.collect(&input, &mut frame),
		});
		if let Err(err) = &result {
			self.report(err);
		}
		result
	}

	/// Evaluates the expression and iterates over its result.
	///
	/// Top-level iterator comprehensions and joins yield items as they are
	/// produced; any other result is materialized and iterated.
	pub fn iter(&self, input: impl IntoValue, params: impl Into<Params>) -> Result<ValueIter> {
		let input = input.into_value();
		let result = self.start(input, params.into());
		if let Err(err) = &result {
			self.report(err);
		}
		result
	}

	fn start(&self, input: Value, params: Params) -> Result<ValueIter> {
		let mut frame = self.frame(params)?;
		let state = match &self.inner.root {
			Root::Value(root) => IterState::Values(root.eval(&input, &mut frame)?.into_elements()?.into_iter()),
			Root::Loop(looped) => IterState::Loop {
				looped: looped.clone(),
				items: looped.items(&input, &mut frame)?.into_iter(),
				frame,
			},
			Root::Join(join) => IterState::Join {
				join: join.clone(),
				state: join.start(&input, &mut frame)?,
				frame,
				input,
			},
		};
		Ok(ValueIter {
			executable: self.clone(),
			state,
		})
	}

	fn frame(&self, params: Params) -> Result<Frame> {
		let params = self.inner.signature.bind(params)?;
		Ok(Frame::new(self.inner.layout, params))
	}

	/// Hands the rendering to the debug sink the first time a call fails.
	fn report(&self, err: &Error) {
		let Some(sink) = &self.inner.sink else {
			return;
		};
		if self.inner.reported.swap(true, Ordering::AcqRel) {
			return;
		}
		debug!(name = %self.inner.name, error = %err, "persisting debug rendering");
		if let Err(io) = sink.persist(&self.inner.name, &self.inner.rendering) {
			warn!(name = %self.inner.name, error = %io, "failed to persist debug rendering");
		}
	}
}

impl fmt::Debug for Executable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Executable").field("name", &self.inner.name).field("params", &self.params()).finish()
	}
}

/// Iterator returned by [`Executable::iter`].
///
/// Yields `Err` at most once; iteration ends after an error.
pub struct ValueIter {
	executable: Executable,
	state: IterState,
}

enum IterState {
	Values(vec::IntoIter<Value>),
	Loop {
		looped: Arc<CompiledLoop>,
		items: vec::IntoIter<Value>,
		frame: Frame,
	},
	Join {
		join: Arc<CompiledJoin>,
		state: JoinState,
		frame: Frame,
		input: Value,
	},
	Done,
}

impl IterState {
	fn next(&mut self) -> Option<Result<Value>> {
		match self {
			IterState::Values(values) => values.next().map(Ok),
			IterState::Loop {
				looped,
				items,
				frame,
			} => {
				for item in items.by_ref() {
					match looped.step(&item, frame) {
						Ok(Some((_, value))) => return Some(Ok(value)),
						Ok(None) => continue,
						Err(err) => return Some(Err(err)),
					}
				}
				None
			}
			IterState::Join {
				join,
				state,
				frame,
				input,
			} => join.next(state, input, frame),
			IterState::Done => None,
		}
	}
}

impl Iterator for ValueIter {
	type Item = Result<Value>;

	fn next(&mut self) -> Option<Self::Item> {
		match self.state.next() {
			Some(Err(err)) => {
				self.executable.report(&err);
				self.state = IterState::Done;
				Some(Err(err))
			}
			Some(Ok(value)) => Some(Ok(value)),
			None => {
				self.state = IterState::Done;
				None
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use conduit_expr::{Expr, naive, param, this, weights};
	use conduit_type::Function;

	use super::*;
	use crate::{debug::MemorySink, lower::lower};

	fn executable(expr: &Expr, signature: &Signature, sink: Option<Arc<dyn DebugSink>>) -> Executable {
		let program = lower(expr, signature, weights::binding_threshold(), "conduit_test".to_string()).unwrap();
		Executable::new(&program, sink.is_some(), sink)
	}

	#[test]
	fn test_call_binds_params() {
		let signature = Signature::new().param("factor").param_with_default("offset", 1);
		let exe = executable(&(this() * param("factor") + param("offset")), &signature, None);
		assert_eq!(exe.call(3, vec![Value::int(2)]).unwrap(), Value::int(7));
		assert_eq!(exe.call(3, vec![Value::int(2), Value::int(0)]).unwrap(), Value::int(6));
		assert!(matches!(exe.call(3, ()), Err(Error::MissingParameter { .. })));
	}

	#[test]
	fn test_iter_streams_top_level_comprehension() {
		let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
		let record = seen.clone();
		let f = Function::new("record", move |args| {
			record.lock().push(args[0].clone());
			Ok(args[0].clone())
		});
		let exe = executable(&this().iter(conduit_expr::call(&f, [this()])), &Signature::new(), None);

		let mut iter = exe.iter(Value::list(vec![Value::int(1), Value::int(2), Value::int(3)]), ()).unwrap();
		assert_eq!(iter.next().unwrap().unwrap(), Value::int(1));
		assert_eq!(seen.lock().len(), 1);
		assert_eq!(iter.collect::<Result<Vec<_>>>().unwrap(), vec![Value::int(2), Value::int(3)]);
	}

	#[test]
	fn test_first_failure_is_reported_once() {
		let sink = Arc::new(MemorySink::new());
		let exe = executable(&(this() / naive(0)), &Signature::new(), Some(sink.clone()));
		assert!(exe.debug_rendering().is_some());
		assert!(exe.call(1, ()).is_err());
		assert!(exe.call(2, ()).is_err());
		let entries = sink.entries();
		assert_eq!(entries.len(), 1);
		assert_eq!(entries[0].0, "conduit_test");
		assert_eq!(entries[0].1, exe.render());
	}

	#[test]
	fn test_no_rendering_without_debug() {
		let exe = executable(&this(), &Signature::new(), None);
		assert!(exe.debug_rendering().is_none());
		assert!(exe.render().starts_with("def conduit_test(input):"));
	}
}
