// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Synthesis of a lowered [`Program`] into nested closures.
//!
//! Every operation becomes a [`CompiledExpr`] that captures its static parts
//! (constants, operators, child closures) and only receives the current input
//! and the per-call [`Frame`] at evaluation time.

mod aggregate;
mod join;

use std::{collections::HashMap, sync::Arc};

use conduit_expr::{BinaryOp, CollectionKind, ComprehensionKind, UnaryOp};
use conduit_type::{Error, Result, Value};
use indexmap::{IndexMap, IndexSet};

pub(crate) use self::join::{CompiledJoin, JoinState};
use self::{aggregate::CompiledAggregate, join::CompiledSide};
use crate::{
	builtin,
	frame::Frame,
	program::{Binding, JoinOp, JoinSideOp, LoopOp, Op, Program, Scope, SortOp, Step, TryOp},
};

type EvalFn = dyn Fn(&Value, &mut Frame) -> Result<Value> + Send + Sync;

/// A synthesized evaluation closure.
#[derive(Clone)]
pub(crate) struct CompiledExpr(Arc<EvalFn>);

impl CompiledExpr {
	pub fn new(f: impl Fn(&Value, &mut Frame) -> Result<Value> + Send + Sync + 'static) -> Self {
		Self(Arc::new(f))
	}

	pub fn eval(&self, input: &Value, frame: &mut Frame) -> Result<Value> {
		(self.0)(input, frame)
	}
}

/// Entry point of an executable.
pub(crate) enum Root {
	Value(CompiledExpr),
	/// Top-level iterator comprehension, consumed lazily
	Loop(Arc<CompiledLoop>),
	/// Top-level join, consumed lazily
	Join(Arc<CompiledJoin>),
}

pub(crate) fn synthesize(program: &Program) -> Root {
	let mut synth = Synthesizer::default();
	synth.compile_scope(&program.scope);
	match &program.body {
		Op::Loop(op) if op.kind == ComprehensionKind::Iter => Root::Loop(Arc::new(synth.compile_loop_parts(op))),
		Op::Join(op) => Root::Join(Arc::new(synth.compile_join_parts(op))),
		body => Root::Value(synth.compile(body)),
	}
}

#[derive(Default)]
struct Synthesizer {
	/// Definitions of lazy bindings, by slot
	memos: HashMap<usize, CompiledExpr>,
}

impl Synthesizer {
	/// Registers the scope's lazy bindings; returns the slots to forget on entry.
	fn compile_scope(&mut self, scope: &Scope) -> Vec<usize> {
		for memo in &scope.memos {
			let def = self.compile(&memo.op);
			self.memos.insert(memo.binding.slot, def);
		}
		scope.resets()
	}

	fn compile(&mut self, op: &Op) -> CompiledExpr {
		match op {
			Op::Input => CompiledExpr::new(|input, _| Ok(input.clone())),
			Op::Const {
				value,
				..
			} => {
				let value = value.clone();
				CompiledExpr::new(move |_, _| Ok(value.clone()))
			}
			Op::Param {
				index,
				..
			} => {
				let index = *index;
				CompiledExpr::new(move |_, frame| Ok(frame.param(index).clone()))
			}
			Op::Access {
				source,
				steps,
				default,
			} => self.compile_access(source, steps, default.as_deref()),
			Op::Call {
				function,
				args,
				..
			} => {
				let function = function.clone();
				let args = self.compile_all(args);
				CompiledExpr::new(move |input, frame| {
					let values = eval_all(&args, input, frame)?;
					function.call(&values)
				})
			}
			Op::Builtin {
				op,
				args,
			} => {
				let op = *op;
				let args = self.compile_all(args);
				CompiledExpr::new(move |input, frame| {
					let values = eval_all(&args, input, frame)?;
					builtin::apply(op, &values)
				})
			}
			Op::Binary {
				op,
				left,
				right,
			} => self.compile_binary(*op, left, right),
			Op::Unary {
				op,
				operand,
			} => self.compile_unary(*op, operand),
			Op::And(items) => {
				let items = self.compile_all(items);
				CompiledExpr::new(move |input, frame| {
					let mut last = Value::Bool(true);
					for item in &items {
						last = item.eval(input, frame)?;
						if !last.is_truthy() {
							break;
						}
					}
					Ok(last)
				})
			}
			Op::Or(items) => {
				let items = self.compile_all(items);
				CompiledExpr::new(move |input, frame| {
					let mut last = Value::Bool(false);
					for item in &items {
						last = item.eval(input, frame)?;
						if last.is_truthy() {
							break;
						}
					}
					Ok(last)
				})
			}
			Op::Collection {
				kind,
				items,
			} => {
				let kind = *kind;
				let items = self.compile_all(items);
				CompiledExpr::new(move |input, frame| {
					let values = eval_all(&items, input, frame)?;
					Ok(match kind {
						CollectionKind::List => Value::List(values),
						CollectionKind::Tuple => Value::Tuple(values),
						CollectionKind::Set => Value::Set(values.into_iter().collect()),
					})
				})
			}
			Op::Dict(pairs) => {
				let pairs: Vec<(CompiledExpr, CompiledExpr)> =
					pairs.iter().map(|(k, v)| (self.compile(k), self.compile(v))).collect();
				CompiledExpr::new(move |input, frame| {
					let mut map = IndexMap::with_capacity(pairs.len());
					for (key, value) in &pairs {
						let key = key.eval(input, frame)?;
						let value = value.eval(input, frame)?;
						map.insert(key, value);
					}
					Ok(Value::Dict(map))
				})
			}
			Op::Loop(op) => {
				let looped = self.compile_loop_parts(op);
				CompiledExpr::new(move |input, frame| looped.collect(input, frame))
			}
			Op::Sort(op) => self.compile_sort(op),
			Op::Try(op) => self.compile_try(op),
			Op::Caught(binding) => {
				let slot = binding.slot;
				CompiledExpr::new(move |_, frame| Ok(frame.slot(slot).cloned().unwrap_or(Value::Null)))
			}
			Op::Cond {
				condition,
				then,
				otherwise,
			} => {
				let condition = self.compile(condition);
				let then = self.compile(then);
				let otherwise = self.compile(otherwise);
				CompiledExpr::new(move |input, frame| {
					if condition.eval(input, frame)?.is_truthy() {
						then.eval(input, frame)
					} else {
						otherwise.eval(input, frame)
					}
				})
			}
			Op::Pipe {
				producer,
				consumer,
			} => {
				let producer = self.compile(producer);
				let consumer = self.compile(consumer);
				CompiledExpr::new(move |input, frame| {
					let produced = producer.eval(input, frame)?;
					consumer.eval(&produced, frame)
				})
			}
			Op::Memo(binding) => self.compile_memo(binding),
			Op::SetLabel {
				label,
				value,
			} => {
				let slot = label.slot;
				let value = self.compile(value);
				CompiledExpr::new(move |input, frame| {
					let value = value.eval(input, frame)?;
					frame.set_slot(slot, value.clone());
					Ok(value)
				})
			}
			Op::GetLabel(binding) | Op::Register(binding) => {
				let Binding {
					slot,
					name,
				} = binding.clone();
				CompiledExpr::new(move |_, frame| frame.label(slot, &name))
			}
			Op::Aggregate(op) => {
				let aggregate = CompiledAggregate::compile(self, op);
				CompiledExpr::new(move |input, frame| aggregate.run(input, frame))
			}
			Op::Join(op) => {
				let join = self.compile_join_parts(op);
				CompiledExpr::new(move |input, frame| join.collect(input, frame))
			}
			Op::GroupKey {
				group,
				index,
			} => {
				let (group, index) = (*group, *index);
				CompiledExpr::new(move |_, frame| {
					frame.group(group).map(|view| view.key[index].clone()).ok_or_else(no_group)
				})
			}
			Op::SlotValue {
				group,
				index,
				default,
			} => {
				let (group, index) = (*group, *index);
				let default = self.compile(default);
				CompiledExpr::new(move |input, frame| {
					let view = frame.group(group).ok_or_else(no_group)?;
					match &view.values[index] {
						Some(value) => Ok(value.clone()),
						None => default.eval(input, frame),
					}
				})
			}
		}
	}

	fn compile_all(&mut self, ops: &[Op]) -> Vec<CompiledExpr> {
		ops.iter().map(|op| self.compile(op)).collect()
	}

	fn compile_memo(&self, binding: &Binding) -> CompiledExpr {
		let def = self.memos.get(&binding.slot).cloned();
		let Binding {
			slot,
			name,
		} = binding.clone();
		CompiledExpr::new(move |input, frame| {
			if let Some(value) = frame.slot(slot) {
				return Ok(value.clone());
			}
			let def = def.as_ref().ok_or_else(|| Error::UnboundLabel {
				name: name.clone(),
			})?;
			let value = def.eval(input, frame)?;
			frame.set_slot(slot, value.clone());
			Ok(value)
		})
	}

	fn compile_access(&mut self, source: &Op, steps: &[Step], default: Option<&Op>) -> CompiledExpr {
		enum CompiledStep {
			Key(CompiledExpr),
			Attr(String),
		}

		let source = self.compile(source);
		let steps: Vec<CompiledStep> = steps
			.iter()
			.map(|step| match step {
				Step::Key(key) => CompiledStep::Key(self.compile(key)),
				Step::Attr(name) => CompiledStep::Attr(name.clone()),
			})
			.collect();
		let default = default.map(|d| self.compile(d));

		CompiledExpr::new(move |input, frame| {
			let mut value = source.eval(input, frame)?;
			for step in &steps {
				let next = match step {
					CompiledStep::Key(key) => {
						let key = key.eval(input, frame)?;
						value.get_item(&key)
					}
					CompiledStep::Attr(name) => value.get_attr(name),
				};
				value = match (next, &default) {
					(Ok(next), _) => next,
					(Err(e), Some(default)) if is_missing(&e, &value) => return default.eval(input, frame),
					(Err(e), _) => return Err(e),
				};
			}
			Ok(value)
		})
	}

	fn compile_binary(&mut self, op: BinaryOp, left: &Op, right: &Op) -> CompiledExpr {
		let left = self.compile(left);
		let right = self.compile(right);
		CompiledExpr::new(move |input, frame| {
			let l = left.eval(input, frame)?;
			let r = right.eval(input, frame)?;
			eval_binary(op, &l, &r)
		})
	}

	fn compile_unary(&mut self, op: UnaryOp, operand: &Op) -> CompiledExpr {
		let operand = self.compile(operand);
		CompiledExpr::new(move |input, frame| {
			let value = operand.eval(input, frame)?;
			match op {
				UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
				UnaryOp::Neg => value.neg(),
				UnaryOp::IsNull => Ok(Value::Bool(value.is_null())),
				UnaryOp::IsNotNull => Ok(Value::Bool(!value.is_null())),
			}
		})
	}

	fn compile_loop_parts(&mut self, op: &LoopOp) -> CompiledLoop {
		let source = self.compile(&op.source);
		let resets = self.compile_scope(&op.scope);
		CompiledLoop {
			kind: op.kind,
			source,
			resets,
			filter: op.filter.as_ref().map(|f| self.compile(f)),
			key: op.key.as_ref().map(|k| self.compile(k)),
			element: self.compile(&op.element),
		}
	}

	fn compile_sort(&mut self, op: &SortOp) -> CompiledExpr {
		let source = self.compile(&op.source);
		let resets = self.compile_scope(&op.scope);
		let keys: Vec<CompiledExpr> = op.keys.iter().map(|k| self.compile(&k.op)).collect();
		let orders: Vec<_> = op.keys.iter().map(|k| k.order).collect();
		let reverse = op.reverse;
		CompiledExpr::new(move |input, frame| {
			let mut items = source.eval(input, frame)?.into_elements()?;
			if keys.is_empty() {
				builtin::sort_values(&mut items, reverse)?;
				return Ok(Value::List(items));
			}
			let mut computed = Vec::with_capacity(items.len());
			for item in &items {
				frame.reset(&resets);
				computed.push(keys.iter().map(|key| key.eval(item, frame)).collect::<Result<Vec<_>>>()?);
			}
			builtin::sort_by_keys(items, computed, &orders, reverse).map(Value::List)
		})
	}

	fn compile_try(&mut self, op: &TryOp) -> CompiledExpr {
		struct CompiledHandler {
			kinds: Vec<conduit_type::ErrorKind>,
			value: CompiledExpr,
			reraise_if: Option<CompiledExpr>,
		}

		let body = self.compile(&op.body);
		let handlers: Vec<CompiledHandler> = op
			.handlers
			.iter()
			.map(|h| CompiledHandler {
				kinds: h.kinds.clone(),
				value: self.compile(&h.value),
				reraise_if: h.reraise_if.as_ref().map(|r| self.compile(r)),
			})
			.collect();
		let slot = op.caught.slot;
		CompiledExpr::new(move |input, frame| {
			let err = match body.eval(input, frame) {
				Ok(value) => return Ok(value),
				Err(err) => err,
			};
			let kind = err.kind();
			let Some(handler) = handlers.iter().find(|h| h.kinds.is_empty() || h.kinds.contains(&kind)) else {
				return Err(err);
			};
			frame.set_slot(slot, Value::Utf8(err.to_string()));
			if let Some(reraise_if) = &handler.reraise_if {
				if reraise_if.eval(input, frame)?.is_truthy() {
					return Err(err);
				}
			}
			handler.value.eval(input, frame)
		})
	}

	fn compile_join_parts(&mut self, op: &JoinOp) -> CompiledJoin {
		let left = self.compile(&op.left);
		let right = self.compile(&op.right);
		let pre_filter = op.pre_filter.as_ref().map(|f| self.compile(f));
		let left_side = self.compile_join_side(&op.left_side);
		let right_side = self.compile_join_side(&op.right_side);
		let pair_resets = self.compile_scope(&op.pair_scope);
		let residual = op.residual.as_ref().map(|r| self.compile(r));
		CompiledJoin::new(
			op.how,
			left,
			right,
			(op.left_row.slot, op.right_row.slot),
			pre_filter,
			(left_side, right_side),
			pair_resets,
			residual,
		)
	}

	fn compile_join_side(&mut self, side: &JoinSideOp) -> CompiledSide {
		let resets = self.compile_scope(&side.scope);
		CompiledSide {
			resets,
			keys: self.compile_all(&side.keys),
			filter: side.filter.as_ref().map(|f| self.compile(f)),
		}
	}
}

/// A comprehension: source, per-item scope, filter and element.
pub(crate) struct CompiledLoop {
	kind: ComprehensionKind,
	source: CompiledExpr,
	resets: Vec<usize>,
	filter: Option<CompiledExpr>,
	key: Option<CompiledExpr>,
	element: CompiledExpr,
}

impl CompiledLoop {
	pub fn items(&self, input: &Value, frame: &mut Frame) -> Result<Vec<Value>> {
		self.source.eval(input, frame)?.into_elements()
	}

	/// Evaluates the body for one item, `None` when the filter rejects it.
	pub fn step(&self, item: &Value, frame: &mut Frame) -> Result<Option<(Option<Value>, Value)>> {
		frame.reset(&self.resets);
		if let Some(filter) = &self.filter {
			if !filter.eval(item, frame)?.is_truthy() {
				return Ok(None);
			}
		}
		let key = match &self.key {
			Some(key) => Some(key.eval(item, frame)?),
			None => None,
		};
		let element = self.element.eval(item, frame)?;
		Ok(Some((key, element)))
	}

	pub fn collect(&self, input: &Value, frame: &mut Frame) -> Result<Value> {
		let items = self.items(input, frame)?;
		match self.kind {
			ComprehensionKind::Dict => {
				let mut map = IndexMap::new();
				for item in &items {
					if let Some((key, value)) = self.step(item, frame)? {
						map.insert(key.unwrap_or(Value::Null), value);
					}
				}
				Ok(Value::Dict(map))
			}
			kind => {
				let mut out = Vec::with_capacity(items.len());
				for item in &items {
					if let Some((_, value)) = self.step(item, frame)? {
						out.push(value);
					}
				}
				Ok(match kind {
					ComprehensionKind::Tuple => Value::Tuple(out),
					ComprehensionKind::Set => Value::Set(out.into_iter().collect::<IndexSet<_>>()),
					_ => Value::List(out),
				})
			}
		}
	}
}

fn eval_all(items: &[CompiledExpr], input: &Value, frame: &mut Frame) -> Result<Vec<Value>> {
	items.iter().map(|item| item.eval(input, frame)).collect()
}

pub(crate) fn eval_binary(op: BinaryOp, l: &Value, r: &Value) -> Result<Value> {
	use std::cmp::Ordering::{Equal, Greater, Less};

	match op {
		BinaryOp::Add => l.add(r),
		BinaryOp::Sub => l.sub(r),
		BinaryOp::Mul => l.mul(r),
		BinaryOp::Div => l.div(r),
		BinaryOp::FloorDiv => l.floor_div(r),
		BinaryOp::Mod => l.rem(r),
		BinaryOp::Pow => l.pow(r),
		BinaryOp::Eq => Ok(Value::Bool(l.equals(r))),
		BinaryOp::NotEq => Ok(Value::Bool(!l.equals(r))),
		BinaryOp::Lt => Ok(Value::Bool(l.compare(r)? == Less)),
		BinaryOp::LtE => Ok(Value::Bool(l.compare(r)? != Greater)),
		BinaryOp::Gt => Ok(Value::Bool(l.compare(r)? == Greater)),
		BinaryOp::GtE => Ok(Value::Bool(matches!(l.compare(r)?, Greater | Equal))),
		BinaryOp::In => Ok(Value::Bool(r.contains(l)?)),
		BinaryOp::NotIn => Ok(Value::Bool(!r.contains(l)?)),
	}
}

/// Lookup failures that an access default absorbs.
fn is_missing(error: &Error, container: &Value) -> bool {
	container.is_null()
		|| matches!(
			error,
			Error::KeyNotFound { .. } | Error::IndexOutOfRange { .. } | Error::AttributeNotFound { .. }
		)
}

fn no_group() -> Error {
	Error::invalid_argument("aggregate", "group state read outside of its aggregate")
}

#[cfg(test)]
mod tests {
	use conduit_expr::{Expr, cond, naive, param, this, tuple, weights};
	use conduit_type::Function;

	use super::*;
	use crate::{lower::lower, signature::Signature};

	fn eval(expr: &Expr, input: Value, params: Vec<Value>) -> Result<Value> {
		let program = lower(expr, &Signature::new(), weights::binding_threshold(), "test".to_string()).unwrap();
		let mut frame = Frame::new(program.layout, params);
		match synthesize(&program) {
			Root::Value(root) => root.eval(&input, &mut frame),
			Root::Loop(looped) => looped.collect(&input, &mut frame),
			Root::Join(join) => join.collect(&input, &mut frame),
		}
	}

	fn row() -> Value {
		Value::from(serde_json::json!({"a": 2, "b": [10, 20, 30], "name": "x"}))
	}

	#[test]
	fn test_access_and_arithmetic() {
		let expr = this().item("a") * this().item("b").item(-1);
		assert_eq!(eval(&expr, row(), vec![]).unwrap(), Value::int(60));
	}

	#[test]
	fn test_access_default_absorbs_missing_steps() {
		let expr = this().item("missing").item_or("deeper", naive(7));
		assert!(eval(&expr, row(), vec![]).is_err());

		let expr = this().item_or("missing", naive(7));
		assert_eq!(eval(&expr, row(), vec![]).unwrap(), Value::int(7));

		let expr = this().item("b").item_or(9, naive(0));
		assert_eq!(eval(&expr, row(), vec![]).unwrap(), Value::int(0));
	}

	#[test]
	fn test_short_circuit_returns_deciding_operand() {
		let expr = conduit_expr::and([this().item("a"), naive(0), this().item("missing")]);
		assert_eq!(eval(&expr, row(), vec![]).unwrap(), Value::int(0));

		let expr = conduit_expr::or([naive(0), this().item("name")]);
		assert_eq!(eval(&expr, row(), vec![]).unwrap(), Value::utf8("x"));
	}

	#[test]
	fn test_conditional_and_params() {
		let expr = cond(param("flag"), naive("yes"), naive("no"));
		assert_eq!(eval(&expr, Value::Null, vec![Value::Bool(false)]).unwrap(), Value::utf8("no"));
	}

	#[test]
	fn test_comprehension_with_filter() {
		let expr = this().item("b").filter(this().gt(naive(10))).list_comp(this() + naive(1));
		assert_eq!(eval(&expr, row(), vec![]).unwrap(), Value::list(vec![Value::int(21), Value::int(31)]));
	}

	#[test]
	fn test_sort_with_key() {
		let input = Value::from(serde_json::json!([{"k": 3}, {"k": 1}, {"k": 2}]));
		let expr = this().sort(Some(this().item("k")), true).list_comp(this().item("k"));
		assert_eq!(eval(&expr, input, vec![]).unwrap(), Value::list(vec![Value::int(3), Value::int(2), Value::int(1)]));
	}

	#[test]
	fn test_hoisted_binding_is_lazy() {
		let f = Function::new("boom", |_| Err(Error::function("boom", "called")));
		let shared = conduit_expr::call(&f, [this()]);
		let expr = cond(naive(false), tuple([shared.clone(), shared]), naive("skipped"));
		assert_eq!(eval(&expr, Value::Null, vec![]).unwrap(), Value::utf8("skipped"));
	}

	#[test]
	fn test_labels() {
		let expr = tuple([this().item("a").label_as("a"), conduit_expr::label("a") * naive(2)]);
		assert_eq!(eval(&expr, row(), vec![]).unwrap(), Value::tuple(vec![Value::int(2), Value::int(4)]));
	}
}
