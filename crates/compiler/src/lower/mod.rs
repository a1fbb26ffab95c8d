// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Lowering from the expression tree to a [`Program`].
//!
//! Lowering runs twice over the same tree. The counting pass walks the tree
//! the way the emitting pass will and records how often every subtree occurs
//! per input context; a repeated occurrence is not descended into. The
//! emitting pass then builds the program, hoisting a repeated subtree into a
//! lazy binding of the enclosing scope when it has side effects or when
//! evaluating it at every occurrence costs more than binding it once.
//!
//! An input context identifies the value `Input` refers to. It changes when
//! lowering enters a comprehension body, a sort key, an aggregate or join
//! scope, or the consumer of a pipe, so equal subtrees evaluated against
//! different inputs are never merged.

mod aggregate;
mod join;

use std::{
	collections::{BTreeSet, HashMap},
	rc::Rc,
	sync::Arc,
};

use conduit_core::hash::hash128_of;
use conduit_expr::{Analysis, Analyzer, Expr, Handler, Node, PathStep, weights};
use tracing::{debug, instrument, trace};

use crate::{
	CompileError,
	context::CodeGenContext,
	program::{Binding, HandlerOp, KeyOrder, LoopOp, Memo, Op, Program, Scope, SortKeyOp, SortOp, Step, TryOp},
	signature::Signature,
};

pub(crate) type Result<T> = std::result::Result<T, CompileError>;

const INPUT_NAME: &str = "input";

/// Lowers `root` into a program named `name`.
#[instrument(name = "compiler::lower", level = "debug", skip_all, fields(name = %name))]
pub(crate) fn lower(root: &Expr, signature: &Signature, threshold: f64, name: String) -> Result<Program> {
	let mut analyzer = Analyzer::new();

	let counts = {
		let mut counter = Lowerer::new(Pass::Count, &mut analyzer, HashMap::new(), signature.clone(), threshold);
		counter.lower_root(root)?;
		counter.counts
	};

	let mut emitter = Lowerer::new(Pass::Emit, &mut analyzer, counts, signature.clone(), threshold);
	let (scope, body) = emitter.lower_root(root)?;
	debug!(hoisted = emitter.hoisted, constants = emitter.cx.constants.len(), "lowered");

	let layout = emitter.cx.layout();
	let cx = emitter.cx;
	Ok(Program {
		name,
		params: cx.signature.params().to_vec(),
		input: INPUT_NAME.to_string(),
		constants: cx.constants.into_entries(),
		scope,
		body,
		layout,
	})
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
	Count,
	Emit,
}

/// How a subtree is recognised as a repeat of another.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum NodeKey {
	/// Side-effecting or label-reading: only the same physical node
	Identity(usize),
	/// Pure: any structurally equal node
	Shape(Expr),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct CseKey {
	ctx: u128,
	node: NodeKey,
}

/// What `Input` lowers to in the current context.
#[derive(Debug, Clone)]
enum InputBinding {
	Arg,
	/// Consumer of an inlined pipe: the producer, re-evaluated per use
	Inline(Rc<Op>),
	/// Aggregate output, where rows are no longer available
	Forbidden,
}

#[derive(Debug)]
struct AggregateEnv {
	group: usize,
	keys: Vec<Expr>,
	output_ctx: u128,
	slots: Vec<conduit_expr::Reducer>,
}

#[derive(Debug, Clone)]
struct JoinEnv {
	left: Binding,
	right: Binding,
}

#[derive(Debug, Clone)]
struct Env {
	ctx: u128,
	input: InputBinding,
	/// Whether repeated subtrees may be bound in this context
	memo: bool,
	/// Labels definitely set at this point
	assigned: BTreeSet<String>,
	aggregate: Option<Rc<AggregateEnv>>,
	join: Option<JoinEnv>,
	/// Error slot of the innermost enclosing handler
	caught: Option<Binding>,
}

struct MemoInfo {
	binding: Binding,
	reads: BTreeSet<String>,
	writes: BTreeSet<String>,
}

#[derive(Default)]
struct ScopeBuilder {
	memos: Vec<Memo>,
	bound: HashMap<CseKey, MemoInfo>,
}

impl ScopeBuilder {
	fn finish(self) -> Scope {
		Scope {
			memos: self.memos,
		}
	}
}

pub(crate) struct Lowerer<'a> {
	pass: Pass,
	analyzer: &'a mut Analyzer,
	counts: HashMap<CseKey, usize>,
	threshold: f64,
	cx: CodeGenContext,
	scope: ScopeBuilder,
	outer_scopes: Vec<ScopeBuilder>,
	env: Env,
	hoisted: usize,
}

impl<'a> Lowerer<'a> {
	fn new(
		pass: Pass,
		analyzer: &'a mut Analyzer,
		counts: HashMap<CseKey, usize>,
		signature: Signature,
		threshold: f64,
	) -> Self {
		Self {
			pass,
			analyzer,
			counts,
			threshold,
			cx: CodeGenContext::new(signature),
			scope: ScopeBuilder::default(),
			outer_scopes: Vec::new(),
			env: Env {
				ctx: 0,
				input: InputBinding::Arg,
				memo: true,
				assigned: BTreeSet::new(),
				aggregate: None,
				join: None,
				caught: None,
			},
			hoisted: 0,
		}
	}

	fn lower_root(&mut self, root: &Expr) -> Result<(Scope, Op)> {
		let body = self.lower(root)?;
		let scope = std::mem::take(&mut self.scope);
		Ok((scope.finish(), body))
	}

	// ─────────────────────────────────────────────────────────────────────────────
	// Common subexpressions
	// ─────────────────────────────────────────────────────────────────────────────

	pub(crate) fn lower(&mut self, expr: &Expr) -> Result<Op> {
		if let Some(op) = self.match_group_key(expr)? {
			return Ok(op);
		}

		let analysis = self.analyzer.analyze(expr);
		let key = CseKey {
			ctx: self.env.ctx,
			node: node_key(expr, &analysis),
		};

		if self.pass == Pass::Count {
			let count = self.counts.entry(key).or_insert(0);
			*count += 1;
			if *count > 1 {
				return Ok(Op::Input);
			}
			return self.lower_node(expr);
		}

		let count = self.counts.get(&key).copied().unwrap_or(0);
		if !self.hoistable(expr, &analysis, count) {
			return self.lower_node(expr);
		}

		if let Some(info) = self.scope.bound.get(&key) {
			if let Some(name) = info.reads.difference(&self.env.assigned).next() {
				return Err(CompileError::UnresolvedLabel {
					name: name.clone(),
				});
			}
			let writes = info.writes.clone();
			let binding = info.binding.clone();
			self.env.assigned.extend(writes);
			return Ok(Op::Memo(binding));
		}

		let before = self.env.assigned.clone();
		let op = self.lower_node(expr)?;
		let writes = self.env.assigned.difference(&before).cloned().collect();
		let binding = self.cx.alloc_slot("v");
		trace!(
			name = %binding.name,
			kind = expr.node().kind_name(),
			count,
			weight = analysis.weight,
			side_effects = analysis.has_side_effects(),
			"hoisted"
		);
		self.hoisted += 1;

		let scope = &mut self.scope;
		scope.memos.push(Memo {
			binding: binding.clone(),
			op,
		});
		scope.bound.insert(
			key,
			MemoInfo {
				binding: binding.clone(),
				reads: analysis.labels_read.clone(),
				writes,
			},
		);
		Ok(Op::Memo(binding))
	}

	fn hoistable(&self, expr: &Expr, analysis: &Analysis, count: usize) -> bool {
		if count < 2 {
			return false;
		}
		match expr.node() {
			Node::Input
			| Node::Constant(_)
			| Node::Parameter(_)
			| Node::LabelRef(_)
			| Node::JoinRow(_)
			| Node::Caught
			| Node::Reducer(_) => return false,
			_ => {}
		}
		// the caught error differs between handlers sharing a scope
		if analysis.reads_caught {
			return false;
		}
		if analysis.has_side_effects() {
			return true;
		}
		if !self.env.memo || analysis.reads_labels() {
			return false;
		}
		!weights::is_simple_for_n_uses(analysis.weight, count, self.threshold)
	}

	/// Context for a child scope or pipe consumer of `expr`.
	fn derive_ctx(&mut self, expr: &Expr, tag: &'static str) -> u128 {
		let analysis = self.analyzer.analyze(expr);
		hash128_of(&(self.env.ctx, node_key(expr, &analysis), tag)).into()
	}

	/// Lowers `f` in a fresh scope reading `input` in context `ctx`. Labels
	/// set inside do not escape.
	fn in_scope<R>(
		&mut self,
		ctx: u128,
		input: InputBinding,
		f: impl FnOnce(&mut Self) -> Result<R>,
	) -> Result<(Scope, R)> {
		let saved = self.env.clone();
		self.env.ctx = ctx;
		self.env.input = input;
		self.env.memo = true;
		let outer = std::mem::take(&mut self.scope);
		self.outer_scopes.push(outer);
		let result = f(self);
		let outer = self.outer_scopes.pop().unwrap_or_default();
		let scope = std::mem::replace(&mut self.scope, outer).finish();
		self.env = saved;
		Ok((scope, result?))
	}

	/// Lowers `expr` without letting its label writes escape.
	fn lower_contained(&mut self, expr: &Expr) -> Result<Op> {
		let saved = self.env.assigned.clone();
		let op = self.lower(expr);
		self.env.assigned = saved;
		op
	}

	// ─────────────────────────────────────────────────────────────────────────────
	// Nodes
	// ─────────────────────────────────────────────────────────────────────────────

	fn lower_node(&mut self, expr: &Expr) -> Result<Op> {
		match expr.node() {
			Node::Input => self.lower_input(expr),
			Node::Constant(value) => Ok(Op::Const {
				name: self.cx.constant(value),
				value: value.clone(),
			}),
			Node::Parameter(name) => Ok(Op::Param {
				index: self.cx.param(name),
				name: name.clone(),
			}),
			Node::Access {
				source,
				path,
				default,
			} => {
				let source = Box::new(self.lower(source)?);
				let steps = path
					.iter()
					.map(|step| {
						Ok(match step {
							PathStep::Key(key) => Step::Key(self.lower(key)?),
							PathStep::Attr(name) => Step::Attr(name.clone()),
						})
					})
					.collect::<Result<Vec<_>>>()?;
				let default = match default {
					Some(default) => Some(Box::new(self.lower_contained(default)?)),
					None => None,
				};
				Ok(Op::Access {
					source,
					steps,
					default,
				})
			}
			Node::Call {
				function,
				args,
			} => Ok(Op::Call {
				name: self.cx.constant(&conduit_type::Value::Function(function.clone())),
				function: function.clone(),
				args: self.lower_all(args)?,
			}),
			Node::Builtin {
				op,
				args,
			} => Ok(Op::Builtin {
				op: *op,
				args: self.lower_all(args)?,
			}),
			Node::Binary {
				op,
				left,
				right,
			} => Ok(Op::Binary {
				op: *op,
				left: Box::new(self.lower(left)?),
				right: Box::new(self.lower(right)?),
			}),
			Node::Unary {
				op,
				operand,
			} => Ok(Op::Unary {
				op: *op,
				operand: Box::new(self.lower(operand)?),
			}),
			Node::And(items) => Ok(Op::And(self.lower_short_circuit(items)?)),
			Node::Or(items) => Ok(Op::Or(self.lower_short_circuit(items)?)),
			Node::Collection {
				kind,
				items,
			} => Ok(Op::Collection {
				kind: *kind,
				items: self.lower_all(items)?,
			}),
			Node::Dict(pairs) => {
				let mut out = Vec::with_capacity(pairs.len());
				for (key, value) in pairs {
					let key = self.lower(key)?;
					let value = self.lower(value)?;
					out.push((key, value));
				}
				Ok(Op::Dict(out))
			}
			Node::Comprehension {
				kind,
				key,
				element,
				source,
				filter,
			} => {
				let source = self.lower(source)?;
				let ctx = self.derive_ctx(expr, "loop");
				let var = self.cx.names.fresh("item");
				let (scope, (filter, key, element)) = self.in_scope(ctx, InputBinding::Arg, |this| {
					let filter = filter.as_ref().map(|f| this.lower(f)).transpose()?;
					let key = key.as_ref().map(|k| this.lower(k)).transpose()?;
					let element = this.lower(element)?;
					Ok((filter, key, element))
				})?;
				Ok(Op::Loop(Box::new(LoopOp {
					kind: *kind,
					var,
					source,
					scope,
					filter,
					key,
					element,
				})))
			}
			Node::Sort {
				source,
				keys,
				reverse,
			} => {
				let source = self.lower(source)?;
				let ctx = self.derive_ctx(expr, "sort");
				let var = self.cx.names.fresh("item");
				let (scope, keys) = self.in_scope(ctx, InputBinding::Arg, |this| {
					keys.iter()
						.map(|key| {
							Ok(SortKeyOp {
								op: this.lower(&key.expr)?,
								order: KeyOrder {
									descending: key.descending,
									nulls: key.nulls,
								},
							})
						})
						.collect::<Result<Vec<_>>>()
				})?;
				Ok(Op::Sort(Box::new(SortOp {
					var,
					source,
					scope,
					keys,
					reverse: *reverse,
				})))
			}
			Node::Try {
				expr,
				handlers,
			} => self.lower_try(expr, handlers),
			Node::Caught => match &self.env.caught {
				Some(binding) => Ok(Op::Caught(binding.clone())),
				None => Err(CompileError::CaughtOutsideHandler),
			},
			Node::Conditional {
				condition,
				then,
				otherwise,
			} => {
				let condition = self.lower(condition)?;
				let before = self.env.assigned.clone();
				let then = self.lower(then)?;
				let after_then = std::mem::replace(&mut self.env.assigned, before);
				let otherwise = self.lower(otherwise)?;
				self.env.assigned = self.env.assigned.intersection(&after_then).cloned().collect();
				Ok(Op::Cond {
					condition: Box::new(condition),
					then: Box::new(then),
					otherwise: Box::new(otherwise),
				})
			}
			Node::Pipe {
				producer,
				consumer,
			} => self.lower_pipe(producer, consumer),
			Node::Label {
				name,
				expr,
			} => {
				let value = self.lower(expr)?;
				self.env.assigned.insert(name.clone());
				Ok(Op::SetLabel {
					label: self.cx.label(name),
					value: Box::new(value),
				})
			}
			Node::LabelRef(name) => {
				if self.pass == Pass::Emit && !self.env.assigned.contains(name) {
					return Err(CompileError::UnresolvedLabel {
						name: name.clone(),
					});
				}
				Ok(Op::GetLabel(self.cx.label(name)))
			}
			Node::Reducer(reducer) => self.lower_reducer(reducer),
			Node::Aggregate {
				keys,
				output,
			} => self.lower_aggregate(expr, keys, output),
			Node::Join {
				left,
				right,
				condition,
				how,
			} => self.lower_join(expr, left, right, condition.as_ref(), *how),
			Node::JoinRow(side) => match &self.env.join {
				Some(join) => Ok(Op::Register(match side {
					conduit_expr::JoinSide::Left => join.left.clone(),
					conduit_expr::JoinSide::Right => join.right.clone(),
				})),
				None => Err(CompileError::JoinRowOutsideJoin),
			},
		}
	}

	/// The guarded expression may stop at any point, so only labels set on
	/// the guarded path and on every handler count as assigned afterwards.
	fn lower_try(&mut self, expr: &Expr, handlers: &[Handler]) -> Result<Op> {
		if handlers.is_empty() {
			return self.lower(expr);
		}

		let before = self.env.assigned.clone();
		let body = self.lower(expr)?;
		let mut assigned = std::mem::replace(&mut self.env.assigned, before.clone());

		let caught = self.cx.alloc_slot("exc");
		let outer = self.env.caught.replace(caught.clone());
		let mut lowered = Vec::with_capacity(handlers.len());
		let mut result = Ok(());
		for handler in handlers {
			self.env.assigned = before.clone();
			match self.lower_handler(handler) {
				Ok(handler) => lowered.push(handler),
				Err(e) => {
					result = Err(e);
					break;
				}
			}
			assigned = assigned.intersection(&self.env.assigned).cloned().collect();
		}
		self.env.caught = outer;
		self.env.assigned = assigned;
		result?;

		Ok(Op::Try(Box::new(TryOp {
			body,
			handlers: lowered,
			caught,
		})))
	}

	fn lower_handler(&mut self, handler: &Handler) -> Result<HandlerOp> {
		let reraise_if = match &handler.reraise_if {
			Some(reraise_if) => Some(self.lower(reraise_if)?),
			None => None,
		};
		Ok(HandlerOp {
			kinds: handler.kinds.clone(),
			value: self.lower(&handler.value)?,
			reraise_if,
		})
	}

	fn lower_input(&mut self, expr: &Expr) -> Result<Op> {
		match &self.env.input {
			InputBinding::Arg => Ok(Op::Input),
			InputBinding::Inline(op) => Ok(Op::clone(op)),
			InputBinding::Forbidden => Err(CompileError::MissingGroupByField {
				expression: describe(expr),
			}),
		}
	}

	fn lower_all(&mut self, items: &[Expr]) -> Result<Vec<Op>> {
		items.iter().map(|item| self.lower(item)).collect()
	}

	/// Only the first operand of `and`/`or` is certain to run.
	fn lower_short_circuit(&mut self, items: &[Expr]) -> Result<Vec<Op>> {
		let mut out = Vec::with_capacity(items.len());
		let mut certain = None;
		for item in items {
			out.push(self.lower(item)?);
			if certain.is_none() {
				certain = Some(self.env.assigned.clone());
			}
		}
		if let Some(certain) = certain {
			self.env.assigned = certain;
		}
		Ok(out)
	}

	/// Inlines the producer into every input use of the consumer when that is
	/// cheap and safe; otherwise evaluates it once and runs the consumer on
	/// the result.
	fn lower_pipe(&mut self, producer: &Expr, consumer: &Expr) -> Result<Op> {
		let produced: Arc<Analysis> = self.analyzer.analyze(producer);
		let consumed = self.analyzer.analyze(consumer);
		let inline = !produced.has_side_effects()
			&& weights::is_simple_for_n_uses(produced.weight, consumed.input_uses, self.threshold);

		let producer_op = self.lower(producer)?;
		let ctx = self.derive_ctx(producer, "pipe");

		let saved = (self.env.ctx, self.env.input.clone(), self.env.memo);
		self.env.ctx = ctx;
		// a label read in the producer may change between two evaluations
		self.env.memo = saved.2 && !produced.reads_labels();
		let result = if inline {
			self.env.input = InputBinding::Inline(Rc::new(producer_op));
			self.lower(consumer)
		} else {
			self.env.input = InputBinding::Arg;
			self.lower(consumer).map(|consumer| Op::Pipe {
				producer: Box::new(producer_op),
				consumer: Box::new(consumer),
			})
		};
		(self.env.ctx, self.env.input, self.env.memo) = saved;
		result
	}
}

fn node_key(expr: &Expr, analysis: &Analysis) -> NodeKey {
	if analysis.has_side_effects() || analysis.reads_labels() || analysis.reads_caught {
		NodeKey::Identity(expr.id())
	} else {
		NodeKey::Shape(expr.clone())
	}
}

fn describe(expr: &Expr) -> String {
	let mut out = String::from(expr.node().kind_name());
	if let Node::Access {
		path,
		..
	} = expr.node()
	{
		for step in path {
			match step {
				PathStep::Key(key) => match key.node() {
					Node::Constant(value) => out.push_str(&format!("[{}]", value.repr())),
					_ => out.push_str("[..]"),
				},
				PathStep::Attr(name) => {
					out.push('.');
					out.push_str(name);
				}
			}
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use conduit_expr::{cond, label, naive, param, this, tuple};
	use conduit_type::{Function, Value};

	use super::*;

	fn lower_expr(expr: &Expr) -> Result<Program> {
		lower(expr, &Signature::new(), weights::binding_threshold(), "test".to_string())
	}

	fn memo_count(program: &Program) -> usize {
		program.scope.memos.len()
	}

	#[test]
	fn test_cheap_repeats_are_inlined() {
		let x = this().item("x");
		let program = lower_expr(&tuple([x.clone(), x])).unwrap();
		assert_eq!(memo_count(&program), 0);
	}

	#[test]
	fn test_expensive_repeats_are_hoisted_structurally() {
		let f = Function::pure("f", |args| Ok(args[0].clone()));
		let a = conduit_expr::call(&f, [this().item("x")]);
		let b = conduit_expr::call(&f, [this().item("x")]);
		let program = lower_expr(&tuple([a, b])).unwrap();
		assert_eq!(memo_count(&program), 1);
	}

	#[test]
	fn test_impure_calls_deduplicate_by_identity_only() {
		let f = Function::new("f", |args| Ok(args[0].clone()));
		let shared = conduit_expr::call(&f, [this()]);
		let program = lower_expr(&tuple([shared.clone(), shared])).unwrap();
		assert_eq!(memo_count(&program), 1);

		let a = conduit_expr::call(&f, [this()]);
		let b = conduit_expr::call(&f, [this()]);
		let program = lower_expr(&tuple([a, b])).unwrap();
		assert_eq!(memo_count(&program), 0);
	}

	#[test]
	fn test_label_read_before_write_is_rejected() {
		let expr = tuple([label("x"), this().label_as("x")]);
		assert_eq!(
			lower_expr(&expr).unwrap_err(),
			CompileError::UnresolvedLabel {
				name: "x".to_string()
			}
		);
		let expr = tuple([this().label_as("x"), label("x")]);
		assert!(lower_expr(&expr).is_ok());
	}

	#[test]
	fn test_conditional_keeps_labels_set_on_both_branches() {
		let both = cond(param("flag"), naive(1).label_as("x"), naive(2).label_as("x"));
		assert!(lower_expr(&tuple([both, label("x")])).is_ok());

		let one = cond(param("flag"), naive(1).label_as("x"), naive(2));
		assert!(matches!(lower_expr(&tuple([one, label("x")])), Err(CompileError::UnresolvedLabel { .. })));
	}

	#[test]
	fn test_comprehension_labels_do_not_escape() {
		let expr = tuple([this().list_comp(this().label_as("x")), label("x")]);
		assert!(matches!(lower_expr(&expr), Err(CompileError::UnresolvedLabel { .. })));
	}

	#[test]
	fn test_join_row_outside_join() {
		assert_eq!(lower_expr(&conduit_expr::left()).unwrap_err(), CompileError::JoinRowOutsideJoin);
	}

	#[test]
	fn test_caught_outside_handler() {
		assert_eq!(lower_expr(&conduit_expr::caught()).unwrap_err(), CompileError::CaughtOutsideHandler);

		let guarded = conduit_expr::try_(conduit_expr::caught()).except_(conduit_type::ErrorKind::ANY, naive(0));
		assert_eq!(lower_expr(&guarded).unwrap_err(), CompileError::CaughtOutsideHandler);
	}

	#[test]
	fn test_labels_set_in_guarded_expression_need_every_handler() {
		use conduit_type::ErrorKind;

		let partial = conduit_expr::try_(this().item("a").label_as("x")).except_(ErrorKind::ANY, naive(0));
		assert!(matches!(lower_expr(&tuple([partial, label("x")])), Err(CompileError::UnresolvedLabel { .. })));

		let covered =
			conduit_expr::try_(this().item("a").label_as("x")).except_(ErrorKind::ANY, naive(0).label_as("x"));
		assert!(lower_expr(&tuple([covered, label("x")])).is_ok());
	}

	#[test]
	fn test_try_without_handlers_is_transparent() {
		let program = lower_expr(&conduit_expr::try_(this().item("a"))).unwrap();
		assert!(matches!(program.body, Op::Access { .. }));
	}

	#[test]
	fn test_undeclared_params_extend_signature() {
		let program = lower_expr(&(param("a") + param("b"))).unwrap();
		let names: Vec<_> = program.params.iter().map(|p| p.name.as_str()).collect();
		assert_eq!(names, vec!["a", "b"]);
	}

	#[test]
	fn test_cheap_pipe_is_inlined() {
		let expr = this().item("x").pipe(this() + naive(1));
		let program = lower_expr(&expr).unwrap();
		assert!(matches!(program.body, Op::Binary { .. }));
	}

	#[test]
	fn test_impure_pipe_is_bound() {
		let f = Function::new("f", |args| Ok(args[0].clone()));
		let expr = conduit_expr::call(&f, [this()]).pipe(this() + naive(1));
		let program = lower_expr(&expr).unwrap();
		assert!(matches!(program.body, Op::Pipe { .. }));
		assert_eq!(program.constants.len(), 2);
		assert_eq!(program.constants[1].1, Value::int(1));
	}
}
