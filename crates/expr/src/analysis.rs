// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Bottom-up dependency and cost analysis.
//!
//! Every node reports the external resources it touches, whether it may have
//! side effects, how often it reads the current input and what it costs to
//! evaluate. Composite nodes aggregate over their children; results are
//! memoized per physical node.

use std::{
	collections::{BTreeSet, HashMap, HashSet},
	sync::Arc,
};

use crate::{Expr, JoinSide, Node, PathStep, weights};

/// Join sides read by an expression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sides {
	pub left: bool,
	pub right: bool,
}

impl Sides {
	pub fn none(&self) -> bool {
		!self.left && !self.right
	}

	fn merge(&mut self, other: Sides) {
		self.left |= other.left;
		self.right |= other.right;
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analysis {
	/// Relative evaluation cost, see [`weights`]
	pub weight: u64,
	pub params: BTreeSet<String>,
	pub labels_read: BTreeSet<String>,
	pub labels_written: BTreeSet<String>,
	/// Number of constant and callable references
	pub constants: usize,
	/// Calls an external function not declared pure
	pub impure: bool,
	/// Evaluations of the current input, in the expression's own input context
	pub input_uses: usize,
	pub sides: Sides,
	/// Reducers not enclosed by an aggregate
	pub free_reducers: usize,
	/// A reducer appears inside another reducer's arguments
	pub nested_reducer: bool,
	pub has_aggregate: bool,
	/// Reads the error of an enclosing handler
	pub reads_caught: bool,
}

impl Analysis {
	/// Impure calls or label writes: must not be duplicated or dropped.
	pub fn has_side_effects(&self) -> bool {
		self.impure || !self.labels_written.is_empty()
	}

	pub fn reads_labels(&self) -> bool {
		!self.labels_read.is_empty()
	}

	fn absorb(&mut self, child: &Analysis) {
		self.weight = self.weight.saturating_add(child.weight);
		self.params.extend(child.params.iter().cloned());
		self.labels_read.extend(child.labels_read.iter().cloned());
		self.labels_written.extend(child.labels_written.iter().cloned());
		self.constants += child.constants;
		self.impure |= child.impure;
		self.input_uses += child.input_uses;
		self.sides.merge(child.sides);
		self.free_reducers += child.free_reducers;
		self.nested_reducer |= child.nested_reducer;
		self.has_aggregate |= child.has_aggregate;
		self.reads_caught |= child.reads_caught;
	}

	/// Absorbs a child evaluated against a different input.
	fn absorb_scoped(&mut self, child: &Analysis) {
		let uses = self.input_uses;
		self.absorb(child);
		self.input_uses = uses;
	}
}

/// Memoizing analyzer keyed by physical node identity.
#[derive(Default)]
pub struct Analyzer {
	cache: HashMap<usize, (Expr, Arc<Analysis>)>,
}

impl Analyzer {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn analyze(&mut self, expr: &Expr) -> Arc<Analysis> {
		if let Some((_, analysis)) = self.cache.get(&expr.id()) {
			return analysis.clone();
		}
		let analysis = Arc::new(self.compute(expr));
		self.cache.insert(expr.id(), (expr.clone(), analysis.clone()));
		analysis
	}

	fn compute(&mut self, expr: &Expr) -> Analysis {
		let mut out = Analysis::default();
		match expr.node() {
			Node::Input => out.input_uses = 1,
			Node::Constant(_) => out.constants = 1,
			Node::Parameter(name) => {
				out.params.insert(name.clone());
			}
			Node::LabelRef(name) => {
				out.labels_read.insert(name.clone());
				out.weight = weights::DICT_LOOKUP;
			}
			Node::Caught => {
				out.reads_caught = true;
				out.weight = weights::STEP;
			}
			Node::JoinRow(side) => match side {
				JoinSide::Left => out.sides.left = true,
				JoinSide::Right => out.sides.right = true,
			},
			Node::Access {
				source,
				path,
				default,
			} => {
				out.absorb(&self.analyze(source));
				for step in path {
					match step {
						PathStep::Key(key) => {
							out.absorb(&self.analyze(key));
							out.weight += weights::DICT_LOOKUP;
						}
						PathStep::Attr(_) => out.weight += weights::ATTR_LOOKUP,
					}
				}
				if let Some(default) = default {
					out.absorb(&self.analyze(default));
					out.weight += weights::FUNCTION_CALL;
				}
			}
			Node::Call {
				function,
				args,
			} => {
				self.absorb_all(&mut out, args);
				out.constants += 1;
				out.impure |= !function.is_pure();
				out.weight += weights::FUNCTION_CALL;
			}
			Node::Builtin {
				args,
				..
			} => {
				self.absorb_all(&mut out, args);
				out.weight += weights::FUNCTION_CALL;
			}
			Node::Binary {
				op,
				left,
				right,
			} => {
				out.absorb(&self.analyze(left));
				out.absorb(&self.analyze(right));
				out.weight += if op.is_arithmetic() {
					weights::MATH_SIMPLE
				} else {
					weights::LOGICAL
				};
			}
			Node::Unary {
				operand,
				..
			} => {
				out.absorb(&self.analyze(operand));
				out.weight += weights::LOGICAL;
			}
			Node::And(items) | Node::Or(items) => {
				self.absorb_all(&mut out, items);
				out.weight += weights::LOGICAL * (items.len().max(2) - 1) as u64;
			}
			Node::Collection {
				kind,
				items,
			} => {
				self.absorb_all(&mut out, items);
				out.weight += match kind {
					crate::CollectionKind::List => weights::LIST_INIT,
					crate::CollectionKind::Tuple => weights::TUPLE_INIT,
					crate::CollectionKind::Set => weights::SET_INIT,
				};
			}
			Node::Dict(pairs) => {
				for (k, v) in pairs {
					out.absorb(&self.analyze(k));
					out.absorb(&self.analyze(v));
				}
				out.weight += weights::DICT_INIT;
			}
			Node::Comprehension {
				key,
				element,
				source,
				filter,
				..
			} => {
				out.absorb(&self.analyze(source));
				for body in key.iter().chain(filter.iter()).chain([element]) {
					out.absorb_scoped(&self.analyze(body));
				}
				out.weight = out.weight.saturating_add(weights::UNPREDICTABLE);
			}
			Node::Sort {
				source,
				keys,
				..
			} => {
				out.absorb(&self.analyze(source));
				for key in keys {
					out.absorb_scoped(&self.analyze(&key.expr));
				}
				out.weight = out.weight.saturating_add(weights::UNPREDICTABLE);
			}
			Node::Try {
				expr,
				handlers,
			} => {
				let guarded = self.analyze(expr);
				out.absorb(&guarded);
				for handler in handlers {
					if let Some(reraise_if) = &handler.reraise_if {
						out.absorb(&self.analyze(reraise_if));
					}
					out.absorb(&self.analyze(&handler.value));
				}
				// handlers read their own error, not an outer one
				out.reads_caught = guarded.reads_caught;
				out.weight += weights::FUNCTION_CALL;
			}
			Node::Conditional {
				condition,
				then,
				otherwise,
			} => {
				out.absorb(&self.analyze(condition));
				out.absorb(&self.analyze(then));
				out.absorb(&self.analyze(otherwise));
				out.weight += weights::LOGICAL;
			}
			Node::Pipe {
				producer,
				consumer,
			} => {
				let producer = self.analyze(producer);
				let consumer = self.analyze(consumer);
				out.absorb(&producer);
				out.absorb_scoped(&consumer);
				out.input_uses = producer.input_uses * consumer.input_uses.max(1);
			}
			Node::Label {
				name,
				expr,
			} => {
				out.absorb(&self.analyze(expr));
				out.labels_written.insert(name.clone());
				out.weight += weights::STEP;
			}
			Node::Reducer(reducer) => {
				for child in reducer.children() {
					let child = self.analyze(child);
					out.nested_reducer |= child.free_reducers > 0;
					out.absorb_scoped(&child);
				}
				out.free_reducers = 1;
				out.weight += weights::STEP;
			}
			Node::Aggregate {
				keys,
				output,
			} => {
				for key in keys {
					out.absorb_scoped(&self.analyze(key));
				}
				out.absorb_scoped(&self.analyze(output));
				out.free_reducers = 0;
				out.input_uses = 1;
				out.has_aggregate = true;
				out.weight = out.weight.saturating_add(weights::UNPREDICTABLE);
			}
			Node::Join {
				left,
				right,
				condition,
				..
			} => {
				out.absorb(&self.analyze(left));
				out.absorb(&self.analyze(right));
				if let Some(condition) = condition {
					let sides = out.sides;
					out.absorb(&self.analyze(condition));
					out.sides = sides;
				}
				out.weight = out.weight.saturating_add(weights::UNPREDICTABLE);
			}
		}
		out
	}

	fn absorb_all(&mut self, out: &mut Analysis, items: &[Expr]) {
		for item in items {
			out.absorb(&self.analyze(item));
		}
	}
}

/// Number of times each physically distinct subtree is referenced from `root`,
/// counting every path through shared subtrees.
pub fn reference_counts(root: &Expr) -> HashMap<usize, usize> {
	fn visit<'a>(expr: &'a Expr, seen: &mut HashSet<usize>, order: &mut Vec<&'a Expr>) {
		if !seen.insert(expr.id()) {
			return;
		}
		for child in expr.node().children() {
			visit(child, seen, order);
		}
		order.push(expr);
	}

	let mut seen = HashSet::new();
	let mut order = Vec::new();
	visit(root, &mut seen, &mut order);

	let mut counts: HashMap<usize, usize> = HashMap::with_capacity(order.len());
	counts.insert(root.id(), 1);
	// reverse post-order visits every parent before its children
	for expr in order.iter().rev() {
		let count = counts.get(&expr.id()).copied().unwrap_or(0);
		for child in expr.node().children() {
			*counts.entry(child.id()).or_insert(0) += count;
		}
	}
	counts
}

#[cfg(test)]
mod tests {
	use conduit_type::{Function, Value};

	use super::*;
	use crate::{aggregate, join, label, left, naive, param, reduce, right, this, tuple};

	#[test]
	fn test_dependencies() {
		let expr = this().item(param("key")).label_as("picked") + label("base");
		let analysis = Analyzer::new().analyze(&expr);
		assert!(analysis.params.contains("key"));
		assert!(analysis.labels_written.contains("picked"));
		assert!(analysis.labels_read.contains("base"));
		assert!(analysis.has_side_effects());
		assert!(!analysis.impure);
		assert_eq!(analysis.input_uses, 1);
	}

	#[test]
	fn test_calls_are_impure_unless_declared_pure() {
		let f = Function::new("f", |_| Ok(Value::Null));
		let g = Function::pure("g", |_| Ok(Value::Null));
		let mut analyzer = Analyzer::new();
		assert!(analyzer.analyze(&crate::call(&f, [this()])).impure);
		assert!(!analyzer.analyze(&crate::call(&g, [this()])).impure);
	}

	#[test]
	fn test_comprehension_body_does_not_count_outer_input() {
		let expr = this().item("rows").list_comp(this().item("a") + this().item("b"));
		let analysis = Analyzer::new().analyze(&expr);
		assert_eq!(analysis.input_uses, 1);
		assert!(analysis.weight >= weights::UNPREDICTABLE);
	}

	#[test]
	fn test_nested_reducer_flag() {
		let nested = aggregate(reduce::sum(reduce::max(this())));
		assert!(Analyzer::new().analyze(&nested).nested_reducer);

		let fine = aggregate(tuple([reduce::sum(this()), reduce::max(this())]));
		let analysis = Analyzer::new().analyze(&fine);
		assert!(!analysis.nested_reducer);
		assert_eq!(analysis.free_reducers, 0);
		assert!(analysis.has_aggregate);
	}

	#[test]
	fn test_join_sides() {
		let condition = left().item("id").equals(right().item("id"));
		let mut analyzer = Analyzer::new();
		let sides = analyzer.analyze(&condition).sides;
		assert!(sides.left && sides.right);

		let joined = join(this().item(0), this().item(1), Some(condition), crate::JoinHow::Inner);
		assert!(analyzer.analyze(&joined).sides.none());
	}

	#[test]
	fn test_caught_is_bound_by_its_try() {
		let mut analyzer = Analyzer::new();
		assert!(analyzer.analyze(&crate::caught().len()).reads_caught);

		let guarded = crate::try_(this().item("a")).except_(conduit_type::ErrorKind::ANY, crate::caught());
		assert!(!analyzer.analyze(&guarded).reads_caught);

		let outer = crate::try_(crate::caught()).except_(conduit_type::ErrorKind::ANY, naive(0));
		assert!(analyzer.analyze(&outer).reads_caught);
	}

	#[test]
	fn test_reference_counts_follow_shared_paths() {
		let shared = this().item("x");
		let pair = tuple([shared.clone(), shared.clone()]);
		let root = tuple([pair.clone(), pair.clone(), naive(1)]);
		let counts = reference_counts(&root);
		assert_eq!(counts[&root.id()], 1);
		assert_eq!(counts[&pair.id()], 2);
		assert_eq!(counts[&shared.id()], 4);
	}
}
