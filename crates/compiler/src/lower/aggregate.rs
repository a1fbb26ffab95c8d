// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{collections::HashSet, rc::Rc};

use conduit_expr::{Expr, Node, Reducer};

use super::{AggregateEnv, InputBinding, Lowerer, Result};
use crate::{
	CompileError,
	program::{AggregateOp, Op, SlotOp},
};

impl Lowerer<'_> {
	/// Inside an aggregate's output, a subtree equal to a group key reads the
	/// key of the group being emitted.
	pub(super) fn match_group_key(&self, expr: &Expr) -> Result<Option<Op>> {
		let Some(aggregate) = &self.env.aggregate else {
			return Ok(None);
		};
		if aggregate.output_ctx != self.env.ctx {
			return Ok(None);
		}

		let matches: Vec<usize> =
			aggregate.keys.iter().enumerate().filter(|(_, key)| *key == expr).map(|(i, _)| i).collect();
		match matches.as_slice() {
			[] => Ok(None),
			[index] => Ok(Some(Op::GroupKey {
				group: aggregate.group,
				index: *index,
			})),
			_ => Err(CompileError::AmbiguousGroupByField {
				matches: matches.len(),
			}),
		}
	}

	pub(super) fn lower_reducer(&mut self, reducer: &Reducer) -> Result<Op> {
		let Some(aggregate) = self.env.aggregate.clone() else {
			return Err(CompileError::ReducerOutsideAggregate {
				reducer: reducer.kind.to_string(),
			});
		};
		let index = aggregate.slots.iter().position(|slot| slot.slot_key() == reducer.slot_key()).ok_or_else(
			|| CompileError::ReducerOutsideAggregate {
				reducer: reducer.kind.to_string(),
			},
		)?;
		let constant_initial = reducer.initial.as_ref().filter(|initial| self.analyzer.analyze(initial).input_uses == 0);
		let default = match (&reducer.default, constant_initial) {
			(Some(default), _) => self.lower_contained(default)?,
			// a group whose rows were all filtered out still reports the initial value
			(None, Some(initial)) => self.lower_contained(initial)?,
			(None, None) => {
				let value = reducer.kind.static_default();
				Op::Const {
					name: self.cx.constant(&value),
					value,
				}
			}
		};
		Ok(Op::SlotValue {
			group: aggregate.group,
			index,
			default: Box::new(default),
		})
	}

	pub(super) fn lower_aggregate(&mut self, expr: &Expr, keys: &[Expr], output: &Expr) -> Result<Op> {
		let source = self.lower_input(expr)?;
		let slots = self.collect_reducers(output)?;

		let group = self.cx.alloc_group();
		let row = self.cx.names.fresh("row");
		let row_ctx = self.derive_ctx(expr, "row");
		let output_ctx = self.derive_ctx(expr, "output");

		let (row_scope, (key_ops, slot_ops)) = self.in_scope(row_ctx, InputBinding::Arg, |this| {
			this.env.aggregate = None;
			let key_ops = this.lower_all(keys)?;
			let mut slot_ops = Vec::with_capacity(slots.len());
			for slot in &slots {
				let filter = slot.filter.as_ref().map(|f| this.lower_contained(f)).transpose()?;
				let args = slot.args.iter().map(|a| this.lower_contained(a)).collect::<Result<Vec<_>>>()?;
				let initial = slot.initial.as_ref().map(|i| this.lower_contained(i)).transpose()?;
				let seed_empty = match &slot.initial {
					Some(initial) => this.analyzer.analyze(initial).input_uses == 0,
					None => false,
				};
				slot_ops.push(SlotOp {
					kind: slot.kind.clone(),
					args,
					filter,
					initial,
					seed_empty,
				});
			}
			Ok((key_ops, slot_ops))
		})?;

		let env = Rc::new(AggregateEnv {
			group,
			keys: keys.to_vec(),
			output_ctx,
			slots,
		});
		let (output_scope, output) = self.in_scope(output_ctx, InputBinding::Forbidden, |this| {
			this.env.aggregate = Some(env);
			this.lower(output)
		})?;

		Ok(Op::Aggregate(Box::new(AggregateOp {
			group,
			row,
			source,
			row_scope,
			keys: key_ops,
			slots: slot_ops,
			output_scope,
			output,
		})))
	}

	/// Distinct reducer slots of an aggregate output, in first-use order.
	/// Nested aggregates own their reducers and are skipped.
	fn collect_reducers(&mut self, output: &Expr) -> Result<Vec<Reducer>> {
		let mut slots: Vec<Reducer> = Vec::new();
		let mut seen = HashSet::new();
		let mut stack = vec![output.clone()];
		while let Some(expr) = stack.pop() {
			if !seen.insert(expr.id()) {
				continue;
			}
			match expr.node() {
				Node::Aggregate {
					..
				} => {}
				Node::Reducer(reducer) => {
					self.validate_reducer(reducer)?;
					if !slots.iter().any(|slot| slot.slot_key() == reducer.slot_key()) {
						slots.push(reducer.clone());
					}
					if let Some(default) = &reducer.default {
						stack.push(default.clone());
					}
				}
				node => {
					// reversed so that children pop in evaluation order
					stack.extend(node.children().into_iter().rev().cloned());
				}
			}
		}
		Ok(slots)
	}

	fn validate_reducer(&mut self, reducer: &Reducer) -> Result<()> {
		let kind = &reducer.kind;
		let invalid = |reason: String| CompileError::InvalidReducer {
			reducer: kind.to_string(),
			reason,
		};

		let (min, max) = kind.arity();
		if reducer.args.len() < min || reducer.args.len() > max {
			return Err(invalid(format!("takes {min} to {max} arguments, got {}", reducer.args.len())));
		}
		if reducer.initial.is_some() && !kind.accepts_initial() {
			return Err(invalid("does not accept an initial value".to_string()));
		}
		if matches!(kind, conduit_expr::ReducerKind::TopK(0)) {
			return Err(invalid("k must be at least 1".to_string()));
		}
		if let conduit_expr::ReducerKind::Percentile {
			percentile,
			..
		} = kind && !(0.0..=100.0).contains(&percentile.value())
		{
			return Err(invalid(format!("percentile {percentile} is outside 0..=100")));
		}

		let inputs = reducer.args.iter().chain(reducer.filter.iter()).chain(reducer.initial.iter());
		for input in inputs {
			let analysis = self.analyzer.analyze(input);
			if analysis.free_reducers > 0 {
				return Err(CompileError::NestedReducer {
					reducer: kind.to_string(),
				});
			}
			if !analysis.labels_written.is_empty() {
				return Err(CompileError::LabelInReducer {
					reducer: kind.to_string(),
				});
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use conduit_expr::{aggregate, group_by, naive, reduce, this, tuple, weights};

	use super::*;
	use crate::{lower::lower, signature::Signature};

	fn lower_expr(expr: &Expr) -> Result<crate::program::Program> {
		lower(expr, &Signature::new(), weights::binding_threshold(), "test".to_string())
	}

	fn aggregate_op(expr: &Expr) -> AggregateOp {
		match lower_expr(expr).unwrap().body {
			Op::Aggregate(op) => *op,
			other => panic!("expected aggregate, got {other:?}"),
		}
	}

	#[test]
	fn test_equal_reducers_share_a_slot() {
		let x = this().item("x");
		let expr = aggregate(tuple([reduce::sum(x.clone()), reduce::sum(x.clone()), reduce::max(x)]));
		assert_eq!(aggregate_op(&expr).slots.len(), 2);
	}

	#[test]
	fn test_defaults_do_not_split_slots() {
		let x = this().item("x");
		let expr = aggregate(tuple([reduce::max(x.clone()), reduce::max(x).or_default(naive(-1))]));
		assert_eq!(aggregate_op(&expr).slots.len(), 1);
	}

	#[test]
	fn test_group_key_in_output() {
		let key = this().item(0);
		let expr = group_by([key.clone()]).aggregate(tuple([this().item(0), reduce::sum(this().item(1))]));
		let op = aggregate_op(&expr);
		match op.output {
			Op::Collection {
				items,
				..
			} => assert!(matches!(items[0], Op::GroupKey { index: 0, .. })),
			other => panic!("unexpected output {other:?}"),
		}
	}

	#[test]
	fn test_missing_group_by_field() {
		let expr = group_by([this().item(0)]).aggregate(tuple([this().item(1), reduce::count()]));
		assert!(matches!(lower_expr(&expr), Err(CompileError::MissingGroupByField { .. })));
	}

	#[test]
	fn test_ambiguous_group_by_field() {
		let expr = group_by([this().item(0), this().item(0)]).aggregate(this().item(0));
		assert_eq!(
			lower_expr(&expr).unwrap_err(),
			CompileError::AmbiguousGroupByField {
				matches: 2
			}
		);
	}

	#[test]
	fn test_nested_reducer() {
		let expr = aggregate(reduce::sum(reduce::max(this())));
		assert!(matches!(lower_expr(&expr), Err(CompileError::NestedReducer { .. })));
	}

	#[test]
	fn test_reducer_outside_aggregate() {
		assert!(matches!(lower_expr(&reduce::sum(this())), Err(CompileError::ReducerOutsideAggregate { .. })));
		let in_key = group_by([reduce::count()]).aggregate(reduce::count());
		assert!(matches!(lower_expr(&in_key), Err(CompileError::ReducerOutsideAggregate { .. })));
	}

	#[test]
	fn test_label_in_reducer() {
		let expr = aggregate(reduce::sum(this().label_as("x")));
		assert!(matches!(lower_expr(&expr), Err(CompileError::LabelInReducer { .. })));
	}

	#[test]
	fn test_invalid_initial() {
		let expr = aggregate(reduce::count().initial(naive(1)));
		assert!(matches!(lower_expr(&expr), Err(CompileError::InvalidReducer { .. })));
	}

	#[test]
	fn test_top_k_requires_positive_k() {
		let expr = aggregate(reduce::top_k(this(), 0));
		assert!(matches!(lower_expr(&expr), Err(CompileError::InvalidReducer { .. })));
		assert!(lower_expr(&aggregate(reduce::top_k(this(), 1))).is_ok());
	}

	#[test]
	fn test_constant_initial_seeds_empty_input() {
		let expr = aggregate(reduce::sum(this()).initial(naive(10)));
		assert!(aggregate_op(&expr).slots[0].seed_empty);
	}
}
