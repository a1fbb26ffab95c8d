// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use conduit_expr::{BinaryOp, Expr, JoinHow, Node, Sides};
use conduit_type::Value;
use tracing::trace;

use super::{JoinEnv, Lowerer, Result};
use crate::program::{JoinOp, JoinSideOp, Op};

/// A join condition split into the parts each stage of the join evaluates.
#[derive(Debug, Default)]
struct JoinPlan {
	/// Equalities between a left-only and a right-only expression
	keys: Vec<(Expr, Expr)>,
	left_filter: Vec<Expr>,
	right_filter: Vec<Expr>,
	/// Reads neither side
	pre_filter: Vec<Expr>,
	/// Re-checked for every candidate pair
	residual: Vec<Expr>,
}

impl Lowerer<'_> {
	pub(super) fn lower_join(
		&mut self,
		expr: &Expr,
		left: &Expr,
		right: &Expr,
		condition: Option<&Expr>,
		how: JoinHow,
	) -> Result<Op> {
		let left_op = self.lower(left)?;
		let right_op = self.lower(right)?;
		let left_row = self.cx.alloc_slot("left");
		let right_row = self.cx.alloc_slot("right");
		let plan = self.plan_join(condition, how);
		trace!(
			%how,
			keys = plan.keys.len(),
			residual = plan.residual.len(),
			pre_filter = plan.pre_filter.len(),
			"join planned"
		);

		let pre_filter = self.lower_conjunction(&plan.pre_filter)?;

		let join = JoinEnv {
			left: left_row.clone(),
			right: right_row.clone(),
		};
		let (left_keys, right_keys): (Vec<Expr>, Vec<Expr>) = plan.keys.into_iter().unzip();
		let left_side = self.lower_join_side(expr, "left", &join, &left_keys, &plan.left_filter)?;
		let right_side = self.lower_join_side(expr, "right", &join, &right_keys, &plan.right_filter)?;

		let ctx = self.derive_ctx(expr, "pair");
		let input = self.env.input.clone();
		let (pair_scope, residual) = self.in_scope(ctx, input, |this| {
			this.env.join = Some(join);
			this.lower_conjunction(&plan.residual)
		})?;

		Ok(Op::Join(Box::new(JoinOp {
			how,
			left: left_op,
			right: right_op,
			left_row,
			right_row,
			pre_filter,
			left_side,
			right_side,
			pair_scope,
			residual,
		})))
	}

	fn lower_join_side(
		&mut self,
		expr: &Expr,
		tag: &'static str,
		join: &JoinEnv,
		keys: &[Expr],
		filter: &[Expr],
	) -> Result<JoinSideOp> {
		let ctx = self.derive_ctx(expr, tag);
		let input = self.env.input.clone();
		let (scope, (keys, filter)) = self.in_scope(ctx, input, |this| {
			this.env.join = Some(join.clone());
			let keys = this.lower_all(keys)?;
			let filter = this.lower_conjunction(filter)?;
			Ok((keys, filter))
		})?;
		Ok(JoinSideOp {
			scope,
			keys,
			filter,
		})
	}

	fn lower_conjunction(&mut self, conjuncts: &[Expr]) -> Result<Option<Op>> {
		let saved = self.env.assigned.clone();
		let ops = self.lower_all(conjuncts);
		self.env.assigned = saved;
		let mut ops = ops?;
		Ok(match ops.len() {
			0 => None,
			1 => ops.pop(),
			_ => Some(Op::And(ops)),
		})
	}

	/// Splits the top-level conjunction of `condition` by the join sides each
	/// conjunct reads. Conditions on the preserved side of an outer join are
	/// re-checked per pair so that the row still appears unmatched.
	fn plan_join(&mut self, condition: Option<&Expr>, how: JoinHow) -> JoinPlan {
		let mut conjuncts = Vec::new();
		if let Some(condition) = condition {
			flatten_and(condition, &mut conjuncts);
		}

		let mut plan = JoinPlan::default();
		let mut left_only = Vec::new();
		let mut right_only = Vec::new();
		for conjunct in conjuncts {
			if matches!(conjunct.node(), Node::Constant(Value::Bool(true))) {
				continue;
			}
			if let Node::Binary {
				op: BinaryOp::Eq,
				left,
				right,
			} = conjunct.node()
			{
				let (l, r) = (self.sides(left), self.sides(right));
				if is_only_left(l) && is_only_right(r) {
					plan.keys.push((left.clone(), right.clone()));
					continue;
				}
				if is_only_right(l) && is_only_left(r) {
					plan.keys.push((right.clone(), left.clone()));
					continue;
				}
			}
			match self.sides(&conjunct) {
				Sides {
					left: false,
					right: false,
				} => plan.pre_filter.push(conjunct),
				Sides {
					left: true,
					right: false,
				} => left_only.push(conjunct),
				Sides {
					left: false,
					right: true,
				} => right_only.push(conjunct),
				Sides {
					left: true,
					right: true,
				} => plan.residual.push(conjunct),
			}
		}

		match how {
			JoinHow::Inner | JoinHow::Cross => {
				plan.left_filter = left_only;
				plan.right_filter = right_only;
			}
			JoinHow::Left => {
				plan.residual.extend(left_only);
				plan.right_filter = right_only;
			}
			JoinHow::Right => {
				plan.left_filter = left_only;
				plan.residual.extend(right_only);
			}
			JoinHow::Outer => {
				plan.residual.extend(left_only);
				plan.residual.extend(right_only);
			}
		}
		plan
	}

	fn sides(&mut self, expr: &Expr) -> Sides {
		self.analyzer.analyze(expr).sides
	}
}

fn flatten_and(expr: &Expr, out: &mut Vec<Expr>) {
	match expr.node() {
		Node::And(items) => {
			for item in items {
				flatten_and(item, out);
			}
		}
		_ => out.push(expr.clone()),
	}
}

fn is_only_left(sides: Sides) -> bool {
	sides.left && !sides.right
}

fn is_only_right(sides: Sides) -> bool {
	sides.right && !sides.left
}
