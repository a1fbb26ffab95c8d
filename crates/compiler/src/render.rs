// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Human readable rendering of a lowered program.
//!
//! The rendering is what debug mode persists when an executable fails; it
//! shows the hoisted lazy bindings of every scope and the constants the
//! program refers to by name.

use std::fmt::Write;

use conduit_expr::{CollectionKind, ComprehensionKind, NullOrder, UnaryOp};

use crate::program::{AggregateOp, JoinOp, JoinSideOp, LoopOp, Op, Program, Scope, SortOp, Step, TryOp};

const INDENT: &str = "    ";

pub(crate) fn render(program: &Program) -> String {
	let mut out = String::new();

	let mut header = vec![program.input.clone()];
	if !program.params.is_empty() {
		header.push("*".to_string());
		for param in &program.params {
			header.push(match &param.default {
				Some(default) => format!("{}={}", param.name, default.repr()),
				None => param.name.clone(),
			});
		}
	}
	let _ = writeln!(out, "def {}({}):", program.name, header.join(", "));

	for (name, value) in &program.constants {
		let _ = writeln!(out, "{INDENT}{name} = {}", value.repr());
	}
	render_scope(&mut out, &program.scope, &program.input, 1);
	let _ = writeln!(out, "{INDENT}return {}", op(&program.body, &program.input, 1));
	out
}

fn pad(depth: usize) -> String {
	INDENT.repeat(depth)
}

fn render_scope(out: &mut String, scope: &Scope, input: &str, depth: usize) {
	for memo in &scope.memos {
		let _ = writeln!(out, "{}lazy {} = {}", pad(depth), memo.binding.name, op(&memo.op, input, depth));
	}
}

fn list(ops: &[Op], input: &str, depth: usize) -> String {
	ops.iter().map(|o| op(o, input, depth)).collect::<Vec<_>>().join(", ")
}

fn op(node: &Op, input: &str, depth: usize) -> String {
	match node {
		Op::Input => input.to_string(),
		Op::Const {
			name,
			..
		}
		| Op::Param {
			name,
			..
		} => name.clone(),
		Op::Access {
			source,
			steps,
			default,
		} => {
			let mut out = op(source, input, depth);
			for step in steps {
				match step {
					Step::Key(key) => {
						let _ = write!(out, "[{}]", op(key, input, depth));
					}
					Step::Attr(name) => {
						let _ = write!(out, ".{name}");
					}
				}
			}
			match default {
				Some(default) => format!("({out} ?? {})", op(default, input, depth)),
				None => out,
			}
		}
		Op::Call {
			name,
			args,
			..
		} => format!("{name}({})", list(args, input, depth)),
		Op::Builtin {
			op: builtin,
			args,
		} => format!("{}({})", builtin.name(), list(args, input, depth)),
		Op::Binary {
			op: binary,
			left,
			right,
		} => format!("({} {binary} {})", op(left, input, depth), op(right, input, depth)),
		Op::Unary {
			op: unary,
			operand,
		} => {
			let operand = op(operand, input, depth);
			match unary {
				UnaryOp::Not => format!("(not {operand})"),
				UnaryOp::Neg => format!("(-{operand})"),
				UnaryOp::IsNull => format!("({operand} is null)"),
				UnaryOp::IsNotNull => format!("({operand} is not null)"),
			}
		}
		Op::And(items) => format!(
			"({})",
			items.iter().map(|o| op(o, input, depth)).collect::<Vec<_>>().join(" and ")
		),
		Op::Or(items) => {
			format!("({})", items.iter().map(|o| op(o, input, depth)).collect::<Vec<_>>().join(" or "))
		}
		Op::Collection {
			kind,
			items,
		} => {
			let single = items.len() == 1;
			let items = list(items, input, depth);
			match kind {
				CollectionKind::List => format!("[{items}]"),
				CollectionKind::Tuple if single => format!("({items},)"),
				CollectionKind::Tuple => format!("({items})"),
				CollectionKind::Set if items.is_empty() => "set()".to_string(),
				CollectionKind::Set => format!("{{{items}}}"),
			}
		}
		Op::Dict(pairs) => {
			let pairs: Vec<String> = pairs
				.iter()
				.map(|(k, v)| format!("{}: {}", op(k, input, depth), op(v, input, depth)))
				.collect();
			format!("{{{}}}", pairs.join(", "))
		}
		Op::Loop(looped) => render_loop(looped, input, depth),
		Op::Sort(sort) => render_sort(sort, input, depth),
		Op::Try(guarded) => render_try(guarded, input, depth),
		Op::Caught(binding) => binding.name.clone(),
		Op::Cond {
			condition,
			then,
			otherwise,
		} => format!(
			"({} if {} else {})",
			op(then, input, depth),
			op(condition, input, depth),
			op(otherwise, input, depth)
		),
		Op::Pipe {
			producer,
			consumer,
		} => format!("({} |> {})", op(producer, input, depth), op(consumer, "_", depth)),
		Op::Memo(binding) | Op::GetLabel(binding) | Op::Register(binding) => binding.name.clone(),
		Op::SetLabel {
			label,
			value,
		} => format!("({} := {})", label.name, op(value, input, depth)),
		Op::Aggregate(aggregate) => render_aggregate(aggregate, input, depth),
		Op::Join(join) => render_join(join, input, depth),
		Op::GroupKey {
			group,
			index,
		} => format!("group_{group}.key[{index}]"),
		Op::SlotValue {
			group,
			index,
			default,
		} => format!("(group_{group}.slot[{index}] ?? {})", op(default, input, depth)),
	}
}

fn render_loop(looped: &LoopOp, input: &str, depth: usize) -> String {
	let kind = match looped.kind {
		ComprehensionKind::Iter => "iter",
		ComprehensionKind::List => "list",
		ComprehensionKind::Tuple => "tuple",
		ComprehensionKind::Set => "set",
		ComprehensionKind::Dict => "dict",
	};
	let var = looped.var.as_str();
	let inner = depth + 2;

	let mut out = format!("{kind}(\n{}for {var} in {}:\n", pad(depth + 1), op(&looped.source, input, depth + 1));
	render_scope(&mut out, &looped.scope, var, inner);
	if let Some(filter) = &looped.filter {
		let _ = writeln!(out, "{}where {}", pad(inner), op(filter, var, inner));
	}
	let element = op(&looped.element, var, inner);
	match &looped.key {
		Some(key) => {
			let _ = writeln!(out, "{}yield {}: {element}", pad(inner), op(key, var, inner));
		}
		None => {
			let _ = writeln!(out, "{}yield {element}", pad(inner));
		}
	}
	let _ = write!(out, "{})", pad(depth));
	out
}

fn render_sort(sort: &SortOp, input: &str, depth: usize) -> String {
	let var = sort.var.as_str();
	let inner = depth + 2;

	let mut out = format!("sorted(\n{}for {var} in {}:\n", pad(depth + 1), op(&sort.source, input, depth + 1));
	render_scope(&mut out, &sort.scope, var, inner);
	if sort.keys.is_empty() {
		let _ = writeln!(out, "{}by {var}", pad(inner));
	}
	for key in &sort.keys {
		let mut line = op(&key.op, var, inner);
		if key.order.descending {
			line.push_str(" desc");
		}
		match key.order.nulls {
			NullOrder::Natural => {}
			NullOrder::First => line.push_str(" nulls first"),
			NullOrder::Last => line.push_str(" nulls last"),
		}
		let _ = writeln!(out, "{}by {line}", pad(inner));
	}
	if sort.reverse {
		let _ = writeln!(out, "{}reverse", pad(depth + 1));
	}
	let _ = write!(out, "{})", pad(depth));
	out
}

fn render_try(guarded: &TryOp, input: &str, depth: usize) -> String {
	let inner = depth + 2;
	let mut out = format!("try(\n{}{}\n", pad(depth + 1), op(&guarded.body, input, depth + 1));
	for handler in &guarded.handlers {
		let kinds = if handler.kinds.is_empty() {
			"any".to_string()
		} else {
			handler.kinds.iter().map(|k| format!("{k:?}")).collect::<Vec<_>>().join(", ")
		};
		let _ = writeln!(out, "{}except {kinds} as {}:", pad(depth + 1), guarded.caught.name);
		if let Some(reraise_if) = &handler.reraise_if {
			let _ = writeln!(out, "{}reraise if {}", pad(inner), op(reraise_if, input, inner));
		}
		let _ = writeln!(out, "{}{}", pad(inner), op(&handler.value, input, inner));
	}
	let _ = write!(out, "{})", pad(depth));
	out
}

fn render_aggregate(aggregate: &AggregateOp, input: &str, depth: usize) -> String {
	let row = aggregate.row.as_str();
	let inner = depth + 2;

	let mut out = format!(
		"aggregate group_{}(\n{}for {row} in {}:\n",
		aggregate.group,
		pad(depth + 1),
		op(&aggregate.source, input, depth + 1)
	);
	render_scope(&mut out, &aggregate.row_scope, row, inner);
	if aggregate.grouped() {
		let _ = writeln!(out, "{}group by {}", pad(inner), list(&aggregate.keys, row, inner));
	}
	for (index, slot) in aggregate.slots.iter().enumerate() {
		let _ = write!(out, "{}slot[{index}] = {}({})", pad(inner), slot.kind, list(&slot.args, row, inner));
		if let Some(filter) = &slot.filter {
			let _ = write!(out, " where {}", op(filter, row, inner));
		}
		if let Some(initial) = &slot.initial {
			let _ = write!(out, " initial {}", op(initial, row, inner));
		}
		out.push('\n');
	}
	let _ = writeln!(out, "{}emit:", pad(depth + 1));
	render_scope(&mut out, &aggregate.output_scope, "_", inner);
	let _ = writeln!(out, "{}{}", pad(inner), op(&aggregate.output, "_", inner));
	let _ = write!(out, "{})", pad(depth));
	out
}

fn render_join(join: &JoinOp, input: &str, depth: usize) -> String {
	let inner = depth + 1;
	let strategy = if join.is_hash_join() {
		"hash"
	} else {
		"nested loop"
	};

	let mut out = format!("join {} ({strategy})(\n", join.how);
	let _ = writeln!(out, "{}{} in {}", pad(inner), join.left_row.name, op(&join.left, input, inner));
	let _ = writeln!(out, "{}{} in {}", pad(inner), join.right_row.name, op(&join.right, input, inner));
	if let Some(pre_filter) = &join.pre_filter {
		let _ = writeln!(out, "{}when {}", pad(inner), op(pre_filter, input, inner));
	}
	render_side(&mut out, "left", &join.left_side, input, inner);
	render_side(&mut out, "right", &join.right_side, input, inner);
	render_scope(&mut out, &join.pair_scope, input, inner);
	if let Some(residual) = &join.residual {
		let _ = writeln!(out, "{}on {}", pad(inner), op(residual, input, inner));
	}
	let _ = write!(out, "{})", pad(depth));
	out
}

fn render_side(out: &mut String, name: &str, side: &JoinSideOp, input: &str, depth: usize) {
	render_scope(out, &side.scope, input, depth);
	if !side.keys.is_empty() {
		let _ = writeln!(out, "{}{name} key {}", pad(depth), list(&side.keys, input, depth));
	}
	if let Some(filter) = &side.filter {
		let _ = writeln!(out, "{}{name} where {}", pad(depth), op(filter, input, depth));
	}
}
