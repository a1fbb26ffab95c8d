// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt,
	hash::{Hash, Hasher},
	sync::Arc,
};

use conduit_type::{ErrorKind, Function, Value};

use crate::{BinaryOp, Builtin, CollectionKind, ComprehensionKind, JoinHow, JoinSide, Reducer, UnaryOp};

/// Immutable, cheaply cloneable handle to an expression node.
///
/// Equality and hashing are structural. [`Expr::ptr_eq`] and [`Expr::id`]
/// expose physical identity, which is what distinguishes one shared subtree
/// from two structurally equal copies.
#[derive(Clone)]
pub struct Expr(Arc<Node>);

impl Expr {
	pub fn new(node: Node) -> Self {
		Self(Arc::new(node))
	}

	pub fn node(&self) -> &Node {
		&self.0
	}

	pub fn id(&self) -> usize {
		Arc::as_ptr(&self.0) as usize
	}

	pub fn ptr_eq(&self, other: &Expr) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}

impl PartialEq for Expr {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other) || *self.0 == *other.0
	}
}

impl Eq for Expr {}

impl Hash for Expr {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.0.hash(state)
	}
}

impl fmt::Debug for Expr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&self.0, f)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
	/// `value[key]`, the key evaluated against the same input as the access
	Key(Expr),
	/// `value.name`: a string-keyed dict entry or an object attribute
	Attr(String),
}

/// Where nulls go relative to the other values of a sort key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum NullOrder {
	/// Nulls are compared like any other value
	#[default]
	Natural,
	First,
	Last,
}

/// One component of a sort key, built with [`Expr::asc`] or [`Expr::desc`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortKey {
	pub expr: Expr,
	pub descending: bool,
	/// Null placement; unaffected by `descending`
	pub nulls: NullOrder,
}

impl SortKey {
	pub fn nulls_first(mut self) -> Self {
		self.nulls = NullOrder::First;
		self
	}

	pub fn nulls_last(mut self) -> Self {
		self.nulls = NullOrder::Last;
		self
	}
}

impl From<Expr> for SortKey {
	fn from(expr: Expr) -> Self {
		Self {
			expr,
			descending: false,
			nulls: NullOrder::Natural,
		}
	}
}

/// Error handler of a [`Node::Try`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Handler {
	/// Caught kinds; empty catches every error
	pub kinds: Vec<ErrorKind>,
	/// Result when the handler catches
	pub value: Expr,
	/// Propagates the caught error instead when true
	pub reraise_if: Option<Expr>,
}

impl Handler {
	pub fn catches(&self, kind: ErrorKind) -> bool {
		self.kinds.is_empty() || self.kinds.contains(&kind)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
	/// The current input
	Input,
	Access {
		source: Expr,
		path: Vec<PathStep>,
		default: Option<Expr>,
	},
	/// A registered value, passed by identity rather than copied
	Constant(Value),
	Parameter(String),
	Call {
		function: Function,
		args: Vec<Expr>,
	},
	Builtin {
		op: Builtin,
		args: Vec<Expr>,
	},
	Binary {
		op: BinaryOp,
		left: Expr,
		right: Expr,
	},
	Unary {
		op: UnaryOp,
		operand: Expr,
	},
	/// Short-circuit conjunction returning the deciding operand
	And(Vec<Expr>),
	/// Short-circuit disjunction returning the deciding operand
	Or(Vec<Expr>),
	Collection {
		kind: CollectionKind,
		items: Vec<Expr>,
	},
	Dict(Vec<(Expr, Expr)>),
	Comprehension {
		kind: ComprehensionKind,
		/// Key expression, dict comprehensions only
		key: Option<Expr>,
		element: Expr,
		source: Expr,
		filter: Option<Expr>,
	},
	/// Stable sort; without keys the elements themselves are compared
	Sort {
		source: Expr,
		keys: Vec<SortKey>,
		reverse: bool,
	},
	/// Evaluates `expr`, handing a failure to the first handler catching it
	Try {
		expr: Expr,
		handlers: Vec<Handler>,
	},
	/// Message of the error being handled by the enclosing handler
	Caught,
	Conditional {
		condition: Expr,
		then: Expr,
		otherwise: Expr,
	},
	/// Evaluates `consumer` with the result of `producer` as its input
	Pipe {
		producer: Expr,
		consumer: Expr,
	},
	/// Evaluates `expr`, stores it under `name` and passes it through
	Label {
		name: String,
		expr: Expr,
	},
	LabelRef(String),
	Reducer(Reducer),
	/// Single-pass reduction over the current input
	Aggregate {
		keys: Vec<Expr>,
		output: Expr,
	},
	Join {
		left: Expr,
		right: Expr,
		condition: Option<Expr>,
		how: JoinHow,
	},
	/// Row of one side inside a join condition
	JoinRow(JoinSide),
}

impl Node {
	/// Direct children in evaluation order.
	pub fn children(&self) -> Vec<&Expr> {
		match self {
			Node::Input
			| Node::Constant(_)
			| Node::Parameter(_)
			| Node::LabelRef(_)
			| Node::JoinRow(_)
			| Node::Caught => vec![],
			Node::Access {
				source,
				path,
				default,
			} => {
				let mut out = vec![source];
				for step in path {
					if let PathStep::Key(key) = step {
						out.push(key);
					}
				}
				out.extend(default.iter());
				out
			}
			Node::Call {
				args,
				..
			}
			| Node::Builtin {
				args,
				..
			} => args.iter().collect(),
			Node::Binary {
				left,
				right,
				..
			} => vec![left, right],
			Node::Unary {
				operand,
				..
			} => vec![operand],
			Node::And(items)
			| Node::Or(items)
			| Node::Collection {
				items,
				..
			} => items.iter().collect(),
			Node::Dict(pairs) => pairs.iter().flat_map(|(k, v)| [k, v]).collect(),
			Node::Comprehension {
				key,
				element,
				source,
				filter,
				..
			} => {
				let mut out = vec![source];
				out.extend(filter.iter());
				out.extend(key.iter());
				out.push(element);
				out
			}
			Node::Sort {
				source,
				keys,
				..
			} => {
				let mut out = vec![source];
				out.extend(keys.iter().map(|k| &k.expr));
				out
			}
			Node::Try {
				expr,
				handlers,
			} => {
				let mut out = vec![expr];
				for handler in handlers {
					out.extend(handler.reraise_if.iter());
					out.push(&handler.value);
				}
				out
			}
			Node::Conditional {
				condition,
				then,
				otherwise,
			} => vec![condition, then, otherwise],
			Node::Pipe {
				producer,
				consumer,
			} => vec![producer, consumer],
			Node::Label {
				expr,
				..
			} => vec![expr],
			Node::Reducer(reducer) => reducer.children(),
			Node::Aggregate {
				keys,
				output,
			} => {
				let mut out: Vec<&Expr> = keys.iter().collect();
				out.push(output);
				out
			}
			Node::Join {
				left,
				right,
				condition,
				..
			} => {
				let mut out = vec![left, right];
				out.extend(condition.iter());
				out
			}
		}
	}

	/// Short lowercase name, used in diagnostics.
	pub fn kind_name(&self) -> &'static str {
		match self {
			Node::Input => "input",
			Node::Access {
				..
			} => "access",
			Node::Constant(_) => "constant",
			Node::Parameter(_) => "parameter",
			Node::Call {
				..
			} => "call",
			Node::Builtin {
				..
			} => "builtin",
			Node::Binary {
				..
			} => "binary",
			Node::Unary {
				..
			} => "unary",
			Node::And(_) => "and",
			Node::Or(_) => "or",
			Node::Collection {
				..
			} => "collection",
			Node::Dict(_) => "dict",
			Node::Comprehension {
				..
			} => "comprehension",
			Node::Sort {
				..
			} => "sort",
			Node::Try {
				..
			} => "try",
			Node::Caught => "caught error",
			Node::Conditional {
				..
			} => "conditional",
			Node::Pipe {
				..
			} => "pipe",
			Node::Label {
				..
			} => "label",
			Node::LabelRef(_) => "label reference",
			Node::Reducer(_) => "reducer",
			Node::Aggregate {
				..
			} => "aggregate",
			Node::Join {
				..
			} => "join",
			Node::JoinRow(_) => "join row",
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{naive, this};

	#[test]
	fn test_structural_equality() {
		let a = this().item("x") + naive(1);
		let b = this().item("x") + naive(1);
		assert_eq!(a, b);
		assert!(!a.ptr_eq(&b));
		assert!(a.ptr_eq(&a.clone()));
	}

	#[test]
	fn test_children_order() {
		let expr = this().item_or("a", naive(0));
		let children = expr.node().children();
		assert_eq!(children.len(), 3);
		assert_eq!(*children[0].node(), Node::Input);
		assert_eq!(*children[2].node(), Node::Constant(Value::int(0)));
	}
}
