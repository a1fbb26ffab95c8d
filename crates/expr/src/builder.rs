// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Programmatic construction of expressions.

use std::ops;

use conduit_type::{ErrorKind, Function, IntoValue, Value};

use crate::{
	BinaryOp, Builtin, CollectionKind, ComprehensionKind, Expr, Handler, JoinHow, JoinSide, Node, NullOrder,
	PathStep, SortKey, UnaryOp,
};

/// The current input.
pub fn this() -> Expr {
	Expr::new(Node::Input)
}

/// A constant; external objects and callables keep their identity.
pub fn naive(value: impl IntoValue) -> Expr {
	Expr::new(Node::Constant(value.into_value()))
}

/// A call-time parameter.
pub fn param(name: impl Into<String>) -> Expr {
	Expr::new(Node::Parameter(name.into()))
}

/// Reads the value stored by [`Expr::label_as`].
pub fn label(name: impl Into<String>) -> Expr {
	Expr::new(Node::LabelRef(name.into()))
}

pub fn call(function: &Function, args: impl IntoIterator<Item = Expr>) -> Expr {
	Expr::new(Node::Call {
		function: function.clone(),
		args: args.into_iter().collect(),
	})
}

pub fn builtin(op: Builtin, args: impl IntoIterator<Item = Expr>) -> Expr {
	Expr::new(Node::Builtin {
		op,
		args: args.into_iter().collect(),
	})
}

pub fn list(items: impl IntoIterator<Item = Expr>) -> Expr {
	collection(CollectionKind::List, items)
}

pub fn tuple(items: impl IntoIterator<Item = Expr>) -> Expr {
	collection(CollectionKind::Tuple, items)
}

pub fn set(items: impl IntoIterator<Item = Expr>) -> Expr {
	collection(CollectionKind::Set, items)
}

fn collection(kind: CollectionKind, items: impl IntoIterator<Item = Expr>) -> Expr {
	Expr::new(Node::Collection {
		kind,
		items: items.into_iter().collect(),
	})
}

pub fn dict(pairs: impl IntoIterator<Item = (Expr, Expr)>) -> Expr {
	Expr::new(Node::Dict(pairs.into_iter().collect()))
}

/// `then` if `condition` is truthy, otherwise `otherwise`.
pub fn cond(condition: impl Into<Expr>, then: impl Into<Expr>, otherwise: impl Into<Expr>) -> Expr {
	Expr::new(Node::Conditional {
		condition: condition.into(),
		then: then.into(),
		otherwise: otherwise.into(),
	})
}

pub fn and(items: impl IntoIterator<Item = Expr>) -> Expr {
	Expr::new(Node::And(items.into_iter().collect()))
}

pub fn or(items: impl IntoIterator<Item = Expr>) -> Expr {
	Expr::new(Node::Or(items.into_iter().collect()))
}

/// Guards `expr` against runtime errors; handlers are added with
/// [`Expr::except_`]. Without handlers errors propagate unchanged.
pub fn try_(expr: impl Into<Expr>) -> Expr {
	Expr::new(Node::Try {
		expr: expr.into(),
		handlers: Vec::new(),
	})
}

/// Message of the error caught by the enclosing `except_` handler.
pub fn caught() -> Expr {
	Expr::new(Node::Caught)
}

/// Left row inside a join condition.
pub fn left() -> Expr {
	Expr::new(Node::JoinRow(JoinSide::Left))
}

/// Right row inside a join condition.
pub fn right() -> Expr {
	Expr::new(Node::JoinRow(JoinSide::Right))
}

/// Pairs of `(left, right)` rows satisfying `condition`; no condition means a
/// cross product.
pub fn join(left: impl Into<Expr>, right: impl Into<Expr>, condition: Option<Expr>, how: JoinHow) -> Expr {
	Expr::new(Node::Join {
		left: left.into(),
		right: right.into(),
		condition,
		how,
	})
}

/// Ungrouped aggregate over the current input: one output value.
pub fn aggregate(output: impl Into<Expr>) -> Expr {
	Expr::new(Node::Aggregate {
		keys: vec![],
		output: output.into(),
	})
}

pub fn group_by(keys: impl IntoIterator<Item = Expr>) -> GroupBy {
	GroupBy {
		keys: keys.into_iter().collect(),
	}
}

/// Group keys awaiting their aggregate output.
pub struct GroupBy {
	keys: Vec<Expr>,
}

impl GroupBy {
	/// Grouped aggregate: one output per distinct key tuple, in first-seen order.
	pub fn aggregate(self, output: impl Into<Expr>) -> Expr {
		Expr::new(Node::Aggregate {
			keys: self.keys,
			output: output.into(),
		})
	}
}

impl Expr {
	pub fn item(&self, key: impl Into<Expr>) -> Expr {
		self.path(vec![PathStep::Key(key.into())], None)
	}

	/// `self[key]`, or `default` when the lookup fails.
	pub fn item_or(&self, key: impl Into<Expr>, default: impl Into<Expr>) -> Expr {
		self.path(vec![PathStep::Key(key.into())], Some(default.into()))
	}

	pub fn attr(&self, name: impl Into<String>) -> Expr {
		self.path(vec![PathStep::Attr(name.into())], None)
	}

	pub fn attr_or(&self, name: impl Into<String>, default: impl Into<Expr>) -> Expr {
		self.path(vec![PathStep::Attr(name.into())], Some(default.into()))
	}

	/// Multi-step access with one default covering any failed step.
	pub fn path(&self, path: Vec<PathStep>, default: Option<Expr>) -> Expr {
		Expr::new(Node::Access {
			source: self.clone(),
			path,
			default,
		})
	}

	pub fn binary(&self, op: BinaryOp, other: impl Into<Expr>) -> Expr {
		Expr::new(Node::Binary {
			op,
			left: self.clone(),
			right: other.into(),
		})
	}

	pub fn equals(&self, other: impl Into<Expr>) -> Expr {
		self.binary(BinaryOp::Eq, other)
	}

	pub fn not_equals(&self, other: impl Into<Expr>) -> Expr {
		self.binary(BinaryOp::NotEq, other)
	}

	pub fn lt(&self, other: impl Into<Expr>) -> Expr {
		self.binary(BinaryOp::Lt, other)
	}

	pub fn lte(&self, other: impl Into<Expr>) -> Expr {
		self.binary(BinaryOp::LtE, other)
	}

	pub fn gt(&self, other: impl Into<Expr>) -> Expr {
		self.binary(BinaryOp::Gt, other)
	}

	pub fn gte(&self, other: impl Into<Expr>) -> Expr {
		self.binary(BinaryOp::GtE, other)
	}

	/// `self in container`
	pub fn is_in(&self, container: impl Into<Expr>) -> Expr {
		self.binary(BinaryOp::In, container)
	}

	pub fn not_in(&self, container: impl Into<Expr>) -> Expr {
		self.binary(BinaryOp::NotIn, container)
	}

	pub fn is_null(&self) -> Expr {
		self.unary(UnaryOp::IsNull)
	}

	pub fn is_not_null(&self) -> Expr {
		self.unary(UnaryOp::IsNotNull)
	}

	fn unary(&self, op: UnaryOp) -> Expr {
		Expr::new(Node::Unary {
			op,
			operand: self.clone(),
		})
	}

	/// Builtin with `self` as the receiver.
	pub fn method(&self, op: Builtin, args: impl IntoIterator<Item = Expr>) -> Expr {
		let mut all = vec![self.clone()];
		all.extend(args);
		builtin(op, all)
	}

	pub fn len(&self) -> Expr {
		self.method(Builtin::Len, [])
	}

	/// Evaluates `consumer` with this expression's result as its input.
	pub fn pipe(&self, consumer: impl Into<Expr>) -> Expr {
		Expr::new(Node::Pipe {
			producer: self.clone(),
			consumer: consumer.into(),
		})
	}

	/// Stores the result under `name` for [`label`] references and passes it on.
	pub fn label_as(&self, name: impl Into<String>) -> Expr {
		Expr::new(Node::Label {
			name: name.into(),
			expr: self.clone(),
		})
	}

	pub fn comprehend(
		&self,
		kind: ComprehensionKind,
		key: Option<Expr>,
		element: impl Into<Expr>,
		filter: Option<Expr>,
	) -> Expr {
		Expr::new(Node::Comprehension {
			kind,
			key,
			element: element.into(),
			source: self.clone(),
			filter,
		})
	}

	/// Lazy map over the elements of this expression.
	pub fn iter(&self, element: impl Into<Expr>) -> Expr {
		self.comprehend(ComprehensionKind::Iter, None, element, None)
	}

	/// Lazy filter keeping elements for which `condition` is truthy.
	pub fn filter(&self, condition: impl Into<Expr>) -> Expr {
		self.comprehend(ComprehensionKind::Iter, None, this(), Some(condition.into()))
	}

	pub fn list_comp(&self, element: impl Into<Expr>) -> Expr {
		self.comprehend(ComprehensionKind::List, None, element, None)
	}

	pub fn tuple_comp(&self, element: impl Into<Expr>) -> Expr {
		self.comprehend(ComprehensionKind::Tuple, None, element, None)
	}

	pub fn set_comp(&self, element: impl Into<Expr>) -> Expr {
		self.comprehend(ComprehensionKind::Set, None, element, None)
	}

	pub fn dict_comp(&self, key: impl Into<Expr>, value: impl Into<Expr>) -> Expr {
		self.comprehend(ComprehensionKind::Dict, Some(key.into()), value, None)
	}

	/// Adds a row filter to a comprehension or reducer.
	///
	/// # Panics
	///
	/// Panics when called on any other node.
	pub fn where_(&self, condition: impl Into<Expr>) -> Expr {
		let condition = condition.into();
		match self.node() {
			Node::Comprehension {
				kind,
				key,
				element,
				source,
				..
			} => Expr::new(Node::Comprehension {
				kind: *kind,
				key: key.clone(),
				element: element.clone(),
				source: source.clone(),
				filter: Some(condition),
			}),
			Node::Reducer(reducer) => {
				let mut reducer = reducer.clone();
				reducer.filter = Some(condition);
				Expr::new(Node::Reducer(reducer))
			}
			other => panic!("where_ is not supported on {}", other.kind_name()),
		}
	}

	/// Value reported by a reducer (or an access) when nothing qualified.
	///
	/// # Panics
	///
	/// Panics when called on anything but a reducer or an access.
	pub fn or_default(&self, default: impl Into<Expr>) -> Expr {
		let default = default.into();
		match self.node() {
			Node::Reducer(reducer) => {
				let mut reducer = reducer.clone();
				reducer.default = Some(default);
				Expr::new(Node::Reducer(reducer))
			}
			Node::Access {
				source,
				path,
				..
			} => source.path(path.clone(), Some(default)),
			other => panic!("or_default is not supported on {}", other.kind_name()),
		}
	}

	/// Starting accumulator of a reducer.
	///
	/// # Panics
	///
	/// Panics when called on anything but a reducer.
	pub fn initial(&self, initial: impl Into<Expr>) -> Expr {
		match self.node() {
			Node::Reducer(reducer) => {
				let mut reducer = reducer.clone();
				reducer.initial = Some(initial.into());
				Expr::new(Node::Reducer(reducer))
			}
			other => panic!("initial is not supported on {}", other.kind_name()),
		}
	}

	pub fn sort(&self, key: Option<Expr>, reverse: bool) -> Expr {
		self.sort_by(key, reverse)
	}

	/// Sorts by several keys, compared in order; each key carries its own
	/// direction and null placement.
	pub fn sort_by<K: Into<SortKey>>(&self, keys: impl IntoIterator<Item = K>, reverse: bool) -> Expr {
		Expr::new(Node::Sort {
			source: self.clone(),
			keys: keys.into_iter().map(Into::into).collect(),
			reverse,
		})
	}

	pub fn asc(&self) -> SortKey {
		SortKey {
			expr: self.clone(),
			descending: false,
			nulls: NullOrder::Natural,
		}
	}

	pub fn desc(&self) -> SortKey {
		SortKey {
			expr: self.clone(),
			descending: true,
			nulls: NullOrder::Natural,
		}
	}

	/// Returns `value` when this `try_` fails with one of `kinds`; an empty
	/// `kinds` catches everything. Handlers are tried in the order added.
	///
	/// # Panics
	///
	/// Panics when called on anything but [`try_`].
	pub fn except_(&self, kinds: impl IntoIterator<Item = ErrorKind>, value: impl Into<Expr>) -> Expr {
		self.push_handler(Handler {
			kinds: kinds.into_iter().collect(),
			value: value.into(),
			reraise_if: None,
		})
	}

	/// Like [`Expr::except_`], but the error propagates when `reraise_if`
	/// is truthy.
	///
	/// # Panics
	///
	/// Panics when called on anything but [`try_`].
	pub fn except_unless(
		&self,
		kinds: impl IntoIterator<Item = ErrorKind>,
		value: impl Into<Expr>,
		reraise_if: impl Into<Expr>,
	) -> Expr {
		self.push_handler(Handler {
			kinds: kinds.into_iter().collect(),
			value: value.into(),
			reraise_if: Some(reraise_if.into()),
		})
	}

	fn push_handler(&self, handler: Handler) -> Expr {
		match self.node() {
			Node::Try {
				expr,
				handlers,
			} => {
				let mut handlers = handlers.clone();
				handlers.push(handler);
				Expr::new(Node::Try {
					expr: expr.clone(),
					handlers,
				})
			}
			other => panic!("except_ is not supported on {}", other.kind_name()),
		}
	}
}

macro_rules! impl_from_for_expr {
	($($t:ty),*) => {
		$(
			impl From<$t> for Expr {
				fn from(value: $t) -> Self {
					naive(value)
				}
			}
		)*
	};
}

impl_from_for_expr!(Value, bool, i32, i64, u32, usize, f64, &str, String);

impl From<&Expr> for Expr {
	fn from(value: &Expr) -> Self {
		value.clone()
	}
}

macro_rules! impl_binary_operator {
	($trait:ident, $method:ident, $op:expr) => {
		impl<R: Into<Expr>> ops::$trait<R> for Expr {
			type Output = Expr;

			fn $method(self, rhs: R) -> Expr {
				self.binary($op, rhs)
			}
		}
	};
}

impl_binary_operator!(Add, add, BinaryOp::Add);
impl_binary_operator!(Sub, sub, BinaryOp::Sub);
impl_binary_operator!(Mul, mul, BinaryOp::Mul);
impl_binary_operator!(Div, div, BinaryOp::Div);
impl_binary_operator!(Rem, rem, BinaryOp::Mod);

impl ops::Neg for Expr {
	type Output = Expr;

	fn neg(self) -> Expr {
		self.unary(UnaryOp::Neg)
	}
}

impl ops::Not for Expr {
	type Output = Expr;

	fn not(self) -> Expr {
		self.unary(UnaryOp::Not)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_operators_build_binary_nodes() {
		let expr = this().item("a") + 1;
		match expr.node() {
			Node::Binary {
				op,
				right,
				..
			} => {
				assert_eq!(*op, BinaryOp::Add);
				assert_eq!(*right.node(), Node::Constant(Value::int(1)));
			}
			other => panic!("unexpected node {other:?}"),
		}
	}

	#[test]
	fn test_where_on_comprehension() {
		let expr = this().list_comp(this().item("x")).where_(this().item("ok"));
		match expr.node() {
			Node::Comprehension {
				filter,
				kind,
				..
			} => {
				assert_eq!(*kind, ComprehensionKind::List);
				assert!(filter.is_some());
			}
			other => panic!("unexpected node {other:?}"),
		}
	}

	#[test]
	fn test_or_default_on_access() {
		let expr = this().item("a").or_default(0);
		match expr.node() {
			Node::Access {
				default,
				..
			} => assert_eq!(default.as_ref().map(|d| d.node().clone()), Some(Node::Constant(Value::int(0)))),
			other => panic!("unexpected node {other:?}"),
		}
	}

	#[test]
	fn test_sort_keys_keep_direction() {
		let expr = this().sort_by([this().item("a").asc(), this().item("b").desc().nulls_last()], false);
		match expr.node() {
			Node::Sort {
				keys,
				..
			} => {
				assert_eq!(keys.len(), 2);
				assert!(!keys[0].descending);
				assert!(keys[1].descending);
				assert_eq!(keys[1].nulls, NullOrder::Last);
			}
			other => panic!("unexpected node {other:?}"),
		}
	}

	#[test]
	fn test_handlers_accumulate_in_order() {
		let expr = try_(this().item("a"))
			.except_([ErrorKind::KeyNotFound], -1)
			.except_unless(ErrorKind::ANY, caught(), this().is_null());
		match expr.node() {
			Node::Try {
				handlers,
				..
			} => {
				assert_eq!(handlers.len(), 2);
				assert!(handlers[0].catches(ErrorKind::KeyNotFound));
				assert!(!handlers[0].catches(ErrorKind::DivisionByZero));
				assert!(handlers[1].catches(ErrorKind::DivisionByZero));
				assert!(handlers[1].reraise_if.is_some());
			}
			other => panic!("unexpected node {other:?}"),
		}
	}

	#[test]
	#[should_panic(expected = "except_ is not supported on input")]
	fn test_except_outside_try_panics() {
		this().except_(ErrorKind::ANY, 0);
	}

	#[test]
	#[should_panic(expected = "where_ is not supported on input")]
	fn test_where_on_input_panics() {
		this().where_(true);
	}
}
