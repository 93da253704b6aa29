use crate::{
    model::FieldRef,
    operator::{self as op, Operator},
    value::{FieldValue, Value},
};
use std::ops::{BitAnd, BitOr};

mod encode;

pub use encode::{EncodeError, decode, encode};

///
/// Predicate IR
///
/// Pure representation of filter expressions. This layer carries no dialect
/// knowledge; quoting, placeholders, and symbol spellings all live in the
/// compilers.
///

///
/// Expr
///
/// One operand position inside a predicate: a literal parameter, a column
/// reference, or a nested predicate (computed column or logic subtree).
///

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Value(Value),
    Field(FieldRef),
    Pred(Predicate),
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<FieldRef> for Expr {
    fn from(field: FieldRef) -> Self {
        Self::Field(field)
    }
}

impl From<&FieldRef> for Expr {
    fn from(field: &FieldRef) -> Self {
        Self::Field(field.clone())
    }
}

impl From<Predicate> for Expr {
    fn from(pred: Predicate) -> Self {
        Self::Pred(pred)
    }
}

macro_rules! impl_expr_from_scalar {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Expr {
                fn from(value: $ty) -> Self {
                    Self::Value(value.to_value())
                }
            }
        )*
    };
}

impl_expr_from_scalar!(bool, i32, i64, u32, u64, f64, &str, String);

///
/// Predicate
///
/// An operator applied to ordered operands. Logic predicates are n-ary;
/// comparisons and arithmetic are binary by construction, but the compilers
/// re-check arity because predicates also arrive from documents.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Predicate {
    pub op: Operator,
    pub values: Vec<Expr>,
}

impl Predicate {
    #[must_use]
    pub const fn new(op: Operator, values: Vec<Expr>) -> Self {
        Self { op, values }
    }
}

// `a & b | c` reads as infix and/or; both route through the flattening
// constructors.

impl BitAnd for Predicate {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        and_([self, rhs])
    }
}

impl BitOr for Predicate {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        or_([self, rhs])
    }
}

fn binary(op: Operator, lhs: Expr, rhs: Expr) -> Predicate {
    Predicate::new(op, vec![lhs, rhs])
}

#[must_use]
pub fn eq(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Predicate {
    binary(op::EQ, lhs.into(), rhs.into())
}

#[must_use]
pub fn ne(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Predicate {
    binary(op::NE, lhs.into(), rhs.into())
}

#[must_use]
pub fn gt(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Predicate {
    binary(op::GT, lhs.into(), rhs.into())
}

#[must_use]
pub fn gte(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Predicate {
    binary(op::GTE, lhs.into(), rhs.into())
}

#[must_use]
pub fn lt(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Predicate {
    binary(op::LT, lhs.into(), rhs.into())
}

#[must_use]
pub fn lte(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Predicate {
    binary(op::LTE, lhs.into(), rhs.into())
}

/// Membership test. The candidates become one `Value::List` parameter,
/// order and duplicates preserved.
#[must_use]
pub fn in_(lhs: impl Into<Expr>, values: impl IntoIterator<Item = impl FieldValue>) -> Predicate {
    let list = Value::List(values.into_iter().map(|v| v.to_value()).collect());

    binary(op::IN, lhs.into(), Expr::Value(list))
}

#[must_use]
pub fn nin(lhs: impl Into<Expr>, values: impl IntoIterator<Item = impl FieldValue>) -> Predicate {
    let list = Value::List(values.into_iter().map(|v| v.to_value()).collect());

    binary(op::NIN, lhs.into(), Expr::Value(list))
}

#[must_use]
pub fn matches(lhs: impl Into<Expr>, pattern: impl Into<String>) -> Predicate {
    binary(op::REGEX, lhs.into(), Expr::Value(Value::Text(pattern.into())))
}

#[must_use]
pub fn add(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Predicate {
    binary(op::ADD, lhs.into(), rhs.into())
}

#[must_use]
pub fn sub(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Predicate {
    binary(op::SUB, lhs.into(), rhs.into())
}

#[must_use]
pub fn mul(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Predicate {
    binary(op::MUL, lhs.into(), rhs.into())
}

#[must_use]
pub fn truediv(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Predicate {
    binary(op::TRUEDIV, lhs.into(), rhs.into())
}

#[must_use]
pub fn floordiv(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Predicate {
    binary(op::FLOORDIV, lhs.into(), rhs.into())
}

#[must_use]
pub fn rem(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Predicate {
    binary(op::MOD, lhs.into(), rhs.into())
}

/// Conjunction. A child that is itself an `$and` predicate is spliced in
/// rather than nested, so chained conjunction stays one level deep.
#[must_use]
pub fn and_(items: impl IntoIterator<Item = impl Into<Expr>>) -> Predicate {
    nary(op::AND, items)
}

/// Disjunction, with the same one-level flattening as [`and_`].
#[must_use]
pub fn or_(items: impl IntoIterator<Item = impl Into<Expr>>) -> Predicate {
    nary(op::OR, items)
}

fn nary(op: Operator, items: impl IntoIterator<Item = impl Into<Expr>>) -> Predicate {
    let mut values = Vec::new();
    for item in items {
        match item.into() {
            Expr::Pred(child) if child.op == op => values.extend(child.values),
            other => values.push(other),
        }
    }

    Predicate::new(op, values)
}
