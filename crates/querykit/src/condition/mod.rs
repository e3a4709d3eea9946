//! Condition model.
//!
//! Each predicate shape is a struct with a `from_definition(operator, operands)` constructor
//! used by the operator-format DSL (`cond![">", "age", 18]`). Constructors validate arity
//! and operand shapes and fail before any SQL is produced.

mod between;
mod exists;
mod in_list;
mod like;
mod logic;
mod overlap;
mod simple;

use std::sync::Arc;

pub use between::{BetweenColumnsCondition, BetweenCondition};
pub use exists::ExistsCondition;
pub use in_list::{InColumns, InCondition, InValues};
pub use like::{LikeCondition, LikeEscaping};
pub(crate) use like::escape_like;
pub use logic::{Conjunction, ConjunctionOp, NotCondition};
pub use overlap::{OverlapCondition, OverlapKind};
pub use simple::{HashCondition, SimpleCondition};

use crate::error::{QbError, QbResult};
use crate::expr::{ColumnRef, CustomExpression, Operand};
use crate::value::Value;

/// A boolean predicate.
#[derive(Debug, Clone)]
pub enum Condition {
    Simple(SimpleCondition),
    Hash(HashCondition),
    In(InCondition),
    Like(LikeCondition),
    Between(BetweenCondition),
    BetweenColumns(BetweenColumnsCondition),
    Conjunction(Conjunction),
    Not(NotCondition),
    Exists(ExistsCondition),
    Overlap(OverlapCondition),
    /// A caller-defined predicate, rendered by the builder registered for its kind.
    Custom(Arc<dyn CustomExpression>),
}

macro_rules! impl_condition_from {
    ($($variant:ident($ty:ty)),+ $(,)?) => {
        $(
            impl From<$ty> for Condition {
                fn from(c: $ty) -> Self {
                    Condition::$variant(c)
                }
            }
        )+
    };
}

impl_condition_from!(
    Simple(SimpleCondition),
    Hash(HashCondition),
    In(InCondition),
    Like(LikeCondition),
    Between(BetweenCondition),
    BetweenColumns(BetweenColumnsCondition),
    Conjunction(Conjunction),
    Not(NotCondition),
    Exists(ExistsCondition),
    Overlap(OverlapCondition),
);

/// Check that the first `count` operands are present and not null.
pub(crate) fn require_operands(
    operator: &str,
    operands: Vec<Operand>,
    count: usize,
    expected: &str,
) -> QbResult<Vec<Operand>> {
    if operands.len() < count || operands[..count].iter().any(Operand::is_null) {
        return Err(QbError::arity(operator, expected));
    }
    Ok(operands)
}

/// Interpret an operand in column position.
pub(crate) fn column_ref(operator: &str, operand: Operand, what: &str) -> QbResult<ColumnRef> {
    match operand {
        Operand::Value(Value::String(name)) => Ok(ColumnRef::Name(name)),
        Operand::Expr(expr) => Ok(ColumnRef::Expr(expr)),
        _ => Err(QbError::invalid_argument(format!(
            "Operator '{operator}' requires {what} to be string or Expression."
        ))),
    }
}
