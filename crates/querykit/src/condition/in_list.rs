use super::require_operands;
use crate::error::{QbError, QbResult};
use crate::expr::{ColumnRef, Expr, Operand};
use crate::query::Query;
use crate::value::Value;

/// Left-hand side of `IN`: one column or a composite key.
#[derive(Debug, Clone)]
pub enum InColumns {
    Single(ColumnRef),
    Composite(Vec<ColumnRef>),
}

impl From<&str> for InColumns {
    fn from(v: &str) -> Self {
        InColumns::Single(v.into())
    }
}

impl From<String> for InColumns {
    fn from(v: String) -> Self {
        InColumns::Single(v.into())
    }
}

impl From<Expr> for InColumns {
    fn from(v: Expr) -> Self {
        InColumns::Single(v.into())
    }
}

impl From<ColumnRef> for InColumns {
    fn from(v: ColumnRef) -> Self {
        InColumns::Single(v)
    }
}

impl<S: Into<String>> From<Vec<S>> for InColumns {
    fn from(v: Vec<S>) -> Self {
        InColumns::Composite(v.into_iter().map(|c| ColumnRef::Name(c.into())).collect())
    }
}

/// Right-hand side of `IN`.
///
/// For composite columns each list item is a positional row (`Operand::List`).
#[derive(Debug, Clone)]
pub enum InValues {
    List(Vec<Operand>),
    /// A sub-query or any other expression, rendered as `(sql)`.
    Expr(Expr),
}

impl<T: Into<Operand>> From<Vec<T>> for InValues {
    fn from(v: Vec<T>) -> Self {
        InValues::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Operand>, const N: usize> From<[T; N]> for InValues {
    fn from(v: [T; N]) -> Self {
        InValues::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<Query> for InValues {
    fn from(q: Query) -> Self {
        InValues::Expr(Expr::query(q))
    }
}

impl From<Expr> for InValues {
    fn from(e: Expr) -> Self {
        InValues::Expr(e)
    }
}

/// `column [NOT] IN (values)`.
#[derive(Debug, Clone)]
pub struct InCondition {
    pub columns: InColumns,
    pub operator: String,
    pub values: InValues,
}

impl InCondition {
    pub fn new(
        columns: impl Into<InColumns>,
        operator: impl Into<String>,
        values: impl Into<InValues>,
    ) -> Self {
        Self {
            columns: columns.into(),
            operator: operator.into(),
            values: values.into(),
        }
    }

    pub fn is_negated(&self) -> bool {
        self.operator.eq_ignore_ascii_case("NOT IN")
    }

    /// `[columns, values]`.
    pub fn from_definition(operator: &str, operands: Vec<Operand>) -> QbResult<Self> {
        let mut operands = require_operands(operator, operands, 2, "two operands")?.into_iter();
        let column = operands.next().unwrap_or(Operand::Null);
        let values = operands.next().unwrap_or(Operand::Null);
        Ok(Self {
            columns: in_columns(operator, column)?,
            operator: operator.to_string(),
            values: in_values(operator, values)?,
        })
    }
}

fn in_columns(operator: &str, operand: Operand) -> QbResult<InColumns> {
    let invalid = || {
        QbError::invalid_argument(format!(
            "Operator '{operator}' requires column to be string, array or Expression."
        ))
    };
    match operand {
        Operand::Value(Value::String(name)) => Ok(InColumns::Single(ColumnRef::Name(name))),
        Operand::Expr(expr) => Ok(InColumns::Single(ColumnRef::Expr(expr))),
        Operand::List(items) => {
            let mut columns = items
                .into_iter()
                .map(|item| match item {
                    Operand::Value(Value::String(name)) => Ok(ColumnRef::Name(name)),
                    Operand::Expr(expr) => Ok(ColumnRef::Expr(expr)),
                    _ => Err(invalid()),
                })
                .collect::<QbResult<Vec<_>>>()?;
            if columns.len() == 1 {
                Ok(InColumns::Single(columns.remove(0)))
            } else {
                Ok(InColumns::Composite(columns))
            }
        }
        _ => Err(invalid()),
    }
}

fn in_values(operator: &str, operand: Operand) -> QbResult<InValues> {
    match operand {
        Operand::List(items) => Ok(InValues::List(items)),
        Operand::Expr(expr) => Ok(InValues::Expr(expr)),
        _ => Err(QbError::invalid_argument(format!(
            "Operator '{operator}' requires values to be array, Iterator or Expression."
        ))),
    }
}
