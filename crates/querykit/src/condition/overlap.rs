use super::{column_ref, require_operands};
use crate::error::{QbError, QbResult};
use crate::expr::{ColumnRef, Operand};

/// Whether the column holds a native array or a JSON array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlapKind {
    Array,
    Json,
}

/// True when the column and the values share at least one element.
#[derive(Debug, Clone)]
pub struct OverlapCondition {
    pub kind: OverlapKind,
    pub column: ColumnRef,
    /// A list of values or an expression producing an array.
    pub values: Operand,
}

impl OverlapCondition {
    pub fn new(kind: OverlapKind, column: impl Into<ColumnRef>, values: impl Into<Operand>) -> Self {
        Self {
            kind,
            column: column.into(),
            values: values.into(),
        }
    }

    /// `[column, values]`.
    pub fn from_definition(kind: OverlapKind, operator: &str, operands: Vec<Operand>) -> QbResult<Self> {
        let mut operands = require_operands(operator, operands, 2, "two operands")?.into_iter();
        let column = column_ref(operator, operands.next().unwrap_or(Operand::Null), "column")?;
        let values = operands.next().unwrap_or(Operand::Null);
        if !matches!(values, Operand::List(_) | Operand::Expr(_)) {
            return Err(QbError::invalid_argument(format!(
                "Operator '{operator}' requires values to be iterable or Expression."
            )));
        }
        Ok(Self {
            kind,
            column,
            values,
        })
    }
}
