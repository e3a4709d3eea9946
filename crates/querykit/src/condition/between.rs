use super::{column_ref, require_operands};
use crate::error::QbResult;
use crate::expr::{ColumnRef, Operand};

/// `column [NOT] BETWEEN start AND end`.
#[derive(Debug, Clone)]
pub struct BetweenCondition {
    pub column: ColumnRef,
    pub operator: String,
    pub start: Operand,
    pub end: Operand,
}

impl BetweenCondition {
    pub fn new(
        column: impl Into<ColumnRef>,
        operator: impl Into<String>,
        start: impl Into<Operand>,
        end: impl Into<Operand>,
    ) -> Self {
        Self {
            column: column.into(),
            operator: operator.into(),
            start: start.into(),
            end: end.into(),
        }
    }

    /// `[column, start, end]`.
    pub fn from_definition(operator: &str, operands: Vec<Operand>) -> QbResult<Self> {
        let mut operands = require_operands(operator, operands, 3, "three operands")?.into_iter();
        let column = column_ref(operator, operands.next().unwrap_or(Operand::Null), "column")?;
        Ok(Self {
            column,
            operator: operator.to_string(),
            start: operands.next().unwrap_or(Operand::Null),
            end: operands.next().unwrap_or(Operand::Null),
        })
    }
}

/// `value [NOT] BETWEEN start_column AND end_column`.
#[derive(Debug, Clone)]
pub struct BetweenColumnsCondition {
    pub value: Operand,
    pub operator: String,
    pub start_column: ColumnRef,
    pub end_column: ColumnRef,
}

impl BetweenColumnsCondition {
    pub fn new(
        value: impl Into<Operand>,
        operator: impl Into<String>,
        start_column: impl Into<ColumnRef>,
        end_column: impl Into<ColumnRef>,
    ) -> Self {
        Self {
            value: value.into(),
            operator: operator.into(),
            start_column: start_column.into(),
            end_column: end_column.into(),
        }
    }

    /// `[value, start_column, end_column]`.
    pub fn from_definition(operator: &str, operands: Vec<Operand>) -> QbResult<Self> {
        let mut operands = require_operands(operator, operands, 3, "three operands")?.into_iter();
        let value = operands.next().unwrap_or(Operand::Null);
        let start_column = column_ref(
            operator,
            operands.next().unwrap_or(Operand::Null),
            "interval start column",
        )?;
        let end_column = column_ref(
            operator,
            operands.next().unwrap_or(Operand::Null),
            "interval end column",
        )?;
        Ok(Self {
            value,
            operator: operator.to_string(),
            start_column,
            end_column,
        })
    }
}
