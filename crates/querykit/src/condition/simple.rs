use super::column_ref;
use crate::error::{QbError, QbResult};
use crate::expr::{ColumnRef, Operand};

/// `column operator value`.
///
/// A null value renders `column operator NULL`; it is not rewritten to `IS NULL`.
#[derive(Debug, Clone)]
pub struct SimpleCondition {
    pub column: ColumnRef,
    pub operator: String,
    pub value: Operand,
}

impl SimpleCondition {
    pub fn new(
        column: impl Into<ColumnRef>,
        operator: impl Into<String>,
        value: impl Into<Operand>,
    ) -> Self {
        Self {
            column: column.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }

    /// `[column, value]`.
    pub fn from_definition(operator: &str, operands: Vec<Operand>) -> QbResult<Self> {
        if operands.len() != 2 {
            return Err(QbError::arity(operator, "two operands"));
        }
        let mut operands = operands.into_iter();
        let column = operands.next().unwrap_or(Operand::Null);
        let value = operands.next().unwrap_or(Operand::Null);
        Ok(Self {
            column: column_ref(operator, column, "column")?,
            operator: operator.to_string(),
            value,
        })
    }
}

/// Conjunction of `column = value` checks.
///
/// A null value renders `IS NULL`; a list or sub-query renders `IN`.
#[derive(Debug, Clone, Default)]
pub struct HashCondition {
    pub pairs: Vec<(String, Operand)>,
}

impl HashCondition {
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Operand>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
