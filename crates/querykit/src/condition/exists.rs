use crate::error::{QbError, QbResult};
use crate::expr::{Expr, Operand};
use crate::query::Query;

/// `[NOT] EXISTS (sub-query)`.
#[derive(Debug, Clone)]
pub struct ExistsCondition {
    pub operator: String,
    pub query: Box<Query>,
}

impl ExistsCondition {
    pub fn new(operator: impl Into<String>, query: Query) -> Self {
        Self {
            operator: operator.into(),
            query: Box::new(query),
        }
    }

    /// `[query]`.
    pub fn from_definition(operator: &str, operands: Vec<Operand>) -> QbResult<Self> {
        if operands.len() > 1 {
            return Err(QbError::arity(operator, "one operand"));
        }
        match operands.into_iter().next() {
            Some(Operand::Expr(Expr::Query(query))) => Ok(Self {
                operator: operator.to_string(),
                query,
            }),
            _ => Err(QbError::invalid_argument(format!(
                "Sub query for {operator} operator must be a Query object."
            ))),
        }
    }
}
