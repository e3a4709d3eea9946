use crate::error::{QbError, QbResult};
use crate::expr::Operand;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConjunctionOp {
    And,
    Or,
}

impl ConjunctionOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConjunctionOp::And => "AND",
            ConjunctionOp::Or => "OR",
        }
    }
}

/// `(a) AND (b) ...` / `(a) OR (b) ...`.
///
/// Children that compile to nothing are dropped; a single survivor is emitted without
/// parentheses, and no survivors make the whole conjunction vanish.
#[derive(Debug, Clone)]
pub struct Conjunction {
    pub operator: ConjunctionOp,
    pub expressions: Vec<Operand>,
}

impl Conjunction {
    pub fn and<I, O>(expressions: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<Operand>,
    {
        Self {
            operator: ConjunctionOp::And,
            expressions: expressions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn or<I, O>(expressions: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<Operand>,
    {
        Self {
            operator: ConjunctionOp::Or,
            expressions: expressions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_definition(operator: &str, operands: Vec<Operand>) -> QbResult<Self> {
        let operator = if operator.eq_ignore_ascii_case("OR") {
            ConjunctionOp::Or
        } else {
            ConjunctionOp::And
        };
        Ok(Self {
            operator,
            expressions: operands,
        })
    }
}

/// `NOT (condition)`. Negating an empty condition yields an empty condition.
#[derive(Debug, Clone)]
pub struct NotCondition {
    pub condition: Operand,
}

impl NotCondition {
    pub fn new(condition: impl Into<Operand>) -> Self {
        Self {
            condition: condition.into(),
        }
    }

    /// `[condition]`.
    pub fn from_definition(operator: &str, operands: Vec<Operand>) -> QbResult<Self> {
        if operands.len() != 1 {
            return Err(QbError::arity(operator, "exactly one operand"));
        }
        let condition = operands.into_iter().next().unwrap_or(Operand::Null);
        match condition {
            Operand::Value(Value::String(_))
            | Operand::Null
            | Operand::List(_)
            | Operand::Where(_)
            | Operand::Expr(_) => Ok(Self { condition }),
            Operand::Value(_) => Err(QbError::invalid_argument(format!(
                "Operator '{operator}' requires condition to be array, string, null or Expression."
            ))),
        }
    }
}
