use crate::error::{QbError, QbResult};
use crate::expr::Operand;

/// Functions taking a variable number of operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Greatest,
    Least,
    /// The operand with the longest string length.
    Longest,
    /// The operand with the shortest string length.
    Shortest,
    /// Union of array operands without duplicates.
    ArrayMerge,
}

impl FunctionKind {
    pub fn name(&self) -> &'static str {
        match self {
            FunctionKind::Greatest => "GREATEST",
            FunctionKind::Least => "LEAST",
            FunctionKind::Longest => "LONGEST",
            FunctionKind::Shortest => "SHORTEST",
            FunctionKind::ArrayMerge => "ARRAY_MERGE",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MultiOperandFunction {
    kind: FunctionKind,
    operands: Vec<Operand>,
    result_type: Option<String>,
}

impl MultiOperandFunction {
    /// Fails when `operands` is empty.
    pub fn new<I, O>(kind: FunctionKind, operands: I) -> QbResult<Self>
    where
        I: IntoIterator<Item = O>,
        O: Into<Operand>,
    {
        let operands: Vec<Operand> = operands.into_iter().map(Into::into).collect();
        if operands.is_empty() {
            return Err(QbError::invalid_argument(format!(
                "{} function requires at least one operand.",
                kind.name()
            )));
        }
        Ok(Self {
            kind,
            operands,
            result_type: None,
        })
    }

    pub fn greatest<I: IntoIterator<Item = O>, O: Into<Operand>>(operands: I) -> QbResult<Self> {
        Self::new(FunctionKind::Greatest, operands)
    }

    pub fn least<I: IntoIterator<Item = O>, O: Into<Operand>>(operands: I) -> QbResult<Self> {
        Self::new(FunctionKind::Least, operands)
    }

    pub fn longest<I: IntoIterator<Item = O>, O: Into<Operand>>(operands: I) -> QbResult<Self> {
        Self::new(FunctionKind::Longest, operands)
    }

    pub fn shortest<I: IntoIterator<Item = O>, O: Into<Operand>>(operands: I) -> QbResult<Self> {
        Self::new(FunctionKind::Shortest, operands)
    }

    pub fn array_merge<I: IntoIterator<Item = O>, O: Into<Operand>>(operands: I) -> QbResult<Self> {
        Self::new(FunctionKind::ArrayMerge, operands)
    }

    /// Copy with an explicit result type (used as a cast where the dialect supports it).
    pub fn with_result_type(mut self, ty: impl Into<String>) -> Self {
        self.result_type = Some(ty.into());
        self
    }

    pub fn kind(&self) -> FunctionKind {
        self.kind
    }

    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    pub fn result_type(&self) -> Option<&str> {
        self.result_type.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_operands_fail_at_construction() {
        let err = MultiOperandFunction::greatest(Vec::<i32>::new()).unwrap_err();
        assert_eq!(err.to_string(), "GREATEST function requires at least one operand.");
        let err = MultiOperandFunction::array_merge(Vec::<Operand>::new()).unwrap_err();
        assert_eq!(err.to_string(), "ARRAY_MERGE function requires at least one operand.");
    }

    #[test]
    fn result_type_is_kept() {
        let f = MultiOperandFunction::least([1, 2]).unwrap().with_result_type("int");
        assert_eq!(f.kind(), FunctionKind::Least);
        assert_eq!(f.operands().len(), 2);
        assert_eq!(f.result_type(), Some("int"));
    }
}
