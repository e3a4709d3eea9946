use crate::error::{QbError, QbResult};
use crate::expr::Operand;

/// One `WHEN condition THEN result` branch.
#[derive(Debug, Clone)]
pub struct WhenThen {
    pub when: Operand,
    pub then: Operand,
}

impl WhenThen {
    pub fn new(when: impl Into<Operand>, then: impl Into<Operand>) -> Self {
        Self {
            when: when.into(),
            then: then.into(),
        }
    }
}

/// Constructor argument of [`CaseX`]: a branch or the `ELSE` result.
#[derive(Debug, Clone)]
pub enum CaseArg {
    When(WhenThen),
    Else(Operand),
}

impl From<WhenThen> for CaseArg {
    fn from(w: WhenThen) -> Self {
        CaseArg::When(w)
    }
}

/// `CASE [subject] WHEN .. THEN .. [ELSE ..] END`.
#[derive(Debug, Clone)]
pub struct CaseX {
    subject: Option<Operand>,
    when_then: Vec<WhenThen>,
    else_result: Option<Operand>,
}

impl CaseX {
    /// Build a CASE expression from its branches.
    ///
    /// Fails when there is no `WHEN` branch or more than one `ELSE` result.
    pub fn new<I>(subject: Option<Operand>, args: I) -> QbResult<Self>
    where
        I: IntoIterator<Item = CaseArg>,
    {
        let mut when_then = Vec::new();
        let mut else_result = None;
        for arg in args {
            match arg {
                CaseArg::When(w) => when_then.push(w),
                CaseArg::Else(_) if else_result.is_some() => {
                    return Err(QbError::invalid_argument(
                        "CASE expression can have only one \"else\" value.",
                    ));
                }
                CaseArg::Else(v) => else_result = Some(v),
            }
        }
        if when_then.is_empty() {
            return Err(QbError::invalid_argument(
                "CASE expression must have at least one WHEN clause.",
            ));
        }
        Ok(Self {
            subject,
            when_then,
            else_result,
        })
    }

    pub fn subject(&self) -> Option<&Operand> {
        self.subject.as_ref()
    }

    pub fn when_then(&self) -> &[WhenThen] {
        &self.when_then
    }

    pub fn else_result(&self) -> Option<&Operand> {
        self.else_result.as_ref()
    }

    /// Copy with an extra branch appended.
    pub fn with_when(mut self, when: WhenThen) -> Self {
        self.when_then.push(when);
        self
    }

    /// Copy with the `ELSE` result replaced.
    pub fn with_else(mut self, result: impl Into<Operand>) -> Self {
        self.else_result = Some(result.into());
        self
    }
}
