use super::{column_ref, require_operands};
use crate::error::{QbError, QbResult};
use crate::expr::{ColumnRef, Operand};
use crate::value::Value;

/// How the value of a LIKE condition is escaped before binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LikeEscaping {
    /// The builder's replacements: `%`, `_` and `\` are backslash-escaped.
    #[default]
    Default,
    /// Custom `from -> to` replacements. The value is still wrapped in `%...%`.
    Custom(Vec<(String, String)>),
    /// The value is bound as given, without escaping or wildcards.
    Disabled,
}

impl LikeEscaping {
    /// Replacements applied by builders that don't override them.
    pub fn default_replacements() -> Vec<(String, String)> {
        vec![
            ("%".to_string(), "\\%".to_string()),
            ("_".to_string(), "\\_".to_string()),
            ("\\".to_string(), "\\\\".to_string()),
        ]
    }
}

/// `column [NOT] [I]LIKE value`, optionally against several values joined by AND/OR.
#[derive(Debug, Clone)]
pub struct LikeCondition {
    pub column: ColumnRef,
    pub operator: String,
    pub values: Vec<Operand>,
    pub escaping: LikeEscaping,
}

impl LikeCondition {
    pub fn new(
        column: impl Into<ColumnRef>,
        operator: impl Into<String>,
        value: impl Into<Operand>,
    ) -> Self {
        let values = match value.into() {
            Operand::List(items) => items,
            other => vec![other],
        };
        Self {
            column: column.into(),
            operator: operator.into(),
            values,
            escaping: LikeEscaping::Default,
        }
    }

    pub fn with_escaping(mut self, escaping: LikeEscaping) -> Self {
        self.escaping = escaping;
        self
    }

    /// `[column, value(s)]` with an optional third operand for escaping:
    /// `false` or an empty list disables it, a list of `[from, to]` pairs replaces it.
    pub fn from_definition(operator: &str, operands: Vec<Operand>) -> QbResult<Self> {
        let mut operands = require_operands(operator, operands, 2, "two operands")?.into_iter();
        let column = column_ref(operator, operands.next().unwrap_or(Operand::Null), "column")?;
        let values = match operands.next().unwrap_or(Operand::Null) {
            Operand::List(items) => items,
            v @ (Operand::Value(_) | Operand::Expr(_)) => vec![v],
            _ => {
                return Err(QbError::invalid_argument(format!(
                    "Operator '{operator}' requires value to be string, array, Iterator or Expression."
                )));
            }
        };
        let escaping = match operands.next() {
            None | Some(Operand::Null) => LikeEscaping::Default,
            Some(escaping) => parse_escaping(operator, escaping)?,
        };
        Ok(Self {
            column,
            operator: operator.to_string(),
            values,
            escaping,
        })
    }
}

fn parse_escaping(operator: &str, operand: Operand) -> QbResult<LikeEscaping> {
    let invalid = || {
        QbError::invalid_argument(format!(
            "Operator '{operator}' requires escaping replacements to be a list of pairs, false or null."
        ))
    };
    match operand {
        Operand::Value(Value::Bool(false)) => Ok(LikeEscaping::Disabled),
        Operand::List(pairs) if pairs.is_empty() => Ok(LikeEscaping::Disabled),
        Operand::List(pairs) => pairs
            .into_iter()
            .map(|pair| match pair {
                Operand::List(items) if items.len() == 2 => {
                    match (items[0].as_str(), items[1].as_str()) {
                        (Some(from), Some(to)) => Ok((from.to_string(), to.to_string())),
                        _ => Err(invalid()),
                    }
                }
                _ => Err(invalid()),
            })
            .collect::<QbResult<Vec<_>>>()
            .map(LikeEscaping::Custom),
        _ => Err(invalid()),
    }
}

/// Apply replacements the way `strtr` does: longest match first, no rescanning of output.
pub(crate) fn escape_like(value: &str, replacements: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> =
        replacements.iter().filter(|(from, _)| !from.is_empty()).collect();
    sorted.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    'outer: while !rest.is_empty() {
        for (from, to) in &sorted {
            if let Some(tail) = rest.strip_prefix(from.as_str()) {
                out.push_str(to);
                rest = tail;
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            out.push(ch);
        }
        rest = chars.as_str();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_escaping_replaces_wildcards_and_backslash() {
        let escaped = escape_like(r"50%_off\", &LikeEscaping::default_replacements());
        assert_eq!(escaped, r"50\%\_off\\");
    }

    #[test]
    fn replacements_do_not_rescan_output() {
        let r = vec![("a".to_string(), "ab".to_string()), ("ab".to_string(), "X".to_string())];
        assert_eq!(escape_like("aab", &r), "abX");
    }

    #[test]
    fn third_operand_controls_escaping() {
        let c = LikeCondition::from_definition(
            "LIKE",
            vec![Operand::from("name"), Operand::from("x"), Operand::from(false)],
        )
        .unwrap();
        assert_eq!(c.escaping, LikeEscaping::Disabled);

        let c = LikeCondition::from_definition(
            "LIKE",
            vec![
                Operand::from("name"),
                Operand::from("x"),
                Operand::List(vec![Operand::from(["*", "%"])]),
            ],
        )
        .unwrap();
        assert_eq!(
            c.escaping,
            LikeEscaping::Custom(vec![("*".to_string(), "%".to_string())])
        );
    }

    #[test]
    fn list_value_becomes_several_values() {
        let c = LikeCondition::from_definition(
            "OR LIKE",
            vec![Operand::from("name"), Operand::from(["a", "b"])],
        )
        .unwrap();
        assert_eq!(c.values.len(), 2);
    }

    #[test]
    fn arity_and_column_errors() {
        let err = LikeCondition::from_definition("LIKE", vec![Operand::from("name")]).unwrap_err();
        assert_eq!(err.to_string(), "Operator 'LIKE' requires two operands.");
        let err = LikeCondition::from_definition("LIKE", vec![Operand::from(1), Operand::from("x")])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Operator 'LIKE' requires column to be string or Expression."
        );
    }
}
