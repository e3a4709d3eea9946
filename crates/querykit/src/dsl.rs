//! Array-condition DSL.
//!
//! [`Where`] is the loosely structured condition input accepted by `Query::where_` and
//! friends. Operator format (`cond![">", "age", 18]`) is parsed into the typed
//! [`Condition`](crate::condition::Condition) model through the builder's operator
//! registry at compile time; hash format (`hash!{"status" => "active"}`) becomes a
//! [`HashCondition`](crate::condition::HashCondition).
//!
//! ```ignore
//! use querykit::{cond, hash};
//!
//! let w = cond!["and", cond![">", "age", 18], hash!{"status" => "active"}];
//! ```

use crate::condition::Condition;
use crate::expr::{Expr, Operand};
use crate::value::Value;

/// Condition input: operator format, hash format, raw SQL or an expression.
#[derive(Debug, Clone)]
pub enum Where {
    /// `[operator, operand, ...]`.
    Op {
        operator: String,
        operands: Vec<Operand>,
    },
    /// `column => value` pairs, ANDed.
    Hash(Vec<(String, Operand)>),
    /// A SQL fragment used as is.
    Raw(String),
    Expr(Expr),
}

impl Where {
    pub fn op<I, O>(operator: impl Into<String>, operands: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<Operand>,
    {
        Where::Op {
            operator: operator.into(),
            operands: operands.into_iter().map(Into::into).collect(),
        }
    }

    pub fn hash<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Operand>,
    {
        Where::Hash(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn raw(sql: impl Into<String>) -> Self {
        Where::Raw(sql.into())
    }

    /// Read a list operand in condition position as operator format.
    ///
    /// Returns `None` unless the first item is a string operator.
    pub fn from_list(items: Vec<Operand>) -> Option<Where> {
        let mut items = items.into_iter();
        match items.next() {
            Some(Operand::Value(Value::String(operator))) => Some(Where::Op {
                operator,
                operands: items.collect(),
            }),
            _ => None,
        }
    }

    /// Whether this condition has nothing to render.
    pub fn is_empty(&self) -> bool {
        match self {
            Where::Hash(pairs) => pairs.is_empty(),
            Where::Raw(sql) => sql.trim().is_empty(),
            Where::Op { operator, operands } => {
                is_logical(operator) && operands.iter().all(operand_is_empty)
            }
            Where::Expr(_) => false,
        }
    }

    /// Remove empty operands, recursively.
    ///
    /// Hash entries with empty values are dropped. `AND`/`OR`/`NOT` drop empty children and
    /// vanish when none remain. `BETWEEN` vanishes when either bound is empty; any other
    /// operator vanishes when its value operand is empty. `None` means nothing is left.
    pub fn filter(self) -> Option<Where> {
        match self {
            Where::Hash(pairs) => {
                let kept: Vec<(String, Operand)> =
                    pairs.into_iter().filter(|(_, v)| !v.is_empty()).collect();
                (!kept.is_empty()).then_some(Where::Hash(kept))
            }
            Where::Raw(sql) => (!sql.trim().is_empty()).then_some(Where::Raw(sql)),
            Where::Expr(expr) => Some(Where::Expr(expr)),
            Where::Op { operator, operands } => {
                let upper = operator.trim().to_ascii_uppercase();
                match upper.as_str() {
                    "NOT" | "AND" | "OR" => {
                        let kept: Vec<Operand> =
                            operands.into_iter().filter_map(filter_operand).collect();
                        if kept.is_empty() {
                            return None;
                        }
                        Some(Where::Op {
                            operator,
                            operands: kept,
                        })
                    }
                    "BETWEEN" | "NOT BETWEEN" => {
                        if operands.len() >= 3 && (operands[1].is_empty() || operands[2].is_empty())
                        {
                            return None;
                        }
                        Some(Where::Op { operator, operands })
                    }
                    _ => {
                        if operands.len() >= 2 && operands[1].is_empty() {
                            return None;
                        }
                        Some(Where::Op { operator, operands })
                    }
                }
            }
        }
    }
}

fn is_logical(operator: &str) -> bool {
    let op = operator.trim();
    op.eq_ignore_ascii_case("AND") || op.eq_ignore_ascii_case("OR") || op.eq_ignore_ascii_case("NOT")
}

fn operand_is_empty(operand: &Operand) -> bool {
    match operand {
        Operand::Where(w) => w.is_empty(),
        other => other.is_empty(),
    }
}

fn filter_operand(operand: Operand) -> Option<Operand> {
    match operand {
        Operand::Where(w) => w.filter().map(Operand::from),
        Operand::List(items) => {
            if matches!(items.first(), Some(Operand::Value(Value::String(_)))) {
                Where::from_list(items)
                    .and_then(Where::filter)
                    .map(Operand::from)
            } else if items.is_empty() {
                None
            } else {
                Some(Operand::List(items))
            }
        }
        other => (!other.is_empty()).then_some(other),
    }
}

impl From<Condition> for Where {
    fn from(c: Condition) -> Self {
        Where::Expr(Expr::from(c))
    }
}

impl From<Expr> for Where {
    fn from(e: Expr) -> Self {
        Where::Expr(e)
    }
}

impl From<&str> for Where {
    fn from(sql: &str) -> Self {
        Where::Raw(sql.to_string())
    }
}

impl From<String> for Where {
    fn from(sql: String) -> Self {
        Where::Raw(sql)
    }
}

/// Operator-format condition: `cond![operator, operand, ...]`.
#[macro_export]
macro_rules! cond {
    [$op:expr $(, $operand:expr)* $(,)?] => {
        $crate::dsl::Where::Op {
            operator: ::std::string::String::from($op),
            operands: ::std::vec![$($crate::expr::Operand::from($operand)),*],
        }
    };
}

/// Hash-format condition: `hash!{"column" => value, ...}`.
#[macro_export]
macro_rules! hash {
    {$($col:expr => $val:expr),* $(,)?} => {
        $crate::dsl::Where::Hash(::std::vec![
            $((::std::string::String::from($col), $crate::expr::Operand::from($val))),*
        ])
    };
}

/// Column/value pairs for insert and update: `row!{"column" => value, ...}`.
#[macro_export]
macro_rules! row {
    {$($col:expr => $val:expr),* $(,)?} => {
        ::std::vec![
            $((::std::string::String::from($col), $crate::expr::Operand::from($val))),*
        ]
    };
}

/// Heterogeneous operand list, e.g. a composite-key row: `list![1, "a"]`.
#[macro_export]
macro_rules! list {
    [$($item:expr),* $(,)?] => {
        $crate::expr::Operand::List(::std::vec![$($crate::expr::Operand::from($item)),*])
    };
}
