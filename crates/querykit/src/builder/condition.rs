//! Builders for condition nodes.

use std::sync::OnceLock;

use regex::Regex;

use super::{ExpressionBuilder, Node, unexpected_node};
use crate::condition::{
    Condition, InColumns, InCondition, InValues, LikeEscaping, escape_like,
};
use crate::error::{QbError, QbResult};
use crate::expr::{ColumnRef, Expr, Operand};
use crate::query_builder::QueryBuilder;
use crate::value::{Params, Value};

/// `column operator value`. A null value renders `column operator NULL`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleBuilder;

impl ExpressionBuilder for SimpleBuilder {
    fn build(&self, qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let Node::Condition(Condition::Simple(c)) = node else {
            return Err(unexpected_node("SimpleBuilder", node));
        };
        let column = qb.build_column(&c.column, params)?;
        let value = qb.build_operand(&c.value, params)?;
        Ok(format!("{column} {} {value}", c.operator))
    }
}

/// `column=value AND ..`; nulls become `IS NULL`, lists and sub-queries become `IN`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashBuilder;

impl ExpressionBuilder for HashBuilder {
    fn build(&self, qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let Node::Condition(Condition::Hash(hash)) = node else {
            return Err(unexpected_node("HashBuilder", node));
        };
        let mut parts = Vec::with_capacity(hash.pairs.len());
        for (column, value) in &hash.pairs {
            let part = match value {
                Operand::List(items) => {
                    let c = InCondition::new(column.as_str(), "IN", InValues::List(items.clone()));
                    qb.build_condition_node(&Condition::In(c), params)?
                }
                Operand::Expr(Expr::Query(query)) => {
                    let c = InCondition::new(column.as_str(), "IN", InValues::Expr(Expr::Query(query.clone())));
                    qb.build_condition_node(&Condition::In(c), params)?
                }
                v if v.is_null() => format!("{} IS NULL", hash_column(qb, column)),
                Operand::Expr(expr) => {
                    format!("{}={}", hash_column(qb, column), qb.build_expression(expr, params)?)
                }
                other => format!("{}={}", hash_column(qb, column), qb.build_operand(other, params)?),
            };
            parts.push(part);
        }
        Ok(parts.join(" AND "))
    }
}

fn hash_column(qb: &QueryBuilder, column: &str) -> String {
    if column.contains('(') {
        column.to_string()
    } else {
        qb.quoter().quote_column_name(column)
    }
}

/// How a composite-key `IN` is spelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompositeInStyle {
    /// `(a, b) IN ((1, 2), (3, 4))`.
    #[default]
    RowValue,
    /// `(a = 1 AND b = 2) OR (a = 3 AND b = 4)`, for engines without row values.
    OrOfAnds,
}

/// `IN` / `NOT IN` over a value list or a sub-query.
///
/// An empty list renders `0=1` for `IN` and nothing for `NOT IN`. One value collapses
/// to `=` / `<>`; null values add an `IS [NOT] NULL` check.
#[derive(Debug, Clone, Copy, Default)]
pub struct InBuilder {
    composite: CompositeInStyle,
}

impl InBuilder {
    pub fn new(composite: CompositeInStyle) -> Self {
        Self { composite }
    }
}

impl ExpressionBuilder for InBuilder {
    fn build(&self, qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let Node::Condition(Condition::In(c)) = node else {
            return Err(unexpected_node("InBuilder", node));
        };
        let negated = c.is_negated();
        let operator = if negated { "NOT IN" } else { "IN" };

        let values = match &c.values {
            InValues::Expr(expr) => {
                let columns = in_columns_sql(qb, &c.columns, params)?;
                let values = qb.build_expression(expr, params)?;
                return Ok(format!("{columns} {operator} {values}"));
            }
            InValues::List(values) => values,
        };

        if values.is_empty() {
            return Ok(if negated { String::new() } else { "0=1".to_string() });
        }

        match &c.columns {
            InColumns::Single(column) => build_single_in(qb, column, negated, values, params),
            InColumns::Composite(columns) => match self.composite {
                CompositeInStyle::RowValue => {
                    build_row_value_in(qb, columns, operator, values, params)
                }
                CompositeInStyle::OrOfAnds => build_or_of_ands_in(qb, columns, negated, values, params),
            },
        }
    }
}

fn in_columns_sql(qb: &QueryBuilder, columns: &InColumns, params: &mut Params) -> QbResult<String> {
    match columns {
        InColumns::Single(column) => qb.build_column(column, params),
        InColumns::Composite(columns) => {
            let quoted = columns
                .iter()
                .map(|c| qb.build_column(c, params))
                .collect::<QbResult<Vec<_>>>()?;
            Ok(format!("({})", quoted.join(", ")))
        }
    }
}

fn build_single_in(
    qb: &QueryBuilder,
    column: &ColumnRef,
    negated: bool,
    values: &[Operand],
    params: &mut Params,
) -> QbResult<String> {
    let column = qb.build_column(column, params)?;
    let mut placeholders = Vec::with_capacity(values.len());
    let mut has_null = false;
    for value in values {
        // A one-element row of a single-column IN is its value.
        let value = match value {
            Operand::List(items) if items.len() == 1 => &items[0],
            other => other,
        };
        if value.is_null() {
            has_null = true;
        } else {
            placeholders.push(qb.build_operand(value, params)?);
        }
    }

    let null_check = has_null.then(|| {
        if negated {
            format!("{column} IS NOT NULL")
        } else {
            format!("{column} IS NULL")
        }
    });

    let sql = match placeholders.len() {
        0 => return Ok(null_check.unwrap_or_default()),
        1 => {
            let operator = if negated { "<>" } else { "=" };
            format!("{column}{operator}{}", placeholders[0])
        }
        _ => {
            let operator = if negated { "NOT IN" } else { "IN" };
            format!("{column} {operator} ({})", placeholders.join(", "))
        }
    };

    Ok(match null_check {
        Some(check) => {
            let joiner = if negated { "AND" } else { "OR" };
            format!("({sql} {joiner} {check})")
        }
        None => sql,
    })
}

fn row_items(row: &Operand) -> Vec<&Operand> {
    match row {
        Operand::List(items) => items.iter().collect(),
        single => vec![single],
    }
}

fn build_row_value_in(
    qb: &QueryBuilder,
    columns: &[ColumnRef],
    operator: &str,
    rows: &[Operand],
    params: &mut Params,
) -> QbResult<String> {
    let quoted = columns
        .iter()
        .map(|c| qb.build_column(c, params))
        .collect::<QbResult<Vec<_>>>()?;
    let mut tuples = Vec::with_capacity(rows.len());
    for row in rows {
        let items = row_items(row);
        let mut slots = Vec::with_capacity(columns.len());
        for i in 0..columns.len() {
            match items.get(i) {
                Some(item) => slots.push(qb.build_operand(item, params)?),
                None => slots.push("NULL".to_string()),
            }
        }
        tuples.push(format!("({})", slots.join(", ")));
    }
    Ok(format!("({}) {operator} ({})", quoted.join(", "), tuples.join(", ")))
}

fn build_or_of_ands_in(
    qb: &QueryBuilder,
    columns: &[ColumnRef],
    negated: bool,
    rows: &[Operand],
    params: &mut Params,
) -> QbResult<String> {
    let quoted = columns
        .iter()
        .map(|c| qb.build_column(c, params))
        .collect::<QbResult<Vec<_>>>()?;
    let (eq, is_null, inner, outer) = if negated {
        (" != ", " IS NOT NULL", " OR ", " AND ")
    } else {
        (" = ", " IS NULL", " AND ", " OR ")
    };
    let mut groups = Vec::with_capacity(rows.len());
    for row in rows {
        let items = row_items(row);
        let mut parts = Vec::with_capacity(columns.len());
        for (i, column) in quoted.iter().enumerate() {
            match items.get(i) {
                Some(item) if !item.is_null() => {
                    parts.push(format!("{column}{eq}{}", qb.build_operand(item, params)?));
                }
                _ => parts.push(format!("{column}{is_null}")),
            }
        }
        groups.push(format!("({})", parts.join(inner)));
    }
    Ok(format!("({})", groups.join(outer)))
}

/// The `LIKE` family, with wildcard escaping and `%..%` wrapping of values.
#[derive(Debug, Clone)]
pub struct LikeBuilder {
    replacements: Vec<(String, String)>,
    escape_sql: Option<String>,
}

impl Default for LikeBuilder {
    fn default() -> Self {
        Self {
            replacements: LikeEscaping::default_replacements(),
            escape_sql: None,
        }
    }
}

impl LikeBuilder {
    /// Replace the default escaping map (`%`, `_`, `\`).
    pub fn with_replacements(mut self, replacements: Vec<(String, String)>) -> Self {
        self.replacements = replacements;
        self
    }

    /// Text appended after every pattern, e.g. ` ESCAPE '\'`.
    pub fn with_escape_sql(mut self, escape_sql: impl Into<String>) -> Self {
        self.escape_sql = Some(escape_sql.into());
        self
    }
}

/// Split `[AND |OR ][NOT ][I]LIKE` into (joiner, negated, operator).
fn parse_like_operator(operator: &str) -> QbResult<(&'static str, bool, String)> {
    static LIKE_OP_RE: OnceLock<Regex> = OnceLock::new();
    let re = LIKE_OP_RE.get_or_init(|| {
        Regex::new(r"^(AND |OR |)((NOT |)I?LIKE)").expect("invalid built-in like operator regex")
    });
    let upper = operator.to_ascii_uppercase();
    let caps = re.captures(&upper).ok_or_else(|| {
        QbError::invalid_argument(format!("Invalid operator in like condition: \"{upper}\""))
    })?;
    let joiner = if caps.get(1).is_some_and(|m| m.as_str() == "OR ") {
        " OR "
    } else {
        " AND "
    };
    let negated = caps.get(3).is_some_and(|m| !m.as_str().is_empty());
    let op = caps.get(2).map_or("LIKE", |m| m.as_str()).to_string();
    Ok((joiner, negated, op))
}

impl ExpressionBuilder for LikeBuilder {
    fn build(&self, qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let Node::Condition(Condition::Like(c)) = node else {
            return Err(unexpected_node("LikeBuilder", node));
        };
        let (joiner, negated, operator) = parse_like_operator(&c.operator)?;
        if c.values.is_empty() {
            return Ok(if negated { String::new() } else { "0=1".to_string() });
        }

        let replacements = match &c.escaping {
            LikeEscaping::Default => Some(self.replacements.as_slice()),
            LikeEscaping::Custom(custom) => Some(custom.as_slice()),
            LikeEscaping::Disabled => None,
        };
        let column = qb.build_column(&c.column, params)?;
        let escape_sql = self.escape_sql.as_deref().unwrap_or("");

        let mut parts = Vec::with_capacity(c.values.len());
        for value in &c.values {
            let placeholder = match (value, replacements) {
                (Operand::Value(v), Some(replacements)) if !v.is_null() => {
                    let text = match v {
                        Value::String(s) => s.clone(),
                        other => other.to_json().to_string(),
                    };
                    let pattern = format!("%{}%", escape_like(&text, replacements));
                    qb.build_value(&Value::String(pattern), params)
                }
                (other, _) => qb.build_operand(other, params)?,
            };
            parts.push(format!("{column} {operator} {placeholder}{escape_sql}"));
        }
        Ok(parts.join(joiner))
    }
}

/// `column [NOT] BETWEEN start AND end`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BetweenBuilder;

impl ExpressionBuilder for BetweenBuilder {
    fn build(&self, qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let Node::Condition(Condition::Between(c)) = node else {
            return Err(unexpected_node("BetweenBuilder", node));
        };
        let column = qb.build_column(&c.column, params)?;
        let start = qb.build_operand(&c.start, params)?;
        let end = qb.build_operand(&c.end, params)?;
        Ok(format!("{column} {} {start} AND {end}", c.operator))
    }
}

/// `value [NOT] BETWEEN start_column AND end_column`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BetweenColumnsBuilder;

impl ExpressionBuilder for BetweenColumnsBuilder {
    fn build(&self, qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let Node::Condition(Condition::BetweenColumns(c)) = node else {
            return Err(unexpected_node("BetweenColumnsBuilder", node));
        };
        let value = qb.build_operand(&c.value, params)?;
        let start = qb.build_column(&c.start_column, params)?;
        let end = qb.build_column(&c.end_column, params)?;
        Ok(format!("{value} {} {start} AND {end}", c.operator))
    }
}

/// `(a) AND (b)`; empty children are dropped and a single child is not wrapped.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConjunctionBuilder;

impl ExpressionBuilder for ConjunctionBuilder {
    fn build(&self, qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let Node::Condition(Condition::Conjunction(c)) = node else {
            return Err(unexpected_node("ConjunctionBuilder", node));
        };
        let mut parts = Vec::with_capacity(c.expressions.len());
        for expression in &c.expressions {
            let part = qb.build_predicate(expression, params)?;
            if !part.is_empty() {
                parts.push(part);
            }
        }
        Ok(match parts.len() {
            0 => String::new(),
            1 => parts.remove(0),
            _ => format!("({})", parts.join(&format!(") {} (", c.operator.as_str()))),
        })
    }
}

/// `NOT (condition)`; nothing when the condition renders empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotBuilder;

impl ExpressionBuilder for NotBuilder {
    fn build(&self, qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let Node::Condition(Condition::Not(c)) = node else {
            return Err(unexpected_node("NotBuilder", node));
        };
        let inner = qb.build_predicate(&c.condition, params)?;
        if inner.is_empty() {
            return Ok(String::new());
        }
        Ok(format!("NOT ({inner})"))
    }
}

/// `[NOT] EXISTS (sub-query)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExistsBuilder;

impl ExpressionBuilder for ExistsBuilder {
    fn build(&self, qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let Node::Condition(Condition::Exists(c)) = node else {
            return Err(unexpected_node("ExistsBuilder", node));
        };
        let sql = qb.build_query(&c.query, params)?;
        Ok(format!("{} ({sql})", c.operator))
    }
}
