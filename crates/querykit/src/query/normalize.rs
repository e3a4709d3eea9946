//! Parsing of the free-text shorthands accepted by [`Query`](super::Query) mutators.

use std::sync::OnceLock;

use regex::Regex;

use super::{Direction, TableRef, TableSource};
use crate::error::{QbError, QbResult};
use crate::quoter::Quoter;

/// Split `"a, b ,c"` into column names. Strings containing `(` are kept whole.
pub(crate) fn split_columns(columns: &str) -> Vec<String> {
    let trimmed = columns.trim();
    if trimmed.contains('(') {
        return if trimmed.is_empty() {
            Vec::new()
        } else {
            vec![trimmed.to_string()]
        };
    }
    trimmed
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split `"expr AS alias"` / `"expr alias"` in a select list.
///
/// Numeric aliases and aliases containing `.` are not aliases (`t.id`, `1`).
pub(crate) fn select_alias(column: &str) -> Option<(String, String)> {
    static SELECT_ALIAS_RE: OnceLock<Regex> = OnceLock::new();
    let re = SELECT_ALIAS_RE.get_or_init(|| {
        Regex::new(r"^(.*?)(?i:\s+as\s+|\s+)([\w\-_.]+)$").expect("invalid built-in select alias regex")
    });
    let caps = re.captures(column)?;
    let expr = caps.get(1)?.as_str();
    let alias = caps.get(2)?.as_str();
    if expr.is_empty() || alias.contains('.') || alias.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((expr.to_string(), alias.to_string()))
}

/// Split `"table AS alias"` / `"table alias"` in a FROM or JOIN list.
pub(crate) fn extract_alias(table: &str) -> Option<(String, String)> {
    static TABLE_ALIAS_RE: OnceLock<Regex> = OnceLock::new();
    let re = TABLE_ALIAS_RE.get_or_init(|| {
        Regex::new(r"^(.*?)(?i:\s+as|)\s+([^ ]+)$").expect("invalid built-in table alias regex")
    });
    let caps = re.captures(table)?;
    let name = caps.get(1)?.as_str();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), caps.get(2)?.as_str().to_string()))
}

/// Parse `"a DESC, b"` into columns with directions. Direction keywords are case-insensitive.
pub(crate) fn parse_order_by(columns: &str) -> Vec<(String, Direction)> {
    static ORDER_RE: OnceLock<Regex> = OnceLock::new();
    let re = ORDER_RE
        .get_or_init(|| Regex::new(r"(?i)^(.*?)\s+(asc|desc)$").expect("invalid built-in order regex"));
    split_columns(columns)
        .into_iter()
        .map(|column| match re.captures(&column) {
            Some(caps) => {
                let name = caps.get(1).map_or("", |m| m.as_str()).to_string();
                let dir = caps.get(2).map_or("", |m| m.as_str());
                let dir = if dir.eq_ignore_ascii_case("desc") {
                    Direction::Desc
                } else {
                    Direction::Asc
                };
                (name, dir)
            }
            None => (column, Direction::Asc),
        })
        .collect()
}

/// Resolve FROM entries to `{{alias}} -> {{table}}` pairs.
///
/// Expressions and sub-queries need an explicit alias.
pub(crate) fn clean_up_table_names(
    tables: &[TableRef],
    quoter: &Quoter,
) -> QbResult<Vec<(String, TableSource)>> {
    static TABLE_RE: OnceLock<Regex> = OnceLock::new();
    let re = TABLE_RE.get_or_init(|| {
        Regex::new(
            r#"(?i)^\s*((?:['"`\[]|\{\{).*?(?:['"`\]]|\}\})|\(.*?\)|.*?)(?:(?:\s+(?:as\s+)?)((?:['"`\[]|\{\{).*?(?:['"`\]]|\}\})|.*?))?\s*$"#,
        )
        .expect("invalid built-in table name regex")
    });

    let mut cleaned = Vec::with_capacity(tables.len());
    for table in tables {
        match (&table.alias, &table.source) {
            (Some(alias), TableSource::Name(name)) => cleaned.push((
                quoter.ensure_name_quoted(alias),
                TableSource::Name(quoter.ensure_name_quoted(name)),
            )),
            (Some(alias), TableSource::Expr(expr)) => {
                cleaned.push((quoter.ensure_name_quoted(alias), TableSource::Expr(expr.clone())));
            }
            (None, TableSource::Name(name)) => {
                let (name, alias) = match re.captures(name) {
                    Some(caps) => {
                        let name = caps.get(1).map_or("", |m| m.as_str());
                        match caps.get(2) {
                            Some(alias) => (name.to_string(), alias.as_str().to_string()),
                            None => (name.to_string(), name.to_string()),
                        }
                    }
                    None => (name.clone(), name.clone()),
                };
                cleaned.push((
                    quoter.ensure_name_quoted(&alias),
                    TableSource::Name(quoter.ensure_name_quoted(&name)),
                ));
            }
            (None, TableSource::Expr(_)) => return Err(expression_without_alias()),
        }
    }
    Ok(cleaned)
}

pub(crate) fn expression_without_alias() -> QbError {
    QbError::invalid_argument(
        "To use Expression in from() method, pass it in array format with alias.",
    )
}
