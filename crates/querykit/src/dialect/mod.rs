//! SQL dialects.
//!
//! A [`Dialect`] supplies quoting, literal and clause spellings, built-in column types
//! and DDL statements that differ between engines. Its [`Dialect::register`] hook
//! replaces entries of the builder and operator registries; everything it does not
//! override comes from the base registries.

mod mysql;
mod postgres;
mod sqlite;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use mysql::MySql;
pub use postgres::Postgres;
pub use sqlite::Sqlite;

use crate::builder::{BuilderRegistry, OperatorRegistry};
use crate::error::{QbError, QbResult};
use crate::quoter::Quoter;

/// The shipped dialects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    #[serde(alias = "postgresql", alias = "pgsql")]
    Postgres,
    MySql,
    Sqlite,
}

impl DialectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialectKind::Postgres => "postgres",
            DialectKind::MySql => "mysql",
            DialectKind::Sqlite => "sqlite",
        }
    }

    /// A fresh instance of this dialect.
    pub fn dialect(&self) -> Arc<dyn Dialect> {
        match self {
            DialectKind::Postgres => Arc::new(Postgres),
            DialectKind::MySql => Arc::new(MySql),
            DialectKind::Sqlite => Arc::new(Sqlite),
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialectKind {
    type Err = QbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pgsql" => Ok(DialectKind::Postgres),
            "mysql" => Ok(DialectKind::MySql),
            "sqlite" => Ok(DialectKind::Sqlite),
            other => Err(QbError::config(format!("unknown dialect '{other}'"))),
        }
    }
}

/// Engine-specific spellings.
///
/// DDL hooks receive names that are already quoted and return the full statement.
pub trait Dialect: fmt::Debug + Send + Sync {
    fn kind(&self) -> DialectKind;

    fn quoter(&self) -> Quoter;

    fn bool_literal(&self, value: bool) -> &'static str {
        if value { "TRUE" } else { "FALSE" }
    }

    /// `LIMIT`/`OFFSET` clause from rendered operands; empty when both are absent.
    fn build_limit(&self, limit: Option<&str>, offset: Option<&str>) -> String {
        match (limit, offset) {
            (Some(limit), Some(offset)) => format!("LIMIT {limit} OFFSET {offset}"),
            (Some(limit), None) => format!("LIMIT {limit}"),
            (None, Some(offset)) => format!("OFFSET {offset}"),
            (None, None) => String::new(),
        }
    }

    /// Text after `INSERT INTO t` for a row without columns.
    fn empty_insert_values(&self) -> &'static str {
        " DEFAULT VALUES"
    }

    /// Abstract column type to column definition map used by DDL.
    fn default_types(&self) -> &'static [(&'static str, &'static str)];

    /// Override builder and operator registry entries.
    fn register(&self, _builders: &mut BuilderRegistry, _operators: &mut OperatorRegistry) {}

    fn rename_table(&self, table: &str, new_name: &str) -> QbResult<String> {
        Ok(format!("ALTER TABLE {table} RENAME TO {new_name}"))
    }

    fn alter_column(&self, table: &str, column: &str, column_type: &str) -> QbResult<String> {
        Ok(format!("ALTER TABLE {table} CHANGE {column} {column} {column_type}"))
    }

    fn truncate_table(&self, table: &str) -> String {
        format!("TRUNCATE TABLE {table}")
    }

    fn drop_index(&self, _table: &str, name: &str) -> QbResult<String> {
        Ok(format!("DROP INDEX {name}"))
    }

    fn drop_foreign_key(&self, table: &str, name: &str) -> QbResult<String> {
        Ok(format!("ALTER TABLE {table} DROP CONSTRAINT {name}"))
    }

    /// `comment` is a quoted literal or `NULL`.
    fn comment_on_column(&self, table: &str, column: &str, comment: &str) -> QbResult<String> {
        Ok(format!("COMMENT ON COLUMN {table}.{column} IS {comment}"))
    }

    /// `comment` is a quoted literal or `NULL`.
    fn comment_on_table(&self, table: &str, comment: &str) -> QbResult<String> {
        Ok(format!("COMMENT ON TABLE {table} IS {comment}"))
    }

    /// Whether constraints can be added to or dropped from an existing table.
    fn supports_constraint_alteration(&self) -> bool {
        true
    }
}

/// Error for a statement the dialect cannot express.
pub(crate) fn unsupported(kind: DialectKind, what: &str) -> QbError {
    QbError::not_supported(format!("{kind} does not support {what}."))
}
