//! Builder configuration, loadable from TOML.
//!
//! ```toml
//! dialect = "postgres"
//! table_prefix = "tbl_"
//!
//! [types]
//! money = "numeric(19,4)"
//!
//! [log]
//! enabled = true
//! max_sql_length = 200
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::dialect::DialectKind;
use crate::error::{QbError, QbResult};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    pub dialect: DialectKind,
    /// Substituted for `%` in `{{%table}}` tokens.
    pub table_prefix: String,
    /// Abstract column type overrides, layered over the dialect's built-in map.
    pub types: BTreeMap<String, String>,
    pub log: LogConfig,
}

impl BuilderConfig {
    pub fn from_toml_str(raw: &str) -> QbResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> QbResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            QbError::config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        toml::from_str(&raw).map_err(|e| {
            QbError::config(format!("failed to parse config file {}: {e}", path.display()))
        })
    }
}

/// `tracing` output of compiled statements.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub enabled: bool,
    /// Truncate logged SQL (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_sql_length: Some(200),
        }
    }
}

impl LogConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub(crate) fn truncate(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }
}

fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
