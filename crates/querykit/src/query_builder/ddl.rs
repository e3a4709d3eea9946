//! Schema statements.
//!
//! Column types are abstract (`pk`, `string(64)`, `integer NOT NULL`) and resolved
//! through the builder's [`ColumnTypeResolver`](super::ColumnTypeResolver). Anything
//! the resolver does not know is used as written.

use std::collections::HashMap;

use super::{QueryBuilder, replace_placeholders};
use crate::dialect::unsupported;
use crate::error::{QbError, QbResult};
use crate::query::Query;
use crate::value::{Params, Value};

/// One line of a `CREATE TABLE` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnDef {
    /// Column name and abstract type.
    Column(String, String),
    /// A definition used verbatim, e.g. a table constraint.
    Raw(String),
}

impl ColumnDef {
    pub fn column(name: impl Into<String>, ty: impl Into<String>) -> Self {
        ColumnDef::Column(name.into(), ty.into())
    }

    pub fn raw(definition: impl Into<String>) -> Self {
        ColumnDef::Raw(definition.into())
    }
}

impl From<(&str, &str)> for ColumnDef {
    fn from((name, ty): (&str, &str)) -> Self {
        ColumnDef::column(name, ty)
    }
}

impl From<&str> for ColumnDef {
    fn from(definition: &str) -> Self {
        ColumnDef::raw(definition)
    }
}

impl QueryBuilder {
    // ==================== Tables ====================

    /// `CREATE TABLE t (\n\t"c" type,\n...\n) options`.
    pub fn create_table<I, C>(&self, table: &str, columns: I, options: Option<&str>) -> QbResult<String>
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnDef>,
    {
        let lines: Vec<String> = columns
            .into_iter()
            .map(|column| match column.into() {
                ColumnDef::Column(name, ty) => format!(
                    "\t{} {}",
                    self.quoter.quote_column_name(&name),
                    self.column_type(&ty)
                ),
                ColumnDef::Raw(definition) => format!("\t{definition}"),
            })
            .collect();
        if lines.is_empty() {
            return Err(QbError::invalid_argument("Table must have at least one column."));
        }
        let mut sql = format!(
            "CREATE TABLE {} (\n{}\n)",
            self.quoter.quote_table_name(table),
            lines.join(",\n")
        );
        if let Some(options) = options.filter(|o| !o.trim().is_empty()) {
            sql.push(' ');
            sql.push_str(options);
        }
        Ok(self.ddl(sql))
    }

    pub fn drop_table(&self, table: &str, if_exists: bool, cascade: bool) -> QbResult<String> {
        let mut sql = String::from("DROP TABLE ");
        if if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.quoter.quote_table_name(table));
        if cascade {
            sql.push_str(" CASCADE");
        }
        Ok(self.ddl(sql))
    }

    pub fn rename_table(&self, table: &str, new_name: &str) -> QbResult<String> {
        let sql = self.dialect.rename_table(
            &self.quoter.quote_table_name(table),
            &self.quoter.quote_table_name(new_name),
        )?;
        Ok(self.ddl(sql))
    }

    pub fn truncate_table(&self, table: &str) -> QbResult<String> {
        let sql = self
            .dialect
            .truncate_table(&self.quoter.quote_table_name(table));
        Ok(self.ddl(sql))
    }

    // ==================== Columns ====================

    pub fn add_column(&self, table: &str, column: &str, ty: &str) -> QbResult<String> {
        let sql = format!(
            "ALTER TABLE {} ADD {} {}",
            self.quoter.quote_table_name(table),
            self.quoter.quote_column_name(column),
            self.column_type(ty)
        );
        Ok(self.ddl(sql))
    }

    pub fn drop_column(&self, table: &str, column: &str) -> QbResult<String> {
        let sql = format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.quoter.quote_table_name(table),
            self.quoter.quote_column_name(column)
        );
        Ok(self.ddl(sql))
    }

    pub fn rename_column(&self, table: &str, column: &str, new_name: &str) -> QbResult<String> {
        let sql = format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            self.quoter.quote_table_name(table),
            self.quoter.quote_column_name(column),
            self.quoter.quote_column_name(new_name)
        );
        Ok(self.ddl(sql))
    }

    pub fn alter_column(&self, table: &str, column: &str, ty: &str) -> QbResult<String> {
        let sql = self.dialect.alter_column(
            &self.quoter.quote_table_name(table),
            &self.quoter.quote_column_name(column),
            &self.column_type(ty),
        )?;
        Ok(self.ddl(sql))
    }

    // ==================== Constraints ====================

    pub fn add_primary_key(&self, name: &str, table: &str, columns: &[&str]) -> QbResult<String> {
        self.alter_constraints("adding primary keys")?;
        let sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} PRIMARY KEY ({})",
            self.quoter.quote_table_name(table),
            self.quoter.quote_column_name(name),
            self.columns(columns)
        );
        Ok(self.ddl(sql))
    }

    pub fn drop_primary_key(&self, name: &str, table: &str) -> QbResult<String> {
        self.alter_constraints("dropping primary keys")?;
        Ok(self.ddl(self.drop_constraint(name, table)))
    }

    /// `ALTER TABLE t ADD CONSTRAINT fk FOREIGN KEY (..) REFERENCES rt (..)`, with
    /// optional referential actions (`CASCADE`, `SET NULL`, ...).
    #[allow(clippy::too_many_arguments)]
    pub fn add_foreign_key(
        &self,
        name: &str,
        table: &str,
        columns: &[&str],
        ref_table: &str,
        ref_columns: &[&str],
        on_delete: Option<&str>,
        on_update: Option<&str>,
    ) -> QbResult<String> {
        self.alter_constraints("adding foreign keys")?;
        let mut sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            self.quoter.quote_table_name(table),
            self.quoter.quote_column_name(name),
            self.columns(columns),
            self.quoter.quote_table_name(ref_table),
            self.columns(ref_columns)
        );
        if let Some(action) = on_delete {
            sql.push_str(" ON DELETE ");
            sql.push_str(action);
        }
        if let Some(action) = on_update {
            sql.push_str(" ON UPDATE ");
            sql.push_str(action);
        }
        Ok(self.ddl(sql))
    }

    pub fn drop_foreign_key(&self, name: &str, table: &str) -> QbResult<String> {
        let sql = self.dialect.drop_foreign_key(
            &self.quoter.quote_table_name(table),
            &self.quoter.quote_column_name(name),
        )?;
        Ok(self.ddl(sql))
    }

    pub fn add_unique(&self, name: &str, table: &str, columns: &[&str]) -> QbResult<String> {
        self.alter_constraints("adding unique constraints")?;
        let sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} UNIQUE ({})",
            self.quoter.quote_table_name(table),
            self.quoter.quote_column_name(name),
            self.columns(columns)
        );
        Ok(self.ddl(sql))
    }

    pub fn drop_unique(&self, name: &str, table: &str) -> QbResult<String> {
        self.alter_constraints("dropping unique constraints")?;
        Ok(self.ddl(self.drop_constraint(name, table)))
    }

    /// `expression` is raw SQL.
    pub fn add_check(&self, name: &str, table: &str, expression: &str) -> QbResult<String> {
        self.alter_constraints("adding check constraints")?;
        let sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} CHECK ({expression})",
            self.quoter.quote_table_name(table),
            self.quoter.quote_column_name(name)
        );
        Ok(self.ddl(sql))
    }

    pub fn drop_check(&self, name: &str, table: &str) -> QbResult<String> {
        self.alter_constraints("dropping check constraints")?;
        Ok(self.ddl(self.drop_constraint(name, table)))
    }

    // ==================== Indexes ====================

    /// `CREATE [type] INDEX n ON t [USING method] (..)`. `index_type` is e.g. `UNIQUE`.
    pub fn create_index(
        &self,
        name: &str,
        table: &str,
        columns: &[&str],
        index_type: Option<&str>,
        method: Option<&str>,
    ) -> QbResult<String> {
        let mut sql = String::from("CREATE ");
        if let Some(ty) = index_type.filter(|t| !t.is_empty()) {
            sql.push_str(ty);
            sql.push(' ');
        }
        sql.push_str(&format!(
            "INDEX {} ON {}",
            self.quoter.quote_table_name(name),
            self.quoter.quote_table_name(table)
        ));
        if let Some(method) = method.filter(|m| !m.is_empty()) {
            sql.push_str(" USING ");
            sql.push_str(method);
        }
        sql.push_str(&format!(" ({})", self.columns(columns)));
        Ok(self.ddl(sql))
    }

    pub fn drop_index(&self, name: &str, table: &str) -> QbResult<String> {
        let sql = self.dialect.drop_index(
            &self.quoter.quote_table_name(table),
            &self.quoter.quote_table_name(name),
        )?;
        Ok(self.ddl(sql))
    }

    // ==================== Views ====================

    /// `CREATE VIEW v AS SELECT ...`. Bound parameters are inlined as literals.
    pub fn create_view(&self, name: &str, query: &Query) -> QbResult<String> {
        let mut params = Params::new();
        let select = self.build_query(query, &mut params)?;
        let mut literals = HashMap::with_capacity(params.len());
        for (placeholder, param) in &params {
            literals.insert(placeholder.to_string(), self.inline_literal(param.value())?);
        }
        let select = replace_placeholders(&select, &literals);
        let sql = format!("CREATE VIEW {} AS {select}", self.quoter.quote_table_name(name));
        Ok(self.ddl(sql))
    }

    pub fn drop_view(&self, name: &str) -> QbResult<String> {
        Ok(self.ddl(format!("DROP VIEW {}", self.quoter.quote_table_name(name))))
    }

    // ==================== Comments ====================

    pub fn add_comment_on_column(&self, table: &str, column: &str, comment: &str) -> QbResult<String> {
        let sql = self.dialect.comment_on_column(
            &self.quoter.quote_table_name(table),
            &self.quoter.quote_column_name(column),
            &self.quoter.quote_value(comment),
        )?;
        Ok(self.ddl(sql))
    }

    pub fn add_comment_on_table(&self, table: &str, comment: &str) -> QbResult<String> {
        let sql = self.dialect.comment_on_table(
            &self.quoter.quote_table_name(table),
            &self.quoter.quote_value(comment),
        )?;
        Ok(self.ddl(sql))
    }

    pub fn drop_comment_from_column(&self, table: &str, column: &str) -> QbResult<String> {
        let sql = self.dialect.comment_on_column(
            &self.quoter.quote_table_name(table),
            &self.quoter.quote_column_name(column),
            "NULL",
        )?;
        Ok(self.ddl(sql))
    }

    pub fn drop_comment_from_table(&self, table: &str) -> QbResult<String> {
        let sql = self
            .dialect
            .comment_on_table(&self.quoter.quote_table_name(table), "NULL")?;
        Ok(self.ddl(sql))
    }

    // ==================== Helpers ====================

    fn ddl(&self, sql: String) -> String {
        self.finish("ddl", sql, Params::new()).0
    }

    fn alter_constraints(&self, what: &str) -> QbResult<()> {
        if self.dialect.supports_constraint_alteration() {
            Ok(())
        } else {
            Err(unsupported(self.dialect.kind(), what))
        }
    }

    fn drop_constraint(&self, name: &str, table: &str) -> String {
        format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.quoter.quote_table_name(table),
            self.quoter.quote_column_name(name)
        )
    }

    fn columns(&self, columns: &[&str]) -> String {
        columns
            .iter()
            .map(|c| self.quoter.quote_column_name(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn inline_literal(&self, value: &Value) -> QbResult<String> {
        Ok(match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => self.dialect.bool_literal(*b).to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => self.quoter.quote_value(s),
            Value::Json(json) => self.quoter.quote_value(&json.to_string()),
            Value::Bytes(_) => {
                return Err(QbError::invalid_argument(
                    "Binary parameters cannot be inlined into a view.",
                ));
            }
        })
    }
}
