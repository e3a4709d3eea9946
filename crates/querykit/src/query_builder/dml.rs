//! INSERT, UPDATE and DELETE compilation.
//!
//! Rows are `(column, value)` pairs, usually written with the `row!` macro. Values go
//! through the operand path: scalars are bound, `None` renders `NULL` and expressions
//! (including sub-queries) are compiled in place.

use super::QueryBuilder;
use crate::dsl::Where;
use crate::error::{QbError, QbResult};
use crate::expr::Operand;
use crate::query::Query;
use crate::value::Params;

impl QueryBuilder {
    /// `INSERT INTO t ("a", "b") VALUES (:pv0, :pv1)`.
    ///
    /// An empty row inserts the table defaults.
    pub fn insert(&self, table: &str, row: Vec<(String, Operand)>) -> QbResult<(String, Params)> {
        let mut params = Params::new();
        let table = self.quoter.quote_table_name(table);
        if row.is_empty() {
            let sql = format!("INSERT INTO {table}{}", self.dialect.empty_insert_values());
            return Ok(self.finish("insert", sql, params));
        }
        let mut columns = Vec::with_capacity(row.len());
        let mut values = Vec::with_capacity(row.len());
        for (column, value) in &row {
            columns.push(self.quoter.quote_column_name(column));
            values.push(self.build_operand(value, &mut params)?);
        }
        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            columns.join(", "),
            values.join(", ")
        );
        Ok(self.finish("insert", sql, params))
    }

    /// `INSERT INTO t ("a", "b") SELECT ...`. With no columns the list is omitted.
    pub fn insert_from_query(
        &self,
        table: &str,
        columns: &[&str],
        query: &Query,
    ) -> QbResult<(String, Params)> {
        let mut params = Params::new();
        let select = self.build_query(query, &mut params)?;
        let sql = format!(
            "INSERT INTO {}{} {select}",
            self.quoter.quote_table_name(table),
            self.column_list(columns)
        );
        Ok(self.finish("insert", sql, params))
    }

    /// Multi-row insert. Zero rows compile to an empty statement.
    pub fn insert_batch<R, V>(
        &self,
        table: &str,
        columns: &[&str],
        rows: R,
    ) -> QbResult<(String, Params)>
    where
        R: IntoIterator<Item = V>,
        V: IntoIterator,
        V::Item: Into<Operand>,
    {
        let mut params = Params::new();
        let mut tuples = Vec::new();
        for row in rows {
            let values = row
                .into_iter()
                .map(|value| self.build_operand(&value.into(), &mut params))
                .collect::<QbResult<Vec<_>>>()?;
            if !columns.is_empty() && values.len() != columns.len() {
                return Err(QbError::invalid_argument(format!(
                    "Batch insert row has {} values for {} columns.",
                    values.len(),
                    columns.len()
                )));
            }
            tuples.push(format!("({})", values.join(", ")));
        }
        if tuples.is_empty() {
            return Ok((String::new(), params));
        }
        let sql = format!(
            "INSERT INTO {}{} VALUES {}",
            self.quoter.quote_table_name(table),
            self.column_list(columns),
            tuples.join(", ")
        );
        Ok(self.finish("insert", sql, params))
    }

    /// `UPDATE t SET "a"=:pv0 WHERE ...`. An empty condition updates every row.
    pub fn update(
        &self,
        table: &str,
        row: Vec<(String, Operand)>,
        condition: impl Into<Option<Where>>,
    ) -> QbResult<(String, Params)> {
        if row.is_empty() {
            return Err(QbError::invalid_argument("Update requires at least one column."));
        }
        let mut params = Params::new();
        let mut sets = Vec::with_capacity(row.len());
        for (column, value) in &row {
            let value = self.build_operand(value, &mut params)?;
            sets.push(format!("{}={value}", self.quoter.quote_column_name(column)));
        }
        let mut sql = format!(
            "UPDATE {} SET {}",
            self.quoter.quote_table_name(table),
            sets.join(", ")
        );
        self.push_where(&mut sql, condition.into(), &mut params)?;
        Ok(self.finish("update", sql, params))
    }

    /// `DELETE FROM t WHERE ...`. An empty condition deletes every row.
    pub fn delete(
        &self,
        table: &str,
        condition: impl Into<Option<Where>>,
    ) -> QbResult<(String, Params)> {
        let mut params = Params::new();
        let mut sql = format!("DELETE FROM {}", self.quoter.quote_table_name(table));
        self.push_where(&mut sql, condition.into(), &mut params)?;
        Ok(self.finish("delete", sql, params))
    }

    fn column_list(&self, columns: &[&str]) -> String {
        if columns.is_empty() {
            return String::new();
        }
        let quoted: Vec<String> = columns
            .iter()
            .map(|c| self.quoter.quote_column_name(c))
            .collect();
        format!(" ({})", quoted.join(", "))
    }

    fn push_where(
        &self,
        sql: &mut String,
        condition: Option<Where>,
        params: &mut Params,
    ) -> QbResult<()> {
        if let Some(condition) = condition {
            let condition = self.build_condition(&condition, params)?;
            if !condition.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&condition);
            }
        }
        Ok(())
    }
}
