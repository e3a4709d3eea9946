//! SELECT compilation.

use super::QueryBuilder;
use crate::error::{QbError, QbResult};
use crate::query::normalize::{expression_without_alias, extract_alias};
use crate::query::{
    Direction, Join, Limit, OrderItem, Query, SelectColumn, SelectItem, TableRef, TableSource,
    Union, WithQuery,
};
use crate::value::{Params, normalize_name};

const SEPARATOR: &str = " ";

impl QueryBuilder {
    /// Compile a SELECT into `params`, which may already hold entries of an enclosing
    /// statement. Token quoting (`{{table}}`) is left to the caller.
    pub fn build_query(&self, query: &Query, params: &mut Params) -> QbResult<String> {
        for (name, param) in &query.params {
            match params.get(name) {
                Some(existing) if existing != param => {
                    return Err(QbError::invalid_argument(format!(
                        "Parameter '{}' is already bound to a different value.",
                        normalize_name(name)
                    )));
                }
                Some(_) => {}
                None => params.set(name, param.clone()),
            }
        }

        let mut clauses: Vec<String> = Vec::new();
        if !query.with_queries.is_empty() {
            clauses.push(self.build_with(&query.with_queries, params)?);
        }
        clauses.push(self.build_select(query, params)?);
        if !query.from.is_empty() {
            clauses.push(self.build_from(&query.from, params)?);
        }
        for join in &query.joins {
            clauses.push(self.build_join(join, params)?);
        }
        if let Some(condition) = &query.where_ {
            let sql = self.build_condition(condition, params)?;
            if !sql.is_empty() {
                clauses.push(format!("WHERE {sql}"));
            }
        }
        if !query.group_by.is_empty() {
            let columns = query
                .group_by
                .iter()
                .map(|column| self.build_select_column(column, params))
                .collect::<QbResult<Vec<_>>>()?;
            clauses.push(format!("GROUP BY {}", columns.join(", ")));
        }
        if let Some(condition) = &query.having {
            let sql = self.build_condition(condition, params)?;
            if !sql.is_empty() {
                clauses.push(format!("HAVING {sql}"));
            }
        }
        if !query.order_by.is_empty() {
            clauses.push(self.build_order_by(&query.order_by, params)?);
        }
        let limit = self.build_limit_clause(query, params)?;
        if !limit.is_empty() {
            clauses.push(limit);
        }

        let sql = clauses.join(SEPARATOR);
        if query.unions.is_empty() {
            return Ok(sql);
        }
        let unions = self.build_unions(&query.unions, params)?;
        Ok(format!("({sql}){SEPARATOR}{unions}"))
    }

    fn build_with(&self, queries: &[WithQuery], params: &mut Params) -> QbResult<String> {
        let recursive = queries.iter().any(|w| w.recursive);
        let mut parts = Vec::with_capacity(queries.len());
        for with in queries {
            let alias = if with.alias.contains('(') {
                with.alias.clone()
            } else {
                self.quoter.quote_table_name(&with.alias)
            };
            let sql = self.build_query(&with.query, params)?;
            parts.push(format!("{alias} AS ({sql})"));
        }
        let keyword = if recursive { "WITH RECURSIVE" } else { "WITH" };
        Ok(format!("{keyword} {}", parts.join(", ")))
    }

    fn build_select(&self, query: &Query, params: &mut Params) -> QbResult<String> {
        let mut select = String::from(if query.distinct {
            "SELECT DISTINCT"
        } else {
            "SELECT"
        });
        if let Some(option) = &query.select_option {
            select.push(' ');
            select.push_str(option);
        }
        if query.select.is_empty() {
            select.push_str(" *");
            return Ok(select);
        }
        let columns = query
            .select
            .iter()
            .map(|item| self.build_select_item(item, params))
            .collect::<QbResult<Vec<_>>>()?;
        select.push(' ');
        select.push_str(&columns.join(", "));
        Ok(select)
    }

    fn build_select_item(&self, item: &SelectItem, params: &mut Params) -> QbResult<String> {
        let column = self.build_select_column(&item.column, params)?;
        Ok(match &item.alias {
            Some(alias) => format!("{column} AS {}", self.quoter.quote_column_name(alias)),
            None => column,
        })
    }

    fn build_select_column(&self, column: &SelectColumn, params: &mut Params) -> QbResult<String> {
        match column {
            SelectColumn::Name(name) => Ok(self.quoter.quote_column_name(name)),
            SelectColumn::Expr(expr) => self.build_expression(expr, params),
        }
    }

    fn build_from(&self, tables: &[TableRef], params: &mut Params) -> QbResult<String> {
        let tables = tables
            .iter()
            .map(|table| self.build_table(table, params))
            .collect::<QbResult<Vec<_>>>()?;
        Ok(format!("FROM {}", tables.join(", ")))
    }

    fn build_join(&self, join: &Join, params: &mut Params) -> QbResult<String> {
        let mut sql = format!("{} {}", join.kind, self.build_table(&join.table, params)?);
        if let Some(on) = &join.on {
            let condition = self.build_condition(on, params)?;
            if !condition.is_empty() {
                sql.push_str(" ON ");
                sql.push_str(&condition);
            }
        }
        Ok(sql)
    }

    /// A FROM or JOIN entry: `"table" "alias"`, or `(sub-query) "alias"`.
    fn build_table(&self, table: &TableRef, params: &mut Params) -> QbResult<String> {
        let quoter = &self.quoter;
        match (&table.alias, &table.source) {
            (Some(alias), TableSource::Expr(expr)) => Ok(format!(
                "{} {}",
                self.build_expression(expr, params)?,
                quoter.quote_table_name(alias)
            )),
            (Some(alias), TableSource::Name(name)) => {
                let name = if name.contains('(') {
                    name.clone()
                } else {
                    quoter.quote_table_name(name)
                };
                Ok(format!("{name} {}", quoter.quote_table_name(alias)))
            }
            (None, TableSource::Name(name)) if name.contains('(') => Ok(name.clone()),
            (None, TableSource::Name(name)) => Ok(match extract_alias(name) {
                Some((table, alias)) => format!(
                    "{} {}",
                    quoter.quote_table_name(&table),
                    quoter.quote_table_name(&alias)
                ),
                None => quoter.quote_table_name(name),
            }),
            (None, TableSource::Expr(_)) => Err(expression_without_alias()),
        }
    }

    fn build_order_by(&self, items: &[OrderItem], params: &mut Params) -> QbResult<String> {
        let mut parts = Vec::with_capacity(items.len());
        for item in items {
            parts.push(match item {
                OrderItem::Column(column, Direction::Desc) => {
                    format!("{} DESC", self.quoter.quote_column_name(column))
                }
                OrderItem::Column(column, Direction::Asc) => self.quoter.quote_column_name(column),
                OrderItem::Expr(expr) => self.build_expression(expr, params)?,
            });
        }
        Ok(format!("ORDER BY {}", parts.join(", ")))
    }

    fn build_limit_clause(&self, query: &Query, params: &mut Params) -> QbResult<String> {
        let limit = match &query.limit {
            Some(limit) => Some(self.build_limit_value(limit, params)?),
            None => None,
        };
        let offset = match &query.offset {
            Some(Limit::Count(0)) | None => None,
            Some(offset) => Some(self.build_limit_value(offset, params)?),
        };
        Ok(self.dialect.build_limit(limit.as_deref(), offset.as_deref()))
    }

    fn build_limit_value(&self, limit: &Limit, params: &mut Params) -> QbResult<String> {
        match limit {
            Limit::Count(n) => Ok(n.to_string()),
            Limit::Expr(expr) => self.build_expression(expr, params),
        }
    }

    fn build_unions(&self, unions: &[Union], params: &mut Params) -> QbResult<String> {
        let mut parts = Vec::with_capacity(unions.len());
        for union in unions {
            let keyword = if union.all { "UNION ALL" } else { "UNION" };
            let sql = self.build_query(&union.query, params)?;
            parts.push(format!("{keyword} ({sql})"));
        }
        Ok(parts.join(SEPARATOR))
    }
}
