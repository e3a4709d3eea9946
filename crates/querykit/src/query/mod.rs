//! The query AST root.
//!
//! [`Query`] is populated with consuming mutators (`fn select(self, ..) -> Self`) and
//! compiled by [`QueryBuilder::build`](crate::QueryBuilder::build). Compiling never
//! modifies the query, so compiling the same value twice yields the same statement.
//!
//! ```ignore
//! use querykit::{hash, Query, QueryBuilder};
//!
//! let query = Query::new()
//!     .select(["id", "name"])
//!     .from(["customer"])
//!     .where_(hash! {"status" => "active", "age" => [18, 19, 20]});
//! let (sql, params) = QueryBuilder::postgres().build(&query)?;
//! ```

pub(crate) mod normalize;

use crate::dsl::Where;
use crate::error::QbResult;
use crate::expr::Expr;
use crate::quoter::Quoter;
use crate::value::Param;

/// A column of the select or group-by list.
#[derive(Debug, Clone)]
pub enum SelectColumn {
    /// A column name or raw fragment; names without `(` are quoted.
    Name(String),
    Expr(Expr),
}

impl From<&str> for SelectColumn {
    fn from(v: &str) -> Self {
        SelectColumn::Name(v.to_string())
    }
}

impl From<String> for SelectColumn {
    fn from(v: String) -> Self {
        SelectColumn::Name(v)
    }
}

impl From<Expr> for SelectColumn {
    fn from(v: Expr) -> Self {
        SelectColumn::Expr(v)
    }
}

impl From<Query> for SelectColumn {
    fn from(v: Query) -> Self {
        SelectColumn::Expr(Expr::query(v))
    }
}

#[derive(Debug, Clone)]
pub struct SelectItem {
    pub alias: Option<String>,
    pub column: SelectColumn,
}

impl SelectItem {
    /// Deduplication key: the alias, or the name of a plain column.
    fn key(&self) -> Option<&str> {
        match (&self.alias, &self.column) {
            (Some(alias), _) => Some(alias),
            (None, SelectColumn::Name(name)) if !name.contains('(') => Some(name),
            _ => None,
        }
    }
}

/// Source of a FROM or JOIN entry.
#[derive(Debug, Clone)]
pub enum TableSource {
    /// A table name, optionally with an inline alias (`"customer c"`).
    Name(String),
    /// A sub-query or expression; requires an alias.
    Expr(Expr),
}

impl From<&str> for TableSource {
    fn from(v: &str) -> Self {
        TableSource::Name(v.to_string())
    }
}

impl From<String> for TableSource {
    fn from(v: String) -> Self {
        TableSource::Name(v)
    }
}

impl From<Expr> for TableSource {
    fn from(v: Expr) -> Self {
        TableSource::Expr(v)
    }
}

impl From<Query> for TableSource {
    fn from(v: Query) -> Self {
        TableSource::Expr(Expr::query(v))
    }
}

#[derive(Debug, Clone)]
pub struct TableRef {
    pub alias: Option<String>,
    pub source: TableSource,
}

impl TableRef {
    pub fn new(source: impl Into<TableSource>) -> Self {
        Self {
            alias: None,
            source: source.into(),
        }
    }

    pub fn aliased(alias: impl Into<String>, source: impl Into<TableSource>) -> Self {
        Self {
            alias: Some(alias.into()),
            source: source.into(),
        }
    }
}

impl From<&str> for TableRef {
    fn from(v: &str) -> Self {
        TableRef::new(v)
    }
}

impl From<String> for TableRef {
    fn from(v: String) -> Self {
        TableRef::new(v)
    }
}

impl From<Expr> for TableRef {
    fn from(v: Expr) -> Self {
        TableRef::new(v)
    }
}

impl From<Query> for TableRef {
    fn from(v: Query) -> Self {
        TableRef::new(v)
    }
}

#[derive(Debug, Clone)]
pub struct Join {
    /// `INNER JOIN`, `LEFT JOIN`, ...
    pub kind: String,
    pub table: TableRef,
    pub on: Option<Where>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub enum OrderItem {
    Column(String, Direction),
    Expr(Expr),
}

/// LIMIT or OFFSET value.
#[derive(Debug, Clone)]
pub enum Limit {
    Count(u64),
    Expr(Expr),
}

#[derive(Debug, Clone)]
pub struct Union {
    pub query: Box<Query>,
    pub all: bool,
}

/// A common table expression.
#[derive(Debug, Clone)]
pub struct WithQuery {
    pub query: Box<Query>,
    pub alias: String,
    pub recursive: bool,
}

/// A SELECT statement.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub(crate) select: Vec<SelectItem>,
    pub(crate) select_option: Option<String>,
    pub(crate) distinct: bool,
    pub(crate) from: Vec<TableRef>,
    pub(crate) joins: Vec<Join>,
    pub(crate) where_: Option<Where>,
    pub(crate) group_by: Vec<SelectColumn>,
    pub(crate) having: Option<Where>,
    pub(crate) order_by: Vec<OrderItem>,
    pub(crate) limit: Option<Limit>,
    pub(crate) offset: Option<Limit>,
    pub(crate) unions: Vec<Union>,
    pub(crate) with_queries: Vec<WithQuery>,
    pub(crate) params: Vec<(String, Param)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== SELECT ====================

    /// Replace the select list.
    ///
    /// String columns may be comma separated (`"id, name"`) and may carry an alias
    /// (`"name AS n"`, `"name n"`). Repeated plain columns are selected once.
    pub fn select<I, C>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<SelectColumn>,
    {
        self.select.clear();
        self.add_select(columns)
    }

    /// Append to the select list.
    pub fn add_select<I, C>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<SelectColumn>,
    {
        for column in columns {
            match column.into() {
                SelectColumn::Name(text) => {
                    for part in normalize::split_columns(&text) {
                        let item = match normalize::select_alias(&part) {
                            Some((expr, alias)) => SelectItem {
                                alias: Some(alias),
                                column: SelectColumn::Name(expr),
                            },
                            None => SelectItem {
                                alias: None,
                                column: SelectColumn::Name(part),
                            },
                        };
                        self.push_select(item);
                    }
                }
                expr @ SelectColumn::Expr(_) => self.push_select(SelectItem {
                    alias: None,
                    column: expr,
                }),
            }
        }
        self
    }

    /// Select `column AS alias`. Sub-queries in the select list need this form.
    pub fn select_as(mut self, alias: impl Into<String>, column: impl Into<SelectColumn>) -> Self {
        self.push_select(SelectItem {
            alias: Some(alias.into()),
            column: column.into(),
        });
        self
    }

    /// Text placed after `SELECT` (e.g. `SQL_CALC_FOUND_ROWS`).
    pub fn select_option(mut self, option: impl Into<String>) -> Self {
        self.select_option = Some(option.into());
        self
    }

    pub fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    fn push_select(&mut self, item: SelectItem) {
        if let Some(key) = item.key() {
            if let Some(pos) = self.select.iter().position(|s| s.key() == Some(key)) {
                self.select[pos] = item;
                return;
            }
        }
        self.select.push(item);
    }

    // ==================== FROM / JOIN ====================

    /// Replace the FROM list.
    pub fn from<I, T>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TableRef>,
    {
        self.from = tables.into_iter().map(Into::into).collect();
        self
    }

    /// Append `source alias` to the FROM list.
    pub fn from_as(mut self, alias: impl Into<String>, source: impl Into<TableSource>) -> Self {
        self.from.push(TableRef::aliased(alias, source));
        self
    }

    pub fn join(mut self, kind: impl Into<String>, table: impl Into<TableRef>, on: Option<Where>) -> Self {
        self.joins.push(Join {
            kind: kind.into(),
            table: table.into(),
            on,
        });
        self
    }

    pub fn inner_join(self, table: impl Into<TableRef>, on: impl Into<Where>) -> Self {
        self.join("INNER JOIN", table, Some(on.into()))
    }

    pub fn left_join(self, table: impl Into<TableRef>, on: impl Into<Where>) -> Self {
        self.join("LEFT JOIN", table, Some(on.into()))
    }

    pub fn right_join(self, table: impl Into<TableRef>, on: impl Into<Where>) -> Self {
        self.join("RIGHT JOIN", table, Some(on.into()))
    }

    pub fn cross_join(self, table: impl Into<TableRef>) -> Self {
        self.join("CROSS JOIN", table, None)
    }

    // ==================== WHERE ====================

    /// Replace the WHERE condition.
    pub fn where_(mut self, condition: impl Into<Where>) -> Self {
        self.where_ = Some(condition.into());
        self
    }

    /// AND a condition onto WHERE, extending a top-level `AND` in place.
    pub fn and_where(mut self, condition: impl Into<Where>) -> Self {
        self.where_ = Some(and_condition(self.where_.take(), condition.into()));
        self
    }

    pub fn or_where(mut self, condition: impl Into<Where>) -> Self {
        self.where_ = Some(or_condition(self.where_.take(), condition.into()));
        self
    }

    /// Like [`Query::where_`], after removing empty operands. A fully empty
    /// condition leaves the query unchanged.
    pub fn filter_where(self, condition: impl Into<Where>) -> Self {
        match condition.into().filter() {
            Some(condition) => self.where_(condition),
            None => self,
        }
    }

    pub fn and_filter_where(self, condition: impl Into<Where>) -> Self {
        match condition.into().filter() {
            Some(condition) => self.and_where(condition),
            None => self,
        }
    }

    pub fn or_filter_where(self, condition: impl Into<Where>) -> Self {
        match condition.into().filter() {
            Some(condition) => self.or_where(condition),
            None => self,
        }
    }

    // ==================== GROUP BY / HAVING ====================

    /// Replace the GROUP BY list. Strings may be comma separated.
    pub fn group_by<I, C>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<SelectColumn>,
    {
        self.group_by.clear();
        self.add_group_by(columns)
    }

    pub fn add_group_by<I, C>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<SelectColumn>,
    {
        for column in columns {
            match column.into() {
                SelectColumn::Name(text) => self.group_by.extend(
                    normalize::split_columns(&text)
                        .into_iter()
                        .map(SelectColumn::Name),
                ),
                expr => self.group_by.push(expr),
            }
        }
        self
    }

    pub fn having(mut self, condition: impl Into<Where>) -> Self {
        self.having = Some(condition.into());
        self
    }

    pub fn and_having(mut self, condition: impl Into<Where>) -> Self {
        self.having = Some(and_condition(self.having.take(), condition.into()));
        self
    }

    pub fn or_having(mut self, condition: impl Into<Where>) -> Self {
        self.having = Some(or_condition(self.having.take(), condition.into()));
        self
    }

    pub fn filter_having(self, condition: impl Into<Where>) -> Self {
        match condition.into().filter() {
            Some(condition) => self.having(condition),
            None => self,
        }
    }

    pub fn and_filter_having(self, condition: impl Into<Where>) -> Self {
        match condition.into().filter() {
            Some(condition) => self.and_having(condition),
            None => self,
        }
    }

    pub fn or_filter_having(self, condition: impl Into<Where>) -> Self {
        match condition.into().filter() {
            Some(condition) => self.or_having(condition),
            None => self,
        }
    }

    // ==================== ORDER BY / LIMIT ====================

    /// Replace ORDER BY from shorthand text (`"created_at DESC, id"`).
    pub fn order_by(mut self, columns: &str) -> Self {
        self.order_by.clear();
        self.add_order_by(columns)
    }

    /// Append ORDER BY shorthand. A column already ordered keeps its position.
    pub fn add_order_by(mut self, columns: &str) -> Self {
        if columns.contains('(') {
            self.order_by.push(OrderItem::Expr(Expr::raw(columns.trim())));
            return self;
        }
        for (column, direction) in normalize::parse_order_by(columns) {
            self.push_order(column, direction);
        }
        self
    }

    pub fn order_by_column(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.push_order(column.into(), direction);
        self
    }

    pub fn order_by_expr(mut self, expr: impl Into<Expr>) -> Self {
        self.order_by.push(OrderItem::Expr(expr.into()));
        self
    }

    fn push_order(&mut self, column: String, direction: Direction) {
        let existing = self
            .order_by
            .iter()
            .position(|o| matches!(o, OrderItem::Column(c, _) if *c == column));
        match existing {
            Some(pos) => self.order_by[pos] = OrderItem::Column(column, direction),
            None => self.order_by.push(OrderItem::Column(column, direction)),
        }
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(Limit::Count(limit));
        self
    }

    pub fn limit_expr(mut self, limit: impl Into<Expr>) -> Self {
        self.limit = Some(Limit::Expr(limit.into()));
        self
    }

    /// Set OFFSET. An offset of zero is not rendered.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(Limit::Count(offset));
        self
    }

    pub fn offset_expr(mut self, offset: impl Into<Expr>) -> Self {
        self.offset = Some(Limit::Expr(offset.into()));
        self
    }

    // ==================== UNION / WITH / PARAMS ====================

    pub fn union(mut self, query: Query, all: bool) -> Self {
        self.unions.push(Union {
            query: Box::new(query),
            all,
        });
        self
    }

    /// Prefix the statement with `WITH [RECURSIVE] alias AS (query)`.
    pub fn with_query(mut self, query: Query, alias: impl Into<String>, recursive: bool) -> Self {
        self.with_queries.push(WithQuery {
            query: Box::new(query),
            alias: alias.into(),
            recursive,
        });
        self
    }

    /// Named parameters referenced by raw fragments (`:name`).
    ///
    /// These names are shared with the enclosing statement when the query is used as a
    /// sub-query. Binding a name that the statement already holds with a different
    /// value is an error at compile time; the same value is accepted.
    pub fn add_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Param>,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    // ==================== Accessors ====================

    pub fn select_items(&self) -> &[SelectItem] {
        &self.select
    }

    pub fn from_tables(&self) -> &[TableRef] {
        &self.from
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn where_condition(&self) -> Option<&Where> {
        self.where_.as_ref()
    }

    pub fn having_condition(&self) -> Option<&Where> {
        self.having.as_ref()
    }

    pub fn order_items(&self) -> &[OrderItem] {
        &self.order_by
    }

    pub fn params(&self) -> &[(String, Param)] {
        &self.params
    }

    /// Alias to table mapping of the FROM list, in `{{name}}` form.
    ///
    /// Fails when an expression or sub-query has no alias.
    pub fn tables_used_in_from(&self) -> QbResult<Vec<(String, TableSource)>> {
        normalize::clean_up_table_names(&self.from, &Quoter::default())
    }
}

fn and_condition(existing: Option<Where>, condition: Where) -> Where {
    match existing {
        None => condition,
        Some(Where::Op { operator, mut operands }) if operator.trim().eq_ignore_ascii_case("and") => {
            operands.push(condition.into());
            Where::Op { operator, operands }
        }
        Some(existing) => Where::Op {
            operator: "and".to_string(),
            operands: vec![existing.into(), condition.into()],
        },
    }
}

fn or_condition(existing: Option<Where>, condition: Where) -> Where {
    match existing {
        None => condition,
        Some(existing) => Where::Op {
            operator: "or".to_string(),
            operands: vec![existing.into(), condition.into()],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cond, hash};

    #[test]
    fn select_dedupes_plain_columns_and_aliases() {
        let q = Query::new()
            .select(["id, name", "name"])
            .add_select(["email AS mail", "other mail"]);
        let keys: Vec<Option<&str>> = q.select_items().iter().map(SelectItem::key).collect();
        assert_eq!(keys, vec![Some("id"), Some("name"), Some("mail")]);
        match &q.select_items()[2].column {
            SelectColumn::Name(n) => assert_eq!(n, "other"),
            SelectColumn::Expr(_) => panic!("expected a name"),
        }
    }

    #[test]
    fn select_keeps_each_expression() {
        let q = Query::new().select(["COUNT(*)", "COUNT(*)"]);
        assert_eq!(q.select_items().len(), 2);
    }

    #[test]
    fn and_where_extends_top_level_and() {
        let q = Query::new()
            .where_(cond!["and", cond!["=", "a", 1]])
            .and_where(cond!["=", "b", 2])
            .and_where(cond!["=", "c", 3]);
        match q.where_condition() {
            Some(Where::Op { operator, operands }) => {
                assert_eq!(operator, "and");
                assert_eq!(operands.len(), 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn or_where_wraps() {
        let q = Query::new().where_(hash! {"a" => 1}).or_where(hash! {"b" => 2});
        assert!(matches!(q.where_condition(), Some(Where::Op { operator, operands }) if operator == "or" && operands.len() == 2));
    }

    #[test]
    fn filter_where_ignores_empty_condition() {
        let q = Query::new()
            .where_(hash! {"a" => 1})
            .and_filter_where(hash! {"b" => ""});
        assert!(matches!(q.where_condition(), Some(Where::Hash(pairs)) if pairs.len() == 1));
    }

    #[test]
    fn order_by_replaces_direction_in_place() {
        let q = Query::new().order_by("a, b DESC").add_order_by("a desc");
        let items: Vec<(String, Direction)> = q
            .order_items()
            .iter()
            .filter_map(|o| match o {
                OrderItem::Column(c, d) => Some((c.clone(), *d)),
                OrderItem::Expr(_) => None,
            })
            .collect();
        assert_eq!(
            items,
            vec![("a".into(), Direction::Desc), ("b".into(), Direction::Desc)]
        );
    }

    #[test]
    fn tables_used_in_from_parses_aliases() {
        let q = Query::new().from(["customer c", "{{%order}}"]);
        let tables = q.tables_used_in_from().unwrap();
        assert_eq!(tables[0].0, "{{c}}");
        assert_eq!(tables[1].0, "{{%order}}");
    }
}
