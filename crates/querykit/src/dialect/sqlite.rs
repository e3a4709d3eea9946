//! SQLite.

use super::postgres::{build_array_operand, overlap_json_values};
use super::{Dialect, DialectKind, unsupported};
use crate::builder::{
    BuilderRegistry, CompositeInStyle, ExpressionBuilder, FunctionCallBuilder, InBuilder,
    LikeBuilder, Node, NodeKind, OperatorRegistry, simple_operator, unexpected_node,
};
use crate::condition::Condition;
use crate::error::QbResult;
use crate::expr::Expr;
use crate::query_builder::QueryBuilder;
use crate::quoter::Quoter;
use crate::value::Params;

const TYPES: &[(&str, &str)] = &[
    ("pk", "integer PRIMARY KEY AUTOINCREMENT NOT NULL"),
    ("upk", "integer PRIMARY KEY AUTOINCREMENT NOT NULL"),
    ("bigpk", "integer PRIMARY KEY AUTOINCREMENT NOT NULL"),
    ("ubigpk", "integer PRIMARY KEY AUTOINCREMENT NOT NULL"),
    ("char", "char(1)"),
    ("string", "varchar(255)"),
    ("text", "text"),
    ("tinyint", "tinyint"),
    ("smallint", "smallint"),
    ("integer", "integer"),
    ("bigint", "bigint"),
    ("float", "float"),
    ("double", "double"),
    ("decimal", "decimal(10,0)"),
    ("datetime", "datetime"),
    ("timestamp", "timestamp"),
    ("time", "time"),
    ("date", "date"),
    ("binary", "blob"),
    ("boolean", "boolean"),
    ("money", "decimal(19,4)"),
    ("json", "json"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
    }

    fn quoter(&self) -> Quoter {
        Quoter::new(('`', '`'), ('`', '`'))
    }

    fn bool_literal(&self, value: bool) -> &'static str {
        if value { "1" } else { "0" }
    }

    fn build_limit(&self, limit: Option<&str>, offset: Option<&str>) -> String {
        match (limit, offset) {
            (Some(limit), Some(offset)) => format!("LIMIT {limit} OFFSET {offset}"),
            (Some(limit), None) => format!("LIMIT {limit}"),
            (None, Some(offset)) => format!("LIMIT -1 OFFSET {offset}"),
            (None, None) => String::new(),
        }
    }

    fn default_types(&self) -> &'static [(&'static str, &'static str)] {
        TYPES
    }

    fn register(&self, builders: &mut BuilderRegistry, operators: &mut OperatorRegistry) {
        builders
            .register(NodeKind::Greatest, FunctionCallBuilder::new("MAX"))
            .register(NodeKind::Least, FunctionCallBuilder::new("MIN"))
            .register(NodeKind::In, InBuilder::new(CompositeInStyle::OrOfAnds))
            .register(NodeKind::Like, LikeBuilder::default().with_escape_sql(" ESCAPE '\\'"))
            .register(NodeKind::ArrayMerge, SqliteArrayMergeBuilder)
            .register(NodeKind::ArrayOverlaps, JsonEachOverlapsBuilder)
            .register(NodeKind::JsonOverlaps, JsonEachOverlapsBuilder);
        for op in ["GLOB", "NOT GLOB"] {
            operators.register(op, simple_operator);
        }
    }

    fn alter_column(&self, _table: &str, _column: &str, _column_type: &str) -> QbResult<String> {
        Err(unsupported(self.kind(), "altering columns"))
    }

    fn truncate_table(&self, table: &str) -> String {
        format!("DELETE FROM {table}")
    }

    fn drop_foreign_key(&self, _table: &str, _name: &str) -> QbResult<String> {
        Err(unsupported(self.kind(), "dropping foreign keys"))
    }

    fn comment_on_column(&self, _table: &str, _column: &str, _comment: &str) -> QbResult<String> {
        Err(unsupported(self.kind(), "column comments"))
    }

    fn comment_on_table(&self, _table: &str, _comment: &str) -> QbResult<String> {
        Err(unsupported(self.kind(), "table comments"))
    }

    fn supports_constraint_alteration(&self) -> bool {
        false
    }
}

/// Overlap of JSON arrays through `json_each` and `INTERSECT`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEachOverlapsBuilder;

impl ExpressionBuilder for JsonEachOverlapsBuilder {
    fn build(&self, qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let Node::Condition(Condition::Overlap(c)) = node else {
            return Err(unexpected_node("JsonEachOverlapsBuilder", node));
        };
        let column = qb.build_column(&c.column, params)?;
        let values = overlap_json_values(qb, &c.values, params)?;
        Ok(format!(
            "EXISTS(SELECT value FROM json_each({column}) INTERSECT SELECT value FROM json_each({values}))=1"
        ))
    }
}

/// Distinct union of JSON arrays through `json_each`, aggregated with `json_group_array`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteArrayMergeBuilder;

impl ExpressionBuilder for SqliteArrayMergeBuilder {
    fn build(&self, qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let Node::Expr(Expr::Function(function)) = node else {
            return Err(unexpected_node("SqliteArrayMergeBuilder", node));
        };
        let mut selects = Vec::with_capacity(function.operands().len());
        for operand in function.operands() {
            let array = build_array_operand(qb, operand, params)?;
            selects.push(format!("SELECT value FROM json_each({array})"));
        }
        Ok(format!(
            "(SELECT json_group_array(value) AS value FROM ({}))",
            selects.join(" UNION ")
        ))
    }
}
