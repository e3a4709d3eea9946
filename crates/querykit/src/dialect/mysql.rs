//! MySQL / MariaDB.

use super::postgres::{build_array_operand, overlap_json_values};
use super::{Dialect, DialectKind, unsupported};
use crate::builder::{
    BuilderRegistry, ExpressionBuilder, Node, NodeKind, OperatorRegistry, simple_operator,
    unexpected_node,
};
use crate::condition::Condition;
use crate::error::QbResult;
use crate::expr::Expr;
use crate::query_builder::QueryBuilder;
use crate::quoter::Quoter;
use crate::value::Params;

const TYPES: &[(&str, &str)] = &[
    ("pk", "int(11) NOT NULL AUTO_INCREMENT PRIMARY KEY"),
    ("upk", "int(10) UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY"),
    ("bigpk", "bigint(20) NOT NULL AUTO_INCREMENT PRIMARY KEY"),
    ("ubigpk", "bigint(20) UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY"),
    ("char", "char(1)"),
    ("string", "varchar(255)"),
    ("text", "text"),
    ("tinyint", "tinyint(3)"),
    ("smallint", "smallint(6)"),
    ("integer", "int(11)"),
    ("bigint", "bigint(20)"),
    ("float", "float"),
    ("double", "double"),
    ("decimal", "decimal(10,0)"),
    ("datetime", "datetime(0)"),
    ("timestamp", "timestamp(0)"),
    ("time", "time(0)"),
    ("date", "date"),
    ("binary", "blob"),
    ("boolean", "bit(1)"),
    ("money", "decimal(19,4)"),
    ("json", "json"),
];

/// Largest row count MySQL accepts, used for an offset without a limit.
const MAX_LIMIT: &str = "18446744073709551615";

#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl Dialect for MySql {
    fn kind(&self) -> DialectKind {
        DialectKind::MySql
    }

    fn quoter(&self) -> Quoter {
        Quoter::new(('`', '`'), ('`', '`'))
    }

    fn build_limit(&self, limit: Option<&str>, offset: Option<&str>) -> String {
        match (limit, offset) {
            (Some(limit), Some(offset)) => format!("LIMIT {limit} OFFSET {offset}"),
            (Some(limit), None) => format!("LIMIT {limit}"),
            (None, Some(offset)) => format!("LIMIT {MAX_LIMIT} OFFSET {offset}"),
            (None, None) => String::new(),
        }
    }

    fn empty_insert_values(&self) -> &'static str {
        " () VALUES ()"
    }

    fn default_types(&self) -> &'static [(&'static str, &'static str)] {
        TYPES
    }

    fn register(&self, builders: &mut BuilderRegistry, operators: &mut OperatorRegistry) {
        builders
            .register(NodeKind::ArrayMerge, MySqlArrayMergeBuilder)
            .register(NodeKind::ArrayOverlaps, JsonOverlapsBuilder)
            .register(NodeKind::JsonOverlaps, JsonOverlapsBuilder);
        for op in ["REGEXP", "NOT REGEXP", "<=>"] {
            operators.register(op, simple_operator);
        }
    }

    fn rename_table(&self, table: &str, new_name: &str) -> QbResult<String> {
        Ok(format!("RENAME TABLE {table} TO {new_name}"))
    }

    fn drop_index(&self, table: &str, name: &str) -> QbResult<String> {
        Ok(format!("DROP INDEX {name} ON {table}"))
    }

    fn drop_foreign_key(&self, table: &str, name: &str) -> QbResult<String> {
        Ok(format!("ALTER TABLE {table} DROP FOREIGN KEY {name}"))
    }

    fn comment_on_column(&self, _table: &str, _column: &str, _comment: &str) -> QbResult<String> {
        Err(unsupported(
            self.kind(),
            "column comments without the full column definition",
        ))
    }

    fn comment_on_table(&self, table: &str, comment: &str) -> QbResult<String> {
        let comment = if comment == "NULL" { "''" } else { comment };
        Ok(format!("ALTER TABLE {table} COMMENT {comment}"))
    }
}

/// `JSON_OVERLAPS(column, values)`, for both native and JSON arrays.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonOverlapsBuilder;

impl ExpressionBuilder for JsonOverlapsBuilder {
    fn build(&self, qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let Node::Condition(Condition::Overlap(c)) = node else {
            return Err(unexpected_node("JsonOverlapsBuilder", node));
        };
        let column = qb.build_column(&c.column, params)?;
        let values = overlap_json_values(qb, &c.values, params)?;
        Ok(format!("JSON_OVERLAPS({column}, {values})"))
    }
}

/// Distinct union of JSON arrays through `JSON_TABLE`, aggregated back with `JSON_ARRAYAGG`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlArrayMergeBuilder;

impl ExpressionBuilder for MySqlArrayMergeBuilder {
    fn build(&self, qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let Node::Expr(Expr::Function(function)) = node else {
            return Err(unexpected_node("MySqlArrayMergeBuilder", node));
        };
        let mut selects = Vec::with_capacity(function.operands().len());
        for operand in function.operands() {
            let array = build_array_operand(qb, operand, params)?;
            selects.push(format!(
                "SELECT value FROM JSON_TABLE({array}, '$[*]' COLUMNS(value json PATH '$')) AS t"
            ));
        }
        Ok(format!(
            "(SELECT JSON_ARRAYAGG(value) AS value FROM ({}) AS t)",
            selects.join(" UNION ")
        ))
    }
}
