//! PostgreSQL.

use super::{Dialect, DialectKind};
use crate::builder::{
    ExpressionBuilder, Node, NodeKind, OperatorRegistry, BuilderRegistry, like_operator,
    simple_operator, unexpected_node,
};
use crate::condition::{Condition, OverlapCondition};
use crate::error::{QbError, QbResult};
use crate::expr::{ArraySource, ArrayValue, Expr, JsonValue, Operand};
use crate::query_builder::QueryBuilder;
use crate::quoter::Quoter;
use crate::value::{Param, ParamType, Params, Value};

const TYPES: &[(&str, &str)] = &[
    ("pk", "serial NOT NULL PRIMARY KEY"),
    ("upk", "serial NOT NULL PRIMARY KEY"),
    ("bigpk", "bigserial NOT NULL PRIMARY KEY"),
    ("ubigpk", "bigserial NOT NULL PRIMARY KEY"),
    ("uuid_pk", "uuid PRIMARY KEY"),
    ("char", "char(1)"),
    ("string", "varchar(255)"),
    ("text", "text"),
    ("tinyint", "smallint"),
    ("smallint", "smallint"),
    ("integer", "integer"),
    ("bigint", "bigint"),
    ("float", "double precision"),
    ("double", "double precision"),
    ("decimal", "numeric(10,0)"),
    ("datetime", "timestamp(0)"),
    ("timestamp", "timestamp(0)"),
    ("time", "time(0)"),
    ("date", "date"),
    ("binary", "bytea"),
    ("boolean", "boolean"),
    ("money", "numeric(19,4)"),
    ("json", "jsonb"),
    ("uuid", "uuid"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn kind(&self) -> DialectKind {
        DialectKind::Postgres
    }

    fn quoter(&self) -> Quoter {
        Quoter::new(('"', '"'), ('"', '"'))
    }

    fn default_types(&self) -> &'static [(&'static str, &'static str)] {
        TYPES
    }

    fn register(&self, builders: &mut BuilderRegistry, operators: &mut OperatorRegistry) {
        builders
            .register(NodeKind::Array, PgArrayBuilder)
            .register(NodeKind::Json, PgJsonBuilder)
            .register(NodeKind::Structured, PgStructuredBuilder)
            .register(NodeKind::ArrayMerge, PgArrayMergeBuilder)
            .register(NodeKind::ArrayOverlaps, PgArrayOverlapsBuilder)
            .register(NodeKind::JsonOverlaps, PgJsonOverlapsBuilder);

        for op in ["ILIKE", "NOT ILIKE", "OR ILIKE", "OR NOT ILIKE"] {
            operators.register(op, like_operator);
        }
        for op in ["@>", "<@", "~", "~*", "!~", "!~*", "IS DISTINCT FROM", "IS NOT DISTINCT FROM"] {
            operators.register(op, simple_operator);
        }
    }

    fn alter_column(&self, table: &str, column: &str, column_type: &str) -> QbResult<String> {
        Ok(format!("ALTER TABLE {table} ALTER COLUMN {column} TYPE {column_type}"))
    }
}

/// `::type[]` cast suffix; empty without a type.
fn array_type_hint(qb: &QueryBuilder, column_type: Option<&str>) -> String {
    match column_type {
        Some(ty) => {
            let ty = qb.column_type(ty);
            if ty.ends_with(']') {
                format!("::{ty}")
            } else {
                format!("::{ty}[]")
            }
        }
        None => String::new(),
    }
}

fn type_hint(qb: &QueryBuilder, db_type: Option<&str>) -> String {
    db_type.map_or_else(String::new, |ty| format!("::{}", qb.column_type(ty)))
}

/// `ARRAY[..]::type`, `ARRAY(sub-query)::type`, or `'{}'` when empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgArrayBuilder;

impl ExpressionBuilder for PgArrayBuilder {
    fn build(&self, qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let Node::Expr(Expr::Array(array)) = node else {
            return Err(unexpected_node("PgArrayBuilder", node));
        };
        let hint = array_type_hint(qb, array.column_type.as_deref());
        match &array.source {
            ArraySource::Query(query) => Ok(format!("ARRAY({}){hint}", qb.build_query(query, params)?)),
            ArraySource::Literal(literal) => {
                Ok(format!("{}{hint}", params.bind(Param::new(literal.as_str(), ParamType::Str))))
            }
            ArraySource::Values(values) if values.is_empty() => Ok(format!("'{{}}'{hint}")),
            ArraySource::Values(values) => {
                let items = values
                    .iter()
                    .map(|v| qb.build_value(v, params))
                    .collect::<Vec<_>>();
                Ok(format!("ARRAY[{}]{hint}", items.join(", ")))
            }
        }
    }
}

/// Encoded JSON placeholder with an optional `::json`/`::jsonb` cast.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgJsonBuilder;

impl ExpressionBuilder for PgJsonBuilder {
    fn build(&self, qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let Node::Expr(Expr::Json(json)) = node else {
            return Err(unexpected_node("PgJsonBuilder", node));
        };
        let placeholder = params.bind(Param::new(json.encoded(), ParamType::Str));
        Ok(format!("{placeholder}{}", type_hint(qb, json.db_type.as_deref())))
    }
}

/// `ROW(..)::type`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgStructuredBuilder;

impl ExpressionBuilder for PgStructuredBuilder {
    fn build(&self, qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let Node::Expr(Expr::Structured(structured)) = node else {
            return Err(unexpected_node("PgStructuredBuilder", node));
        };
        let fields = structured
            .fields
            .iter()
            .map(|(_, v)| qb.build_value(v, params))
            .collect::<Vec<_>>();
        Ok(format!(
            "ROW({}){}",
            fields.join(", "),
            type_hint(qb, structured.db_type.as_deref())
        ))
    }
}

/// Build a function operand that is expected to be an array. Lists of values become
/// array values.
pub(crate) fn build_array_operand(
    qb: &QueryBuilder,
    operand: &Operand,
    params: &mut Params,
) -> QbResult<String> {
    match operand.scalar_values() {
        Some(values) => qb.build_expression(&Expr::Array(ArrayValue::new(values)), params),
        None => qb.build_fragment(operand, params),
    }
}

/// `ARRAY(SELECT DISTINCT UNNEST(a || b))::type`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgArrayMergeBuilder;

impl ExpressionBuilder for PgArrayMergeBuilder {
    fn build(&self, qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let Node::Expr(Expr::Function(function)) = node else {
            return Err(unexpected_node("PgArrayMergeBuilder", node));
        };
        let operands = function
            .operands()
            .iter()
            .map(|op| build_array_operand(qb, op, params))
            .collect::<QbResult<Vec<_>>>()?;
        Ok(format!(
            "ARRAY(SELECT DISTINCT UNNEST({})){}",
            operands.join(" || "),
            array_type_hint(qb, function.result_type())
        ))
    }
}

fn overlap_parts<'a>(node: Node<'a>, builder: &str) -> QbResult<&'a OverlapCondition> {
    match node {
        Node::Condition(Condition::Overlap(c)) => Ok(c),
        other => Err(unexpected_node(builder, other)),
    }
}

/// `column::text[] && values::text[]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgArrayOverlapsBuilder;

impl ExpressionBuilder for PgArrayOverlapsBuilder {
    fn build(&self, qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let c = overlap_parts(node, "PgArrayOverlapsBuilder")?;
        let column = qb.build_column(&c.column, params)?;
        let values = match &c.values {
            Operand::Expr(Expr::Json(json)) => {
                let items = match &json.value {
                    serde_json::Value::Array(items) => items.iter().map(json_scalar).collect(),
                    other => vec![json_scalar(other)],
                };
                qb.build_expression(&Expr::Array(ArrayValue::new(items)), params)?
            }
            Operand::Expr(expr) => qb.build_expression(expr, params)?,
            other => build_array_operand(qb, other, params)?,
        };
        Ok(format!("{column}::text[] && {values}::text[]"))
    }
}

fn json_scalar(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or_default()),
        },
        serde_json::Value::String(s) => Value::String(s.clone()),
        other => Value::Json(other.clone()),
    }
}

/// Overlap of two JSON arrays through `jsonb_array_elements_text`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgJsonOverlapsBuilder;

impl ExpressionBuilder for PgJsonOverlapsBuilder {
    fn build(&self, qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let c = overlap_parts(node, "PgJsonOverlapsBuilder")?;
        let column = qb.build_column(&c.column, params)?;
        let values = overlap_json_values(qb, &c.values, params)?;
        Ok(format!(
            "ARRAY(SELECT jsonb_array_elements_text({column}::jsonb)) && ARRAY(SELECT jsonb_array_elements_text({values}::jsonb))"
        ))
    }
}

/// Overlap values as a JSON document: lists are encoded, expressions are built.
pub(crate) fn overlap_json_values(
    qb: &QueryBuilder,
    values: &Operand,
    params: &mut Params,
) -> QbResult<String> {
    match values {
        Operand::Expr(expr) => qb.build_expression(expr, params),
        Operand::List(items) => {
            let items = items.iter().map(operand_json).collect::<QbResult<Vec<_>>>()?;
            let json = serde_json::Value::Array(items);
            qb.build_expression(&Expr::Json(JsonValue::new(json)), params)
        }
        other => qb.build_operand(other, params),
    }
}

/// JSON form of a literal list item. Expressions and conditions cannot be encoded.
fn operand_json(operand: &Operand) -> QbResult<serde_json::Value> {
    match operand {
        Operand::Null => Ok(serde_json::Value::Null),
        Operand::Value(v) | Operand::Expr(Expr::Value(v)) => Ok(v.to_json()),
        Operand::List(items) => items
            .iter()
            .map(operand_json)
            .collect::<QbResult<Vec<_>>>()
            .map(serde_json::Value::Array),
        _ => Err(QbError::invalid_argument(
            "Overlap values must be scalars or lists of scalars.",
        )),
    }
}
