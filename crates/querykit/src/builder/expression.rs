//! Builders for expression nodes.

use super::{ExpressionBuilder, Node, unexpected_node};
use crate::error::QbResult;
use crate::expr::{ArraySource, Expr, Operand};
use crate::query_builder::QueryBuilder;
use crate::value::{Param, ParamType, Params, Value};

/// Plain values: `NULL`, the dialect's boolean literal, or a placeholder.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueBuilder;

impl ExpressionBuilder for ValueBuilder {
    fn build(&self, qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let Node::Expr(Expr::Value(value)) = node else {
            return Err(unexpected_node("ValueBuilder", node));
        };
        Ok(match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => qb.dialect().bool_literal(*b).to_string(),
            other => params.bind(Param::infer(other.clone())),
        })
    }
}

/// Values with an explicit bind type; always bound.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParamBuilder;

impl ExpressionBuilder for ParamBuilder {
    fn build(&self, _qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let Node::Expr(Expr::Param(param)) = node else {
            return Err(unexpected_node("ParamBuilder", node));
        };
        Ok(params.bind(param.clone()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnBuilder;

impl ExpressionBuilder for ColumnBuilder {
    fn build(&self, qb: &QueryBuilder, node: Node<'_>, _params: &mut Params) -> QbResult<String> {
        let Node::Expr(Expr::Column(name)) = node else {
            return Err(unexpected_node("ColumnBuilder", node));
        };
        Ok(qb.quoter().quote_column_name(name))
    }
}

/// Raw SQL, verbatim. Its named parameters are merged into the statement.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawBuilder;

impl ExpressionBuilder for RawBuilder {
    fn build(&self, qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let Node::Expr(Expr::Raw(raw)) = node else {
            return Err(unexpected_node("RawBuilder", node));
        };
        Ok(qb.merge_raw(raw, params))
    }
}

/// Sub-queries, as `(sql)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryExprBuilder;

impl ExpressionBuilder for QueryExprBuilder {
    fn build(&self, qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let Node::Expr(Expr::Query(query)) = node else {
            return Err(unexpected_node("QueryExprBuilder", node));
        };
        Ok(format!("({})", qb.build_query(query, params)?))
    }
}

/// Arrays without native support: bound as a JSON array.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayBuilder;

impl ExpressionBuilder for ArrayBuilder {
    fn build(&self, qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let Node::Expr(Expr::Array(array)) = node else {
            return Err(unexpected_node("ArrayBuilder", node));
        };
        match &array.source {
            ArraySource::Query(query) => Ok(format!("({})", qb.build_query(query, params)?)),
            ArraySource::Literal(literal) => Ok(params.bind(Param::new(literal.as_str(), ParamType::Str))),
            ArraySource::Values(_) => {
                let encoded = array.to_json().unwrap_or_default().to_string();
                Ok(params.bind(Param::new(encoded, ParamType::Str)))
            }
        }
    }
}

/// JSON documents: bound as encoded text.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBuilder;

impl ExpressionBuilder for JsonBuilder {
    fn build(&self, _qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let Node::Expr(Expr::Json(json)) = node else {
            return Err(unexpected_node("JsonBuilder", node));
        };
        Ok(params.bind(Param::new(json.encoded(), ParamType::Str)))
    }
}

/// Composite values without native support: bound as a JSON object.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredBuilder;

impl ExpressionBuilder for StructuredBuilder {
    fn build(&self, _qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let Node::Expr(Expr::Structured(structured)) = node else {
            return Err(unexpected_node("StructuredBuilder", node));
        };
        Ok(params.bind(Param::new(structured.to_json().to_string(), ParamType::Str)))
    }
}

/// Date/time values: bound as text, with fractional seconds only when present.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeBuilder;

impl ExpressionBuilder for DateTimeBuilder {
    fn build(&self, _qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let Node::Expr(Expr::DateTime(value)) = node else {
            return Err(unexpected_node("DateTimeBuilder", node));
        };
        Ok(params.bind(Param::new(value.formatted(), ParamType::Str)))
    }
}

/// `CASE [subject] WHEN .. THEN .. [ELSE ..] END`.
///
/// Strings in subject, condition and result position are raw SQL. Lists are conditions
/// in subject and condition position and value lists in result position.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseBuilder;

impl ExpressionBuilder for CaseBuilder {
    fn build(&self, qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let Node::Expr(Expr::Case(case)) = node else {
            return Err(unexpected_node("CaseBuilder", node));
        };
        let mut sql = String::from("CASE");
        if let Some(subject) = case.subject() {
            sql.push(' ');
            sql.push_str(&qb.build_fragment(subject, params)?);
        }
        for branch in case.when_then() {
            sql.push_str(" WHEN ");
            sql.push_str(&qb.build_fragment(&branch.when, params)?);
            sql.push_str(" THEN ");
            sql.push_str(&build_case_result(qb, &branch.then, params)?);
        }
        if let Some(result) = case.else_result() {
            sql.push_str(" ELSE ");
            sql.push_str(&build_case_result(qb, result, params)?);
        }
        sql.push_str(" END");
        Ok(sql)
    }
}

/// A THEN/ELSE result: strings are raw SQL, everything else is a value.
fn build_case_result(qb: &QueryBuilder, result: &Operand, params: &mut Params) -> QbResult<String> {
    match result {
        Operand::Value(Value::String(sql)) => Ok(sql.clone()),
        other => qb.build_operand(other, params),
    }
}

/// `NAME(a, b, ..)` for multi-operand functions. A single operand is emitted alone.
#[derive(Debug, Clone)]
pub struct FunctionCallBuilder {
    name: String,
}

impl FunctionCallBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ExpressionBuilder for FunctionCallBuilder {
    fn build(&self, qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let Node::Expr(Expr::Function(function)) = node else {
            return Err(unexpected_node("FunctionCallBuilder", node));
        };
        let operands = function
            .operands()
            .iter()
            .map(|op| qb.build_fragment(op, params))
            .collect::<QbResult<Vec<_>>>()?;
        if operands.len() == 1 {
            return Ok(operands.into_iter().next().unwrap_or_default());
        }
        Ok(format!("{}({})", self.name, operands.join(", ")))
    }
}

/// Longest or shortest operand by `LENGTH`, through a union sub-select.
#[derive(Debug, Clone, Copy)]
pub struct LengthOrderBuilder {
    direction: &'static str,
}

impl LengthOrderBuilder {
    pub fn longest() -> Self {
        Self { direction: "DESC" }
    }

    pub fn shortest() -> Self {
        Self { direction: "ASC" }
    }
}

impl ExpressionBuilder for LengthOrderBuilder {
    fn build(&self, qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let Node::Expr(Expr::Function(function)) = node else {
            return Err(unexpected_node("LengthOrderBuilder", node));
        };
        let operands = function
            .operands()
            .iter()
            .map(|op| qb.build_fragment(op, params))
            .collect::<QbResult<Vec<_>>>()?;
        if operands.len() == 1 {
            return Ok(operands.into_iter().next().unwrap_or_default());
        }
        let unions = operands
            .iter()
            .map(|op| format!("SELECT {op} AS value"))
            .collect::<Vec<_>>()
            .join(" UNION ");
        Ok(format!(
            "(SELECT value FROM ({unions}) AS t ORDER BY LENGTH(value) {} LIMIT 1)",
            self.direction
        ))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LengthBuilder;

impl ExpressionBuilder for LengthBuilder {
    fn build(&self, qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let Node::Expr(Expr::Length(operand)) = node else {
            return Err(unexpected_node("LengthBuilder", node));
        };
        Ok(format!("LENGTH({})", qb.build_fragment(operand, params)?))
    }
}
