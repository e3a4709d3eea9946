//! Expression and condition builders.
//!
//! Every node kind is rendered by exactly one [`ExpressionBuilder`] looked up in a
//! [`BuilderRegistry`]. Operator-format conditions are turned into typed conditions by
//! the constructors in an [`OperatorRegistry`]. Dialects override entries of either
//! registry without touching the rest.

mod condition;
mod expression;


use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub use condition::{
    BetweenBuilder, BetweenColumnsBuilder, CompositeInStyle, ConjunctionBuilder, ExistsBuilder,
    HashBuilder, InBuilder, LikeBuilder, NotBuilder, SimpleBuilder,
};
pub use expression::{
    ArrayBuilder, CaseBuilder, ColumnBuilder, DateTimeBuilder, FunctionCallBuilder, JsonBuilder,
    LengthBuilder, LengthOrderBuilder, ParamBuilder, QueryExprBuilder, RawBuilder,
    StructuredBuilder, ValueBuilder,
};

use crate::condition::{
    BetweenCondition, Condition, Conjunction, ExistsCondition, InCondition, LikeCondition,
    NotCondition, OverlapCondition, OverlapKind, SimpleCondition,
};
use crate::error::{QbError, QbResult};
use crate::expr::{Expr, FunctionKind, Operand};
use crate::query_builder::QueryBuilder;
use crate::value::Params;

/// A node handed to a builder.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Expr(&'a Expr),
    Condition(&'a Condition),
}

impl Node<'_> {
    /// Registry key for this node.
    pub fn kind(&self) -> NodeKind {
        match *self {
            Node::Expr(expr) => match expr {
                Expr::Value(_) => NodeKind::Value,
                Expr::Param(_) => NodeKind::Param,
                Expr::Column(_) => NodeKind::Column,
                Expr::Raw(_) => NodeKind::Raw,
                Expr::Query(_) => NodeKind::Query,
                Expr::Array(_) => NodeKind::Array,
                Expr::Json(_) => NodeKind::Json,
                Expr::Structured(_) => NodeKind::Structured,
                Expr::DateTime(_) => NodeKind::DateTime,
                Expr::Case(_) => NodeKind::Case,
                Expr::Function(f) => match f.kind() {
                    FunctionKind::Greatest => NodeKind::Greatest,
                    FunctionKind::Least => NodeKind::Least,
                    FunctionKind::Longest => NodeKind::Longest,
                    FunctionKind::Shortest => NodeKind::Shortest,
                    FunctionKind::ArrayMerge => NodeKind::ArrayMerge,
                },
                Expr::Length(_) => NodeKind::Length,
                Expr::Condition(c) => Node::Condition(c).kind(),
                Expr::Custom(c) => NodeKind::Custom(c.kind()),
            },
            Node::Condition(condition) => match condition {
                Condition::Simple(_) => NodeKind::Simple,
                Condition::Hash(_) => NodeKind::Hash,
                Condition::In(_) => NodeKind::In,
                Condition::Like(_) => NodeKind::Like,
                Condition::Between(_) => NodeKind::Between,
                Condition::BetweenColumns(_) => NodeKind::BetweenColumns,
                Condition::Conjunction(_) => NodeKind::Conjunction,
                Condition::Not(_) => NodeKind::Not,
                Condition::Exists(_) => NodeKind::Exists,
                Condition::Overlap(o) => match o.kind {
                    OverlapKind::Array => NodeKind::ArrayOverlaps,
                    OverlapKind::Json => NodeKind::JsonOverlaps,
                },
                Condition::Custom(c) => NodeKind::Custom(c.kind()),
            },
        }
    }
}

/// Registry key of a builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Value,
    Param,
    Column,
    Raw,
    Query,
    Array,
    Json,
    Structured,
    DateTime,
    Case,
    Greatest,
    Least,
    Longest,
    Shortest,
    ArrayMerge,
    Length,
    Simple,
    Hash,
    In,
    Like,
    Between,
    BetweenColumns,
    Conjunction,
    Not,
    Exists,
    ArrayOverlaps,
    JsonOverlaps,
    Custom(&'static str),
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Custom(name) => write!(f, "custom node '{name}'"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Renders one node kind to SQL.
///
/// Builders hold no per-compile state. They reach back into the [`QueryBuilder`] to render
/// nested nodes and allocate placeholders in the shared `params` accumulator.
pub trait ExpressionBuilder: Send + Sync {
    fn build(&self, qb: &QueryBuilder, node: Node<'_>, params: &mut Params) -> QbResult<String>;
}

/// Error for a builder handed a node of a kind it does not render.
pub(crate) fn unexpected_node(builder: &str, node: Node<'_>) -> QbError {
    QbError::not_supported(format!("{builder} cannot build {}.", node.kind()))
}

/// Node kind to builder map.
#[derive(Clone, Default)]
pub struct BuilderRegistry {
    builders: HashMap<NodeKind, Arc<dyn ExpressionBuilder>>,
}

impl BuilderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builders shared by every dialect.
    ///
    /// Overlap conditions and array merge have no portable spelling and are left to dialects.
    pub fn base() -> Self {
        let mut r = Self::new();
        r.register(NodeKind::Value, ValueBuilder);
        r.register(NodeKind::Param, ParamBuilder);
        r.register(NodeKind::Column, ColumnBuilder);
        r.register(NodeKind::Raw, RawBuilder);
        r.register(NodeKind::Query, QueryExprBuilder);
        r.register(NodeKind::Array, ArrayBuilder);
        r.register(NodeKind::Json, JsonBuilder);
        r.register(NodeKind::Structured, StructuredBuilder);
        r.register(NodeKind::DateTime, DateTimeBuilder);
        r.register(NodeKind::Case, CaseBuilder);
        r.register(NodeKind::Greatest, FunctionCallBuilder::new("GREATEST"));
        r.register(NodeKind::Least, FunctionCallBuilder::new("LEAST"));
        r.register(NodeKind::Longest, LengthOrderBuilder::longest());
        r.register(NodeKind::Shortest, LengthOrderBuilder::shortest());
        r.register(NodeKind::Length, LengthBuilder);
        r.register(NodeKind::Simple, SimpleBuilder);
        r.register(NodeKind::Hash, HashBuilder);
        r.register(NodeKind::In, InBuilder::default());
        r.register(NodeKind::Like, LikeBuilder::default());
        r.register(NodeKind::Between, BetweenBuilder);
        r.register(NodeKind::BetweenColumns, BetweenColumnsBuilder);
        r.register(NodeKind::Conjunction, ConjunctionBuilder);
        r.register(NodeKind::Not, NotBuilder);
        r.register(NodeKind::Exists, ExistsBuilder);
        r
    }

    /// Register (or replace) the builder for `kind`.
    pub fn register(&mut self, kind: NodeKind, builder: impl ExpressionBuilder + 'static) -> &mut Self {
        self.builders.insert(kind, Arc::new(builder));
        self
    }

    pub fn register_arc(&mut self, kind: NodeKind, builder: Arc<dyn ExpressionBuilder>) -> &mut Self {
        self.builders.insert(kind, builder);
        self
    }

    pub fn remove(&mut self, kind: NodeKind) -> Option<Arc<dyn ExpressionBuilder>> {
        self.builders.remove(&kind)
    }

    pub fn get(&self, kind: NodeKind) -> Option<&Arc<dyn ExpressionBuilder>> {
        self.builders.get(&kind)
    }

    pub fn contains(&self, kind: NodeKind) -> bool {
        self.builders.contains_key(&kind)
    }
}

impl fmt::Debug for BuilderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<String> = self.builders.keys().map(ToString::to_string).collect();
        kinds.sort();
        f.debug_struct("BuilderRegistry").field("kinds", &kinds).finish()
    }
}

/// Constructor of a typed condition from an operator-format definition.
pub type OperatorFn = Arc<dyn Fn(&str, Vec<Operand>) -> QbResult<Condition> + Send + Sync>;

/// Operator token to condition constructor map.
///
/// Tokens are matched case-insensitively with runs of whitespace collapsed, so
/// `"not  in"` finds `NOT IN`. Constructors receive the normalized token.
#[derive(Clone, Default)]
pub struct OperatorRegistry {
    operators: HashMap<String, OperatorFn>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logical, range, membership, pattern, existence, overlap and comparison operators.
    pub fn base() -> Self {
        let mut r = Self::new();
        for op in ["AND", "OR"] {
            r.register(op, |op, operands| {
                Conjunction::from_definition(op, operands).map(Condition::from)
            });
        }
        r.register("NOT", |op, operands| {
            NotCondition::from_definition(op, operands).map(Condition::from)
        });
        for op in ["BETWEEN", "NOT BETWEEN"] {
            r.register(op, |op, operands| {
                BetweenCondition::from_definition(op, operands).map(Condition::from)
            });
        }
        for op in ["IN", "NOT IN"] {
            r.register(op, |op, operands| {
                InCondition::from_definition(op, operands).map(Condition::from)
            });
        }
        for op in ["LIKE", "NOT LIKE", "OR LIKE", "OR NOT LIKE"] {
            r.register(op, like_operator);
        }
        for op in ["EXISTS", "NOT EXISTS"] {
            r.register(op, |op, operands| {
                ExistsCondition::from_definition(op, operands).map(Condition::from)
            });
        }
        r.register("ARRAY OVERLAPS", |op, operands| {
            OverlapCondition::from_definition(OverlapKind::Array, op, operands).map(Condition::from)
        });
        r.register("JSON OVERLAPS", |op, operands| {
            OverlapCondition::from_definition(OverlapKind::Json, op, operands).map(Condition::from)
        });
        for op in ["=", "<>", "!=", ">", ">=", "<", "<=", "IS", "IS NOT"] {
            r.register(op, simple_operator);
        }
        r
    }

    /// Register (or replace) the constructor for `token`.
    pub fn register<F>(&mut self, token: &str, constructor: F) -> &mut Self
    where
        F: Fn(&str, Vec<Operand>) -> QbResult<Condition> + Send + Sync + 'static,
    {
        self.operators.insert(normalize_token(token), Arc::new(constructor));
        self
    }

    pub fn remove(&mut self, token: &str) -> Option<OperatorFn> {
        self.operators.remove(&normalize_token(token))
    }

    pub fn contains(&self, token: &str) -> bool {
        self.operators.contains_key(&normalize_token(token))
    }

    /// Parse an operator-format definition into a typed condition.
    pub fn create(&self, operator: &str, operands: Vec<Operand>) -> QbResult<Condition> {
        let token = normalize_token(operator);
        match self.operators.get(&token) {
            Some(constructor) => constructor(&token, operands),
            None => Err(QbError::invalid_argument(format!(
                "Unknown operator '{token}'."
            ))),
        }
    }
}

impl fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tokens: Vec<&String> = self.operators.keys().collect();
        tokens.sort();
        f.debug_struct("OperatorRegistry").field("tokens", &tokens).finish()
    }
}

/// Constructor for comparison operators rendered as `column op value`.
pub fn simple_operator(operator: &str, operands: Vec<Operand>) -> QbResult<Condition> {
    SimpleCondition::from_definition(operator, operands).map(Condition::from)
}

/// Constructor for the `LIKE` family.
pub fn like_operator(operator: &str, operands: Vec<Operand>) -> QbResult<Condition> {
    LikeCondition::from_definition(operator, operands).map(Condition::from)
}

fn normalize_token(token: &str) -> String {
    token
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase()
}
