//! Expression model.
//!
//! [`Expr`] is the closed set of nodes that are compiled rather than bound as plain values:
//! column references, raw SQL, sub-queries, typed composite values, CASE and function
//! expressions. [`Operand`] is the loosely typed input accepted by the condition DSL.
//!
//! Expressions are values: cloning one never shares mutable state, and compiling one
//! never modifies it.

mod case;
mod function;
mod values;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

pub use case::{CaseArg, CaseX, WhenThen};
pub use function::{FunctionKind, MultiOperandFunction};
pub use values::{ArraySource, ArrayValue, DateTimeType, DateTimeValue, JsonValue, StructuredValue};

use crate::condition::Condition;
use crate::dsl::Where;
use crate::query::Query;
use crate::value::{Param, ParamType, Value};

/// An expression node that must be compiled by a registered builder.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A scalar rendered through the value path: `NULL`, a boolean literal, or a placeholder.
    Value(Value),
    /// A value bound with an explicit bind type.
    Param(Param),
    /// A column reference, quoted on output.
    Column(String),
    /// A raw SQL fragment with its own named parameters.
    Raw(RawExpr),
    /// A sub-query, rendered as `(sql)`.
    Query(Box<Query>),
    Array(ArrayValue),
    Json(JsonValue),
    Structured(StructuredValue),
    DateTime(DateTimeValue),
    Case(Box<CaseX>),
    Function(MultiOperandFunction),
    /// `LENGTH(operand)`.
    Length(Box<Operand>),
    /// A condition used where an expression is expected.
    Condition(Box<Condition>),
    /// A caller-defined node, rendered by the builder registered for its kind.
    Custom(Arc<dyn CustomExpression>),
}

impl Expr {
    pub fn value(value: impl Into<Value>) -> Self {
        Expr::Value(value.into())
    }

    pub fn param(value: impl Into<Value>, ty: ParamType) -> Self {
        Expr::Param(Param::new(value, ty))
    }

    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column(name.into())
    }

    /// Raw SQL without parameters.
    pub fn raw(sql: impl Into<String>) -> Self {
        Expr::Raw(RawExpr::new(sql))
    }

    /// Raw SQL referencing named parameters (`:name`).
    pub fn raw_with_params<I, K, V>(sql: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Param>,
    {
        Expr::Raw(RawExpr::with_params(sql, params))
    }

    pub fn query(query: Query) -> Self {
        Expr::Query(Box::new(query))
    }

    pub fn length(operand: impl Into<Operand>) -> Self {
        Expr::Length(Box::new(operand.into()))
    }

    pub fn custom(expr: impl CustomExpression + 'static) -> Self {
        Expr::Custom(Arc::new(expr))
    }
}

impl From<Query> for Expr {
    fn from(query: Query) -> Self {
        Expr::query(query)
    }
}

impl From<Condition> for Expr {
    fn from(condition: Condition) -> Self {
        Expr::Condition(Box::new(condition))
    }
}

impl From<CaseX> for Expr {
    fn from(case: CaseX) -> Self {
        Expr::Case(Box::new(case))
    }
}

impl From<MultiOperandFunction> for Expr {
    fn from(function: MultiOperandFunction) -> Self {
        Expr::Function(function)
    }
}

impl From<ArrayValue> for Expr {
    fn from(value: ArrayValue) -> Self {
        Expr::Array(value)
    }
}

impl From<JsonValue> for Expr {
    fn from(value: JsonValue) -> Self {
        Expr::Json(value)
    }
}

impl From<StructuredValue> for Expr {
    fn from(value: StructuredValue) -> Self {
        Expr::Structured(value)
    }
}

impl From<DateTimeValue> for Expr {
    fn from(value: DateTimeValue) -> Self {
        Expr::DateTime(value)
    }
}

impl From<RawExpr> for Expr {
    fn from(value: RawExpr) -> Self {
        Expr::Raw(value)
    }
}

/// Raw SQL fragment plus the named parameters it references.
///
/// The SQL is emitted verbatim. When a parameter name is already taken in the statement
/// being compiled, the parameter is renamed (`name_0`, `name_1`, ...) and the fragment is
/// rewritten to match.
#[derive(Debug, Clone, PartialEq)]
pub struct RawExpr {
    pub sql: String,
    pub params: Vec<(String, Param)>,
}

impl RawExpr {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params<I, K, V>(sql: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Param>,
    {
        Self {
            sql: sql.into(),
            params: params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A caller-defined expression node.
///
/// Register a builder for `NodeKind::Custom(kind)` to render it; the builder reaches the
/// concrete type through [`CustomExpression::as_any`].
pub trait CustomExpression: fmt::Debug + Send + Sync {
    /// Registry key of the builder that renders this node.
    fn kind(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;
}

/// Column position of a condition: a name (quoted on output) or an expression.
#[derive(Debug, Clone)]
pub enum ColumnRef {
    Name(String),
    Expr(Expr),
}

impl From<&str> for ColumnRef {
    fn from(name: &str) -> Self {
        ColumnRef::Name(name.to_string())
    }
}

impl From<String> for ColumnRef {
    fn from(name: String) -> Self {
        ColumnRef::Name(name)
    }
}

impl From<Expr> for ColumnRef {
    fn from(expr: Expr) -> Self {
        ColumnRef::Expr(expr)
    }
}

/// Loosely typed operand of the condition DSL.
///
/// A string means a column name in column position, a raw SQL fragment in condition
/// position, and a bound value everywhere else.
#[derive(Debug, Clone)]
pub enum Operand {
    Null,
    Value(Value),
    List(Vec<Operand>),
    Expr(Expr),
    Where(Box<Where>),
}

impl Operand {
    pub fn is_null(&self) -> bool {
        matches!(self, Operand::Null | Operand::Value(Value::Null))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Operand::Value(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Empty operands are dropped by condition filtering: null, empty lists and
    /// empty or whitespace-only strings.
    pub fn is_empty(&self) -> bool {
        match self {
            Operand::Null | Operand::Value(Value::Null) => true,
            Operand::Value(Value::String(s)) => s.trim().is_empty(),
            Operand::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Plain scalar values of a list operand, if every item is a scalar.
    pub fn scalar_values(&self) -> Option<Vec<Value>> {
        match self {
            Operand::List(items) => items
                .iter()
                .map(|item| match item {
                    Operand::Null => Some(Value::Null),
                    Operand::Value(v) => Some(v.clone()),
                    Operand::Expr(Expr::Value(v)) => Some(v.clone()),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }
}

macro_rules! impl_operand_from_value {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for Operand {
                fn from(v: $ty) -> Self {
                    Operand::from(Value::from(v))
                }
            }
        )+
    };
}

impl_operand_from_value!(bool, i8, i16, i32, i64, u8, u16, u32, f32, f64, &str, String);

impl From<&String> for Operand {
    fn from(v: &String) -> Self {
        Operand::Value(Value::String(v.clone()))
    }
}

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => Operand::Null,
            v => Operand::Value(v),
        }
    }
}

impl From<Expr> for Operand {
    fn from(e: Expr) -> Self {
        Operand::Expr(e)
    }
}

impl From<Where> for Operand {
    fn from(w: Where) -> Self {
        Operand::Where(Box::new(w))
    }
}

impl From<Query> for Operand {
    fn from(q: Query) -> Self {
        Operand::Expr(Expr::query(q))
    }
}

impl From<Condition> for Operand {
    fn from(c: Condition) -> Self {
        Operand::Expr(Expr::from(c))
    }
}

impl From<CaseX> for Operand {
    fn from(c: CaseX) -> Self {
        Operand::Expr(Expr::from(c))
    }
}

impl From<MultiOperandFunction> for Operand {
    fn from(f: MultiOperandFunction) -> Self {
        Operand::Expr(Expr::from(f))
    }
}

impl<T: Into<Operand>> From<Vec<T>> for Operand {
    fn from(items: Vec<T>) -> Self {
        Operand::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Operand>, const N: usize> From<[T; N]> for Operand {
    fn from(items: [T; N]) -> Self {
        Operand::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Operand>> From<Option<T>> for Operand {
    fn from(v: Option<T>) -> Self {
        v.map_or(Operand::Null, Into::into)
    }
}
