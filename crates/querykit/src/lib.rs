//! # querykit
//!
//! A database-agnostic SQL condition/expression compiler and query builder.
//!
//! ## Features
//!
//! - **Two input surfaces**: a fluent [`Query`] and the operator/hash condition DSL
//!   (`cond!`, `hash!`)
//! - **Named placeholders**: every statement compiles to `(sql, Params)` with `:pv0`, `:pv1`, ...
//! - **Pluggable builders**: each node kind is rendered by a registered builder; dialects
//!   override the entries they spell differently
//! - **Dialects**: PostgreSQL, MySQL and SQLite
//! - **DML and DDL**: insert/update/delete, tables, columns, constraints, indexes, views
//! - **Driver boundary**: `$n`/`?` rewriting, and `tokio-postgres` binding behind the
//!   `postgres` feature
//!
//! ## Example
//!
//! ```ignore
//! use querykit::{cond, hash, Query, QueryBuilder};
//!
//! let query = Query::new()
//!     .select(["id", "name"])
//!     .from(["customer"])
//!     .where_(hash! {"status" => "active", "age" => [18, 19, 20]})
//!     .and_where(cond![">", "created_at", "2024-01-01"])
//!     .order_by("id DESC")
//!     .limit(10);
//!
//! let (sql, params) = QueryBuilder::postgres().build(&query)?;
//! ```

pub mod bind;
pub mod builder;
pub mod condition;
pub mod config;
pub mod dialect;
pub mod dsl;
pub mod error;
pub mod expr;
pub mod query;
pub mod query_builder;
pub mod quoter;
pub mod value;

#[cfg(feature = "postgres")]
pub mod pg;

pub use bind::{PlaceholderStyle, to_positional};
pub use builder::{BuilderRegistry, ExpressionBuilder, Node, NodeKind, OperatorRegistry};
pub use condition::Condition;
pub use config::{BuilderConfig, LogConfig};
pub use dialect::{Dialect, DialectKind, MySql, Postgres, Sqlite};
pub use dsl::Where;
pub use error::{QbError, QbResult};
pub use expr::{
    ArrayValue, CaseArg, CaseX, ColumnRef, CustomExpression, DateTimeValue, Expr, JsonValue,
    MultiOperandFunction, Operand, RawExpr, StructuredValue, WhenThen,
};
pub use query::{Direction, Query, TableRef};
pub use query_builder::{ColumnDef, ColumnTypeResolver, QueryBuilder, TypeMap};
pub use quoter::Quoter;
pub use value::{Param, ParamType, Params, Value};

#[cfg(feature = "postgres")]
pub use pg::PgStatement;
