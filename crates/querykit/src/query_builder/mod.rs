//! The statement compiler.
//!
//! [`QueryBuilder`] walks a [`Query`] (or a condition, or a DML/DDL request) and hands
//! every node to the builder registered for its kind. All placeholders of one statement
//! are allocated in a single [`Params`] accumulator threaded through the recursion, so
//! numbering stays monotonic across nested sub-queries.
//!
//! A builder is configured once and then only read; compiling takes `&self` and the
//! builder can be shared between threads.
//!
//! ```ignore
//! use querykit::{hash, Query, QueryBuilder};
//!
//! let qb = QueryBuilder::postgres().with_table_prefix("tbl_");
//! let (sql, params) = qb.build(&Query::new().from(["{{%user}}"]).where_(hash! {"id" => 1}))?;
//! assert_eq!(sql, r#"SELECT * FROM "tbl_user" WHERE "id"=:pv0"#);
//! ```

mod ddl;
mod dml;
mod select;
mod types;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub use ddl::ColumnDef;
pub use types::{ColumnTypeResolver, TypeMap};

use crate::builder::{BuilderRegistry, ExpressionBuilder, Node, NodeKind, OperatorRegistry};
use crate::condition::{Condition, HashCondition};
use crate::config::{BuilderConfig, LogConfig};
use crate::dialect::{Dialect, DialectKind, MySql, Postgres, Sqlite};
use crate::dsl::Where;
use crate::error::{QbError, QbResult};
use crate::expr::{ColumnRef, Expr, Operand, RawExpr};
use crate::query::Query;
use crate::quoter::Quoter;
use crate::value::{Param, Params, Value, normalize_name};

/// `tracing` target of compiled-statement events.
pub const LOG_TARGET: &str = "querykit.sql";

#[derive(Clone)]
pub struct QueryBuilder {
    dialect: Arc<dyn Dialect>,
    quoter: Quoter,
    builders: BuilderRegistry,
    operators: OperatorRegistry,
    types: Arc<dyn ColumnTypeResolver>,
    log: LogConfig,
}

impl fmt::Debug for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("dialect", &self.dialect.kind())
            .field("quoter", &self.quoter)
            .field("builders", &self.builders)
            .field("operators", &self.operators)
            .field("types", &self.types)
            .field("log", &self.log)
            .finish()
    }
}

impl QueryBuilder {
    /// A builder for `dialect`: base registries with the dialect's overrides applied.
    pub fn new(dialect: impl Dialect + 'static) -> Self {
        Self::with_dialect(Arc::new(dialect))
    }

    pub fn with_dialect(dialect: Arc<dyn Dialect>) -> Self {
        let mut builders = BuilderRegistry::base();
        let mut operators = OperatorRegistry::base();
        dialect.register(&mut builders, &mut operators);
        Self {
            quoter: dialect.quoter(),
            types: Arc::new(TypeMap::from_pairs(dialect.default_types())),
            dialect,
            builders,
            operators,
            log: LogConfig::default(),
        }
    }

    pub fn postgres() -> Self {
        Self::new(Postgres)
    }

    pub fn mysql() -> Self {
        Self::new(MySql)
    }

    pub fn sqlite() -> Self {
        Self::new(Sqlite)
    }

    pub fn for_dialect(kind: DialectKind) -> Self {
        Self::with_dialect(kind.dialect())
    }

    /// Dialect, table prefix, type overrides and log settings from configuration.
    pub fn from_config(config: &BuilderConfig) -> Self {
        let qb = Self::for_dialect(config.dialect);
        let types = TypeMap::from_pairs(qb.dialect.default_types())
            .with_overrides(config.types.iter().map(|(k, v)| (k.clone(), v.clone())));
        qb.with_table_prefix(config.table_prefix.clone())
            .with_type_resolver(types)
            .with_log(config.log.clone())
    }

    // ==================== Configuration ====================

    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.quoter = self.quoter.with_table_prefix(prefix);
        self
    }

    /// Register (or replace) the builder for a node kind.
    pub fn with_builder(mut self, kind: NodeKind, builder: impl ExpressionBuilder + 'static) -> Self {
        self.builders.register(kind, builder);
        self
    }

    /// Register (or replace) an operator-format constructor.
    pub fn with_operator<F>(mut self, token: &str, constructor: F) -> Self
    where
        F: Fn(&str, Vec<Operand>) -> QbResult<Condition> + Send + Sync + 'static,
    {
        self.operators.register(token, constructor);
        self
    }

    pub fn with_type_resolver(mut self, resolver: impl ColumnTypeResolver + 'static) -> Self {
        self.types = Arc::new(resolver);
        self
    }

    pub fn with_log(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    // ==================== Accessors ====================

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn quoter(&self) -> &Quoter {
        &self.quoter
    }

    pub fn builders(&self) -> &BuilderRegistry {
        &self.builders
    }

    pub fn operators(&self) -> &OperatorRegistry {
        &self.operators
    }

    pub fn log_config(&self) -> &LogConfig {
        &self.log
    }

    /// Resolve an abstract column type to the dialect's type SQL.
    pub fn column_type(&self, ty: &str) -> String {
        self.types.column_type(ty)
    }

    // ==================== Entry points ====================

    /// Compile a SELECT statement into SQL with named placeholders and its parameters.
    pub fn build(&self, query: &Query) -> QbResult<(String, Params)> {
        let mut params = Params::new();
        let sql = self.build_query(query, &mut params)?;
        Ok(self.finish("select", sql, params))
    }

    /// Compile a standalone condition.
    pub fn build_where(&self, condition: &Where) -> QbResult<(String, Params)> {
        let mut params = Params::new();
        let sql = self.build_condition(condition, &mut params)?;
        Ok((self.quoter.quote_sql(&sql), params))
    }

    // ==================== Recursive compilation ====================

    /// Compile an expression through its registered builder.
    pub fn build_expression(&self, expr: &Expr, params: &mut Params) -> QbResult<String> {
        match expr {
            Expr::Condition(condition) => self.build_condition_node(condition, params),
            other => self.build_node(Node::Expr(other), params),
        }
    }

    /// Compile a typed condition through its registered builder.
    pub fn build_condition_node(&self, condition: &Condition, params: &mut Params) -> QbResult<String> {
        self.build_node(Node::Condition(condition), params)
    }

    /// Dispatch a node to the builder registered for its kind.
    pub fn build_node(&self, node: Node<'_>, params: &mut Params) -> QbResult<String> {
        let kind = node.kind();
        match self.builders.get(kind) {
            Some(builder) => builder.build(self, node, params),
            None => {
                tracing::warn!(target: LOG_TARGET, dialect = %self.dialect.kind(), kind = %kind, "no builder registered");
                Err(QbError::not_supported(format!("No builder registered for {kind}.")))
            }
        }
    }

    /// Compile condition input: operator format through the operator registry, hash
    /// format as a hash condition, raw SQL verbatim.
    pub fn build_condition(&self, condition: &Where, params: &mut Params) -> QbResult<String> {
        match condition {
            Where::Op { operator, operands } => {
                let condition = self.operators.create(operator, operands.clone())?;
                self.build_condition_node(&condition, params)
            }
            Where::Hash(pairs) => self.build_condition_node(
                &Condition::Hash(HashCondition {
                    pairs: pairs.clone(),
                }),
                params,
            ),
            Where::Raw(sql) => Ok(sql.clone()),
            Where::Expr(expr) => self.build_expression(expr, params),
        }
    }

    /// `NULL` or a placeholder bound to `value`.
    pub fn build_value(&self, value: &Value, params: &mut Params) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            other => params.bind(Param::infer(other.clone())),
        }
    }

    /// Compile an operand in value position: strings are bound, lists become `(a, b)`.
    pub fn build_operand(&self, operand: &Operand, params: &mut Params) -> QbResult<String> {
        match operand {
            Operand::Null => Ok("NULL".to_string()),
            Operand::Value(value) => Ok(self.build_value(value, params)),
            Operand::Expr(expr) => self.build_expression(expr, params),
            Operand::Where(condition) => self.build_condition(condition, params),
            Operand::List(items) => {
                let items = items
                    .iter()
                    .map(|item| self.build_operand(item, params))
                    .collect::<QbResult<Vec<_>>>()?;
                Ok(format!("({})", items.join(", ")))
            }
        }
    }

    /// Compile an operand in SQL-fragment position (CASE branches, function operands):
    /// strings are raw SQL and lists are operator-format conditions.
    pub fn build_fragment(&self, operand: &Operand, params: &mut Params) -> QbResult<String> {
        match operand {
            Operand::Null => Ok("NULL".to_string()),
            Operand::Value(Value::String(sql)) => Ok(sql.clone()),
            Operand::Value(value) => Ok(self.build_value(value, params)),
            Operand::Expr(expr) => self.build_expression(expr, params),
            Operand::Where(condition) => self.build_condition(condition, params),
            Operand::List(items) => {
                let condition = Where::from_list(items.clone()).ok_or_else(|| {
                    QbError::invalid_argument("Condition list must start with an operator.")
                })?;
                self.build_condition(&condition, params)
            }
        }
    }

    /// Compile an operand in condition position (conjunction children, NOT).
    /// Null renders nothing.
    pub fn build_predicate(&self, operand: &Operand, params: &mut Params) -> QbResult<String> {
        match operand {
            Operand::Null => Ok(String::new()),
            other => self.build_fragment(other, params),
        }
    }

    /// Quote a column name, or compile a column expression. Names containing `(` are raw.
    pub fn build_column(&self, column: &ColumnRef, params: &mut Params) -> QbResult<String> {
        match column {
            ColumnRef::Name(name) if name.contains('(') => Ok(name.clone()),
            ColumnRef::Name(name) => Ok(self.quoter.quote_column_name(name)),
            ColumnRef::Expr(expr) => self.build_expression(expr, params),
        }
    }

    /// Merge a raw fragment's parameters, renaming on collision and rewriting the SQL.
    ///
    /// Renames are applied to the fragment's own SQL in one pass, so a new name is
    /// never renamed again by a later entry.
    pub fn merge_raw(&self, raw: &RawExpr, params: &mut Params) -> String {
        let mut renames = HashMap::new();
        for (name, param) in &raw.params {
            let wanted = normalize_name(name);
            let used = params.insert_unique(&wanted, param.clone());
            if used != wanted {
                renames.insert(wanted, used);
            }
        }
        if renames.is_empty() {
            return raw.sql.clone();
        }
        replace_placeholders(&raw.sql, &renames)
    }

    /// Resolve table and column tokens, then log the statement.
    fn finish(&self, statement: &'static str, sql: String, params: Params) -> (String, Params) {
        let sql = self.quoter.quote_sql(&sql);
        self.log_statement(statement, &sql, &params);
        (sql, params)
    }

    fn log_statement(&self, statement: &'static str, sql: &str, params: &Params) {
        if !self.log.enabled {
            return;
        }
        tracing::debug!(
            target: LOG_TARGET,
            statement,
            param_count = params.len(),
            sql = %self.log.truncate(sql),
        );
    }
}

/// Replace `:name` placeholders found in `replacements` in a single scan of `sql`.
///
/// Quoted literals and identifiers, `::` casts and names that only share a prefix
/// (`:id2` for `:id`) are left alone.
pub(crate) fn replace_placeholders(sql: &str, replacements: &HashMap<String, String>) -> String {
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut quote: Option<u8> = None;
    let mut last = 0;
    let mut pos = 0;
    while pos < bytes.len() {
        let b = bytes[pos];
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            pos += 1;
            continue;
        }
        match b {
            b'\'' | b'"' | b'`' => {
                quote = Some(b);
                pos += 1;
            }
            b':' if bytes.get(pos + 1) == Some(&b':') => pos += 2,
            b':' if bytes.get(pos + 1).is_some_and(|c| is_name_byte(*c)) => {
                let mut end = pos + 1;
                while bytes.get(end).is_some_and(|c| is_name_byte(*c)) {
                    end += 1;
                }
                if let Some(to) = replacements.get(&sql[pos..end]) {
                    out.push_str(&sql[last..pos]);
                    out.push_str(to);
                    last = end;
                }
                pos = end;
            }
            _ => pos += 1,
        }
    }
    out.push_str(&sql[last..]);
    out
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
