//! `tokio-postgres` binding.
//!
//! ```ignore
//! let (sql, params) = qb.build(&query)?;
//! let stmt = PgStatement::new(&sql, &params)?;
//! let rows = client.query(stmt.sql(), &stmt.params()).await?;
//! ```

use std::error::Error;

use bytes::BytesMut;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

use crate::bind::{PlaceholderStyle, to_positional};
use crate::error::QbResult;
use crate::value::{Param, Params, Value};

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => b.to_sql(ty, out),
            Value::Int(i) => match *ty {
                Type::INT2 => i16::try_from(*i)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*i)?.to_sql(ty, out),
                Type::FLOAT4 => (*i as f32).to_sql(ty, out),
                Type::FLOAT8 => (*i as f64).to_sql(ty, out),
                Type::TEXT | Type::VARCHAR | Type::BPCHAR => i.to_string().to_sql(ty, out),
                _ => i.to_sql(ty, out),
            },
            Value::Float(f) => match *ty {
                Type::FLOAT4 => (*f as f32).to_sql(ty, out),
                Type::TEXT | Type::VARCHAR | Type::BPCHAR => f.to_string().to_sql(ty, out),
                _ => f.to_sql(ty, out),
            },
            Value::String(s) => s.to_sql(ty, out),
            Value::Bytes(b) => b.to_sql(ty, out),
            Value::Json(json) => match *ty {
                Type::JSON | Type::JSONB => json.to_sql(ty, out),
                _ => json.to_string().to_sql(ty, out),
            },
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

impl ToSql for Param {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        self.value().to_sql(ty, out)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// A compiled statement in `$n` form with its parameters in bind order.
#[derive(Debug, Clone)]
pub struct PgStatement {
    sql: String,
    params: Vec<Param>,
}

impl PgStatement {
    pub fn new(sql: &str, params: &Params) -> QbResult<Self> {
        let (sql, params) = to_positional(sql, params, PlaceholderStyle::Dollar)?;
        Ok(Self { sql, params })
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Parameters in the form `Client::query` takes.
    pub fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|p| p as &(dyn ToSql + Sync))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_narrow_to_column_type() {
        let mut buf = BytesMut::new();
        Value::Int(7).to_sql(&Type::INT4, &mut buf).unwrap();
        assert_eq!(&buf[..], &7_i32.to_be_bytes());

        let mut buf = BytesMut::new();
        assert!(Value::Int(i64::MAX).to_sql(&Type::INT2, &mut buf).is_err());
    }

    #[test]
    fn null_is_null() {
        let mut buf = BytesMut::new();
        assert!(matches!(
            Value::Null.to_sql(&Type::TEXT, &mut buf).unwrap(),
            IsNull::Yes
        ));
    }

    #[test]
    fn statement_uses_dollar_placeholders() {
        let mut params = Params::new();
        params.bind("active");
        params.bind(18);
        let stmt = PgStatement::new(r#"SELECT * FROM "t" WHERE "s"=:pv0 AND "a">:pv1"#, &params)
            .unwrap();
        assert_eq!(stmt.sql(), r#"SELECT * FROM "t" WHERE "s"=$1 AND "a">$2"#);
        assert_eq!(stmt.params().len(), 2);
    }
}
