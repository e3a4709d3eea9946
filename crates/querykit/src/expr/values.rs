//! Composite and typed value expressions.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Timelike};
use serde::Serialize;

use crate::error::{QbError, QbResult};
use crate::query::Query;
use crate::value::Value;

/// Elements of an array value.
#[derive(Debug, Clone)]
pub enum ArraySource {
    Values(Vec<Value>),
    /// Elements selected by a sub-query.
    Query(Box<Query>),
    /// A pre-encoded array literal, bound as a string (e.g. `{1,2,3}`).
    Literal(String),
}

/// An array value with an optional element/column type (e.g. `integer[]`).
#[derive(Debug, Clone)]
pub struct ArrayValue {
    pub source: ArraySource,
    pub column_type: Option<String>,
}

impl ArrayValue {
    pub fn new<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            source: ArraySource::Values(values.into_iter().map(Into::into).collect()),
            column_type: None,
        }
    }

    pub fn from_query(query: Query) -> Self {
        Self {
            source: ArraySource::Query(Box::new(query)),
            column_type: None,
        }
    }

    pub fn literal(literal: impl Into<String>) -> Self {
        Self {
            source: ArraySource::Literal(literal.into()),
            column_type: None,
        }
    }

    pub fn with_type(mut self, column_type: impl Into<String>) -> Self {
        self.column_type = Some(column_type.into());
        self
    }

    /// The values as a JSON array, if the elements are inline values.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match &self.source {
            ArraySource::Values(values) => Some(serde_json::Value::Array(
                values.iter().map(Value::to_json).collect(),
            )),
            _ => None,
        }
    }
}

/// A JSON document, bound as its encoded text.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonValue {
    pub value: serde_json::Value,
    /// Database type to cast to (`json`, `jsonb`).
    pub db_type: Option<String>,
}

impl JsonValue {
    pub fn new(value: serde_json::Value) -> Self {
        Self {
            value,
            db_type: None,
        }
    }

    /// Encode any serializable value.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> QbResult<Self> {
        let value = serde_json::to_value(value)
            .map_err(|e| QbError::invalid_argument(format!("Cannot encode JSON value: {e}")))?;
        Ok(Self::new(value))
    }

    pub fn with_type(mut self, db_type: impl Into<String>) -> Self {
        self.db_type = Some(db_type.into());
        self
    }

    pub fn encoded(&self) -> String {
        self.value.to_string()
    }
}

/// A composite (row/record) value with named fields in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredValue {
    pub fields: Vec<(String, Value)>,
    /// Composite type name to cast to.
    pub db_type: Option<String>,
}

impl StructuredValue {
    pub fn new<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            db_type: None,
        }
    }

    pub fn with_type(mut self, db_type: impl Into<String>) -> Self {
        self.db_type = Some(db_type.into());
        self
    }

    /// The fields as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

/// Which date/time representation a [`DateTimeValue`] renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateTimeType {
    Timestamp,
    DateTime,
    DateTimeTz,
    Time,
    TimeTz,
    Date,
}

/// A point in time bound as a formatted string.
#[derive(Debug, Clone, PartialEq)]
pub struct DateTimeValue {
    pub value: DateTime<FixedOffset>,
    pub ty: DateTimeType,
}

impl DateTimeValue {
    pub fn new<Tz: TimeZone>(value: DateTime<Tz>, ty: DateTimeType) -> Self {
        Self {
            value: value.fixed_offset(),
            ty,
        }
    }

    /// A value without a zone, taken as UTC.
    pub fn from_naive(value: NaiveDateTime, ty: DateTimeType) -> Self {
        Self::new(value.and_utc(), ty)
    }

    /// Whether the value has a non-zero sub-second part.
    pub fn has_microseconds(&self) -> bool {
        self.value.nanosecond() / 1_000 != 0
    }

    /// `strftime` format for this type; fractional seconds only when present.
    pub fn format_string(&self) -> &'static str {
        let micros = self.has_microseconds();
        match (self.ty, micros) {
            (DateTimeType::Timestamp | DateTimeType::DateTime, false) => "%Y-%m-%d %H:%M:%S",
            (DateTimeType::Timestamp | DateTimeType::DateTime, true) => "%Y-%m-%d %H:%M:%S%.6f",
            (DateTimeType::DateTimeTz, false) => "%Y-%m-%d %H:%M:%S%:z",
            (DateTimeType::DateTimeTz, true) => "%Y-%m-%d %H:%M:%S%.6f%:z",
            (DateTimeType::Time, false) => "%H:%M:%S",
            (DateTimeType::Time, true) => "%H:%M:%S%.6f",
            (DateTimeType::TimeTz, false) => "%H:%M:%S%:z",
            (DateTimeType::TimeTz, true) => "%H:%M:%S%.6f%:z",
            (DateTimeType::Date, _) => "%Y-%m-%d",
        }
    }

    pub fn formatted(&self) -> String {
        self.value.format(self.format_string()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(micros: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_micro_opt(14, 5, 7, micros))
            .expect("valid date")
    }

    #[test]
    fn datetime_without_fraction() {
        let v = DateTimeValue::from_naive(at(0), DateTimeType::DateTime);
        assert!(!v.has_microseconds());
        assert_eq!(v.formatted(), "2024-03-09 14:05:07");
    }

    #[test]
    fn datetime_with_fraction() {
        let v = DateTimeValue::from_naive(at(120), DateTimeType::Timestamp);
        assert!(v.has_microseconds());
        assert_eq!(v.formatted(), "2024-03-09 14:05:07.000120");
    }

    #[test]
    fn zoned_and_partial_types() {
        let offset = FixedOffset::east_opt(3 * 3600).expect("valid offset");
        let zoned = offset.from_utc_datetime(&at(0));
        assert_eq!(
            DateTimeValue::new(zoned, DateTimeType::DateTimeTz).formatted(),
            "2024-03-09 17:05:07+03:00"
        );
        assert_eq!(
            DateTimeValue::new(zoned, DateTimeType::TimeTz).formatted(),
            "17:05:07+03:00"
        );
        assert_eq!(
            DateTimeValue::from_naive(at(5), DateTimeType::Date).formatted(),
            "2024-03-09"
        );
        assert_eq!(
            DateTimeValue::from_naive(at(5), DateTimeType::Time).formatted(),
            "14:05:07.000005"
        );
    }

    #[test]
    fn structured_and_array_json() {
        let s = StructuredValue::new([("price", Value::Int(10)), ("currency", "USD".into())]);
        assert_eq!(s.to_json().to_string(), r#"{"currency":"USD","price":10}"#);
        let a = ArrayValue::new([1, 2]);
        assert_eq!(a.to_json().map(|j| j.to_string()), Some("[1,2]".into()));
    }
}
