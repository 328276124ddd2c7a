//! Host-type conversions for binding and column extraction.
//!
//! This is the only place that knows how a Rust type maps onto [`ValueRef`]. Adding a new
//! bindable or readable type means adding one impl here.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value as JsonValue;

use crate::error::{Result, SqliteDbError};
use crate::types::{Value, ValueRef};

/// Result of converting a host value for binding.
///
/// Most types hand out a view of themselves; types that have to serialize first (JSON)
/// produce an owned value instead.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlOutput<'a> {
    Borrowed(ValueRef<'a>),
    Owned(Value),
}

impl SqlOutput<'_> {
    #[must_use]
    pub fn as_value_ref(&self) -> ValueRef<'_> {
        match self {
            SqlOutput::Borrowed(value) => *value,
            SqlOutput::Owned(value) => value.as_value_ref(),
        }
    }
}

impl<'a> From<ValueRef<'a>> for SqlOutput<'a> {
    fn from(value: ValueRef<'a>) -> Self {
        SqlOutput::Borrowed(value)
    }
}

impl From<Value> for SqlOutput<'_> {
    fn from(value: Value) -> Self {
        SqlOutput::Owned(value)
    }
}

/// Types that can be bound to a statement parameter.
///
/// The output may borrow from `self`; the engine copies text and blob bytes before the bind
/// call returns.
pub trait ToSqlValue {
    /// Convert into a value the statement can bind.
    ///
    /// # Errors
    /// Returns [`SqliteDbError::ValueTooLarge`] if the value cannot be represented without
    /// narrowing (for example a `u64` above `i64::MAX`).
    fn to_sql_value(&self) -> Result<SqlOutput<'_>>;
}

/// Types that can be read out of a result column.
pub trait FromSqlValue: Sized {
    /// Convert a column value into `Self`.
    ///
    /// # Errors
    /// Returns [`SqliteDbError::ExecutionError`] with a `SQLITE_MISMATCH` code when the stored
    /// type does not convert, or `SQLITE_RANGE` when an integer does not fit.
    fn from_sql_value(value: ValueRef<'_>) -> Result<Self>;
}

fn mismatch(value: ValueRef<'_>, target: &str) -> SqliteDbError {
    SqliteDbError::mismatch(format!(
        "cannot read {} column as {target}",
        value.type_name()
    ))
}

impl<T: ToSqlValue + ?Sized> ToSqlValue for &T {
    fn to_sql_value(&self) -> Result<SqlOutput<'_>> {
        (**self).to_sql_value()
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(&self) -> Result<SqlOutput<'_>> {
        match self {
            Some(value) => value.to_sql_value(),
            None => Ok(ValueRef::Null.into()),
        }
    }
}

impl ToSqlValue for () {
    fn to_sql_value(&self) -> Result<SqlOutput<'_>> {
        Ok(ValueRef::Null.into())
    }
}

impl ToSqlValue for Value {
    fn to_sql_value(&self) -> Result<SqlOutput<'_>> {
        Ok(self.as_value_ref().into())
    }
}

impl ToSqlValue for ValueRef<'_> {
    fn to_sql_value(&self) -> Result<SqlOutput<'_>> {
        Ok((*self).into())
    }
}

macro_rules! lossless_int {
    ($($t:ty),*) => {
        $(
            impl ToSqlValue for $t {
                fn to_sql_value(&self) -> Result<SqlOutput<'_>> {
                    Ok(ValueRef::Int(i64::from(*self)).into())
                }
            }
        )*
    };
}

lossless_int!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! checked_int {
    ($($t:ty),*) => {
        $(
            impl ToSqlValue for $t {
                fn to_sql_value(&self) -> Result<SqlOutput<'_>> {
                    i64::try_from(*self).map(|i| ValueRef::Int(i).into()).map_err(|_| {
                        SqliteDbError::too_large(format!(
                            "{} {} does not fit in a 64-bit signed integer",
                            stringify!($t),
                            self
                        ))
                    })
                }
            }
        )*
    };
}

checked_int!(u64, usize);

impl ToSqlValue for f64 {
    fn to_sql_value(&self) -> Result<SqlOutput<'_>> {
        Ok(ValueRef::Float(*self).into())
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(&self) -> Result<SqlOutput<'_>> {
        Ok(ValueRef::Bool(*self).into())
    }
}

impl ToSqlValue for str {
    fn to_sql_value(&self) -> Result<SqlOutput<'_>> {
        Ok(ValueRef::Text(self).into())
    }
}

impl ToSqlValue for String {
    fn to_sql_value(&self) -> Result<SqlOutput<'_>> {
        Ok(ValueRef::Text(self).into())
    }
}

impl ToSqlValue for [u8] {
    fn to_sql_value(&self) -> Result<SqlOutput<'_>> {
        Ok(ValueRef::Blob(self).into())
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(&self) -> Result<SqlOutput<'_>> {
        Ok(ValueRef::Blob(self).into())
    }
}

impl ToSqlValue for DateTime<Utc> {
    fn to_sql_value(&self) -> Result<SqlOutput<'_>> {
        Ok(ValueRef::Timestamp(*self).into())
    }
}

/// JSON documents are bound as their serialized text.
impl ToSqlValue for JsonValue {
    fn to_sql_value(&self) -> Result<SqlOutput<'_>> {
        Ok(Value::Text(self.to_string()).into())
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    fn from_sql_value(value: ValueRef<'_>) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_sql_value(value).map(Some)
        }
    }
}

/// Reads the engine's storage class back. `Bool` and `Timestamp` are stored as integers, so
/// they come back as `Value::Int`; read them as `bool` or `DateTime<Utc>` to get the tag back.
impl FromSqlValue for Value {
    fn from_sql_value(value: ValueRef<'_>) -> Result<Self> {
        Ok(value.to_value())
    }
}

macro_rules! int_from_sql {
    ($($t:ty),*) => {
        $(
            impl FromSqlValue for $t {
                fn from_sql_value(value: ValueRef<'_>) -> Result<Self> {
                    let wide = match value {
                        ValueRef::Null => return Ok(0),
                        ValueRef::Int(i) => i,
                        ValueRef::Bool(b) => i64::from(b),
                        ValueRef::Timestamp(ts) => ts.timestamp(),
                        other => return Err(mismatch(other, stringify!($t))),
                    };
                    <$t>::try_from(wide).map_err(|_| {
                        SqliteDbError::range(format!(
                            "integer {wide} out of range for {}",
                            stringify!($t)
                        ))
                    })
                }
            }
        )*
    };
}

int_from_sql!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl FromSqlValue for f64 {
    #[allow(clippy::cast_precision_loss)]
    fn from_sql_value(value: ValueRef<'_>) -> Result<Self> {
        match value {
            ValueRef::Null => Ok(0.0),
            ValueRef::Float(f) => Ok(f),
            ValueRef::Int(i) => Ok(i as f64),
            other => Err(mismatch(other, "f64")),
        }
    }
}

impl FromSqlValue for bool {
    fn from_sql_value(value: ValueRef<'_>) -> Result<Self> {
        match value {
            ValueRef::Null => Ok(false),
            ValueRef::Bool(b) => Ok(b),
            ValueRef::Int(i) => Ok(i != 0),
            other => Err(mismatch(other, "bool")),
        }
    }
}

impl FromSqlValue for String {
    fn from_sql_value(value: ValueRef<'_>) -> Result<Self> {
        match value {
            ValueRef::Null => Ok(String::new()),
            ValueRef::Text(s) => Ok(s.to_owned()),
            ValueRef::Blob(bytes) => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|_| mismatch(value, "UTF-8 string")),
            other => Err(mismatch(other, "String")),
        }
    }
}

impl FromSqlValue for Vec<u8> {
    fn from_sql_value(value: ValueRef<'_>) -> Result<Self> {
        match value {
            ValueRef::Null => Ok(Vec::new()),
            ValueRef::Blob(bytes) => Ok(bytes.to_vec()),
            ValueRef::Text(s) => Ok(s.as_bytes().to_vec()),
            other => Err(mismatch(other, "Vec<u8>")),
        }
    }
}

impl FromSqlValue for DateTime<Utc> {
    fn from_sql_value(value: ValueRef<'_>) -> Result<Self> {
        match value {
            ValueRef::Timestamp(ts) => Ok(ts),
            ValueRef::Int(secs) => DateTime::from_timestamp(secs, 0).ok_or_else(|| {
                SqliteDbError::range(format!("{secs} seconds is outside the timestamp range"))
            }),
            ValueRef::Text(s) => parse_timestamp_text(s)
                .map(|naive| naive.and_utc())
                .ok_or_else(|| mismatch(value, "timestamp")),
            other => Err(mismatch(other, "timestamp")),
        }
    }
}

impl FromSqlValue for JsonValue {
    fn from_sql_value(value: ValueRef<'_>) -> Result<Self> {
        match value {
            ValueRef::Null => Ok(JsonValue::Null),
            ValueRef::Text(s) => serde_json::from_str(s)
                .map_err(|e| SqliteDbError::mismatch(format!("column is not valid JSON: {e}"))),
            other => Err(mismatch(other, "JSON")),
        }
    }
}

/// Text timestamps as written by `CURRENT_TIMESTAMP` and `datetime()`.
fn parse_timestamp_text(s: &str) -> Option<NaiveDateTime> {
    // Try "YYYY-MM-DD HH:MM:SS"
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    // Try "YYYY-MM-DD HH:MM:SS.SSS"
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").ok()
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Blob(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

/// JSON documents are stored as their serialized text.
impl From<JsonValue> for Value {
    fn from(value: JsonValue) -> Self {
        Value::Text(value.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
