use rusqlite::types::ValueRef as BackendValueRef;

use crate::error::{Result, SqliteDbError};
use crate::types::ValueRef;

/// Longest text or blob the engine's C API accepts for a single bind (`int` length).
pub const MAX_BIND_LENGTH: usize = i32::MAX as usize;

/// Convert a host value into the engine's storage classes.
///
/// `Bool` becomes 0/1 and `Timestamp` whole seconds since the epoch.
#[must_use]
pub fn value_ref_to_backend(value: ValueRef<'_>) -> BackendValueRef<'_> {
    match value {
        ValueRef::Null => BackendValueRef::Null,
        ValueRef::Int(i) => BackendValueRef::Integer(i),
        ValueRef::Float(f) => BackendValueRef::Real(f),
        ValueRef::Bool(b) => BackendValueRef::Integer(i64::from(b)),
        ValueRef::Text(s) => BackendValueRef::Text(s.as_bytes()),
        ValueRef::Blob(b) => BackendValueRef::Blob(b),
        ValueRef::Timestamp(ts) => BackendValueRef::Integer(ts.timestamp()),
    }
}

/// Refuse values the engine would not store faithfully: text or blob payloads longer than
/// `limit` bytes, and timestamps finer than whole seconds.
///
/// # Errors
/// - [`SqliteDbError::ValueTooLarge`] naming the offending position for oversized payloads.
/// - `ExecutionError` (`SQLITE_MISMATCH`) for a timestamp with a fractional second.
pub fn check_bindable(position: usize, value: &ValueRef<'_>, limit: usize) -> Result<()> {
    if let ValueRef::Timestamp(ts) = value {
        if ts.timestamp_subsec_nanos() != 0 {
            return Err(SqliteDbError::mismatch(format!(
                "timestamp {ts} at parameter {position} has sub-second precision; \
                 only whole seconds are stored"
            )));
        }
    }
    match value.byte_len() {
        Some(len) if len > limit => Err(SqliteDbError::too_large(format!(
            "{} of {len} bytes at parameter {position} exceeds the limit of {limit} bytes",
            value.type_name()
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn tagged_values_map_to_integer_storage() {
        assert_eq!(
            value_ref_to_backend(ValueRef::Bool(true)),
            BackendValueRef::Integer(1)
        );
        let ts = DateTime::from_timestamp(86_400, 0).unwrap();
        assert_eq!(
            value_ref_to_backend(ValueRef::Timestamp(ts)),
            BackendValueRef::Integer(86_400)
        );
    }

    #[test]
    fn length_limit_applies_to_text_and_blob_only() {
        assert!(check_bindable(1, &ValueRef::Text("abcd"), 4).is_ok());
        let err = check_bindable(2, &ValueRef::Blob(&[0; 5]), 4).unwrap_err();
        assert!(matches!(err, SqliteDbError::ValueTooLarge { .. }));
        assert!(err.message().contains("parameter 2"));
        assert!(check_bindable(1, &ValueRef::Int(i64::MAX), 0).is_ok());
    }

    #[test]
    fn fractional_timestamps_are_refused() {
        let whole = DateTime::from_timestamp(1_600_000_000, 0).unwrap();
        assert!(check_bindable(1, &ValueRef::Timestamp(whole), 0).is_ok());
        let fractional = DateTime::from_timestamp(1_600_000_000, 999_000_000).unwrap();
        let err = check_bindable(3, &ValueRef::Timestamp(fractional), 0).unwrap_err();
        assert_eq!(err.code(), rusqlite::ffi::SQLITE_MISMATCH);
        assert!(err.message().contains("parameter 3"));
    }
}
