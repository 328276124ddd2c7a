use rusqlite::types::ValueRef as BackendValueRef;

use crate::error::{Result, SqliteDbError};
use crate::types::Value;

/// Extract a [`Value`] from a `SQLite` row.
///
/// Text that is not valid UTF-8 is kept as a blob rather than lossily decoded.
///
/// # Errors
///
/// Returns `SqliteDbError` if the column index is invalid.
pub fn sqlite_extract_value_sync(row: &rusqlite::Row, idx: usize) -> Result<Value> {
    let value = row.get_ref(idx).map_err(SqliteDbError::execution)?;
    Ok(match value {
        BackendValueRef::Null => Value::Null,
        BackendValueRef::Integer(i) => Value::Int(i),
        BackendValueRef::Real(f) => Value::Float(f),
        BackendValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
            Ok(s) => Value::Text(s.to_owned()),
            Err(_) => Value::Blob(bytes.to_vec()),
        },
        BackendValueRef::Blob(b) => Value::Blob(b.to_vec()),
    })
}

/// Step a statement to completion and buffer every row it produces.
///
/// The statement's current bindings are used as-is.
///
/// # Errors
/// Returns `SqliteDbError::ExecutionError` if stepping fails (constraint violation, busy
/// timeout, ...).
pub fn drain_rows(stmt: &mut rusqlite::Statement<'_>) -> Result<Vec<Vec<Value>>> {
    let column_count = stmt.column_count();
    let mut rows_iter = stmt.raw_query();
    let mut rows = Vec::new();

    while let Some(row) = rows_iter.next().map_err(SqliteDbError::execution)? {
        let mut row_values = Vec::with_capacity(column_count);
        for i in 0..column_count {
            row_values.push(sqlite_extract_value_sync(row, i)?);
        }
        rows.push(row_values);
    }

    Ok(rows)
}
