use rusqlite::types::{ToSqlOutput, ValueRef as BackendValueRef};

use super::params::{check_bindable, value_ref_to_backend};
use super::query::drain_rows;
use crate::conversion::{FromSqlValue, ToSqlValue};
use crate::error::{Result, SqliteDbError};
use crate::types::{Value, ValueRef};

/// Where a statement is in its execution.
#[derive(Debug)]
enum Cursor {
    /// Not executed since the last reset or rebind.
    Pending,
    /// Executed; `next` rows have been handed out by `run()`.
    Rows { rows: Vec<Vec<Value>>, next: usize },
    /// `run()` has returned `false`; it keeps doing so until a reset.
    Exhausted,
}

/// A compiled statement borrowing its [`Connection`](super::Connection).
///
/// Parameters are 1-based, columns 0-based. The first `run()` after a reset (or a bind)
/// executes the statement to completion and buffers its rows; later calls step through
/// them. The backend statement is finalized on drop.
pub struct PreparedStatement<'conn> {
    conn: &'conn rusqlite::Connection,
    stmt: rusqlite::Statement<'conn>,
    sql: String,
    max_value_length: usize,
    cursor: Cursor,
    last_insert_rowid: i64,
    changes: u64,
}

impl<'conn> PreparedStatement<'conn> {
    pub(crate) fn new(
        conn: &'conn rusqlite::Connection,
        stmt: rusqlite::Statement<'conn>,
        sql: &str,
        max_value_length: usize,
    ) -> Self {
        Self {
            conn,
            stmt,
            sql: sql.to_owned(),
            max_value_length,
            cursor: Cursor::Pending,
            last_insert_rowid: 0,
            changes: 0,
        }
    }

    /// Access the raw SQL string of the prepared statement.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.stmt.parameter_count()
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.stmt.column_count()
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.stmt.column_names()
    }

    /// Bind `value` to the 1-based parameter `position`.
    ///
    /// Owned and borrowed values are both accepted; borrowed text and blobs only need to
    /// live for this call, since the engine copies them before it returns. Binding discards
    /// any rows from a previous `run()`.
    ///
    /// # Errors
    /// - `ExecutionError` (`SQLITE_RANGE`) if `position` is outside `1..=parameter_count()`.
    /// - `ValueTooLarge` if text or blob exceeds the connection's maximum value length, or an
    ///   unsigned integer does not fit in 64 signed bits.
    /// - `ExecutionError` (`SQLITE_MISMATCH`) for a timestamp with a fractional second.
    ///
    /// No slot is modified when binding fails.
    pub fn bind<T: ToSqlValue>(&mut self, position: usize, value: T) -> Result<()> {
        self.check_position(position)?;
        let converted = value.to_sql_value()?;
        let bound = converted.as_value_ref();
        check_bindable(position, &bound, self.max_value_length)?;
        self.bind_checked(position, bound)
    }

    /// Bind `values` positionally, starting at parameter 1.
    ///
    /// Every value is validated before any is bound.
    ///
    /// # Errors
    /// Same as [`bind`](Self::bind); also fails if there are more values than parameters.
    pub fn bind_values(&mut self, values: &[Value]) -> Result<()> {
        let count = self.parameter_count();
        if values.len() > count {
            return Err(SqliteDbError::range(format!(
                "{} values supplied for {count} parameters",
                values.len()
            )));
        }
        for (idx, value) in values.iter().enumerate() {
            check_bindable(idx + 1, &value.as_value_ref(), self.max_value_length)?;
        }
        for (idx, value) in values.iter().enumerate() {
            self.bind_checked(idx + 1, value.as_value_ref())?;
        }
        Ok(())
    }

    /// Bind by parameter name, including its prefix (`:id`, `@id`, `$id`).
    ///
    /// # Errors
    /// `ExecutionError` (`SQLITE_RANGE`) if the statement has no such parameter, otherwise
    /// as [`bind`](Self::bind).
    pub fn bind_named<T: ToSqlValue>(&mut self, name: &str, value: T) -> Result<()> {
        let position = self
            .stmt
            .parameter_index(name)
            .map_err(SqliteDbError::execution)?
            .ok_or_else(|| SqliteDbError::range(format!("no parameter named {name}")))?;
        self.bind(position, value)
    }

    fn check_position(&self, position: usize) -> Result<()> {
        let count = self.parameter_count();
        if position == 0 || position > count {
            return Err(SqliteDbError::range(format!(
                "parameter {position} out of range (statement has {count} parameters)"
            )));
        }
        Ok(())
    }

    fn bind_checked(&mut self, position: usize, value: ValueRef<'_>) -> Result<()> {
        self.cursor = Cursor::Pending;
        self.stmt
            .raw_bind_parameter(position, ToSqlOutput::Borrowed(value_ref_to_backend(value)))
            .map_err(SqliteDbError::execution)
    }

    /// Advance to the next result row.
    ///
    /// Returns `true` while a row is available and `false` once the results are exhausted.
    /// After `false`, further calls keep returning `false` until [`reset`](Self::reset) or a
    /// rebind.
    ///
    /// # Errors
    /// Returns `ExecutionError` if the engine reports an error (constraint violation, busy
    /// timeout, ...). The statement is left ready to be re-executed.
    pub fn run(&mut self) -> Result<bool> {
        if matches!(self.cursor, Cursor::Pending) {
            self.execute()?;
        }
        let advanced = match &mut self.cursor {
            Cursor::Rows { rows, next } if *next < rows.len() => {
                *next += 1;
                true
            }
            _ => false,
        };
        if !advanced {
            self.cursor = Cursor::Exhausted;
        }
        Ok(advanced)
    }

    fn execute(&mut self) -> Result<()> {
        let rows = drain_rows(&mut self.stmt)?;
        self.changes = self.conn.changes();
        self.last_insert_rowid = self.conn.last_insert_rowid();
        self.cursor = Cursor::Rows { rows, next: 0 };
        Ok(())
    }

    /// Values of the row most recently returned by `run()`.
    ///
    /// # Errors
    /// Returns `ExecutionError` (`SQLITE_MISUSE`) if there is no current row.
    pub fn current_row(&self) -> Result<&[Value]> {
        match &self.cursor {
            Cursor::Rows { rows, next } if *next > 0 => Ok(&rows[*next - 1]),
            _ => Err(SqliteDbError::misuse(
                "no current row; run() has not returned true",
            )),
        }
    }

    /// Read the 0-based `column` of the current row as `T`.
    ///
    /// # Errors
    /// - `ExecutionError` (`SQLITE_RANGE`) if `column` is outside the result columns.
    /// - `ExecutionError` (`SQLITE_MISUSE`) if there is no current row.
    /// - `ExecutionError` (`SQLITE_MISMATCH`/`SQLITE_RANGE`) if the value does not convert.
    pub fn get<T: FromSqlValue>(&self, column: usize) -> Result<T> {
        let count = self.column_count();
        if column >= count {
            return Err(SqliteDbError::range(format!(
                "column {column} out of range (statement has {count} columns)"
            )));
        }
        let row = self.current_row()?;
        let value = row.get(column).map_or(ValueRef::Null, Value::as_value_ref);
        T::from_sql_value(value)
    }

    /// Read a column of the current row by name.
    ///
    /// # Errors
    /// `ExecutionError` (`SQLITE_RANGE`) for an unknown column, otherwise as [`get`](Self::get).
    pub fn get_named<T: FromSqlValue>(&self, column_name: &str) -> Result<T> {
        let column = self
            .stmt
            .column_index(column_name)
            .map_err(SqliteDbError::execution)?;
        self.get(column)
    }

    /// Rewind so the next `run()` executes again. Bindings are kept.
    pub fn reset(&mut self) {
        self.cursor = Cursor::Pending;
    }

    /// Set every parameter back to NULL.
    ///
    /// # Errors
    /// Returns `ExecutionError` if the engine refuses a bind.
    pub fn clear_bindings(&mut self) -> Result<()> {
        self.cursor = Cursor::Pending;
        for position in 1..=self.parameter_count() {
            self.stmt
                .raw_bind_parameter(position, ToSqlOutput::Borrowed(BackendValueRef::Null))
                .map_err(SqliteDbError::execution)?;
        }
        Ok(())
    }

    /// Rowid of the last INSERT on the connection, as of this statement's last execution.
    #[must_use]
    pub fn last_insert_rowid(&self) -> i64 {
        self.last_insert_rowid
    }

    /// Rows changed by the last INSERT/UPDATE/DELETE on the connection, as of this
    /// statement's last execution.
    #[must_use]
    pub fn changes(&self) -> u64 {
        self.changes
    }
}

impl std::fmt::Debug for PreparedStatement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedStatement")
            .field("sql", &self.sql)
            .field("cursor", &self.cursor)
            .field("last_insert_rowid", &self.last_insert_rowid)
            .field("changes", &self.changes)
            .finish()
    }
}
