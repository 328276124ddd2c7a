use std::ops::Deref;

use tracing::{debug, warn};

use super::connection::Connection;
use crate::error::Result;
use crate::types::TransactionMode;

/// Transaction scope that holds the connection exclusively until it completes.
///
/// Statements are prepared through the transaction (it derefs to [`Connection`]) and must be
/// dropped before `commit`/`rollback`, which consume it. If neither is called the
/// transaction is rolled back when dropped; a failure of that rollback is logged and
/// discarded.
#[derive(Debug)]
pub struct Transaction<'conn> {
    conn: &'conn mut Connection,
    mode: TransactionMode,
    needs_rollback: bool,
}

impl<'conn> Transaction<'conn> {
    /// Issue the `BEGIN` variant for `mode`.
    ///
    /// # Errors
    /// Returns `SqliteDbError::ExecutionError` if the engine refuses to begin (for example a
    /// transaction started with raw SQL is still open, or the lock is busy).
    pub fn new(conn: &'conn mut Connection, mode: TransactionMode) -> Result<Self> {
        conn.exec(mode.begin_sql())?;
        debug!(?mode, "began transaction");
        Ok(Self {
            conn,
            mode,
            needs_rollback: true,
        })
    }

    #[must_use]
    pub fn mode(&self) -> TransactionMode {
        self.mode
    }

    /// Commit the transaction.
    ///
    /// # Errors
    /// Returns `SqliteDbError::ExecutionError` if `COMMIT` fails. The transaction is then
    /// dropped with its rollback still pending, so the connection is not left mid-transaction.
    pub fn commit(mut self) -> Result<()> {
        self.conn.exec("COMMIT TRANSACTION")?;
        self.needs_rollback = false;
        debug!(mode = ?self.mode, "committed transaction");
        Ok(())
    }

    /// Roll back the transaction.
    ///
    /// # Errors
    /// Returns `SqliteDbError::ExecutionError` if `ROLLBACK` fails; the drop path retries once
    /// and discards that second result.
    pub fn rollback(mut self) -> Result<()> {
        self.conn.exec("ROLLBACK TRANSACTION")?;
        self.needs_rollback = false;
        debug!(mode = ?self.mode, "rolled back transaction");
        Ok(())
    }
}

impl Deref for Transaction<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.needs_rollback {
            return;
        }
        // Already unwinding or abandoned: never let this error escape.
        match self.conn.exec("ROLLBACK TRANSACTION") {
            Ok(()) => debug!(mode = ?self.mode, "rolled back abandoned transaction"),
            Err(err) => warn!(
                code = err.code(),
                error = %err,
                "rollback of abandoned transaction failed"
            ),
        }
    }
}
