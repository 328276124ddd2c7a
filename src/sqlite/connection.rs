use std::fmt;
use std::path::Path;
use std::time::Duration;

use tracing::debug;

use super::config::{ConnectionOptions, ConnectionOptionsBuilder};
use super::prepared::PreparedStatement;
use super::transaction::Transaction;
use crate::error::{Result, SqliteDbError};
use crate::types::{OpenFlags, TransactionMode};

/// Exclusive owner of one open `SQLite` handle.
///
/// The handle is either open and usable or, after [`Connection::close`], absent; every
/// operation on a closed connection fails with `SqliteDbError::ConnectionError`.
pub struct Connection {
    conn: Option<rusqlite::Connection>,
    options: ConnectionOptions,
}

impl Connection {
    /// Open (or create, depending on `flags`) the database at `path`.
    ///
    /// # Errors
    /// Returns `SqliteDbError::ConnectionError` with the engine's code and message if the open
    /// is rejected. No handle is retained on failure.
    pub fn open(
        path: impl AsRef<Path>,
        flags: impl Into<OpenFlags>,
        busy_timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = ConnectionOptionsBuilder::new(path).flags(flags);
        if let Some(timeout) = busy_timeout {
            builder = builder.busy_timeout(timeout);
        }
        Self::open_with(builder.finish())
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    /// Returns `SqliteDbError::ConnectionError` if the engine cannot allocate the database.
    pub fn open_in_memory() -> Result<Self> {
        Self::open_with(ConnectionOptions::new(":memory:"))
    }

    #[must_use]
    pub fn builder(path: impl AsRef<Path>) -> ConnectionOptionsBuilder {
        ConnectionOptionsBuilder::new(path)
    }

    /// Open a connection from fully specified options.
    ///
    /// # Errors
    /// Returns `SqliteDbError::ConnectionError` if the flags are contradictory, the engine
    /// rejects the open, or one of the post-open pragmas fails.
    pub fn open_with(options: ConnectionOptions) -> Result<Self> {
        let flags = options.backend_flags()?;
        let conn = rusqlite::Connection::open_with_flags(&options.path, flags)
            .map_err(SqliteDbError::connection)?;

        // rusqlite installs a 5 s busy handler on open; no timeout means fail fast
        conn.busy_timeout(options.busy_timeout().unwrap_or(Duration::ZERO))
            .map_err(SqliteDbError::connection)?;
        if options.foreign_keys {
            conn.execute_batch("PRAGMA foreign_keys = ON;")
                .map_err(SqliteDbError::connection)?;
        }
        if options.wal {
            conn.execute_batch("PRAGMA journal_mode = WAL;")
                .map_err(SqliteDbError::connection)?;
        }

        debug!(path = %options.path.display(), flags = ?options.flags, "opened sqlite connection");
        Ok(Self {
            conn: Some(conn),
            options,
        })
    }

    pub(crate) fn handle(&self) -> Result<&rusqlite::Connection> {
        self.conn.as_ref().ok_or_else(SqliteDbError::closed)
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.options.path
    }

    #[must_use]
    pub fn flags(&self) -> OpenFlags {
        self.options.flags
    }

    /// Lock-contention wait in effect; `None` means a locked database fails immediately.
    #[must_use]
    pub fn busy_timeout(&self) -> Option<Duration> {
        self.options.busy_timeout()
    }

    #[must_use]
    pub fn max_value_length(&self) -> usize {
        self.options.max_value_length
    }

    /// Change how long a blocked call waits for a lock before failing.
    ///
    /// The timeout is applied to the live handle; on failure the previous timeout stays in
    /// effect and the connection remains usable.
    ///
    /// # Errors
    /// Returns `SqliteDbError::ConnectionError` if the connection is closed or the engine
    /// refuses the setting.
    pub fn set_busy_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.handle()?
            .busy_timeout(timeout)
            .map_err(SqliteDbError::connection)?;
        self.options.busy_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        debug!(timeout_ms = ?self.options.busy_timeout_ms, "busy timeout updated");
        Ok(())
    }

    /// Execute one or more statements that return no rows (DDL, PRAGMA, transaction control).
    ///
    /// # Errors
    /// Returns `SqliteDbError::ExecutionError` with the engine's code and message on failure.
    pub fn exec(&self, sql: &str) -> Result<()> {
        self.handle()?
            .execute_batch(sql)
            .map_err(SqliteDbError::execution)
    }

    /// Compile `sql` into a statement bound to this connection.
    ///
    /// # Errors
    /// Returns `SqliteDbError::PrepareError` if the text does not compile.
    pub fn prepare(&self, sql: &str) -> Result<PreparedStatement<'_>> {
        let conn = self.handle()?;
        let stmt = conn.prepare(sql).map_err(SqliteDbError::prepare)?;
        debug!(sql, "prepared statement");
        Ok(PreparedStatement::new(
            conn,
            stmt,
            sql,
            self.options.max_value_length,
        ))
    }

    /// Begin a transaction in `mode`; it rolls back on drop unless committed.
    ///
    /// # Errors
    /// Returns `SqliteDbError::ExecutionError` if `BEGIN` fails.
    pub fn transaction(&mut self, mode: TransactionMode) -> Result<Transaction<'_>> {
        Transaction::new(self, mode)
    }

    /// Rowid of the most recent successful INSERT on this connection.
    ///
    /// # Errors
    /// Returns `SqliteDbError::ConnectionError` if the connection is closed.
    pub fn last_insert_rowid(&self) -> Result<i64> {
        Ok(self.handle()?.last_insert_rowid())
    }

    /// Rows modified by the most recent INSERT/UPDATE/DELETE on this connection.
    ///
    /// # Errors
    /// Returns `SqliteDbError::ConnectionError` if the connection is closed.
    pub fn changes(&self) -> Result<u64> {
        Ok(self.handle()?.changes())
    }

    /// `true` when no transaction is open.
    ///
    /// # Errors
    /// Returns `SqliteDbError::ConnectionError` if the connection is closed.
    pub fn is_autocommit(&self) -> Result<bool> {
        Ok(self.handle()?.is_autocommit())
    }

    /// Close the handle now instead of on drop.
    ///
    /// If the engine refuses (for example while statements are still busy) the handle is
    /// kept and the connection stays open. Closing an already closed connection is a no-op.
    ///
    /// # Errors
    /// Returns `SqliteDbError::ConnectionError` if the engine refuses to close.
    pub fn close(&mut self) -> Result<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        match conn.close() {
            Ok(()) => {
                debug!(path = %self.options.path.display(), "closed sqlite connection");
                Ok(())
            }
            Err((conn, err)) => {
                self.conn = Some(conn);
                Err(SqliteDbError::connection(err))
            }
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("path", &self.options.path)
            .field("flags", &self.options.flags)
            .field("busy_timeout_ms", &self.options.busy_timeout_ms)
            .field("open", &self.is_open())
            .finish()
    }
}
