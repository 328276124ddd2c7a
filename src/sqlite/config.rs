use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::connection::Connection;
use super::params::MAX_BIND_LENGTH;
use crate::error::{Result, SqliteDbError};
use crate::types::{OpenFlag, OpenFlags};

/// Options for opening a `SQLite` connection.
///
/// Deserializable so it can live in a config file; every field except `path` has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionOptions {
    pub path: PathBuf,
    #[serde(default)]
    pub flags: OpenFlags,
    /// Lock-contention wait, in milliseconds. `None` disables waiting: a locked database
    /// fails with `SQLITE_BUSY` at once.
    #[serde(default)]
    pub busy_timeout_ms: Option<u64>,
    /// Longest text/blob accepted by a single bind.
    #[serde(default = "default_max_value_length")]
    pub max_value_length: usize,
    /// Switch the journal to WAL right after opening.
    #[serde(default)]
    pub wal: bool,
    /// Enable foreign-key enforcement right after opening.
    #[serde(default)]
    pub foreign_keys: bool,
}

const fn default_max_value_length() -> usize {
    MAX_BIND_LENGTH
}

impl ConnectionOptions {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            flags: OpenFlags::empty(),
            busy_timeout_ms: None,
            max_value_length: MAX_BIND_LENGTH,
            wal: false,
            foreign_keys: false,
        }
    }

    /// Parse options from a JSON document.
    ///
    /// `max_value_length` is capped at [`MAX_BIND_LENGTH`], as in the builder.
    ///
    /// # Errors
    /// Returns `SqliteDbError::ConnectionError` if the document does not describe valid options.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut opts: Self =
            serde_json::from_str(json).map_err(|e| SqliteDbError::ConnectionError {
                code: rusqlite::ffi::SQLITE_MISUSE,
                message: format!("invalid connection options: {e}"),
            })?;
        opts.max_value_length = opts.max_value_length.min(MAX_BIND_LENGTH);
        Ok(opts)
    }

    #[must_use]
    pub fn busy_timeout(&self) -> Option<Duration> {
        self.busy_timeout_ms.map(Duration::from_millis)
    }

    /// Translate the flag set into engine open flags.
    ///
    /// An empty set yields the engine defaults. `ReadOnly` cannot be combined with
    /// `ReadWrite` or `Create`.
    ///
    /// # Errors
    /// Returns `SqliteDbError::ConnectionError` (`SQLITE_MISUSE`) for contradictory flags.
    pub fn backend_flags(&self) -> Result<rusqlite::OpenFlags> {
        use rusqlite::OpenFlags as B;

        if self.flags.is_empty() {
            return Ok(B::default());
        }
        let read_only = self.flags.contains(OpenFlag::ReadOnly);
        if read_only
            && (self.flags.contains(OpenFlag::ReadWrite) || self.flags.contains(OpenFlag::Create))
        {
            return Err(SqliteDbError::ConnectionError {
                code: rusqlite::ffi::SQLITE_MISUSE,
                message: "ReadOnly cannot be combined with ReadWrite or Create".into(),
            });
        }

        let mut out = B::SQLITE_OPEN_URI | B::SQLITE_OPEN_NO_MUTEX;
        if read_only {
            out |= B::SQLITE_OPEN_READ_ONLY;
        } else {
            // Create on its own still needs a writable handle.
            out |= B::SQLITE_OPEN_READ_WRITE;
        }
        if self.flags.contains(OpenFlag::Create) {
            out |= B::SQLITE_OPEN_CREATE;
        }
        if self.flags.contains(OpenFlag::SharedCache) {
            out |= B::SQLITE_OPEN_SHARED_CACHE;
        }
        Ok(out)
    }
}

/// Fluent builder for [`ConnectionOptions`].
#[derive(Debug, Clone)]
pub struct ConnectionOptionsBuilder {
    opts: ConnectionOptions,
}

impl ConnectionOptionsBuilder {
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            opts: ConnectionOptions::new(path.as_ref()),
        }
    }

    #[must_use]
    pub fn flags(mut self, flags: impl Into<OpenFlags>) -> Self {
        self.opts.flags = flags.into();
        self
    }

    #[must_use]
    pub fn flag(mut self, flag: OpenFlag) -> Self {
        self.opts.flags |= flag;
        self
    }

    #[must_use]
    pub fn read_only(self) -> Self {
        self.flag(OpenFlag::ReadOnly)
    }

    #[must_use]
    pub fn shared_cache(self) -> Self {
        self.flag(OpenFlag::SharedCache)
    }

    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.opts.busy_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    #[must_use]
    pub fn max_value_length(mut self, limit: usize) -> Self {
        self.opts.max_value_length = limit.min(MAX_BIND_LENGTH);
        self
    }

    #[must_use]
    pub fn wal(mut self, wal: bool) -> Self {
        self.opts.wal = wal;
        self
    }

    #[must_use]
    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.opts.foreign_keys = enabled;
        self
    }

    #[must_use]
    pub fn finish(self) -> ConnectionOptions {
        self.opts
    }

    /// Open a [`Connection`] with the accumulated options.
    ///
    /// # Errors
    ///
    /// Returns `SqliteDbError::ConnectionError` if the engine rejects the path or flags.
    pub fn open(self) -> Result<Connection> {
        Connection::open_with(self.finish())
    }
}
