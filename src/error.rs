use rusqlite::ffi;
use thiserror::Error;

/// Errors surfaced by the access layer.
///
/// Every variant carries the backend's (extended) result code next to its message, so callers
/// can branch on `code()` without parsing text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqliteDbError {
    #[error("Connection error ({code}): {message}")]
    ConnectionError { code: i32, message: String },

    #[error("Prepare error ({code}): {message}")]
    PrepareError { code: i32, message: String },

    #[error("SQL execution error ({code}): {message}")]
    ExecutionError { code: i32, message: String },

    #[error("Value too large ({code}): {message}")]
    ValueTooLarge { code: i32, message: String },
}

pub type Result<T> = std::result::Result<T, SqliteDbError>;

impl SqliteDbError {
    /// Backend result code attached to this error.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::ConnectionError { code, .. }
            | Self::PrepareError { code, .. }
            | Self::ExecutionError { code, .. }
            | Self::ValueTooLarge { code, .. } => *code,
        }
    }

    /// Human-readable message, without the variant prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::ConnectionError { message, .. }
            | Self::PrepareError { message, .. }
            | Self::ExecutionError { message, .. }
            | Self::ValueTooLarge { message, .. } => message,
        }
    }

    /// Primary result code (low byte of the extended code).
    #[must_use]
    pub fn primary_code(&self) -> i32 {
        self.code() & 0xff
    }

    pub(crate) fn connection(err: rusqlite::Error) -> Self {
        let (code, message) = split_backend_error(&err);
        if code & 0xff == ffi::SQLITE_TOOBIG {
            return Self::ValueTooLarge { code, message };
        }
        Self::ConnectionError { code, message }
    }

    pub(crate) fn prepare(err: rusqlite::Error) -> Self {
        let (code, message) = split_backend_error(&err);
        if code & 0xff == ffi::SQLITE_TOOBIG {
            return Self::ValueTooLarge { code, message };
        }
        Self::PrepareError { code, message }
    }

    pub(crate) fn execution(err: rusqlite::Error) -> Self {
        let (code, message) = split_backend_error(&err);
        if code & 0xff == ffi::SQLITE_TOOBIG {
            return Self::ValueTooLarge { code, message };
        }
        Self::ExecutionError { code, message }
    }

    pub(crate) fn closed() -> Self {
        Self::ConnectionError {
            code: ffi::SQLITE_MISUSE,
            message: "connection is closed".into(),
        }
    }

    pub(crate) fn range(message: impl Into<String>) -> Self {
        Self::ExecutionError {
            code: ffi::SQLITE_RANGE,
            message: message.into(),
        }
    }

    pub(crate) fn mismatch(message: impl Into<String>) -> Self {
        Self::ExecutionError {
            code: ffi::SQLITE_MISMATCH,
            message: message.into(),
        }
    }

    pub(crate) fn misuse(message: impl Into<String>) -> Self {
        Self::ExecutionError {
            code: ffi::SQLITE_MISUSE,
            message: message.into(),
        }
    }

    pub(crate) fn too_large(message: impl Into<String>) -> Self {
        Self::ValueTooLarge {
            code: ffi::SQLITE_TOOBIG,
            message: message.into(),
        }
    }
}

/// Split a rusqlite error into a SQLite result code and the most specific message available.
///
/// Errors raised by rusqlite itself (not by the engine) are given the engine code that
/// describes the same condition.
fn split_backend_error(err: &rusqlite::Error) -> (i32, String) {
    match err {
        rusqlite::Error::SqliteFailure(failure, message) => (
            failure.extended_code,
            message.clone().unwrap_or_else(|| failure.to_string()),
        ),
        rusqlite::Error::SqlInputError { error, msg, .. } => (error.extended_code, msg.clone()),
        rusqlite::Error::InvalidParameterCount(..)
        | rusqlite::Error::InvalidColumnIndex(..)
        | rusqlite::Error::InvalidColumnName(..)
        | rusqlite::Error::IntegralValueOutOfRange(..) => (ffi::SQLITE_RANGE, err.to_string()),
        rusqlite::Error::InvalidColumnType(..)
        | rusqlite::Error::FromSqlConversionFailure(..)
        | rusqlite::Error::ToSqlConversionFailure(..)
        | rusqlite::Error::Utf8Error(..) => (ffi::SQLITE_MISMATCH, err.to_string()),
        rusqlite::Error::InvalidPath(..) => (ffi::SQLITE_CANTOPEN, err.to_string()),
        rusqlite::Error::ExecuteReturnedResults | rusqlite::Error::MultipleStatement => {
            (ffi::SQLITE_MISUSE, err.to_string())
        }
        _ => (ffi::SQLITE_ERROR, err.to_string()),
    }
}
