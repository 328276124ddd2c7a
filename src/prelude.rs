//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and traits
//! to make it easier to get started with the library.

pub use crate::conversion::{FromSqlValue, SqlOutput, ToSqlValue};
pub use crate::error::SqliteDbError;
pub use crate::sqlite::{
    Connection, ConnectionOptions, ConnectionOptionsBuilder, PreparedStatement, Transaction,
};
pub use crate::types::{OpenFlag, OpenFlags, TransactionMode, Value, ValueRef};
