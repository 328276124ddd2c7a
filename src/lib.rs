//! Synchronous, type-safe access to an embedded `SQLite` database.
//!
//! - [`Connection`] owns one open handle.
//! - [`PreparedStatement`] binds typed parameters (1-based) and reads typed columns (0-based).
//! - [`Transaction`] rolls back on drop unless committed.
//!
//! ```rust
//! use sqlite_typed::prelude::*;
//!
//! # fn main() -> Result<(), SqliteDbError> {
//! let mut conn = Connection::open_in_memory()?;
//! conn.exec("CREATE TABLE t (id INTEGER, name TEXT)")?;
//!
//! let tx = conn.transaction(TransactionMode::Immediate)?;
//! {
//!     let mut insert = tx.prepare("INSERT INTO t VALUES (?1, ?2)")?;
//!     insert.bind(1, 1)?;
//!     insert.bind(2, "a")?;
//!     insert.run()?;
//! }
//! tx.commit()?;
//!
//! let mut select = conn.prepare("SELECT id, name FROM t")?;
//! assert!(select.run()?);
//! assert_eq!(select.get::<i64>(0)?, 1);
//! assert_eq!(select.get::<String>(1)?, "a");
//! assert!(!select.run()?);
//! # Ok(())
//! # }
//! ```

pub mod conversion;
pub mod error;
pub mod prelude;
pub mod sqlite;
pub mod types;

pub use conversion::{FromSqlValue, SqlOutput, ToSqlValue};
pub use error::{Result, SqliteDbError};
pub use sqlite::{
    Connection, ConnectionOptions, ConnectionOptionsBuilder, PreparedStatement, Transaction,
};
pub use types::{OpenFlag, OpenFlags, TransactionMode, Value, ValueRef};
