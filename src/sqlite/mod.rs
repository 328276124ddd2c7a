// SQLite module - the synchronous access layer over rusqlite
//
// This module is split into several sub-modules:
// - config: Connection options and the fluent builder
// - connection: Connection ownership, exec, prepare
// - params: Host values to SQLite storage classes, bind length checks
// - prepared: Typed bind/get over a compiled statement
// - query: Row extraction and buffering
// - transaction: Scoped transactions with rollback on drop

pub mod config;
pub mod connection;
pub mod params;
pub mod prepared;
pub mod query;
pub mod transaction;

// Re-export the public API
pub use config::{ConnectionOptions, ConnectionOptionsBuilder};
pub use connection::Connection;
pub use params::MAX_BIND_LENGTH;
pub use prepared::PreparedStatement;
pub use transaction::Transaction;
