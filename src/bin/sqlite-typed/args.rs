use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use sqlite_typed::{ConnectionOptions, OpenFlag, SqliteDbError, TransactionMode};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run SQL against a SQLite file inside one transaction")]
pub(crate) struct Args {
    /// Database file (`:memory:` for a throwaway database)
    pub(crate) path: PathBuf,
    /// Statements to run, in order
    pub(crate) sql: Vec<String>,
    #[arg(long)]
    pub(crate) read_only: bool,
    #[arg(long)]
    pub(crate) shared_cache: bool,
    #[arg(long, value_parser = humantime::parse_duration)]
    pub(crate) busy_timeout: Option<Duration>,
    #[arg(long, value_enum, default_value = "deferred")]
    pub(crate) mode: TransactionMode,
    /// JSON connection options; command-line flags are applied on top
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
    #[arg(long, short)]
    pub(crate) verbose: bool,
}

impl Args {
    pub(crate) fn connection_options(&self) -> Result<ConnectionOptions, SqliteDbError> {
        let mut opts = match &self.config {
            Some(file) => {
                let json = std::fs::read_to_string(file).map_err(|e| {
                    SqliteDbError::ConnectionError {
                        code: rusqlite::ffi::SQLITE_CANTOPEN,
                        message: format!("cannot read {}: {e}", file.display()),
                    }
                })?;
                ConnectionOptions::from_json(&json)?
            }
            None => ConnectionOptions::new(&self.path),
        };
        opts.path.clone_from(&self.path);
        if self.read_only {
            opts.flags |= OpenFlag::ReadOnly;
        }
        if self.shared_cache {
            opts.flags |= OpenFlag::SharedCache;
        }
        if let Some(timeout) = self.busy_timeout {
            opts.busy_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        }
        Ok(opts)
    }
}
