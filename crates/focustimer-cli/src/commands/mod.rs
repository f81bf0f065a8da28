pub mod categories;
pub mod config;
pub mod report;
pub mod sessions;
pub mod timer;

use std::sync::Arc;

use focustimer_core::{KeyValueStore, SqliteStore};

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// The on-disk store every command reads and writes.
pub fn open_store() -> CliResult<Arc<dyn KeyValueStore>> {
    Ok(Arc::new(SqliteStore::open()?))
}
