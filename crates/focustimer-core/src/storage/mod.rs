mod categories;
mod config;
pub mod database;
mod memory;
mod sessions;

pub use categories::{
    add_category, migrate_categories, remove_category, Category, CategoryRepository,
    StoredCategory, CATEGORIES_KEY, CATEGORY_PALETTE, DEFAULT_PICK_COLOR, PICKER_PALETTE,
};
pub use config::{Config, NotificationsConfig, TimerConfig};
pub use database::SqliteStore;
pub use memory::MemoryStore;
#[cfg(test)]
pub(crate) use memory::UnavailableStore;
pub use sessions::{Session, SessionRepository, SESSIONS_KEY};

use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::StoreError;

/// Persistent string-keyed store the repositories sit on.
///
/// Values are opaque strings; JSON encoding is done by the repositories.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns `None` when the key has never been written.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Returns `~/.config/focustimer[-dev]/` based on FOCUSTIMER_ENV.
///
/// Set FOCUSTIMER_ENV=dev to use the development data directory, or
/// FOCUSTIMER_DATA_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("FOCUSTIMER_DATA_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("FOCUSTIMER_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("focustimer-dev")
            } else {
                base_dir.join("focustimer")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
