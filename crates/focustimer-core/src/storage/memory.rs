//! In-process key-value store.
//!
//! Backs tests and throwaway runs. Contents live as long as the store.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::KeyValueStore;
use crate::error::StoreError;

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with raw values, e.g. legacy blobs in tests.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Store whose every call fails, for exercising the fallback paths.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct UnavailableStore;

#[cfg(test)]
#[async_trait]
impl KeyValueStore for UnavailableStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::ReadFailed {
            key: key.to_string(),
            message: "store unavailable".into(),
        })
    }

    async fn set(&self, key: &str, _value: String) -> Result<(), StoreError> {
        Err(StoreError::WriteFailed {
            key: key.to_string(),
            message: "store unavailable".into(),
        })
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        Err(StoreError::WriteFailed {
            key: key.to_string(),
            message: "store unavailable".into(),
        })
    }
}
