//! SQLite-backed key-value store.
//!
//! A single `kv` table holds every persisted blob (session list, category
//! list). The connection sits behind a mutex so the store can be shared
//! between the timer driver and report readers. Queries run on tokio's
//! blocking pool, never on the async worker that awaits them.

use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::{data_dir, KeyValueStore};
use crate::error::StoreError;

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open the store at `~/.config/focustimer/focustimer.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let path = data_dir()?.join("focustimer.db");
        Self::open_at(&path)
    }

    /// Open (or create) the store at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::OpenFailed {
            path: ":memory:".into(),
            source,
        })?;
        Self::from_connection(conn).map_err(|source| StoreError::OpenFailed {
            path: ":memory:".into(),
            source,
        })
    }

    fn from_connection(conn: Connection) -> Result<Self, rusqlite::Error> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `op` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, key: &str, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let owned_key = key.to_string();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| StoreError::ReadFailed {
                key: owned_key,
                message: "connection mutex poisoned".into(),
            })?;
            op(&guard)
        })
        .await
        .map_err(|e| StoreError::ReadFailed {
            key: key.to_string(),
            message: e.to_string(),
        })?
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let owned_key = key.to_string();
        self.with_conn(key, move |conn| {
            let result = conn.query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![owned_key],
                |row| row.get::<_, String>(0),
            );
            match result {
                Ok(v) => Ok(Some(v)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(StoreError::ReadFailed {
                    key: owned_key,
                    message: e.to_string(),
                }),
            }
        })
        .await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let owned_key = key.to_string();
        self.with_conn(key, move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                params![owned_key, value],
            )
            .map_err(|e| StoreError::WriteFailed {
                key: owned_key,
                message: e.to_string(),
            })?;
            Ok(())
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let owned_key = key.to_string();
        self.with_conn(key, move |conn| {
            conn.execute("DELETE FROM kv WHERE key = ?1", params![owned_key])
                .map_err(|e| StoreError::WriteFailed {
                    key: owned_key,
                    message: e.to_string(),
                })?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn kv_store() {
        let db = SqliteStore::open_memory().unwrap();
        assert!(db.get("test").await.unwrap().is_none());
        db.set("test", "hello".into()).await.unwrap();
        assert_eq!(db.get("test").await.unwrap().unwrap(), "hello");
    }

    #[tokio::test]
    async fn set_overwrites_and_remove_deletes() {
        let db = SqliteStore::open_memory().unwrap();
        db.set("k", "one".into()).await.unwrap();
        db.set("k", "two".into()).await.unwrap();
        assert_eq!(db.get("k").await.unwrap().as_deref(), Some("two"));

        db.remove("k").await.unwrap();
        assert!(db.get("k").await.unwrap().is_none());
        // Removing a missing key is not an error.
        db.remove("k").await.unwrap();
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("focustimer.db");
        {
            let db = SqliteStore::open_at(&path).unwrap();
            db.set("@focus_sessions", "[]".into()).await.unwrap();
        }
        let db = SqliteStore::open_at(&path).unwrap();
        assert_eq!(db.get("@focus_sessions").await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_writers_share_one_connection() {
        let db = Arc::new(SqliteStore::open_memory().unwrap());
        let writers: Vec<_> = (0..8)
            .map(|i| {
                let db = Arc::clone(&db);
                tokio::spawn(async move { db.set(&format!("k{i}"), i.to_string()).await })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }
        for i in 0..8 {
            assert_eq!(db.get(&format!("k{i}")).await.unwrap(), Some(i.to_string()));
        }
    }
}
