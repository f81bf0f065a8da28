//! Session history persisted as one JSON array under [`SESSIONS_KEY`].
//!
//! Every mutation is a whole-list read-modify-write. Store failures never
//! reach the caller: they are logged and the operation degrades to an empty
//! list or a no-op.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

use super::KeyValueStore;
use crate::error::StoreError;

pub const SESSIONS_KEY: &str = "@focus_sessions";

/// One completed or manually ended focus interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Empty until the repository assigns one.
    #[serde(default)]
    pub id: String,
    pub date: DateTime<Utc>,
    /// Planned length in seconds.
    #[serde(default)]
    pub duration: u64,
    /// Seconds actually spent in focus. All reports use this.
    #[serde(default)]
    pub elapsed: u64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub distractions: u32,
}

impl Session {
    pub fn new(
        date: DateTime<Utc>,
        duration: u64,
        elapsed: u64,
        category: impl Into<String>,
        distractions: u32,
    ) -> Self {
        Self {
            id: String::new(),
            date,
            duration,
            elapsed,
            category: category.into(),
            distractions,
        }
    }

    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }
}

#[derive(Clone)]
pub struct SessionRepository {
    store: Arc<dyn KeyValueStore>,
}

impl SessionRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Append a session, assigning an id if it has none.
    ///
    /// Returns the stored record, or `None` if the store failed (logged).
    pub async fn save(&self, session: Session) -> Option<Session> {
        match self.try_save(session).await {
            Ok(saved) => Some(saved),
            Err(e) => {
                error!(error = %e, "failed to save session");
                None
            }
        }
    }

    /// All sessions in stored order. Empty if nothing was stored or the read failed.
    pub async fn list(&self) -> Vec<Session> {
        match self.load().await {
            Ok(sessions) => sessions,
            Err(e) => {
                error!(error = %e, "failed to fetch sessions");
                Vec::new()
            }
        }
    }

    /// Sessions newest first, the order the history view shows them in.
    pub async fn list_recent_first(&self) -> Vec<Session> {
        let mut sessions = self.list().await;
        sessions.sort_by(|a, b| b.date.cmp(&a.date));
        sessions
    }

    /// Remove the session with `id` and return what is left.
    ///
    /// An unknown id leaves the list unchanged. A store failure yields an
    /// empty list.
    pub async fn delete_by_id(&self, id: &str) -> Vec<Session> {
        match self.try_delete(id).await {
            Ok(sessions) => sessions,
            Err(e) => {
                error!(error = %e, id, "failed to delete session");
                Vec::new()
            }
        }
    }

    /// Drop the whole history.
    pub async fn clear(&self) {
        if let Err(e) = self.store.remove(SESSIONS_KEY).await {
            error!(error = %e, "failed to clear sessions");
        }
    }

    async fn try_save(&self, mut session: Session) -> Result<Session, StoreError> {
        let mut sessions = self.load().await?;
        if !session.has_id() {
            session.id = next_id(&sessions, Utc::now());
        }
        sessions.push(session.clone());
        self.persist(&sessions).await?;
        debug!(id = %session.id, elapsed = session.elapsed, "session saved");
        Ok(session)
    }

    async fn try_delete(&self, id: &str) -> Result<Vec<Session>, StoreError> {
        let sessions = self.load().await?;
        let before = sessions.len();
        let remaining: Vec<Session> = sessions.into_iter().filter(|s| s.id != id).collect();
        if remaining.len() != before {
            self.persist(&remaining).await?;
            debug!(id, "session deleted");
        }
        Ok(remaining)
    }

    async fn load(&self) -> Result<Vec<Session>, StoreError> {
        match self.store.get(SESSIONS_KEY).await? {
            Some(json) => serde_json::from_str(&json).map_err(|source| StoreError::Malformed {
                key: SESSIONS_KEY.into(),
                source,
            }),
            None => Ok(Vec::new()),
        }
    }

    async fn persist(&self, sessions: &[Session]) -> Result<(), StoreError> {
        let json = serde_json::to_string(sessions).map_err(|source| StoreError::Encode {
            key: SESSIONS_KEY.into(),
            source,
        })?;
        self.store.set(SESSIONS_KEY, json).await
    }
}

/// Millisecond timestamp, bumped past any id already in the list.
fn next_id(existing: &[Session], now: DateTime<Utc>) -> String {
    let mut candidate = now.timestamp_millis();
    loop {
        let id = candidate.to_string();
        if !existing.iter().any(|s| s.id == id) {
            return id;
        }
        candidate += 1;
    }
}
