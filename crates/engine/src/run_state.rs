//! Per-run session state kept between chunk invocations.

use core::str::FromStr;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use catsync_core::SyncCandidate;
use catsync_synclog::LogId;

/// Identifier of one sync run session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Uses UUIDv7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for RunId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// Snapshot of an in-flight run: the candidate list captured at start plus
/// the last persisted cursor.
///
/// The caller resupplies the cursor on every advance; the stored one exists
/// for status reporting and expiry, not for slicing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    pub run_id: RunId,
    pub log_id: LogId,
    pub candidates: Vec<SyncCandidate>,
    pub cursor: usize,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl RunState {
    pub fn new(run_id: RunId, log_id: LogId, candidates: Vec<SyncCandidate>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            log_id,
            candidates,
            cursor: 0,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn total(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum RunStateError {
    #[error("run not found: {0}")]
    NotFound(RunId),
    #[error("run state storage error: {0}")]
    Storage(String),
}

/// Keyed storage for run sessions.
#[async_trait]
pub trait RunStateStore: Send + Sync {
    async fn put(&self, state: RunState) -> Result<(), RunStateError>;

    async fn get(&self, run_id: RunId) -> Result<Option<RunState>, RunStateError>;

    /// Persist the cursor reached after a completed chunk.
    async fn advance_cursor(&self, run_id: RunId, cursor: usize) -> Result<(), RunStateError>;

    async fn remove(&self, run_id: RunId) -> Result<(), RunStateError>;

    /// Drop every session (used by cancel).
    async fn clear(&self) -> Result<(), RunStateError>;
}

/// In-memory session store.
#[derive(Debug, Default)]
pub struct InMemoryRunStateStore {
    runs: RwLock<HashMap<RunId, RunState>>,
}

impl InMemoryRunStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl RunStateStore for InMemoryRunStateStore {
    async fn put(&self, state: RunState) -> Result<(), RunStateError> {
        self.runs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(state.run_id, state);
        Ok(())
    }

    async fn get(&self, run_id: RunId) -> Result<Option<RunState>, RunStateError> {
        Ok(self
            .runs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&run_id)
            .cloned())
    }

    async fn advance_cursor(&self, run_id: RunId, cursor: usize) -> Result<(), RunStateError> {
        let mut runs = self.runs.write().unwrap_or_else(|e| e.into_inner());
        let state = runs.get_mut(&run_id).ok_or(RunStateError::NotFound(run_id))?;
        state.cursor = cursor;
        Ok(())
    }

    async fn remove(&self, run_id: RunId) -> Result<(), RunStateError> {
        self.runs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&run_id);
        Ok(())
    }

    async fn clear(&self) -> Result<(), RunStateError> {
        self.runs.write().unwrap_or_else(|e| e.into_inner()).clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(ttl: Duration) -> RunState {
        RunState::new(RunId::new(), LogId::new(), Vec::new(), ttl)
    }

    #[tokio::test]
    async fn put_get_advance_remove() {
        let store = InMemoryRunStateStore::new();
        let run = state(Duration::hours(1));
        let id = run.run_id;
        store.put(run).await.unwrap();

        store.advance_cursor(id, 40).await.unwrap();
        let stored = store.get(id).await.unwrap().unwrap();
        assert_eq!(stored.cursor, 40);
        assert!(!stored.is_expired());

        store.remove(id).await.unwrap();
        assert!(store.get(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn advancing_a_missing_run_fails() {
        let store = InMemoryRunStateStore::new();
        assert!(matches!(
            store.advance_cursor(RunId::new(), 1).await.unwrap_err(),
            RunStateError::NotFound(_)
        ));
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        assert!(state(Duration::zero()).is_expired());
        assert!(!state(Duration::hours(1)).is_expired());
    }
}
