//! Sync log storage contract and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::entry::{ErrorDetail, LogId, LogStatistics, LogStatus, SyncLogEntry};

#[derive(Debug, Clone, thiserror::Error)]
pub enum LogStoreError {
    #[error("log entry not found: {0}")]
    NotFound(LogId),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persistence for sync log entries.
///
/// `update_progress` is called after every processed item; implementations
/// must persist counters immediately so state survives a crash between calls.
#[async_trait]
pub trait SyncLogStore: Send + Sync {
    async fn insert(&self, entry: &SyncLogEntry) -> Result<(), LogStoreError>;

    /// Persist current counters and error details for an in-flight run.
    async fn update_progress(
        &self,
        id: LogId,
        created: u64,
        updated: u64,
        details: &[ErrorDetail],
    ) -> Result<(), LogStoreError>;

    /// Persist final counters and transition to a terminal status.
    ///
    /// A no-op when the entry is already terminal; terminal states are never
    /// re-opened.
    async fn finalize(
        &self,
        id: LogId,
        status: LogStatus,
        created: u64,
        updated: u64,
        details: &[ErrorDetail],
    ) -> Result<(), LogStoreError>;

    async fn get(&self, id: LogId) -> Result<Option<SyncLogEntry>, LogStoreError>;

    /// The most recently started entry.
    async fn latest(&self) -> Result<Option<SyncLogEntry>, LogStoreError>;

    /// Page through entries ordered by start time descending. Pages are
    /// 1-indexed.
    async fn list(&self, page: usize, per_page: usize) -> Result<Vec<SyncLogEntry>, LogStoreError>;

    async fn count(&self) -> Result<u64, LogStoreError>;

    /// Delete one entry; returns whether it existed.
    async fn delete(&self, id: LogId) -> Result<bool, LogStoreError>;

    /// Delete all entries; returns the number removed.
    async fn delete_all(&self) -> Result<u64, LogStoreError>;

    /// Retention cleanup: delete entries older than `days` days.
    async fn cleanup_older_than(&self, days: u32) -> Result<u64, LogStoreError>;

    /// Aggregate statistics over the trailing `days` days.
    async fn statistics(&self, days: u32) -> Result<LogStatistics, LogStoreError>;
}

/// In-memory log store for tests and development.
#[derive(Debug, Default)]
pub struct InMemorySyncLogStore {
    entries: RwLock<HashMap<LogId, SyncLogEntry>>,
}

impl InMemorySyncLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn sorted_desc(&self) -> Vec<SyncLogEntry> {
        let mut entries: Vec<_> = self
            .entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();
        // UUIDv7 ids tiebreak equal timestamps deterministically.
        entries.sort_by(|a, b| {
            b.started_at
                .cmp(&a.started_at)
                .then_with(|| b.id.0.cmp(&a.id.0))
        });
        entries
    }
}

#[async_trait]
impl SyncLogStore for InMemorySyncLogStore {
    async fn insert(&self, entry: &SyncLogEntry) -> Result<(), LogStoreError> {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(entry.id, entry.clone());
        Ok(())
    }

    async fn update_progress(
        &self,
        id: LogId,
        created: u64,
        updated: u64,
        details: &[ErrorDetail],
    ) -> Result<(), LogStoreError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let entry = entries.get_mut(&id).ok_or(LogStoreError::NotFound(id))?;
        entry.created_count = created;
        entry.updated_count = updated;
        entry.error_count = details.len() as u64;
        entry.error_details = details.to_vec();
        Ok(())
    }

    async fn finalize(
        &self,
        id: LogId,
        status: LogStatus,
        created: u64,
        updated: u64,
        details: &[ErrorDetail],
    ) -> Result<(), LogStoreError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let entry = entries.get_mut(&id).ok_or(LogStoreError::NotFound(id))?;

        if entry.status.is_terminal() {
            tracing::warn!(log_id = %id, status = %entry.status, "finalize on terminal entry ignored");
            return Ok(());
        }

        entry.created_count = created;
        entry.updated_count = updated;
        entry.error_count = details.len() as u64;
        entry.error_details = details.to_vec();
        entry.status = status;
        Ok(())
    }

    async fn get(&self, id: LogId) -> Result<Option<SyncLogEntry>, LogStoreError> {
        Ok(self
            .entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id)
            .cloned())
    }

    async fn latest(&self) -> Result<Option<SyncLogEntry>, LogStoreError> {
        Ok(self.sorted_desc().into_iter().next())
    }

    async fn list(&self, page: usize, per_page: usize) -> Result<Vec<SyncLogEntry>, LogStoreError> {
        let offset = page.saturating_sub(1) * per_page;
        Ok(self
            .sorted_desc()
            .into_iter()
            .skip(offset)
            .take(per_page)
            .collect())
    }

    async fn count(&self) -> Result<u64, LogStoreError> {
        Ok(self.entries.read().unwrap_or_else(|e| e.into_inner()).len() as u64)
    }

    async fn delete(&self, id: LogId) -> Result<bool, LogStoreError> {
        Ok(self
            .entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id)
            .is_some())
    }

    async fn delete_all(&self) -> Result<u64, LogStoreError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let removed = entries.len() as u64;
        entries.clear();
        Ok(removed)
    }

    async fn cleanup_older_than(&self, days: u32) -> Result<u64, LogStoreError> {
        let cutoff = Utc::now() - Duration::days(days as i64);
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| entry.started_at >= cutoff);
        Ok((before - entries.len()) as u64)
    }

    async fn statistics(&self, days: u32) -> Result<LogStatistics, LogStoreError> {
        let cutoff = Utc::now() - Duration::days(days as i64);
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());

        let mut stats = LogStatistics::default();
        for entry in entries.values().filter(|e| e.started_at >= cutoff) {
            stats.total_runs += 1;
            stats.total_created += entry.created_count;
            stats.total_updated += entry.updated_count;
            stats.total_errors += entry.error_count;
            match entry.status {
                LogStatus::Completed => stats.completed_runs += 1,
                LogStatus::Failed => stats.failed_runs += 1,
                _ => {}
            }
        }
        Ok(stats)
    }
}
