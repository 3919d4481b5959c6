//! Re-attachable logging facade over a `SyncLogStore`.

use std::sync::Arc;

use tokio::sync::Mutex;

use catsync_core::RunType;

use crate::entry::{ErrorDetail, LogId, LogStatus, SyncLogEntry};
use crate::store::{LogStoreError, SyncLogStore};

#[derive(Debug, Clone)]
struct ActiveLog {
    id: LogId,
    created: u64,
    updated: u64,
    details: Vec<ErrorDetail>,
}

/// Stateful writer for the current run's log entry.
///
/// Every `record_*` call persists the updated counters immediately. The
/// logger can be re-attached to an existing entry by id, so a new invocation
/// resuming a run continues appending to the same row instead of starting
/// fresh. Recording without an attached entry is a silent no-op, mirroring
/// the write path's tolerance for out-of-run errors.
pub struct SyncLogger {
    store: Arc<dyn SyncLogStore>,
    active: Mutex<Option<ActiveLog>>,
}

impl SyncLogger {
    pub fn new(store: Arc<dyn SyncLogStore>) -> Self {
        Self {
            store,
            active: Mutex::new(None),
        }
    }

    /// Start a fresh `in_progress` entry and attach to it.
    pub async fn start(&self, run_type: RunType) -> Result<LogId, LogStoreError> {
        let entry = SyncLogEntry::new(run_type);
        self.store.insert(&entry).await?;

        let mut active = self.active.lock().await;
        *active = Some(ActiveLog {
            id: entry.id,
            created: 0,
            updated: 0,
            details: Vec::new(),
        });
        Ok(entry.id)
    }

    /// Re-attach to an existing entry, reloading its counters from storage.
    pub async fn attach(&self, id: LogId) -> Result<(), LogStoreError> {
        let entry = self
            .store
            .get(id)
            .await?
            .ok_or(LogStoreError::NotFound(id))?;

        let mut active = self.active.lock().await;
        *active = Some(ActiveLog {
            id: entry.id,
            created: entry.created_count,
            updated: entry.updated_count,
            details: entry.error_details,
        });
        Ok(())
    }

    /// The id of the currently attached entry, if any.
    pub async fn current_id(&self) -> Option<LogId> {
        self.active.lock().await.as_ref().map(|a| a.id)
    }

    /// Whether the attached entry has recorded any errors.
    pub async fn has_errors(&self) -> bool {
        self.active
            .lock()
            .await
            .as_ref()
            .is_some_and(|a| !a.details.is_empty())
    }

    /// Live counters of the attached entry: (created, updated, errors).
    pub async fn counters(&self) -> Option<(u64, u64, u64)> {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|a| (a.created, a.updated, a.details.len() as u64))
    }

    pub async fn record_created(&self) -> Result<(), LogStoreError> {
        let mut active = self.active.lock().await;
        let Some(active) = active.as_mut() else {
            return Ok(());
        };
        active.created += 1;
        self.store
            .update_progress(active.id, active.created, active.updated, &active.details)
            .await
    }

    pub async fn record_updated(&self) -> Result<(), LogStoreError> {
        let mut active = self.active.lock().await;
        let Some(active) = active.as_mut() else {
            return Ok(());
        };
        active.updated += 1;
        self.store
            .update_progress(active.id, active.created, active.updated, &active.details)
            .await
    }

    pub async fn record_error(
        &self,
        message: impl Into<String>,
        sku: Option<&str>,
        context: Option<&str>,
    ) -> Result<(), LogStoreError> {
        let mut active = self.active.lock().await;
        let Some(active) = active.as_mut() else {
            return Ok(());
        };

        let mut detail = ErrorDetail::new(message);
        if let Some(sku) = sku.filter(|s| !s.is_empty()) {
            detail = detail.with_sku(sku);
        }
        if let Some(context) = context.filter(|c| !c.is_empty()) {
            detail = detail.with_context(context);
        }
        active.details.push(detail);

        self.store
            .update_progress(active.id, active.created, active.updated, &active.details)
            .await
    }

    /// Finalize the attached entry and detach. No-op when nothing is attached,
    /// so repeated completion (e.g. an idempotent cancel) is safe.
    pub async fn complete(&self, status: LogStatus) -> Result<(), LogStoreError> {
        let mut active = self.active.lock().await;
        let Some(current) = active.take() else {
            return Ok(());
        };

        self.store
            .finalize(
                current.id,
                status,
                current.created,
                current.updated,
                &current.details,
            )
            .await
    }

    /// Record an unrecoverable batch-level failure and close the entry as
    /// `failed` in a single store write.
    pub async fn mark_failed(&self, message: impl Into<String>) -> Result<(), LogStoreError> {
        let mut active = self.active.lock().await;
        let Some(mut current) = active.take() else {
            return Ok(());
        };

        current
            .details
            .push(ErrorDetail::new(message).with_context("fatal_error"));

        self.store
            .finalize(
                current.id,
                LogStatus::Failed,
                current.created,
                current.updated,
                &current.details,
            )
            .await
    }

    /// The most recently started entry (for status reporting when idle).
    pub async fn latest(&self) -> Result<Option<SyncLogEntry>, LogStoreError> {
        self.store.latest().await
    }

    /// Fetch one entry from the store, attached or not.
    pub async fn entry(&self, id: LogId) -> Result<Option<SyncLogEntry>, LogStoreError> {
        self.store.get(id).await
    }
}
