//! Background tasks: scheduled full syncs and sync log retention.
//!
//! Both loops run on plain tokio intervals. The sync loop is off unless an
//! interval is configured; retention always runs, once per day.

use std::sync::Arc;
use std::time::Duration;

use catsync_core::RunType;
use catsync_engine::{EngineError, SyncService};
use catsync_synclog::SyncLogStore;

use crate::app::AppState;
use crate::config::ApiConfig;

const RETENTION_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Launch the background loops for the given state. Tasks run for the life
/// of the process; there is no shutdown handshake beyond runtime teardown.
pub fn spawn(state: Arc<AppState>, config: &ApiConfig) {
    let retention_days = config.log_retention_days;
    let retention_state = state.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(RETENTION_INTERVAL);
        loop {
            ticker.tick().await;
            retention_pass(retention_state.logs.as_ref(), retention_days).await;
        }
    });

    if let Some(minutes) = config.sync_interval_minutes {
        tracing::info!(minutes, "scheduled sync enabled");
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(minutes * 60));
            // The first tick fires immediately; a sync at boot would race
            // whatever the operator is doing, so skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                scheduled_sync_pass(&state.service).await;
            }
        });
    }
}

/// Delete finalized log entries older than the retention window.
pub async fn retention_pass(logs: &dyn SyncLogStore, days: u32) {
    match logs.cleanup_older_than(days).await {
        Ok(0) => {}
        Ok(removed) => tracing::info!(removed, days, "pruned old sync logs"),
        Err(e) => tracing::warn!(error = %e, "sync log retention pass failed"),
    }
}

/// Run one scheduled sync to completion. A run already in flight or an empty
/// selection is routine, not an error.
pub async fn scheduled_sync_pass(service: &SyncService) {
    match service.run_to_completion(RunType::Scheduled).await {
        Ok(summary) => tracing::info!(
            run_id = %summary.run_id,
            created = summary.created,
            updated = summary.updated,
            errors = summary.errors,
            status = %summary.status,
            "scheduled sync finished"
        ),
        Err(EngineError::AlreadyRunning) => {
            tracing::debug!("scheduled sync skipped, a run is already active")
        }
        Err(EngineError::NothingToSync) => {
            tracing::debug!("scheduled sync skipped, nothing selected")
        }
        Err(e) => tracing::warn!(error = %e, "scheduled sync failed"),
    }
}
