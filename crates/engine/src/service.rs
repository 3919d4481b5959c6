//! Batch-resumable sync orchestration.
//!
//! A run is driven by the caller: `start` captures the candidate list and
//! returns ids, then repeated `advance` calls process one chunk each until
//! `complete`. The caller resupplies run id, log id and cursor on every
//! advance, so the driving side can be stateless between invocations.

use std::sync::{Arc, Mutex};

use chrono::Duration;

use catsync_catalog::{ItemOutcome, Reconciler};
use catsync_client::CandidateSource;
use catsync_core::RunType;
use catsync_synclog::{LogId, LogStatus, LogStoreError, SyncLogger};

use crate::flag::RunFlag;
use crate::report::{ChunkReport, EngineError, Progress, RunSummary, StartReport, StatusReport};
use crate::run_state::{RunId, RunState, RunStateStore};

pub const DEFAULT_BATCH_SIZE: usize = 20;
const DEFAULT_RUN_TTL_HOURS: i64 = 1;

pub struct SyncService {
    source: Arc<dyn CandidateSource>,
    reconciler: Reconciler,
    logger: SyncLogger,
    runs: Arc<dyn RunStateStore>,
    flag: RunFlag,
    progress: Mutex<Option<Progress>>,
    batch_size: usize,
    run_ttl: Duration,
}

/// The slice of the candidate list one advance covers.
fn chunk_span(cursor: usize, batch_size: usize, total: usize) -> core::ops::Range<usize> {
    let start = cursor.min(total);
    start..start.saturating_add(batch_size).min(total)
}

impl SyncService {
    pub fn new(
        source: Arc<dyn CandidateSource>,
        reconciler: Reconciler,
        logger: SyncLogger,
        runs: Arc<dyn RunStateStore>,
    ) -> Self {
        Self {
            source,
            reconciler,
            logger,
            runs,
            flag: RunFlag::new(),
            progress: Mutex::new(None),
            batch_size: DEFAULT_BATCH_SIZE,
            run_ttl: Duration::hours(DEFAULT_RUN_TTL_HOURS),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_run_ttl(mut self, ttl: Duration) -> Self {
        self.run_ttl = ttl;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn is_running(&self) -> bool {
        self.flag.is_active()
    }

    /// Begin a new run: claim the run slot, snapshot the candidate list and
    /// open a log entry. Nothing is persisted when the list is empty.
    pub async fn start(&self, run_type: RunType) -> Result<StartReport, EngineError> {
        if !self.flag.try_acquire() {
            return Err(EngineError::AlreadyRunning);
        }

        let candidates = match self.source.fetch_candidates().await {
            Ok(candidates) => candidates,
            Err(e) => {
                self.flag.release();
                return Err(e.into());
            }
        };
        if candidates.is_empty() {
            self.flag.release();
            return Err(EngineError::NothingToSync);
        }

        let log_id = match self.logger.start(run_type).await {
            Ok(id) => id,
            Err(e) => {
                self.flag.release();
                return Err(EngineError::Fatal(e.to_string()));
            }
        };

        let run_id = RunId::new();
        let total = candidates.len();
        let state = RunState::new(run_id, log_id, candidates, self.run_ttl);
        if let Err(e) = self.runs.put(state).await {
            let _ = self.logger.mark_failed(e.to_string()).await;
            self.flag.release();
            return Err(EngineError::Fatal(e.to_string()));
        }

        self.set_progress(Some(Progress::empty(total)));
        tracing::info!(%run_id, %log_id, total, run_type = %run_type, "sync run started");

        Ok(StartReport {
            run_id,
            log_id,
            total,
            batch_size: self.batch_size,
            message: format!("Starting sync of {total} products"),
        })
    }

    /// Process one chunk from the caller-supplied cursor.
    ///
    /// Per-item errors are recorded and never abort the chunk; only a log
    /// persistence failure is fatal, tearing the run down with a truthful
    /// `failed` entry.
    pub async fn advance(
        &self,
        run_id: RunId,
        log_id: LogId,
        cursor: usize,
    ) -> Result<ChunkReport, EngineError> {
        // Revalidate the session before any work; cancel or expiry may have
        // landed between two advances.
        let state = match self.runs.get(run_id).await {
            Ok(state) => state,
            Err(e) => return Err(EngineError::Fatal(e.to_string())),
        };
        // Ids that do not name a stored session together are rejected with
        // no teardown: a stale or garbled advance must not be able to touch
        // a different run's log, progress or flag.
        let Some(state) = state.filter(|s| s.log_id == log_id) else {
            tracing::warn!(%run_id, %log_id, "advance for unknown run session");
            return Err(EngineError::SessionExpired);
        };
        if state.is_expired() {
            self.expire_run(&state).await;
            return Err(EngineError::SessionExpired);
        }

        if let Err(e) = self.logger.attach(log_id).await {
            return match e {
                // The log row vanished under a live session; close it out.
                LogStoreError::NotFound(_) => {
                    self.expire_run(&state).await;
                    Err(EngineError::SessionExpired)
                }
                other => Err(self.fail_run(run_id, other.to_string()).await),
            };
        }

        let total = state.total();
        let span = chunk_span(cursor, self.batch_size, total);
        let end = span.end;
        let mut chunk_errors = Vec::new();

        for candidate in &state.candidates[span] {
            let outcome = self.reconciler.reconcile(candidate).await;
            if let Err(e) = self.record(&outcome, &mut chunk_errors).await {
                return Err(self.fail_run(run_id, e.to_string()).await);
            }
        }

        let (created, updated, errors) = self.logger.counters().await.unwrap_or((0, 0, 0));
        self.set_progress(Some(Progress {
            created,
            updated,
            errors,
            processed: end,
            total,
        }));

        if end >= total {
            let status = if errors == 0 {
                LogStatus::Completed
            } else {
                LogStatus::Partial
            };
            if let Err(e) = self.logger.complete(status).await {
                return Err(self.fail_run(run_id, e.to_string()).await);
            }
            let _ = self.runs.remove(run_id).await;
            self.set_progress(None);
            self.flag.release();
            tracing::info!(%run_id, %log_id, created, updated, errors, status = %status, "sync run finished");

            return Ok(ChunkReport {
                processed: end,
                total,
                created,
                updated,
                errors: chunk_errors,
                complete: true,
                message: format!(
                    "Sync complete: {created} created, {updated} updated, {errors} errors"
                ),
            });
        }

        if let Err(e) = self.runs.advance_cursor(run_id, end).await {
            return Err(self.fail_run(run_id, e.to_string()).await);
        }

        Ok(ChunkReport {
            processed: end,
            total,
            created,
            updated,
            errors: chunk_errors,
            complete: false,
            message: format!("Processed {end} of {total} products..."),
        })
    }

    /// Live counters while a run is active, otherwise the latest log entry.
    pub async fn status(&self) -> Result<StatusReport, EngineError> {
        if self.flag.is_active()
            && let Some(progress) = self.current_progress()
        {
            return Ok(StatusReport::Running { progress });
        }

        let latest = self
            .logger
            .latest()
            .await
            .map_err(|e| EngineError::Fatal(e.to_string()))?;
        Ok(StatusReport::Idle { latest })
    }

    /// Abort the active run, if any. Idempotent; returns whether a run was
    /// active. The attached log entry is finalized as `cancelled`. A
    /// `log_id` that does not name the active run's log is stale and leaves
    /// the run untouched.
    pub async fn cancel(&self, log_id: Option<LogId>) -> Result<bool, EngineError> {
        if let Some(requested) = log_id
            && self.logger.current_id().await != Some(requested)
        {
            tracing::warn!(%requested, "ignoring cancel for a stale log id");
            return Ok(false);
        }

        let was_active = self.flag.is_active();
        self.logger
            .complete(LogStatus::Cancelled)
            .await
            .map_err(|e| EngineError::Fatal(e.to_string()))?;
        self.runs
            .clear()
            .await
            .map_err(|e| EngineError::Fatal(e.to_string()))?;
        self.set_progress(None);
        self.flag.release();

        if was_active {
            tracing::info!("sync run cancelled");
        }
        Ok(was_active)
    }

    /// Close a run as failed after the driving side observed a failure the
    /// engine itself never saw (e.g. a dropped connection mid-chunk). The
    /// ids must name a stored session; a late report carrying ids from an
    /// earlier run is rejected without touching the active one.
    pub async fn record_external_failure(
        &self,
        run_id: RunId,
        log_id: LogId,
        message: impl Into<String>,
    ) -> Result<(), EngineError> {
        let state = self
            .runs
            .get(run_id)
            .await
            .map_err(|e| EngineError::Fatal(e.to_string()))?;
        let Some(state) = state.filter(|s| s.log_id == log_id) else {
            tracing::warn!(%run_id, %log_id, "ignoring failure report for unknown run session");
            return Err(EngineError::SessionExpired);
        };

        if self.logger.current_id().await != Some(state.log_id) {
            let _ = self.logger.attach(state.log_id).await;
        }
        let _ = self.fail_run(state.run_id, message.into()).await;
        Ok(())
    }

    /// Drive start and advance in a loop until the run finishes. Intended
    /// for scheduled and background runs with no remote driver.
    pub async fn run_to_completion(&self, run_type: RunType) -> Result<RunSummary, EngineError> {
        let start = self.start(run_type).await?;

        let mut cursor = 0;
        loop {
            let report = self.advance(start.run_id, start.log_id, cursor).await?;
            cursor = report.processed;
            if report.complete {
                break;
            }
        }

        let entry = self
            .logger
            .entry(start.log_id)
            .await
            .map_err(|e| EngineError::Fatal(e.to_string()))?
            .ok_or_else(|| {
                EngineError::Fatal(format!("log entry {} missing after run", start.log_id))
            })?;

        Ok(RunSummary {
            run_id: start.run_id,
            log_id: start.log_id,
            created: entry.created_count,
            updated: entry.updated_count,
            errors: entry.error_count,
            status: entry.status,
        })
    }

    async fn record(
        &self,
        outcome: &ItemOutcome,
        chunk_errors: &mut Vec<String>,
    ) -> Result<(), LogStoreError> {
        match outcome {
            ItemOutcome::Created {
                sku, image_error, ..
            } => {
                self.logger.record_created().await?;
                if let Some(err) = image_error {
                    let message = format!("image download failed for SKU {sku}: {err}");
                    self.logger
                        .record_error(message.clone(), Some(sku), Some("image_download"))
                        .await?;
                    chunk_errors.push(message);
                }
            }
            ItemOutcome::Updated { .. } => self.logger.record_updated().await?,
            ItemOutcome::Error { message, sku } => {
                self.logger
                    .record_error(message.clone(), sku.as_deref(), None)
                    .await?;
                chunk_errors.push(message.clone());
            }
        }
        Ok(())
    }

    /// Tear down after an unrecoverable failure: finalize the log as failed,
    /// drop the session and release the run slot.
    async fn fail_run(&self, run_id: RunId, message: String) -> EngineError {
        tracing::error!(%run_id, %message, "fatal sync failure, tearing down run");
        let _ = self.logger.mark_failed(message.clone()).await;
        let _ = self.runs.remove(run_id).await;
        self.set_progress(None);
        self.flag.release();
        EngineError::Fatal(message)
    }

    /// Tear down a validated stored session whose run can no longer
    /// continue. Callers must have matched the session's ids first.
    async fn expire_run(&self, state: &RunState) {
        tracing::warn!(run_id = %state.run_id, log_id = %state.log_id, "run session expired");
        if self.logger.current_id().await != Some(state.log_id) {
            let _ = self.logger.attach(state.log_id).await;
        }
        let _ = self.logger.mark_failed("sync session expired").await;
        let _ = self.runs.remove(state.run_id).await;
        self.set_progress(None);
        self.flag.release();
    }

    fn set_progress(&self, progress: Option<Progress>) {
        *self.progress.lock().unwrap_or_else(|e| e.into_inner()) = progress;
    }

    fn current_progress(&self) -> Option<Progress> {
        *self.progress.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use proptest::prelude::*;

    use catsync_catalog::{EntryStatus, InMemoryCatalog, StockStatus};
    use catsync_client::ClientError;
    use catsync_core::{CategoryId, SyncCandidate};
    use catsync_synclog::{
        ErrorDetail, InMemorySyncLogStore, LogStatistics, SyncLogEntry, SyncLogStore,
    };

    use crate::run_state::InMemoryRunStateStore;

    use super::*;

    struct FixtureSource(Vec<SyncCandidate>);

    #[async_trait]
    impl CandidateSource for FixtureSource {
        async fn fetch_candidates(&self) -> Result<Vec<SyncCandidate>, ClientError> {
            Ok(self.0.clone())
        }
    }

    fn candidate(source_id: &str, name: &str, price: f64, stock: i64) -> SyncCandidate {
        SyncCandidate {
            source_id: source_id.to_string(),
            name: name.to_string(),
            price,
            stock_quantity: stock,
            stock_managed: true,
            image_urls: vec![],
            destination_category_id: Some(CategoryId(7)),
        }
    }

    fn candidates(n: usize) -> Vec<SyncCandidate> {
        (0..n)
            .map(|i| candidate(&format!("SKU{i}"), &format!("Item {i}"), 10.0 + i as f64, i as i64))
            .collect()
    }

    fn service_with(
        candidates: Vec<SyncCandidate>,
        batch_size: usize,
    ) -> (SyncService, Arc<InMemoryCatalog>, Arc<InMemorySyncLogStore>) {
        let catalog = InMemoryCatalog::arc();
        let logs = InMemorySyncLogStore::arc();
        let service = SyncService::new(
            Arc::new(FixtureSource(candidates)),
            Reconciler::new(catalog.clone()),
            SyncLogger::new(logs.clone()),
            InMemoryRunStateStore::arc(),
        )
        .with_batch_size(batch_size);
        (service, catalog, logs)
    }

    #[tokio::test]
    async fn single_chunk_run_completes() {
        let (service, catalog, logs) = service_with(candidates(3), 10);

        let start = service.start(RunType::Manual).await.unwrap();
        assert_eq!(start.total, 3);
        assert!(service.is_running());

        let report = service.advance(start.run_id, start.log_id, 0).await.unwrap();
        assert!(report.complete);
        assert_eq!(report.created, 3);
        assert_eq!(report.updated, 0);
        assert!(report.errors.is_empty());
        assert_eq!(catalog.len(), 3);
        assert!(!service.is_running());

        let entry = logs.get(start.log_id).await.unwrap().unwrap();
        assert_eq!(entry.status, LogStatus::Completed);
        assert_eq!(entry.created_count, 3);
    }

    #[tokio::test]
    async fn chunked_run_matches_single_chunk_aggregate() {
        let (chunked, chunked_catalog, chunked_logs) = service_with(candidates(5), 2);
        let (single, single_catalog, single_logs) = service_with(candidates(5), 10);

        let start = chunked.start(RunType::Manual).await.unwrap();
        let mut cursor = 0;
        let mut boundaries = Vec::new();
        loop {
            let report = chunked.advance(start.run_id, start.log_id, cursor).await.unwrap();
            cursor = report.processed;
            boundaries.push(report.processed);
            if report.complete {
                break;
            }
            assert_eq!(report.message, format!("Processed {cursor} of 5 products..."));
        }
        assert_eq!(boundaries, vec![2, 4, 5]);

        let single_start = single.start(RunType::Manual).await.unwrap();
        single.advance(single_start.run_id, single_start.log_id, 0).await.unwrap();

        assert_eq!(chunked_catalog.len(), single_catalog.len());
        let chunked_entry = chunked_logs.get(start.log_id).await.unwrap().unwrap();
        let single_entry = single_logs.get(single_start.log_id).await.unwrap().unwrap();
        assert_eq!(chunked_entry.created_count, single_entry.created_count);
        assert_eq!(chunked_entry.updated_count, single_entry.updated_count);
        assert_eq!(chunked_entry.error_count, single_entry.error_count);
        assert_eq!(chunked_entry.status, single_entry.status);
    }

    #[tokio::test]
    async fn start_rejects_a_concurrent_run() {
        let (service, _catalog, _logs) = service_with(candidates(3), 1);

        service.start(RunType::Manual).await.unwrap();
        assert!(matches!(
            service.start(RunType::Manual).await.unwrap_err(),
            EngineError::AlreadyRunning
        ));

        assert!(service.cancel(None).await.unwrap());
        service.start(RunType::Manual).await.unwrap();
    }

    #[tokio::test]
    async fn empty_selection_leaves_no_trace() {
        let (service, catalog, logs) = service_with(vec![], 10);

        assert!(matches!(
            service.start(RunType::Manual).await.unwrap_err(),
            EngineError::NothingToSync
        ));
        assert!(!service.is_running());
        assert!(catalog.is_empty());
        assert_eq!(logs.count().await.unwrap(), 0);

        // The flag was released, so the rejection repeats instead of jamming.
        assert!(matches!(
            service.start(RunType::Manual).await.unwrap_err(),
            EngineError::NothingToSync
        ));
    }

    #[tokio::test]
    async fn expired_session_is_rejected_and_cleaned_up() {
        let (service, _catalog, logs) = {
            let (s, c, l) = service_with(candidates(3), 1);
            (s.with_run_ttl(Duration::zero()), c, l)
        };

        let start = service.start(RunType::Manual).await.unwrap();
        assert!(matches!(
            service.advance(start.run_id, start.log_id, 0).await.unwrap_err(),
            EngineError::SessionExpired
        ));
        assert!(!service.is_running());

        let entry = logs.get(start.log_id).await.unwrap().unwrap();
        assert_eq!(entry.status, LogStatus::Failed);
        assert!(entry.error_details[0].message.contains("session expired"));
    }

    #[tokio::test]
    async fn cancel_finalizes_the_log_and_is_idempotent() {
        let (service, _catalog, logs) = service_with(candidates(3), 1);

        let start = service.start(RunType::Manual).await.unwrap();
        assert!(service.cancel(Some(start.log_id)).await.unwrap());
        assert!(!service.is_running());

        let entry = logs.get(start.log_id).await.unwrap().unwrap();
        assert_eq!(entry.status, LogStatus::Cancelled);

        // Second cancel finds nothing active.
        assert!(!service.cancel(None).await.unwrap());

        // The discarded session cannot be advanced.
        assert!(matches!(
            service.advance(start.run_id, start.log_id, 0).await.unwrap_err(),
            EngineError::SessionExpired
        ));
    }

    /// Log store whose progress writes start failing after a set number of
    /// successful calls. Finalize keeps working, as a real database usually
    /// would for one last write.
    struct FailingLogStore {
        inner: InMemorySyncLogStore,
        allowed_writes: usize,
        writes: AtomicUsize,
    }

    impl FailingLogStore {
        fn new(allowed_writes: usize) -> Self {
            Self {
                inner: InMemorySyncLogStore::new(),
                allowed_writes,
                writes: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SyncLogStore for FailingLogStore {
        async fn insert(&self, entry: &SyncLogEntry) -> Result<(), LogStoreError> {
            self.inner.insert(entry).await
        }

        async fn update_progress(
            &self,
            id: catsync_synclog::LogId,
            created: u64,
            updated: u64,
            details: &[ErrorDetail],
        ) -> Result<(), LogStoreError> {
            if self.writes.fetch_add(1, Ordering::SeqCst) >= self.allowed_writes {
                return Err(LogStoreError::Storage("log write failed".to_string()));
            }
            self.inner.update_progress(id, created, updated, details).await
        }

        async fn finalize(
            &self,
            id: catsync_synclog::LogId,
            status: LogStatus,
            created: u64,
            updated: u64,
            details: &[ErrorDetail],
        ) -> Result<(), LogStoreError> {
            self.inner.finalize(id, status, created, updated, details).await
        }

        async fn get(
            &self,
            id: catsync_synclog::LogId,
        ) -> Result<Option<SyncLogEntry>, LogStoreError> {
            self.inner.get(id).await
        }

        async fn latest(&self) -> Result<Option<SyncLogEntry>, LogStoreError> {
            self.inner.latest().await
        }

        async fn list(
            &self,
            page: usize,
            per_page: usize,
        ) -> Result<Vec<SyncLogEntry>, LogStoreError> {
            self.inner.list(page, per_page).await
        }

        async fn count(&self) -> Result<u64, LogStoreError> {
            self.inner.count().await
        }

        async fn delete(&self, id: catsync_synclog::LogId) -> Result<bool, LogStoreError> {
            self.inner.delete(id).await
        }

        async fn delete_all(&self) -> Result<u64, LogStoreError> {
            self.inner.delete_all().await
        }

        async fn cleanup_older_than(&self, days: u32) -> Result<u64, LogStoreError> {
            self.inner.cleanup_older_than(days).await
        }

        async fn statistics(&self, days: u32) -> Result<LogStatistics, LogStoreError> {
            self.inner.statistics(days).await
        }
    }

    #[tokio::test]
    async fn fatal_log_failure_leaves_a_truthful_failed_entry() {
        let catalog = InMemoryCatalog::arc();
        let logs = Arc::new(FailingLogStore::new(3));
        let service = SyncService::new(
            Arc::new(FixtureSource(candidates(5))),
            Reconciler::new(catalog.clone()),
            SyncLogger::new(logs.clone()),
            InMemoryRunStateStore::arc(),
        )
        .with_batch_size(10);

        let start = service.start(RunType::Manual).await.unwrap();
        let err = service.advance(start.run_id, start.log_id, 0).await.unwrap_err();
        assert!(err.is_fatal());
        assert!(!service.is_running());

        let entry = logs.get(start.log_id).await.unwrap().unwrap();
        assert_eq!(entry.status, LogStatus::Failed);
        // The counters match what actually reached the catalog.
        assert_eq!(entry.created_count, catalog.len() as u64);
        assert_eq!(entry.updated_count, 0);
        let fatal = entry.error_details.last().unwrap();
        assert_eq!(fatal.context.as_deref(), Some("fatal_error"));
        assert!(fatal.message.contains("log write failed"));

        // The slot is free for a fresh run.
        service.start(RunType::Manual).await.unwrap();
    }

    #[tokio::test]
    async fn resync_is_idempotent() {
        let catalog = InMemoryCatalog::arc();
        let logs = InMemorySyncLogStore::arc();
        let build = || {
            SyncService::new(
                Arc::new(FixtureSource(candidates(3))),
                Reconciler::new(catalog.clone()),
                SyncLogger::new(logs.clone()),
                InMemoryRunStateStore::arc(),
            )
            .with_batch_size(2)
        };

        let first = build().run_to_completion(RunType::Scheduled).await.unwrap();
        assert_eq!(first.created, 3);
        assert_eq!(first.updated, 0);
        assert_eq!(first.status, LogStatus::Completed);

        let second = build().run_to_completion(RunType::Scheduled).await.unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.updated, 3);
        assert_eq!(second.status, LogStatus::Completed);
        assert_eq!(catalog.len(), 3);
    }

    #[tokio::test]
    async fn local_curation_survives_a_resync() {
        let catalog = InMemoryCatalog::arc();
        let logs = InMemorySyncLogStore::arc();
        let build = |feed: SyncCandidate| {
            SyncService::new(
                Arc::new(FixtureSource(vec![feed])),
                Reconciler::new(catalog.clone()),
                SyncLogger::new(logs.clone()),
                InMemoryRunStateStore::arc(),
            )
        };

        build(candidate("SKU1", "Speakers", 100.0, 5))
            .run_to_completion(RunType::Manual)
            .await
            .unwrap();

        let mut entry = catalog.get_by_sku("SKU1").unwrap();
        assert_eq!(entry.status, EntryStatus::Draft);
        entry.name = "Premium Speakers".to_string();
        entry.status = EntryStatus::Published;
        catalog.put(entry);

        let summary = build(candidate("SKU1", "Speakers", 90.0, 0))
            .run_to_completion(RunType::Manual)
            .await
            .unwrap();
        assert_eq!(summary.updated, 1);

        let entry = catalog.get_by_sku("SKU1").unwrap();
        assert_eq!(entry.name, "Premium Speakers");
        assert_eq!(entry.status, EntryStatus::Published);
        assert_eq!(entry.regular_price, 90.0);
        assert_eq!(entry.stock_status, Some(StockStatus::OutOfStock));
    }

    #[tokio::test]
    async fn per_item_errors_finish_the_run_as_partial() {
        let mut feed = candidates(3);
        feed[1].source_id = "   ".to_string();
        let (service, catalog, _logs) = service_with(feed, 10);

        let summary = service.run_to_completion(RunType::Manual).await.unwrap();
        assert_eq!(summary.created, 2);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.status, LogStatus::Partial);
        assert_eq!(catalog.len(), 2);
    }

    #[tokio::test]
    async fn external_failure_closes_the_run() {
        let (service, _catalog, logs) = service_with(candidates(3), 1);

        let start = service.start(RunType::Manual).await.unwrap();
        service
            .record_external_failure(start.run_id, start.log_id, "server error 500")
            .await
            .unwrap();
        assert!(!service.is_running());

        let entry = logs.get(start.log_id).await.unwrap().unwrap();
        assert_eq!(entry.status, LogStatus::Failed);
        assert!(entry.error_details[0].message.contains("server error 500"));
    }

    #[tokio::test]
    async fn stale_advance_leaves_the_active_run_untouched() {
        let (service, _catalog, logs) = service_with(candidates(2), 1);

        let start = service.start(RunType::Manual).await.unwrap();

        // Ids from nowhere: rejected without tearing down the live run.
        assert!(matches!(
            service.advance(RunId::new(), LogId::new(), 0).await.unwrap_err(),
            EngineError::SessionExpired
        ));
        assert!(service.is_running());
        let entry = logs.get(start.log_id).await.unwrap().unwrap();
        assert_eq!(entry.status, LogStatus::InProgress);
        assert!(matches!(
            service.start(RunType::Manual).await.unwrap_err(),
            EngineError::AlreadyRunning
        ));

        // A real run id with someone else's log id is just as stale.
        assert!(matches!(
            service.advance(start.run_id, LogId::new(), 0).await.unwrap_err(),
            EngineError::SessionExpired
        ));
        assert!(service.is_running());

        // The genuine session still advances normally.
        let report = service.advance(start.run_id, start.log_id, 0).await.unwrap();
        assert_eq!(report.processed, 1);
        assert!(!report.complete);
    }

    #[tokio::test]
    async fn stale_cancel_and_failure_report_are_rejected() {
        let (service, _catalog, logs) = service_with(candidates(2), 1);

        let start = service.start(RunType::Manual).await.unwrap();

        // A cancel quoting an unrelated log id is a no-op.
        assert!(!service.cancel(Some(LogId::new())).await.unwrap());
        assert!(service.is_running());

        // Failure reports with ids that name no stored session bounce off.
        assert!(matches!(
            service
                .record_external_failure(RunId::new(), LogId::new(), "late failure")
                .await
                .unwrap_err(),
            EngineError::SessionExpired
        ));
        assert!(matches!(
            service
                .record_external_failure(start.run_id, LogId::new(), "late failure")
                .await
                .unwrap_err(),
            EngineError::SessionExpired
        ));
        assert!(service.is_running());
        let entry = logs.get(start.log_id).await.unwrap().unwrap();
        assert_eq!(entry.status, LogStatus::InProgress);

        // The matching log id still cancels the run.
        assert!(service.cancel(Some(start.log_id)).await.unwrap());
        assert!(!service.is_running());
    }

    #[tokio::test]
    async fn status_tracks_live_progress_then_latest_entry() {
        let (service, _catalog, _logs) = service_with(candidates(5), 2);

        let start = service.start(RunType::Manual).await.unwrap();
        let StatusReport::Running { progress } = service.status().await.unwrap() else {
            panic!("expected running status");
        };
        assert_eq!(progress, Progress::empty(5));

        service.advance(start.run_id, start.log_id, 0).await.unwrap();
        let StatusReport::Running { progress } = service.status().await.unwrap() else {
            panic!("expected running status");
        };
        assert_eq!(progress.processed, 2);
        assert_eq!(progress.created, 2);

        let mut cursor = 2;
        loop {
            let report = service.advance(start.run_id, start.log_id, cursor).await.unwrap();
            cursor = report.processed;
            if report.complete {
                break;
            }
        }

        let StatusReport::Idle { latest } = service.status().await.unwrap() else {
            panic!("expected idle status");
        };
        assert_eq!(latest.unwrap().status, LogStatus::Completed);
    }

    proptest! {
        /// Walking chunk spans from zero partitions the list exactly, in
        /// order, for any batch size.
        #[test]
        fn chunk_spans_partition_the_candidate_list(total in 0usize..200, batch in 1usize..50) {
            let mut cursor = 0;
            let mut covered = Vec::new();
            loop {
                let span = chunk_span(cursor, batch, total);
                prop_assert!(span.len() <= batch);
                covered.extend(span.clone());
                cursor = span.end;
                if cursor >= total {
                    break;
                }
            }
            prop_assert_eq!(covered, (0..total).collect::<Vec<_>>());
        }
    }
}
