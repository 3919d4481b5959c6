//! Engine results and errors as seen by callers.

use serde::{Deserialize, Serialize};

use catsync_client::ClientError;
use catsync_synclog::{LogId, LogStatus, SyncLogEntry};

use crate::run_state::RunId;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("a sync is already running")]
    AlreadyRunning,
    #[error("no products selected for sync")]
    NothingToSync,
    #[error("sync session expired, please start a new sync")]
    SessionExpired,
    #[error(transparent)]
    Source(#[from] ClientError),
    /// Unrecoverable storage failure. When it strikes mid-chunk the run is
    /// torn down and its log finalized as failed.
    #[error("sync failed: {0}")]
    Fatal(String),
}

impl EngineError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::Fatal(_))
    }
}

/// Result of a successful `start`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartReport {
    pub run_id: RunId,
    pub log_id: LogId,
    pub total: usize,
    pub batch_size: usize,
    pub message: String,
}

/// Result of one `advance` chunk.
///
/// `created`/`updated` are run totals so far; `errors` holds only the
/// messages recorded during this chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkReport {
    pub processed: usize,
    pub total: usize,
    pub created: u64,
    pub updated: u64,
    pub errors: Vec<String>,
    pub complete: bool,
    pub message: String,
}

/// Live counters for an in-flight run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub created: u64,
    pub updated: u64,
    pub errors: u64,
    pub processed: usize,
    pub total: usize,
}

impl Progress {
    pub fn empty(total: usize) -> Self {
        Self {
            created: 0,
            updated: 0,
            errors: 0,
            processed: 0,
            total,
        }
    }
}

/// Answer to a status query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StatusReport {
    Running { progress: Progress },
    Idle { latest: Option<SyncLogEntry> },
}

/// Aggregate outcome of a run driven to completion in one call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: RunId,
    pub log_id: LogId,
    pub created: u64,
    pub updated: u64,
    pub errors: u64,
    pub status: LogStatus,
}
