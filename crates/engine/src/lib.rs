//! `catsync-engine`: the batch-resumable sync state machine.
//!
//! A run moves Idle → Started → chunk-by-chunk Processing → one of
//! Completed, Failed or Cancelled. Session state lives in a TTL'd
//! `RunStateStore`; mutual exclusion is an atomic `RunFlag`; the caller
//! drives each chunk through `SyncService::advance` with the cursor it was
//! handed back, so a run survives process restarts on the driving side.

pub mod flag;
pub mod report;
pub mod run_state;
pub mod service;

pub use flag::RunFlag;
pub use report::{ChunkReport, EngineError, Progress, RunSummary, StartReport, StatusReport};
pub use run_state::{InMemoryRunStateStore, RunId, RunState, RunStateError, RunStateStore};
pub use service::{DEFAULT_BATCH_SIZE, SyncService};
