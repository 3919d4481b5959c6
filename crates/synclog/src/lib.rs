//! `catsync-synclog`: durable audit log for sync runs.
//!
//! One `SyncLogEntry` per run, created at start and updated after every
//! processed item so a crash mid-run leaves a truthful partial record.
//! The `SyncLogger` facade is re-attachable across invocations: given a log
//! id it reloads counters from the store and continues appending.

pub mod entry;
pub mod logger;
pub mod sqlite;
pub mod store;

pub use entry::{ErrorDetail, LogId, LogStatistics, LogStatus, SyncLogEntry};
pub use logger::SyncLogger;
pub use sqlite::SqliteSyncLogStore;
pub use store::{InMemorySyncLogStore, LogStoreError, SyncLogStore};
