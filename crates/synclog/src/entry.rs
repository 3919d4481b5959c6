//! Sync log data model.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use catsync_core::RunType;

/// Identifier of one sync log entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogId(pub Uuid);

impl LogId {
    /// Uses UUIDv7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for LogId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for LogId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for LogId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// Lifecycle status of a log entry.
///
/// Transitions only `in_progress -> {completed | partial | failed | cancelled}`;
/// terminal states are never re-opened.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    InProgress,
    Completed,
    /// Finished, but with per-item errors.
    Partial,
    Failed,
    Cancelled,
}

impl LogStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LogStatus::InProgress)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::InProgress => "in_progress",
            LogStatus::Completed => "completed",
            LogStatus::Partial => "partial",
            LogStatus::Failed => "failed",
            LogStatus::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for LogStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown log status: {0}")]
pub struct ParseLogStatusError(String);

impl FromStr for LogStatus {
    type Err = ParseLogStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(LogStatus::InProgress),
            "completed" => Ok(LogStatus::Completed),
            "partial" => Ok(LogStatus::Partial),
            "failed" => Ok(LogStatus::Failed),
            "cancelled" => Ok(LogStatus::Cancelled),
            other => Err(ParseLogStatusError(other.to_string())),
        }
    }
}

/// One recorded error within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub time: DateTime<Utc>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl ErrorDetail {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            time: Utc::now(),
            message: message.into(),
            sku: None,
            context: None,
        }
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Durable audit record for one sync run.
///
/// Invariant: `error_count == error_details.len()`; stores derive the count
/// from the details on every write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncLogEntry {
    pub id: LogId,
    pub started_at: DateTime<Utc>,
    pub run_type: RunType,
    pub created_count: u64,
    pub updated_count: u64,
    pub error_count: u64,
    pub error_details: Vec<ErrorDetail>,
    pub status: LogStatus,
}

impl SyncLogEntry {
    /// A fresh `in_progress` entry with zero counters.
    pub fn new(run_type: RunType) -> Self {
        Self {
            id: LogId::new(),
            started_at: Utc::now(),
            run_type,
            created_count: 0,
            updated_count: 0,
            error_count: 0,
            error_details: Vec::new(),
            status: LogStatus::InProgress,
        }
    }

    /// Total items accounted for by this entry.
    pub fn processed_count(&self) -> u64 {
        self.created_count + self.updated_count + self.error_count
    }
}

/// Aggregate statistics over a trailing time window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogStatistics {
    pub total_runs: u64,
    pub total_created: u64,
    pub total_updated: u64,
    pub total_errors: u64,
    pub completed_runs: u64,
    pub failed_runs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_and_terminal_flags() {
        for status in [
            LogStatus::InProgress,
            LogStatus::Completed,
            LogStatus::Partial,
            LogStatus::Failed,
            LogStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<LogStatus>().unwrap(), status);
            assert_eq!(status.is_terminal(), status != LogStatus::InProgress);
        }
    }

    #[test]
    fn error_detail_serializes_without_empty_optionals() {
        let detail = ErrorDetail::new("boom");
        let json = serde_json::to_value(&detail).unwrap();
        assert!(json.get("sku").is_none());
        assert!(json.get("context").is_none());

        let tagged = ErrorDetail::new("boom").with_sku("SKU1").with_context("image_download");
        let json = serde_json::to_value(&tagged).unwrap();
        assert_eq!(json["sku"], "SKU1");
        assert_eq!(json["context"], "image_download");
    }
}
