use serde::Deserialize;

use catsync_core::RunType;
use catsync_engine::RunId;
use catsync_synclog::LogId;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct StartSyncRequest {
    #[serde(default)]
    pub run_type: Option<RunType>,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub run_id: RunId,
    pub log_id: LogId,
    pub cursor: usize,
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub log_id: Option<LogId>,
}

#[derive(Debug, Deserialize)]
pub struct ReportFailureRequest {
    pub run_id: RunId,
    pub log_id: LogId,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct TestConnectionRequest {
    pub email: String,
    pub password: String,
}

// -------------------------
// Query parameters
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LogListQuery {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

fn default_page() -> usize {
    1
}

fn default_per_page() -> usize {
    20
}

#[derive(Debug, Deserialize)]
pub struct StatisticsQuery {
    #[serde(default = "default_days")]
    pub days: u32,
}

fn default_days() -> u32 {
    30
}
