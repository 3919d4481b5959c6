//! Environment-driven runtime configuration.

use catsync_engine::DEFAULT_BATCH_SIZE;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// Base URL of the vendor catalog API.
    pub remote_base_url: String,
    /// SQLite database URL for the sync log.
    pub database_url: String,
    /// Items processed per batch invocation.
    pub batch_size: usize,
    /// Age in days after which finalized sync logs are pruned.
    pub log_retention_days: u32,
    /// Interval for automatic full syncs; unset (or 0) disables them.
    pub sync_interval_minutes: Option<u64>,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let bind_addr =
            std::env::var("CATSYNC_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let remote_base_url = std::env::var("CATSYNC_API_URL").unwrap_or_else(|_| {
            tracing::warn!("CATSYNC_API_URL not set; using local dev default");
            "http://localhost:9000".to_string()
        });

        let database_url = std::env::var("CATSYNC_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite::memory:".to_string());

        let batch_size = std::env::var("CATSYNC_BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_BATCH_SIZE);

        let log_retention_days = std::env::var("CATSYNC_LOG_RETENTION_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        let sync_interval_minutes = std::env::var("CATSYNC_SYNC_INTERVAL_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|m: &u64| *m > 0);

        Self {
            bind_addr,
            remote_base_url,
            database_url,
            batch_size,
            log_retention_days,
            sync_interval_minutes,
        }
    }
}
