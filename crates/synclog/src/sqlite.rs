//! SQLite-backed sync log store.

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use crate::entry::{ErrorDetail, LogId, LogStatistics, LogStatus, SyncLogEntry};
use crate::store::{LogStoreError, SyncLogStore};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sync_logs (
    id            TEXT PRIMARY KEY,
    started_at    TEXT NOT NULL,
    run_type      TEXT NOT NULL,
    created_count INTEGER NOT NULL DEFAULT 0,
    updated_count INTEGER NOT NULL DEFAULT 0,
    error_count   INTEGER NOT NULL DEFAULT 0,
    error_details TEXT NOT NULL DEFAULT '[]',
    status        TEXT NOT NULL
)
"#;

/// Durable sync log store on SQLite.
#[derive(Debug, Clone)]
pub struct SqliteSyncLogStore {
    pool: SqlitePool,
}

impl SqliteSyncLogStore {
    /// Connect and ensure the schema exists.
    ///
    /// A single connection is used: the log has one writer (the active run)
    /// and this keeps `sqlite::memory:` databases coherent.
    pub async fn connect(url: &str) -> Result<Self, LogStoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await
            .map_err(storage)?;

        sqlx::query(SCHEMA).execute(&pool).await.map_err(storage)?;
        Ok(Self { pool })
    }

    pub async fn in_memory() -> Result<Self, LogStoreError> {
        Self::connect("sqlite::memory:").await
    }
}

fn storage(e: sqlx::Error) -> LogStoreError {
    LogStoreError::Storage(e.to_string())
}

fn format_ts(ts: &DateTime<Utc>) -> String {
    // Fixed precision + Z so lexicographic order is chronological order.
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>, LogStoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| LogStoreError::Storage(format!("bad timestamp {raw:?}: {e}")))
}

fn encode_details(details: &[ErrorDetail]) -> Result<String, LogStoreError> {
    serde_json::to_string(details).map_err(|e| LogStoreError::Serialization(e.to_string()))
}

fn row_to_entry(row: &SqliteRow) -> Result<SyncLogEntry, LogStoreError> {
    let id: String = row.try_get("id").map_err(storage)?;
    let started_at: String = row.try_get("started_at").map_err(storage)?;
    let run_type: String = row.try_get("run_type").map_err(storage)?;
    let status: String = row.try_get("status").map_err(storage)?;
    let details: String = row.try_get("error_details").map_err(storage)?;

    Ok(SyncLogEntry {
        id: id
            .parse()
            .map_err(|e| LogStoreError::Storage(format!("bad log id {id:?}: {e}")))?,
        started_at: parse_ts(&started_at)?,
        run_type: run_type
            .parse()
            .map_err(|_| LogStoreError::Storage(format!("bad run type {run_type:?}")))?,
        created_count: row.try_get::<i64, _>("created_count").map_err(storage)? as u64,
        updated_count: row.try_get::<i64, _>("updated_count").map_err(storage)? as u64,
        error_count: row.try_get::<i64, _>("error_count").map_err(storage)? as u64,
        error_details: serde_json::from_str(&details)
            .map_err(|e| LogStoreError::Serialization(e.to_string()))?,
        status: status
            .parse()
            .map_err(|_| LogStoreError::Storage(format!("bad status {status:?}")))?,
    })
}

#[async_trait]
impl SyncLogStore for SqliteSyncLogStore {
    async fn insert(&self, entry: &SyncLogEntry) -> Result<(), LogStoreError> {
        sqlx::query(
            "INSERT INTO sync_logs \
             (id, started_at, run_type, created_count, updated_count, error_count, error_details, status) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(entry.id.to_string())
        .bind(format_ts(&entry.started_at))
        .bind(entry.run_type.as_str())
        .bind(entry.created_count as i64)
        .bind(entry.updated_count as i64)
        .bind(entry.error_details.len() as i64)
        .bind(encode_details(&entry.error_details)?)
        .bind(entry.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn update_progress(
        &self,
        id: LogId,
        created: u64,
        updated: u64,
        details: &[ErrorDetail],
    ) -> Result<(), LogStoreError> {
        let result = sqlx::query(
            "UPDATE sync_logs \
             SET created_count = ?, updated_count = ?, error_count = ?, error_details = ? \
             WHERE id = ?",
        )
        .bind(created as i64)
        .bind(updated as i64)
        .bind(details.len() as i64)
        .bind(encode_details(details)?)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        if result.rows_affected() == 0 {
            return Err(LogStoreError::NotFound(id));
        }
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
        let result = sqlx::query(
            "UPDATE sync_logs \
             SET created_count = ?, updated_count = ?, error_count = ?, error_details = ?, status = ? \
             WHERE id = ? AND status = 'in_progress'",
        )
        .bind(created as i64)
        .bind(updated as i64)
        .bind(details.len() as i64)
        .bind(encode_details(details)?)
        .bind(status.as_str())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        if result.rows_affected() == 0 {
            // Either missing, or already terminal (forward-only transitions).
            match self.get(id).await? {
                None => return Err(LogStoreError::NotFound(id)),
                Some(existing) => {
                    tracing::warn!(
                        log_id = %id,
                        status = %existing.status,
                        "finalize on terminal entry ignored"
                    );
                }
            }
        }
        Ok(())
    }

    async fn get(&self, id: LogId) -> Result<Option<SyncLogEntry>, LogStoreError> {
        let row = sqlx::query("SELECT * FROM sync_logs WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;

        row.as_ref().map(row_to_entry).transpose()
    }

    async fn latest(&self) -> Result<Option<SyncLogEntry>, LogStoreError> {
        let row = sqlx::query("SELECT * FROM sync_logs ORDER BY started_at DESC, id DESC LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;

        row.as_ref().map(row_to_entry).transpose()
    }

    async fn list(&self, page: usize, per_page: usize) -> Result<Vec<SyncLogEntry>, LogStoreError> {
        let offset = page.saturating_sub(1) * per_page;
        let rows = sqlx::query(
            "SELECT * FROM sync_logs ORDER BY started_at DESC, id DESC LIMIT ? OFFSET ?",
        )
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        rows.iter().map(row_to_entry).collect()
    }

    async fn count(&self) -> Result<u64, LogStoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sync_logs")
            .fetch_one(&self.pool)
            .await
            .map_err(storage)?;
        Ok(count as u64)
    }

    async fn delete(&self, id: LogId) -> Result<bool, LogStoreError> {
        let result = sqlx::query("DELETE FROM sync_logs WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self) -> Result<u64, LogStoreError> {
        let result = sqlx::query("DELETE FROM sync_logs")
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(result.rows_affected())
    }

    async fn cleanup_older_than(&self, days: u32) -> Result<u64, LogStoreError> {
        let cutoff = Utc::now() - Duration::days(days as i64);
        let result = sqlx::query("DELETE FROM sync_logs WHERE started_at < ?")
            .bind(format_ts(&cutoff))
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(result.rows_affected())
    }

    async fn statistics(&self, days: u32) -> Result<LogStatistics, LogStoreError> {
        let cutoff = Utc::now() - Duration::days(days as i64);
        let row = sqlx::query(
            "SELECT \
                COUNT(*) AS total_runs, \
                COALESCE(SUM(created_count), 0) AS total_created, \
                COALESCE(SUM(updated_count), 0) AS total_updated, \
                COALESCE(SUM(error_count), 0) AS total_errors, \
                COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0) AS completed_runs, \
                COALESCE(SUM(CASE WHEN status = 'failed' THEN 1 ELSE 0 END), 0) AS failed_runs \
             FROM sync_logs WHERE started_at >= ?",
        )
        .bind(format_ts(&cutoff))
        .fetch_one(&self.pool)
        .await
        .map_err(storage)?;

        Ok(LogStatistics {
            total_runs: row.try_get::<i64, _>("total_runs").map_err(storage)? as u64,
            total_created: row.try_get::<i64, _>("total_created").map_err(storage)? as u64,
            total_updated: row.try_get::<i64, _>("total_updated").map_err(storage)? as u64,
            total_errors: row.try_get::<i64, _>("total_errors").map_err(storage)? as u64,
            completed_runs: row.try_get::<i64, _>("completed_runs").map_err(storage)? as u64,
            failed_runs: row.try_get::<i64, _>("failed_runs").map_err(storage)? as u64,
        })
    }
}
