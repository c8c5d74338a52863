//! Fingerprint record persistence
//!
//! Records are insert-only. The store assigns `id` and `created_at`; listings are
//! ordered by `created_at` descending with insertion order breaking ties.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use deepscan_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::{AiStatus, NewRecord, Record};

/// Append-only record collection
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert one record, returning it with its assigned id and timestamp
    async fn insert(&self, record: NewRecord) -> Result<Record>;

    /// Most recent records of any kind, newest first
    async fn find_recent(&self, limit: u32) -> Result<Vec<Record>>;

    /// Most recent two-file comparisons, newest first
    async fn find_recent_comparisons(&self, limit: u32) -> Result<Vec<Record>>;
}

/// SQLite-backed record store
#[derive(Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the underlying pool, waiting for in-flight queries
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, file1_hash, file2_hash, file1_path, file2_path,
           match_result, ai_score, ai_generated, ai_status, created_at
    FROM image_hashes
"#;

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn insert(&self, new: NewRecord) -> Result<Record> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO image_hashes (
                id, file1_hash, file2_hash, file1_path, file2_path,
                match_result, ai_score, ai_generated, ai_status, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(new.file1_hash())
        .bind(new.file2_hash())
        .bind(new.file1_path())
        .bind(new.file2_path())
        .bind(new.is_match())
        .bind(new.ai_score())
        .bind(new.ai_generated())
        .bind(new.ai_status().map(|s| s.as_str()))
        .bind(format_timestamp(&created_at))
        .execute(&self.pool)
        .await?;

        tracing::debug!(record_id = %id, "Record inserted");

        Ok(new.into_record(id, created_at))
    }

    async fn find_recent(&self, limit: u32) -> Result<Vec<Record>> {
        let sql = format!(
            "{} ORDER BY created_at DESC, rowid DESC LIMIT ?",
            SELECT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(record_from_row).collect()
    }

    async fn find_recent_comparisons(&self, limit: u32) -> Result<Vec<Record>> {
        let sql = format!(
            "{} WHERE file2_hash IS NOT NULL ORDER BY created_at DESC, rowid DESC LIMIT ?",
            SELECT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(record_from_row).collect()
    }
}

/// Fixed-width UTC timestamp so text ordering matches time ordering
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn record_from_row(row: &SqliteRow) -> Result<Record> {
    let id: String = row.try_get("id")?;
    let id = Uuid::parse_str(&id)
        .map_err(|e| Error::Internal(format!("Invalid record id in database: {}", e)))?;

    let created_at: String = row.try_get("created_at")?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| Error::Internal(format!("Failed to parse created_at: {}", e)))?
        .with_timezone(&Utc);

    let ai_status: Option<String> = row.try_get("ai_status")?;
    let ai_status = ai_status
        .map(|s| {
            AiStatus::parse(&s)
                .ok_or_else(|| Error::Internal(format!("Unknown ai_status in database: {}", s)))
        })
        .transpose()?;

    Ok(Record {
        id,
        file1_hash: row.try_get("file1_hash")?,
        file2_hash: row.try_get("file2_hash")?,
        file1_path: row.try_get("file1_path")?,
        file2_path: row.try_get("file2_path")?,
        is_match: row.try_get("match_result")?,
        ai_score: row.try_get("ai_score")?,
        ai_generated: row.try_get("ai_generated")?,
        ai_status,
        created_at,
    })
}
