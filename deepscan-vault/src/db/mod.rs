//! Database access for deepscan-vault
//!
//! SQLite holds the append-only `image_hashes` table. The pool is opened by the
//! process entry point and handed to the record store; nothing reaches it through
//! global state.

pub mod records;

pub use records::{RecordStore, SqliteRecordStore};

use deepscan_common::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Initialize database connection pool
///
/// Creates the database file and tables if they don't exist.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc: read, write, create
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        // WAL lets the listing views read while an upload inserts
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create tables and indexes (idempotent)
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS image_hashes (
            id TEXT PRIMARY KEY,
            file1_hash TEXT NOT NULL CHECK (length(file1_hash) > 0),
            file2_hash TEXT,
            file1_path TEXT,
            file2_path TEXT,
            match_result INTEGER,
            ai_score REAL,
            ai_generated INTEGER,
            ai_status TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_image_hashes_created_at ON image_hashes(created_at)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (image_hashes)");

    Ok(())
}
