//! deepscan-vault library
//!
//! Image fingerprinting backend: uploads are stored, hashed with SHA-256,
//! optionally checked by an external AI-content detector, and recorded in an
//! append-only SQLite table exposed through the vault and history views.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::db::RecordStore;
use crate::services::ScanService;

/// Room for multipart boundaries and text fields on top of the file bytes
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Largest number of files a single request carries (compare)
const MAX_FILES_PER_REQUEST: usize = 2;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Scan flow orchestration
    pub scanner: Arc<ScanService>,
    /// Record store backing the listing views
    pub store: Arc<dyn RecordStore>,
    /// Per-file upload limit in bytes
    pub max_upload_bytes: usize,
    /// Directory served under `/uploads`
    pub uploads_dir: PathBuf,
    /// Directory served for every unmatched path (web UI)
    pub public_dir: PathBuf,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        scanner: Arc<ScanService>,
        store: Arc<dyn RecordStore>,
        max_upload_bytes: usize,
        public_dir: PathBuf,
    ) -> Self {
        let uploads_dir = scanner.uploads().dir().to_path_buf();
        Self {
            scanner,
            store,
            max_upload_bytes,
            uploads_dir,
            public_dir,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes * MAX_FILES_PER_REQUEST + MULTIPART_OVERHEAD_BYTES;
    let uploads = ServeDir::new(&state.uploads_dir);
    let public = ServeDir::new(&state.public_dir);

    Router::new()
        .merge(api::scan_routes())
        .merge(api::record_routes())
        .merge(api::health_routes())
        .nest_service("/uploads", uploads)
        .fallback_service(public)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
