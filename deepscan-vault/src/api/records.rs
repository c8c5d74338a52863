//! Record listing endpoints (vault and comparison history)

use axum::{extract::State, routing::get, Json, Router};

use crate::error::ApiResult;
use crate::models::Record;
use crate::services::{history, vault};
use crate::AppState;

/// GET /api/vault
///
/// Up to 100 most recent records of any kind, newest first.
pub async fn get_vault(State(state): State<AppState>) -> ApiResult<Json<Vec<Record>>> {
    let records = vault(state.store.as_ref()).await?;
    tracing::debug!(count = records.len(), "Vault listed");
    Ok(Json(records))
}

/// GET /api/history
///
/// Up to 50 most recent comparisons, newest first.
pub async fn get_history(State(state): State<AppState>) -> ApiResult<Json<Vec<Record>>> {
    let records = history(state.store.as_ref()).await?;
    tracing::debug!(count = records.len(), "History listed");
    Ok(Json(records))
}

/// Build record listing routes
pub fn record_routes() -> Router<AppState> {
    Router::new()
        .route("/api/vault", get(get_vault))
        .route("/api/history", get(get_history))
}
