//! Multipart scan endpoints
//!
//! `POST /upload-hash` (field `image`, optional text field `detectAI`),
//! `POST /compare` (field `images`, exactly two files) and `POST /detect-ai`
//! (field `image`). Only parts carrying a filename count as files.

use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::DetectionOutcome;
use crate::services::scan_service::COMPARE_FILE_COUNT_MESSAGE;
use crate::services::Upload;
use crate::AppState;

const SINGLE_FILE_FIELD: &str = "image";
const COMPARE_FILE_FIELD: &str = "images";
const DETECT_FLAG_FIELD: &str = "detectAI";
const NO_FILE_MESSAGE: &str = "No file uploaded";
const SUCCESS: &str = "success";

/// POST /upload-hash response
#[derive(Debug, Serialize)]
pub struct UploadHashResponse {
    pub status: &'static str,
    pub hash: String,
    pub file_path: String,
    /// null when detection was not requested
    pub ai_result: Option<DetectionOutcome>,
    pub record_id: Uuid,
}

/// POST /compare response
#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub status: &'static str,
    pub hash1: String,
    pub hash2: String,
    #[serde(rename = "match")]
    pub is_match: bool,
    pub record_id: Uuid,
}

/// POST /detect-ai response; the detection fields sit at top level
#[derive(Debug, Serialize)]
pub struct DetectAiResponse {
    pub status: &'static str,
    pub hash: String,
    #[serde(flatten)]
    pub detection: DetectionOutcome,
    pub record_id: Uuid,
}

/// Files and text fields pulled out of one multipart body
#[derive(Debug, Default)]
struct ScanForm {
    files: Vec<Upload>,
    detect_ai: bool,
}

/// Read a multipart body, keeping files named `file_field`
///
/// A request that is not multipart at all yields an empty form, so handlers report
/// the missing file. Reading stops with a 400 once more than `max_files` files
/// arrive, and with a 413 as soon as one file exceeds `max_bytes`.
async fn read_form(
    multipart: Result<Multipart, MultipartRejection>,
    file_field: &str,
    max_files: usize,
    max_bytes: usize,
) -> ApiResult<ScanForm> {
    let mut form = ScanForm::default();
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Request is not multipart");
            return Ok(form);
        }
    };

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().map(str::to_string);

        match filename {
            Some(filename) if name == file_field => {
                if form.files.len() == max_files {
                    return Err(ApiError::BadRequest(too_many_files_message(file_field)));
                }
                let bytes = read_limited(field, max_bytes).await?;
                form.files.push(Upload::new(filename, bytes));
            }
            None if name == DETECT_FLAG_FIELD => {
                let value = field.text().await.map_err(multipart_error)?;
                form.detect_ai = value == "true";
            }
            _ => {
                tracing::debug!(field = %name, "Ignoring unexpected multipart field");
            }
        }
    }

    Ok(form)
}

fn too_many_files_message(file_field: &str) -> String {
    if file_field == COMPARE_FILE_FIELD {
        COMPARE_FILE_COUNT_MESSAGE.to_string()
    } else {
        format!("Expected a single file in field '{}'", file_field)
    }
}

/// Buffer one file, failing once it grows past `max_bytes`
async fn read_limited(mut field: Field<'_>, max_bytes: usize) -> ApiResult<Vec<u8>> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if buf.len() + chunk.len() > max_bytes {
            return Err(ApiError::PayloadTooLarge(format!(
                "File too large (limit {} bytes)",
                max_bytes
            )));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

/// POST /upload-hash
pub async fn upload_hash(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadHashResponse>> {
    let form = read_form(multipart, SINGLE_FILE_FIELD, 1, state.max_upload_bytes).await?;
    let upload = form
        .files
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::BadRequest(NO_FILE_MESSAGE.to_string()))?;

    let outcome = state.scanner.tag_and_store(upload, form.detect_ai).await?;

    Ok(Json(UploadHashResponse {
        status: SUCCESS,
        hash: outcome.hash,
        file_path: outcome.file_path,
        ai_result: outcome.ai_result,
        record_id: outcome.record_id,
    }))
}

/// POST /compare
pub async fn compare(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<CompareResponse>> {
    let form = read_form(multipart, COMPARE_FILE_FIELD, 2, state.max_upload_bytes).await?;
    let outcome = state.scanner.compare(form.files).await?;

    Ok(Json(CompareResponse {
        status: SUCCESS,
        hash1: outcome.hash1,
        hash2: outcome.hash2,
        is_match: outcome.is_match,
        record_id: outcome.record_id,
    }))
}

/// POST /detect-ai
pub async fn detect_ai(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<DetectAiResponse>> {
    let form = read_form(multipart, SINGLE_FILE_FIELD, 1, state.max_upload_bytes).await?;
    let upload = form
        .files
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::BadRequest(NO_FILE_MESSAGE.to_string()))?;

    let outcome = state.scanner.detect_only(upload).await?;

    Ok(Json(DetectAiResponse {
        status: SUCCESS,
        hash: outcome.hash,
        detection: outcome.detection,
        record_id: outcome.record_id,
    }))
}

/// Build scan routes
pub fn scan_routes() -> Router<AppState> {
    Router::new()
        .route("/upload-hash", post(upload_hash))
        .route("/compare", post(compare))
        .route("/detect-ai", post(detect_ai))
}
