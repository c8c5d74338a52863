//! Shared fixtures for deepscan-vault integration tests

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use deepscan_vault::db::{init_database_pool, RecordStore, SqliteRecordStore};
use deepscan_vault::services::{HttpDetectorClient, ImageDetector, ScanService, UploadStore};
use deepscan_vault::{build_router, AppState};
use http_body_util::BodyExt;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "deepscan-test-boundary";
pub const DEFAULT_MAX_UPLOAD: usize = 10 * 1024 * 1024;

/// Router over a scratch root folder
pub struct TestApp {
    _temp: TempDir,
    pub router: Router,
    pub uploads_dir: PathBuf,
    pub public_dir: PathBuf,
}

impl TestApp {
    /// App whose detector is unreachable
    pub async fn new() -> Self {
        Self::with_detector(&unreachable_url(), DEFAULT_MAX_UPLOAD).await
    }

    pub async fn with_detector(detector_url: &str, max_upload_bytes: usize) -> Self {
        let temp = TempDir::new().unwrap();
        let uploads_dir = temp.path().join("uploads");
        let public_dir = temp.path().join("public");
        std::fs::create_dir_all(&uploads_dir).unwrap();
        std::fs::create_dir_all(&public_dir).unwrap();
        std::fs::write(
            public_dir.join("index.html"),
            "<!doctype html><title>DeepScan</title>",
        )
        .unwrap();

        let pool = init_database_pool(&temp.path().join("deepscan.db"))
            .await
            .unwrap();
        let store: Arc<dyn RecordStore> = Arc::new(SqliteRecordStore::new(pool));
        let detector: Arc<dyn ImageDetector> =
            Arc::new(HttpDetectorClient::new(detector_url, Duration::from_secs(2)).unwrap());
        let scanner = Arc::new(ScanService::new(
            store.clone(),
            UploadStore::new(&uploads_dir),
            detector,
        ));

        let state = AppState::new(scanner, store, max_upload_bytes, public_dir.clone());

        Self {
            _temp: temp,
            router: build_router(state),
            uploads_dir,
            public_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_form(&self, uri: &str, parts: &[Part]) -> Response<Body> {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();
        self.send(request).await
    }

    pub fn stored_file_count(&self) -> usize {
        std::fs::read_dir(&self.uploads_dir).unwrap().count()
    }
}

/// One multipart part
pub enum Part {
    File {
        name: &'static str,
        filename: &'static str,
        bytes: Vec<u8>,
    },
    Text {
        name: &'static str,
        value: &'static str,
    },
}

pub fn file(name: &'static str, filename: &'static str, bytes: &[u8]) -> Part {
    Part::File {
        name,
        filename,
        bytes: bytes.to_vec(),
    }
}

pub fn text(name: &'static str, value: &'static str) -> Part {
    Part::Text { name, value }
}

pub fn multipart_body(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File {
                name,
                filename,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}",
                        name, value
                    )
                    .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// URL of a port nobody listens on
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/check-image", addr)
}

/// Serve `app` as a stand-in detector and return its check-image URL
pub async fn spawn_detector(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/check-image", addr)
}
