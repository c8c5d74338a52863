//! HTTP API integration tests
//!
//! Drive the full router (multipart parsing, scan flows, SQLite, static serving)
//! over a scratch root folder.

mod helpers;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::{routing::post, Json, Router};
use helpers::{body_bytes, body_json, file, spawn_detector, text, TestApp, DEFAULT_MAX_UPLOAD};
use serde_json::{json, Value};

const HASH_1_2: &str = "a12871fee210fb8619291eaea194581cbd2531e4b23759d225f6806923f63222";
const HASH_1: &str = "4bf5122f344554c53bde2ebb8cd2b7e3d1600ad631c385a5d7cce23c7785459a";
const HASH_2: &str = "dbc1b4c900ffe48d575b5da5c638040125f65db0fe3e24494b76ea986457d986";
const HASH_EMPTY: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

async fn detector_answering(verdict: Value) -> String {
    let app = Router::new().route(
        "/check-image",
        post(move || {
            let verdict = verdict.clone();
            async move { Json(verdict) }
        }),
    );
    spawn_detector(app).await
}

#[tokio::test]
async fn test_health_reports_ok() {
    let app = TestApp::new().await;

    let response = app.get("/api/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "deepscan-vault");
    assert!(body["version"].is_string());
    assert!(body["uptime_seconds"].is_u64());
}

#[tokio::test]
async fn test_upload_hash_without_detection() {
    let app = TestApp::new().await;

    let response = app
        .post_form("/upload-hash", &[file("image", "a.png", &[0x01, 0x02])])
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["hash"], HASH_1_2);
    assert_eq!(body["ai_result"], Value::Null);
    assert!(body["record_id"].is_string());

    let file_path = body["file_path"].as_str().unwrap();
    assert!(file_path.starts_with("/uploads/"));
    assert!(file_path.ends_with("-a.png"));
    assert_eq!(app.stored_file_count(), 1);

    // The stored file is served back under its locator
    let served = app.get(file_path).await;
    assert_eq!(served.status(), StatusCode::OK);
    assert_eq!(body_bytes(served).await, vec![0x01, 0x02]);
}

#[tokio::test]
async fn test_upload_hash_detect_flag_must_be_exactly_true() {
    let detector = detector_answering(json!({"ai_score": 0.9, "ai_generated": true})).await;
    let app = TestApp::with_detector(&detector, DEFAULT_MAX_UPLOAD).await;

    let response = app
        .post_form(
            "/upload-hash",
            &[file("image", "a.png", b"pixels"), text("detectAI", "yes")],
        )
        .await;
    let body = body_json(response).await;
    assert_eq!(body["ai_result"], Value::Null);
}

#[tokio::test]
async fn test_upload_hash_with_detection() {
    let detector = detector_answering(
        json!({"ai_score": 0.9731, "ai_generated": true, "confidence": 94.62}),
    )
    .await;
    let app = TestApp::with_detector(&detector, DEFAULT_MAX_UPLOAD).await;

    let response = app
        .post_form(
            "/upload-hash",
            &[text("detectAI", "true"), file("image", "gen.png", b"pixels")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(
        body["ai_result"],
        json!({"ai_score": 0.9731, "ai_generated": true, "confidence": 94.62})
    );

    let vault = body_json(app.get("/api/vault").await).await;
    assert_eq!(vault[0]["ai_score"], 0.9731);
    assert_eq!(vault[0]["ai_generated"], true);
    assert_eq!(vault[0]["ai_status"], "detected");
}

#[tokio::test]
async fn test_upload_hash_with_unreachable_detector_still_succeeds() {
    let app = TestApp::new().await;

    let response = app
        .post_form(
            "/upload-hash",
            &[file("image", "a.png", &[0x01, 0x02]), text("detectAI", "true")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["hash"], HASH_1_2);
    assert_eq!(
        body["ai_result"],
        json!({"error": "AI service unavailable", "ai_score": 0.0, "ai_generated": false})
    );

    // Persisted without a fabricated verdict
    let vault = body_json(app.get("/api/vault").await).await;
    assert_eq!(vault[0]["ai_status"], "unavailable");
    assert_eq!(vault[0]["ai_score"], Value::Null);
    assert_eq!(vault[0]["ai_generated"], Value::Null);
}

#[tokio::test]
async fn test_upload_hash_empty_file() {
    let app = TestApp::new().await;

    let response = app
        .post_form("/upload-hash", &[file("image", "empty.png", b"")])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["hash"], HASH_EMPTY);
}

#[tokio::test]
async fn test_upload_hash_without_file_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .post_form("/upload-hash", &[text("detectAI", "true")])
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"], "No file uploaded");

    // A file under the wrong field name does not count either
    let response = app
        .post_form("/upload-hash", &[file("photo", "a.png", b"x")])
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nor does a body that is not multipart at all
    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/upload-hash")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "No file uploaded");

    assert_eq!(app.stored_file_count(), 0);
    assert_eq!(body_json(app.get("/api/vault").await).await, json!([]));
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let app = TestApp::with_detector(&helpers::unreachable_url(), 16).await;

    let response = app
        .post_form("/upload-hash", &[file("image", "big.png", &[7u8; 64])])
        .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body_json(response).await["status"], "error");

    assert_eq!(app.stored_file_count(), 0);
    assert_eq!(body_json(app.get("/api/vault").await).await, json!([]));
}

#[tokio::test]
async fn test_compare_identical_and_different() {
    let app = TestApp::new().await;

    let response = app
        .post_form(
            "/compare",
            &[
                file("images", "one.png", &[0x01]),
                file("images", "two.png", &[0x01]),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let same = body_json(response).await;
    assert_eq!(same["status"], "success");
    assert_eq!(same["hash1"], HASH_1);
    assert_eq!(same["hash2"], HASH_1);
    assert_eq!(same["match"], true);

    let response = app
        .post_form(
            "/compare",
            &[
                file("images", "one.png", &[0x01]),
                file("images", "two.png", &[0x02]),
            ],
        )
        .await;
    let different = body_json(response).await;
    assert_eq!(different["hash1"], HASH_1);
    assert_eq!(different["hash2"], HASH_2);
    assert_eq!(different["match"], false);

    let history = body_json(app.get("/api/history").await).await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["id"], different["record_id"]);
    assert_eq!(history[0]["match"], false);
    assert_eq!(history[1]["id"], same["record_id"]);
    assert_eq!(history[1]["match"], true);
    assert_eq!(history[1]["ai_score"], Value::Null);
    assert_eq!(app.stored_file_count(), 4);
}

#[tokio::test]
async fn test_compare_requires_exactly_two_files() {
    let app = TestApp::new().await;

    let cases = vec![
        vec![],
        vec![file("images", "one.png", &[0x01])],
        vec![
            file("images", "one.png", &[0x01]),
            file("images", "two.png", &[0x02]),
            file("images", "three.png", &[0x03]),
        ],
    ];

    for parts in cases {
        let response = app.post_form("/compare", &parts).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "Please upload exactly 2 images"
        );
    }

    assert_eq!(app.stored_file_count(), 0);
    assert_eq!(body_json(app.get("/api/history").await).await, json!([]));
}

#[tokio::test]
async fn test_detect_ai_flattens_verdict() {
    let detector = detector_answering(json!({"ai_score": 0.12, "ai_generated": false})).await;
    let app = TestApp::with_detector(&detector, DEFAULT_MAX_UPLOAD).await;

    let response = app
        .post_form("/detect-ai", &[file("image", "photo.jpg", &[0x01, 0x02])])
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["hash"], HASH_1_2);
    assert_eq!(body["ai_score"], 0.12);
    assert_eq!(body["ai_generated"], false);
    assert!(body.get("error").is_none());

    let vault = body_json(app.get("/api/vault").await).await;
    assert_eq!(vault[0]["id"], body["record_id"]);
    assert_eq!(vault[0]["ai_status"], "detected");
}

#[tokio::test]
async fn test_detect_ai_with_unreachable_detector() {
    let app = TestApp::new().await;

    let response = app
        .post_form("/detect-ai", &[file("image", "photo.jpg", &[0x02])])
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["hash"], HASH_2);
    assert_eq!(body["error"], "AI service unavailable");
    assert_eq!(body["ai_score"], 0.0);
    assert_eq!(body["ai_generated"], false);
}

#[tokio::test]
async fn test_detect_ai_without_file_is_rejected() {
    let app = TestApp::new().await;

    let response = app.post_form("/detect-ai", &[]).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "No file uploaded");
}

#[tokio::test]
async fn test_vault_lists_every_kind_newest_first() {
    let app = TestApp::new().await;

    let first = body_json(
        app.post_form("/upload-hash", &[file("image", "a.png", &[0x01])])
            .await,
    )
    .await;
    let compare = body_json(
        app.post_form(
            "/compare",
            &[
                file("images", "a.png", &[0x01]),
                file("images", "b.png", &[0x02]),
            ],
        )
        .await,
    )
    .await;
    let last = body_json(
        app.post_form("/upload-hash", &[file("image", "b.png", &[0x02])])
            .await,
    )
    .await;

    let vault = body_json(app.get("/api/vault").await).await;
    let ids: Vec<&Value> = vault.as_array().unwrap().iter().map(|r| &r["id"]).collect();
    assert_eq!(
        ids,
        vec![&last["record_id"], &compare["record_id"], &first["record_id"]]
    );

    // Single-file records carry nulls for the second file and match
    let single = &vault[0];
    assert_eq!(single["file1_hash"], HASH_2);
    assert_eq!(single["file2_hash"], Value::Null);
    assert_eq!(single["file2_path"], Value::Null);
    assert_eq!(single["match"], Value::Null);
    assert_eq!(single["ai_status"], Value::Null);
    assert!(single["created_at"].as_str().unwrap().ends_with('Z'));

    let history = body_json(app.get("/api/history").await).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["id"], compare["record_id"]);
}

#[tokio::test]
async fn test_empty_views() {
    let app = TestApp::new().await;

    assert_eq!(body_json(app.get("/api/vault").await).await, json!([]));
    assert_eq!(body_json(app.get("/api/history").await).await, json!([]));
}

#[tokio::test]
async fn test_root_serves_web_ui() {
    let app = TestApp::new().await;

    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains("DeepScan"));

    let missing = app.get("/uploads/does-not-exist.png").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let app = TestApp::new().await;

    let response = app
        .send(
            Request::builder()
                .uri("/api/health")
                .header(header::ORIGIN, "http://example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
}
