use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use polyglot_forge::load_config::ServerSection;
use polyglot_forge::server::{self, AppState};
use polyglot_forge_core::batch::BatchSettings;
use polyglot_forge_core::contract::{GenerationError, MockGenerator};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app(mock: MockGenerator) -> Router {
    let mut settings = BatchSettings::new("test-model");
    settings.pace = Duration::ZERO;
    let state = Arc::new(AppState::new(Arc::new(mock), settings));
    server::build(state, &ServerSection::default())
}

fn post_convert(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/convert")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_returns_ok() {
    let response = app(MockGenerator::new())
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "ok": true }));
}

#[tokio::test]
async fn empty_files_is_rejected_without_provider_calls() {
    let mut mock = MockGenerator::new();
    mock.expect_generate().never();

    let body = json!({ "files": [], "targetLanguage": "Python", "targetVersion": "3.12" });
    let response = app(mock)
        .oneshot(post_convert(body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({ "error": "No files provided" }));
}

#[tokio::test]
async fn missing_files_field_is_rejected() {
    let mut mock = MockGenerator::new();
    mock.expect_generate().never();

    let response = app(mock)
        .oneshot(post_convert(json!({ "targetLanguage": "Go" }).to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "No files provided");
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let response = app(MockGenerator::new())
        .oneshot(post_convert("{ not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());
}

#[tokio::test]
async fn converts_files_in_order_with_fallback_for_failures() {
    let mut mock = MockGenerator::new();
    mock.expect_generate().times(2).returning(|req| {
        if req.prompt.contains("src/ok.js") {
            Ok(json!({ "path": "src/ok.py", "content": "print('ok')\n" }))
        } else {
            Err(GenerationError::Http {
                status: 400,
                message: "bad prompt".into(),
            })
        }
    });

    let body = json!({
        "files": [
            { "path": "src/ok.js", "content": "console.log('ok')", "name": "ok.js" },
            { "path": "src/bad.js", "content": "boom()", "name": "bad.js" }
        ],
        "targetLanguage": "Python",
        "targetVersion": "latest"
    });
    let response = app(mock)
        .oneshot(post_convert(body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let result = json_body(response).await;
    let files = result["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["path"], "src/ok.py");
    assert_eq!(files[0]["content"], "print('ok')\n");
    assert_eq!(files[0]["status"], "converted");
    assert_eq!(files[1]["path"], "src/bad.js");
    assert_eq!(files[1]["status"], "fallback");
    let fallback = files[1]["content"].as_str().unwrap();
    assert!(fallback.starts_with("/* Failed to convert file:"));
    assert!(fallback.ends_with("\nboom()"));
}

#[tokio::test]
async fn unexpected_failure_is_an_internal_error() {
    // No expectation set: the mock panics on its first call.
    let response = app(MockGenerator::new())
        .oneshot(post_convert(
            json!({
                "files": [{ "path": "a.js", "content": "1" }],
                "targetLanguage": "Rust"
            })
            .to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert!(!body["error"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let mut settings = BatchSettings::new("test-model");
    settings.pace = Duration::ZERO;
    let mut mock = MockGenerator::new();
    mock.expect_generate().never();
    let state = Arc::new(AppState::new(Arc::new(mock), settings));
    let section = ServerSection {
        body_limit_bytes: 64,
        ..ServerSection::default()
    };
    let app = server::build(state, &section);

    let body = json!({
        "files": [{ "path": "a.js", "content": "x".repeat(1024) }],
        "targetLanguage": "Go"
    });
    let response = app.oneshot(post_convert(body.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
