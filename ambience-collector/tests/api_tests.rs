//! Integration tests for the collector HTTP API
//!
//! Tests cover:
//! - Report intake status codes
//! - Field aliases accepted on the wire
//! - Health endpoint counters

use ambience_collector::{build_router, AppState};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot` method

/// Test helper: POST a JSON body to the report endpoint
fn report_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/player-errors")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

fn full_report() -> Value {
    json!({
        "errorCode": 150,
        "videoId": "abc123",
        "request": {
            "query": "tavern lute",
            "desiredVol": 60,
            "crossfadeSec": 2.0
        },
        "lastQuery": "tavern lute",
        "playlistIndex": 0,
        "playlistLength": 3,
        "consecutiveErrors": 1,
        "manualListActive": true,
        "manualListInitialLength": 3,
        "manualListRemainingLength": 2,
        "manualListWasTrimmed": true,
        "removedManualVideoId": "abc123",
        "reportedAt": "2026-10-16T12:00:00.000Z"
    })
}

// =============================================================================
// Report intake
// =============================================================================

#[tokio::test]
async fn test_valid_report_accepted() {
    let app = build_router(AppState::new());

    let response = app.oneshot(report_request(full_report())).await.unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "accepted");
}

#[tokio::test]
async fn test_minimal_report_accepted() {
    let app = build_router(AppState::new());

    let response = app
        .oneshot(report_request(json!({ "errorCode": 5 })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_legacy_consecutive_field_accepted() {
    let app = build_router(AppState::new());

    let response = app
        .oneshot(report_request(json!({
            "errorCode": 101,
            "consecutivePlaybackErrors": 4
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_missing_error_code_rejected() {
    let app = build_router(AppState::new());

    let response = app
        .oneshot(report_request(json!({ "videoId": "abc123" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_rejected_report_not_counted() {
    let state = AppState::new();
    let app = build_router(state.clone());

    let response = app
        .oneshot(report_request(json!({ "errorCode": "bad" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(state.reports_received(), 0);
}

#[tokio::test]
async fn test_get_not_allowed() {
    let app = build_router(AppState::new());

    let response = app
        .oneshot(test_request("GET", "/api/player-errors"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// =============================================================================
// Health endpoint
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_router(AppState::new());

    let response = app.oneshot(test_request("GET", "/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "ambience-collector");
    assert!(body["version"].is_string());
    assert_eq!(body["reports_received"], 0);
}

#[tokio::test]
async fn test_health_counts_accepted_reports() {
    let state = AppState::new();

    for code in [2, 150] {
        let response = build_router(state.clone())
            .oneshot(report_request(json!({ "errorCode": code })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    let response = build_router(state)
        .oneshot(test_request("GET", "/health"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["reports_received"], 2);
}
