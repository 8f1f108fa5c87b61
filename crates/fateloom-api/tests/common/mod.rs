//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use fateloom_api::state::AppState;
use fateloom_journal::memory::MemoryJournal;
use fateloom_test_support::{FixedClock, SequenceIds, fixed_time};

/// Build application state over an in-memory journal with a deterministic
/// clock and id sequence. Generated ids start at `0x100`.
pub fn test_state() -> AppState {
    AppState::new(
        Arc::new(MemoryJournal::new()),
        Arc::new(FixedClock(fixed_time())),
        Arc::new(SequenceIds::new(0x100)),
    )
}

/// Build the full app router over fresh test state.
pub fn build_test_app() -> Router {
    fateloom_api::app(test_state())
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<&serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: &Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "POST", uri, Some(body)).await
}

/// Send a PATCH request with a JSON body and return the response.
pub async fn patch_json(
    app: &Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "PATCH", uri, Some(body)).await
}

/// Send a DELETE request with a JSON body and return the response.
pub async fn delete_json(
    app: &Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "DELETE", uri, Some(body)).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, "GET", uri, None).await
}

/// Create a campaign and return its id as a string.
pub async fn create_campaign(app: &Router, name: &str) -> String {
    let (status, body) = post_json(
        app,
        "/api/v1/campaigns",
        &serde_json::json!({"name": name, "game_system": "daggerheart"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body["id"].as_str().unwrap().to_owned()
}

/// Move a campaign into the given status.
pub async fn transition(app: &Router, campaign_id: &str, status_name: &str) {
    let (status, body) = post_json(
        app,
        &format!("/api/v1/campaigns/{campaign_id}/status"),
        &serde_json::json!({"status": status_name}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "transition failed: {body}");
}
