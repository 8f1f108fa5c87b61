//! Campaign lifecycle over the HTTP boundary.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use common::{build_test_app, create_campaign, get_json, patch_json, post_json, transition};

#[tokio::test]
async fn test_create_campaign_returns_draft_campaign() {
    let app = build_test_app();

    let (status, body) = post_json(
        &app,
        "/api/v1/campaigns",
        &json!({
            "name": "The Sunken Vale",
            "game_system": "daggerheart",
            "theme": "sunken ruins, rising tides",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "The Sunken Vale");
    assert_eq!(body["status"], "draft");
    assert_eq!(body["participant_count"], 0);
    assert_eq!(body["character_count"], 0);
    assert_eq!(body["theme"], "sunken ruins, rising tides");
}

#[tokio::test]
async fn test_create_campaign_requires_name() {
    let app = build_test_app();
    let (status, body) = post_json(
        &app,
        "/api/v1/campaigns",
        &json!({"name": "", "game_system": "daggerheart"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_get_unknown_campaign_is_404() {
    let app = build_test_app();
    let (status, body) = get_json(
        &app,
        &format!("/api/v1/campaigns/{}", Uuid::from_u128(0xBEEF)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_status_walks_the_state_machine() {
    let app = build_test_app();
    let campaign_id = create_campaign(&app, "The Sunken Vale").await;

    transition(&app, &campaign_id, "active").await;
    transition(&app, &campaign_id, "completed").await;
    transition(&app, &campaign_id, "archived").await;

    let (status, body) = get_json(&app, &format!("/api/v1/campaigns/{campaign_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "archived");
    assert!(!body["completed_at"].is_null());
    assert!(!body["archived_at"].is_null());
}

#[tokio::test]
async fn test_archived_to_active_fails_with_structured_error() {
    let app = build_test_app();
    let campaign_id = create_campaign(&app, "The Sunken Vale").await;
    transition(&app, &campaign_id, "active").await;
    transition(&app, &campaign_id, "archived").await;

    let (status, body) = post_json(
        &app,
        &format!("/api/v1/campaigns/{campaign_id}/status"),
        &json!({"status": "active"}),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "invalid_status_transition");
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("archived"));
    assert!(message.contains("active"));
}

#[tokio::test]
async fn test_restore_returns_campaign_to_draft() {
    let app = build_test_app();
    let campaign_id = create_campaign(&app, "The Sunken Vale").await;
    transition(&app, &campaign_id, "active").await;
    transition(&app, &campaign_id, "archived").await;
    transition(&app, &campaign_id, "draft").await;

    let (_, body) = get_json(&app, &format!("/api/v1/campaigns/{campaign_id}")).await;
    assert_eq!(body["status"], "draft");
    assert!(body["completed_at"].is_null());
    assert!(body["archived_at"].is_null());
}

#[tokio::test]
async fn test_patch_updates_name_and_theme() {
    let app = build_test_app();
    let campaign_id = create_campaign(&app, "The Sunken Vale").await;

    let (status, body) = patch_json(
        &app,
        &format!("/api/v1/campaigns/{campaign_id}"),
        &json!({"name": "The Vale Reborn", "theme": "tides receding"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "The Vale Reborn");
    assert_eq!(body["theme"], "tides receding");
}
