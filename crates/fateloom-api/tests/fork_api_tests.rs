//! Forking over the HTTP boundary.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{build_test_app, create_campaign, get_json, post_json};

/// Seed a source campaign with a participant (seq 2) and a character
/// (seq 3).
async fn seed_source(app: &axum::Router) -> String {
    let campaign_id = create_campaign(app, "The Sunken Vale").await;
    let (status, _) = post_json(
        app,
        &format!("/api/v1/campaigns/{campaign_id}/participants"),
        &json!({"display_name": "Tam"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = post_json(
        app,
        &format!("/api/v1/campaigns/{campaign_id}/characters"),
        &json!({"name": "Yara"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    campaign_id
}

#[tokio::test]
async fn test_fork_at_sequence_two_keeps_participant_only() {
    let app = build_test_app();
    let source_id = seed_source(&app).await;

    let (status, body) = post_json(
        &app,
        &format!("/api/v1/campaigns/{source_id}/fork"),
        &json!({"name": "The Vale, Sundered", "fork_seq": 2, "copy_participants": true}),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "fork failed: {body}");
    assert_eq!(body["fork_event_seq"], 2);
    assert_eq!(body["campaign"]["name"], "The Vale, Sundered");
    assert_eq!(body["campaign"]["participant_count"], 1);
    assert_eq!(body["campaign"]["character_count"], 0);
    assert_eq!(body["lineage"]["depth"], 1);
    assert_eq!(body["lineage"]["parent_campaign_id"], source_id);
    assert_eq!(body["lineage"]["origin_campaign_id"], source_id);
}

#[tokio::test]
async fn test_fork_defaults_to_the_latest_event() {
    let app = build_test_app();
    let source_id = seed_source(&app).await;

    let (status, body) = post_json(
        &app,
        &format!("/api/v1/campaigns/{source_id}/fork"),
        &json!({"name": "The Vale, Sundered", "copy_participants": true}),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["fork_event_seq"], 3);
    assert_eq!(body["campaign"]["character_count"], 1);
}

#[tokio::test]
async fn test_fork_beyond_history_is_409() {
    let app = build_test_app();
    let source_id = seed_source(&app).await;

    let (status, body) = post_json(
        &app,
        &format!("/api/v1/campaigns/{source_id}/fork"),
        &json!({"name": "Too Far", "fork_seq": 99}),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "failed_precondition");
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("beyond current state")
    );
}

#[tokio::test]
async fn test_fork_rejects_ambiguous_fork_point() {
    let app = build_test_app();
    let source_id = seed_source(&app).await;

    let (status, body) = post_json(
        &app,
        &format!("/api/v1/campaigns/{source_id}/fork"),
        &json!({
            "name": "Both",
            "fork_seq": 2,
            "session_id": uuid::Uuid::from_u128(1).to_string(),
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_lineage_endpoint_reports_ancestry() {
    let app = build_test_app();
    let source_id = seed_source(&app).await;
    let (_, fork_body) = post_json(
        &app,
        &format!("/api/v1/campaigns/{source_id}/fork"),
        &json!({"name": "The Vale, Sundered", "copy_participants": true}),
    )
    .await;
    let fork_id = fork_body["campaign"]["id"].as_str().unwrap().to_owned();

    let (status, lineage) = get_json(&app, &format!("/api/v1/campaigns/{fork_id}/lineage")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(lineage["parent_campaign_id"], source_id);
    assert_eq!(lineage["origin_campaign_id"], source_id);
    assert_eq!(lineage["depth"], 1);

    // A root campaign has a degenerate lineage.
    let (status, root) = get_json(&app, &format!("/api/v1/campaigns/{source_id}/lineage")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(root["parent_campaign_id"], serde_json::Value::Null);
    assert_eq!(root["depth"], 0);
}

#[tokio::test]
async fn test_list_forks_is_501() {
    let app = build_test_app();
    let source_id = seed_source(&app).await;

    let (status, body) = get_json(&app, &format!("/api/v1/campaigns/{source_id}/forks")).await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(body["error"], "unimplemented");
}
