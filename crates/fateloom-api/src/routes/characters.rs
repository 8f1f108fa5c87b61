//! Character routes. Creation, profile, and controller changes are
//! campaign-shape mutations behind the session write-lock; state changes
//! are in-session gameplay and flow through the unguarded path.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use fateloom_core::campaign::CampaignOperation;
use fateloom_core::error::DomainError;
use fateloom_core::model::Character;
use fateloom_core::payload::{
    CHARACTER_CONTROLLER_ASSIGNED, CHARACTER_CREATED, CHARACTER_PROFILE_UPDATED,
    CHARACTER_STATE_CHANGED, CharacterCreated, CharacterProfileUpdated, CharacterStateChanged,
    Controller, ControllerAssigned, EventPayload,
};

use crate::error::ApiError;
use crate::routes::{ActorRef, base_event};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct CreateCharacterRequest {
    name: String,
    #[serde(default)]
    participant_id: Option<Uuid>,
    #[serde(default)]
    actor: Option<ActorRef>,
}

#[derive(Debug, Deserialize)]
struct UpdateProfileRequest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    profile: Option<Value>,
    #[serde(default)]
    actor: Option<ActorRef>,
}

#[derive(Debug, Deserialize)]
struct AssignControllerRequest {
    controller: Controller,
    #[serde(default)]
    actor: Option<ActorRef>,
}

#[derive(Debug, Deserialize)]
struct ChangeStateRequest {
    #[serde(default)]
    session_id: Option<Uuid>,
    #[serde(default)]
    hit_points: Option<i32>,
    #[serde(default)]
    stress: Option<i32>,
    #[serde(default)]
    hope: Option<i32>,
    #[serde(default)]
    actor: Option<ActorRef>,
}

async fn load_character(
    state: &AppState,
    campaign_id: Uuid,
    character_id: Uuid,
) -> Result<Character, DomainError> {
    state
        .characters
        .get(campaign_id, character_id)
        .await?
        .ok_or_else(|| DomainError::NotFound {
            entity: "character",
            id: character_id.to_string(),
        })
}

/// POST /{campaign_id}/characters
async fn create_character(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
    Json(request): Json<CreateCharacterRequest>,
) -> Result<(StatusCode, Json<Character>), ApiError> {
    let campaign = state.load_campaign(campaign_id).await?;
    campaign.ensure_allows(CampaignOperation::CampaignMutate)?;
    if request.name.trim().is_empty() {
        return Err(DomainError::Validation("character name is required".into()).into());
    }

    let character_id = state.ids.new_id();
    let mut event = base_event(&state, campaign_id, CHARACTER_CREATED, request.actor.as_ref());
    event.entity_type = Some("character".to_owned());
    event.entity_id = Some(character_id.to_string());
    event.payload = EventPayload::CharacterCreated(CharacterCreated {
        character_id,
        name: request.name,
        participant_id: request.participant_id,
    })
    .encode();
    state.commit(event).await?;

    let character = load_character(&state, campaign_id, character_id).await?;
    Ok((StatusCode::CREATED, Json(character)))
}

/// PATCH /{campaign_id}/characters/{character_id}
async fn update_profile(
    State(state): State<AppState>,
    Path((campaign_id, character_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<Character>, ApiError> {
    let campaign = state.load_campaign(campaign_id).await?;
    campaign.ensure_allows(CampaignOperation::CampaignMutate)?;
    load_character(&state, campaign_id, character_id).await?;

    let mut event = base_event(
        &state,
        campaign_id,
        CHARACTER_PROFILE_UPDATED,
        request.actor.as_ref(),
    );
    event.entity_type = Some("character".to_owned());
    event.entity_id = Some(character_id.to_string());
    event.payload = EventPayload::CharacterProfileUpdated(CharacterProfileUpdated {
        character_id,
        name: request.name,
        profile: request.profile,
    })
    .encode();
    state.commit(event).await?;

    let character = load_character(&state, campaign_id, character_id).await?;
    Ok(Json(character))
}

/// POST /{campaign_id}/characters/{character_id}/controller
async fn assign_controller(
    State(state): State<AppState>,
    Path((campaign_id, character_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<AssignControllerRequest>,
) -> Result<StatusCode, ApiError> {
    let campaign = state.load_campaign(campaign_id).await?;
    campaign.ensure_allows(CampaignOperation::CampaignMutate)?;
    load_character(&state, campaign_id, character_id).await?;

    let mut event = base_event(
        &state,
        campaign_id,
        CHARACTER_CONTROLLER_ASSIGNED,
        request.actor.as_ref(),
    );
    event.entity_type = Some("character".to_owned());
    event.entity_id = Some(character_id.to_string());
    event.payload = EventPayload::ControllerAssigned(ControllerAssigned {
        character_id,
        controller: request.controller,
    })
    .encode();
    state.commit(event).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /{campaign_id}/characters/{character_id}/state
async fn change_state(
    State(state): State<AppState>,
    Path((campaign_id, character_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<ChangeStateRequest>,
) -> Result<StatusCode, ApiError> {
    let campaign = state.load_campaign(campaign_id).await?;
    campaign.ensure_allows(CampaignOperation::SessionAction)?;
    load_character(&state, campaign_id, character_id).await?;

    let mut event = base_event(
        &state,
        campaign_id,
        CHARACTER_STATE_CHANGED,
        request.actor.as_ref(),
    );
    event.session_id = request.session_id;
    event.entity_type = Some("character".to_owned());
    event.entity_id = Some(character_id.to_string());
    event.payload = EventPayload::CharacterStateChanged(CharacterStateChanged {
        character_id,
        hit_points: request.hit_points,
        stress: request.stress,
        hope: request.hope,
    })
    .encode();
    state.commit(event).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// A character's default controller, if any.
#[derive(Debug, Serialize)]
struct ControllerResponse {
    controller: Option<Controller>,
}

/// GET /{campaign_id}/characters/{character_id}/controller
async fn get_controller(
    State(state): State<AppState>,
    Path((campaign_id, character_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ControllerResponse>, ApiError> {
    load_character(&state, campaign_id, character_id).await?;
    let controller = state.control_defaults.get(campaign_id, character_id).await?;
    Ok(Json(ControllerResponse { controller }))
}

/// Returns the unguarded character routes (reads and in-session state
/// changes).
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{campaign_id}/characters/{character_id}/state",
            post(change_state),
        )
        .route(
            "/{campaign_id}/characters/{character_id}/controller",
            get(get_controller),
        )
}

/// Returns the character routes behind the session write-lock.
pub fn guarded_router() -> Router<AppState> {
    Router::new()
        .route("/{campaign_id}/characters", post(create_character))
        .route(
            "/{campaign_id}/characters/{character_id}",
            patch(update_profile),
        )
        .route(
            "/{campaign_id}/characters/{character_id}/controller",
            post(assign_controller),
        )
}
