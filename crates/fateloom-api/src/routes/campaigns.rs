//! Campaign lifecycle routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fateloom_core::campaign::{Campaign, CampaignOperation, CampaignStatus, GmMode};
use fateloom_core::error::DomainError;
use fateloom_core::model::CharacterState;
use fateloom_core::payload::{
    CAMPAIGN_CREATED, CAMPAIGN_STATUS_CHANGED, CAMPAIGN_UPDATED, CampaignCreated,
    CampaignStatusChanged, CampaignUpdated, EventPayload,
};

use crate::error::ApiError;
use crate::routes::{ActorRef, base_event};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct CreateCampaignRequest {
    name: String,
    game_system: String,
    #[serde(default)]
    gm_mode: Option<GmMode>,
    #[serde(default)]
    theme: Option<String>,
    #[serde(default)]
    actor: Option<ActorRef>,
}

#[derive(Debug, Deserialize)]
struct TransitionRequest {
    status: CampaignStatus,
    #[serde(default)]
    actor: Option<ActorRef>,
}

#[derive(Debug, Deserialize)]
struct UpdateCampaignRequest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    theme: Option<String>,
    #[serde(default)]
    actor: Option<ActorRef>,
}

/// POST /
async fn create_campaign(
    State(state): State<AppState>,
    Json(request): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<Campaign>), ApiError> {
    if request.name.trim().is_empty() {
        return Err(DomainError::Validation("campaign name is required".into()).into());
    }
    if request.game_system.trim().is_empty() {
        return Err(DomainError::Validation("game system is required".into()).into());
    }

    let campaign_id = state.ids.new_id();
    let mut event = base_event(&state, campaign_id, CAMPAIGN_CREATED, request.actor.as_ref());
    event.entity_type = Some("campaign".to_owned());
    event.entity_id = Some(campaign_id.to_string());
    event.payload = EventPayload::CampaignCreated(CampaignCreated {
        name: request.name,
        game_system: request.game_system,
        gm_mode: request.gm_mode.unwrap_or(GmMode::Human),
        theme: request.theme,
    })
    .encode();
    state.commit(event).await?;

    let campaign = state.load_campaign(campaign_id).await?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

/// GET /{campaign_id}
async fn get_campaign(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<Campaign>, ApiError> {
    Ok(Json(state.load_campaign(campaign_id).await?))
}

/// POST /{campaign_id}/status
async fn transition_status(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<Campaign>, ApiError> {
    let campaign = state.load_campaign(campaign_id).await?;

    // Validate against the state machine before anything is journaled.
    let mut preview = campaign.clone();
    preview.transition(request.status, state.clock.now())?;

    let mut event = base_event(
        &state,
        campaign_id,
        CAMPAIGN_STATUS_CHANGED,
        request.actor.as_ref(),
    );
    event.entity_type = Some("campaign".to_owned());
    event.entity_id = Some(campaign_id.to_string());
    event.payload = EventPayload::CampaignStatusChanged(CampaignStatusChanged {
        from: campaign.status,
        to: request.status,
    })
    .encode();
    state.commit(event).await?;

    Ok(Json(state.load_campaign(campaign_id).await?))
}

/// PATCH /{campaign_id} (guarded)
async fn update_campaign(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
    Json(request): Json<UpdateCampaignRequest>,
) -> Result<Json<Campaign>, ApiError> {
    let campaign = state.load_campaign(campaign_id).await?;
    campaign.ensure_allows(CampaignOperation::CampaignMutate)?;
    if request.name.is_none() && request.theme.is_none() {
        return Err(DomainError::Validation("nothing to update".into()).into());
    }

    let mut event = base_event(&state, campaign_id, CAMPAIGN_UPDATED, request.actor.as_ref());
    event.entity_type = Some("campaign".to_owned());
    event.entity_id = Some(campaign_id.to_string());
    event.payload = EventPayload::CampaignUpdated(CampaignUpdated {
        name: request.name,
        theme: request.theme,
    })
    .encode();
    state.commit(event).await?;

    Ok(Json(state.load_campaign(campaign_id).await?))
}

/// The campaign's continuity snapshot: GM fear plus per-character state.
#[derive(Debug, Serialize)]
struct SystemStateResponse {
    fear: Option<i32>,
    characters: Vec<CharacterState>,
}

/// GET /{campaign_id}/state
async fn get_system_state(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<SystemStateResponse>, ApiError> {
    state.load_campaign(campaign_id).await?;
    let fear = state
        .system_state
        .gm_state(campaign_id)
        .await?
        .map(|gm| gm.fear);
    let characters = state.system_state.list_character_states(campaign_id).await?;
    Ok(Json(SystemStateResponse { fear, characters }))
}

/// Returns the unguarded campaign routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_campaign))
        .route("/{campaign_id}", get(get_campaign))
        .route("/{campaign_id}/status", post(transition_status))
        .route("/{campaign_id}/state", get(get_system_state))
}

/// Returns the campaign routes behind the session write-lock.
pub fn guarded_router() -> Router<AppState> {
    Router::new().route("/{campaign_id}", patch(update_campaign))
}
