//! Participant routes. All of these are campaign-shape mutations and sit
//! behind the session write-lock.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use fateloom_core::campaign::CampaignOperation;
use fateloom_core::error::DomainError;
use fateloom_core::model::Participant;
use fateloom_core::payload::{
    EventPayload, PARTICIPANT_JOINED, PARTICIPANT_LEFT, PARTICIPANT_UPDATED, ParticipantJoined,
    ParticipantLeft, ParticipantUpdated,
};

use crate::error::ApiError;
use crate::routes::{ActorRef, base_event};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct JoinRequest {
    display_name: String,
    #[serde(default)]
    actor: Option<ActorRef>,
}

#[derive(Debug, Deserialize)]
struct UpdateParticipantRequest {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    actor: Option<ActorRef>,
}

#[derive(Debug, Deserialize)]
struct LeaveRequest {
    #[serde(default)]
    actor: Option<ActorRef>,
}

async fn load_participant(
    state: &AppState,
    campaign_id: Uuid,
    participant_id: Uuid,
) -> Result<Participant, DomainError> {
    state
        .participants
        .get(campaign_id, participant_id)
        .await?
        .ok_or_else(|| DomainError::NotFound {
            entity: "participant",
            id: participant_id.to_string(),
        })
}

/// POST /{campaign_id}/participants
async fn join(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
    Json(request): Json<JoinRequest>,
) -> Result<(StatusCode, Json<Participant>), ApiError> {
    let campaign = state.load_campaign(campaign_id).await?;
    campaign.ensure_allows(CampaignOperation::CampaignMutate)?;
    if request.display_name.trim().is_empty() {
        return Err(DomainError::Validation("display name is required".into()).into());
    }

    let participant_id = state.ids.new_id();
    let mut event = base_event(&state, campaign_id, PARTICIPANT_JOINED, request.actor.as_ref());
    event.entity_type = Some("participant".to_owned());
    event.entity_id = Some(participant_id.to_string());
    event.payload = EventPayload::ParticipantJoined(ParticipantJoined {
        participant_id,
        display_name: request.display_name,
    })
    .encode();
    state.commit(event).await?;

    let participant = load_participant(&state, campaign_id, participant_id).await?;
    Ok((StatusCode::CREATED, Json(participant)))
}

/// PATCH /{campaign_id}/participants/{participant_id}
async fn update(
    State(state): State<AppState>,
    Path((campaign_id, participant_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateParticipantRequest>,
) -> Result<Json<Participant>, ApiError> {
    let campaign = state.load_campaign(campaign_id).await?;
    campaign.ensure_allows(CampaignOperation::CampaignMutate)?;
    load_participant(&state, campaign_id, participant_id).await?;

    let mut event = base_event(&state, campaign_id, PARTICIPANT_UPDATED, request.actor.as_ref());
    event.entity_type = Some("participant".to_owned());
    event.entity_id = Some(participant_id.to_string());
    event.payload = EventPayload::ParticipantUpdated(ParticipantUpdated {
        participant_id,
        display_name: request.display_name,
    })
    .encode();
    state.commit(event).await?;

    let participant = load_participant(&state, campaign_id, participant_id).await?;
    Ok(Json(participant))
}

/// DELETE /{campaign_id}/participants/{participant_id}
async fn leave(
    State(state): State<AppState>,
    Path((campaign_id, participant_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<LeaveRequest>,
) -> Result<StatusCode, ApiError> {
    let campaign = state.load_campaign(campaign_id).await?;
    campaign.ensure_allows(CampaignOperation::CampaignMutate)?;
    load_participant(&state, campaign_id, participant_id).await?;

    let mut event = base_event(&state, campaign_id, PARTICIPANT_LEFT, request.actor.as_ref());
    event.entity_type = Some("participant".to_owned());
    event.entity_id = Some(participant_id.to_string());
    event.payload = EventPayload::ParticipantLeft(ParticipantLeft { participant_id }).encode();
    state.commit(event).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Returns the participant routes (all guarded).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{campaign_id}/participants", post(join))
        .route(
            "/{campaign_id}/participants/{participant_id}",
            patch(update).delete(leave),
        )
}
