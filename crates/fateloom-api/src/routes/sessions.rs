//! Session lifecycle and in-session gameplay routes. None of these sit
//! behind the session write-lock; gameplay happens inside sessions.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use fateloom_core::campaign::CampaignOperation;
use fateloom_core::error::DomainError;
use fateloom_core::model::Session;
use fateloom_core::payload::{
    EventPayload, GM_FEAR_CHANGED, GmFearChanged, SESSION_ENDED, SESSION_STARTED, SessionEnded,
    SessionStarted,
};

use crate::error::ApiError;
use crate::routes::{ActorRef, base_event};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct StartSessionRequest {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    actor: Option<ActorRef>,
}

#[derive(Debug, Deserialize)]
struct EndSessionRequest {
    #[serde(default)]
    actor: Option<ActorRef>,
}

#[derive(Debug, Deserialize)]
struct FearRequest {
    fear: i32,
    #[serde(default)]
    actor: Option<ActorRef>,
}

/// POST /{campaign_id}/sessions
async fn start_session(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
    Json(request): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<Session>), ApiError> {
    let campaign = state.load_campaign(campaign_id).await?;
    campaign.ensure_allows(CampaignOperation::SessionStart)?;
    if let Some(active) = state.sessions.active(campaign_id).await? {
        return Err(DomainError::SessionActive {
            session_id: active.id,
        }
        .into());
    }

    let session_id = state.ids.new_id();
    let mut event = base_event(&state, campaign_id, SESSION_STARTED, request.actor.as_ref());
    event.session_id = Some(session_id);
    event.entity_type = Some("session".to_owned());
    event.entity_id = Some(session_id.to_string());
    event.payload = EventPayload::SessionStarted(SessionStarted {
        session_id,
        title: request.title,
    })
    .encode();
    state.commit(event).await?;

    let session = state
        .sessions
        .get(campaign_id, session_id)
        .await?
        .ok_or_else(|| DomainError::Infrastructure("session missing after apply".into()))?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// POST /{campaign_id}/sessions/{session_id}/end
async fn end_session(
    State(state): State<AppState>,
    Path((campaign_id, session_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<EndSessionRequest>,
) -> Result<Json<Session>, ApiError> {
    let session = state
        .sessions
        .get(campaign_id, session_id)
        .await?
        .ok_or_else(|| DomainError::NotFound {
            entity: "session",
            id: session_id.to_string(),
        })?;
    if session.is_ended() {
        return Err(
            DomainError::FailedPrecondition(format!("session {session_id} already ended")).into(),
        );
    }

    let mut event = base_event(&state, campaign_id, SESSION_ENDED, request.actor.as_ref());
    event.session_id = Some(session_id);
    event.entity_type = Some("session".to_owned());
    event.entity_id = Some(session_id.to_string());
    event.payload = EventPayload::SessionEnded(SessionEnded { session_id }).encode();
    state.commit(event).await?;

    let session = state
        .sessions
        .get(campaign_id, session_id)
        .await?
        .ok_or_else(|| DomainError::Infrastructure("session missing after apply".into()))?;
    Ok(Json(session))
}

/// POST /{campaign_id}/sessions/{session_id}/fear
async fn change_fear(
    State(state): State<AppState>,
    Path((campaign_id, session_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<FearRequest>,
) -> Result<StatusCode, ApiError> {
    let campaign = state.load_campaign(campaign_id).await?;
    campaign.ensure_allows(CampaignOperation::SessionAction)?;
    let session = state
        .sessions
        .get(campaign_id, session_id)
        .await?
        .ok_or_else(|| DomainError::NotFound {
            entity: "session",
            id: session_id.to_string(),
        })?;
    if session.is_ended() {
        return Err(
            DomainError::FailedPrecondition(format!("session {session_id} has ended")).into(),
        );
    }

    let mut event = base_event(&state, campaign_id, GM_FEAR_CHANGED, request.actor.as_ref());
    event.session_id = Some(session_id);
    event.payload = EventPayload::GmFearChanged(GmFearChanged { fear: request.fear }).encode();
    state.commit(event).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Returns the session routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{campaign_id}/sessions", post(start_session))
        .route("/{campaign_id}/sessions/{session_id}/end", post(end_session))
        .route("/{campaign_id}/sessions/{session_id}/fear", post(change_fear))
}
