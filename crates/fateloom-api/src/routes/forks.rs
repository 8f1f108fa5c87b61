//! Fork and lineage routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fateloom_core::campaign::Campaign;
use fateloom_core::error::DomainError;
use fateloom_core::event::ActorType;
use fateloom_core::model::Lineage;
use fateloom_fork::{ForkPoint, ForkRequest};

use crate::error::ApiError;
use crate::routes::ActorRef;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct ForkCampaignRequest {
    name: String,
    /// Explicit fork sequence; 0 or absent means "at the latest event".
    #[serde(default)]
    fork_seq: Option<i64>,
    /// Fork at the end of this session instead of at a sequence.
    #[serde(default)]
    session_id: Option<Uuid>,
    #[serde(default)]
    copy_participants: bool,
    #[serde(default)]
    actor: Option<ActorRef>,
    #[serde(default)]
    request_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ForkCampaignResponse {
    campaign: Campaign,
    lineage: Lineage,
    fork_event_seq: i64,
}

/// POST /{campaign_id}/fork
async fn fork_campaign(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
    Json(request): Json<ForkCampaignRequest>,
) -> Result<(StatusCode, Json<ForkCampaignResponse>), ApiError> {
    let fork_point = match (request.fork_seq, request.session_id) {
        (Some(_), Some(_)) => {
            return Err(DomainError::Validation(
                "specify either a fork sequence or a session, not both".into(),
            )
            .into());
        }
        (None, Some(session_id)) => ForkPoint::AtSessionEnd(session_id),
        (seq, None) => ForkPoint::AtSequence(seq.unwrap_or(0)),
    };

    let outcome = state
        .fork
        .fork(&ForkRequest {
            source_campaign_id: campaign_id,
            fork_point,
            name: request.name,
            copy_participants: request.copy_participants,
            actor_type: request
                .actor
                .as_ref()
                .map_or(ActorType::System, |a| a.actor_type),
            actor_id: request.actor.as_ref().and_then(|a| a.actor_id.clone()),
            request_id: request.request_id,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ForkCampaignResponse {
            campaign: outcome.campaign,
            lineage: outcome.lineage,
            fork_event_seq: outcome.fork_event_seq,
        }),
    ))
}

/// GET /{campaign_id}/lineage
async fn get_lineage(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<Lineage>, ApiError> {
    Ok(Json(state.fork.lineage(campaign_id).await?))
}

/// GET /{campaign_id}/forks
async fn list_forks(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<Vec<Lineage>>, ApiError> {
    Ok(Json(state.fork.list_forks(campaign_id).await?))
}

/// Returns the fork routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{campaign_id}/fork", post(fork_campaign))
        .route("/{campaign_id}/lineage", get(get_lineage))
        .route("/{campaign_id}/forks", get(list_forks))
}
