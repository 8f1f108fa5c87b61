//! Journal read routes: filtered listing and point lookups.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fateloom_core::event::{ActorType, Event};
use fateloom_core::journal::{EventFilter, EventOrder, EventPageRequest};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct ListEventsQuery {
    #[serde(default)]
    page_size: u32,
    #[serde(default)]
    page_token: Option<String>,
    #[serde(default)]
    order: Option<EventOrder>,
    /// Comma-separated event types.
    #[serde(default)]
    event_types: Option<String>,
    #[serde(default)]
    session_id: Option<Uuid>,
    #[serde(default)]
    actor_type: Option<ActorType>,
    #[serde(default)]
    domain: Option<String>,
}

#[derive(Debug, Serialize)]
struct EventPageResponse {
    events: Vec<Event>,
    total_count: i64,
    has_next: bool,
    has_prev: bool,
    next_page_token: Option<String>,
    prev_page_token: Option<String>,
}

/// GET /{campaign_id}/events
async fn list_events(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<EventPageResponse>, ApiError> {
    let filter = EventFilter {
        event_types: query
            .event_types
            .map(|types| {
                types
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default(),
        session_id: query.session_id,
        actor_type: query.actor_type,
        domain: query.domain,
    };
    let page = state
        .journal
        .list_page(&EventPageRequest {
            campaign_id,
            filter,
            order: query.order.unwrap_or_default(),
            page_size: query.page_size,
            page_token: query.page_token,
        })
        .await?;

    Ok(Json(EventPageResponse {
        events: page.events,
        total_count: page.total_count,
        has_next: page.has_next,
        has_prev: page.has_prev,
        next_page_token: page.next_token,
        prev_page_token: page.prev_token,
    }))
}

/// GET /{campaign_id}/events/{seq}
async fn get_event_by_seq(
    State(state): State<AppState>,
    Path((campaign_id, seq)): Path<(Uuid, i64)>,
) -> Result<Json<Event>, ApiError> {
    Ok(Json(state.journal.get_by_seq(campaign_id, seq).await?))
}

/// GET /{campaign_id}/events/hash/{hash}
async fn get_event_by_hash(
    State(state): State<AppState>,
    Path((campaign_id, hash)): Path<(Uuid, String)>,
) -> Result<Json<Event>, ApiError> {
    Ok(Json(state.journal.get_by_hash(campaign_id, &hash).await?))
}

/// Returns the journal read routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{campaign_id}/events", get(list_events))
        .route("/{campaign_id}/events/{seq}", get(get_event_by_seq))
        .route("/{campaign_id}/events/hash/{hash}", get(get_event_by_hash))
}
