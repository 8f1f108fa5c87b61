//! Session write-lock middleware.
//!
//! Campaign-shape mutations are only allowed between sessions. The guard
//! extracts the campaign id from the request path and rejects when an
//! active session exists, naming that session. Check-then-act: a session
//! starting between this check and the handler's own writes slips through;
//! a documented gap, not a sequence-integrity mechanism.

use axum::extract::{RawPathParams, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use fateloom_core::error::DomainError;

use crate::error::ApiError;
use crate::state::AppState;

/// Rejects guarded mutations while the campaign has an active session.
pub async fn session_write_lock(
    State(state): State<AppState>,
    params: RawPathParams,
    request: Request,
    next: Next,
) -> Response {
    let campaign_id = params
        .iter()
        .find(|(name, _)| *name == "campaign_id")
        .and_then(|(_, value)| Uuid::parse_str(value).ok());
    if let Some(campaign_id) = campaign_id {
        match state.sessions.active(campaign_id).await {
            Ok(Some(session)) => {
                return ApiError(DomainError::SessionActive {
                    session_id: session.id,
                })
                .into_response();
            }
            Ok(None) => {}
            Err(err) => return ApiError(err).into_response(),
        }
    }
    next.run(request).await
}
