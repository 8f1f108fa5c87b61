//! Fateloom API — HTTP boundary for the campaign engine.

use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod guard;
pub mod routes;
pub mod state;

use state::AppState;

/// Builds the full application router.
///
/// Campaign-shape mutators sit behind the session write-lock; session
/// lifecycle and in-session gameplay flow through the unguarded paths.
#[must_use]
pub fn app(state: AppState) -> Router {
    let guarded = Router::new()
        .merge(routes::campaigns::guarded_router())
        .merge(routes::participants::router())
        .merge(routes::characters::guarded_router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::session_write_lock,
        ));

    let campaign_scoped = Router::new()
        .merge(routes::campaigns::router())
        .merge(routes::events::router())
        .merge(routes::sessions::router())
        .merge(routes::characters::router())
        .merge(routes::forks::router())
        .merge(guarded);

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/campaigns", campaign_scoped)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
