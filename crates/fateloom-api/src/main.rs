//! Fateloom API server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use fateloom_api::error::AppError;
use fateloom_api::state::AppState;
use fateloom_core::clock::{Clock, SystemClock};
use fateloom_core::id::{IdGenerator, UuidGenerator};
use fateloom_journal::memory::MemoryJournal;
use fateloom_journal::pg::PgJournal;
use fateloom_journal::schema;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Fateloom campaign engine");

    // Read configuration from environment.
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let ids: Arc<dyn IdGenerator> = Arc::new(UuidGenerator);

    // With a database the journal is durable and projections are rebuilt by
    // replay before serving; without one everything lives in process memory.
    let state = match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(&database_url)
                .await?;
            sqlx::raw_sql(schema::CREATE_EVENTS_TABLE)
                .execute(&pool)
                .await?;
            let journal = Arc::new(PgJournal::new(pool));
            let campaign_ids = journal
                .campaign_ids()
                .await
                .map_err(|e| AppError::Rebuild(e.to_string()))?;
            let state = AppState::new(journal, clock, ids);

            let replayer = state.replayer();
            for campaign_id in campaign_ids {
                let last_seq = replayer
                    .replay_all(campaign_id)
                    .await
                    .map_err(|e| AppError::Rebuild(e.to_string()))?;
                tracing::debug!(%campaign_id, last_seq, "projections rebuilt");
            }
            state
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; journal and projections are in-memory only");
            AppState::new(Arc::new(MemoryJournal::new()), clock, ids)
        }
    };

    let app = fateloom_api::app(state);

    // Start server.
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
