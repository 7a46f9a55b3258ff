pub mod associations;
pub mod db;
pub mod error;
pub mod identity;
pub mod models;
pub mod routes;
pub mod validation;

use axum::{Router, routing::get};
use sqlx::SqlitePool;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
}

async fn health() -> &'static str {
    "ok"
}

/// Build the full Axum application router.
///
/// Caller is responsible for running database migrations on `pool`
/// beforehand.
pub fn build_app(pool: SqlitePool) -> Router {
    let state = AppState { db: pool };

    Router::new()
        .route("/health", get(health))
        .merge(routes::recipes::router())
        .merge(routes::newsletters::router())
        .layer(
            TraceLayer::new_for_http()
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
