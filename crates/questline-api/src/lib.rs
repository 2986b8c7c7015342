//! Questline — HTTP API.
//!
//! Exposes each player's progression engine and dialogue session over
//! JSON routes, plus a WebSocket stream of quest-state-changed
//! notifications.

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod routes;
pub mod session;
pub mod state;

use state::AppState;

/// Builds the full application router.
pub fn build_router(state: AppState) -> Router {
    // TODO: Replace CorsLayer::permissive() with the game client's origin once it is deployed.
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
