//! Route modules organized by bounded context.

use axum::Router;

use crate::state::AppState;

pub mod dialogue;
pub mod health;
pub mod inventory;
pub mod quests;
pub mod stream;
pub mod travel;
pub mod vars;

/// Every player-scoped route, to be nested under `/api/v1`.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(quests::router())
        .merge(vars::router())
        .merge(travel::router())
        .merge(dialogue::router())
        .merge(inventory::router())
        .merge(stream::router())
}
