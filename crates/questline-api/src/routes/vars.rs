//! Routes for player variables.

use axum::extract::{Path, State};
use axum::{Json, Router, routing::get};
use questline_progression::application::query_handlers;
use questline_progression::domain::commands::SetVars;
use questline_progression::domain::vars::Vars;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /vars.
#[derive(Debug, Deserialize)]
pub struct SetVarsRequest {
    /// Variables to merge.
    pub vars: Vars,
}

/// Response body for the variable routes.
#[derive(Debug, Serialize)]
pub struct VarsResponse {
    /// Whether the request changed anything.
    pub changed: bool,
    /// Every variable after the request.
    pub vars: Vars,
    /// Active quest after the rules ran.
    pub active_quest_id: Option<String>,
}

/// GET /players/{player}/vars
#[instrument(skip(state))]
async fn get_vars(
    State(state): State<AppState>,
    Path(player): Path<String>,
) -> Result<Json<VarsResponse>, ApiError> {
    let session = state.session(&player).await?;
    let mut engine = session.engine();
    Ok(Json(VarsResponse {
        changed: false,
        vars: query_handlers::get_vars(&mut engine),
        active_quest_id: engine.active_quest().map(|q| q.id),
    }))
}

/// POST /players/{player}/vars
#[instrument(skip(state, request), fields(keys = request.vars.keys().count()))]
async fn set_vars(
    State(state): State<AppState>,
    Path(player): Path<String>,
    Json(request): Json<SetVarsRequest>,
) -> Result<Json<VarsResponse>, ApiError> {
    let session = state.session(&player).await?;
    let mut engine = session.engine();

    let command = SetVars {
        correlation_id: Uuid::new_v4(),
        vars: request.vars,
    };
    info!(correlation_id = %command.correlation_id, "handling set_vars command");
    let changed = engine.handle_set_vars(&command);

    Ok(Json(VarsResponse {
        changed,
        vars: query_handlers::get_vars(&mut engine),
        active_quest_id: engine.active_quest().map(|q| q.id),
    }))
}

/// Returns the router for player variables.
pub fn router() -> Router<AppState> {
    Router::new().route("/players/{player}/vars", get(get_vars).post(set_vars))
}
