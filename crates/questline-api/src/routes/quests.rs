//! Routes for the quest log.

use axum::extract::{Path, State};
use axum::{Json, Router, routing::get, routing::post};
use questline_core::error::DomainError;
use questline_progression::application::query_handlers::{self, HudView, QuestLogView};
use questline_progression::domain::commands::{CompleteQuest, SetActive, SetProgress};
use questline_progression::domain::quest::find;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /progress.
#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    /// Requested progress; clamped to 0–100.
    pub progress: i64,
}

/// Response body returned after a quest command.
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    /// Whether the command changed anything.
    pub changed: bool,
    /// The quest log after the command.
    pub quest_log: QuestLogView,
}

/// GET /players/{player}/quests
#[instrument(skip(state))]
async fn get_quest_log(
    State(state): State<AppState>,
    Path(player): Path<String>,
) -> Result<Json<QuestLogView>, ApiError> {
    let session = state.session(&player).await?;
    let view = query_handlers::get_quest_log(&mut session.engine());
    Ok(Json(view))
}

/// GET /players/{player}/hud
#[instrument(skip(state))]
async fn get_hud(
    State(state): State<AppState>,
    Path(player): Path<String>,
) -> Result<Json<HudView>, ApiError> {
    let session = state.session(&player).await?;
    let view = query_handlers::get_hud(&mut session.engine());
    Ok(Json(view))
}

/// POST /players/{player}/quests/{quest}/activate
#[instrument(skip(state))]
async fn activate(
    State(state): State<AppState>,
    Path((player, quest)): Path<(String, String)>,
) -> Result<Json<CommandResponse>, ApiError> {
    let session = state.session(&player).await?;
    let mut engine = session.engine();
    if find(&engine.quests(), &quest).is_none() {
        return Err(DomainError::QuestNotFound(quest).into());
    }

    let command = SetActive {
        correlation_id: Uuid::new_v4(),
        quest_id: quest,
    };
    info!(correlation_id = %command.correlation_id, "handling set_active command");
    let changed = engine.handle_set_active(&command);

    Ok(Json(CommandResponse {
        changed,
        quest_log: query_handlers::get_quest_log(&mut engine),
    }))
}

/// POST /players/{player}/quests/{quest}/complete
#[instrument(skip(state))]
async fn complete(
    State(state): State<AppState>,
    Path((player, quest)): Path<(String, String)>,
) -> Result<Json<CommandResponse>, ApiError> {
    let session = state.session(&player).await?;
    let mut engine = session.engine();
    if find(&engine.quests(), &quest).is_none() {
        return Err(DomainError::QuestNotFound(quest).into());
    }

    let command = CompleteQuest::new(quest);
    info!(correlation_id = %command.correlation_id, "handling complete_quest command");
    let changed = engine.handle_complete_quest(&command);

    Ok(Json(CommandResponse {
        changed,
        quest_log: query_handlers::get_quest_log(&mut engine),
    }))
}

/// POST /players/{player}/quests/{quest}/progress
#[instrument(skip(state, request), fields(progress = request.progress))]
async fn set_progress(
    State(state): State<AppState>,
    Path((player, quest)): Path<(String, String)>,
    Json(request): Json<ProgressRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let session = state.session(&player).await?;
    let mut engine = session.engine();
    if find(&engine.quests(), &quest).is_none() {
        return Err(DomainError::QuestNotFound(quest).into());
    }

    let command = SetProgress {
        correlation_id: Uuid::new_v4(),
        quest_id: quest,
        progress: request.progress,
    };
    let changed = engine.handle_set_progress(&command);

    Ok(Json(CommandResponse {
        changed,
        quest_log: query_handlers::get_quest_log(&mut engine),
    }))
}

/// Returns the router for the quest log.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/players/{player}/quests", get(get_quest_log))
        .route("/players/{player}/hud", get(get_hud))
        .route("/players/{player}/quests/{quest}/activate", post(activate))
        .route("/players/{player}/quests/{quest}/complete", post(complete))
        .route("/players/{player}/quests/{quest}/progress", post(set_progress))
}
