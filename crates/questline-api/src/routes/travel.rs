//! Routes for the scene transition handoff.

use axum::extract::{Path, State};
use axum::{Json, Router, routing::post};
use questline_core::error::DomainError;
use questline_progression::application::query_handlers::{self, QuestLogView};
use questline_progression::domain::commands::{ArriveAtScene, BeginTravel};
use questline_progression::domain::travel::PendingTransition;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /travel/arrive.
#[derive(Debug, Deserialize)]
pub struct ArriveRequest {
    /// Scene the player arrived in.
    pub scene: String,
}

/// Response body for POST /travel/arrive.
#[derive(Debug, Serialize)]
pub struct ArriveResponse {
    /// Whether the arrival completed the travel quest.
    pub completed: bool,
    pub quest_log: QuestLogView,
}

/// POST /players/{player}/travel/begin
#[instrument(skip(state))]
async fn begin(
    State(state): State<AppState>,
    Path(player): Path<String>,
) -> Result<Json<PendingTransition>, ApiError> {
    let session = state.session(&player).await?;
    let mut engine = session.engine();

    let command = BeginTravel {
        correlation_id: Uuid::new_v4(),
    };
    info!(correlation_id = %command.correlation_id, "handling begin_travel command");
    engine
        .handle_begin_travel(&command)
        .map(Json)
        .ok_or_else(|| {
            DomainError::Validation(
                "travel needs an active travel quest and a chosen path".to_owned(),
            )
            .into()
        })
}

/// POST /players/{player}/travel/arrive
#[instrument(skip(state, request), fields(scene = %request.scene))]
async fn arrive(
    State(state): State<AppState>,
    Path(player): Path<String>,
    Json(request): Json<ArriveRequest>,
) -> Result<Json<ArriveResponse>, ApiError> {
    let session = state.session(&player).await?;
    let mut engine = session.engine();

    let command = ArriveAtScene {
        correlation_id: Uuid::new_v4(),
        scene: request.scene,
    };
    info!(correlation_id = %command.correlation_id, "handling arrive_at_scene command");
    let completed = engine.handle_arrive(&command);

    Ok(Json(ArriveResponse {
        completed,
        quest_log: query_handlers::get_quest_log(&mut engine),
    }))
}

/// Returns the router for travel.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/players/{player}/travel/begin", post(begin))
        .route("/players/{player}/travel/arrive", post(arrive))
}
