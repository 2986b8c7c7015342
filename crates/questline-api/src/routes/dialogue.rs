//! Routes for the dialogue session.

use axum::extract::{Path, State};
use axum::{Json, Router, routing::get, routing::post};
use questline_dialogue::domain::session::{DialogueState, NodeView};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /dialogue/run.
#[derive(Debug, Deserialize)]
pub struct RunRequest {
    /// Quest whose dialogue to open.
    pub quest_id: String,
}

/// Request body for POST /dialogue/choose.
#[derive(Debug, Deserialize)]
pub struct ChooseRequest {
    /// Zero-based option index.
    pub choice: usize,
}

/// Response body for every dialogue route.
#[derive(Debug, Serialize)]
pub struct DialogueResponse {
    pub state: DialogueState,
    /// Current node; absent once the session closed.
    pub view: Option<NodeView>,
}

/// GET /players/{player}/dialogue
#[instrument(skip(state))]
async fn current(
    State(state): State<AppState>,
    Path(player): Path<String>,
) -> Result<Json<DialogueResponse>, ApiError> {
    let session = state.session(&player).await?;
    let dialogue = session.dialogue();
    let vars = session.engine().vars();
    Ok(Json(DialogueResponse {
        state: dialogue.state().clone(),
        view: dialogue.view(&vars),
    }))
}

/// POST /players/{player}/dialogue/run
#[instrument(skip(state, request), fields(quest_id = %request.quest_id))]
async fn run(
    State(state): State<AppState>,
    Path(player): Path<String>,
    Json(request): Json<RunRequest>,
) -> Result<Json<DialogueResponse>, ApiError> {
    let session = state.session(&player).await?;
    let mut dialogue = session.dialogue();
    let vars = session.engine().vars();

    let view = dialogue.run(&request.quest_id, &vars)?;
    Ok(Json(DialogueResponse {
        state: dialogue.state().clone(),
        view: Some(view),
    }))
}

/// POST /players/{player}/dialogue/choose
#[instrument(skip(state, request), fields(choice = request.choice))]
async fn choose(
    State(state): State<AppState>,
    Path(player): Path<String>,
    Json(request): Json<ChooseRequest>,
) -> Result<Json<DialogueResponse>, ApiError> {
    let session = state.session(&player).await?;
    let mut dialogue = session.dialogue();
    let mut engine = session.engine();

    let view = dialogue.choose(request.choice, &mut engine)?;
    Ok(Json(DialogueResponse {
        state: dialogue.state().clone(),
        view,
    }))
}

/// POST /players/{player}/dialogue/ceremony
#[instrument(skip(state))]
async fn acknowledge_ceremony(
    State(state): State<AppState>,
    Path(player): Path<String>,
) -> Result<Json<DialogueResponse>, ApiError> {
    let session = state.session(&player).await?;
    let mut dialogue = session.dialogue();
    let mut engine = session.engine();

    info!("ceremony acknowledged by player");
    let view = dialogue.acknowledge_ceremony(&mut engine)?;
    Ok(Json(DialogueResponse {
        state: dialogue.state().clone(),
        view,
    }))
}

/// POST /players/{player}/dialogue/close
#[instrument(skip(state))]
async fn close(
    State(state): State<AppState>,
    Path(player): Path<String>,
) -> Result<Json<DialogueResponse>, ApiError> {
    let session = state.session(&player).await?;
    let mut dialogue = session.dialogue();
    dialogue.close();
    Ok(Json(DialogueResponse {
        state: dialogue.state().clone(),
        view: None,
    }))
}

/// Returns the router for dialogue sessions.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/players/{player}/dialogue", get(current))
        .route("/players/{player}/dialogue/run", post(run))
        .route("/players/{player}/dialogue/choose", post(choose))
        .route("/players/{player}/dialogue/ceremony", post(acknowledge_ceremony))
        .route("/players/{player}/dialogue/close", post(close))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::state::test_support::{app_state_without_catalog, test_app_state};

    async fn call(state: &AppState, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method("POST").uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = router().with_state(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_run_and_choose_path() {
        // Arrange
        let state = test_app_state();

        // Act
        let (run_status, opened) = call(
            &state,
            "/players/p1/dialogue/run",
            Some(json!({ "quest_id": "q_choose_path" })),
        )
        .await;
        let (_, middle) = call(&state, "/players/p1/dialogue/choose", Some(json!({ "choice": 0 }))).await;
        let (_, finished) =
            call(&state, "/players/p1/dialogue/choose", Some(json!({ "choice": 0 }))).await;

        // Assert
        assert_eq!(run_status, StatusCode::OK);
        assert_eq!(opened["view"]["speaker"], "Seer");
        assert_eq!(opened["state"]["state"], "open");
        assert_eq!(middle["view"]["node_id"], "dreadheim");
        assert_eq!(finished["state"]["state"], "closed");
        assert_eq!(finished["view"], Value::Null);
        let session = state.session("p1").await.unwrap();
        assert_eq!(
            session.engine().active_quest().unwrap().id,
            "q_travel_home"
        );
    }

    #[tokio::test]
    async fn test_run_without_catalog_returns_404() {
        let state = app_state_without_catalog();

        let (status, json) = call(
            &state,
            "/players/p1/dialogue/run",
            Some(json!({ "quest_id": "q_choose_path" })),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "dialogue_not_found");
    }

    #[tokio::test]
    async fn test_choose_without_open_dialogue_returns_400() {
        let state = test_app_state();

        let (status, json) =
            call(&state, "/players/p1/dialogue/choose", Some(json!({ "choice": 0 }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_close_is_always_ok() {
        let state = test_app_state();

        let (status, json) = call(&state, "/players/p1/dialogue/close", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["state"]["state"], "closed");
    }

    #[tokio::test]
    async fn test_ceremony_without_pending_completion_returns_400() {
        let state = test_app_state();

        let (status, _) = call(&state, "/players/p1/dialogue/ceremony", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
