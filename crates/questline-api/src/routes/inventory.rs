//! Route for the player's reward bag.

use axum::extract::{Path, State};
use axum::{Json, Router, routing::get};
use questline_inventory::domain::bag::ItemStack;
use tracing::instrument;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /players/{player}/inventory
#[instrument(skip(state))]
async fn get_inventory(
    State(state): State<AppState>,
    Path(player): Path<String>,
) -> Result<Json<Vec<ItemStack>>, ApiError> {
    let session = state.session(&player).await?;
    Ok(Json(session.inventory().stacks()))
}

/// Returns the router for the inventory.
pub fn router() -> Router<AppState> {
    Router::new().route("/players/{player}/inventory", get(get_inventory))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use questline_progression::domain::commands::{CompleteQuest, SetVars};
    use questline_progression::domain::vars::Vars;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::state::test_support::test_app_state;

    #[tokio::test]
    async fn test_inventory_lists_granted_rewards() {
        // Arrange: reach and complete the elder's quest.
        let state = test_app_state();
        let session = state.session("p1").await.unwrap();
        {
            let mut engine = session.engine();
            engine.handle_set_vars(&SetVars::new(Vars::new().with("path", "dreadheim")));
            engine.handle_complete_quest(&CompleteQuest::new("q_travel_home"));
            engine.handle_complete_quest(&CompleteQuest::new("q_meet_elder"));
        }
        let request = Request::builder()
            .uri("/players/p1/inventory")
            .body(Body::empty())
            .unwrap();

        // Act
        let response = router().with_state(state).oneshot(request).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        let items = json.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["item_id"], "elder_token");
        assert_eq!(items[0]["qty"], 1);
    }
}
