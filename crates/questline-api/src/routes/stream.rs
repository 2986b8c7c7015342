//! WebSocket stream of quest-state-changed notifications.
//!
//! The first message is a snapshot of the quest log; every committed change
//! follows as its own message.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::{Router, routing::get};
use questline_core::event::DomainEvent;
use questline_progression::application::query_handlers;
use questline_progression::domain::events::QuestStateChanged;
use serde::Serialize;
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tracing::instrument;

use crate::error::ApiError;
use crate::session::PlayerSession;
use crate::state::AppState;

/// One message on the stream.
#[derive(Debug, Clone, Serialize)]
struct StreamMessage {
    #[serde(rename = "type")]
    message_type: &'static str,
    player_id: String,
    sequence_number: Option<u64>,
    payload: Value,
}

impl StreamMessage {
    fn snapshot(player_id: &str, payload: Value) -> Self {
        Self {
            message_type: "quest_log.snapshot",
            player_id: player_id.to_owned(),
            sequence_number: None,
            payload,
        }
    }

    fn changed(event: &QuestStateChanged) -> Self {
        Self {
            message_type: event.event_type(),
            player_id: event.metadata.player_id.clone(),
            sequence_number: Some(event.metadata.sequence_number),
            payload: event.to_payload(),
        }
    }

    fn lagged(player_id: &str, skipped: u64) -> Self {
        Self {
            message_type: "stream.lagged",
            player_id: player_id.to_owned(),
            sequence_number: None,
            payload: json!({ "skipped": skipped }),
        }
    }
}

/// GET /players/{player}/stream
#[instrument(skip(state, ws))]
async fn stream(
    State(state): State<AppState>,
    Path(player): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.session(&player).await?;
    let (snapshot, rx) = {
        let mut engine = session.engine();
        let view = query_handlers::get_quest_log(&mut engine);
        let payload = serde_json::to_value(&view).map_err(questline_core::error::DomainError::from)?;
        (StreamMessage::snapshot(&player, payload), engine.subscribe())
    };

    Ok(ws.on_upgrade(move |socket| stream_socket(socket, session, player, snapshot, rx)))
}

/// Holds `session` for as long as the socket is open so idle sweeps keep it.
async fn stream_socket(
    mut socket: WebSocket,
    session: Arc<PlayerSession>,
    player: String,
    snapshot: StreamMessage,
    mut rx: broadcast::Receiver<QuestStateChanged>,
) {
    if send_stream_message(&mut socket, &snapshot).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Ping(payload))) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_)) | Err(_)) | None => {
                        break;
                    }
                    _ => {}
                }
            }
            outgoing = rx.recv() => {
                let message = match outgoing {
                    Ok(event) => StreamMessage::changed(&event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(player_id = %player, skipped, "stream client lagged");
                        StreamMessage::lagged(&player, skipped)
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                if send_stream_message(&mut socket, &message).await.is_err() {
                    break;
                }
            }
        }
    }
    session.touch();
    tracing::debug!(player_id = %player, "stream closed");
}

async fn send_stream_message(
    socket: &mut WebSocket,
    message: &StreamMessage,
) -> Result<(), axum::Error> {
    let payload = serde_json::to_string(message).map_err(axum::Error::new)?;
    socket.send(Message::Text(payload.into())).await
}

/// Returns the router for the notification stream.
pub fn router() -> Router<AppState> {
    Router::new().route("/players/{player}/stream", get(stream))
}
