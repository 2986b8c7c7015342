//! Domain error types.

use thiserror::Error;

/// Workspace-wide domain error.
///
/// Engine operations never surface these to the host UI; they appear at the
/// internal seams (document store, catalog source, dialogue input) and are
/// logged where the engine absorbs them.
#[derive(Debug, Error)]
pub enum DomainError {
    /// No quest with the given id exists in the quest log or rule book.
    #[error("quest not found: {0}")]
    QuestNotFound(String),

    /// The catalog holds no dialogue for the given quest.
    #[error("dialogue not found for quest: {0}")]
    DialogueNotFound(String),

    /// Caller input was rejected (bad choice index, closed session, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// Storage, network or decoding failure.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::Infrastructure(format!("json error: {err}"))
    }
}
