//! Dialogue session state and its rendered view.

use serde::Serialize;

/// Label of the option offered on nodes that declare no choices.
pub const CONTINUE_LABEL: &str = "Continue";

/// Where a dialogue session stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DialogueState {
    /// No dialogue is running.
    Closed,
    /// Showing `node_id` of `quest_id`'s dialogue.
    Open { quest_id: String, node_id: String },
    /// A completion waits for the player to acknowledge the ceremony.
    AwaitingCeremony {
        quest_id: String,
        node_id: String,
        /// Quest to activate after the deferred completion.
        follow_up: Option<String>,
        /// Node to show after the ceremony; `None` closes the session.
        then: Option<String>,
    },
}

impl DialogueState {
    /// Quest owning the session, if one is running.
    #[must_use]
    pub fn quest_id(&self) -> Option<&str> {
        match self {
            Self::Closed => None,
            Self::Open { quest_id, .. } | Self::AwaitingCeremony { quest_id, .. } => Some(quest_id),
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// What the dialogue panel shows for the current node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeView {
    pub quest_id: String,
    pub node_id: String,
    pub speaker: Option<String>,
    /// Node text with `{path}` rendered.
    pub text: String,
    /// Option labels, in order; never empty.
    pub choices: Vec<String>,
    /// `true` while the ceremony prompt is up.
    pub awaiting_ceremony: bool,
}
