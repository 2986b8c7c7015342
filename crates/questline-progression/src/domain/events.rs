//! Notifications broadcast by the Progression context.

use questline_core::event::{DomainEvent, EventMetadata};
use serde::{Deserialize, Serialize};

use super::quest::Quest;

/// Event type of [`QuestStateChanged`].
pub const QUEST_STATE_CHANGED_EVENT_TYPE: &str = "progression.quest_state_changed";

/// What caused a committed change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeCause {
    /// A quest was made the active one.
    QuestActivated {
        /// The activated quest.
        quest_id: String,
    },
    /// A quest was completed.
    QuestCompleted {
        /// The completed quest.
        quest_id: String,
    },
    /// Player variables were merged.
    VarsUpdated {
        /// Names of the variables written.
        keys: Vec<String>,
    },
    /// Display progress of a quest moved.
    ProgressUpdated {
        /// The quest.
        quest_id: String,
        /// New progress value.
        progress: u8,
    },
    /// The player set off towards `destination`.
    TravelStarted {
        /// Scene the pending transition points at.
        destination: String,
    },
    /// The pending transition to `destination` was consumed.
    TravelEnded {
        /// Scene the player arrived in.
        destination: String,
    },
    /// Catalog content was installed.
    ContentInstalled,
    /// A reconciliation pass repaired drift from another writer.
    Reconciled,
}

/// Broadcast after every committed mutation of a player's progression state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestStateChanged {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Why the state changed.
    pub cause: ChangeCause,
    /// Id of the active quest after the change.
    pub active_quest_id: Option<String>,
    /// Full quest log after the change.
    pub quests: Vec<Quest>,
    /// Destination of the pending transition after the change.
    #[serde(default)]
    pub travel_destination: Option<String>,
}

impl DomainEvent for QuestStateChanged {
    fn event_type(&self) -> &'static str {
        QUEST_STATE_CHANGED_EVENT_TYPE
    }

    fn to_payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
