//! Quest records as stored in the quest log document.

use serde::{Deserialize, Serialize};

/// Lifecycle of a quest.
///
/// Transitions only move forward (`Locked → Available → Active → Completed`)
/// except when the sanitizer relocks a quest whose prerequisites no longer
/// hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestStatus {
    /// Prerequisites not met.
    Locked,
    /// Can be started.
    Available,
    /// The one quest the player is pursuing.
    Active,
    /// Finished; terminal.
    Completed,
}

impl QuestStatus {
    /// Returns `true` for `Available` and `Active`, the statuses that require
    /// satisfied prerequisites.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Available | Self::Active)
    }
}

/// One entry of the quest log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    /// Quest identifier (e.g. `q_travel_home`).
    pub id: String,
    /// Display title.
    pub title: String,
    /// Display description, already rendered for the current path.
    #[serde(default)]
    pub description: String,
    /// Current status.
    pub status: QuestStatus,
    /// Display-only completion percentage, 0–100.
    #[serde(default)]
    pub progress: u8,
}

impl Quest {
    /// Maximum progress value.
    pub const MAX_PROGRESS: u8 = 100;

    /// Creates a quest record with zero progress.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        status: QuestStatus,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            status,
            progress: 0,
        }
    }

    /// Forces the quest back to `Locked` and clears its progress.
    pub fn relock(&mut self) {
        self.status = QuestStatus::Locked;
        self.progress = 0;
    }

    /// Marks the quest completed at full progress.
    pub fn mark_completed(&mut self) {
        self.status = QuestStatus::Completed;
        self.progress = Self::MAX_PROGRESS;
    }
}

/// Returns the quest with `id`, if present.
#[must_use]
pub fn find<'a>(quests: &'a [Quest], id: &str) -> Option<&'a Quest> {
    quests.iter().find(|q| q.id == id)
}

/// Returns the quest with `id` mutably, if present.
pub fn find_mut<'a>(quests: &'a mut [Quest], id: &str) -> Option<&'a mut Quest> {
    quests.iter_mut().find(|q| q.id == id)
}
