//! Query handlers for the Progression context.
//!
//! Queries read the shared documents as they are; they never run the rules
//! or write anything back.

use serde::Serialize;

use crate::application::engine::ProgressionEngine;
use crate::domain::quest::{Quest, QuestStatus};
use crate::domain::vars::Vars;

/// Read-only view of a player's quest log.
#[derive(Debug, Clone, Serialize)]
pub struct QuestLogView {
    /// The player.
    pub player_id: String,
    /// Id of the active quest.
    pub active_quest_id: Option<String>,
    /// Every quest in log order.
    pub quests: Vec<Quest>,
    /// Destination of a pending scene transition.
    pub travel_destination: Option<String>,
}

/// What the quest HUD shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HudView {
    /// Active quest id.
    pub quest_id: Option<String>,
    /// Title, or an idle hint when nothing is active.
    pub title: String,
    pub description: String,
    pub progress: u8,
    /// Label for the travel button, when the player is en route.
    pub travel_label: Option<String>,
}

const IDLE_TITLE: &str = "No active quest";

/// Returns the quest log of the engine's player.
pub fn get_quest_log(engine: &mut ProgressionEngine) -> QuestLogView {
    let quests = engine.quests();
    let active_quest_id = quests
        .iter()
        .find(|q| q.status == QuestStatus::Active)
        .map(|q| q.id.clone());
    QuestLogView {
        player_id: engine.player_id().to_owned(),
        active_quest_id,
        quests,
        travel_destination: engine.travel_destination(),
    }
}

/// Returns the HUD projection of the active quest.
pub fn get_hud(engine: &mut ProgressionEngine) -> HudView {
    let travel_label = engine
        .travel_destination()
        .map(|destination| Vars::new().with("path", destination).render("Travel to {path}"));
    match engine.active_quest() {
        Some(quest) => HudView {
            quest_id: Some(quest.id),
            title: quest.title,
            description: quest.description,
            progress: quest.progress,
            travel_label,
        },
        None => HudView {
            quest_id: None,
            title: IDLE_TITLE.to_owned(),
            description: String::new(),
            progress: 0,
            travel_label,
        },
    }
}

/// Returns the player's variables.
pub fn get_vars(engine: &mut ProgressionEngine) -> Vars {
    engine.vars()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use questline_core::store::MemoryDocumentStore;
    use questline_test_support::{FixedClock, RecordingInventory};
    use uuid::Uuid;

    use super::*;
    use crate::domain::commands::{BeginTravel, SetVars};
    use crate::domain::rules::{RuleBook, ids};

    fn engine() -> ProgressionEngine {
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap());
        ProgressionEngine::new(
            "player-1",
            Arc::new(MemoryDocumentStore::new()),
            RuleBook::builtin(),
            Arc::new(clock),
            Arc::new(RecordingInventory::new()),
        )
    }

    #[test]
    fn test_quest_log_of_unseeded_player_is_empty() {
        let mut engine = engine();

        let view = get_quest_log(&mut engine);

        assert_eq!(view.player_id, "player-1");
        assert!(view.quests.is_empty());
        assert!(view.active_quest_id.is_none());
    }

    #[test]
    fn test_quest_log_reports_active_quest_and_destination() {
        // Arrange
        let mut engine = engine();
        engine.handle_set_vars(&SetVars::new(Vars::new().with("path", "dreadheim")));
        engine.handle_begin_travel(&BeginTravel {
            correlation_id: Uuid::new_v4(),
        });

        // Act
        let view = get_quest_log(&mut engine);

        // Assert
        assert_eq!(view.active_quest_id.as_deref(), Some(ids::TRAVEL_HOME));
        assert_eq!(view.travel_destination.as_deref(), Some("dreadheim"));
        assert_eq!(view.quests.len(), RuleBook::builtin().rules.len());
    }

    #[test]
    fn test_hud_shows_active_quest_and_travel_label() {
        // Arrange
        let mut engine = engine();
        engine.handle_set_vars(&SetVars::new(Vars::new().with("path", "dreadheim")));
        engine.handle_begin_travel(&BeginTravel {
            correlation_id: Uuid::new_v4(),
        });

        // Act
        let hud = get_hud(&mut engine);

        // Assert
        assert_eq!(hud.quest_id.as_deref(), Some(ids::TRAVEL_HOME));
        assert_eq!(hud.title, "Journey Home");
        assert_eq!(hud.travel_label.as_deref(), Some("Travel to Dreadheim"));
    }

    #[test]
    fn test_hud_is_idle_without_active_quest() {
        let mut engine = engine();

        let hud = get_hud(&mut engine);

        assert_eq!(hud.title, IDLE_TITLE);
        assert!(hud.quest_id.is_none());
        assert!(hud.travel_label.is_none());
    }
}
