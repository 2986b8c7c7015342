//! Command handlers for the Progression context.
//!
//! Every handler is total: unknown ids and disallowed transitions are
//! logged and reported as `false`, never as errors.

use questline_core::command::Command;

use crate::application::engine::ProgressionEngine;
use crate::domain::commands::{CompleteQuest, Reconcile, SetActive, SetProgress, SetVars};
use crate::domain::events::ChangeCause;
use crate::domain::quest::{Quest, QuestStatus, find, find_mut};
use crate::domain::sanitizer::prerequisites_met;

impl ProgressionEngine {
    /// Makes `quest_id` the active quest. Any other active quest drops back
    /// to `Available`. Only an `Available` (or already `Active`) quest can be
    /// activated.
    ///
    /// Returns `true` if the quest log changed.
    pub fn handle_set_active(&mut self, command: &SetActive) -> bool {
        let quest_id = command.quest_id.clone();
        tracing::debug!(
            command = command.command_type(),
            correlation_id = %command.correlation_id(),
            quest_id = %quest_id,
            "handling command"
        );
        let cause = ChangeCause::QuestActivated {
            quest_id: quest_id.clone(),
        };
        self.commit(command.correlation_id, cause, false, |quests, _| {
            match find(quests, &quest_id).map(|q| q.status) {
                None => {
                    tracing::debug!(quest_id = %quest_id, "set_active on unknown quest ignored");
                    false
                }
                Some(QuestStatus::Active) => false,
                Some(status @ (QuestStatus::Locked | QuestStatus::Completed)) => {
                    tracing::debug!(quest_id = %quest_id, ?status, "quest cannot be activated");
                    false
                }
                Some(QuestStatus::Available) => {
                    activate(quests, &quest_id);
                    true
                }
            }
        })
    }

    /// Completes `quest_id` at full progress, unlocks its declared successor
    /// and, if the command names one, activates the follow-up quest.
    ///
    /// Completing an already completed, locked or unknown quest does nothing,
    /// so rewards are granted at most once.
    pub fn handle_complete_quest(&mut self, command: &CompleteQuest) -> bool {
        let quest_id = command.quest_id.clone();
        tracing::debug!(
            command = command.command_type(),
            correlation_id = %command.correlation_id(),
            quest_id = %quest_id,
            "handling command"
        );
        let successor = self.rules().rule(&quest_id).and_then(|r| r.next.clone());
        let successor_rule = successor
            .as_deref()
            .and_then(|id| self.rules().rule(id).cloned());
        let cause = ChangeCause::QuestCompleted {
            quest_id: quest_id.clone(),
        };

        let completed = self.commit(command.correlation_id, cause, false, |quests, vars| {
            let Some(quest) = find_mut(quests, &quest_id) else {
                tracing::debug!(quest_id = %quest_id, "complete on unknown quest ignored");
                return false;
            };
            if !quest.status.is_open() {
                tracing::debug!(quest_id = %quest_id, status = ?quest.status, "quest cannot be completed");
                return false;
            }
            quest.mark_completed();

            if let Some(rule) = successor_rule {
                let unlock = prerequisites_met(&rule, vars, quests);
                if let Some(next) = find_mut(quests, &rule.id)
                    && unlock
                    && next.status == QuestStatus::Locked
                {
                    next.status = QuestStatus::Available;
                }
            }
            true
        });

        if completed && let Some(next) = &command.next {
            self.handle_set_active(&SetActive {
                correlation_id: command.correlation_id,
                quest_id: next.clone(),
            });
        }
        completed
    }

    /// Merges variables and re-evaluates the rules.
    ///
    /// Returns `true` if a variable or the quest log changed.
    pub fn handle_set_vars(&mut self, command: &SetVars) -> bool {
        tracing::debug!(
            command = command.command_type(),
            correlation_id = %command.correlation_id(),
            keys = ?command.vars.keys().collect::<Vec<_>>(),
            "handling command"
        );
        if command.vars.is_empty() {
            tracing::debug!("empty variable update ignored");
            return false;
        }
        let mut merged = self.vars();
        let vars_changed = merged.merge(&command.vars);
        if vars_changed {
            let store = self.store();
            self.documents.vars.write(store.as_ref(), &merged);
        }
        let cause = ChangeCause::VarsUpdated {
            keys: command.vars.keys().map(str::to_owned).collect(),
        };
        self.commit(command.correlation_id, cause, vars_changed, |_, _| true)
    }

    /// Sets the display progress of an open quest, clamped to 0–100.
    pub fn handle_set_progress(&mut self, command: &SetProgress) -> bool {
        let quest_id = command.quest_id.clone();
        let progress = u8::try_from(command.progress.clamp(0, i64::from(Quest::MAX_PROGRESS)))
            .unwrap_or(Quest::MAX_PROGRESS);
        let cause = ChangeCause::ProgressUpdated {
            quest_id: quest_id.clone(),
            progress,
        };
        self.commit(command.correlation_id, cause, false, |quests, _| {
            match find_mut(quests, &quest_id) {
                Some(quest) if quest.status.is_open() && quest.progress != progress => {
                    quest.progress = progress;
                    true
                }
                _ => false,
            }
        })
    }

    /// Re-applies the rules to absorb writes made by other sessions.
    pub fn handle_reconcile(&mut self, command: &Reconcile) -> bool {
        let repaired = self.commit(command.correlation_id, ChangeCause::Reconciled, false, |_, _| {
            true
        });
        if repaired {
            tracing::info!(player_id = %self.player_id(), "reconciliation repaired drift");
        }
        repaired
    }
}

fn activate(quests: &mut [Quest], quest_id: &str) {
    for quest in quests.iter_mut() {
        if quest.id == quest_id {
            quest.status = QuestStatus::Active;
        } else if quest.status == QuestStatus::Active {
            quest.status = QuestStatus::Available;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use questline_core::store::{DocumentKey, DocumentKind, DocumentStore, MemoryDocumentStore};
    use questline_inventory::domain::rewards::{RewardBundle, RewardItem};
    use questline_test_support::{FailingDocumentStore, FixedClock, RecordingInventory};

    use super::*;
    use crate::domain::content::{QuestContent, QuestText};
    use crate::domain::rules::{RuleBook, ids};
    use crate::domain::vars::Vars;

    fn engine_with(
        store: Arc<dyn DocumentStore>,
        inventory: Arc<RecordingInventory>,
    ) -> ProgressionEngine {
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap());
        ProgressionEngine::new(
            "player-1",
            store,
            RuleBook::builtin(),
            Arc::new(clock),
            inventory,
        )
    }

    fn engine() -> (ProgressionEngine, Arc<RecordingInventory>) {
        let inventory = Arc::new(RecordingInventory::new());
        let engine = engine_with(Arc::new(MemoryDocumentStore::new()), Arc::clone(&inventory));
        (engine, inventory)
    }

    fn status(engine: &mut ProgressionEngine, id: &str) -> QuestStatus {
        find(&engine.quests(), id).unwrap().status
    }

    fn choose_dreadheim(engine: &mut ProgressionEngine) {
        engine.handle_set_vars(&SetVars::new(Vars::new().with("path", "dreadheim")));
    }

    fn oath_rewards() -> QuestContent {
        QuestContent::new(vec![QuestText {
            id: ids::TRAVEL_HOME.to_owned(),
            title: None,
            description: None,
            rewards: RewardBundle {
                items: vec![RewardItem {
                    id: "travel_cloak".to_owned(),
                    name: "Travel Cloak".to_owned(),
                    image: "/img/cloak.png".to_owned(),
                    qty: 1,
                }],
            },
        }])
    }

    #[test]
    fn test_fresh_reconcile_seeds_single_available_quest() {
        // Arrange
        let (mut engine, _) = engine();

        // Act
        let changed = engine.handle_reconcile(&Reconcile::new());

        // Assert
        assert!(changed);
        let quests = engine.quests();
        let available: Vec<_> = quests
            .iter()
            .filter(|q| q.status == QuestStatus::Available)
            .map(|q| q.id.as_str())
            .collect();
        assert_eq!(available, vec![ids::CHOOSE_PATH]);
        assert!(engine.active_quest().is_none());
    }

    #[test]
    fn test_set_vars_path_activates_travel_quest() {
        // Arrange
        let (mut engine, _) = engine();
        let mut notifications = engine.subscribe();

        // Act
        choose_dreadheim(&mut engine);

        // Assert
        assert_eq!(status(&mut engine, ids::CHOOSE_PATH), QuestStatus::Completed);
        let active = engine.active_quest().unwrap();
        assert_eq!(active.id, ids::TRAVEL_HOME);
        assert!(active.description.contains("Dreadheim"));

        let event = notifications.try_recv().unwrap();
        assert_eq!(event.metadata.player_id, "player-1");
        assert_eq!(event.metadata.sequence_number, 1);
        assert_eq!(event.active_quest_id.as_deref(), Some(ids::TRAVEL_HOME));
        assert_eq!(
            event.cause,
            ChangeCause::VarsUpdated {
                keys: vec!["path".to_owned()]
            }
        );
    }

    #[test]
    fn test_complete_travel_unlocks_and_advances_successor() {
        // Arrange
        let (mut engine, _) = engine();
        choose_dreadheim(&mut engine);

        // Act
        let completed = engine.handle_complete_quest(&CompleteQuest::new(ids::TRAVEL_HOME));

        // Assert
        assert!(completed);
        let travel = find(&engine.quests(), ids::TRAVEL_HOME).cloned().unwrap();
        assert_eq!(travel.status, QuestStatus::Completed);
        assert_eq!(travel.progress, 100);
        assert_eq!(status(&mut engine, ids::MEET_ELDER), QuestStatus::Active);
    }

    #[test]
    fn test_complete_twice_grants_rewards_once() {
        // Arrange
        let (mut engine, inventory) = engine();
        engine.install_content(oath_rewards());
        choose_dreadheim(&mut engine);

        // Act
        let first = engine.handle_complete_quest(&CompleteQuest::new(ids::TRAVEL_HOME));
        let snapshot = engine.quests();
        let second = engine.handle_complete_quest(&CompleteQuest::new(ids::TRAVEL_HOME));

        // Assert
        assert!(first);
        assert!(!second);
        assert_eq!(engine.quests(), snapshot);
        assert_eq!(inventory.added().len(), 1);
        assert_eq!(inventory.added()[0].item_id, "travel_cloak");
    }

    #[test]
    fn test_rewards_survive_a_second_session_completing_again() {
        // Arrange: two sessions of the same player share the store.
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        let inventory = Arc::new(RecordingInventory::new());
        let mut first = engine_with(Arc::clone(&store), Arc::clone(&inventory));
        let mut second = engine_with(Arc::clone(&store), Arc::clone(&inventory));
        first.install_content(oath_rewards());
        second.install_content(oath_rewards());
        choose_dreadheim(&mut first);

        // Act: the second session wrote a stale log before the first completed.
        first.handle_complete_quest(&CompleteQuest::new(ids::TRAVEL_HOME));
        let stale = {
            let mut quests = first.quests();
            find_mut(&mut quests, ids::TRAVEL_HOME).unwrap().status = QuestStatus::Active;
            find_mut(&mut quests, ids::MEET_ELDER).unwrap().status = QuestStatus::Locked;
            quests
        };
        store
            .save(
                &DocumentKey::new("player-1", DocumentKind::Quests),
                &serde_json::to_string(&stale).unwrap(),
            )
            .unwrap();
        second.handle_complete_quest(&CompleteQuest::new(ids::TRAVEL_HOME));

        // Assert
        assert_eq!(inventory.added().len(), 1);
    }

    #[test]
    fn test_complete_unknown_or_locked_quest_is_a_no_op() {
        let (mut engine, _) = engine();
        engine.handle_reconcile(&Reconcile::new());

        assert!(!engine.handle_complete_quest(&CompleteQuest::new("q_nope")));
        assert!(!engine.handle_complete_quest(&CompleteQuest::new(ids::SIGN_OATH)));
        assert_eq!(status(&mut engine, ids::SIGN_OATH), QuestStatus::Locked);
    }

    #[test]
    fn test_complete_with_next_activates_follow_up() {
        // Arrange
        let (mut engine, _) = engine();
        choose_dreadheim(&mut engine);

        // Act
        engine.handle_complete_quest(
            &CompleteQuest::new(ids::TRAVEL_HOME)
                .then_activate(Some(ids::GATHER_SUPPLIES.to_owned())),
        );

        // Assert
        assert_eq!(status(&mut engine, ids::GATHER_SUPPLIES), QuestStatus::Active);
        assert_eq!(status(&mut engine, ids::MEET_ELDER), QuestStatus::Available);
    }

    #[test]
    fn test_set_active_demotes_previous_active() {
        // Arrange
        let (mut engine, _) = engine();
        choose_dreadheim(&mut engine);

        // Act
        let changed = engine.handle_set_active(&SetActive::new(ids::GATHER_SUPPLIES));

        // Assert
        assert!(changed);
        assert_eq!(status(&mut engine, ids::GATHER_SUPPLIES), QuestStatus::Active);
        assert_eq!(status(&mut engine, ids::TRAVEL_HOME), QuestStatus::Available);
    }

    #[test]
    fn test_set_active_rejects_locked_and_unknown_quests() {
        let (mut engine, _) = engine();
        choose_dreadheim(&mut engine);

        assert!(!engine.handle_set_active(&SetActive::new(ids::SIGN_OATH)));
        assert!(!engine.handle_set_active(&SetActive::new("q_nope")));
        assert_eq!(engine.active_quest().unwrap().id, ids::TRAVEL_HOME);
    }

    #[test]
    fn test_concurrent_writers_leave_one_active_quest_by_priority() {
        // Arrange: two sessions each activated a different quest.
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        let inventory = Arc::new(RecordingInventory::new());
        let mut tab_a = engine_with(Arc::clone(&store), Arc::clone(&inventory));
        let mut tab_b = engine_with(Arc::clone(&store), Arc::clone(&inventory));
        choose_dreadheim(&mut tab_a);
        tab_b.handle_set_active(&SetActive::new(ids::GATHER_SUPPLIES));
        let mut merged = tab_b.quests();
        find_mut(&mut merged, ids::TRAVEL_HOME).unwrap().status = QuestStatus::Active;
        store
            .save(
                &DocumentKey::new("player-1", DocumentKind::Quests),
                &serde_json::to_string(&merged).unwrap(),
            )
            .unwrap();

        // Act
        let repaired = tab_a.handle_reconcile(&Reconcile::new());

        // Assert
        assert!(repaired);
        let quests = tab_b.quests();
        let active: Vec<_> = quests
            .iter()
            .filter(|q| q.status == QuestStatus::Active)
            .map(|q| q.id.as_str())
            .collect();
        assert_eq!(active, vec![ids::TRAVEL_HOME]);
    }

    #[test]
    fn test_set_progress_clamps_and_ignores_locked_quests() {
        let (mut engine, _) = engine();
        choose_dreadheim(&mut engine);

        let set = engine.handle_set_progress(&SetProgress {
            correlation_id: uuid::Uuid::new_v4(),
            quest_id: ids::TRAVEL_HOME.to_owned(),
            progress: 250,
        });
        let locked = engine.handle_set_progress(&SetProgress {
            correlation_id: uuid::Uuid::new_v4(),
            quest_id: ids::SIGN_OATH.to_owned(),
            progress: 10,
        });

        assert!(set);
        assert!(!locked);
        assert_eq!(find(&engine.quests(), ids::TRAVEL_HOME).unwrap().progress, 100);
    }

    #[test]
    fn test_reconcile_without_drift_does_not_notify() {
        let (mut engine, _) = engine();
        choose_dreadheim(&mut engine);
        let mut notifications = engine.subscribe();

        let repaired = engine.handle_reconcile(&Reconcile::new());

        assert!(!repaired);
        assert!(notifications.try_recv().is_err());
    }

    #[test]
    fn test_empty_variable_update_is_ignored() {
        let (mut engine, _) = engine();
        choose_dreadheim(&mut engine);
        let mut notifications = engine.subscribe();

        let changed = engine.handle_set_vars(&SetVars::new(Vars::new()));

        assert!(!changed);
        assert!(notifications.try_recv().is_err());
    }

    #[test]
    fn test_failing_store_keeps_session_state_in_memory() {
        // Arrange
        let inventory = Arc::new(RecordingInventory::new());
        let mut engine = engine_with(Arc::new(FailingDocumentStore), inventory);

        // Act
        choose_dreadheim(&mut engine);

        // Assert
        assert_eq!(engine.active_quest().unwrap().id, ids::TRAVEL_HOME);
    }

    #[test]
    fn test_content_overrides_titles() {
        let (mut engine, _) = engine();
        engine.install_content(QuestContent::new(vec![QuestText {
            id: ids::CHOOSE_PATH.to_owned(),
            title: Some("The Seer's Question".to_owned()),
            description: None,
            rewards: RewardBundle::default(),
        }]));

        let quest = find(&engine.quests(), ids::CHOOSE_PATH).cloned().unwrap();

        assert_eq!(quest.title, "The Seer's Question");
    }
}
