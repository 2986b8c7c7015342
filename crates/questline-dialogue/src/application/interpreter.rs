//! The dialogue interpreter: walks one quest's dialogue graph and applies
//! node actions to the player's progression engine.
//!
//! A node's action runs when the player picks one of its options, before
//! the transition. The transition follows the option's `next`, then the
//! node's `next`; a missing or unknown target closes the session.

use std::sync::Arc;

use questline_core::error::DomainError;
use questline_progression::application::engine::ProgressionEngine;
use questline_progression::domain::commands::{CompleteQuest, SetVars};
use questline_progression::domain::rules::CEREMONY_SIGNED_VAR;
use questline_progression::domain::vars::Vars;

use crate::domain::catalog::{Action, Catalog, CatalogQuest, DialogueNode};
use crate::domain::session::{CONTINUE_LABEL, DialogueState, NodeView};

/// Dialogue session for one player.
#[derive(Debug)]
pub struct DialogueInterpreter {
    catalog: Option<Arc<Catalog>>,
    state: DialogueState,
}

impl DialogueInterpreter {
    /// Creates a closed interpreter over `catalog`.
    #[must_use]
    pub fn new(catalog: Option<Arc<Catalog>>) -> Self {
        Self {
            catalog,
            state: DialogueState::Closed,
        }
    }

    /// Replaces the catalog; a running session is closed.
    pub fn set_catalog(&mut self, catalog: Option<Arc<Catalog>>) {
        self.close();
        self.catalog = catalog;
    }

    #[must_use]
    pub fn state(&self) -> &DialogueState {
        &self.state
    }

    /// Opens `quest_id`'s dialogue at its entry node, replacing any running
    /// session.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DialogueNotFound` if no catalog is loaded or the
    /// quest has no dialogue.
    pub fn run(&mut self, quest_id: &str, vars: &Vars) -> Result<NodeView, DomainError> {
        let entry = self
            .quest(quest_id)
            .and_then(CatalogQuest::entry_node)
            .map(|node| node.id.clone())
            .ok_or_else(|| DomainError::DialogueNotFound(quest_id.to_owned()))?;
        tracing::info!(quest_id, node_id = %entry, "dialogue opened");
        self.state = DialogueState::Open {
            quest_id: quest_id.to_owned(),
            node_id: entry,
        };
        self.view(vars)
            .ok_or_else(|| DomainError::DialogueNotFound(quest_id.to_owned()))
    }

    /// Renders the current node; `None` when closed.
    #[must_use]
    pub fn view(&self, vars: &Vars) -> Option<NodeView> {
        let (quest_id, node_id, awaiting_ceremony) = match &self.state {
            DialogueState::Closed => return None,
            DialogueState::Open { quest_id, node_id } => (quest_id, node_id, false),
            DialogueState::AwaitingCeremony {
                quest_id, node_id, ..
            } => (quest_id, node_id, true),
        };
        let node = self.node(quest_id, node_id)?;
        let choices = if node.choices.is_empty() {
            vec![CONTINUE_LABEL.to_owned()]
        } else {
            node.choices.iter().map(|c| vars.render(&c.text)).collect()
        };
        Some(NodeView {
            quest_id: quest_id.clone(),
            node_id: node_id.clone(),
            speaker: node.speaker.clone(),
            text: vars.render(&node.text),
            choices,
            awaiting_ceremony,
        })
    }

    /// Picks option `index` on the current node: runs the node's action, then
    /// transitions. Returns the next view, or `None` once the session closed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if no node is showing, the ceremony
    /// prompt is up, or `index` is out of range.
    pub fn choose(
        &mut self,
        index: usize,
        engine: &mut ProgressionEngine,
    ) -> Result<Option<NodeView>, DomainError> {
        let DialogueState::Open { quest_id, node_id } = &self.state else {
            return Err(DomainError::Validation(match self.state {
                DialogueState::Closed => "no dialogue is open".to_owned(),
                _ => "acknowledge the ceremony first".to_owned(),
            }));
        };
        let quest_id = quest_id.clone();
        let node = self
            .node(&quest_id, node_id)
            .cloned()
            .ok_or_else(|| DomainError::DialogueNotFound(quest_id.clone()))?;

        let option_count = node.choices.len().max(1);
        if index >= option_count {
            return Err(DomainError::Validation(format!(
                "choice {index} out of range; node {} has {option_count}",
                node.id
            )));
        }
        let target = node
            .choices
            .get(index)
            .and_then(|c| c.next.clone())
            .or_else(|| node.next.clone());
        tracing::debug!(quest_id = %quest_id, node_id = %node.id, index, ?target, "choice picked");

        match &node.action {
            None => {}
            Some(Action::SetVars { vars }) => {
                engine.handle_set_vars(&SetVars::new(vars.clone()));
            }
            Some(Action::CompleteQuest {
                next,
                requires_ceremony,
            }) => {
                if !owning_quest_active(engine, &quest_id) {
                    tracing::debug!(quest_id = %quest_id, "owning quest not active; completion skipped");
                } else if *requires_ceremony {
                    tracing::info!(quest_id = %quest_id, "completion waits for the ceremony");
                    self.state = DialogueState::AwaitingCeremony {
                        quest_id,
                        node_id: node.id.clone(),
                        follow_up: next.clone(),
                        then: target,
                    };
                    return Ok(self.view(&engine.vars()));
                } else {
                    engine.handle_complete_quest(
                        &CompleteQuest::new(quest_id.clone()).then_activate(next.clone()),
                    );
                }
            }
        }

        self.transition(quest_id, target);
        Ok(self.view(&engine.vars()))
    }

    /// Finishes a completion deferred by the ceremony, then transitions.
    ///
    /// The completion is dropped if the owning quest stopped being active in
    /// the meantime.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if no ceremony is pending.
    pub fn acknowledge_ceremony(
        &mut self,
        engine: &mut ProgressionEngine,
    ) -> Result<Option<NodeView>, DomainError> {
        let (quest_id, follow_up, then) =
            match std::mem::replace(&mut self.state, DialogueState::Closed) {
                DialogueState::AwaitingCeremony {
                    quest_id,
                    follow_up,
                    then,
                    ..
                } => (quest_id, follow_up, then),
                other => {
                    self.state = other;
                    return Err(DomainError::Validation("no ceremony is pending".to_owned()));
                }
            };

        if owning_quest_active(engine, &quest_id) {
            engine.handle_complete_quest(&CompleteQuest::new(quest_id.clone()).then_activate(follow_up));
            engine.handle_set_vars(&SetVars::new(Vars::new().with(CEREMONY_SIGNED_VAR, true)));
            tracing::info!(quest_id = %quest_id, "ceremony acknowledged");
        } else {
            tracing::warn!(quest_id = %quest_id, "quest no longer active; ceremony discarded");
        }

        self.transition(quest_id, then);
        Ok(self.view(&engine.vars()))
    }

    /// Ends the session. Always safe; a pending ceremony is discarded.
    pub fn close(&mut self) {
        if let DialogueState::AwaitingCeremony { quest_id, .. } = &self.state {
            tracing::info!(quest_id = %quest_id, "dialogue closed; pending ceremony discarded");
        }
        self.state = DialogueState::Closed;
    }

    fn transition(&mut self, quest_id: String, target: Option<String>) {
        match target {
            Some(node_id) if self.node(&quest_id, &node_id).is_some() => {
                self.state = DialogueState::Open { quest_id, node_id };
            }
            Some(node_id) => {
                tracing::warn!(quest_id = %quest_id, node_id = %node_id, "unknown dialogue node; closing");
                self.state = DialogueState::Closed;
            }
            None => {
                tracing::debug!(quest_id = %quest_id, "dialogue finished");
                self.state = DialogueState::Closed;
            }
        }
    }

    fn quest(&self, quest_id: &str) -> Option<&CatalogQuest> {
        self.catalog.as_deref()?.quest(quest_id)
    }

    fn node(&self, quest_id: &str, node_id: &str) -> Option<&DialogueNode> {
        self.quest(quest_id)?.node(node_id)
    }
}

fn owning_quest_active(engine: &mut ProgressionEngine, quest_id: &str) -> bool {
    engine.active_quest().is_some_and(|q| q.id == quest_id)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use questline_core::store::MemoryDocumentStore;
    use questline_inventory::domain::bag::Inventory;
    use questline_progression::domain::commands::Reconcile;
    use questline_progression::domain::quest::{QuestStatus, find};
    use questline_progression::domain::rules::{RuleBook, ids};
    use questline_test_support::{FIXTURE_CATALOG_JSON, FixedClock, RecordingInventory};

    use super::*;
    use crate::domain::catalog::CatalogFormat;

    struct Fixture {
        engine: ProgressionEngine,
        inventory: Arc<RecordingInventory>,
        dialogue: DialogueInterpreter,
    }

    fn fixture() -> Fixture {
        let catalog = Arc::new(Catalog::parse(FIXTURE_CATALOG_JSON, CatalogFormat::Json).unwrap());
        let inventory = Arc::new(RecordingInventory::new());
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap());
        let mut engine = ProgressionEngine::new(
            "player-1",
            Arc::new(MemoryDocumentStore::new()),
            RuleBook::builtin(),
            Arc::new(clock),
            Arc::clone(&inventory) as Arc<dyn Inventory>,
        );
        engine.install_content(catalog.to_content());
        Fixture {
            engine,
            inventory,
            dialogue: DialogueInterpreter::new(Some(catalog)),
        }
    }

    impl Fixture {
        fn vars(&mut self) -> Vars {
            self.engine.vars()
        }

        fn status(&mut self, quest_id: &str) -> QuestStatus {
            find(&self.engine.quests(), quest_id).unwrap().status
        }

        fn choose(&mut self, index: usize) -> Option<NodeView> {
            self.dialogue.choose(index, &mut self.engine).unwrap()
        }

        /// Picks Dreadheim and arrives home, leaving `q_meet_elder` active.
        fn reach_elder(&mut self) {
            let vars = self.vars();
            self.dialogue.run(ids::CHOOSE_PATH, &vars).unwrap();
            self.choose(0);
            self.choose(0);
            self.engine
                .handle_complete_quest(&CompleteQuest::new(ids::TRAVEL_HOME));
        }
    }

    #[test]
    fn test_run_opens_at_start_node() {
        // Arrange
        let mut f = fixture();
        let vars = f.vars();

        // Act
        let view = f.dialogue.run(ids::CHOOSE_PATH, &vars).unwrap();

        // Assert
        assert_eq!(view.node_id, "start");
        assert_eq!(view.speaker.as_deref(), Some("Seer"));
        assert_eq!(view.choices.len(), 3);
        assert!(!view.awaiting_ceremony);
    }

    #[test]
    fn test_run_without_dialogue_is_not_found() {
        let mut f = fixture();
        let vars = f.vars();

        let result = f.dialogue.run(ids::TRAVEL_HOME, &vars);

        assert!(matches!(result, Err(DomainError::DialogueNotFound(id)) if id == ids::TRAVEL_HOME));
        assert!(f.dialogue.state().is_closed());
    }

    #[test]
    fn test_run_without_catalog_is_not_found() {
        let mut dialogue = DialogueInterpreter::new(None);

        assert!(dialogue.run(ids::CHOOSE_PATH, &Vars::new()).is_err());
    }

    #[test]
    fn test_choosing_path_sets_vars_and_advances_quests() {
        // Arrange
        let mut f = fixture();
        let vars = f.vars();
        f.dialogue.run(ids::CHOOSE_PATH, &vars).unwrap();

        // Act
        let middle = f.choose(0).unwrap();
        let end = f.choose(0);

        // Assert
        assert_eq!(middle.node_id, "dreadheim");
        assert_eq!(middle.choices, vec![CONTINUE_LABEL.to_owned()]);
        assert!(end.is_none());
        assert_eq!(f.vars().path().as_deref(), Some("dreadheim"));
        assert_eq!(f.status(ids::CHOOSE_PATH), QuestStatus::Completed);
        assert_eq!(f.engine.active_quest().unwrap().id, ids::TRAVEL_HOME);
    }

    #[test]
    fn test_unknown_next_closes_without_side_effects() {
        // Arrange
        let mut f = fixture();
        let vars = f.vars();
        f.dialogue.run(ids::CHOOSE_PATH, &vars).unwrap();

        // Act
        let view = f.choose(2);

        // Assert
        assert!(view.is_none());
        assert!(f.dialogue.state().is_closed());
        assert!(f.vars().path().is_none());
    }

    #[test]
    fn test_choice_out_of_range_is_rejected() {
        let mut f = fixture();
        let vars = f.vars();
        f.dialogue.run(ids::CHOOSE_PATH, &vars).unwrap();

        let result = f.dialogue.choose(7, &mut f.engine);

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(!f.dialogue.state().is_closed());
    }

    #[test]
    fn test_acknowledge_without_ceremony_keeps_session_open() {
        let mut f = fixture();
        let vars = f.vars();
        f.dialogue.run(ids::CHOOSE_PATH, &vars).unwrap();

        let result = f.dialogue.acknowledge_ceremony(&mut f.engine);

        assert!(result.is_err());
        assert_eq!(f.dialogue.state().quest_id(), Some(ids::CHOOSE_PATH));
    }

    #[test]
    fn test_choose_when_closed_is_rejected() {
        let mut f = fixture();

        assert!(f.dialogue.choose(0, &mut f.engine).is_err());
    }

    #[test]
    fn test_elder_dialogue_completes_quest_and_grants_rewards() {
        // Arrange
        let mut f = fixture();
        f.reach_elder();
        let vars = f.vars();
        let view = f.dialogue.run(ids::MEET_ELDER, &vars).unwrap();

        // Act
        let after = f.choose(0);

        // Assert
        assert_eq!(view.text, "Welcome home, child of Dreadheim.");
        assert!(after.is_none());
        assert_eq!(f.status(ids::MEET_ELDER), QuestStatus::Completed);
        assert_eq!(f.engine.active_quest().unwrap().id, ids::SIGN_OATH);
        let items: Vec<_> = f.inventory.added().into_iter().map(|a| a.item_id).collect();
        assert_eq!(items, vec!["elder_token".to_owned()]);
    }

    #[test]
    fn test_complete_quest_without_active_quest_is_a_no_op() {
        // Arrange: fresh player, nothing active.
        let mut f = fixture();
        f.engine.handle_reconcile(&Reconcile::new());
        assert!(f.engine.active_quest().is_none());
        let vars = f.vars();
        f.dialogue.run(ids::MEET_ELDER, &vars).unwrap();
        let before = f.engine.quests();

        // Act
        let after = f.choose(0);

        // Assert
        assert!(after.is_none());
        assert_eq!(f.engine.quests(), before);
        assert!(f.inventory.added().is_empty());
    }

    #[test]
    fn test_ceremony_defers_completion_until_acknowledged() {
        // Arrange
        let mut f = fixture();
        f.reach_elder();
        let vars = f.vars();
        f.dialogue.run(ids::MEET_ELDER, &vars).unwrap();
        f.choose(0);
        let vars = f.vars();
        f.dialogue.run(ids::SIGN_OATH, &vars).unwrap();
        f.choose(0);

        // Act
        let prompt = f.choose(0).unwrap();
        let still_active = f.status(ids::SIGN_OATH);
        let rejected = f.dialogue.choose(0, &mut f.engine);
        let done = f.dialogue.acknowledge_ceremony(&mut f.engine).unwrap();

        // Assert
        assert!(prompt.awaiting_ceremony);
        assert_eq!(still_active, QuestStatus::Active);
        assert!(rejected.is_err());
        assert!(done.is_none());
        assert_eq!(f.status(ids::SIGN_OATH), QuestStatus::Completed);
        assert_eq!(f.engine.active_quest().unwrap().id, ids::RAISE_BANNER);
        assert!(f.vars().is_set(CEREMONY_SIGNED_VAR));
        let items: Vec<_> = f.inventory.added().into_iter().map(|a| a.item_id).collect();
        assert_eq!(items, vec!["elder_token", "oath_ring", "mead"]);
    }

    #[test]
    fn test_close_discards_pending_ceremony() {
        // Arrange
        let mut f = fixture();
        f.reach_elder();
        let vars = f.vars();
        f.dialogue.run(ids::MEET_ELDER, &vars).unwrap();
        f.choose(0);
        let vars = f.vars();
        f.dialogue.run(ids::SIGN_OATH, &vars).unwrap();
        f.choose(0);
        f.choose(0);

        // Act
        f.dialogue.close();
        let result = f.dialogue.acknowledge_ceremony(&mut f.engine);

        // Assert
        assert!(result.is_err());
        assert_eq!(f.status(ids::SIGN_OATH), QuestStatus::Active);
        assert!(!f.vars().is_set(CEREMONY_SIGNED_VAR));
    }

    #[test]
    fn test_close_is_always_safe() {
        let mut f = fixture();

        f.dialogue.close();
        f.dialogue.close();

        assert!(f.dialogue.view(&Vars::new()).is_none());
    }
}
