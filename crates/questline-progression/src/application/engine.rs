//! The progression engine for one player session.
//!
//! Every mutation follows the same pipeline: read the shared documents,
//! apply the change to a copy, run the sanitizer, grant rewards for quests
//! that just completed, write back, and broadcast a `QuestStateChanged`
//! notification if anything was committed.

use std::sync::Arc;

use questline_core::clock::Clock;
use questline_core::event::EventMetadata;
use questline_core::store::DocumentStore;
use questline_inventory::application::grants::grant_bundle;
use questline_inventory::domain::bag::Inventory;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::application::documents::{PlayerDocuments, consume_once};
use crate::domain::arena::ConsumedEvents;
use crate::domain::content::QuestContent;
use crate::domain::events::{ChangeCause, QUEST_STATE_CHANGED_EVENT_TYPE, QuestStateChanged};
use crate::domain::quest::{Quest, QuestStatus};
use crate::domain::rules::RuleBook;
use crate::domain::sanitizer;
use crate::domain::vars::Vars;

const NOTIFICATION_CAPACITY: usize = 64;

/// Progression state machine for one player.
///
/// Not internally synchronized; share it behind a mutex.
pub struct ProgressionEngine {
    player_id: String,
    store: Arc<dyn DocumentStore>,
    base_rules: RuleBook,
    rules: RuleBook,
    content: QuestContent,
    pub(crate) documents: PlayerDocuments,
    clock: Arc<dyn Clock>,
    inventory: Arc<dyn Inventory>,
    notifications: broadcast::Sender<QuestStateChanged>,
    sequence_number: u64,
}

impl std::fmt::Debug for ProgressionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressionEngine")
            .field("player_id", &self.player_id)
            .field("content_quests", &self.content.len())
            .field("sequence_number", &self.sequence_number)
            .finish_non_exhaustive()
    }
}

impl ProgressionEngine {
    /// Creates an engine for `player_id` over the shared `store`.
    #[must_use]
    pub fn new(
        player_id: impl Into<String>,
        store: Arc<dyn DocumentStore>,
        rules: RuleBook,
        clock: Arc<dyn Clock>,
        inventory: Arc<dyn Inventory>,
    ) -> Self {
        let player_id = player_id.into();
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self {
            documents: PlayerDocuments::new(&player_id),
            player_id,
            store,
            base_rules: rules.clone(),
            rules,
            content: QuestContent::default(),
            clock,
            inventory,
            notifications,
            sequence_number: 0,
        }
    }

    /// Player this engine serves.
    #[must_use]
    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    /// Shared store backing this engine.
    #[must_use]
    pub fn store(&self) -> Arc<dyn DocumentStore> {
        Arc::clone(&self.store)
    }

    /// Effective rule book (built-in rules with catalog text applied).
    #[must_use]
    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    /// Subscribes to quest-state-changed notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<QuestStateChanged> {
        self.notifications.subscribe()
    }

    /// Current quest log as stored; does not run the rules.
    pub fn quests(&mut self) -> Vec<Quest> {
        self.documents.quests.read(self.store.as_ref())
    }

    /// Current player variables.
    pub fn vars(&mut self) -> Vars {
        self.documents.vars.read(self.store.as_ref())
    }

    /// The active quest, if any.
    pub fn active_quest(&mut self) -> Option<Quest> {
        self.quests()
            .into_iter()
            .find(|q| q.status == QuestStatus::Active)
    }

    /// Layers catalog text and rewards over the built-in rules, then
    /// re-evaluates so quest titles and descriptions pick them up.
    pub fn install_content(&mut self, content: QuestContent) {
        self.rules = self.base_rules.with_content(&content);
        tracing::info!(
            player_id = %self.player_id,
            quests = content.len(),
            "installed catalog content"
        );
        self.content = content;
        self.commit(Uuid::new_v4(), ChangeCause::ContentInstalled, false, |_, _| true);
    }

    /// Runs `mutate` over a sanitized copy of the quest log, sanitizes the
    /// result, grants rewards for newly completed quests, writes back and
    /// notifies.
    ///
    /// `mutate` returns `false` to reject the change; nothing is written then.
    /// `vars_changed` forces a notification even when the quest log ends up
    /// identical. Returns `true` if anything was committed.
    pub(crate) fn commit<F>(
        &mut self,
        correlation_id: Uuid,
        cause: ChangeCause,
        vars_changed: bool,
        mutate: F,
    ) -> bool
    where
        F: FnOnce(&mut Vec<Quest>, &Vars) -> bool,
    {
        let before = self.quests();
        let vars = self.vars();

        let mut working = sanitizer::evaluate(&self.rules, &vars, &before);
        if !mutate(&mut working, &vars) {
            return false;
        }
        let after = sanitizer::evaluate(&self.rules, &vars, &working);

        for quest in &after {
            let was_completed = before
                .iter()
                .any(|q| q.id == quest.id && q.status == QuestStatus::Completed);
            if quest.status == QuestStatus::Completed && !was_completed {
                self.grant_rewards(&quest.id);
            }
        }

        let quests_changed = self.documents.quests.write(self.store.as_ref(), &after);
        if !quests_changed && !vars_changed {
            return false;
        }
        self.notify(correlation_id, cause, after);
        true
    }

    fn grant_rewards(&mut self, quest_id: &str) {
        let Some(bundle) = self.content.rewards(quest_id).cloned() else {
            return;
        };
        let key = ConsumedEvents::reward_key(quest_id);
        if !consume_once(&self.store, &mut self.documents.consumed, key) {
            tracing::debug!(quest_id, "rewards already granted");
            return;
        }
        grant_bundle(self.inventory.as_ref(), quest_id, &bundle);
    }

    pub(crate) fn notify(&mut self, correlation_id: Uuid, cause: ChangeCause, quests: Vec<Quest>) {
        self.sequence_number += 1;
        let travel_destination = self
            .documents
            .pending_transition
            .read(self.store.as_ref())
            .map(|p| p.destination);
        let active_quest_id = quests
            .iter()
            .find(|q| q.status == QuestStatus::Active)
            .map(|q| q.id.clone());
        let event = QuestStateChanged {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: QUEST_STATE_CHANGED_EVENT_TYPE.to_owned(),
                player_id: self.player_id.clone(),
                sequence_number: self.sequence_number,
                correlation_id,
                occurred_at: self.clock.now(),
            },
            cause,
            active_quest_id,
            quests,
            travel_destination,
        };
        tracing::info!(
            player_id = %self.player_id,
            sequence_number = self.sequence_number,
            cause = ?event.cause,
            active = ?event.active_quest_id,
            "quest state changed"
        );
        // Nobody listening is fine.
        let _ = self.notifications.send(event);
    }
}
