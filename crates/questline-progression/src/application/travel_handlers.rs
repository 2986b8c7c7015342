//! Travel handoff: setting off writes a pending transition, arriving in the
//! destination scene consumes it and completes the travel quest.

use questline_core::command::Command;
use uuid::Uuid;

use crate::application::documents::consume_once;
use crate::application::engine::ProgressionEngine;
use crate::domain::arena::ConsumedEvents;
use crate::domain::commands::{ArriveAtScene, BeginTravel, CompleteQuest};
use crate::domain::events::ChangeCause;
use crate::domain::quest::{QuestStatus, find};
use crate::domain::travel::PendingTransition;

impl ProgressionEngine {
    /// Writes the scene handoff for the chosen path.
    ///
    /// Requires the travel quest to be active and a path to be chosen.
    /// Repeated calls return the transition already pending.
    pub fn handle_begin_travel(&mut self, command: &BeginTravel) -> Option<PendingTransition> {
        tracing::debug!(
            command = command.command_type(),
            correlation_id = %command.correlation_id(),
            "handling command"
        );
        let quest_id = self.rules().travel_quest.clone()?;
        let quests = self.quests();
        if find(&quests, &quest_id).map(|q| q.status) != Some(QuestStatus::Active) {
            tracing::debug!(quest_id = %quest_id, "travel quest is not active");
            return None;
        }
        let Some(destination) = self.vars().path() else {
            tracing::debug!("no path chosen; nowhere to travel");
            return None;
        };

        let store = self.store();
        let consumed = self.documents.consumed.read(store.as_ref());
        let pending = self.documents.pending_transition.read(store.as_ref());
        if let Some(existing) = pending.filter(|p| {
            p.quest_id == quest_id
                && p.matches(&destination)
                && !consumed.contains(&ConsumedEvents::arrival_key(&p.token))
        }) {
            return Some(existing);
        }

        let transition = PendingTransition {
            destination,
            quest_id,
            token: Uuid::new_v4().to_string(),
        };
        self.documents
            .pending_transition
            .write(store.as_ref(), &Some(transition.clone()));
        tracing::info!(
            player_id = %self.player_id(),
            destination = %transition.destination,
            "travel started"
        );
        let quests = self.quests();
        self.notify(
            command.correlation_id(),
            ChangeCause::TravelStarted {
                destination: transition.destination.clone(),
            },
            quests,
        );
        Some(transition)
    }

    /// Finalizes a pending transition when the player arrives in `scene`.
    ///
    /// Arriving anywhere else leaves the handoff pending. A replayed arrival
    /// (same token) clears the handoff without completing anything.
    pub fn handle_arrive(&mut self, command: &ArriveAtScene) -> bool {
        tracing::debug!(
            command = command.command_type(),
            correlation_id = %command.correlation_id(),
            scene = %command.scene,
            "handling command"
        );
        let store = self.store();
        let Some(pending) = self.documents.pending_transition.read(store.as_ref()) else {
            return false;
        };
        if !pending.matches(&command.scene) {
            tracing::debug!(
                scene = %command.scene,
                destination = %pending.destination,
                "arrived somewhere else; handoff stays pending"
            );
            return false;
        }

        let first_arrival = consume_once(
            &store,
            &mut self.documents.consumed,
            ConsumedEvents::arrival_key(&pending.token),
        );
        if self.documents.pending_transition.clear(store.as_ref()) {
            let quests = self.quests();
            self.notify(
                command.correlation_id(),
                ChangeCause::TravelEnded {
                    destination: pending.destination.clone(),
                },
                quests,
            );
        }
        if !first_arrival {
            tracing::info!(token = %pending.token, "arrival already processed");
            return false;
        }

        self.handle_complete_quest(&CompleteQuest {
            correlation_id: command.correlation_id,
            quest_id: pending.quest_id,
            next: None,
        })
    }

    /// Destination of the pending transition, if the player is en route.
    pub fn travel_destination(&mut self) -> Option<String> {
        let store = self.store();
        self.documents
            .pending_transition
            .read(store.as_ref())
            .map(|p| p.destination)
    }
}
