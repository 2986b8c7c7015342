//! Consumed-event arena: one set of identifiers for every one-shot effect.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Identifiers of one-shot effects that already happened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsumedEvents(BTreeSet<String>);

impl ConsumedEvents {
    /// Identifier for the reward grant of `quest_id`.
    #[must_use]
    pub fn reward_key(quest_id: &str) -> String {
        format!("reward:{quest_id}")
    }

    /// Identifier for a scene arrival carrying `token`.
    #[must_use]
    pub fn arrival_key(token: &str) -> String {
        format!("arrival:{token}")
    }

    /// Returns `true` if `id` was consumed.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    /// Records `id`; returns `false` if it was already consumed.
    pub fn consume(&mut self, id: String) -> bool {
        self.0.insert(id)
    }
}
