//! Catalog-supplied quest text and rewards, as the progression engine sees it.
//!
//! The dialogue context owns the catalog document; it hands the engine only
//! this projection so progression never depends on dialogue types.

use std::collections::HashMap;

use questline_inventory::domain::rewards::RewardBundle;

/// Text and rewards for one quest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestText {
    /// Quest identifier.
    pub id: String,
    /// Title override.
    pub title: Option<String>,
    /// Description override; may contain `{path}`.
    pub description: Option<String>,
    /// Rewards granted on completion.
    pub rewards: RewardBundle,
}

/// Lookup of catalog text by quest id.
#[derive(Debug, Clone, Default)]
pub struct QuestContent {
    by_id: HashMap<String, QuestText>,
}

impl QuestContent {
    /// Indexes `texts` by quest id; later duplicates win.
    #[must_use]
    pub fn new(texts: Vec<QuestText>) -> Self {
        Self {
            by_id: texts.into_iter().map(|t| (t.id.clone(), t)).collect(),
        }
    }

    /// Returns the entry for `quest_id`.
    #[must_use]
    pub fn get(&self, quest_id: &str) -> Option<&QuestText> {
        self.by_id.get(quest_id)
    }

    /// Reward bundle for `quest_id`, if the catalog declares a non-empty one.
    #[must_use]
    pub fn rewards(&self, quest_id: &str) -> Option<&RewardBundle> {
        self.by_id
            .get(quest_id)
            .map(|t| &t.rewards)
            .filter(|r| !r.is_empty())
    }

    /// Number of quests with content.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns `true` when no content was installed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
