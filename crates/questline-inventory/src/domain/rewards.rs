//! Reward bundles declared by catalog quests.

use serde::{Deserialize, Serialize};

/// One item stack granted on quest completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardItem {
    /// Inventory item identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Image path or URL shown in the bag.
    #[serde(default)]
    pub image: String,
    /// Quantity granted.
    #[serde(default = "default_qty")]
    pub qty: u32,
}

const fn default_qty() -> u32 {
    1
}

/// Everything a quest hands out when it completes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardBundle {
    /// Item stacks, granted in order.
    #[serde(default)]
    pub items: Vec<RewardItem>,
}

impl RewardBundle {
    /// Returns `true` when the bundle grants nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
