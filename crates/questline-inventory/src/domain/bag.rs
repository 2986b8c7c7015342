//! The `Inventory` contract and an in-memory implementation.

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::Serialize;

/// External inventory subsystem as seen by the engine.
///
/// Implementations must accept every call; failures are theirs to log.
pub trait Inventory: Send + Sync {
    /// Adds `qty` of an item to the player's bag.
    fn add(&self, item_id: &str, name: &str, image: &str, qty: u32);
}

/// A stack of identical items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemStack {
    /// Item identifier.
    pub item_id: String,
    /// Display name.
    pub name: String,
    /// Image path or URL.
    pub image: String,
    /// Number of items held.
    pub qty: u32,
}

/// In-memory bag keyed by item id.
#[derive(Debug, Default)]
pub struct Bag {
    stacks: Mutex<BTreeMap<String, ItemStack>>,
}

impl Bag {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stacks ordered by item id.
    #[must_use]
    pub fn stacks(&self) -> Vec<ItemStack> {
        self.stacks
            .lock()
            .map(|stacks| stacks.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns how many of `item_id` the bag holds.
    #[must_use]
    pub fn quantity(&self, item_id: &str) -> u32 {
        self.stacks
            .lock()
            .ok()
            .and_then(|stacks| stacks.get(item_id).map(|s| s.qty))
            .unwrap_or(0)
    }
}

impl Inventory for Bag {
    fn add(&self, item_id: &str, name: &str, image: &str, qty: u32) {
        let Ok(mut stacks) = self.stacks.lock() else {
            tracing::warn!(item_id, "bag lock poisoned; item dropped");
            return;
        };
        stacks
            .entry(item_id.to_owned())
            .and_modify(|stack| stack.qty = stack.qty.saturating_add(qty))
            .or_insert_with(|| ItemStack {
                item_id: item_id.to_owned(),
                name: name.to_owned(),
                image: image.to_owned(),
                qty,
            });
    }
}
