//! Inventory double that records every `add` call.

use std::sync::Mutex;

use questline_inventory::domain::bag::Inventory;

/// One recorded `Inventory::add` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedItem {
    pub item_id: String,
    pub name: String,
    pub image: String,
    pub qty: u32,
}

/// An inventory that records calls instead of stacking items.
#[derive(Debug, Default)]
pub struct RecordingInventory {
    added: Mutex<Vec<AddedItem>>,
}

impl RecordingInventory {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all recorded calls, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn added(&self) -> Vec<AddedItem> {
        self.added.lock().unwrap().clone()
    }
}

impl Inventory for RecordingInventory {
    fn add(&self, item_id: &str, name: &str, image: &str, qty: u32) {
        self.added.lock().unwrap().push(AddedItem {
            item_id: item_id.to_owned(),
            name: name.to_owned(),
            image: image.to_owned(),
            qty,
        });
    }
}
