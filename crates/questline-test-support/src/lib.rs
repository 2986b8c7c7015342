//! Shared test doubles and fixtures for the Questline progression engine.

mod clock;
mod fixtures;
mod inventory;
mod store;

pub use clock::FixedClock;
pub use fixtures::FIXTURE_CATALOG_JSON;
pub use inventory::{AddedItem, RecordingInventory};
pub use store::FailingDocumentStore;
