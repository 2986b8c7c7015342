//! Domain types for the Inventory collaborator.

pub mod bag;
pub mod rewards;
