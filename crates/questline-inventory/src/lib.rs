//! Questline — Inventory collaborator.
//!
//! The inventory subsystem itself lives outside the engine. This crate holds
//! the reward bundle types quests declare, the `Inventory` contract the
//! engine calls, and an in-memory `Bag` used by the server and tests.

pub mod application;
pub mod domain;
