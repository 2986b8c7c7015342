//! Questline — Progression bounded context.
//!
//! Owns the quest log and player variables, the rule book that orders quests,
//! the sanitizer that restores quest invariants after any writer touched the
//! shared store, and the reconciliation loop that keeps a session in step
//! with writers it cannot see.

pub mod application;
pub mod domain;
