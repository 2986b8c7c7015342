//! Questline — Dialogue bounded context.
//!
//! Loads the quest catalog (text, rewards and dialogue graphs) once per
//! session and walks a quest's dialogue graph, applying node actions to the
//! progression engine.

pub mod application;
pub mod domain;
