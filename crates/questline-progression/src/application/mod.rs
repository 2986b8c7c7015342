//! Application layer for the Progression context.

pub mod command_handlers;
pub mod documents;
pub mod engine;
pub mod query_handlers;
pub mod reconciler;
pub mod travel_handlers;
