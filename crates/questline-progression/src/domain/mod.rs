//! Domain types and pure logic for the Progression context.

pub mod arena;
pub mod commands;
pub mod content;
pub mod events;
pub mod quest;
pub mod rules;
pub mod sanitizer;
pub mod travel;
pub mod vars;
