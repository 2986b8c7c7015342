//! Questline Core — shared domain abstractions.
//!
//! This crate defines the traits and types every Questline context depends
//! on: time, commands, notifications, errors and the per-player document
//! store. It contains no engine logic.

pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod store;
