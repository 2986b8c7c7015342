//! Domain layer for the Dialogue context.

pub mod catalog;
pub mod session;
