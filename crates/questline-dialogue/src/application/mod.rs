//! Application layer for the Dialogue context.

pub mod catalog_loader;
pub mod interpreter;
