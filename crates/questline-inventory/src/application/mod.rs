//! Application services for the Inventory collaborator.

pub mod grants;
