//! Questline — SQLite document store.
//!
//! Persists the per-player progression documents in a single table. Several
//! server processes may open the same database file; SQLite serializes their
//! writes but nothing coordinates them, which matches the last-write-wins
//! model the engine is designed for.

pub mod schema;
pub mod sqlite_document_store;

pub use sqlite_document_store::SqliteDocumentStore;
