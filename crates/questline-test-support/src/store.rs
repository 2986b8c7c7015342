//! Document store double whose backend is always down.

use questline_core::error::DomainError;
use questline_core::store::{DocumentKey, DocumentStore};

/// A document store that fails every operation with an infrastructure error.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingDocumentStore;

fn refused() -> DomainError {
    DomainError::Infrastructure("connection refused".to_owned())
}

impl DocumentStore for FailingDocumentStore {
    fn load(&self, _key: &DocumentKey) -> Result<Option<String>, DomainError> {
        Err(refused())
    }

    fn save(&self, _key: &DocumentKey, _body: &str) -> Result<(), DomainError> {
        Err(refused())
    }

    fn remove(&self, _key: &DocumentKey) -> Result<(), DomainError> {
        Err(refused())
    }
}
