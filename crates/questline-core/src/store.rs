//! Per-player document store abstraction.
//!
//! Progression state lives in a handful of small JSON documents per player.
//! The store is shared between sessions and deliberately unlocked: writes are
//! whole-document replacements with last-write-wins semantics. Consistency is
//! restored by the engine re-running its rules, never by the store.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use tokio::sync::broadcast;

use crate::error::DomainError;

/// The documents kept for every player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// JSON array of quest records.
    Quests,
    /// JSON object of player variables.
    Vars,
    /// One-shot scene transition handoff.
    PendingTransition,
    /// Set of consumed one-shot event identifiers.
    Consumed,
}

impl DocumentKind {
    /// Stable name used as part of the storage key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quests => "quests",
            Self::Vars => "vars",
            Self::PendingTransition => "pending_transition",
            Self::Consumed => "consumed",
        }
    }
}

/// Address of one document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    /// Owning player.
    pub player_id: String,
    /// Which document.
    pub kind: DocumentKind,
}

impl DocumentKey {
    /// Creates a key for `kind` owned by `player_id`.
    #[must_use]
    pub fn new(player_id: impl Into<String>, kind: DocumentKind) -> Self {
        Self {
            player_id: player_id.into(),
            kind,
        }
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.player_id, self.kind.as_str())
    }
}

/// Shared, multi-writer document storage.
pub trait DocumentStore: Send + Sync {
    /// Loads the raw document, `Ok(None)` when it was never written.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` when the backend cannot be read.
    fn load(&self, key: &DocumentKey) -> Result<Option<String>, DomainError>;

    /// Replaces the document.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` when the backend rejects the write.
    fn save(&self, key: &DocumentKey, body: &str) -> Result<(), DomainError>;

    /// Deletes the document if present.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` when the backend rejects the write.
    fn remove(&self, key: &DocumentKey) -> Result<(), DomainError>;

    /// Change feed for stores that can observe every writer.
    ///
    /// Stores shared with writers they cannot see (another process on the
    /// same database file) return `None`; callers then rely on polling.
    fn subscribe(&self) -> Option<broadcast::Receiver<DocumentKey>> {
        None
    }
}

/// In-process document store shared by every session of the server.
#[derive(Debug)]
pub struct MemoryDocumentStore {
    documents: Mutex<HashMap<DocumentKey, String>>,
    changes: broadcast::Sender<DocumentKey>,
}

impl MemoryDocumentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(256);
        Self {
            documents: Mutex::new(HashMap::new()),
            changes,
        }
    }

    fn publish(&self, key: &DocumentKey) {
        // No subscribers is the common case outside the server.
        let _ = self.changes.send(key.clone());
    }

    fn poisoned() -> DomainError {
        DomainError::Infrastructure("document store lock poisoned".to_owned())
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn load(&self, key: &DocumentKey) -> Result<Option<String>, DomainError> {
        let documents = self.documents.lock().map_err(|_| Self::poisoned())?;
        Ok(documents.get(key).cloned())
    }

    fn save(&self, key: &DocumentKey, body: &str) -> Result<(), DomainError> {
        {
            let mut documents = self.documents.lock().map_err(|_| Self::poisoned())?;
            documents.insert(key.clone(), body.to_owned());
        }
        self.publish(key);
        Ok(())
    }

    fn remove(&self, key: &DocumentKey) -> Result<(), DomainError> {
        let removed = {
            let mut documents = self.documents.lock().map_err(|_| Self::poisoned())?;
            documents.remove(key).is_some()
        };
        if removed {
            self.publish(key);
        }
        Ok(())
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<DocumentKey>> {
        Some(self.changes.subscribe())
    }
}
