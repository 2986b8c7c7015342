//! Typed, cached access to a player's documents in the shared store.
//!
//! Reads always go to the store so writes from other sessions are seen.
//! A document that is missing or fails to parse reads as the type's default;
//! a store that cannot be read yields the last value this session saw. Writes
//! are best-effort: a failed save is logged and the cached value stays
//! authoritative until a later save succeeds.

use std::sync::Arc;

use questline_core::store::{DocumentKey, DocumentKind, DocumentStore};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::arena::ConsumedEvents;
use crate::domain::quest::Quest;
use crate::domain::vars::Vars;

/// One typed document with a session-local cache.
#[derive(Debug)]
pub struct CachedDocument<T> {
    key: DocumentKey,
    cache: T,
}

impl<T> CachedDocument<T>
where
    T: Serialize + DeserializeOwned + Default + Clone + PartialEq,
{
    /// Creates an accessor for `kind` owned by `player_id`.
    #[must_use]
    pub fn new(player_id: &str, kind: DocumentKind) -> Self {
        Self {
            key: DocumentKey::new(player_id, kind),
            cache: T::default(),
        }
    }

    /// Reads the current document.
    pub fn read(&mut self, store: &dyn DocumentStore) -> T {
        match store.load(&self.key) {
            Ok(Some(body)) => match serde_json::from_str::<T>(&body) {
                Ok(value) => self.cache = value,
                Err(err) => {
                    tracing::warn!(key = %self.key, error = %err, "unparsable document; treating as empty");
                    self.cache = T::default();
                }
            },
            Ok(None) => self.cache = T::default(),
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "document read failed; using cached value");
            }
        }
        self.cache.clone()
    }

    /// Writes `value` unless it equals the current document.
    ///
    /// Returns `true` when the value differed and was committed (to the
    /// store, or to the cache alone if the save failed).
    pub fn write(&mut self, store: &dyn DocumentStore, value: &T) -> bool {
        if self.read(store) == *value {
            return false;
        }
        self.cache = value.clone();
        match serde_json::to_string(value) {
            Ok(body) => {
                if let Err(err) = store.save(&self.key, &body) {
                    tracing::warn!(key = %self.key, error = %err, "document write failed; keeping in-memory state");
                }
            }
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "document serialization failed");
            }
        }
        true
    }

    /// Deletes the document. Returns `true` if there was anything to delete.
    pub fn clear(&mut self, store: &dyn DocumentStore) -> bool {
        if self.read(store) == T::default() {
            return false;
        }
        self.cache = T::default();
        if let Err(err) = store.remove(&self.key) {
            tracing::warn!(key = %self.key, error = %err, "document delete failed; keeping in-memory state");
        }
        true
    }

    /// Last value read or written by this session.
    #[must_use]
    pub fn cached(&self) -> &T {
        &self.cache
    }
}

/// The per-player documents the engine works with.
#[derive(Debug)]
pub struct PlayerDocuments {
    /// Quest log.
    pub quests: CachedDocument<Vec<Quest>>,
    /// Player variables.
    pub vars: CachedDocument<Vars>,
    /// Consumed one-shot events.
    pub consumed: CachedDocument<ConsumedEvents>,
    /// Handoff to the destination scene.
    pub pending_transition: CachedDocument<Option<crate::domain::travel::PendingTransition>>,
}

impl PlayerDocuments {
    /// Creates accessors for every document of `player_id`.
    #[must_use]
    pub fn new(player_id: &str) -> Self {
        Self {
            quests: CachedDocument::new(player_id, DocumentKind::Quests),
            vars: CachedDocument::new(player_id, DocumentKind::Vars),
            consumed: CachedDocument::new(player_id, DocumentKind::Consumed),
            pending_transition: CachedDocument::new(player_id, DocumentKind::PendingTransition),
        }
    }
}

/// Consumes `id` in the arena document; `false` if it was already consumed.
pub fn consume_once(
    store: &Arc<dyn DocumentStore>,
    consumed: &mut CachedDocument<ConsumedEvents>,
    id: String,
) -> bool {
    let mut arena = consumed.read(store.as_ref());
    if !arena.consume(id) {
        return false;
    }
    consumed.write(store.as_ref(), &arena);
    true
}
