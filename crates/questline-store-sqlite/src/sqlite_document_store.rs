//! `SQLite` implementation of the `DocumentStore` trait.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension, params};

use questline_core::error::DomainError;
use questline_core::store::{DocumentKey, DocumentStore};

use crate::schema::CREATE_DOCUMENTS_TABLE;

/// SQLite-backed document store.
///
/// Other processes writing to the same file are invisible to this instance,
/// so [`DocumentStore::subscribe`] keeps its default `None` and sessions fall
/// back to periodic reconciliation.
#[derive(Debug)]
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

impl SqliteDocumentStore {
    /// Opens (or creates) the database at `path` and ensures the schema.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the file cannot be opened or
    /// the schema cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let conn = Connection::open(path.as_ref()).map_err(db_error)?;
        tracing::info!(path = %path.as_ref().display(), "opened sqlite document store");
        Self::with_connection(conn)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the schema cannot be created.
    pub fn open_in_memory() -> Result<Self, DomainError> {
        let conn = Connection::open_in_memory().map_err(db_error)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, DomainError> {
        conn.busy_timeout(std::time::Duration::from_secs(2))
            .map_err(db_error)?;
        conn.execute_batch(CREATE_DOCUMENTS_TABLE).map_err(db_error)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>, DomainError> {
        self.conn
            .lock()
            .map_err(|_| DomainError::Infrastructure("sqlite connection lock poisoned".to_owned()))
    }
}

fn db_error(err: rusqlite::Error) -> DomainError {
    DomainError::Infrastructure(format!("sqlite error: {err}"))
}

impl DocumentStore for SqliteDocumentStore {
    fn load(&self, key: &DocumentKey) -> Result<Option<String>, DomainError> {
        let conn = self.connection()?;
        conn.query_row(
            "SELECT body FROM player_documents WHERE player_id = ?1 AND kind = ?2",
            params![key.player_id, key.kind.as_str()],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(db_error)
    }

    fn save(&self, key: &DocumentKey, body: &str) -> Result<(), DomainError> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO player_documents (player_id, kind, body) VALUES (?1, ?2, ?3)
             ON CONFLICT (player_id, kind) DO UPDATE SET
                body = excluded.body,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
            params![key.player_id, key.kind.as_str(), body],
        )
        .map_err(db_error)?;
        Ok(())
    }

    fn remove(&self, key: &DocumentKey) -> Result<(), DomainError> {
        let conn = self.connection()?;
        conn.execute(
            "DELETE FROM player_documents WHERE player_id = ?1 AND kind = ?2",
            params![key.player_id, key.kind.as_str()],
        )
        .map_err(db_error)?;
        Ok(())
    }
}
