//! One player's live session: progression engine, dialogue interpreter,
//! reward bag and background reconciler.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use questline_core::clock::Clock;
use questline_core::store::DocumentStore;
use questline_dialogue::application::interpreter::DialogueInterpreter;
use questline_dialogue::domain::catalog::Catalog;
use questline_inventory::domain::bag::{Bag, Inventory};
use questline_progression::application::engine::ProgressionEngine;
use questline_progression::application::reconciler::spawn_reconciler;
use questline_progression::domain::commands::Reconcile;
use questline_progression::domain::events::QuestStateChanged;
use questline_progression::domain::rules::RuleBook;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Live state for one player.
///
/// Callers that need both locks take the dialogue lock first.
#[derive(Debug)]
pub struct PlayerSession {
    engine: Arc<Mutex<ProgressionEngine>>,
    dialogue: Mutex<DialogueInterpreter>,
    inventory: Arc<Bag>,
    catalog_installed: AtomicBool,
    last_access: Mutex<Instant>,
    reconciler: JoinHandle<()>,
}

impl PlayerSession {
    /// Opens a session, seeds the quest log and starts the reconciler.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        player_id: &str,
        store: Arc<dyn DocumentStore>,
        rules: RuleBook,
        clock: Arc<dyn Clock>,
        catalog: Option<Arc<Catalog>>,
        reconcile_interval: Duration,
    ) -> Self {
        let inventory = Arc::new(Bag::new());
        let mut engine = ProgressionEngine::new(
            player_id,
            store,
            rules,
            clock,
            Arc::clone(&inventory) as Arc<dyn Inventory>,
        );
        if let Some(catalog) = &catalog {
            engine.install_content(catalog.to_content());
        }
        engine.handle_reconcile(&Reconcile::new());

        let catalog_installed = AtomicBool::new(catalog.is_some());
        let engine = Arc::new(Mutex::new(engine));
        let reconciler = spawn_reconciler(Arc::clone(&engine), reconcile_interval);
        tracing::info!(player_id, "player session started");
        Self {
            engine,
            dialogue: Mutex::new(DialogueInterpreter::new(catalog)),
            inventory,
            catalog_installed,
            last_access: Mutex::new(Instant::now()),
            reconciler,
        }
    }

    /// Locks the progression engine.
    pub fn engine(&self) -> MutexGuard<'_, ProgressionEngine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks the dialogue interpreter.
    pub fn dialogue(&self) -> MutexGuard<'_, DialogueInterpreter> {
        self.dialogue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn inventory(&self) -> &Bag {
        &self.inventory
    }

    /// Subscribes to this player's quest-state-changed notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<QuestStateChanged> {
        self.engine().subscribe()
    }

    /// Records that a request used this session.
    pub fn touch(&self) {
        *self.last_access.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    /// Time since the last request used this session.
    #[must_use]
    pub fn idle_for(&self) -> Duration {
        self.last_access
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }

    /// Returns `true` once catalog content has been installed.
    #[must_use]
    pub fn has_catalog(&self) -> bool {
        self.catalog_installed.load(Ordering::SeqCst)
    }

    /// Installs a catalog that became available after the session started.
    pub fn install_catalog(&self, catalog: Arc<Catalog>) {
        if self.catalog_installed.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut dialogue = self.dialogue();
        let mut engine = self.engine();
        engine.install_content(catalog.to_content());
        dialogue.set_catalog(Some(catalog));
    }
}

impl Drop for PlayerSession {
    fn drop(&mut self) {
        self.reconciler.abort();
    }
}
