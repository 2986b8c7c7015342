//! Shared application state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use questline_core::clock::Clock;
use questline_core::error::DomainError;
use questline_core::store::DocumentStore;
use questline_dialogue::application::catalog_loader::CatalogLoader;
use questline_dialogue::domain::catalog::Catalog;
use questline_progression::domain::rules::RuleBook;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::ApiError;
use crate::session::PlayerSession;

const MAX_PLAYER_ID_LEN: usize = 64;

/// Sessions untouched for this long are closed.
pub const DEFAULT_SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// First delay between catalog retries; doubles up to [`CATALOG_RETRY_MAX`].
pub const CATALOG_RETRY_INITIAL: Duration = Duration::from_secs(2);
const CATALOG_RETRY_MAX: Duration = Duration::from_secs(60);
const MIN_SWEEP_PERIOD: Duration = Duration::from_secs(1);

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared document store every session reads and writes.
    pub store: Arc<dyn DocumentStore>,
    /// Catalog loader, shared so the catalog is fetched once.
    pub catalog: Arc<CatalogLoader>,
    /// Clock for notification timestamps.
    pub clock: Arc<dyn Clock>,
    /// Rule book every session runs.
    pub rules: Arc<RuleBook>,
    /// Safety-net interval of the per-player reconcilers.
    pub reconcile_interval: Duration,
    /// Sessions idle longer than this, with no open stream, are closed.
    pub session_idle_timeout: Duration,
    sessions: Arc<Mutex<HashMap<String, Arc<PlayerSession>>>>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("catalog", &self.catalog)
            .field("reconcile_interval", &self.reconcile_interval)
            .field("session_idle_timeout", &self.session_idle_timeout)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create new application state running the built-in rule book.
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        catalog: Arc<CatalogLoader>,
        clock: Arc<dyn Clock>,
        reconcile_interval: Duration,
    ) -> Self {
        Self {
            store,
            catalog,
            clock,
            rules: Arc::new(RuleBook::builtin()),
            reconcile_interval,
            session_idle_timeout: DEFAULT_SESSION_IDLE_TIMEOUT,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Overrides [`DEFAULT_SESSION_IDLE_TIMEOUT`].
    #[must_use]
    pub fn with_session_idle_timeout(mut self, timeout: Duration) -> Self {
        self.session_idle_timeout = timeout;
        self
    }

    /// Returns the session for `player_id`, starting it on first use.
    ///
    /// Never fetches the catalog; sessions started before it arrives get it
    /// from the retry task.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for an empty or malformed player id.
    pub async fn session(&self, player_id: &str) -> Result<Arc<PlayerSession>, ApiError> {
        validate_player_id(player_id)?;

        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get(player_id) {
            session.touch();
            return Ok(Arc::clone(session));
        }

        let session = Arc::new(PlayerSession::start(
            player_id,
            Arc::clone(&self.store),
            RuleBook::clone(&self.rules),
            Arc::clone(&self.clock),
            self.catalog.get(),
            self.reconcile_interval,
        ));
        sessions.insert(player_id.to_owned(), Arc::clone(&session));
        Ok(session)
    }

    /// Installs `catalog` into every open session that runs without one.
    /// Returns how many sessions picked it up.
    pub async fn install_catalog(&self, catalog: &Arc<Catalog>) -> usize {
        let sessions = self.sessions.lock().await;
        let mut installed = 0;
        for session in sessions.values().filter(|s| !s.has_catalog()) {
            session.install_catalog(Arc::clone(catalog));
            installed += 1;
        }
        if installed > 0 {
            tracing::info!(sessions = installed, "installed late catalog");
        }
        installed
    }

    /// Retries the catalog in the background with exponential backoff until
    /// a load succeeds, then installs it into the open sessions.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_catalog_retry(&self, initial_backoff: Duration) -> JoinHandle<()> {
        let state = self.clone();
        tokio::spawn(async move { state.retry_catalog(initial_backoff).await })
    }

    async fn retry_catalog(&self, initial_backoff: Duration) {
        if !self.catalog.is_enabled() {
            return;
        }
        let mut backoff = initial_backoff;
        loop {
            if let Some(catalog) = self.catalog.get() {
                self.install_catalog(&catalog).await;
                return;
            }
            tracing::debug!(
                retry_in_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                "catalog retry scheduled"
            );
            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(CATALOG_RETRY_MAX);
            self.catalog.load().await;
        }
    }

    /// Closes sessions idle longer than the idle timeout. Sessions still
    /// held elsewhere (an open stream, a request in flight) are kept.
    /// Returns how many were closed.
    pub async fn evict_idle_sessions(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|player_id, session| {
            let keep = Arc::strong_count(session) > 1 || session.idle_for() < self.session_idle_timeout;
            if !keep {
                tracing::info!(player_id = %player_id, "closing idle player session");
            }
            keep
        });
        before - sessions.len()
    }

    /// Sweeps idle sessions periodically.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_session_sweeper(&self) -> JoinHandle<()> {
        let state = self.clone();
        let period = (self.session_idle_timeout / 2).max(MIN_SWEEP_PERIOD);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                state.evict_idle_sessions().await;
            }
        })
    }
}

fn validate_player_id(player_id: &str) -> Result<(), DomainError> {
    let well_formed = !player_id.is_empty()
        && player_id.len() <= MAX_PLAYER_ID_LEN
        && player_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if well_formed {
        Ok(())
    } else {
        Err(DomainError::Validation(format!(
            "player id must be 1-{MAX_PLAYER_ID_LEN} letters, digits, '-' or '_'"
        )))
    }
}


#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use questline_core::store::MemoryDocumentStore;
    use questline_dialogue::application::catalog_loader::{
        CatalogSource, RawCatalog, StaticCatalogSource,
    };
    use questline_test_support::FIXTURE_CATALOG_JSON;

    use super::test_support::{app_state_with, test_app_state};
    use super::*;

    /// A catalog host that is down and counts the attempts.
    #[derive(Default)]
    struct UnreachableSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CatalogSource for UnreachableSource {
        fn describe(&self) -> String {
            "unreachable".to_owned()
        }

        async fn fetch(&self) -> Result<RawCatalog, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(DomainError::Infrastructure("connection refused".to_owned()))
        }
    }

    async fn wait_for(condition: impl Fn() -> bool) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_session_is_created_once_per_player() {
        // Arrange
        let state = test_app_state();

        // Act
        let first = state.session("player-1").await.unwrap();
        let second = state.session("player-1").await.unwrap();
        let other = state.session("player-2").await.unwrap();

        // Assert
        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));
        assert!(first.has_catalog());
    }

    #[tokio::test]
    async fn test_new_session_is_seeded() {
        let state = test_app_state();

        let session = state.session("player-1").await.unwrap();
        let quests = session.engine().quests();

        assert_eq!(quests.len(), RuleBook::builtin().rules.len());
        assert_eq!(quests[0].title, "The Seer's Question");
    }

    #[tokio::test]
    async fn test_malformed_player_id_is_rejected() {
        let state = test_app_state();

        let result = state.session("../etc").await;

        assert!(matches!(result, Err(ApiError(DomainError::Validation(_)))));
    }

    #[tokio::test]
    async fn test_requests_never_fetch_the_catalog() {
        // Arrange
        let source = Arc::new(UnreachableSource::default());
        let state = app_state_with(
            Arc::new(MemoryDocumentStore::new()),
            CatalogLoader::new(Arc::clone(&source) as Arc<dyn CatalogSource>, RuleBook::builtin()),
        );

        // Act
        for _ in 0..5 {
            state.session("p1").await.unwrap();
        }

        // Assert
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        assert!(!state.session("p1").await.unwrap().has_catalog());
    }

    #[tokio::test]
    async fn test_retry_installs_late_catalog_into_open_sessions() {
        // Arrange: the session starts before any load has succeeded.
        let state = app_state_with(
            Arc::new(MemoryDocumentStore::new()),
            CatalogLoader::new(
                Arc::new(StaticCatalogSource::json(FIXTURE_CATALOG_JSON)),
                RuleBook::builtin(),
            ),
        );
        let session = state.session("p1").await.unwrap();
        assert!(!session.has_catalog());

        // Act
        let retry = state.spawn_catalog_retry(Duration::from_millis(10));
        wait_for(|| session.has_catalog()).await;

        // Assert
        assert_eq!(session.engine().quests()[0].title, "The Seer's Question");
        assert!(state.session("p2").await.unwrap().has_catalog());
        retry.await.unwrap();
    }

    #[tokio::test]
    async fn test_retry_backs_off_while_catalog_is_down() {
        // Arrange
        let source = Arc::new(UnreachableSource::default());
        let state = app_state_with(
            Arc::new(MemoryDocumentStore::new()),
            CatalogLoader::new(Arc::clone(&source) as Arc<dyn CatalogSource>, RuleBook::builtin()),
        );

        // Act: 10 + 20 + 40 ms of backoff fit before the check, 80 more do not.
        let retry = state.spawn_catalog_retry(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(100)).await;
        retry.abort();

        // Assert
        let calls = source.calls.load(Ordering::SeqCst);
        assert!((1..=4).contains(&calls), "unexpected fetch count {calls}");
    }

    #[tokio::test]
    async fn test_idle_sessions_are_closed() {
        // Arrange
        let state = test_app_state().with_session_idle_timeout(Duration::ZERO);
        let session = state.session("p1").await.unwrap();
        let closed = Arc::downgrade(&session);
        drop(session);

        // Act
        let evicted = state.evict_idle_sessions().await;

        // Assert
        assert_eq!(evicted, 1);
        assert!(closed.upgrade().is_none());
    }

    #[tokio::test]
    async fn test_sessions_in_use_are_kept() {
        // Arrange
        let state = test_app_state().with_session_idle_timeout(Duration::ZERO);
        let streaming = state.session("p1").await.unwrap();

        // Act
        let evicted = state.evict_idle_sessions().await;

        // Assert
        assert_eq!(evicted, 0);
        assert!(Arc::ptr_eq(&streaming, &state.session("p1").await.unwrap()));
    }

    #[tokio::test]
    async fn test_recently_used_sessions_are_kept() {
        let state = test_app_state();
        drop(state.session("p1").await.unwrap());

        assert_eq!(state.evict_idle_sessions().await, 0);
    }
}
