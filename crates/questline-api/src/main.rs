//! Questline API server entry point.

use std::sync::Arc;

use questline_api::config::AppConfig;
use questline_api::error::AppError;
use questline_api::state::{AppState, CATALOG_RETRY_INITIAL};
use questline_core::clock::SystemClock;
use questline_core::store::{DocumentStore, MemoryDocumentStore};
use questline_dialogue::application::catalog_loader::{CatalogLoader, source_for_location};
use questline_progression::domain::rules::RuleBook;
use questline_store_sqlite::SqliteDocumentStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Questline API server");

    let config = AppConfig::from_env()?;

    let store: Arc<dyn DocumentStore> = match &config.database_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "using SQLite document store");
            Arc::new(SqliteDocumentStore::open(path)?)
        }
        None => {
            tracing::warn!("QUESTLINE_DB not set; progress is kept in memory only");
            Arc::new(MemoryDocumentStore::new())
        }
    };

    let catalog = match &config.catalog_location {
        Some(location) => CatalogLoader::new(source_for_location(location)?, RuleBook::builtin()),
        None => {
            tracing::warn!("QUESTLINE_CATALOG not set; running with built-in quest text");
            CatalogLoader::disabled()
        }
    };
    let catalog = Arc::new(catalog);
    // Warm the cache; a failure here is retried in the background.
    catalog.load().await;

    let app_state = AppState::new(
        store,
        catalog,
        Arc::new(SystemClock),
        config.reconcile_interval,
    )
    .with_session_idle_timeout(config.session_idle_timeout);
    let _catalog_retry = app_state.spawn_catalog_retry(CATALOG_RETRY_INITIAL);
    let _session_sweeper = app_state.spawn_session_sweeper();
    let app = questline_api::build_router(app_state);

    let addr = config.bind_addr()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
