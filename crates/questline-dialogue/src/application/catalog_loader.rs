//! Catalog retrieval: one successful load per session, degraded on failure.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use questline_core::error::DomainError;
use questline_progression::domain::rules::RuleBook;
use tokio::sync::OnceCell;

use crate::domain::catalog::{Catalog, CatalogFormat, fingerprint};

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// A raw catalog document and its format.
#[derive(Debug, Clone)]
pub struct RawCatalog {
    pub body: String,
    pub format: CatalogFormat,
}

/// Somewhere a catalog document can be fetched from.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Human-readable location for logs.
    fn describe(&self) -> String;

    /// Fetches the raw document.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the document cannot be read.
    async fn fetch(&self) -> Result<RawCatalog, DomainError>;
}

/// Fetches the catalog over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCatalogSource {
    client: reqwest::Client,
    url: String,
}

impl HttpCatalogSource {
    /// Creates a source for `url`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| DomainError::Infrastructure(format!("http client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<RawCatalog, DomainError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| DomainError::Infrastructure(format!("catalog request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(DomainError::Infrastructure(format!(
                "catalog request returned {}",
                response.status().as_u16()
            )));
        }

        let yaml_content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("yaml"));
        let format = if yaml_content_type {
            CatalogFormat::Yaml
        } else {
            CatalogFormat::from_location(&self.url)
        };
        let body = response
            .text()
            .await
            .map_err(|e| DomainError::Infrastructure(format!("catalog body unreadable: {e}")))?;
        Ok(RawCatalog { body, format })
    }
}

/// Reads the catalog from a local file; `.yaml`/`.yml` files are YAML.
#[derive(Debug, Clone)]
pub struct FileCatalogSource {
    path: PathBuf,
}

impl FileCatalogSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogSource for FileCatalogSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<RawCatalog, DomainError> {
        let body = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            DomainError::Infrastructure(format!("reading {}: {e}", self.path.display()))
        })?;
        Ok(RawCatalog {
            body,
            format: CatalogFormat::from_location(&self.path.to_string_lossy()),
        })
    }
}

/// Serves a document held in memory.
#[derive(Debug, Clone)]
pub struct StaticCatalogSource {
    raw: RawCatalog,
}

impl StaticCatalogSource {
    /// Serves `body` as JSON.
    #[must_use]
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            raw: RawCatalog {
                body: body.into(),
                format: CatalogFormat::Json,
            },
        }
    }
}

#[async_trait]
impl CatalogSource for StaticCatalogSource {
    fn describe(&self) -> String {
        "static".to_owned()
    }

    async fn fetch(&self) -> Result<RawCatalog, DomainError> {
        Ok(self.raw.clone())
    }
}

/// Picks a source for a configured location: `http(s)://` URLs go over
/// HTTP, anything else is a file path.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the HTTP client cannot be built.
pub fn source_for_location(location: &str) -> Result<Arc<dyn CatalogSource>, DomainError> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Ok(Arc::new(HttpCatalogSource::new(location)?))
    } else {
        Ok(Arc::new(FileCatalogSource::new(location)))
    }
}

/// Loads the catalog at most once successfully; failures are retried on
/// the next call.
pub struct CatalogLoader {
    source: Option<Arc<dyn CatalogSource>>,
    rules: RuleBook,
    loaded: OnceCell<Arc<Catalog>>,
}

impl std::fmt::Debug for CatalogLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogLoader")
            .field("source", &self.source.as_ref().map(|s| s.describe()))
            .field("loaded", &self.loaded.initialized())
            .finish_non_exhaustive()
    }
}

impl CatalogLoader {
    /// Creates a loader; `rules` is used to validate what gets loaded.
    #[must_use]
    pub fn new(source: Arc<dyn CatalogSource>, rules: RuleBook) -> Self {
        Self {
            source: Some(source),
            rules,
            loaded: OnceCell::new(),
        }
    }

    /// A loader with nothing to load; every call yields `None`.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            source: None,
            rules: RuleBook::builtin(),
            loaded: OnceCell::new(),
        }
    }

    /// A loader that already holds `catalog`.
    #[must_use]
    pub fn preloaded(catalog: Arc<Catalog>) -> Self {
        Self {
            source: None,
            rules: RuleBook::builtin(),
            loaded: OnceCell::new_with(Some(catalog)),
        }
    }

    /// `true` if there is a source to load from.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.source.is_some()
    }

    /// The catalog if a load has succeeded; never fetches.
    #[must_use]
    pub fn get(&self) -> Option<Arc<Catalog>> {
        self.loaded.get().map(Arc::clone)
    }

    /// Returns the catalog, fetching it if no load has succeeded yet.
    ///
    /// Failures are logged and yield `None`; callers fall back to the
    /// built-in quest text and run without dialogue.
    pub async fn load(&self) -> Option<Arc<Catalog>> {
        if let Some(catalog) = self.get() {
            return Some(catalog);
        }
        let source = self.source.as_ref()?;
        match self
            .loaded
            .get_or_try_init(|| self.fetch_and_parse(source.as_ref()))
            .await
        {
            Ok(catalog) => Some(Arc::clone(catalog)),
            Err(err) => {
                tracing::warn!(source = %source.describe(), error = %err, "catalog unavailable; using built-in quest text");
                None
            }
        }
    }

    async fn fetch_and_parse(&self, source: &dyn CatalogSource) -> Result<Arc<Catalog>, DomainError> {
        let raw = source.fetch().await?;
        let catalog = Catalog::parse(&raw.body, raw.format)?;
        for issue in catalog.validate(&self.rules) {
            tracing::warn!(source = %source.describe(), %issue, "catalog issue");
        }
        tracing::info!(
            source = %source.describe(),
            quests = catalog.quests.len(),
            fingerprint = %fingerprint(&raw.body),
            "catalog loaded"
        );
        Ok(Arc::new(catalog))
    }
}
