//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;
use crate::state::DEFAULT_SESSION_IDLE_TIMEOUT;

/// Settings the server needs at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// SQLite database file; `None` keeps documents in memory.
    pub database_path: Option<PathBuf>,
    /// Catalog URL or file path; `None` runs without a catalog.
    pub catalog_location: Option<String>,
    /// Safety-net interval of each player's reconciliation loop.
    pub reconcile_interval: Duration,
    /// How long an unused player session stays open.
    pub session_idle_timeout: Duration,
}

impl AppConfig {
    /// Reads `HOST`, `PORT`, `QUESTLINE_DB`, `QUESTLINE_CATALOG`,
    /// `QUESTLINE_RECONCILE_MS` and `QUESTLINE_SESSION_IDLE_SECS`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a value does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a value does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match non_empty("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?,
            None => 3000,
        };
        let reconcile_ms: u64 = match non_empty("QUESTLINE_RECONCILE_MS") {
            Some(raw) => raw.trim().parse().map_err(|e| {
                AppError::Config(format!("QUESTLINE_RECONCILE_MS must be a whole number: {e}"))
            })?,
            None => 5000,
        };
        if reconcile_ms == 0 {
            return Err(AppError::Config(
                "QUESTLINE_RECONCILE_MS must be greater than zero".to_string(),
            ));
        }

        let idle_secs: u64 = match non_empty("QUESTLINE_SESSION_IDLE_SECS") {
            Some(raw) => raw.trim().parse().map_err(|e| {
                AppError::Config(format!("QUESTLINE_SESSION_IDLE_SECS must be a whole number: {e}"))
            })?,
            None => DEFAULT_SESSION_IDLE_TIMEOUT.as_secs(),
        };
        if idle_secs == 0 {
            return Err(AppError::Config(
                "QUESTLINE_SESSION_IDLE_SECS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            host,
            port,
            database_path: non_empty("QUESTLINE_DB").map(PathBuf::from),
            catalog_location: non_empty("QUESTLINE_CATALOG"),
            reconcile_interval: Duration::from_millis(reconcile_ms),
            session_idle_timeout: Duration::from_secs(idle_secs),
        })
    }

    /// Address to bind.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `host:port` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}
