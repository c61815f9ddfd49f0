//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `BAZAAR_API_URL` - API origin, e.g. `https://bazaar.example.sd` (default: `http://localhost:5000`)
//! - `BAZAAR_DOMAIN` - Deployment domain; used as `https://<domain>` when `BAZAAR_API_URL` is unset
//! - `BAZAAR_STATE_PATH` - Persisted state file (default: `<data dir>/sudanese-bazaar/state.json`)
//! - `BAZAAR_HTTP_TIMEOUT_SECS` - Per-request timeout in seconds (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_ORIGIN: &str = "http://localhost:5000";
const DEFAULT_TIMEOUT_SECS: &str = "30";
const DEV_PORT_SUFFIX: &str = ":5000";
const STATE_DIR: &str = "sudanese-bazaar";
const STATE_FILE: &str = "state.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Scheme, host and port of the API server (no path)
    pub api_origin: Url,
    /// File holding the persisted subset of the store
    pub state_path: PathBuf,
    /// Timeout applied to every API request
    pub http_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_origin = resolve_origin(&lookup)?;

        let state_path = lookup("BAZAAR_STATE_PATH")
            .filter(|p| !p.trim().is_empty())
            .map_or_else(default_state_path, PathBuf::from);

        let timeout = lookup("BAZAAR_HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|| DEFAULT_TIMEOUT_SECS.to_string());
        let secs = timeout.trim().parse::<u64>().map_err(|e| {
            ConfigError::InvalidEnvVar("BAZAAR_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
        })?;
        if secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "BAZAAR_HTTP_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            api_origin,
            state_path,
            http_timeout: Duration::from_secs(secs),
            sentry_dsn: lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
        })
    }

    /// Configuration pointing at `origin` with default timeout and the given
    /// state file.
    #[must_use]
    pub fn for_origin(origin: Url, state_path: PathBuf) -> Self {
        Self {
            api_origin: origin,
            state_path,
            http_timeout: Duration::from_secs(30),
            sentry_dsn: None,
        }
    }

    /// Root of the REST API (`<origin>/api`).
    #[must_use]
    pub fn api_root(&self) -> Url {
        let mut root = self.api_origin.clone();
        root.set_path("/api");
        root.set_query(None);
        root.set_fragment(None);
        root
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Pick the API origin: explicit URL, then deployment domain, then localhost.
fn resolve_origin(lookup: &impl Fn(&str) -> Option<String>) -> Result<Url, ConfigError> {
    let (key, raw) = if let Some(url) = lookup("BAZAAR_API_URL").filter(|u| !u.is_empty()) {
        ("BAZAAR_API_URL", url)
    } else if let Some(domain) = lookup("BAZAAR_DOMAIN").filter(|d| !d.is_empty()) {
        // Dev deployments expose the API port on the public domain
        let host = domain.replace(DEV_PORT_SUFFIX, "");
        ("BAZAAR_DOMAIN", format!("https://{host}"))
    } else {
        ("BAZAAR_API_URL", DEFAULT_ORIGIN.to_string())
    };

    let url = Url::parse(&raw)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected an http(s) origin, got {raw}"),
        ));
    }
    Ok(url)
}

/// Platform data directory, falling back to a dot-directory in the CWD.
fn default_state_path() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from(".bazaar").join(STATE_FILE),
        |dir| dir.join(STATE_DIR).join(STATE_FILE),
    )
}
