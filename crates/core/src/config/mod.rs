//! Layered settings for feedstash.
//!
//! Sources, lowest to highest precedence:
//!
//! 1. compiled-in defaults
//! 2. the TOML file named by `FEEDSTASH_CONFIG_FILE`, when set
//! 3. `FEEDSTASH_*` environment variables (`FEEDSTASH_TIMEOUT_MS`, ...)
//!
//! Every key is optional. `feed_url` is only checked when something asks
//! for it through [`AppConfig::require_feed_url`].

use std::path::PathBuf;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use url::Url;

mod feed_url;
mod validation;

pub use feed_url::{UrlError, canonicalize};
pub use validation::ConfigError;

use crate::cache::CachePolicy;
use crate::cache::policy::DEFAULT_MAX_CACHE_AGE_DAYS;

const ENV_PREFIX: &str = "FEEDSTASH_";
const CONFIG_FILE_VAR: &str = "FEEDSTASH_CONFIG_FILE";

/// Which store adapter backs the local cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Sqlite,
    Json,
    Memory,
}

/// Merged settings. Missing keys fall back to [`AppConfig::default`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Remote feed endpoint (`FEEDSTASH_FEED_URL`).
    pub feed_url: Option<String>,

    /// Cache adapter: `sqlite`, `json` or `memory` (`FEEDSTASH_STORE`).
    pub store: StoreKind,

    /// SQLite database used when `store = "sqlite"`.
    pub db_path: PathBuf,

    /// JSON document used when `store = "json"`.
    pub json_path: PathBuf,

    pub user_agent: String,

    /// Per-request HTTP timeout.
    pub timeout_ms: u64,

    /// Calendar days a cached feed stays fresh.
    pub max_cache_age_days: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            feed_url: None,
            store: StoreKind::Sqlite,
            db_path: PathBuf::from("./feedstash-cache.sqlite"),
            json_path: PathBuf::from("./feedstash-cache.json"),
            user_agent: "feedstash/0.1".into(),
            timeout_ms: 20_000,
            max_cache_age_days: DEFAULT_MAX_CACHE_AGE_DAYS,
        }
    }
}

impl AppConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy::new(self.max_cache_age_days)
    }

    /// Defaults merged with the optional TOML file and the environment.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(path) = std::env::var(CONFIG_FILE_VAR) {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(
            Env::prefixed(ENV_PREFIX)
                .ignore(&["config_file", "log_json"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }

    /// Load from every source and validate.
    ///
    /// # Errors
    ///
    /// `ConfigError::LoadFailed` when a source cannot be read or a value has
    /// the wrong type; `ConfigError::Invalid` when a value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        Self::extract(Self::figment())
    }

    /// Extract and validate from an already-assembled figment.
    pub fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// The canonical feed endpoint.
    ///
    /// # Errors
    ///
    /// `ConfigError::Missing` when no URL is configured and
    /// `ConfigError::Invalid` when it does not canonicalize.
    pub fn require_feed_url(&self) -> Result<Url, ConfigError> {
        let Some(raw) = self.feed_url.as_deref() else {
            return Err(ConfigError::Missing {
                field: "feed_url".into(),
                hint: format!("set {ENV_PREFIX}FEED_URL or feed_url in the config file"),
            });
        };

        canonicalize(raw).map_err(|e| ConfigError::invalid("feed_url", e))
    }
}
