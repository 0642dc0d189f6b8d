//! Range and format checks run after the layers are merged.

use std::fmt::Display;
use std::ops::RangeInclusive;

use thiserror::Error;

use crate::config::AppConfig;

const TIMEOUT_MS: RangeInclusive<u64> = 100..=300_000;
const MAX_CACHE_AGE_DAYS: RangeInclusive<u64> = 1..=365;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, reason: impl Display) -> Self {
        ConfigError::Invalid { field: field.to_string(), reason: reason.to_string() }
    }
}

fn within<T: PartialOrd + Display>(field: &str, value: T, range: &RangeInclusive<T>) -> Result<(), ConfigError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{value} is outside {}..={}", range.start(), range.end())))
    }
}

impl AppConfig {
    /// Check merged values.
    ///
    /// # Errors
    ///
    /// `ConfigError::Invalid` naming the first offending field:
    /// - `timeout_ms` outside 100..=300000
    /// - `max_cache_age_days` outside 1..=365
    /// - `user_agent` blank or containing control characters
    pub fn validate(&self) -> Result<(), ConfigError> {
        within("timeout_ms", self.timeout_ms, &TIMEOUT_MS)?;
        within("max_cache_age_days", self.max_cache_age_days, &MAX_CACHE_AGE_DAYS)?;

        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::invalid("user_agent", "must not be blank"));
        }
        if self.user_agent.chars().any(char::is_control) {
            return Err(ConfigError::invalid("user_agent", "must not contain control characters"));
        }

        if self.feed_url.is_none() {
            tracing::debug!("feed_url is not set; remote loading is unavailable");
        }

        Ok(())
    }
}
