//! Data service connection settings.
//!
//! Settings come from environment variables, falling back to defaults
//! that match a locally running data service.

use std::time::Duration;

/// Environment variable holding the data service base URL.
pub const API_URL_ENV: &str = "RAT_RISK_API_URL";
/// Environment variable holding the restaurant list dataset name.
pub const DATASET_ENV: &str = "RAT_RISK_DATASET";
/// Environment variable holding the restaurant list row limit.
pub const FETCH_LIMIT_ENV: &str = "RAT_RISK_FETCH_LIMIT";
/// Environment variable holding the per-request timeout in seconds.
pub const TIMEOUT_SECS_ENV: &str = "RAT_RISK_TIMEOUT_SECS";

/// Default data service base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";
/// Default restaurant list dataset.
pub const DEFAULT_DATASET: &str = "main_mart.fact_restaurant_rat";
/// Default restaurant list row limit.
pub const DEFAULT_FETCH_LIMIT: u32 = 2000;
/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from reading configuration values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set to a value that could not be used.
    #[error("Invalid value {value:?} for {key}: {message}")]
    Invalid {
        /// Variable name.
        key: String,
        /// Offending value.
        value: String,
        /// Why it was rejected.
        message: String,
    },
}

impl ConfigError {
    /// Builds an [`ConfigError::Invalid`] for `key`.
    #[must_use]
    pub fn invalid(key: &str, value: &str, message: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.to_string(),
            value: value.to_string(),
            message: message.into(),
        }
    }
}

/// Connection settings for [`crate::client::HttpDataService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Base URL without a trailing slash.
    pub base_url: String,
    /// Dataset served by the list endpoint.
    pub dataset: String,
    /// Row limit for the list endpoint.
    pub fetch_limit: u32,
    /// Timeout applied to every request.
    pub timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            dataset: DEFAULT_DATASET.to_string(),
            fetch_limit: DEFAULT_FETCH_LIMIT,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ServiceConfig {
    /// Reads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its
    /// value. Unset or blank variables fall back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unusable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get(API_URL_ENV) {
            config.base_url = normalize_base_url(API_URL_ENV, &url)?;
        }
        if let Some(dataset) = get(DATASET_ENV) {
            config.dataset = dataset.trim().to_string();
        }
        if let Some(limit) = get(FETCH_LIMIT_ENV) {
            config.fetch_limit = parse_positive(FETCH_LIMIT_ENV, &limit)?;
        }
        if let Some(secs) = get(TIMEOUT_SECS_ENV) {
            config.timeout = Duration::from_secs(parse_positive(TIMEOUT_SECS_ENV, &secs)?.into());
        }

        Ok(config)
    }

    /// Replaces the base URL, validating it the same way as
    /// [`Self::from_lookup`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `url` is not an absolute `http(s)` URL.
    pub fn with_base_url(mut self, url: &str) -> Result<Self, ConfigError> {
        self.base_url = normalize_base_url(API_URL_ENV, url)?;
        Ok(self)
    }
}

/// Validates an absolute `http`/`https` URL and strips trailing slashes.
///
/// # Errors
///
/// Returns [`ConfigError`] if the URL does not parse or uses another
/// scheme.
pub fn normalize_base_url(key: &str, url: &str) -> Result<String, ConfigError> {
    let trimmed = url.trim().trim_end_matches('/');
    let parsed =
        reqwest::Url::parse(trimmed).map_err(|e| ConfigError::invalid(key, url, e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::invalid(key, url, "expected an http or https URL"));
    }
    Ok(trimmed.to_string())
}

/// Parses a strictly positive integer setting.
///
/// # Errors
///
/// Returns [`ConfigError`] if `value` is not a positive integer.
pub fn parse_positive(key: &str, value: &str) -> Result<u32, ConfigError> {
    match value.trim().parse::<u32>() {
        Ok(0) => Err(ConfigError::invalid(key, value, "must be greater than zero")),
        Ok(n) => Ok(n),
        Err(e) => Err(ConfigError::invalid(key, value, e.to_string())),
    }
}
