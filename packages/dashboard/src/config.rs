//! Dashboard settings layered on top of the data service settings.

use std::time::Duration;

use rat_risk_analytics::search::DEFAULT_LIMIT;
use rat_risk_source::config::{ConfigError, ServiceConfig, parse_positive};

use crate::debounce::DEFAULT_IDLE;

/// Env var for the number of search results shown.
pub const SEARCH_LIMIT_ENV: &str = "RAT_RISK_SEARCH_LIMIT";
/// Env var for the search debounce period in milliseconds.
pub const SEARCH_DEBOUNCE_MS_ENV: &str = "RAT_RISK_SEARCH_DEBOUNCE_MS";

/// Everything the controller needs to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Connection settings for the data service.
    pub service: ServiceConfig,
    /// Maximum number of search results shown.
    pub search_limit: usize,
    /// Quiet period before a typed query is searched.
    pub search_debounce: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            search_limit: DEFAULT_LIMIT,
            search_debounce: DEFAULT_IDLE,
        }
    }
}

impl DashboardConfig {
    /// Reads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`. Unset or blank variables fall back
    /// to the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unusable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let service = ServiceConfig::from_lookup(&lookup)?;
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self {
            service,
            ..Self::default()
        };

        if let Some(limit) = get(SEARCH_LIMIT_ENV) {
            config.search_limit = parse_positive(SEARCH_LIMIT_ENV, &limit)? as usize;
        }
        if let Some(ms) = get(SEARCH_DEBOUNCE_MS_ENV) {
            config.search_debounce =
                Duration::from_millis(parse_positive(SEARCH_DEBOUNCE_MS_ENV, &ms)?.into());
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = DashboardConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.search_limit, 10);
        assert_eq!(config.search_debounce, Duration::from_millis(300));
    }

    #[test]
    fn overrides_apply_to_both_layers() {
        let config = DashboardConfig::from_lookup(lookup(&[
            (SEARCH_LIMIT_ENV, "25"),
            (SEARCH_DEBOUNCE_MS_ENV, "150"),
            ("RAT_RISK_FETCH_LIMIT", "500"),
        ]))
        .unwrap();

        assert_eq!(config.search_limit, 25);
        assert_eq!(config.search_debounce, Duration::from_millis(150));
        assert_eq!(config.service.fetch_limit, 500);
    }

    #[test]
    fn rejects_invalid_numbers() {
        assert!(DashboardConfig::from_lookup(lookup(&[(SEARCH_LIMIT_ENV, "0")])).is_err());
        assert!(DashboardConfig::from_lookup(lookup(&[(SEARCH_DEBOUNCE_MS_ENV, "fast")])).is_err());
    }
}
