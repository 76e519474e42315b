//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;

use crate::cache::DEFAULT_MAX_AGE_MS;
use crate::coordinator::CoordinatorConfig;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the history backend
    pub endpoint: String,
    /// User to act for at startup
    pub user_id: Option<String>,
    /// Bearer credential for the backend
    pub credential: Option<String>,
    /// Fetch history automatically once per credential session
    pub auto_fetch: bool,
    /// How old cached records may be and still serve as a fallback, in ms
    pub cache_max_age_ms: u64,
    /// Background purge interval in seconds
    pub purge_interval: u64,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `HISTORY_ENDPOINT` - Backend base URL (default: http://localhost:8080/api)
    /// - `HISTORY_USER_ID` - Initial user (default: none)
    /// - `HISTORY_TOKEN` - Initial credential (default: none)
    /// - `AUTO_FETCH` - `true`/`false` (default: true)
    /// - `CACHE_MAX_AGE_MS` - Cache fallback window (default: 600000)
    /// - `PURGE_INTERVAL` - Purge frequency in seconds (default: 60)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            endpoint: env::var("HISTORY_ENDPOINT").unwrap_or(defaults.endpoint),
            user_id: non_empty_var("HISTORY_USER_ID"),
            credential: non_empty_var("HISTORY_TOKEN"),
            auto_fetch: env::var("AUTO_FETCH")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.auto_fetch),
            cache_max_age_ms: parsed_var("CACHE_MAX_AGE_MS").unwrap_or(defaults.cache_max_age_ms),
            purge_interval: parsed_var("PURGE_INTERVAL").unwrap_or(defaults.purge_interval),
            server_port: parsed_var("SERVER_PORT").unwrap_or(defaults.server_port),
        }
    }

    /// Coordinator settings derived from this configuration.
    pub fn coordinator(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            endpoint: self.endpoint.clone(),
            user_id: self.user_id.clone(),
            credential: self.credential.clone(),
            auto_fetch: self.auto_fetch,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/api".to_string(),
            user_id: None,
            credential: None,
            auto_fetch: true,
            cache_max_age_ms: DEFAULT_MAX_AGE_MS,
            purge_interval: 60,
            server_port: 3000,
        }
    }
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.endpoint, "http://localhost:8080/api");
        assert!(config.user_id.is_none());
        assert!(config.auto_fetch);
        assert_eq!(config.cache_max_age_ms, 600_000);
        assert_eq!(config.purge_interval, 60);
        assert_eq!(config.server_port, 3000);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        for name in [
            "HISTORY_ENDPOINT",
            "HISTORY_USER_ID",
            "HISTORY_TOKEN",
            "AUTO_FETCH",
            "CACHE_MAX_AGE_MS",
            "PURGE_INTERVAL",
            "SERVER_PORT",
        ] {
            env::remove_var(name);
        }

        let config = Config::from_env();
        assert_eq!(config.endpoint, "http://localhost:8080/api");
        assert!(config.credential.is_none());
        assert!(config.auto_fetch);
        assert_eq!(config.cache_max_age_ms, 600_000);
        assert_eq!(config.server_port, 3000);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" off "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_coordinator_config_from_config() {
        let config = Config {
            user_id: Some("alice".to_string()),
            credential: Some("tok".to_string()),
            auto_fetch: false,
            ..Config::default()
        };

        let coordinator = config.coordinator();
        assert_eq!(coordinator.user_id.as_deref(), Some("alice"));
        assert_eq!(coordinator.credential.as_deref(), Some("tok"));
        assert!(!coordinator.auto_fetch);
    }
}
