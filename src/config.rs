//! Client configuration, with defaults and environment overrides.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Default backend location.
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
/// Default location of the storefront pages, used to build redirects.
pub const DEFAULT_APP_URL: &str = "http://localhost:3000";
/// Default whole-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Default connection timeout.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Default number of retries for read queries that could not reach the backend.
pub const DEFAULT_QUERY_RETRIES: u8 = 1;

/// Errors raised while building a client from configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A URL setting is not an absolute `http(s)` URL.
    #[error("Invalid {name}: {value:?} must be an absolute http:// or https:// URL")]
    InvalidUrl {
        /// Setting name.
        name: &'static str,
        /// Rejected value.
        value: String,
    },
    /// The persisted session could not be opened.
    #[error("Could not open session storage: {0}")]
    Storage(#[from] crate::StorageError),
    /// The HTTP client could not be created.
    #[error("Could not create HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Settings used by [`crate::FanStore::with_config`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL, e.g. `https://api.example.com/api`.
    pub api_url: String,
    /// Storefront base URL, used for redirect locations.
    pub app_url: String,
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// How many times an unreachable read query is retried.
    pub query_retries: u8,
    /// Where the session is persisted. `None` keeps it in memory.
    pub storage_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            app_url: DEFAULT_APP_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            query_retries: DEFAULT_QUERY_RETRIES,
            storage_path: None,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `FANSTORE_*` environment variables.
    ///
    /// | Variable | Setting |
    /// |---|---|
    /// | `FANSTORE_API_URL` | `api_url` |
    /// | `FANSTORE_APP_URL` | `app_url` |
    /// | `FANSTORE_TIMEOUT_SECS` | `timeout` |
    /// | `FANSTORE_CONNECT_TIMEOUT_SECS` | `connect_timeout` |
    /// | `FANSTORE_QUERY_RETRIES` | `query_retries` |
    /// | `FANSTORE_STORAGE_PATH` | `storage_path` |
    ///
    /// Unparseable numbers fall back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            api_url: non_empty("FANSTORE_API_URL").unwrap_or(defaults.api_url),
            app_url: non_empty("FANSTORE_APP_URL").unwrap_or(defaults.app_url),
            timeout: non_empty("FANSTORE_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse().ok())
                .map_or(defaults.timeout, Duration::from_secs),
            connect_timeout: non_empty("FANSTORE_CONNECT_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse().ok())
                .map_or(defaults.connect_timeout, Duration::from_secs),
            query_retries: non_empty("FANSTORE_QUERY_RETRIES")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.query_retries),
            storage_path: non_empty("FANSTORE_STORAGE_PATH").map(PathBuf::from),
        }
    }
}

/// Checks that `value` is an absolute `http(s)` URL and strips trailing slashes.
pub(crate) fn normalize_url(name: &'static str, value: &str) -> Result<reqwest::Url, ConfigError> {
    let trimmed = value.trim().trim_end_matches('/');
    let invalid = || ConfigError::InvalidUrl {
        name,
        value: value.to_string(),
    };

    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(invalid());
    }

    reqwest::Url::parse(trimmed).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        assert_eq!(ClientConfig::from_lookup(lookup(&[])), ClientConfig::default());
    }

    #[test]
    fn variables_override_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("FANSTORE_API_URL", "https://api.shop.vn/api"),
            ("FANSTORE_TIMEOUT_SECS", "5"),
            ("FANSTORE_QUERY_RETRIES", "0"),
            ("FANSTORE_STORAGE_PATH", "/tmp/session.json"),
        ]));

        assert_eq!(config.api_url, "https://api.shop.vn/api");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.query_retries, 0);
        assert_eq!(config.storage_path, Some(PathBuf::from("/tmp/session.json")));
        assert_eq!(config.app_url, DEFAULT_APP_URL);
    }

    #[test]
    fn garbage_numbers_fall_back() {
        let config = ClientConfig::from_lookup(lookup(&[("FANSTORE_CONNECT_TIMEOUT_SECS", "soon")]));

        assert_eq!(config.connect_timeout, Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS));
    }

    #[test]
    fn normalize_url_rejects_relative() {
        assert!(normalize_url("api_url", "localhost:8080").is_err());
        assert_eq!(
            normalize_url("api_url", "http://localhost:8080/api/").unwrap().as_str(),
            "http://localhost:8080/api"
        );
    }
}
