//! Client configuration.
//!
//! Read from environment variables, each with a default:
//! - `LINKED_API_URL`: backend base URL (default: "http://localhost:8000")
//! - `LINKED_SESSION`: value of the `session` cookie (default: none)
//! - `LINKED_RECONNECT_MS`: event stream reconnect delay (default: 3000)
//! - `LINKED_VIEWPORT_DEBOUNCE_MS`: viewport save quiet period (default: 500)

use std::time::Duration;

use reqwest::Url;

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_RECONNECT_MS: u64 = 3000;
pub const DEFAULT_VIEWPORT_DEBOUNCE_MS: u64 = 500;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: Url,
    pub session: Option<String>,
    /// Wait before reopening a dropped event stream, until the server
    /// overrides it with a `retry:` field.
    pub reconnect_delay: Duration,
    pub viewport_debounce: Duration,
}

impl ClientConfig {
    /// Configuration for a backend at `api_url` with every other setting at
    /// its default.
    pub fn new(api_url: Url) -> Self {
        ClientConfig {
            api_url,
            session: None,
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_MS),
            viewport_debounce: Duration::from_millis(DEFAULT_VIEWPORT_DEBOUNCE_MS),
        }
    }

    pub fn with_session(mut self, session: impl Into<String>) -> Self {
        self.session = Some(session.into());
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds a configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url = lookup("LINKED_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = Url::parse(&raw_url).map_err(|_| ConfigError::InvalidUrl {
            var: "LINKED_API_URL",
            value: raw_url.clone(),
        })?;

        let session = lookup("LINKED_SESSION").filter(|s| !s.is_empty());
        let reconnect_delay = millis(&lookup, "LINKED_RECONNECT_MS", DEFAULT_RECONNECT_MS)?;
        let viewport_debounce = millis(
            &lookup,
            "LINKED_VIEWPORT_DEBOUNCE_MS",
            DEFAULT_VIEWPORT_DEBOUNCE_MS,
        )?;

        Ok(ClientConfig {
            api_url,
            session,
            reconnect_delay,
            viewport_debounce,
        })
    }
}

fn millis(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: u64,
) -> Result<Duration, ConfigError> {
    match lookup(var) {
        None => Ok(Duration::from_millis(default)),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::InvalidMillis { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = ClientConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.api_url.as_str(), "http://localhost:8000/");
        assert!(config.session.is_none());
        assert_eq!(config.reconnect_delay, Duration::from_millis(3000));
        assert_eq!(config.viewport_debounce, Duration::from_millis(500));
    }

    #[test]
    fn reads_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("LINKED_API_URL", "https://maps.example.net/api"),
            ("LINKED_SESSION", "abc123"),
            ("LINKED_RECONNECT_MS", "250"),
        ]))
        .unwrap();
        assert_eq!(config.api_url.as_str(), "https://maps.example.net/api");
        assert_eq!(config.session.as_deref(), Some("abc123"));
        assert_eq!(config.reconnect_delay, Duration::from_millis(250));
    }

    #[test]
    fn rejects_bad_values() {
        let err = ClientConfig::from_lookup(lookup_from(&[("LINKED_RECONNECT_MS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMillis { var: "LINKED_RECONNECT_MS", .. }));

        let err = ClientConfig::from_lookup(lookup_from(&[("LINKED_API_URL", "not a url")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }
}
