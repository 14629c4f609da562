//! Gateway configuration types.
//!
//! This module defines configuration structures for the HTTP gateway and
//! their environment-variable overrides.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held a value that could not be parsed.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// The variable name.
        key: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// Which store backs the `users` resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserBackend {
    /// In-process store; routes are public.
    #[default]
    Memory,
    /// `RocksDB` store with the user schema; routes need a bearer token.
    Persistent,
}

impl UserBackend {
    /// Returns `true` if `users` routes sit behind the auth gate.
    #[must_use]
    pub const fn requires_auth(self) -> bool {
        matches!(self, Self::Persistent)
    }
}

impl FromStr for UserBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "persistent" | "rocksdb" => Ok(Self::Persistent),
            _ => Err(ConfigError::InvalidValue {
                key: "USER_BACKEND",
                value: s.to_string(),
            }),
        }
    }
}

/// Configuration for the gateway service.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Listen address (e.g., "0.0.0.0:3000").
    #[serde(default = "GatewayConfig::default_listen_addr")]
    pub listen_addr: String,

    /// Store backing the `users` resource.
    #[serde(default)]
    pub user_backend: UserBackend,

    /// Directory of the persistent store.
    #[serde(default = "GatewayConfig::default_store_path")]
    pub store_path: PathBuf,

    /// Allowed CORS origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    #[serde(default = "GatewayConfig::default_max_body")]
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    #[serde(default = "GatewayConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl GatewayConfig {
    fn default_listen_addr() -> String {
        "0.0.0.0:3000".to_string()
    }

    fn default_store_path() -> PathBuf {
        PathBuf::from("./data/stockroom")
    }

    const fn default_max_body() -> usize {
        1024 * 1024 // 1 MB
    }

    const fn default_request_timeout() -> u64 {
        30
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Build a configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from a variable lookup, starting from defaults.
    ///
    /// Recognised keys: `LISTEN_ADDR` (or `PORT`), `USER_BACKEND`,
    /// `STORE_PATH`, `CORS_ORIGINS` (comma separated), `MAX_BODY_BYTES`,
    /// and `REQUEST_TIMEOUT_SECONDS`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("LISTEN_ADDR") {
            config.listen_addr = addr;
        } else if let Some(port) = lookup("PORT") {
            let port: u16 = parse("PORT", &port)?;
            config.listen_addr = format!("0.0.0.0:{port}");
        }
        if let Some(backend) = lookup("USER_BACKEND") {
            config.user_backend = backend.parse()?;
        }
        if let Some(path) = lookup("STORE_PATH") {
            config.store_path = PathBuf::from(path);
        }
        if let Some(origins) = lookup("CORS_ORIGINS") {
            config.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(bytes) = lookup("MAX_BODY_BYTES") {
            config.max_body_bytes = parse("MAX_BODY_BYTES", &bytes)?;
        }
        if let Some(secs) = lookup("REQUEST_TIMEOUT_SECONDS") {
            config.request_timeout_seconds = parse("REQUEST_TIMEOUT_SECONDS", &secs)?;
        }

        Ok(config)
    }
}

fn parse<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: Self::default_listen_addr(),
            user_backend: UserBackend::default(),
            store_path: Self::default_store_path(),
            cors_origins: vec!["*".to_string()],
            max_body_bytes: Self::default_max_body(),
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.listen_addr, "0.0.0.0:3000");
        assert_eq!(config.user_backend, UserBackend::Memory);
        assert_eq!(config.max_body_bytes, 1024 * 1024);
        assert_eq!(config.cors_origins, vec!["*".to_string()]);
    }

    #[test]
    fn timeout_duration() {
        let config = GatewayConfig::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn port_sets_listen_addr() {
        let config = GatewayConfig::from_lookup(lookup(&[("PORT", "5000")])).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:5000");
    }

    #[test]
    fn listen_addr_wins_over_port() {
        let config = GatewayConfig::from_lookup(lookup(&[
            ("PORT", "5000"),
            ("LISTEN_ADDR", "127.0.0.1:9000"),
        ]))
        .unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:9000");
    }

    #[test]
    fn persistent_backend_from_env() {
        let config = GatewayConfig::from_lookup(lookup(&[
            ("USER_BACKEND", "Persistent"),
            ("STORE_PATH", "/tmp/stockroom"),
            ("CORS_ORIGINS", "http://a.test, http://b.test"),
        ]))
        .unwrap();
        assert!(config.user_backend.requires_auth());
        assert_eq!(config.store_path, PathBuf::from("/tmp/stockroom"));
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn invalid_values_are_reported() {
        assert!(matches!(
            GatewayConfig::from_lookup(lookup(&[("USER_BACKEND", "postgres")])),
            Err(ConfigError::InvalidValue {
                key: "USER_BACKEND",
                ..
            })
        ));
        assert!(GatewayConfig::from_lookup(lookup(&[("PORT", "http")])).is_err());
        assert!(GatewayConfig::from_lookup(lookup(&[("MAX_BODY_BYTES", "-1")])).is_err());
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: GatewayConfig =
            serde_json::from_str(r#"{ "user_backend": "persistent" }"#).unwrap();
        assert_eq!(config.user_backend, UserBackend::Persistent);
        assert_eq!(config.request_timeout_seconds, 30);
        assert!(config.cors_origins.is_empty());
    }
}
