//! Application configuration
//!
//! Loaded from an optional JSON file, then overridden by environment variables:
//!
//! | Variable | Field |
//! |---|---|
//! | `ASSESSOR_GATEWAY_URL` | `gateway.url` |
//! | `ASSESSOR_ANON_KEY` | `gateway.anon_key` |
//! | `ASSESSOR_SESSION_KEY` | `gateway.session_key` |
//! | `ASSESSOR_GATEWAY_TIMEOUT_SECS` | `gateway.timeout_secs` |
//! | `ASSESSOR_HOST` | `server.host` |
//! | `ASSESSOR_PORT` | `server.port` |
//! | `ASSESSOR_LOG_LEVEL` | `log_level` |
//!
//! The gateway URL and both keys are required to serve against the hosted database.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http_server::HttpServerConfig;
use crate::observability::Severity;

pub const ENV_GATEWAY_URL: &str = "ASSESSOR_GATEWAY_URL";
pub const ENV_ANON_KEY: &str = "ASSESSOR_ANON_KEY";
pub const ENV_SESSION_KEY: &str = "ASSESSOR_SESSION_KEY";
pub const ENV_GATEWAY_TIMEOUT: &str = "ASSESSOR_GATEWAY_TIMEOUT_SECS";
pub const ENV_HOST: &str = "ASSESSOR_HOST";
pub const ENV_PORT: &str = "ASSESSOR_PORT";
pub const ENV_LOG_LEVEL: &str = "ASSESSOR_LOG_LEVEL";

/// Configuration errors; all are fatal at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid setting {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Remote gateway settings as written in the file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub url: Option<String>,

    /// Anonymous/public key, used only for reference tables
    #[serde(default)]
    pub anon_key: Option<String>,

    /// Session-scoped key for filtered search and procedures
    #[serde(default)]
    pub session_key: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    15
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            session_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Gateway settings after validation
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedGateway {
    pub url: String,
    pub anon_key: String,
    pub session_key: String,
    pub timeout: Duration,
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: HttpServerConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: HttpServerConfig::default(),
            gateway: GatewayConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Load from an optional file, then apply process environment overrides
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Parse a JSON config file
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Apply overrides from an environment lookup. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_GATEWAY_URL) {
            self.gateway.url = Some(url);
        }
        if let Some(key) = get(ENV_ANON_KEY) {
            self.gateway.anon_key = Some(key);
        }
        if let Some(key) = get(ENV_SESSION_KEY) {
            self.gateway.session_key = Some(key);
        }
        if let Some(secs) = get(ENV_GATEWAY_TIMEOUT) {
            self.gateway.timeout_secs = secs.trim().parse().map_err(|_| ConfigError::Invalid {
                name: ENV_GATEWAY_TIMEOUT,
                reason: format!("not a number of seconds: {secs}"),
            })?;
        }
        if let Some(host) = get(ENV_HOST) {
            self.server.host = host;
        }
        if let Some(port) = get(ENV_PORT) {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                name: ENV_PORT,
                reason: format!("not a port number: {port}"),
            })?;
        }
        if let Some(level) = get(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
        Ok(())
    }

    /// Minimum log severity
    pub fn log_severity(&self) -> ConfigResult<Severity> {
        self.log_level
            .parse()
            .map_err(|reason| ConfigError::Invalid {
                name: ENV_LOG_LEVEL,
                reason,
            })
    }

    /// Validate gateway settings required to talk to the hosted database
    pub fn resolve_gateway(&self) -> ConfigResult<ResolvedGateway> {
        fn required(value: &Option<String>, name: &'static str) -> ConfigResult<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or(ConfigError::Missing(name))
        }

        let url = required(&self.gateway.url, ENV_GATEWAY_URL)?;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                name: ENV_GATEWAY_URL,
                reason: format!("expected an http(s) URL, got {url}"),
            });
        }
        if self.gateway.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: ENV_GATEWAY_TIMEOUT,
                reason: "timeout must be > 0".to_string(),
            });
        }

        Ok(ResolvedGateway {
            url,
            anon_key: required(&self.gateway.anon_key, ENV_ANON_KEY)?,
            session_key: required(&self.gateway.session_key, ENV_SESSION_KEY)?,
            timeout: Duration::from_secs(self.gateway.timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_env_overrides_and_resolves() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[
                (ENV_GATEWAY_URL, "https://db.example.org"),
                (ENV_ANON_KEY, "anon"),
                (ENV_SESSION_KEY, "session"),
                (ENV_PORT, "9090"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 9090);
        let resolved = config.resolve_gateway().unwrap();
        assert_eq!(resolved.url, "https://db.example.org");
        assert_eq!(resolved.anon_key, "anon");
        assert_eq!(resolved.session_key, "session");
        assert_eq!(resolved.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_missing_session_key_is_fatal() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[
                (ENV_GATEWAY_URL, "https://db.example.org"),
                (ENV_ANON_KEY, "anon"),
                (ENV_SESSION_KEY, "   "),
            ]))
            .unwrap();

        let err = config.resolve_gateway().unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ENV_SESSION_KEY)));
    }

    #[test]
    fn test_missing_url_reported_first() {
        let err = AppConfig::default().resolve_gateway().unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing required setting ASSESSOR_GATEWAY_URL"
        );
    }

    #[test]
    fn test_bad_port_is_invalid() {
        let mut config = AppConfig::default();
        let err = config.apply_env(env(&[(ENV_PORT, "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: ENV_PORT, .. }));
    }

    #[test]
    fn test_non_http_url_rejected() {
        let mut config = AppConfig::default();
        config.gateway.url = Some("ftp://db".to_string());
        config.gateway.anon_key = Some("a".to_string());
        config.gateway.session_key = Some("s".to_string());
        assert!(matches!(
            config.resolve_gateway(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_file_then_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"server": {{"port": 7000}}, "gateway": {{"url": "https://file.example.org", "anon_key": "file-anon", "session_key": "file-session"}}, "log_level": "warn"}}"#
        )
        .unwrap();

        let mut config = AppConfig::from_file(file.path()).unwrap();
        config
            .apply_env(env(&[(ENV_ANON_KEY, "env-anon")]))
            .unwrap();

        assert_eq!(config.server.port, 7000);
        assert_eq!(config.log_severity().unwrap(), Severity::Warn);
        let resolved = config.resolve_gateway().unwrap();
        assert_eq!(resolved.url, "https://file.example.org");
        assert_eq!(resolved.anon_key, "env-anon");
        assert_eq!(resolved.session_key, "file-session");
    }

    #[test]
    fn test_unreadable_file() {
        let err = AppConfig::from_file(Path::new("/nonexistent/admin.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
