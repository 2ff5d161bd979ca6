//! Configuration loading for the SmartTask client
//!
//! Every setting is resolved with the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8081";
pub const DEFAULT_HOLIDAY_API_URL: &str = "https://date.nager.at/api/v3";
pub const DEFAULT_HOLIDAY_COUNTRY: &str = "PT";
pub const DEFAULT_TOPIC: &str = "/topic/comparison/all";
pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const ENV_BASE_URL: &str = "SMARTASK_BASE_URL";
pub const ENV_STREAM_URL: &str = "SMARTASK_STREAM_URL";
pub const ENV_LOG_LEVEL: &str = "SMARTASK_LOG_LEVEL";

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TomlConfig {
    pub base_url: Option<String>,
    pub stream_url: Option<String>,
    pub holiday_api_url: Option<String>,
    pub holiday_country: Option<String>,
    pub topic: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub log_level: Option<String>,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub base_url: Option<String>,
    pub stream_url: Option<String>,
    pub log_level: Option<String>,
}

/// Fully resolved client configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Backend REST root, without trailing slash
    pub base_url: String,
    /// Server-Sent-Events endpoint carrying the broadcast topic
    pub stream_url: String,
    pub holiday_api_url: String,
    pub holiday_country: String,
    /// Broadcast topic shared by all clients
    pub topic: String,
    /// `None` means requests wait for the backend indefinitely
    pub request_timeout_secs: Option<u64>,
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_sources(&ConfigOverrides::default(), |_| None, None)
    }
}

impl ClientConfig {
    /// Resolve configuration from the process environment and config file
    pub fn resolve(overrides: &ConfigOverrides) -> Self {
        let file = match overrides.config_path.clone().or_else(default_config_path) {
            Some(path) => match load_toml_config(&path) {
                Ok(config) => {
                    debug!("Loaded config file {}", path.display());
                    Some(config)
                }
                Err(e) => {
                    warn!("Ignoring config file {}: {}", path.display(), e);
                    None
                }
            },
            None => None,
        };

        Self::from_sources(overrides, |name| std::env::var(name).ok(), file)
    }

    /// Merge the configuration sources in priority order
    pub fn from_sources<F>(overrides: &ConfigOverrides, env: F, file: Option<TomlConfig>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = file.unwrap_or_default();

        let base_url = overrides
            .base_url
            .clone()
            .or_else(|| env(ENV_BASE_URL))
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = trim_url(&base_url);

        let stream_url = overrides
            .stream_url
            .clone()
            .or_else(|| env(ENV_STREAM_URL))
            .or(file.stream_url)
            .map(|url| trim_url(&url))
            .unwrap_or_else(|| format!("{}/stream", base_url));

        let log_level = overrides
            .log_level
            .clone()
            .or_else(|| env(ENV_LOG_LEVEL))
            .or(file.log_level)
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Self {
            base_url,
            stream_url,
            holiday_api_url: file
                .holiday_api_url
                .map(|url| trim_url(&url))
                .unwrap_or_else(|| DEFAULT_HOLIDAY_API_URL.to_string()),
            holiday_country: file
                .holiday_country
                .unwrap_or_else(|| DEFAULT_HOLIDAY_COUNTRY.to_string()),
            topic: file.topic.unwrap_or_else(|| DEFAULT_TOPIC.to_string()),
            request_timeout_secs: file.request_timeout_secs,
            log_level,
        }
    }
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
}

/// Get default configuration file path for the platform
///
/// Linux checks `~/.config/smartask/config.toml` first, then
/// `/etc/smartask/config.toml`. Returns `None` when neither exists.
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("smartask").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/smartask/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

fn trim_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_sources() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.stream_url, "http://localhost:8081/stream");
        assert_eq!(config.topic, "/topic/comparison/all");
        assert_eq!(config.holiday_country, "PT");
        assert!(config.request_timeout_secs.is_none());
    }

    #[test]
    fn test_stream_url_follows_base_url() {
        let overrides = ConfigOverrides {
            base_url: Some("http://backend:9000/".to_string()),
            ..Default::default()
        };
        let config = ClientConfig::from_sources(&overrides, |_| None, None);
        assert_eq!(config.base_url, "http://backend:9000");
        assert_eq!(config.stream_url, "http://backend:9000/stream");
    }
}
