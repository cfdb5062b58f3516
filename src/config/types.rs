//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use super::defaults::{
    default_connect_timeout_ms, default_hash_space_size, default_key_prefix, default_log_filter,
    default_port_offset, default_preference_list_size, default_refresh_interval_secs,
    default_request_timeout_ms, default_socket_path,
};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// Bootstrap node identifiers (`host:port`).
    #[serde(default)]
    pub seeds: Vec<String>,
    /// Ring and connection parameters.
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Parameters handed to the ring coordinator at construction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CoordinatorConfig {
    /// Number of positions on the hash ring.
    #[serde(default = "default_hash_space_size")]
    pub hash_space_size: u64,
    /// Distinct nodes responsible for each key.
    #[serde(default = "default_preference_list_size")]
    pub preference_list_size: usize,
    /// Namespace prepended to list ids before hashing.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Added to a node's ring port to reach its client socket.
    #[serde(default = "default_port_offset")]
    pub port_offset: u16,
    /// WebSocket path on the node.
    #[serde(default = "default_socket_path")]
    pub socket_path: String,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Upper bound for a membership refresh round trip.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Background membership refresh period; 0 disables it.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            hash_space_size: default_hash_space_size(),
            preference_list_size: default_preference_list_size(),
            key_prefix: default_key_prefix(),
            port_offset: default_port_offset(),
            socket_path: default_socket_path(),
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

impl CoordinatorConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// `None` when periodic refresh is disabled.
    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}
