use crate::error::{Result, ServerError};
use common::event_log::DEFAULT_RETENTION;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::PasswordHashConfig;

/// Where network counters are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterSource {
    /// `/proc/net/dev` on Linux, `sysinfo` elsewhere.
    #[default]
    Auto,
    Procfs,
    Sysinfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log directory for file-based logging; stdout when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    #[serde(default = "default_log_file")]
    pub log_file: String,

    /// Number of Tokio runtime worker threads (defaults to CPU cores)
    #[serde(default)]
    pub runtime_threads: Option<usize>,

    /// Entries each in-memory history keeps before dropping the oldest
    #[serde(default = "default_history_retention")]
    pub history_retention: usize,

    #[serde(default)]
    pub counter_source: CounterSource,

    /// Origins allowed by CORS; empty means any origin
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default)]
    pub password_hash: PasswordHashConfig,
}

fn default_listen_addr() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_database_path() -> String {
    "data/netwatch.db".to_string()
}

fn default_log_level() -> String {
    "netwatch=info,server=info,common=info,tower_http=info".to_string()
}

fn default_log_file() -> String {
    "netwatch.log".to_string()
}

fn default_history_retention() -> usize {
    DEFAULT_RETENTION
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            database_path: default_database_path(),
            log_level: default_log_level(),
            log_dir: None,
            log_file: default_log_file(),
            runtime_threads: None,
            history_retention: default_history_retention(),
            counter_source: CounterSource::default(),
            cors_allowed_origins: Vec::new(),
            password_hash: PasswordHashConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&content)
            .map_err(|e| ServerError::Configuration(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ServerError::Configuration(format!("Failed to encode config: {e}")))?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.listen_addr.trim().is_empty() {
            return Err(ServerError::Configuration(
                "listen_addr must not be empty".to_string(),
            ));
        }
        if self.database_path.trim().is_empty() {
            return Err(ServerError::Configuration(
                "database_path must not be empty".to_string(),
            ));
        }
        if self.runtime_threads == Some(0) {
            return Err(ServerError::Configuration(
                "runtime_threads must be > 0".to_string(),
            ));
        }
        if self.history_retention < crate::RECENT_WINDOW {
            return Err(ServerError::Configuration(format!(
                "history_retention must be at least {}",
                crate::RECENT_WINDOW
            )));
        }
        self.password_hash.validate()
    }
}
