//! Configuration management for search-porter
//!
//! This module handles loading, parsing, and managing configuration from various sources:
//! - Configuration files (TOML format)
//! - Environment variables (API key only)
//! - Command-line arguments
//!
//! Configuration precedence (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Largest page the search service returns for a single query.
pub const MAX_PAGE_SIZE: usize = 1000;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Connection configuration
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Export/import tuning
    #[serde(default)]
    pub transfer: TransferConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Search service name, expanded to `https://<service>.search.windows.net`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,

    /// Full service endpoint, takes precedence over `service`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Admin API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// REST API version sent with every request
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

/// Export and import tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Documents requested per search page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Documents submitted per index batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Show a progress bar
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,

    /// Indent exported JSON
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

// Default value functions
fn default_api_version() -> String {
    "2023-11-01".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_page_size() -> usize {
    MAX_PAGE_SIZE
}

fn default_batch_size() -> usize {
    1000
}

fn default_show_progress() -> bool {
    true
}

fn default_pretty() -> bool {
    true
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_log_timestamps() -> bool {
    true
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            service: None,
            endpoint: None,
            api_key: None,
            api_version: default_api_version(),
            timeout: default_timeout(),
        }
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            batch_size: default_batch_size(),
            show_progress: default_show_progress(),
            pretty: default_pretty(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound(path.display().to_string())
            } else {
                ConfigError::InvalidFormat(format!("{}: {}", path.display(), e))
            }
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ConfigError::InvalidFormat(e.to_string()).into())
    }

    /// Load configuration from an explicit path or the default location
    ///
    /// An explicit path must exist. A missing default file yields the
    /// default configuration.
    ///
    /// # Arguments
    /// * `path` - Optional explicit config path
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    pub fn load_from_file(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let default = Self::default_config_path();
                if default.exists() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Get the default configuration file path
    ///
    /// # Returns
    /// * `PathBuf` - Path to default configuration file
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".search-porter")
            .join("config.toml")
    }

    /// Validate the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Ok if valid, error otherwise
    pub fn validate(&self) -> Result<()> {
        if self.transfer.page_size == 0 || self.transfer.page_size > MAX_PAGE_SIZE {
            return Err(invalid("transfer.page_size", self.transfer.page_size));
        }
        if self.transfer.batch_size == 0 {
            return Err(invalid("transfer.batch_size", self.transfer.batch_size));
        }
        if self.connection.timeout == 0 {
            return Err(invalid("connection.timeout", self.connection.timeout));
        }
        if self.connection.api_version.trim().is_empty() {
            return Err(ConfigError::MissingField("connection.api_version".to_string()).into());
        }
        Ok(())
    }

    /// Serialize the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidFormat(e.to_string()).into())
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.connection.timeout)
    }
}

fn invalid(field: &str, value: impl ToString) -> crate::error::PorterError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
    .into()
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.connection.api_version, "2023-11-01");
        assert_eq!(config.transfer.batch_size, 1000);
        assert_eq!(config.transfer.page_size, 1000);
        assert!(config.transfer.show_progress);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [connection]
            service = "contoso"

            [transfer]
            batch_size = 250
            "#,
        )
        .unwrap();
        assert_eq!(config.connection.service.as_deref(), Some("contoso"));
        assert_eq!(config.connection.timeout, 30);
        assert_eq!(config.transfer.batch_size, 250);
        assert_eq!(config.transfer.page_size, 1000);
        assert_eq!(config.logging.level, LogLevel::Warn);
    }

    #[test]
    fn test_validate_rejects_bad_sizes() {
        let mut config = Config::default();
        config.transfer.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.transfer.page_size = 5000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let result = Config::load_from_file(Some(Path::new("/nonexistent/search-porter.toml")));
        assert!(matches!(
            result,
            Err(crate::error::PorterError::Config(ConfigError::FileNotFound(_)))
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = Config::default();
        config.connection.endpoint = Some("https://contoso.search.windows.net".to_string());
        let text = config.to_toml().unwrap();
        let parsed = Config::from_toml(&text).unwrap();
        assert_eq!(parsed.connection.endpoint, config.connection.endpoint);
    }

    #[test]
    fn test_request_timeout() {
        let config = Config::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }
}
