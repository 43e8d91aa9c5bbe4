//! Configuration loading and management

pub mod seed;

pub use seed::{SeedConfig, SeedReport};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "MALLTRACK_CONFIG";

/// File looked up in the working directory when [`CONFIG_ENV`] is unset
pub const DEFAULT_CONFIG_FILE: &str = "malltrack.yaml";

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    /// `host:port`, as accepted by `TcpListener::bind`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG`
    pub filter: String,

    /// Emit one JSON object per event instead of human-readable lines
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,malltrack=debug,tower_http=info".to_string(),
            json: false,
        }
    }
}

/// Complete configuration of a malltrack instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Data loaded into the store at startup
    #[serde(default)]
    pub seed: Option<SeedConfig>,
}

impl LedgerConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Load from `MALLTRACK_CONFIG`, else `malltrack.yaml`, else defaults
    ///
    /// A path named by the environment variable must exist; the default file
    /// is optional.
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_yaml_file(PathBuf::from(path)),
            None => Self::load_optional(DEFAULT_CONFIG_FILE),
        }
    }

    /// Load `path` if it exists, defaults otherwise
    pub fn load_optional(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_yaml_file(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.server.address(), "127.0.0.1:3000");
        assert!(!config.logging.json);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = LedgerConfig::from_yaml_str(
            r#"
server:
  port: 8080
logging:
  json: true
"#,
        )
        .unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert!(config.logging.json);
        assert_eq!(config.logging.filter, LoggingConfig::default().filter);
    }

    #[test]
    fn test_empty_document_is_default() {
        let config = LedgerConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, LedgerConfig::default());
    }

    #[test]
    fn test_unknown_port_type_fails() {
        let result = LedgerConfig::from_yaml_str("server:\n  port: eighty\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_optional_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = LedgerConfig::load_optional(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, LedgerConfig::default());
    }
}
