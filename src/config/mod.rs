//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::calculate::adjust::{check_weight_table, DEFAULT_WEIGHTS};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("No score-adjustment weight for score situation {0}")]
    MissingWeight(i32),
}

/// Score-adjustment weights keyed by score situation.
///
/// TOML keys are strings, so situations are written as `"-1" = 0.902`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreAdjustmentConfig {
    #[serde(default = "default_weights")]
    pub weights: BTreeMap<String, f64>,
}

fn default_weights() -> BTreeMap<String, f64> {
    DEFAULT_WEIGHTS
        .into_iter()
        .map(|(sit, weight)| (sit.to_string(), weight))
        .collect()
}

impl Default for ScoreAdjustmentConfig {
    fn default() -> Self {
        Self {
            weights: default_weights(),
        }
    }
}

impl ScoreAdjustmentConfig {
    /// Parse keys into score situations and check the resulting table.
    pub fn parsed_weights(&self) -> Result<BTreeMap<i32, f64>, ConfigError> {
        let mut weights = BTreeMap::new();
        for (key, &weight) in &self.weights {
            let situation: i32 = key.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("score situation key is not an integer: {:?}", key))
            })?;
            weights.insert(situation, weight);
        }
        check_weight_table(&weights)?;
        Ok(weights)
    }
}

/// Upstream data source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL serving `/api/players/` and `/api/teams/`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub score_adjustment: ScoreAdjustmentConfig,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            score_adjustment: ScoreAdjustmentConfig::default(),
            source: SourceConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.score_adjustment.parsed_weights()?;

        if self.source.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "Source timeout must be greater than 0".to_string(),
            ));
        }

        if url::Url::parse(&self.source.base_url).is_err() {
            return Err(ConfigError::ValidationError(format!(
                "Source base URL is not a valid URL: {}",
                self.source.base_url
            )));
        }

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.log_level, "info");
        assert_eq!(config.source.base_url, "http://localhost:5000");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.score_adjustment.weights.len(), 7);
    }

    #[test]
    fn test_config_validation_ok() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_timeout() {
        let mut config = AppConfig::default();
        config.source.timeout_seconds = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_url() {
        let mut config = AppConfig::default();
        config.source.base_url = "not a url".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_weights_must_be_closed_under_negation() {
        let mut config = AppConfig::default();
        config.score_adjustment.weights.remove("-2");

        match config.validate() {
            Err(ConfigError::MissingWeight(sit)) => assert_eq!(sit, -2),
            other => panic!("expected MissingWeight, got {:?}", other),
        }
    }

    #[test]
    fn test_weights_reject_bad_values() {
        let mut config = AppConfig::default();
        config.score_adjustment.weights.insert("0".to_string(), f64::NAN);
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.score_adjustment.weights.insert("x".to_string(), 1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();

        // Should be parseable
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.score_adjustment.weights, parsed.score_adjustment.weights);
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
log_level = "debug"

[source]
base_url = "http://stats.example.com"

[score_adjustment.weights]
"-1" = 0.9
"0" = 1.0
"1" = 1.1
"#
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.source.base_url, "http://stats.example.com");
        assert_eq!(config.source.timeout_seconds, 30);
        let weights = config.score_adjustment.parsed_weights().unwrap();
        assert_eq!(weights.get(&-1), Some(&0.9));
        assert_eq!(weights.len(), 3);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.port, 8080);
    }
}
