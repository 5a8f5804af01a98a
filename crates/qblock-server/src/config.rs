//! Configuration management for the qblock server.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML)
//! 2. Environment variables (with QBLOCK_ prefix)
//! 3. .env files (loaded by the binary before anything else)
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values

use std::net::SocketAddr;
use std::path::Path;

use qblock_anneal::{AnnealParams, DEFAULT_NUM_READS, DEFAULT_NUM_SWEEPS};
use qblock_model::{DEFAULT_BOARD_SIZE, DEFAULT_MAX_ARRAY_SIZE, ModelLimits};
use serde::{Deserialize, Serialize};

/// Complete server configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Default annealing parameters
    #[serde(default)]
    pub sampler: SamplerConfig,

    /// Model builder limits
    #[serde(default)]
    pub model: ModelConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:5000")
    #[serde(default = "default_address")]
    pub address: String,

    /// Largest accepted request body
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Comma-separated allowed origins, or `*`
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
}

/// Annealing defaults and the ceilings applied to per-request overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    #[serde(default = "default_num_reads")]
    pub num_reads: usize,

    #[serde(default = "default_num_sweeps")]
    pub num_sweeps: usize,

    /// Fixed seed for reproducible runs
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default = "default_max_num_reads")]
    pub max_num_reads: usize,

    #[serde(default = "default_max_num_sweeps")]
    pub max_num_sweeps: usize,
}

/// Model builder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Cells in the fallback board
    #[serde(default = "default_fallback_board_size")]
    pub fallback_board_size: usize,

    /// Largest accepted `Array` variable
    #[serde(default = "default_max_array_size")]
    pub max_array_size: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "console" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_address() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024 // 2 MiB
}

fn default_cors_origins() -> String {
    "*".to_string()
}

fn default_num_reads() -> usize {
    DEFAULT_NUM_READS
}

fn default_num_sweeps() -> usize {
    DEFAULT_NUM_SWEEPS
}

fn default_max_num_reads() -> usize {
    1000
}

fn default_max_num_sweeps() -> usize {
    100_000
}

fn default_fallback_board_size() -> usize {
    DEFAULT_BOARD_SIZE
}

fn default_max_array_size() -> usize {
    DEFAULT_MAX_ARRAY_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "console".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            max_body_bytes: default_max_body_bytes(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            num_reads: default_num_reads(),
            num_sweeps: default_num_sweeps(),
            seed: None,
            max_num_reads: default_max_num_reads(),
            max_num_sweeps: default_max_num_sweeps(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            fallback_board_size: default_fallback_board_size(),
            max_array_size: default_max_array_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        serde_yaml_ng::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load configuration: file (or defaults), then environment overrides,
    /// then validation.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Config::default(),
        };

        let config = config.merge_env();
        config.validate()?;
        Ok(config)
    }

    /// Merge `QBLOCK_*` environment variables into this configuration.
    pub fn merge_env(self) -> Self {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Merge overrides from an arbitrary variable lookup.
    ///
    /// Only variables that are present override; numeric variables that fail
    /// to parse are ignored.
    pub fn merge_vars<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server
        if let Some(v) = lookup("QBLOCK_ADDRESS") {
            self.server.address = v;
        }
        if let Some(val) = lookup("QBLOCK_MAX_BODY_BYTES").and_then(|v| v.parse().ok()) {
            self.server.max_body_bytes = val;
        }
        if let Some(v) = lookup("QBLOCK_CORS_ORIGINS") {
            self.server.cors_origins = v;
        }

        // Sampler
        if let Some(val) = lookup("QBLOCK_NUM_READS").and_then(|v| v.parse().ok()) {
            self.sampler.num_reads = val;
        }
        if let Some(val) = lookup("QBLOCK_NUM_SWEEPS").and_then(|v| v.parse().ok()) {
            self.sampler.num_sweeps = val;
        }
        if let Some(val) = lookup("QBLOCK_SEED").and_then(|v| v.parse().ok()) {
            self.sampler.seed = Some(val);
        }

        // Model
        if let Some(val) = lookup("QBLOCK_FALLBACK_BOARD_SIZE").and_then(|v| v.parse().ok()) {
            self.model.fallback_board_size = val;
        }
        if let Some(val) = lookup("QBLOCK_MAX_ARRAY_SIZE").and_then(|v| v.parse().ok()) {
            self.model.max_array_size = val;
        }

        // Logging
        if let Some(v) = lookup("QBLOCK_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = lookup("QBLOCK_LOG_FORMAT") {
            self.logging.format = v;
        }

        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "max_body_bytes must be greater than 0".to_string(),
            ));
        }

        if self.server.cors_origins.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "cors_origins must be '*' or a comma-separated origin list".to_string(),
            ));
        }

        if self.sampler.num_reads == 0 || self.sampler.num_reads > self.sampler.max_num_reads {
            return Err(ConfigError::ValidationError(format!(
                "num_reads must be between 1 and {}, got {}",
                self.sampler.max_num_reads, self.sampler.num_reads
            )));
        }
        if self.sampler.num_sweeps == 0 || self.sampler.num_sweeps > self.sampler.max_num_sweeps {
            return Err(ConfigError::ValidationError(format!(
                "num_sweeps must be between 1 and {}, got {}",
                self.sampler.max_num_sweeps, self.sampler.num_sweeps
            )));
        }

        if self.model.fallback_board_size == 0 {
            return Err(ConfigError::ValidationError(
                "fallback_board_size must be greater than 0".to_string(),
            ));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: {other}"
                )));
            }
        }

        match self.logging.format.as_str() {
            "console" | "json" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: {other}"
                )));
            }
        }

        Ok(())
    }

    /// Get the parsed bind address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.address.parse().map_err(|_| {
            ConfigError::ValidationError(format!("Invalid server address: {}", self.server.address))
        })
    }

    /// Limits handed to the model builder.
    pub fn model_limits(&self) -> ModelLimits {
        ModelLimits {
            max_array_size: self.model.max_array_size,
            fallback_board_size: self.model.fallback_board_size,
        }
    }

    /// Default annealing parameters.
    pub fn anneal_params(&self) -> AnnealParams {
        AnnealParams {
            num_reads: self.sampler.num_reads,
            num_sweeps: self.sampler.num_sweeps,
            beta_range: None,
            seed: self.sampler.seed,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.address, "127.0.0.1:5000");
        assert_eq!(config.server.max_body_bytes, 2 * 1024 * 1024);
        assert_eq!(config.sampler.num_reads, 10);
        assert_eq!(config.model.fallback_board_size, 9);
        assert_eq!(config.logging.format, "console");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml() {
        let config = Config::from_yaml(
            "server:\n  address: '0.0.0.0:8080'\nsampler:\n  seed: 7\n",
        )
        .unwrap();
        assert_eq!(config.server.address, "0.0.0.0:8080");
        assert_eq!(config.server.cors_origins, "*");
        assert_eq!(config.sampler.seed, Some(7));
        assert_eq!(config.sampler.num_sweeps, 1000);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            Config::from_yaml("server: [1, 2"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_merge_vars() {
        let vars: HashMap<&str, &str> = [
            ("QBLOCK_ADDRESS", "0.0.0.0:9000"),
            ("QBLOCK_NUM_READS", "25"),
            ("QBLOCK_NUM_SWEEPS", "not a number"),
            ("QBLOCK_SEED", "99"),
            ("QBLOCK_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let config = Config::default().merge_vars(|k| vars.get(k).map(|v| (*v).to_string()));
        assert_eq!(config.server.address, "0.0.0.0:9000");
        assert_eq!(config.sampler.num_reads, 25);
        assert_eq!(config.sampler.num_sweeps, 1000);
        assert_eq!(config.sampler.seed, Some(99));
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.server.address = "not-an-address".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.sampler.num_reads = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.model.fallback_board_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_derived_settings() {
        let config = Config::default();
        assert_eq!(config.socket_addr().unwrap().port(), 5000);
        assert_eq!(config.model_limits(), ModelLimits::default());
        assert_eq!(config.anneal_params(), AnnealParams::default());
    }
}
