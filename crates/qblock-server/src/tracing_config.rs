//! Tracing subscriber setup.
//!
//! - Console output (development)
//! - JSON structured logging (production)

use std::str::FromStr;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::config::LoggingConfig;

/// Tracing output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable console output.
    Console,
    /// JSON structured logging.
    Json,
}

impl FromStr for TracingFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "console" => Ok(Self::Console),
            "json" => Ok(Self::Json),
            other => Err(format!("Unknown log format: {other}")),
        }
    }
}

/// Tracing configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Log level filter (e.g., "info", "debug", "qblock_model=trace").
    pub log_level: String,
    /// Output format.
    pub format: TracingFormat,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: TracingFormat::Console,
        }
    }
}

impl From<&LoggingConfig> for TracingConfig {
    fn from(logging: &LoggingConfig) -> Self {
        Self {
            log_level: logging.level.clone(),
            format: logging.format.parse().unwrap_or(TracingFormat::Console),
        }
    }
}

/// Install the global subscriber.
///
/// The configured level is used as the filter; `RUST_LOG` applies only if
/// the configured level does not parse.
pub fn init_tracing(config: &TracingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = match config.format {
        TracingFormat::Console => fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .pretty()
            .boxed(),
        TracingFormat::Json => fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .json()
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    tracing::info!(format = ?config.format, level = %config.log_level, "Tracing initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TracingConfig::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.format, TracingFormat::Console);
    }

    #[test]
    fn test_from_logging_config() {
        let logging = LoggingConfig {
            level: "debug".to_string(),
            format: "json".to_string(),
        };
        let config = TracingConfig::from(&logging);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.format, TracingFormat::Json);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("console".parse::<TracingFormat>(), Ok(TracingFormat::Console));
        assert!("xml".parse::<TracingFormat>().is_err());
    }
}
