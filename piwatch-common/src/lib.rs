//! Piwatch Common Library
//!
//! This crate provides shared types and utilities for Piwatch MQTT telemetry bridges:
//!
//! - [`config`] - Configuration loading (JSON5 format) and MQTT/logging settings
//! - [`session`] - MQTT client creation from configuration
//! - [`topic`] - Topic builders, wildcard matching, and validation
//! - [`error`] - Error types

pub mod config;
pub mod error;
pub mod session;
pub mod topic;

// Re-export commonly used types at the crate root
pub use config::{
    Credentials, LastWillConfig, LogFormat, LoggingConfig, MqttConfig, load_config, parse_config,
};
pub use error::{Error, Result};
pub use session::{build_options, connect, qos_from_u8};
pub use topic::{TOPIC_PREFIX, TopicBuilder, is_valid_filter, is_valid_topic, matches};

/// Initialize tracing with the given configuration.
///
/// Supports two output formats:
/// - `LogFormat::Text` (default): Human-readable text format
/// - `LogFormat::Json`: Structured JSON format for log aggregation systems
///
/// # Example
///
/// ```ignore
/// use piwatch_common::{LoggingConfig, LogFormat, init_tracing};
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     format: LogFormat::Json,
/// };
/// init_tracing(&config)?;
/// ```
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer())
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json())
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
    }

    Ok(())
}
