use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Common MQTT connection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MqttConfig {
    /// Broker host name or address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Broker TCP port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Client identifier. Use "auto" to derive from the host name (default).
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// Keepalive interval in seconds.
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,

    /// Start with a clean session.
    #[serde(default = "default_true")]
    pub clean_session: bool,

    /// Capacity of the client request channel.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// QoS level for publishes and subscriptions (0, 1, or 2).
    #[serde(default)]
    pub qos: u8,

    /// Optional username/password authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,

    /// Optional last-will message registered at connect time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_will: Option<LastWillConfig>,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    1883
}

fn default_client_id() -> String {
    "auto".to_string()
}

fn default_keep_alive() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

fn default_channel_capacity() -> usize {
    64
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            client_id: default_client_id(),
            keep_alive_secs: default_keep_alive(),
            clean_session: true,
            channel_capacity: default_channel_capacity(),
            qos: 0,
            credentials: None,
            last_will: None,
        }
    }
}

impl MqttConfig {
    /// Resolve the client id, replacing "auto" with the host name.
    pub fn resolved_client_id(&self) -> String {
        if self.client_id == "auto" {
            hostname::get()
                .ok()
                .and_then(|h| h.into_string().ok())
                .unwrap_or_else(|| "piwatch".to_string())
        } else {
            self.client_id.clone()
        }
    }
}

/// Username/password pair for broker authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Last-will message configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastWillConfig {
    /// Topic the broker publishes the will to.
    pub topic: String,

    /// Will payload.
    #[serde(default = "default_will_payload")]
    pub payload: String,

    /// QoS for the will message (0, 1, or 2).
    #[serde(default)]
    pub qos: u8,

    /// Retain flag for the will message.
    #[serde(default)]
    pub retain: bool,
}

fn default_will_payload() -> String {
    "offline".to_string()
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format (default).
    #[default]
    Text,
    /// Structured JSON format.
    Json,
}

/// Common logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format: "text" or "json".
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Load a configuration file in JSON5 format.
pub fn load_config<T: for<'de> Deserialize<'de>>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Failed to read config file '{}': {}",
            path.display(),
            e
        ))
    })?;

    json5::from_str(&content).map_err(|e| {
        Error::Config(format!(
            "Failed to parse config file '{}': {}",
            path.display(),
            e
        ))
    })
}

/// Load a configuration from a JSON5 string.
pub fn parse_config<T: for<'de> Deserialize<'de>>(content: &str) -> Result<T> {
    json5::from_str(content).map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mqtt_config() {
        let config: MqttConfig = parse_config("{}").unwrap();

        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 1883);
        assert_eq!(config.client_id, "auto");
        assert_eq!(config.keep_alive_secs, 60);
        assert!(config.clean_session);
        assert_eq!(config.qos, 0);
        assert!(config.credentials.is_none());
        assert!(config.last_will.is_none());
    }

    #[test]
    fn test_parse_mqtt_config() {
        let json5 = r#"
        {
            host: "broker.local",
            port: 8883,
            client_id: "rpi_publisher",
            keep_alive_secs: 30,
            qos: 1,
            credentials: { username: "pi", password: "secret" },
        }
        "#;

        let config: MqttConfig = parse_config(json5).unwrap();

        assert_eq!(config.host, "broker.local");
        assert_eq!(config.port, 8883);
        assert_eq!(config.client_id, "rpi_publisher");
        assert_eq!(config.keep_alive_secs, 30);
        assert_eq!(config.qos, 1);
        assert_eq!(config.credentials.unwrap().username, "pi");
    }

    #[test]
    fn test_resolved_client_id_explicit() {
        let config = MqttConfig {
            client_id: "rpi_gateway".to_string(),
            ..Default::default()
        };
        assert_eq!(config.resolved_client_id(), "rpi_gateway");
    }

    #[test]
    fn test_resolved_client_id_auto() {
        let config = MqttConfig::default();
        // "auto" resolves to something non-empty, never the literal "auto".
        let id = config.resolved_client_id();
        assert!(!id.is_empty());
        assert_ne!(id, "auto");
    }

    #[test]
    fn test_last_will_defaults() {
        let json5 = r#"{ last_will: { topic: "rpi/sensor/status" } }"#;
        let config: MqttConfig = parse_config(json5).unwrap();

        let will = config.last_will.unwrap();
        assert_eq!(will.topic, "rpi/sensor/status");
        assert_eq!(will.payload, "offline");
        assert_eq!(will.qos, 0);
        assert!(!will.retain);
    }

    #[test]
    fn test_json_logging_format() {
        let json5 = r#"
        {
            level: "debug",
            format: "json",
        }
        "#;

        let config: LoggingConfig = parse_config(json5).unwrap();

        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn test_default_logging_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Text);
    }
}
