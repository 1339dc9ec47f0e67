//! Configuration for the gateway bridge.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use mqtt_bridge_sensors::config::SensorsConfig;
use piwatch_bridge_framework::{BridgeConfig, BridgeError};
use piwatch_common::config::{LoggingConfig, MqttConfig};
use piwatch_common::topic::is_valid_filter;

/// Complete bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayBridgeConfig {
    /// MQTT connection settings.
    #[serde(default = "default_mqtt")]
    pub mqtt: MqttConfig,

    /// Subscription and logging settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Sensor sampling settings (published under the gateway prefix).
    #[serde(default = "default_sensors")]
    pub sensors: SensorsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_mqtt() -> MqttConfig {
    MqttConfig {
        client_id: "rpi_gateway".to_string(),
        ..MqttConfig::default()
    }
}

fn default_sensors() -> SensorsConfig {
    SensorsConfig {
        topic_prefix: "rpi/sensor".to_string(),
        ..SensorsConfig::default()
    }
}

impl BridgeConfig for GatewayBridgeConfig {
    fn mqtt(&self) -> &MqttConfig {
        &self.mqtt
    }

    fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    fn topic_prefix(&self) -> &str {
        &self.sensors.topic_prefix
    }

    fn validate(&self) -> piwatch_bridge_framework::Result<()> {
        self.sensors.validate()?;
        self.gateway.validate()
    }
}

/// Remote-device subscription and log file configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Wildcard filter the gateway subscribes to (default: "esp32/#").
    #[serde(default = "default_subscribe_filter")]
    pub subscribe_filter: String,

    /// Only messages whose topic starts with this prefix are logged.
    #[serde(default = "default_log_prefix")]
    pub log_prefix: String,

    /// Path of the append-only log file.
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,

    /// Payloads longer than this many bytes are truncated before logging.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
}

fn default_subscribe_filter() -> String {
    "esp32/#".to_string()
}

fn default_log_prefix() -> String {
    "esp32/".to_string()
}

fn default_log_path() -> PathBuf {
    PathBuf::from("logs/remote.log")
}

fn default_max_payload_bytes() -> usize {
    256
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            subscribe_filter: default_subscribe_filter(),
            log_prefix: default_log_prefix(),
            log_path: default_log_path(),
            max_payload_bytes: default_max_payload_bytes(),
        }
    }
}

impl GatewayConfig {
    /// Validate the subscription and log settings.
    pub fn validate(&self) -> piwatch_bridge_framework::Result<()> {
        if !is_valid_filter(&self.subscribe_filter) {
            return Err(BridgeError::validation(format!(
                "subscribe_filter '{}' is not a valid MQTT filter",
                self.subscribe_filter
            )));
        }

        if self.max_payload_bytes == 0 {
            return Err(BridgeError::validation("max_payload_bytes must be > 0"));
        }

        if self.log_path.as_os_str().is_empty() {
            return Err(BridgeError::validation("log_path must not be empty"));
        }

        Ok(())
    }
}
