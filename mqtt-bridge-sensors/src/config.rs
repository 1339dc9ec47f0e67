//! Configuration for the sensors bridge.

use serde::{Deserialize, Serialize};

use piwatch_bridge_framework::{BridgeConfig, BridgeError};
use piwatch_common::config::{LoggingConfig, MqttConfig};
use piwatch_common::topic::is_valid_topic;

/// Complete bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorsBridgeConfig {
    /// MQTT connection settings.
    #[serde(default = "default_mqtt")]
    pub mqtt: MqttConfig,

    /// Sensor sampling settings.
    #[serde(default)]
    pub sensors: SensorsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_mqtt() -> MqttConfig {
    MqttConfig {
        client_id: "rpi_publisher".to_string(),
        ..MqttConfig::default()
    }
}

impl BridgeConfig for SensorsBridgeConfig {
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
        self.sensors.validate()
    }
}

/// Sensor sampling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorsConfig {
    /// Topic prefix readings are published under (default: "sensor").
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,

    /// Sampling interval in seconds (default: 5).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Sysfs path the CPU temperature is read from.
    #[serde(default = "default_cpu_temp_path")]
    pub cpu_temp_path: String,

    /// Shell pipeline producing the used-memory reading in MB.
    #[serde(default = "default_memory_command")]
    pub memory_command: String,

    /// Shell command producing the uptime reading.
    #[serde(default = "default_uptime_command")]
    pub uptime_command: String,

    /// Which readings to sample.
    #[serde(default)]
    pub collect: CollectConfig,
}

fn default_topic_prefix() -> String {
    "sensor".to_string()
}

fn default_poll_interval() -> u64 {
    5
}

fn default_cpu_temp_path() -> String {
    "/sys/class/thermal/thermal_zone0/temp".to_string()
}

fn default_memory_command() -> String {
    "free -m | awk '/^Mem:/ {print $3}'".to_string()
}

fn default_uptime_command() -> String {
    "uptime".to_string()
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self {
            topic_prefix: default_topic_prefix(),
            poll_interval_secs: default_poll_interval(),
            cpu_temp_path: default_cpu_temp_path(),
            memory_command: default_memory_command(),
            uptime_command: default_uptime_command(),
            collect: CollectConfig::default(),
        }
    }
}

impl SensorsConfig {
    /// Validate the sampling settings.
    pub fn validate(&self) -> piwatch_bridge_framework::Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(BridgeError::validation("poll_interval_secs must be > 0"));
        }

        if !is_valid_topic(&self.topic_prefix) {
            return Err(BridgeError::validation(format!(
                "topic_prefix '{}' must not be empty or contain wildcards",
                self.topic_prefix
            )));
        }

        let collect = &self.collect;
        if !collect.cpu_temp && !collect.memory && !collect.uptime {
            return Err(BridgeError::validation(
                "At least one reading must be enabled",
            ));
        }

        Ok(())
    }
}

/// Configuration for which readings to sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectConfig {
    /// Sample the CPU temperature (raw sysfs value).
    #[serde(default = "default_true")]
    pub cpu_temp: bool,

    /// Sample used memory in MB.
    #[serde(default = "default_true")]
    pub memory: bool,

    /// Sample the uptime line.
    #[serde(default = "default_true")]
    pub uptime: bool,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            cpu_temp: true,
            memory: true,
            uptime: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let json = "{}";

        let config: SensorsBridgeConfig = json5::from_str(json).unwrap();
        assert_eq!(config.mqtt.client_id, "rpi_publisher");
        assert_eq!(config.mqtt.host, "localhost");
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.sensors.topic_prefix, "sensor");
        assert_eq!(config.sensors.poll_interval_secs, 5);
        assert_eq!(
            config.sensors.cpu_temp_path,
            "/sys/class/thermal/thermal_zone0/temp"
        );
        assert!(config.sensors.collect.cpu_temp);
        assert!(config.sensors.collect.memory);
        assert!(config.sensors.collect.uptime);
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            mqtt: {
                host: "broker.lan",
                port: 1884,
                client_id: "bench_publisher",
            },
            sensors: {
                topic_prefix: "bench/sensor",
                poll_interval_secs: 10,
                cpu_temp_path: "/tmp/fake_temp",
                collect: {
                    cpu_temp: true,
                    memory: false,
                    uptime: true,
                }
            }
        }"#;

        let config: SensorsBridgeConfig = json5::from_str(json).unwrap();
        config.validate().unwrap();

        assert_eq!(config.mqtt.host, "broker.lan");
        assert_eq!(config.sensors.topic_prefix, "bench/sensor");
        assert_eq!(config.sensors.poll_interval_secs, 10);
        assert!(!config.sensors.collect.memory);
    }

    #[test]
    fn test_validate_zero_interval() {
        let json = r#"{
            sensors: { poll_interval_secs: 0 }
        }"#;

        let config: SensorsBridgeConfig = json5::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_no_readings() {
        let json = r#"{
            sensors: {
                collect: {
                    cpu_temp: false,
                    memory: false,
                    uptime: false,
                }
            }
        }"#;

        let config: SensorsBridgeConfig = json5::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_wildcard_prefix() {
        let json = r#"{
            sensors: { topic_prefix: "sensor/#" }
        }"#;

        let config: SensorsBridgeConfig = json5::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }
}
