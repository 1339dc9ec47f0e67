//! Sensor sampling and publishing loop.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, warn};

use piwatch_bridge_framework::Publisher;

use crate::config::SensorsConfig;
use crate::sensors;

/// Topic suffix for the CPU temperature reading.
pub const READING_CPU_TEMP: &str = "cpu_temp";
/// Topic suffix for the used-memory reading.
pub const READING_MEMORY: &str = "memory";
/// Topic suffix for the uptime reading.
pub const READING_UPTIME: &str = "uptime";

/// Collector that samples host sensors on a fixed interval and publishes
/// each reading to its topic.
pub struct SensorCollector {
    config: SensorsConfig,
    publisher: Publisher,
}

impl SensorCollector {
    /// Create a new sensor collector.
    pub fn new(config: SensorsConfig, publisher: Publisher) -> Self {
        Self { config, publisher }
    }

    /// Topic suffixes enabled by the configuration, in publish order.
    pub fn enabled_readings(&self) -> Vec<&'static str> {
        let mut readings = Vec::new();
        if self.config.collect.cpu_temp {
            readings.push(READING_CPU_TEMP);
        }
        if self.config.collect.memory {
            readings.push(READING_MEMORY);
        }
        if self.config.collect.uptime {
            readings.push(READING_UPTIME);
        }
        readings
    }

    /// Run the sampling loop until shutdown is signalled.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut interval =
            tokio::time::interval(Duration::from_secs(self.config.poll_interval_secs));

        tracing::info!(
            prefix = %self.publisher.topic_prefix(),
            interval_secs = self.config.poll_interval_secs,
            "Starting sensor collector"
        );

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    self.sample_and_publish().await;
                }
            }
        }

        tracing::info!("Sensor collector stopped");
    }

    /// Sample all enabled sensors once.
    ///
    /// Returns `(topic_suffix, reading)` pairs in publish order. A failed
    /// read is logged and skipped; nothing stale is ever returned.
    pub async fn sample(&self) -> Vec<(&'static str, String)> {
        let mut readings = Vec::new();

        if self.config.collect.cpu_temp {
            match sensors::read_cpu_temp(&self.config.cpu_temp_path).await {
                Ok(value) => readings.push((READING_CPU_TEMP, value)),
                Err(e) => warn!(error = %e, "Failed to read CPU temperature"),
            }
        }

        if self.config.collect.memory {
            match sensors::read_command_first_line(&self.config.memory_command).await {
                Ok(value) => readings.push((READING_MEMORY, value)),
                Err(e) => warn!(error = %e, "Failed to read memory usage"),
            }
        }

        if self.config.collect.uptime {
            match sensors::read_command_first_line(&self.config.uptime_command).await {
                Ok(value) => readings.push((READING_UPTIME, value)),
                Err(e) => warn!(error = %e, "Failed to read uptime"),
            }
        }

        readings
    }

    async fn sample_and_publish(&self) {
        let readings = self.sample().await;
        let expected = self.enabled_readings().len();

        let stats = self.publisher.publish_batch(readings).await;

        debug!(
            published = stats.success,
            failed = stats.failed,
            skipped = expected - stats.total(),
            "Publish cycle complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollectConfig;

    fn config_with(collect: CollectConfig) -> SensorsConfig {
        SensorsConfig {
            collect,
            ..SensorsConfig::default()
        }
    }

    fn sample_config(cpu_temp_path: &str) -> SensorsConfig {
        SensorsConfig {
            cpu_temp_path: cpu_temp_path.to_string(),
            memory_command: "printf '812\\n'".to_string(),
            uptime_command: "printf 'up 3 days\\nignored\\n'".to_string(),
            ..SensorsConfig::default()
        }
    }

    fn dummy_publisher() -> Publisher {
        // The client never connects; sampling tests don't publish.
        let config = piwatch_common::MqttConfig {
            client_id: "test".to_string(),
            ..Default::default()
        };
        let (client, _event_loop) = piwatch_common::connect(&config).unwrap();
        Publisher::new(client, "sensor", piwatch_bridge_framework::QoS::AtMostOnce, false)
    }

    #[test]
    fn test_enabled_readings_order() {
        let collector = SensorCollector::new(config_with(CollectConfig::default()), dummy_publisher());
        assert_eq!(
            collector.enabled_readings(),
            vec!["cpu_temp", "memory", "uptime"]
        );
    }

    #[test]
    fn test_enabled_readings_filtered() {
        let collector = SensorCollector::new(
            config_with(CollectConfig {
                cpu_temp: false,
                memory: true,
                uptime: true,
            }),
            dummy_publisher(),
        );
        assert_eq!(collector.enabled_readings(), vec!["memory", "uptime"]);
    }

    #[tokio::test]
    async fn test_sample_produces_one_reading_per_topic() {
        let path = std::env::temp_dir().join(format!(
            "piwatch-collector-test-{}-cpu",
            std::process::id()
        ));
        std::fs::write(&path, "47774\n").unwrap();

        let collector =
            SensorCollector::new(sample_config(path.to_str().unwrap()), dummy_publisher());
        let readings = collector.sample().await;

        assert_eq!(
            readings,
            vec![
                ("cpu_temp", "47774".to_string()),
                ("memory", "812".to_string()),
                ("uptime", "up 3 days".to_string()),
            ]
        );

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_sample_skips_failed_reading() {
        let collector = SensorCollector::new(
            sample_config("/nonexistent/thermal_zone0/temp"),
            dummy_publisher(),
        );
        let readings = collector.sample().await;

        // CPU temperature is skipped, the others still come through.
        assert_eq!(
            readings,
            vec![
                ("memory", "812".to_string()),
                ("uptime", "up 3 days".to_string()),
            ]
        );
    }
}
