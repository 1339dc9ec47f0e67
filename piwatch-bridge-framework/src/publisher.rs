//! Reading publisher for MQTT.

use rumqttc::{AsyncClient, QoS};

use crate::error::{BridgeError, Result};

/// Publisher for sending readings to the MQTT broker.
///
/// Wraps an [`AsyncClient`] with a topic prefix and fixed QoS/retain
/// settings, so workers only deal in topic suffixes and payloads.
#[derive(Clone)]
pub struct Publisher {
    client: AsyncClient,
    topic_prefix: String,
    qos: QoS,
    retain: bool,
}

impl Publisher {
    /// Create a new publisher.
    pub fn new(
        client: AsyncClient,
        topic_prefix: impl Into<String>,
        qos: QoS,
        retain: bool,
    ) -> Self {
        Self {
            client,
            topic_prefix: topic_prefix.into(),
            qos,
            retain,
        }
    }

    /// Get the topic prefix.
    pub fn topic_prefix(&self) -> &str {
        &self.topic_prefix
    }

    /// Get the QoS level publishes use.
    pub fn qos(&self) -> QoS {
        self.qos
    }

    /// Get a reference to the underlying client.
    pub fn client(&self) -> &AsyncClient {
        &self.client
    }

    /// Build a full topic from a suffix.
    pub fn build_topic(&self, suffix: &str) -> String {
        if suffix.is_empty() {
            self.topic_prefix.clone()
        } else {
            format!("{}/{}", self.topic_prefix, suffix)
        }
    }

    /// Publish a payload to a topic suffix under the publisher's prefix.
    pub async fn publish(&self, suffix: &str, payload: impl Into<Vec<u8>>) -> Result<()> {
        let topic = self.build_topic(suffix);
        self.publish_to_topic(&topic, payload).await
    }

    /// Publish a payload to a full topic (not using the prefix).
    pub async fn publish_to_topic(&self, topic: &str, payload: impl Into<Vec<u8>>) -> Result<()> {
        self.client
            .publish(topic, self.qos, self.retain, payload.into())
            .await
            .map_err(|e| BridgeError::Publish {
                topic: topic.to_string(),
                message: e.to_string(),
            })?;

        Ok(())
    }

    /// Publish a batch of readings.
    ///
    /// Returns the number of successfully published readings and logs errors.
    pub async fn publish_batch<'a, I>(&self, readings: I) -> PublishStats
    where
        I: IntoIterator<Item = (&'a str, String)>,
    {
        let mut stats = PublishStats::default();

        for (suffix, payload) in readings {
            match self.publish(suffix, payload.into_bytes()).await {
                Ok(()) => stats.success += 1,
                Err(e) => {
                    stats.failed += 1;
                    tracing::warn!(error = %e, "Failed to publish reading");
                }
            }
        }

        stats
    }

    /// Publish a JSON value to a full topic (for status messages, etc.).
    pub async fn publish_json<T: serde::Serialize>(&self, topic: &str, value: &T) -> Result<()> {
        let payload = serde_json::to_vec(value)?;
        self.publish_to_topic(topic, payload).await
    }
}

/// Statistics from a batch publish operation.
#[derive(Debug, Default, Clone, Copy)]
pub struct PublishStats {
    /// Number of successfully published readings.
    pub success: usize,
    /// Number of failed publishes.
    pub failed: usize,
}

impl PublishStats {
    /// Total number of attempted publishes.
    pub fn total(&self) -> usize {
        self.success + self.failed
    }

    /// Success rate as a percentage.
    pub fn success_rate(&self) -> f64 {
        if self.total() == 0 {
            100.0
        } else {
            (self.success as f64 / self.total() as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_topic() {
        // Topic building is pure string logic, no client required.
        let topic_prefix = "rpi/sensor";

        let suffix = "cpu_temp";
        let expected = format!("{}/{}", topic_prefix, suffix);
        assert_eq!(expected, "rpi/sensor/cpu_temp");

        // Empty suffix
        let empty_topic = topic_prefix.to_string();
        assert_eq!(empty_topic, "rpi/sensor");
    }

    #[test]
    fn test_publish_stats() {
        let mut stats = PublishStats::default();
        assert_eq!(stats.total(), 0);
        assert_eq!(stats.success_rate(), 100.0);

        stats.success = 8;
        stats.failed = 2;
        assert_eq!(stats.total(), 10);
        assert_eq!(stats.success_rate(), 80.0);
    }
}
