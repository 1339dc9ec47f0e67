//! MQTT bridge for host sensor readings.
//!
//! Samples CPU temperature, memory usage, and uptime on a fixed interval
//! and publishes each reading to the broker as raw text.

use anyhow::Result;
use piwatch_bridge_framework::{BridgeArgs, BridgeConfig, BridgeRunner};

use mqtt_bridge_sensors::collector::SensorCollector;
use mqtt_bridge_sensors::config::SensorsBridgeConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = BridgeArgs::parse_with_default("sensors.json5");

    // Load configuration using the framework's BridgeConfig trait
    let config = SensorsBridgeConfig::load(&args.config).map_err(|e| anyhow::anyhow!("{}", e))?;

    // Create the bridge runner
    let runner = BridgeRunner::new_with_args("sensors", config, Some(&args))
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    // Enable status publishing
    let mut runner = runner.with_status_publishing();

    let sensors_config = runner.config().sensors.clone();

    tracing::info!(
        "Sensors bridge running (prefix: {}, interval: {}s)",
        sensors_config.topic_prefix,
        sensors_config.poll_interval_secs
    );

    // Create the collector and build status metadata before it moves
    let collector = SensorCollector::new(sensors_config.clone(), runner.publisher());
    let metadata = serde_json::json!({
        "readings": collector.enabled_readings(),
        "poll_interval_secs": sensors_config.poll_interval_secs,
    });

    // Spawn the collector task
    let shutdown = runner.shutdown_receiver();
    runner.spawn(async move {
        collector.run(shutdown).await;
    });

    // Run until Ctrl+C (handles shutdown gracefully)
    runner
        .run_with_metadata(Some(metadata))
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))
}
