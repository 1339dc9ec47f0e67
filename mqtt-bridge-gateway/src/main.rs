//! MQTT gateway bridge.
//!
//! Publishes host sensor readings under the gateway prefix and logs
//! telemetry received from remote devices to an append-only file.

use anyhow::Result;
use piwatch_bridge_framework::{BridgeArgs, BridgeConfig, BridgeRunner};

use mqtt_bridge_gateway::config::GatewayBridgeConfig;
use mqtt_bridge_gateway::logger::MessageLogger;
use mqtt_bridge_sensors::collector::SensorCollector;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = BridgeArgs::parse_with_default("gateway.json5");

    // Load configuration using the framework's BridgeConfig trait
    let config = GatewayBridgeConfig::load(&args.config).map_err(|e| anyhow::anyhow!("{}", e))?;

    // Create the bridge runner
    let runner = BridgeRunner::new_with_args("gateway", config, Some(&args))
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    // Enable status publishing
    let mut runner = runner.with_status_publishing();

    let gateway_config = runner.config().gateway.clone();
    let sensors_config = runner.config().sensors.clone();

    tracing::info!(
        "Gateway bridge running (prefix: {}, subscribing: {}, log: {})",
        sensors_config.topic_prefix,
        gateway_config.subscribe_filter,
        gateway_config.log_path.display()
    );

    // The log directory must exist before the first message arrives
    let logger = MessageLogger::new(gateway_config.clone());
    logger
        .prepare()
        .map_err(|e| anyhow::anyhow!("Failed to create log directory: {}", e))?;

    // Subscribe and take the inbound message channel
    let inbound = runner
        .subscribe(&gateway_config.subscribe_filter)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    // Create the collector and build status metadata before it moves
    let collector = SensorCollector::new(sensors_config.clone(), runner.publisher());
    let metadata = serde_json::json!({
        "readings": collector.enabled_readings(),
        "poll_interval_secs": sensors_config.poll_interval_secs,
        "subscribe_filter": gateway_config.subscribe_filter,
        "log_path": gateway_config.log_path.display().to_string(),
    });

    // Spawn the collector task
    let shutdown = runner.shutdown_receiver();
    runner.spawn(async move {
        collector.run(shutdown).await;
    });

    // Spawn the logger task
    let shutdown = runner.shutdown_receiver();
    runner.spawn(async move {
        logger.run(inbound, shutdown).await;
    });

    // Run until Ctrl+C (handles shutdown gracefully)
    runner
        .run_with_metadata(Some(metadata))
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))
}
