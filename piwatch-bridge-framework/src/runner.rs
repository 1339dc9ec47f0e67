//! Bridge runner for lifecycle management.

use std::future::Future;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, Packet, QoS};
use tokio::signal;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use piwatch_common::{LoggingConfig, connect, init_tracing, is_valid_filter, qos_from_u8};

use crate::BridgeArgs;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::publisher::Publisher;
use crate::status::StatusPublisher;

/// A message received from the broker on a subscribed topic.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Topic the message was published on.
    pub topic: String,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
}

/// Bridge runner that manages the lifecycle of an MQTT bridge.
///
/// Handles:
/// - Configuration loading
/// - Logging initialization
/// - MQTT connection and the network event loop
/// - Routing inbound messages to a channel
/// - Task spawning and management
/// - Graceful shutdown on Ctrl+C
/// - Status publishing (optional)
///
/// # Example
///
/// ```ignore
/// use piwatch_bridge_framework::{BridgeArgs, BridgeConfig, BridgeRunner};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let args = BridgeArgs::parse_with_default("mybridge.json5");
///     let config = MyBridgeConfig::load(&args.config)?;
///
///     let mut runner = BridgeRunner::new("mybridge", config)?;
///
///     // Spawn workers using the publisher
///     let publisher = runner.publisher();
///     let shutdown = runner.shutdown_receiver();
///     runner.spawn(async move {
///         // Worker logic here
///     });
///
///     runner.run().await
/// }
/// ```
pub struct BridgeRunner<C: BridgeConfig> {
    /// Bridge name for logging and status.
    name: String,
    /// Bridge version.
    version: String,
    /// The loaded configuration.
    config: C,
    /// MQTT client handle.
    client: AsyncClient,
    /// QoS used for subscriptions.
    qos: QoS,
    /// Publisher for readings.
    publisher: Publisher,
    /// Status publisher (optional).
    status_publisher: Option<StatusPublisher>,
    /// Receiver for inbound messages, handed out once via [`subscribe`](Self::subscribe).
    inbound_rx: Option<mpsc::Receiver<InboundMessage>>,
    /// Shutdown signal for workers and the event-loop driver.
    shutdown_tx: watch::Sender<bool>,
    /// Spawned tasks.
    tasks: Vec<JoinHandle<()>>,
}

impl<C: BridgeConfig> BridgeRunner<C> {
    /// Create a new bridge runner.
    ///
    /// This will:
    /// 1. Initialize logging based on config (with optional CLI override)
    /// 2. Create the MQTT client and spawn the event-loop driver
    /// 3. Create the publisher
    pub fn new(name: impl Into<String>, config: C) -> Result<Self> {
        Self::new_with_args(name, config, None)
    }

    /// Create a new bridge runner with CLI args for log level override.
    pub fn new_with_args(
        name: impl Into<String>,
        config: C,
        args: Option<&BridgeArgs>,
    ) -> Result<Self> {
        let name = name.into();
        let version = env!("CARGO_PKG_VERSION").to_string();

        // Initialize logging with optional CLI override
        let log_config = match args.and_then(|a| a.log_level.as_ref()) {
            Some(level) => LoggingConfig {
                level: level.clone(),
                format: config.logging().format,
            },
            None => config.logging().clone(),
        };

        init_tracing(&log_config).map_err(|e| BridgeError::config(e.to_string()))?;

        tracing::info!(bridge = %name, version = %version, "Starting bridge");

        // Create the client; the connection is made by the event loop.
        let (client, event_loop) =
            connect(config.mqtt()).map_err(|e| BridgeError::MqttConnection(e.to_string()))?;

        let qos = qos_from_u8(config.mqtt().qos).map_err(|e| BridgeError::config(e.to_string()))?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (inbound_tx, inbound_rx) = mpsc::channel(config.mqtt().channel_capacity.max(1));

        let publisher = Publisher::new(client.clone(), config.topic_prefix(), qos, false);

        let mut runner = Self {
            name,
            version,
            config,
            client,
            qos,
            publisher,
            status_publisher: None,
            inbound_rx: Some(inbound_rx),
            shutdown_tx,
            tasks: Vec::new(),
        };

        runner.spawn(drive_event_loop(event_loop, inbound_tx, shutdown_rx));

        Ok(runner)
    }

    /// Enable status publishing.
    ///
    /// When enabled, the runner will publish status messages on startup and shutdown.
    pub fn with_status_publishing(mut self) -> Self {
        self.status_publisher = Some(StatusPublisher::new(
            self.publisher.clone(),
            &self.name,
            &self.version,
        ));
        self
    }

    /// Get the bridge name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the bridge version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &C {
        &self.config
    }

    /// Get a reference to the MQTT client.
    pub fn client(&self) -> &AsyncClient {
        &self.client
    }

    /// Get a clone of the publisher.
    pub fn publisher(&self) -> Publisher {
        self.publisher.clone()
    }

    /// Get a shutdown receiver for a worker task.
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Subscribe to a topic filter and take the inbound message receiver.
    ///
    /// Inbound messages on all subscribed filters flow through a single
    /// bounded channel; this can therefore only be called once.
    pub async fn subscribe(&mut self, filter: &str) -> Result<mpsc::Receiver<InboundMessage>> {
        if !is_valid_filter(filter) {
            return Err(BridgeError::config(format!(
                "Invalid subscription filter: '{}'",
                filter
            )));
        }

        let rx = self
            .inbound_rx
            .take()
            .ok_or_else(|| BridgeError::worker("Inbound receiver already taken"))?;

        self.client.subscribe(filter, self.qos).await?;

        tracing::info!(filter = %filter, qos = ?self.qos, "Subscribed");

        Ok(rx)
    }

    /// Spawn a worker task.
    ///
    /// The task will be tracked and aborted on shutdown.
    pub fn spawn<F>(&mut self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(future);
        self.tasks.push(handle);
    }

    /// Run the bridge until Ctrl+C is received.
    ///
    /// This will:
    /// 1. Publish "running" status (if enabled)
    /// 2. Wait for Ctrl+C signal
    /// 3. Publish "offline" status (if enabled) and disconnect
    /// 4. Stop the event-loop driver and all spawned tasks
    pub async fn run(self) -> Result<()> {
        self.run_with_metadata(None).await
    }

    /// Run the bridge with custom status metadata.
    pub async fn run_with_metadata(self, metadata: Option<serde_json::Value>) -> Result<()> {
        // Publish running status
        if let Some(ref status_pub) = self.status_publisher {
            if let Err(e) = status_pub.publish_running(metadata).await {
                tracing::warn!(error = %e, "Failed to publish running status");
            }
        }

        tracing::info!(
            bridge = %self.name,
            tasks = self.tasks.len(),
            "Bridge running. Press Ctrl+C to stop."
        );

        // Wait for shutdown signal
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }

        tracing::info!(bridge = %self.name, "Received shutdown signal");

        // Publish offline status while the event loop is still draining
        if let Some(ref status_pub) = self.status_publisher {
            if let Err(e) = status_pub.publish_offline().await {
                tracing::warn!(error = %e, "Failed to publish offline status");
            }
        }

        // Give the driver a moment to flush outstanding publishes
        tokio::time::sleep(Duration::from_millis(200)).await;

        if let Err(e) = self.client.disconnect().await {
            tracing::warn!(error = %e, "Error disconnecting from broker");
        }

        // Stop workers and the event-loop driver
        let _ = self.shutdown_tx.send(true);

        // Wait briefly for tasks to clean up
        tokio::time::sleep(Duration::from_millis(100)).await;

        for task in &self.tasks {
            task.abort();
        }

        tracing::info!(bridge = %self.name, "Goodbye!");

        Ok(())
    }
}

/// Drive the MQTT event loop, forwarding inbound messages to the channel.
///
/// Connection errors are logged and polling resumes after a short pause,
/// which is what triggers the client's reconnect. A full inbound channel
/// drops the message rather than stalling the network loop.
async fn drive_event_loop(
    mut event_loop: EventLoop,
    inbound: mpsc::Sender<InboundMessage>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    tracing::debug!("Event-loop driver stopping");
                    break;
                }
            }

            event = event_loop.poll() => match event {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    tracing::info!(code = ?ack.code, "Connected to MQTT broker");
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    let message = InboundMessage {
                        topic: publish.topic,
                        payload: publish.payload.to_vec(),
                    };

                    match inbound.try_send(message) {
                        Ok(()) => {}
                        Err(mpsc::error::TrySendError::Full(m)) => {
                            tracing::warn!(topic = %m.topic, "Inbound channel full, dropping message");
                        }
                        // No consumer took the receiver; inbound traffic is ignored.
                        Err(mpsc::error::TrySendError::Closed(_)) => {}
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "MQTT connection error, retrying in 1s");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    // Runner tests require a live broker connection, which we can't easily
    // mock. Integration tests should cover the runner functionality.
}
