//! Remote-telemetry log writer.
//!
//! Consumes inbound messages from the runner's channel and appends the
//! matching ones to a flat text file, one timestamped line per message.
//! All writes flow through this single task, so lines never interleave
//! even under bursts of incoming traffic.

use chrono::{DateTime, Local};
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, watch};
use tracing::{trace, warn};

use piwatch_bridge_framework::InboundMessage;

use crate::config::GatewayConfig;

/// Writer task appending remote-device telemetry to the log file.
pub struct MessageLogger {
    config: GatewayConfig,
}

impl MessageLogger {
    /// Create a new message logger.
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    /// Create the log directory. Called once at startup.
    pub fn prepare(&self) -> std::io::Result<()> {
        if let Some(parent) = self.config.log_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    /// Whether a message on this topic belongs in the log.
    pub fn should_log(&self, topic: &str) -> bool {
        topic.starts_with(&self.config.log_prefix)
    }

    /// Run the logger until shutdown is signalled or the channel closes.
    pub async fn run(
        self,
        mut inbound: mpsc::Receiver<InboundMessage>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        tracing::info!(
            log_path = %self.config.log_path.display(),
            log_prefix = %self.config.log_prefix,
            "Starting message logger"
        );

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
                message = inbound.recv() => match message {
                    Some(message) => self.handle(&message).await,
                    None => break,
                }
            }
        }

        tracing::info!("Message logger stopped");
    }

    async fn handle(&self, message: &InboundMessage) {
        if !self.should_log(&message.topic) {
            trace!(topic = %message.topic, "Ignoring message outside log prefix");
            return;
        }

        let line = format_entry(
            &message.topic,
            &message.payload,
            self.config.max_payload_bytes,
            Local::now(),
        );

        if let Err(e) = self.append(&line).await {
            warn!(
                error = %e,
                path = %self.config.log_path.display(),
                "Failed to append log entry"
            );
        }
    }

    // The file is opened in append mode per entry; no handle is held open.
    async fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.config.log_path)
            .await?;

        file.write_all(line.as_bytes()).await
    }
}

/// Format a log entry: `[YYYY-MM-DD HH:MM:SS] <topic>: <payload>`.
///
/// Payloads longer than `max_payload_bytes` are truncated, never
/// rejected; the truncated bytes are decoded lossily as UTF-8.
pub fn format_entry(
    topic: &str,
    payload: &[u8],
    max_payload_bytes: usize,
    timestamp: DateTime<Local>,
) -> String {
    let end = payload.len().min(max_payload_bytes);
    let text = String::from_utf8_lossy(&payload[..end]);

    format!(
        "[{}] {}: {}\n",
        timestamp.format("%Y-%m-%d %H:%M:%S"),
        topic,
        text
    )
}
