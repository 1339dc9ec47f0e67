//! Piwatch Bridge Framework
//!
//! Common abstractions for building MQTT bridges that publish host telemetry
//! and consume remote-device messages.
//!
//! # Overview
//!
//! This framework provides:
//! - [`BridgeConfig`] trait for configuration loading and validation
//! - [`BridgeRunner`] for managing bridge lifecycle (startup, shutdown, signal handling)
//! - [`Publisher`] for publishing readings with fixed prefix/QoS/retain settings
//! - [`InboundMessage`] delivery over a bounded channel
//! - [`BridgeArgs`] for common CLI argument parsing
//! - [`BridgeStatus`] for standardized status reporting
//!
//! # Example
//!
//! ```ignore
//! use piwatch_bridge_framework::{BridgeArgs, BridgeConfig, BridgeRunner};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = BridgeArgs::parse_with_default("mybridge.json5");
//!     let config = MyBridgeConfig::load(&args.config)?;
//!
//!     let mut runner = BridgeRunner::new("mybridge", config)?;
//!
//!     // Spawn bridge-specific workers
//!     runner.spawn(my_worker(runner.publisher(), runner.shutdown_receiver()));
//!
//!     // Run until Ctrl+C
//!     runner.run().await
//! }
//! ```

mod args;
mod config;
mod error;
mod publisher;
mod runner;
mod status;

pub use args::BridgeArgs;
pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use publisher::{PublishStats, Publisher};
pub use runner::{BridgeRunner, InboundMessage};
pub use status::{BridgeStatus, StatusPublisher};

// Re-export commonly used types from piwatch-common and the MQTT client
pub use piwatch_common::{LogFormat, LoggingConfig, MqttConfig, TopicBuilder};
pub use rumqttc::QoS;
