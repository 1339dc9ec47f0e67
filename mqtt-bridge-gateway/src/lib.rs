//! MQTT gateway bridge.
//!
//! Publishes the host sensor readings under a gateway prefix while
//! subscribing to remote-device telemetry and appending matching
//! messages to a flat log file.
//!
//! # Topics
//!
//! ```text
//! rpi/sensor/cpu_temp      published
//! rpi/sensor/memory        published
//! rpi/sensor/uptime        published
//! esp32/#                  subscribed, appended to the log file
//! ```

pub mod config;
pub mod logger;
