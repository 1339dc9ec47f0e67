//! MQTT bridge for host sensor readings.
//!
//! This bridge samples the CPU temperature, used memory, and uptime of the
//! local host and publishes each reading as raw text to a fixed topic.
//!
//! # Topics
//!
//! ```text
//! sensor/cpu_temp
//! sensor/memory
//! sensor/uptime
//! ```

pub mod collector;
pub mod config;
pub mod sensors;
