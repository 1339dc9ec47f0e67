use std::time::Duration;

use rumqttc::{AsyncClient, EventLoop, LastWill, MqttOptions, QoS};

use crate::config::MqttConfig;
use crate::error::{Error, Result};

/// Convert a numeric QoS level (0, 1, or 2) to the client type.
pub fn qos_from_u8(level: u8) -> Result<QoS> {
    match level {
        0 => Ok(QoS::AtMostOnce),
        1 => Ok(QoS::AtLeastOnce),
        2 => Ok(QoS::ExactlyOnce),
        other => Err(Error::Config(format!(
            "Invalid QoS level: {}. Expected 0, 1, or 2",
            other
        ))),
    }
}

/// Build MQTT client options from the provided configuration.
pub fn build_options(config: &MqttConfig) -> Result<MqttOptions> {
    if config.host.is_empty() {
        return Err(Error::Config("MQTT host must not be empty".to_string()));
    }

    let client_id = config.resolved_client_id();
    if client_id.is_empty() {
        return Err(Error::Config("MQTT client_id must not be empty".to_string()));
    }

    // The client rejects keepalives shorter than 5 seconds.
    if config.keep_alive_secs < 5 {
        return Err(Error::Config(format!(
            "keep_alive_secs must be >= 5, got {}",
            config.keep_alive_secs
        )));
    }

    qos_from_u8(config.qos)?;

    let mut options = MqttOptions::new(client_id, &config.host, config.port);
    options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));
    options.set_clean_session(config.clean_session);

    if let Some(ref credentials) = config.credentials {
        options.set_credentials(&credentials.username, &credentials.password);
    }

    if let Some(ref will) = config.last_will {
        let qos = qos_from_u8(will.qos)?;
        options.set_last_will(LastWill::new(
            &will.topic,
            will.payload.as_bytes().to_vec(),
            qos,
            will.retain,
        ));
    }

    Ok(options)
}

/// Create an MQTT client from the provided configuration.
///
/// The returned [`EventLoop`] must be polled continuously for the
/// connection to make progress; the client itself only enqueues requests.
pub fn connect(config: &MqttConfig) -> Result<(AsyncClient, EventLoop)> {
    let options = build_options(config)?;

    tracing::info!(
        host = %config.host,
        port = config.port,
        client_id = %config.resolved_client_id(),
        keep_alive_secs = config.keep_alive_secs,
        "Connecting to MQTT broker"
    );

    Ok(AsyncClient::new(options, config.channel_capacity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qos_conversion() {
        assert_eq!(qos_from_u8(0).unwrap(), QoS::AtMostOnce);
        assert_eq!(qos_from_u8(1).unwrap(), QoS::AtLeastOnce);
        assert_eq!(qos_from_u8(2).unwrap(), QoS::ExactlyOnce);
        assert!(qos_from_u8(3).is_err());
    }

    #[test]
    fn test_build_options_defaults() {
        let config = MqttConfig {
            client_id: "rpi_publisher".to_string(),
            ..Default::default()
        };

        let options = build_options(&config).unwrap();
        assert_eq!(options.broker_address(), ("localhost".to_string(), 1883));
        assert_eq!(options.client_id(), "rpi_publisher");
        assert_eq!(options.keep_alive(), Duration::from_secs(60));
    }

    #[test]
    fn test_build_options_rejects_empty_host() {
        let config = MqttConfig {
            host: String::new(),
            ..Default::default()
        };
        assert!(build_options(&config).is_err());
    }

    #[test]
    fn test_build_options_rejects_short_keepalive() {
        let config = MqttConfig {
            keep_alive_secs: 1,
            ..Default::default()
        };
        assert!(build_options(&config).is_err());
    }

    #[test]
    fn test_build_options_rejects_bad_qos() {
        let config = MqttConfig {
            qos: 7,
            ..Default::default()
        };
        assert!(build_options(&config).is_err());
    }
}
