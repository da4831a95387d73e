//! MQTT transport for the telemetry consumer
//!
//! `rumqttc` splits a connection into a client handle and an event loop
//! that must be polled for anything to go out. [`MqttPublisher::spawn`]
//! drives the event loop on its own task and reconnects after errors.

use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, ConnectionError, EventLoop, MqttOptions, QoS};

use crate::config::TelemetryConfig;
use crate::telemetry::Publisher;
use crate::ConnectorError;

/// Requests buffered between the client handle and the event loop
const CLIENT_CAPACITY: usize = 16;

/// Pause before polling again after a connection error
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

pub struct MqttPublisher {
    client: AsyncClient,
    qos: QoS,
}

impl MqttPublisher {
    /// Connect to the configured broker and drive the event loop
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: &TelemetryConfig) -> Self {
        let mut options = MqttOptions::new(&config.client_id, &config.broker_host, config.broker_port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs.max(5)));

        let (client, event_loop) = AsyncClient::new(options, CLIENT_CAPACITY);
        log::info!("mqtt: connecting to {}:{}", config.broker_host, config.broker_port);
        tokio::spawn(drive(event_loop));

        Self { client, qos: QoS::AtMostOnce }
    }

    /// Delivery guarantee for published samples
    pub fn with_qos(mut self, qos: QoS) -> Self {
        self.qos = qos;
        self
    }
}

async fn drive(mut event_loop: EventLoop) {
    loop {
        match event_loop.poll().await {
            Ok(_) => {}
            Err(ConnectionError::RequestsDone) => {
                log::debug!("mqtt: client dropped, event loop stopped");
                return;
            }
            Err(e) => {
                log::warn!("mqtt: connection error: {}", e);
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

#[async_trait]
impl Publisher for MqttPublisher {
    async fn publish(&mut self, topic: &str, payload: Vec<u8>) -> Result<(), ConnectorError> {
        self.client
            .publish(topic, self.qos, false, payload)
            .await
            .map_err(|e| ConnectorError::Publish(e.to_string()))
    }
}
