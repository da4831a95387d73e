//! Telemetry consumer
//!
//! Drains one consumer queue and publishes each sample as a JSON document
//! on `<prefix>/sample`. A failed publish is logged and counted; the sample
//! is not retried, the next change brings fresh data anyway.
//!
//! ```text
//! {"timestamp_ns":5000000000,"temperature_c":21.5,"humidity_pct":40.0,"pressure_hpa":1013.2}
//! ```

use std::time::Duration;

use airnode_core::sample::PhysicalSample;
use async_trait::async_trait;
use serde::Serialize;

use crate::config::TelemetryConfig;
use crate::queue::{QueueReceiver, Received};
use crate::ConnectorError;

/// Message transport
#[async_trait]
pub trait Publisher: Send {
    async fn publish(&mut self, topic: &str, payload: Vec<u8>) -> Result<(), ConnectorError>;
}

/// Published document; absent channels are omitted
#[derive(Debug, Serialize)]
struct SamplePayload {
    timestamp_ns: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature_c: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    humidity_pct: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pressure_hpa: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gas_resistance_ohm: Option<f32>,
}

/// JSON document for one sample
pub fn encode_sample(sample: &PhysicalSample) -> Result<Vec<u8>, ConnectorError> {
    let payload = SamplePayload {
        timestamp_ns: sample.timestamp,
        temperature_c: sample.temperature,
        humidity_pct: sample.humidity,
        pressure_hpa: sample.pressure_hpa(),
        gas_resistance_ohm: sample.gas_resistance,
    };
    Ok(serde_json::to_vec(&payload)?)
}

/// Publishing counters
#[derive(Debug, Default, Clone)]
pub struct PublishStats {
    /// Samples published successfully
    pub published: u64,
    /// Samples whose publish failed
    pub failed: u64,
    /// Payload bytes published
    pub bytes_sent: u64,
    /// Last error message
    pub last_error: Option<String>,
}

pub struct TelemetryConsumer<P> {
    publisher: P,
    queue: QueueReceiver,
    topic: String,
    wait: Duration,
    stats: PublishStats,
}

impl<P: Publisher> TelemetryConsumer<P> {
    pub fn new(publisher: P, queue: QueueReceiver, config: &TelemetryConfig, wait: Duration) -> Self {
        Self {
            publisher,
            queue,
            topic: config.sample_topic(),
            wait,
            stats: PublishStats::default(),
        }
    }

    /// Handle one receive; `false` once the queue is closed
    pub async fn step(&mut self) -> bool {
        match self.queue.recv_timeout(self.wait).await {
            Received::Sample(sample) => {
                self.send(&sample).await;
                true
            }
            Received::TimedOut => true,
            Received::Closed => false,
        }
    }

    /// Consume until every producer is gone
    pub async fn run(mut self) -> PublishStats {
        while self.step().await {}
        log::info!(
            "telemetry: queue closed after {} published, {} failed",
            self.stats.published,
            self.stats.failed
        );
        self.stats
    }

    async fn send(&mut self, sample: &PhysicalSample) {
        let result = match encode_sample(sample) {
            Ok(payload) => {
                let len = payload.len() as u64;
                self.publisher.publish(&self.topic, payload).await.map(|()| len)
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(len) => {
                self.stats.published += 1;
                self.stats.bytes_sent += len;
            }
            Err(e) => {
                log::warn!("telemetry: publish to {} failed: {}", self.topic, e);
                self.stats.failed += 1;
                self.stats.last_error = Some(e.to_string());
            }
        }
    }

    pub fn stats(&self) -> &PublishStats {
        &self.stats
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_channels_are_omitted() {
        let sample = PhysicalSample::new(5).with_temperature(21.5).with_pressure(101_320.0);
        let json: serde_json::Value = serde_json::from_slice(&encode_sample(&sample).unwrap()).unwrap();

        assert_eq!(json["timestamp_ns"], 5);
        assert_eq!(json["temperature_c"], 21.5);
        assert!((json["pressure_hpa"].as_f64().unwrap() - 1013.2).abs() < 0.01);
        assert!(json.get("humidity_pct").is_none());
        assert!(json.get("gas_resistance_ohm").is_none());
    }
}
