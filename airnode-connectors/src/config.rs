//! Node configuration
//!
//! One JSON document, every field optional:
//!
//! ```json
//! {
//!   "sampling":    { "interval_ms": 5000 },
//!   "fusion":      { "sample_rate": "low_power", "heat_source_offset": 0.0 },
//!   "persistence": { "state_path": "/var/lib/airnode/state.bin", "snapshot_interval_secs": 3600 },
//!   "queues":      { "capacity": 20, "wait_ms": 1000 },
//!   "telemetry":   { "broker_host": "localhost", "topic_prefix": "airnode" },
//!   "display":     { "enabled": true }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use airnode_core::constants::{
    DEFAULT_CONSUMER_QUEUE_CAPACITY, DEFAULT_CONSUMER_WAIT_MS, DEFAULT_PERIODIC_INTERVAL_MS,
    DEFAULT_READY_POLL_INTERVAL_US, DEFAULT_READY_POLL_LIMIT, DEFAULT_SNAPSHOT_INTERVAL_SECS,
};
use airnode_core::fusion::SampleRate;
use airnode_core::persistence::PersistenceConfig;
use airnode_core::scheduler::ControllerConfig;
use airnode_core::sensor::{AcquireSettings, HeaterConfig, SensorConfig};
use airnode_core::time::{millis_to_ns, secs_to_ns, Timestamp};
use fugit::MicrosDurationU32;
use serde::{Deserialize, Serialize};

use crate::ConnectorError;

/// Complete node configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub sampling: SamplingConfig,
    pub fusion: FusionConfig,
    pub persistence: PersistenceSection,
    pub queues: QueueConfig,
    pub telemetry: TelemetryConfig,
    pub display: DisplayConfig,
}

impl NodeConfig {
    /// Read and validate a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConnectorError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parse and validate a JSON document
    pub fn from_json(text: &str) -> Result<Self, ConnectorError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the runtime cannot honor
    pub fn validate(&self) -> Result<(), ConnectorError> {
        if self.sampling.interval_ms == 0 {
            return Err(ConnectorError::Config("sampling.interval_ms must be > 0".into()));
        }
        if self.sampling.ready_poll_limit == 0 {
            return Err(ConnectorError::Config("sampling.ready_poll_limit must be > 0".into()));
        }
        if self.fusion.ready_poll_limit == 0 {
            return Err(ConnectorError::Config("fusion.ready_poll_limit must be > 0".into()));
        }
        if self.persistence.snapshot_interval_secs == 0 {
            return Err(ConnectorError::Config("persistence.snapshot_interval_secs must be > 0".into()));
        }
        if self.queues.capacity == 0 {
            return Err(ConnectorError::Config("queues.capacity must be > 0".into()));
        }
        if self.queues.wait_ms == 0 {
            return Err(ConnectorError::Config("queues.wait_ms must be > 0".into()));
        }
        if self.telemetry.enabled && self.telemetry.broker_host.is_empty() {
            return Err(ConnectorError::Config("telemetry.broker_host is empty".into()));
        }
        Ok(())
    }
}

/// Periodic sampling path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub interval_ms: u64,
    pub sensor: SensorConfig,
    pub heater: HeaterConfig,
    pub ready_poll_limit: u8,
    pub ready_poll_interval_us: u32,
}

impl SamplingConfig {
    pub fn interval(&self) -> Timestamp {
        millis_to_ns(self.interval_ms)
    }

    pub fn acquire_settings(&self) -> AcquireSettings {
        AcquireSettings {
            poll_limit: self.ready_poll_limit,
            poll_interval: MicrosDurationU32::micros(self.ready_poll_interval_us),
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_PERIODIC_INTERVAL_MS,
            sensor: SensorConfig::default(),
            heater: HeaterConfig::off(),
            ready_poll_limit: DEFAULT_READY_POLL_LIMIT,
            ready_poll_interval_us: DEFAULT_READY_POLL_INTERVAL_US,
        }
    }
}

/// Fusion-driven path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    pub enabled: bool,
    pub sample_rate: SampleRate,
    pub heat_source_offset: f32,
    pub ready_poll_limit: u8,
    pub ready_poll_interval_us: u32,
    /// Wait before planning again when `plan_next` itself failed
    pub retry_ms: u64,
}

impl FusionConfig {
    pub fn controller(&self) -> ControllerConfig {
        ControllerConfig {
            heat_source_offset: self.heat_source_offset,
            ready_poll_limit: self.ready_poll_limit,
            ready_poll_interval_us: self.ready_poll_interval_us,
        }
    }
}

impl Default for FusionConfig {
    fn default() -> Self {
        let controller = ControllerConfig::default();
        Self {
            enabled: true,
            sample_rate: SampleRate::LowPower,
            heat_source_offset: controller.heat_source_offset,
            ready_poll_limit: controller.ready_poll_limit,
            ready_poll_interval_us: controller.ready_poll_interval_us,
            retry_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceSection {
    pub state_path: PathBuf,
    pub snapshot_interval_secs: u64,
    pub flush_enabled: bool,
}

impl PersistenceSection {
    pub fn manager_config(&self) -> PersistenceConfig {
        PersistenceConfig {
            snapshot_interval: secs_to_ns(self.snapshot_interval_secs),
            flush_enabled: self.flush_enabled,
        }
    }
}

impl Default for PersistenceSection {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from("airnode-state.bin"),
            snapshot_interval_secs: DEFAULT_SNAPSHOT_INTERVAL_SECS,
            flush_enabled: true,
        }
    }
}

/// Consumer queue sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub capacity: usize,
    /// Receive budget before a consumer re-checks its own conditions
    pub wait_ms: u64,
}

impl QueueConfig {
    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CONSUMER_QUEUE_CAPACITY,
            wait_ms: DEFAULT_CONSUMER_WAIT_MS,
        }
    }
}

/// MQTT telemetry consumer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub enabled: bool,
    pub broker_host: String,
    pub broker_port: u16,
    pub client_id: String,
    pub topic_prefix: String,
    pub keep_alive_secs: u64,
}

impl TelemetryConfig {
    /// Topic every sample is published on
    pub fn sample_topic(&self) -> String {
        format!("{}/sample", self.topic_prefix.trim_end_matches('/'))
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            broker_host: "localhost".into(),
            broker_port: 1883,
            client_id: "airnode".into(),
            topic_prefix: "airnode".into(),
            keep_alive_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub enabled: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
