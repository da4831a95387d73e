//! Hosted Runtime for the Airnode Core
//!
//! ## Overview
//!
//! `airnode-core` is `no_std` and knows nothing about threads, sockets or
//! files. This crate supplies those for a hosted node:
//!
//! - [`queue`] - tokio-backed consumer queues with a timed receive
//! - [`telemetry`] - JSON sample publishing, MQTT transport in [`mqtt`]
//! - [`display`] - Status screen renderer with wall-clock redraws
//! - [`storage`] - File-backed durable storage page
//! - [`config`] - JSON node configuration
//! - [`runtime`] - Task wiring: fusion loop, sampling loop, consumers
//!
//! ## Task Layout
//!
//! ```text
//!  blocking thread                 blocking thread
//! ┌──────────────────────┐       ┌───────────────────────────┐
//! │ Controller           │       │ PeriodicSampler           │
//! │ PersistenceManager   │       │ Distributor ──┬── queue ──┼──→ TelemetryConsumer (async)
//! └──────────────────────┘       └───────────────┴── queue ──┼──→ DisplayConsumer   (async)
//!                                                            │
//! ```
//!
//! Tasks share nothing but the bounded queues. Each consumer waits on its
//! queue with a fixed budget so it can re-check its own conditions (the
//! display's minute rollover) without new data.
//!
//! ## Example
//!
//! ```no_run
//! use airnode_connectors::config::NodeConfig;
//!
//! let config = NodeConfig::load("/etc/airnode.json")?;
//! println!("publishing to {}", config.telemetry.sample_topic());
//! # Ok::<(), airnode_connectors::ConnectorError>(())
//! ```

pub mod config;
pub mod display;
#[cfg(feature = "mqtt")]
pub mod mqtt;
pub mod queue;
pub mod runtime;
pub mod storage;
pub mod telemetry;

// Re-export common types
pub use config::NodeConfig;
pub use display::{DisplayConsumer, Screen, SystemClock, TextDisplay, WallClock};
#[cfg(feature = "mqtt")]
pub use mqtt::MqttPublisher;
pub use queue::{consumer_queue, QueueReceiver, QueueSender, Received};
pub use runtime::{Shutdown, TaskHandles};
pub use storage::FileStorage;
pub use telemetry::{PublishStats, Publisher, TelemetryConsumer};

use thiserror::Error;

/// Common connector errors
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Display error: {0}")]
    Display(String),

    #[error("Setup failed: {0}")]
    Setup(#[from] airnode_core::errors::SetupError),

    #[error("State restore failed: {0}")]
    Persist(#[from] airnode_core::errors::PersistError),
}
