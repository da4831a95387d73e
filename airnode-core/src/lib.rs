//! Core of the Airnode environmental-monitoring node
//!
//! Sensor scheduling driven by an opaque air-quality fusion library,
//! integrity-checked persistence of the library's state, and change-
//! suppressing distribution of samples to independent consumers.
//! Designed for microcontrollers without a heap.
//!
//! Key constraints:
//! - No heap allocation: every buffer has a compile-time capacity
//! - No blocking on the producer side of a consumer queue
//! - Persisted state is never trusted without a matching digest
//!
//! ```no_run
//! use airnode_core::{Controller, ControllerConfig, CycleOutcome, SampleRate};
//! # use airnode_core::traits::{FusionEngine, SensorDevice};
//! # fn sleep_until(_: u64) {}
//! # fn now() -> u64 { 0 }
//!
//! fn fusion_loop<S: SensorDevice, E: FusionEngine>(sensor: S, engine: E) {
//!     let Ok(mut controller) = Controller::setup(sensor, engine, ControllerConfig::default(), SampleRate::LowPower) else {
//!         return; // setup failure stops the task
//!     };
//!     loop {
//!         match controller.run_cycle(now()) {
//!             Ok(outcome) => sleep_until(outcome.next_call()),
//!             Err(_) => sleep_until(now() + 1_000_000_000),
//!         }
//!     }
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod logging;

pub mod constants;
pub mod distribution;
pub mod errors;
pub mod fusion;
pub mod persistence;
pub mod plan;
pub mod queue;
pub mod sample;
pub mod scheduler;
pub mod sensor;
pub mod time;
pub mod traits;

// Public API
pub use distribution::{ChangeGate, DeliveryReport, Distributor, Publication};
pub use errors::{BusError, CycleError, EngineError, PersistError, SetupError, StorageError};
pub use fusion::{Accuracy, DerivedOutput, FusionInput, FusionState, OutputChannel, SampleRate};
pub use persistence::{
    MemoryStorage, PersistenceConfig, PersistenceManager, RestoreSource, SnapshotOutcome, StateRecord,
};
pub use plan::AcquisitionPlan;
pub use queue::{ConsumerQueue, SampleQueue};
pub use sample::{Channel, ChannelSet, PhysicalSample, SampleStatus};
pub use scheduler::{Controller, ControllerConfig, CycleOutcome, PeriodicSampler};
pub use sensor::{ForcedModeSensor, HeaterConfig, Oversampling, SensorConfig};
pub use time::Timestamp;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
