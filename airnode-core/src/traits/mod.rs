//! Collaborator Seams of the Node
//!
//! Everything the core does not own is reached through a trait defined here.
//! The core is generic over these traits, so a binding for real hardware and
//! a fake for tests plug in the same way.
//!
//! ## Module Organization
//!
//! - [`bus`] - Register read/write and delay primitives
//! - [`sensor`] - Forced-mode sensor device and vendor compensation
//! - [`fusion`] - The opaque air-quality fusion library
//! - [`storage`] - Page-granular durable storage
//! - [`sink`] - Non-blocking consumer queue endpoints
//! - [`time`] - Time source abstraction
//!
//! ## Design Philosophy
//!
//! - **Static Dispatch**: Controllers are generic, not `dyn`
//! - **Exclusive Ownership**: Stateful collaborators take `&mut self`; one
//!   owner per bus, one owner per fusion library instance
//! - **Status Codes Pass Through**: Errors are concrete, `Copy` types from
//!   [`crate::errors`], never boxed or stringified

pub mod bus;
pub mod fusion;
pub mod sensor;
pub mod sink;
pub mod storage;
pub mod time;

pub use bus::BusTransport;
pub use fusion::FusionEngine;
pub use sensor::{Compensation, SensorDevice};
pub use sink::{QueueFull, SampleSink};
pub use storage::DurableStorage;
pub use time::TimeSource;
