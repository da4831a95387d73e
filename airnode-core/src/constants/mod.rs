//! Constants for Airnode Core
//!
//! Centralized numeric values used throughout the node. Each constant
//! documents its unit and where the value comes from.
//!
//! ## Organization
//!
//! - **Buffers**: Fixed capacities for state blobs, input batches, queues
//! - **Time**: Default cadences, poll budgets and wait budgets
//! - **Registers**: Register map of the forced-mode gas sensor

/// Fixed capacities sized for a microcontroller without a heap.
pub mod buffers;

/// Default cadences, timeouts and retry budgets.
pub mod time;

/// Register addresses and bit fields of the forced-mode gas sensor.
pub mod registers;

pub use buffers::{
    MAX_STATE_BLOB_SIZE, STATE_DIGEST_LEN, STATE_PAGE_SIZE,
    MAX_FUSION_INPUTS, MAX_FUSION_OUTPUTS,
    DEFAULT_CONSUMER_QUEUE_CAPACITY, MAX_CONSUMERS,
};

pub use time::{
    DEFAULT_SNAPSHOT_INTERVAL_SECS, DEFAULT_READY_POLL_LIMIT,
    DEFAULT_READY_POLL_INTERVAL_US, DEFAULT_CONSUMER_WAIT_MS,
    DEFAULT_PERIODIC_INTERVAL_MS,
};
