//! Time management for the node
//!
//! The fusion library schedules itself in nanoseconds since boot, so that is
//! the unit of every [`Timestamp`] in this crate. Helpers convert to the
//! coarser units used by configuration and logging.
//!
//! Time sources:
//! - Monotonic clock (std builds)
//! - Fixed, hand-advanced clock (tests, simulations)
//! - Anything implementing [`TimeSource`] (hardware timer, RTOS tick)

pub use crate::traits::TimeSource;

/// Timestamp in nanoseconds since device boot
pub type Timestamp = u64;

/// Nanoseconds per second
pub const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Nanoseconds per millisecond
pub const NANOS_PER_MILLI: u64 = 1_000_000;

/// Convert whole seconds to a timestamp delta
pub const fn secs_to_ns(secs: u64) -> Timestamp {
    secs.saturating_mul(NANOS_PER_SEC)
}

/// Convert milliseconds to a timestamp delta
pub const fn millis_to_ns(ms: u64) -> Timestamp {
    ms.saturating_mul(NANOS_PER_MILLI)
}

/// Convert a timestamp delta to whole milliseconds (truncating)
pub const fn ns_to_millis(ns: Timestamp) -> u64 {
    ns / NANOS_PER_MILLI
}

/// Convert a timestamp delta to whole microseconds (truncating)
pub const fn ns_to_us(ns: Timestamp) -> u64 {
    ns / 1_000
}

/// Time remaining until `deadline`, zero if it already passed
pub const fn until(now: Timestamp, deadline: Timestamp) -> Timestamp {
    deadline.saturating_sub(now)
}

/// Monotonic time source anchored at construction (requires std)
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl MonotonicClock {
    /// Start counting from now
    pub fn new() -> Self {
        Self { origin: std::time::Instant::now() }
    }
}

#[cfg(feature = "std")]
impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for MonotonicClock {
    fn now(&self) -> Timestamp {
        // u64 nanoseconds cover ~584 years of uptime
        self.origin.elapsed().as_nanos() as Timestamp
    }

    fn is_wall_clock(&self) -> bool {
        false
    }
}

/// Fixed time source for testing
#[derive(Debug, Clone)]
pub struct FixedTime {
    timestamp: Timestamp,
}

impl FixedTime {
    pub fn new(timestamp: Timestamp) -> Self {
        Self { timestamp }
    }

    pub fn set(&mut self, timestamp: Timestamp) {
        self.timestamp = timestamp;
    }

    pub fn advance(&mut self, ns: u64) {
        self.timestamp = self.timestamp.saturating_add(ns);
    }
}

impl TimeSource for FixedTime {
    fn now(&self) -> Timestamp {
        self.timestamp
    }

    fn is_wall_clock(&self) -> bool {
        false
    }
}
