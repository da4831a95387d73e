//! Time Source Abstraction
//!
//! Abstracts the clock behind the duty cycle so the controller can be driven
//! by a hardware timer on target and by a hand-advanced clock in tests.

use crate::time::Timestamp;

/// Source of time for the system
///
/// ## Implementation Requirements
///
/// - `now()` must be monotonic for monotonic sources
/// - Timestamps are nanoseconds (see [`crate::time`])
pub trait TimeSource: Send {
    /// Current timestamp in nanoseconds
    fn now(&self) -> Timestamp;

    /// Whether this source tracks wall-clock time (vs time since boot)
    fn is_wall_clock(&self) -> bool;
}
