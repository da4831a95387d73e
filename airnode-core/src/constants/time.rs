//! Time-Related Constants
//!
//! Default cadences and wait budgets. Everything here is a default; the
//! runtime configuration can override each value.

// ===== PERSISTENCE =====

/// Default interval between fusion-state snapshots (seconds).
///
/// Flash endurance is ~100k erase cycles per sector. An hourly write keeps
/// a single page alive for over a decade, while the acquisition cadence is
/// 3 s to 300 s.
pub const DEFAULT_SNAPSHOT_INTERVAL_SECS: u64 = 3600;

// ===== ACQUISITION =====

/// Status polls after the measurement delay before declaring "no data".
pub const DEFAULT_READY_POLL_LIMIT: u8 = 5;

/// Delay between two status polls (microseconds).
pub const DEFAULT_READY_POLL_INTERVAL_US: u32 = 10_000;

/// Interval of the simple periodic sampling path (milliseconds).
pub const DEFAULT_PERIODIC_INTERVAL_MS: u64 = 5000;

// ===== CONSUMERS =====

/// Wait budget of one consumer queue receive (milliseconds).
///
/// Bounded so a consumer re-checks its other periodic conditions (clock
/// roll-over on the display) even when no data arrives.
pub const DEFAULT_CONSUMER_WAIT_MS: u64 = 1000;

// ===== SAMPLE RATES (Hz) =====

/// Ultra-low-power fusion sample rate: one measurement every 300 s.
pub const SAMPLE_RATE_ULP_HZ: f32 = 1.0 / 300.0;

/// Low-power fusion sample rate: one measurement every 3 s.
pub const SAMPLE_RATE_LP_HZ: f32 = 1.0 / 3.0;

/// Continuous fusion sample rate: one measurement per second.
pub const SAMPLE_RATE_CONT_HZ: f32 = 1.0;
