//! Error Types for the Sensing, Fusion and Persistence Paths
//!
//! ## Design Philosophy
//!
//! The node runs unattended, so every fallible operation returns a
//! discriminated result and the original cause travels up unchanged:
//!
//! 1. **Small Size**: Every variant is `Copy` and carries only integers or
//!    register addresses. Errors are returned from the duty-cycle hot path.
//!
//! 2. **No Heap Allocation**: No `String`, no boxing. A bus NACK seen by the
//!    controller is the same value the bus adapter produced.
//!
//! 3. **Layered, not translated**: `CycleError` wraps `BusError` and
//!    `EngineError` as-is. The wrapper only records *which stage* failed.
//!
//! ## Error Categories
//!
//! ### Transient bus errors (`BusError`)
//! Short transfers, NACKs and timeouts. The cycle aborts, the next scheduled
//! cycle retries naturally.
//!
//! ### Fusion library errors (`EngineError`)
//! The opaque library's status code, verbatim. Always surfaced.
//!
//! ### Durable storage errors (`StorageError`)
//! Write failures never touch the previously committed page; the next
//! scheduled flush retries.
//!
//! Integrity failures of persisted state are *not* errors: startup falls back
//! to the default state (see [`crate::persistence`]).
//!
//! ```rust
//! use airnode_core::{BusError, CycleError};
//!
//! fn describe(err: CycleError) -> &'static str {
//!     match err {
//!         CycleError::Configure(BusError::Nack { .. }) => "sensor did not acknowledge config",
//!         CycleError::Configure(_) => "config write failed",
//!         CycleError::Bus(_) => "acquisition failed",
//!         CycleError::Engine(_) => "fusion library rejected the cycle",
//!     }
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for bus transactions
pub type BusResult<T> = Result<T, BusError>;

/// Bus-level transaction failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// Fewer bytes were transferred than requested
    #[error("Short transfer on register {register:#04x}: expected {expected}, got {actual}")]
    ShortTransfer {
        /// Register the transaction addressed
        register: u8,
        /// Bytes requested
        expected: usize,
        /// Bytes actually moved
        actual: usize,
    },

    /// Device did not acknowledge the transaction
    #[error("NACK on register {register:#04x}")]
    Nack {
        /// Register the transaction addressed
        register: u8,
    },

    /// Transaction did not complete in time
    #[error("Bus timeout")]
    Timeout,

    /// Status polling exhausted its retry budget without the device settling
    #[error("Device stuck after {polls} polls")]
    Stuck {
        /// Number of polls performed
        polls: u8,
    },
}

/// Status code returned by the fusion library
///
/// Positive codes are warnings, negative codes are errors; both abort the
/// current cycle. The value is never remapped.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Fusion library returned status {code}")]
pub struct EngineError {
    /// Library-defined status code
    pub code: i32,
}

impl EngineError {
    /// Wrap a raw library status code
    pub const fn new(code: i32) -> Self {
        Self { code }
    }

    /// True for warning-class codes (positive)
    pub const fn is_warning(&self) -> bool {
        self.code > 0
    }
}

/// Durable storage failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Buffer does not match the page size of the medium
    #[error("Page size mismatch: expected {expected}, got {actual}")]
    PageSize {
        /// Page size of the medium
        expected: usize,
        /// Length of the buffer passed in
        actual: usize,
    },

    /// Backend-specific failure code (flash HAL status, OS errno)
    #[error("Storage backend failed with code {code}")]
    Backend {
        /// Raw backend code
        code: i32,
    },

    /// Read-back after a write did not match what was written
    #[error("Read-back verification failed")]
    VerifyFailed,
}

/// Failure of one scheduling cycle
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleError {
    /// Writing the acquisition or heater configuration failed
    #[error("Sensor configuration failed: {0}")]
    Configure(BusError),

    /// Triggering or reading the measurement failed
    #[error("Acquisition failed: {0}")]
    Bus(BusError),

    /// The fusion library rejected planning or processing
    #[error("Fusion engine failed: {0}")]
    Engine(EngineError),
}

impl From<EngineError> for CycleError {
    fn from(err: EngineError) -> Self {
        CycleError::Engine(err)
    }
}

/// One-time setup failures, fatal for the owning task
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupError {
    /// Library initialisation failed
    #[error("Fusion engine init failed: {0}")]
    Init(EngineError),

    /// Output subscription was rejected
    #[error("Fusion engine subscription failed: {0}")]
    Subscribe(EngineError),

    /// Sensor could not be brought up
    #[error("Sensor setup failed: {0}")]
    Sensor(BusError),
}

/// Persistence manager failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistError {
    /// Exporting state from the fusion engine failed
    #[error("State export failed: {0}")]
    Export(EngineError),

    /// Importing state into the fusion engine failed
    #[error("State import failed: {0}")]
    Import(EngineError),

    /// Reading or writing durable storage failed
    #[error("Durable storage failed: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for PersistError {
    fn from(err: StorageError) -> Self {
        PersistError::Storage(err)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for BusError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::ShortTransfer { register, expected, actual } =>
                defmt::write!(fmt, "Short transfer @{=u8:#x}: {}/{}", register, actual, expected),
            Self::Nack { register } =>
                defmt::write!(fmt, "NACK @{=u8:#x}", register),
            Self::Timeout =>
                defmt::write!(fmt, "Bus timeout"),
            Self::Stuck { polls } =>
                defmt::write!(fmt, "Stuck after {} polls", polls),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for EngineError {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "Fusion status {}", self.code)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CycleError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Configure(e) => defmt::write!(fmt, "Configure: {}", e),
            Self::Bus(e) => defmt::write!(fmt, "Bus: {}", e),
            Self::Engine(e) => defmt::write!(fmt, "Engine: {}", e),
        }
    }
}
