//! Buffer Sizes and Memory Constraints
//!
//! Every collection on the sensing path has a compile-time capacity so the
//! node runs without a heap.

// ===== FUSION STATE =====

/// Maximum size of the fusion library's serialized state (bytes).
///
/// Matches the state blob size of the gas-sensor fusion library.
pub const MAX_STATE_BLOB_SIZE: usize = 221;

/// Length of the integrity digest stored next to the state (bytes).
///
/// SHA-1 output size.
pub const STATE_DIGEST_LEN: usize = 20;

/// Size of one durable-storage page holding a state record (bytes).
///
/// One flash program page on RP2040-class parts. The record layout
/// (blob + u32 length + digest = 245 bytes) fits with padding to spare.
pub const STATE_PAGE_SIZE: usize = 256;

const _: () = assert!(
    MAX_STATE_BLOB_SIZE + 4 + STATE_DIGEST_LEN <= STATE_PAGE_SIZE,
    "State record must fit in one page"
);

// ===== FUSION BATCHES =====

/// Maximum physical inputs in one fusion batch.
///
/// Temperature, heat-source offset, humidity, pressure, gas resistance,
/// plus headroom for profile-specific inputs.
pub const MAX_FUSION_INPUTS: usize = 8;

/// Maximum derived outputs per processing step.
///
/// One per virtual output channel the library can produce.
pub const MAX_FUSION_OUTPUTS: usize = 14;

// ===== DISTRIBUTION =====

/// Default capacity of each consumer queue (samples).
///
/// At one sample per few seconds this covers a minute or more of a stalled
/// consumer before updates start dropping.
pub const DEFAULT_CONSUMER_QUEUE_CAPACITY: usize = 20;

/// Maximum number of consumers one distributor fans out to.
pub const MAX_CONSUMERS: usize = 4;
