//! State Persistence Manager
//!
//! ## Overview
//!
//! The fusion library's calibration history takes days to build up, so it
//! must survive power loss, and must never come back corrupted. The manager
//! owns the durable-storage page and a shadow copy of it.
//!
//! ### Startup
//!
//! ```text
//! read page ─→ decode ─→ digest ok? ─ yes ─→ import persisted ─ ok ─→ Persisted
//!                          │ no                     │ err
//!                          ▼                        ▼
//!                   import default state ◄──────────┘       ──────→ Default
//! ```
//!
//! ### Steady state
//!
//! Every `snapshot_interval` (hours, not seconds: flash wears out):
//!
//! 1. Export state from the library. On failure keep the old shadow and
//!    retry on the next tick.
//! 2. Seal it with its digest into the shadow page.
//! 3. If flushing is enabled and the shadow differs from the committed page,
//!    write the page, read it back and compare. Only a verified write
//!    becomes the new committed page.
//!
//! The storage backend writes a page atomically (see
//! [`DurableStorage`](crate::traits::DurableStorage)), so an interrupted
//! flush leaves the previous record intact and valid.

mod memory;
mod record;

pub use memory::MemoryStorage;
pub use record::{state_digest, Page, StateDigest, StateRecord};

use crate::constants::buffers::STATE_PAGE_SIZE;
use crate::constants::time::DEFAULT_SNAPSHOT_INTERVAL_SECS;
use crate::errors::{PersistError, StorageError};
use crate::fusion::FusionState;
use crate::time::{secs_to_ns, Timestamp};
use crate::traits::{DurableStorage, FusionEngine};

/// Snapshot cadence and flush switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PersistenceConfig {
    /// Time between snapshots, nanoseconds
    pub snapshot_interval: Timestamp,
    /// Write snapshots through to durable storage
    ///
    /// When off, the shadow copy is still kept current.
    pub flush_enabled: bool,
}

impl PersistenceConfig {
    /// Snapshot once an hour
    pub const fn hourly() -> Self {
        Self {
            snapshot_interval: secs_to_ns(DEFAULT_SNAPSHOT_INTERVAL_SECS),
            flush_enabled: true,
        }
    }

    /// Snapshot once a day
    pub const fn daily() -> Self {
        Self {
            snapshot_interval: secs_to_ns(24 * 3600),
            flush_enabled: true,
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self::hourly()
    }
}

/// Which state the engine started from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreSource {
    /// Valid persisted record
    Persisted,
    /// Built-in default (persisted record missing, corrupt or rejected)
    Default,
}

/// Result of one [`PersistenceManager::tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOutcome {
    /// Snapshot interval not elapsed
    NotDue,
    /// Shadow written to storage and verified
    Flushed,
    /// Shadow equals the committed page, nothing written
    Unchanged,
    /// Shadow updated, flushing switched off
    FlushDisabled,
}

/// Persistence counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistStats {
    pub snapshots: u32,
    pub flushes: u32,
    pub export_failures: u32,
    pub storage_failures: u32,
}

/// Owns durable storage and the shadow copy of the state page
pub struct PersistenceManager<S> {
    storage: S,
    config: PersistenceConfig,
    default_state: FusionState,
    shadow: Page,
    committed: Page,
    next_snapshot: Option<Timestamp>,
    stats: PersistStats,
}

impl<S: DurableStorage> PersistenceManager<S> {
    /// Manage `storage`, falling back to `default_state` when it holds
    /// nothing usable
    pub fn new(storage: S, config: PersistenceConfig, default_state: FusionState) -> Self {
        Self {
            storage,
            config,
            default_state,
            shadow: [0u8; STATE_PAGE_SIZE],
            committed: [0u8; STATE_PAGE_SIZE],
            next_snapshot: None,
            stats: PersistStats::default(),
        }
    }

    /// Load persisted state into `engine`, or the default state
    ///
    /// Only fails if even the default state is rejected.
    pub fn restore<E: FusionEngine + ?Sized>(&mut self, engine: &mut E) -> Result<RestoreSource, PersistError> {
        let mut page = [0u8; STATE_PAGE_SIZE];
        match self.storage.read_page(&mut page) {
            Ok(()) => {
                self.committed = page;
                self.shadow = page;
                if self.import_persisted(&page, engine) {
                    return Ok(RestoreSource::Persisted);
                }
            }
            Err(e) => {
                log_error!("persist: reading state page failed: {}", e);
                self.stats.storage_failures = self.stats.storage_failures.wrapping_add(1);
            }
        }

        engine.import_state(&self.default_state).map_err(|e| {
            log_error!("persist: default state rejected with {}", e.code);
            PersistError::Import(e)
        })?;
        log_warn!("persist: started from default state ({} bytes)", self.default_state.len());
        Ok(RestoreSource::Default)
    }

    fn import_persisted<E: FusionEngine + ?Sized>(&self, page: &Page, engine: &mut E) -> bool {
        let record = StateRecord::from_page(page);

        let Some(state) = record.state() else {
            log_warn!(
                "persist: integrity check failed (length {}, digest {}), ignoring persisted state",
                record.length(),
                record.hex_digest().as_str()
            );
            return false;
        };

        match engine.import_state(&state) {
            Ok(()) => {
                log_info!("persist: restored {} bytes, digest {}", state.len(), record.hex_digest().as_str());
                true
            }
            Err(e) => {
                log_error!("persist: persisted state rejected with {}", e.code);
                false
            }
        }
    }

    /// Snapshot `engine` if the interval elapsed
    ///
    /// The first call only arms the timer. An export failure keeps the
    /// snapshot due, so the next tick retries it; a storage failure waits
    /// for the next scheduled snapshot.
    pub fn tick<E: FusionEngine + ?Sized>(&mut self, now: Timestamp, engine: &mut E) -> Result<SnapshotOutcome, PersistError> {
        match self.next_snapshot {
            None => {
                self.next_snapshot = Some(now.saturating_add(self.config.snapshot_interval));
                return Ok(SnapshotOutcome::NotDue);
            }
            Some(due) if now < due => return Ok(SnapshotOutcome::NotDue),
            Some(_) => {}
        }

        self.snapshot(engine)?;
        self.next_snapshot = Some(now.saturating_add(self.config.snapshot_interval));

        if !self.config.flush_enabled {
            log_debug!("persist: flush disabled, shadow updated only");
            return Ok(SnapshotOutcome::FlushDisabled);
        }
        self.flush()
    }

    /// Export state into the shadow page
    pub fn snapshot<E: FusionEngine + ?Sized>(&mut self, engine: &mut E) -> Result<(), PersistError> {
        let state = engine.export_state().map_err(|e| {
            log_error!("persist: export failed with {}, keeping previous shadow", e.code);
            self.stats.export_failures = self.stats.export_failures.wrapping_add(1);
            PersistError::Export(e)
        })?;

        let record = StateRecord::seal(&state);
        log_debug!(
            "persist: snapshot {} bytes, digest {}\n{}",
            state.len(),
            record.hex_digest().as_str(),
            state.dump()
        );
        self.shadow = record.to_page();
        self.stats.snapshots = self.stats.snapshots.wrapping_add(1);
        Ok(())
    }

    /// Write the shadow page through if it differs from the committed one
    pub fn flush(&mut self) -> Result<SnapshotOutcome, PersistError> {
        if self.shadow == self.committed {
            return Ok(SnapshotOutcome::Unchanged);
        }

        if let Err(e) = self.write_verified() {
            log_error!("persist: flush failed: {}, previous record kept", e);
            self.stats.storage_failures = self.stats.storage_failures.wrapping_add(1);
            return Err(PersistError::Storage(e));
        }

        self.committed = self.shadow;
        self.stats.flushes = self.stats.flushes.wrapping_add(1);
        log_info!("persist: state flushed");
        Ok(SnapshotOutcome::Flushed)
    }

    fn write_verified(&mut self) -> Result<(), StorageError> {
        self.storage.write_page(&self.shadow)?;

        let mut readback = [0u8; STATE_PAGE_SIZE];
        self.storage.read_page(&mut readback)?;
        if readback != self.shadow {
            return Err(StorageError::VerifyFailed);
        }
        Ok(())
    }

    /// Record currently in the shadow copy
    pub fn shadow_record(&self) -> StateRecord {
        StateRecord::from_page(&self.shadow)
    }

    /// Whether the shadow holds something not yet on storage
    pub fn is_dirty(&self) -> bool {
        self.shadow != self.committed
    }

    pub fn next_snapshot(&self) -> Option<Timestamp> {
        self.next_snapshot
    }

    pub fn config(&self) -> &PersistenceConfig {
        &self.config
    }

    pub fn stats(&self) -> PersistStats {
        self.stats
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::NANOS_PER_SEC;

    #[test]
    fn presets() {
        assert_eq!(PersistenceConfig::hourly().snapshot_interval, 3600 * NANOS_PER_SEC);
        assert_eq!(PersistenceConfig::daily().snapshot_interval, 24 * 3600 * NANOS_PER_SEC);
        assert!(PersistenceConfig::default().flush_enabled);
    }

    #[test]
    fn fresh_manager_is_clean() {
        let manager = PersistenceManager::new(MemoryStorage::new(), PersistenceConfig::hourly(), FusionState::new());
        assert!(!manager.is_dirty());
        assert_eq!(manager.next_snapshot(), None);
        assert!(!manager.shadow_record().is_valid());
    }
}
