//! Integration tests for fusion-state persistence
//!
//! Covers restore fallbacks, flush scheduling, storage faults and the
//! integrity check on the persisted record.

mod common;

use airnode_core::constants::{MAX_STATE_BLOB_SIZE, STATE_PAGE_SIZE};
use airnode_core::errors::{EngineError, PersistError, StorageError};
use airnode_core::fusion::FusionState;
use airnode_core::persistence::{
    MemoryStorage, PersistenceConfig, PersistenceManager, RestoreSource, SnapshotOutcome, StateRecord,
};
use airnode_core::time::NANOS_PER_SEC;
use airnode_core::traits::FusionEngine;
use proptest::prelude::*;

use common::ScriptedEngine;

const HOUR: u64 = 3600 * NANOS_PER_SEC;

fn default_state() -> FusionState {
    FusionState::from_bytes(b"factory").unwrap()
}

fn manager(storage: MemoryStorage) -> PersistenceManager<MemoryStorage> {
    PersistenceManager::new(storage, PersistenceConfig::hourly(), default_state())
}

/// Page holding a valid record of `bytes`
fn sealed_page(bytes: &[u8]) -> [u8; STATE_PAGE_SIZE] {
    StateRecord::seal(&FusionState::from_bytes(bytes).unwrap()).to_page()
}

/// Arm the timer at 0 and run the first due snapshot
fn first_snapshot<E: FusionEngine>(
    manager: &mut PersistenceManager<MemoryStorage>,
    engine: &mut E,
) -> Result<SnapshotOutcome, PersistError> {
    assert_eq!(manager.tick(0, engine), Ok(SnapshotOutcome::NotDue));
    manager.tick(HOUR, engine)
}

#[test]
fn flushed_state_survives_restart() {
    let mut manager = manager(MemoryStorage::new());
    let mut engine = ScriptedEngine::new().with_state(b"learned baseline");

    assert_eq!(first_snapshot(&mut manager, &mut engine), Ok(SnapshotOutcome::Flushed));
    assert!(!manager.is_dirty());
    assert_eq!(manager.storage().write_count(), 1);

    // power cycle
    let storage = manager.storage().clone();
    let mut restarted = self::manager(storage);
    let mut fresh = ScriptedEngine::new();

    assert_eq!(restarted.restore(&mut fresh), Ok(RestoreSource::Persisted));
    assert_eq!(fresh.imported.len(), 1);
    assert_eq!(fresh.imported[0].as_bytes(), b"learned baseline");
}

#[test]
fn empty_storage_falls_back_to_default() {
    for storage in [MemoryStorage::new(), MemoryStorage::erased()] {
        let mut manager = manager(storage);
        let mut engine = ScriptedEngine::new();

        assert_eq!(manager.restore(&mut engine), Ok(RestoreSource::Default));
        assert_eq!(engine.imported, vec![default_state()]);
    }
}

#[test]
fn corrupted_record_falls_back_to_default() {
    let mut storage = MemoryStorage::with_page(sealed_page(b"learned baseline"));
    storage.page_mut()[3] ^= 0x01;

    let mut manager = manager(storage);
    let mut engine = ScriptedEngine::new();

    assert_eq!(manager.restore(&mut engine), Ok(RestoreSource::Default));
    assert_eq!(engine.imported, vec![default_state()]);
}

#[test]
fn oversized_length_is_invalid() {
    let mut page = sealed_page(b"abc");
    page[MAX_STATE_BLOB_SIZE..MAX_STATE_BLOB_SIZE + 4].copy_from_slice(&1000u32.to_le_bytes());

    let mut manager = manager(MemoryStorage::with_page(page));
    let mut engine = ScriptedEngine::new();
    assert_eq!(manager.restore(&mut engine), Ok(RestoreSource::Default));
}

#[test]
fn read_failure_falls_back_to_default() {
    let mut storage = MemoryStorage::with_page(sealed_page(b"learned baseline"));
    storage.fail_next_read(StorageError::Backend { code: -4 });

    let mut manager = manager(storage);
    let mut engine = ScriptedEngine::new();
    assert_eq!(manager.restore(&mut engine), Ok(RestoreSource::Default));
    assert_eq!(manager.stats().storage_failures, 1);
}

#[test]
fn rejected_persisted_state_falls_back_to_default() {
    let storage = MemoryStorage::with_page(sealed_page(b"Xincompatible"));
    let mut manager = manager(storage);
    let mut engine = ScriptedEngine { reject_import_marker: Some(b'X'), ..ScriptedEngine::new() };

    assert_eq!(manager.restore(&mut engine), Ok(RestoreSource::Default));
    assert_eq!(engine.imported, vec![default_state()]);
}

#[test]
fn rejected_default_state_is_an_error() {
    let mut manager = manager(MemoryStorage::new());
    let mut engine = ScriptedEngine { reject_import_marker: Some(b'f'), ..ScriptedEngine::new() };

    assert!(matches!(manager.restore(&mut engine), Err(PersistError::Import(_))));
}

#[test]
fn export_failure_retries_next_tick() {
    let mut manager = manager(MemoryStorage::new());
    let mut engine = ScriptedEngine { fail_export: Some(EngineError::new(-9)), ..ScriptedEngine::new() };

    let result = first_snapshot(&mut manager, &mut engine);
    assert_eq!(result, Err(PersistError::Export(EngineError::new(-9))));
    assert!(!manager.is_dirty());
    assert_eq!(manager.storage().write_count(), 0);
    assert_eq!(manager.next_snapshot(), Some(HOUR));

    engine.fail_export = None;
    engine.state = FusionState::from_bytes(b"late").unwrap();
    assert_eq!(manager.tick(HOUR + 1, &mut engine), Ok(SnapshotOutcome::Flushed));
    assert_eq!(manager.next_snapshot(), Some(2 * HOUR + 1));
}

#[test]
fn write_failure_keeps_previous_record() {
    let previous = sealed_page(b"previous");
    let mut manager = manager(MemoryStorage::with_page(previous));
    let mut engine = ScriptedEngine::new();
    manager.restore(&mut engine).unwrap();

    engine.state = FusionState::from_bytes(b"newer").unwrap();
    manager.storage_mut().fail_next_write(StorageError::Backend { code: -5 });

    let result = first_snapshot(&mut manager, &mut engine);
    assert_eq!(result, Err(PersistError::Storage(StorageError::Backend { code: -5 })));
    assert_eq!(manager.storage().page(), &previous);
    assert!(manager.is_dirty());

    // schedule moved on; the next due snapshot writes it
    assert_eq!(manager.tick(HOUR + 1, &mut engine), Ok(SnapshotOutcome::NotDue));
    assert_eq!(manager.tick(2 * HOUR, &mut engine), Ok(SnapshotOutcome::Flushed));
    assert_eq!(manager.shadow_record().state().unwrap().as_bytes(), b"newer");
}

#[test]
fn lost_write_fails_verification() {
    let mut manager = manager(MemoryStorage::new());
    let mut engine = ScriptedEngine::new().with_state(b"state");
    manager.storage_mut().drop_next_write();

    let result = first_snapshot(&mut manager, &mut engine);
    assert_eq!(result, Err(PersistError::Storage(StorageError::VerifyFailed)));
    assert!(manager.is_dirty());

    assert_eq!(manager.flush(), Ok(SnapshotOutcome::Flushed));
    assert!(!manager.is_dirty());
}

#[test]
fn unchanged_state_is_not_rewritten() {
    let mut manager = manager(MemoryStorage::new());
    let mut engine = ScriptedEngine::new().with_state(b"stable");

    assert_eq!(first_snapshot(&mut manager, &mut engine), Ok(SnapshotOutcome::Flushed));
    assert_eq!(manager.tick(2 * HOUR, &mut engine), Ok(SnapshotOutcome::Unchanged));
    assert_eq!(manager.storage().write_count(), 1);
    assert_eq!(manager.stats().snapshots, 2);
}

#[test]
fn flush_disabled_only_updates_shadow() {
    let config = PersistenceConfig { flush_enabled: false, ..PersistenceConfig::hourly() };
    let mut manager = PersistenceManager::new(MemoryStorage::new(), config, default_state());
    let mut engine = ScriptedEngine::new().with_state(b"kept in ram");

    assert_eq!(first_snapshot(&mut manager, &mut engine), Ok(SnapshotOutcome::FlushDisabled));
    assert_eq!(manager.storage().write_count(), 0);
    assert!(manager.is_dirty());
    assert_eq!(manager.shadow_record().state().unwrap().as_bytes(), b"kept in ram");
}

#[test]
fn not_due_before_interval() {
    let mut manager = manager(MemoryStorage::new());
    let mut engine = ScriptedEngine::new();

    assert_eq!(manager.tick(10, &mut engine), Ok(SnapshotOutcome::NotDue));
    assert_eq!(manager.tick(10 + HOUR - 1, &mut engine), Ok(SnapshotOutcome::NotDue));
    assert_eq!(manager.stats().snapshots, 0);
}

#[test]
fn export_import_export_is_stable() {
    let mut source = ScriptedEngine::new().with_state(&[0xA5; MAX_STATE_BLOB_SIZE]);
    let exported = source.export_state().unwrap();

    let record = StateRecord::seal(&exported);
    let page = record.to_page();

    let mut target = ScriptedEngine::new();
    target.import_state(&StateRecord::decode(&page).unwrap().state().unwrap()).unwrap();
    let again = target.export_state().unwrap();

    assert_eq!(StateRecord::seal(&again).to_page(), page);
}

proptest! {
    #[test]
    fn single_byte_corruption_is_detected(
        state in proptest::collection::vec(any::<u8>(), 1..MAX_STATE_BLOB_SIZE),
        pick in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let page = sealed_page(&state);

        // protected bytes: the state itself and the digest
        let digest_start = MAX_STATE_BLOB_SIZE + 4;
        let mut protected: Vec<usize> = (0..state.len()).collect();
        protected.extend(digest_start..digest_start + 20);
        let offset = protected[pick.index(protected.len())];

        let mut corrupted = page;
        corrupted[offset] ^= flip;

        prop_assert!(StateRecord::decode(&page).unwrap().is_valid());
        prop_assert!(!StateRecord::decode(&corrupted).unwrap().is_valid());
    }
}
