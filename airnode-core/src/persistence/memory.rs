//! RAM-backed durable storage
//!
//! One page in memory. Used on targets that keep state in battery-backed
//! RAM, and in tests, where the fault hooks simulate a flaky medium.

use crate::constants::buffers::STATE_PAGE_SIZE;
use crate::errors::StorageError;
use crate::persistence::record::Page;
use crate::traits::DurableStorage;

/// Single in-memory page
#[derive(Clone)]
pub struct MemoryStorage {
    page: Page,
    writes: u32,
    fail_next_read: Option<StorageError>,
    fail_next_write: Option<StorageError>,
    drop_next_write: bool,
}

impl MemoryStorage {
    /// Zero-filled page
    pub const fn new() -> Self {
        Self::with_page([0u8; STATE_PAGE_SIZE])
    }

    /// Erased flash (all ones)
    pub const fn erased() -> Self {
        Self::with_page([0xFFu8; STATE_PAGE_SIZE])
    }

    pub const fn with_page(page: Page) -> Self {
        Self {
            page,
            writes: 0,
            fail_next_read: None,
            fail_next_write: None,
            drop_next_write: false,
        }
    }

    /// Current page contents
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Mutable page contents, for corrupting it in tests
    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    /// Successful writes so far
    pub fn write_count(&self) -> u32 {
        self.writes
    }

    /// Fail the next read with `err`
    pub fn fail_next_read(&mut self, err: StorageError) {
        self.fail_next_read = Some(err);
    }

    /// Fail the next write with `err`, leaving the page untouched
    pub fn fail_next_write(&mut self, err: StorageError) {
        self.fail_next_write = Some(err);
    }

    /// Report the next write as done without storing it
    pub fn drop_next_write(&mut self) {
        self.drop_next_write = true;
    }

    fn check_len(len: usize) -> Result<(), StorageError> {
        if len != STATE_PAGE_SIZE {
            return Err(StorageError::PageSize { expected: STATE_PAGE_SIZE, actual: len });
        }
        Ok(())
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl DurableStorage for MemoryStorage {
    fn page_size(&self) -> usize {
        STATE_PAGE_SIZE
    }

    fn read_page(&mut self, buf: &mut [u8]) -> Result<(), StorageError> {
        Self::check_len(buf.len())?;
        if let Some(err) = self.fail_next_read.take() {
            return Err(err);
        }
        buf.copy_from_slice(&self.page);
        Ok(())
    }

    fn write_page(&mut self, page: &[u8]) -> Result<(), StorageError> {
        Self::check_len(page.len())?;
        if let Some(err) = self.fail_next_write.take() {
            return Err(err);
        }
        if core::mem::take(&mut self.drop_next_write) {
            return Ok(());
        }
        self.page.copy_from_slice(page);
        self.writes += 1;
        Ok(())
    }
}
