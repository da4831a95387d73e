//! Durable Storage
//!
//! A single fixed-size page at a fixed offset. The medium has erase-before-
//! write semantics: no partial-page programming, so every write is a whole
//! page.
//!
//! ## Atomicity Contract
//!
//! `write_page` must leave either the old page or the new page readable,
//! never a mix. Flash bindings get this from a two-sector commit, file
//! bindings from write-to-temp-then-rename. The persistence manager adds a
//! read-back verification on top.

use crate::errors::StorageError;

/// Page-granular durable storage
pub trait DurableStorage {
    /// Size of the page in bytes
    fn page_size(&self) -> usize;

    /// Read the whole page into `buf` (`buf.len()` must equal `page_size()`)
    fn read_page(&mut self, buf: &mut [u8]) -> Result<(), StorageError>;

    /// Replace the whole page with `page` (`page.len()` must equal `page_size()`)
    fn write_page(&mut self, page: &[u8]) -> Result<(), StorageError>;
}

impl<T: DurableStorage + ?Sized> DurableStorage for &mut T {
    fn page_size(&self) -> usize {
        (**self).page_size()
    }

    fn read_page(&mut self, buf: &mut [u8]) -> Result<(), StorageError> {
        (**self).read_page(buf)
    }

    fn write_page(&mut self, page: &[u8]) -> Result<(), StorageError> {
        (**self).write_page(page)
    }
}
