//! Persisted state record
//!
//! ## Page Layout
//!
//! ```text
//! offset  size  field
//! ─────────────────────────────────────────────
//!      0   221  state blob (unused tail zeroed)
//!    221     4  state length, u32 little-endian
//!    225    20  SHA-1 over blob[0..length]
//!    245    11  zero padding
//! ```
//!
//! A record is valid iff its length fits the blob and the stored digest
//! equals the digest recomputed over exactly `length` blob bytes. An erased
//! page (all zeros or all ones) is never valid.

use core::fmt::Write;

use heapless::String;
use sha1::{Digest, Sha1};

use crate::constants::buffers::{MAX_STATE_BLOB_SIZE, STATE_DIGEST_LEN, STATE_PAGE_SIZE};
use crate::errors::StorageError;
use crate::fusion::FusionState;

/// SHA-1 digest of a state blob
pub type StateDigest = [u8; STATE_DIGEST_LEN];

/// One durable-storage page
pub type Page = [u8; STATE_PAGE_SIZE];

const LENGTH_OFFSET: usize = MAX_STATE_BLOB_SIZE;
const DIGEST_OFFSET: usize = LENGTH_OFFSET + 4;
const RECORD_END: usize = DIGEST_OFFSET + STATE_DIGEST_LEN;

/// Digest of `bytes`
pub fn state_digest(bytes: &[u8]) -> StateDigest {
    let mut out = [0u8; STATE_DIGEST_LEN];
    out.copy_from_slice(&Sha1::digest(bytes));
    out
}

/// Fusion state plus its integrity digest, as stored
#[derive(Clone, PartialEq, Eq)]
pub struct StateRecord {
    blob: [u8; MAX_STATE_BLOB_SIZE],
    length: u32,
    digest: StateDigest,
}

impl StateRecord {
    /// Record for `state`, digest computed over its bytes
    pub fn seal(state: &FusionState) -> Self {
        let bytes = state.as_bytes();
        let mut blob = [0u8; MAX_STATE_BLOB_SIZE];
        blob[..bytes.len()].copy_from_slice(bytes);
        Self {
            blob,
            length: bytes.len() as u32,
            digest: state_digest(bytes),
        }
    }

    /// Split a page into its fields, valid or not
    pub fn decode(page: &[u8]) -> Result<Self, StorageError> {
        let page: &Page = page
            .try_into()
            .map_err(|_| StorageError::PageSize { expected: STATE_PAGE_SIZE, actual: page.len() })?;
        Ok(Self::from_page(page))
    }

    /// Split a full page into its fields, valid or not
    pub fn from_page(page: &Page) -> Self {
        let mut blob = [0u8; MAX_STATE_BLOB_SIZE];
        blob.copy_from_slice(&page[..LENGTH_OFFSET]);

        let mut length = [0u8; 4];
        length.copy_from_slice(&page[LENGTH_OFFSET..DIGEST_OFFSET]);

        let mut digest = [0u8; STATE_DIGEST_LEN];
        digest.copy_from_slice(&page[DIGEST_OFFSET..RECORD_END]);

        Self { blob, length: u32::from_le_bytes(length), digest }
    }

    /// Page image of this record
    pub fn to_page(&self) -> Page {
        let mut page = [0u8; STATE_PAGE_SIZE];
        page[..LENGTH_OFFSET].copy_from_slice(&self.blob);
        page[LENGTH_OFFSET..DIGEST_OFFSET].copy_from_slice(&self.length.to_le_bytes());
        page[DIGEST_OFFSET..RECORD_END].copy_from_slice(&self.digest);
        page
    }

    /// Declared state length
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Stored digest
    pub fn digest(&self) -> &StateDigest {
        &self.digest
    }

    /// State bytes covered by the digest, `None` if the length is oversized
    fn covered(&self) -> Option<&[u8]> {
        self.blob.get(..self.length as usize)
    }

    /// Stored digest matches the recomputed one
    pub fn is_valid(&self) -> bool {
        match self.covered() {
            Some(bytes) => state_digest(bytes) == self.digest,
            None => false,
        }
    }

    /// The protected state, only if the record is valid
    pub fn state(&self) -> Option<FusionState> {
        if !self.is_valid() {
            return None;
        }
        self.covered().and_then(FusionState::from_bytes)
    }

    /// Stored digest as lowercase hex, for diagnostics
    pub fn hex_digest(&self) -> String<{ STATE_DIGEST_LEN * 2 }> {
        let mut out = String::new();
        for byte in self.digest.iter() {
            // exact capacity, cannot overflow
            let _ = write!(out, "{:02x}", byte);
        }
        out
    }
}

impl core::fmt::Debug for StateRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StateRecord")
            .field("length", &self.length)
            .field("digest", &self.hex_digest().as_str())
            .field("valid", &self.is_valid())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(bytes: &[u8]) -> FusionState {
        FusionState::from_bytes(bytes).unwrap()
    }

    #[test]
    fn sealed_record_is_valid() {
        let record = StateRecord::seal(&state(&[1, 2, 3, 4]));
        assert!(record.is_valid());
        assert_eq!(record.length(), 4);
        assert_eq!(record.state().unwrap().as_bytes(), &[1, 2, 3, 4]);
    }

    #[test]
    fn page_layout() {
        let record = StateRecord::seal(&state(&[0xAA; 10]));
        let page = record.to_page();

        assert_eq!(&page[..10], &[0xAA; 10]);
        assert!(page[10..LENGTH_OFFSET].iter().all(|b| *b == 0));
        assert_eq!(&page[LENGTH_OFFSET..DIGEST_OFFSET], &10u32.to_le_bytes());
        assert_eq!(&page[DIGEST_OFFSET..RECORD_END], record.digest());
        assert!(page[RECORD_END..].iter().all(|b| *b == 0));

        assert_eq!(StateRecord::decode(&page).unwrap(), record);
    }

    #[test]
    fn erased_pages_are_invalid() {
        let zeros = StateRecord::decode(&[0u8; STATE_PAGE_SIZE]).unwrap();
        assert!(!zeros.is_valid());
        assert!(zeros.state().is_none());

        let ones = StateRecord::decode(&[0xFFu8; STATE_PAGE_SIZE]).unwrap();
        assert!(!ones.is_valid());
    }

    #[test]
    fn oversized_length_is_invalid() {
        let mut page = StateRecord::seal(&state(&[7; 8])).to_page();
        page[LENGTH_OFFSET..DIGEST_OFFSET].copy_from_slice(&(MAX_STATE_BLOB_SIZE as u32 + 1).to_le_bytes());
        assert!(!StateRecord::decode(&page).unwrap().is_valid());
    }

    #[test]
    fn wrong_page_size() {
        assert_eq!(
            StateRecord::decode(&[0u8; 16]),
            Err(StorageError::PageSize { expected: STATE_PAGE_SIZE, actual: 16 })
        );
    }

    #[test]
    fn hex_digest_of_empty_state() {
        let record = StateRecord::seal(&FusionState::new());
        assert_eq!(record.hex_digest().as_str(), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    }
}
