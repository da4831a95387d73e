//! File-backed durable storage
//!
//! The page lives in one file. A write goes to a sibling temp file, is
//! synced, then renamed over the page file, so a crash leaves the old page
//! or the new one. A missing file reads as erased flash (all `0xFF`).

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use airnode_core::constants::STATE_PAGE_SIZE;
use airnode_core::errors::StorageError;
use airnode_core::traits::DurableStorage;

/// Backend code when the OS reports no errno
const UNKNOWN_OS_ERROR: i32 = -1;

fn backend(err: io::Error) -> StorageError {
    StorageError::Backend { code: err.raw_os_error().unwrap_or(UNKNOWN_OS_ERROR) }
}

#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
    temp_path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut temp = path.clone().into_os_string();
        temp.push(".tmp");
        Self { path, temp_path: PathBuf::from(temp) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn check_len(len: usize) -> Result<(), StorageError> {
        if len != STATE_PAGE_SIZE {
            return Err(StorageError::PageSize { expected: STATE_PAGE_SIZE, actual: len });
        }
        Ok(())
    }

    fn replace(&self, page: &[u8]) -> io::Result<()> {
        let mut file = File::create(&self.temp_path)?;
        file.write_all(page)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&self.temp_path, &self.path)
    }
}

impl DurableStorage for FileStorage {
    fn page_size(&self) -> usize {
        STATE_PAGE_SIZE
    }

    fn read_page(&mut self, buf: &mut [u8]) -> Result<(), StorageError> {
        Self::check_len(buf.len())?;
        match fs::read(&self.path) {
            Ok(bytes) if bytes.len() == buf.len() => {
                buf.copy_from_slice(&bytes);
                Ok(())
            }
            Ok(bytes) => {
                log::warn!("storage: {} holds {} bytes, not a page", self.path.display(), bytes.len());
                Err(StorageError::PageSize { expected: STATE_PAGE_SIZE, actual: bytes.len() })
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("storage: {} not found, reading as erased", self.path.display());
                buf.fill(0xFF);
                Ok(())
            }
            Err(e) => Err(backend(e)),
        }
    }

    fn write_page(&mut self, page: &[u8]) -> Result<(), StorageError> {
        Self::check_len(page.len())?;
        self.replace(page).map_err(|e| {
            log::error!("storage: writing {} failed: {}", self.path.display(), e);
            let _ = fs::remove_file(&self.temp_path);
            backend(e)
        })
    }
}
