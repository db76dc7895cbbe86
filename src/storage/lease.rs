//! Single-writer lease on a ledger snapshot
//!
//! A lease is a `<snapshot>.lock` file created exclusively next to the
//! snapshot and removed when the lease is dropped. Two crawl sessions pointed
//! at the same ledger cannot both hold it.

use crate::storage::{StorageError, StorageResult};
use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Exclusive ownership of a ledger snapshot location
#[derive(Debug)]
pub struct LedgerLease {
    path: PathBuf,
}

impl LedgerLease {
    /// Acquires the lease for the snapshot at `ledger_path`
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Locked`] if another session holds the lease.
    pub fn acquire(ledger_path: &Path) -> StorageResult<Self> {
        let path = lock_path_for(ledger_path);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                writeln!(file, "{}", std::process::id())?;
                tracing::debug!(lock = %path.display(), "Acquired ledger lease");
                Ok(Self { path })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(StorageError::Locked(path)),
            Err(e) => Err(e.into()),
        }
    }

    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LedgerLease {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(lock = %self.path.display(), "Failed to release ledger lease: {e}");
        }
    }
}

fn lock_path_for(ledger_path: &Path) -> PathBuf {
    let mut name = OsString::from(ledger_path.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}
