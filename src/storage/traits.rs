//! Storage traits and error types
//!
//! This module defines the trait interface for ledger snapshot backends and
//! associated error types.

use crate::storage::DownloadRecord;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Ledger snapshot has an invalid header: {0}")]
    InvalidHeader(String),

    #[error("Malformed ledger row {row}: {message}")]
    MalformedRow { row: usize, message: String },

    #[error(
        "Ledger is locked by another crawl session ({}); remove it if no crawl is running",
        .0.display()
    )]
    Locked(PathBuf),

    #[error("Failed to write media file {}: {message}", path.display())]
    MediaWrite { path: PathBuf, message: String },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for ledger snapshot backends
///
/// A snapshot is the full ordered record set. Implementations must make
/// `flush` all-or-nothing: a failed flush leaves the previous snapshot intact.
pub trait LedgerStore {
    /// Loads every persisted record in order
    ///
    /// A missing snapshot is not an error and yields an empty list.
    fn load(&self) -> StorageResult<Vec<DownloadRecord>>;

    /// Replaces the persisted snapshot with `records`
    fn flush(&self, records: &[DownloadRecord]) -> StorageResult<()>;

    /// Human-readable location of the snapshot, for logs
    fn location(&self) -> String;
}
