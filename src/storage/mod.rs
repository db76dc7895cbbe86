//! Storage module for persisting download records
//!
//! This module handles everything that outlives a single crawl session:
//! - The in-memory, append-only crawl ledger
//! - The CSV snapshot the ledger is loaded from and flushed to
//! - The single-writer lease that guards a snapshot location

mod csv_store;
mod lease;
mod ledger;
mod traits;

pub use csv_store::{CsvLedgerStore, LEDGER_COLUMNS};
pub use lease::LedgerLease;
pub use ledger::{CrawlLedger, LedgerEntry};
pub use traits::{LedgerStore, StorageError, StorageResult};

use serde::{de, Deserialize, Deserializer, Serialize};
use std::path::Path;

/// One downloaded post, as persisted in the ledger
///
/// `path` is relative to the target directory. A missing like count or title
/// is stored as an empty field, never as a placeholder value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRecord {
    pub path: String,

    #[serde(rename = "likes", default, deserialize_with = "deserialize_like_count")]
    pub like_count: Option<u64>,

    #[serde(default)]
    pub title: Option<String>,
}

/// Opens the ledger at `path` for exclusive use by this session
///
/// # Arguments
///
/// * `path` - Path to the CSV snapshot (need not exist yet)
///
/// # Returns
///
/// * `Ok((CrawlLedger, CsvLedgerStore, LedgerLease))` - Loaded ledger, its store and the held lease
/// * `Err(StorageError)` - The ledger is locked or its snapshot is unreadable
pub fn open_ledger(path: &Path) -> StorageResult<(CrawlLedger, CsvLedgerStore, LedgerLease)> {
    let lease = LedgerLease::acquire(path)?;
    let store = CsvLedgerStore::new(path);
    let ledger = CrawlLedger::load(&store)?;
    Ok((ledger, store, lease))
}

/// Reads like counts written either as integers or as whole floats ("2100.0")
fn deserialize_like_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let value = match raw.as_deref().map(str::trim) {
        None | Some("") => return Ok(None),
        Some(value) => value,
    };

    if let Ok(count) = value.parse::<u64>() {
        return Ok(Some(count));
    }

    match value.parse::<f64>() {
        Ok(count) if count.is_finite() && count >= 0.0 && count.fract() == 0.0 => {
            Ok(Some(count as u64))
        }
        _ => Err(de::Error::custom(format!("invalid likes value '{}'", value))),
    }
}
