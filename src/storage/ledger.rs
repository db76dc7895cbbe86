//! In-memory crawl ledger
//!
//! The ledger is an ordered, append-only list of download records. Each
//! record gets an explicit index: loaded rows are numbered from 0, and every
//! append takes the next index after the current maximum.

use crate::storage::{DownloadRecord, LedgerStore, StorageResult};

/// A ledger record with its assigned index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub index: u64,
    pub record: DownloadRecord,
}

/// Append-only record of everything a crawl session downloaded
#[derive(Debug, Clone, Default)]
pub struct CrawlLedger {
    entries: Vec<LedgerEntry>,
    next_index: u64,
}

impl CrawlLedger {
    /// Creates an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ledger from previously persisted records, indexed from 0
    pub fn from_records(records: Vec<DownloadRecord>) -> Self {
        let mut ledger = Self::new();
        for record in records {
            ledger.append(record);
        }
        ledger
    }

    /// Loads the ledger from a snapshot store
    ///
    /// An absent snapshot yields an empty ledger.
    pub fn load(store: &dyn LedgerStore) -> StorageResult<Self> {
        let records = store.load()?;
        tracing::info!(
            records = records.len(),
            location = %store.location(),
            "Loaded crawl ledger"
        );
        Ok(Self::from_records(records))
    }

    /// Appends a record and returns its index
    pub fn append(&mut self, record: DownloadRecord) -> u64 {
        let index = self.next_index;
        self.entries.push(LedgerEntry { index, record });
        self.next_index += 1;
        index
    }

    /// Drops every entry appended at or after `index`
    ///
    /// Used to discard the records of a profile crawl that did not complete,
    /// so a later flush never persists them.
    pub fn rollback_to(&mut self, index: u64) {
        self.entries.retain(|entry| entry.index < index);
        self.next_index = self.next_index.min(index);
    }

    /// Persists the full record set, replacing any prior snapshot
    pub fn flush(&self, store: &dyn LedgerStore) -> StorageResult<()> {
        let records: Vec<DownloadRecord> = self.records().cloned().collect();
        store.flush(&records)?;
        tracing::debug!(
            records = records.len(),
            location = %store.location(),
            "Flushed crawl ledger"
        );
        Ok(())
    }

    /// Index the next append will receive
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn get(&self, index: u64) -> Option<&DownloadRecord> {
        self.entries
            .iter()
            .find(|entry| entry.index == index)
            .map(|entry| &entry.record)
    }

    /// Iterates records in index order
    pub fn records(&self) -> impl Iterator<Item = &DownloadRecord> {
        self.entries.iter().map(|entry| &entry.record)
    }
}
