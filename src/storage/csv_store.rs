//! CSV ledger snapshot
//!
//! The snapshot is a plain CSV file with the columns `path,likes,title`, one
//! row per download record. Flushing writes a sibling temp file and renames it
//! over the snapshot, so a failed flush never leaves a half-written ledger.

use crate::storage::{DownloadRecord, LedgerStore, StorageError, StorageResult};
use std::ffi::OsString;
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Column header of the ledger snapshot
pub const LEDGER_COLUMNS: [&str; 3] = ["path", "likes", "title"];

/// Ledger snapshot stored as a CSV file
#[derive(Debug, Clone)]
pub struct CsvLedgerStore {
    path: PathBuf,
}

impl CsvLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl LedgerStore for CsvLedgerStore {
    fn load(&self) -> StorageResult<Vec<DownloadRecord>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let headers = reader.headers()?.clone();
        if headers.is_empty() {
            return Ok(Vec::new());
        }
        if !headers.iter().any(|column| column == "path") {
            return Err(StorageError::InvalidHeader(
                headers.iter().collect::<Vec<_>>().join(","),
            ));
        }

        let mut records = Vec::new();
        for (row, result) in reader.deserialize::<DownloadRecord>().enumerate() {
            let record = result.map_err(|e| StorageError::MalformedRow {
                row: row + 1,
                message: e.to_string(),
            })?;
            records.push(record);
        }

        Ok(records)
    }

    fn flush(&self, records: &[DownloadRecord]) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.temp_path();
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_path(&temp_path)?;
            writer.write_record(LEDGER_COLUMNS)?;
            for record in records {
                writer.serialize(record)?;
            }
            writer.flush()?;
        }

        std::fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
