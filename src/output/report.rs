//! Per-profile crawl report

use crate::state::PostOutcome;
use crate::url::Profile;
use chrono::{DateTime, Utc};
use std::fmt;

/// Summary of one profile crawl
#[derive(Debug, Clone)]
pub struct ProfileReport {
    pub profile: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Posts returned by discovery
    pub discovered: usize,

    /// Posts whose media was written and recorded
    pub downloaded: usize,

    pub unknown_kind: usize,
    pub missing_media_url: usize,
    pub page_fetch_failed: usize,
    pub media_fetch_failed: usize,

    /// Ledger index of the first and last record appended by this crawl
    pub first_index: Option<u64>,
    pub last_index: Option<u64>,

    /// Ledger size after the flush
    pub ledger_records: usize,
}

impl ProfileReport {
    pub fn new(profile: &Profile, started_at: DateTime<Utc>, discovered: usize) -> Self {
        Self {
            profile: profile.handle().to_string(),
            started_at,
            finished_at: None,
            discovered,
            downloaded: 0,
            unknown_kind: 0,
            missing_media_url: 0,
            page_fetch_failed: 0,
            media_fetch_failed: 0,
            first_index: None,
            last_index: None,
            ledger_records: 0,
        }
    }

    /// Counts a post outcome; `index` is the ledger index of a downloaded post
    pub fn record(&mut self, outcome: &PostOutcome, index: Option<u64>) {
        match outcome {
            PostOutcome::Downloaded(_) => {
                self.downloaded += 1;
                if let Some(index) = index {
                    self.first_index.get_or_insert(index);
                    self.last_index = Some(index);
                }
            }
            PostOutcome::UnknownKind => self.unknown_kind += 1,
            PostOutcome::MissingMediaUrl => self.missing_media_url += 1,
            PostOutcome::PageFetchFailed(_) => self.page_fetch_failed += 1,
            PostOutcome::MediaFetchFailed(_) => self.media_fetch_failed += 1,
            PostOutcome::Cancelled | PostOutcome::StorageFailed { .. } => {}
        }
    }

    pub fn finish(&mut self, finished_at: DateTime<Utc>, ledger_records: usize) {
        self.finished_at = Some(finished_at);
        self.ledger_records = ledger_records;
    }

    /// Posts skipped for any reason
    pub fn skipped(&self) -> usize {
        self.unknown_kind + self.missing_media_url + self.page_fetch_failed + self.media_fetch_failed
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }
}

impl fmt::Display for ProfileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} discovered, {} downloaded, {} skipped",
            self.profile,
            self.discovered,
            self.downloaded,
            self.skipped()
        )?;
        if let Some(seconds) = self.duration_seconds() {
            write!(f, " in {}s", seconds)?;
        }
        Ok(())
    }
}
