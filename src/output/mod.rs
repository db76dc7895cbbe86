//! Output module for crawl reports and ledger statistics
//!
//! This module handles:
//! - Per-profile crawl reports (counts of downloaded and skipped posts)
//! - Statistics over the ledger snapshot (`--stats`)

mod report;
pub mod stats;

pub use report::ProfileReport;
pub use stats::{load_statistics, print_statistics, LedgerStatistics};

/// Logs a finished profile report
pub fn log_report(report: &ProfileReport) {
    tracing::info!(
        profile = %report.profile,
        discovered = report.discovered,
        downloaded = report.downloaded,
        unknown_kind = report.unknown_kind,
        missing_media_url = report.missing_media_url,
        page_fetch_failed = report.page_fetch_failed,
        media_fetch_failed = report.media_fetch_failed,
        ledger_records = report.ledger_records,
        "Profile harvest complete"
    );
}
