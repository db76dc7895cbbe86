//! Statistics generation from the crawl ledger
//!
//! This module provides functionality for summarizing a ledger snapshot and
//! displaying the result.

use crate::storage::{CrawlLedger, DownloadRecord};

/// Ledger statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerStatistics {
    /// Total number of records
    pub total_records: usize,

    /// Records whose file has a `.jpg` extension
    pub images: usize,

    /// Records whose file has a `.mp4` extension
    pub videos: usize,

    /// Records that carry a like count
    pub with_likes: usize,

    /// Sum of all known like counts
    pub total_likes: u64,

    /// Record with the highest like count (first one on ties)
    pub most_liked: Option<DownloadRecord>,
}

impl LedgerStatistics {
    /// Average like count over the records that have one
    pub fn average_likes(&self) -> Option<f64> {
        if self.with_likes == 0 {
            None
        } else {
            Some(self.total_likes as f64 / self.with_likes as f64)
        }
    }
}

/// Computes statistics over every record of a ledger
///
/// # Arguments
///
/// * `ledger` - The ledger to summarize
///
/// # Returns
///
/// The computed statistics; an empty ledger yields all-zero counts
pub fn load_statistics(ledger: &CrawlLedger) -> LedgerStatistics {
    let mut stats = LedgerStatistics::default();

    for record in ledger.records() {
        stats.total_records += 1;

        if record.path.ends_with(".jpg") {
            stats.images += 1;
        } else if record.path.ends_with(".mp4") {
            stats.videos += 1;
        }

        if let Some(likes) = record.like_count {
            stats.with_likes += 1;
            stats.total_likes = stats.total_likes.saturating_add(likes);

            let is_new_max = stats
                .most_liked
                .as_ref()
                .and_then(|best| best.like_count)
                .map_or(true, |best| likes > best);
            if is_new_max {
                stats.most_liked = Some(record.clone());
            }
        }
    }

    stats
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &LedgerStatistics) {
    println!("=== Ledger Statistics ===\n");

    println!("Overview:");
    println!("  Total records: {}", stats.total_records);
    println!("  Images: {}", stats.images);
    println!("  Videos: {}", stats.videos);
    println!();

    println!("Likes:");
    println!(
        "  Records with like counts: {} / {}",
        stats.with_likes, stats.total_records
    );
    println!("  Total likes: {}", stats.total_likes);
    if let Some(average) = stats.average_likes() {
        println!("  Average likes: {:.1}", average);
    }
    println!();

    if let Some(record) = &stats.most_liked {
        println!("Most Liked:");
        println!("  {}", record.path);
        if let Some(likes) = record.like_count {
            println!("  Likes: {}", likes);
        }
        if let Some(title) = &record.title {
            println!("  Title: {}", title);
        }
    }
}
