/// Outcome definitions for processing a single discovered post
use crate::storage::DownloadRecord;
use std::fmt;
use std::path::PathBuf;

/// What happened to one post reference during a profile crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostOutcome {
    // ===== Success =====
    /// Media was written to disk; the record is ready for the ledger
    Downloaded(DownloadRecord),

    // ===== Skips (per-post, never abort the crawl) =====
    /// The page carried no recognized medium descriptor
    UnknownKind,

    /// Image or video post without a usable media address
    MissingMediaUrl,

    /// The post page could not be fetched
    PageFetchFailed(String),

    /// The media download failed (possibly leaving a partial file)
    MediaFetchFailed(String),

    /// Cancellation was requested before the post was processed
    Cancelled,

    // ===== Fatal =====
    /// The media file could not be created or written locally
    StorageFailed { path: PathBuf, message: String },
}

impl PostOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Downloaded(_) => "downloaded",
            Self::UnknownKind => "unknown_kind",
            Self::MissingMediaUrl => "missing_media_url",
            Self::PageFetchFailed(_) => "page_fetch_failed",
            Self::MediaFetchFailed(_) => "media_fetch_failed",
            Self::Cancelled => "cancelled",
            Self::StorageFailed { .. } => "storage_failed",
        }
    }
}

impl fmt::Display for PostOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
