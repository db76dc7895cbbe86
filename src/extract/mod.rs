//! Extraction module for post markup
//!
//! This module turns semi-structured markup into typed values:
//! - Engagement-count normalization (`12.3k` → 12300)
//! - Post-page metadata and media address extraction
//! - Post-anchor harvesting from the rendered feed

mod links;
mod metadata;
mod numeric;

pub use links::extract_post_links;
pub use metadata::{extract_metadata, parse_post_page, ExtractedMetadata, MediaKind, PostPage};
pub use numeric::parse_count;

use thiserror::Error;

/// Errors raised by a single extraction step
///
/// These never abort a crawl: each failed step degrades its field to absent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("Unparsable count token: '{0}'")]
    InvalidCount(String),

    #[error("Missing {0}")]
    Missing(&'static str),

    #[error("Invalid media URL: {0}")]
    InvalidMediaUrl(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),
}
