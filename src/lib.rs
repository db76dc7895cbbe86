//! Feed-Harvest: a scroll-driven profile feed downloader
//!
//! This crate discovers the posts of a public profile feed through an automated
//! browser session, extracts per-post metadata and media, downloads the media
//! files and keeps an append-only ledger of everything it fetched.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod session;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Feed-Harvest operations
///
/// Only faults that end a crawl surface here. Per-post faults (a failed page
/// or media fetch, an unparsable like count) are folded into a
/// [`state::PostOutcome`] and never abort sibling posts.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser session error: {0}")]
    Session(#[from] session::SessionError),

    #[error("Network error: {0}")]
    Network(#[from] crawler::FetchError),

    #[error("Format error: {0}")]
    Format(#[from] extract::FormatError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Crawl cancelled")]
    Cancelled,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Invalid profile handle: '{0}'")]
    InvalidProfile(String),
}

/// Result type alias for Feed-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use extract::{ExtractedMetadata, MediaKind};
pub use state::{DiscoveryPhase, PostOutcome};
pub use storage::{CrawlLedger, DownloadRecord};
pub use url::{PostReference, Profile};
