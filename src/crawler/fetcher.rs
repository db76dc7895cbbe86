//! HTTP fetcher implementation
//!
//! This module handles all plain HTTP traffic of a harvest:
//! - Building the HTTP client with a proper user agent string
//! - Fetching post pages as text
//! - Streaming media bodies to disk in fixed-size blocks
//!
//! The browser session is only used for feed discovery; post pages and media
//! never go through it.

use crate::config::UserAgentConfig;
use crate::extract::MediaKind;
use reqwest::{redirect::Policy, Client};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncWriteExt, BufWriter};
use url::Url;

/// Block size used when writing streamed media to disk
pub const MEDIA_CHUNK_SIZE: usize = 64 * 1024;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_REDIRECTS: usize = 10;

/// Errors raised while fetching a post page or its media
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Media kind '{0}' cannot be downloaded")]
    UnsupportedKind(MediaKind),

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for fetch operations
pub type FetchResult<T> = Result<T, FetchError>;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(FetchError)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use feed_harvest::config::UserAgentConfig;
/// use feed_harvest::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "FeedHarvest".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "ops@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> FetchResult<Client> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    let client = Client::builder()
        .user_agent(user_agent)
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Fetches a post page and returns its markup
///
/// Any non-success status is an error; the caller skips the post.
pub async fn fetch_post_page(client: &Client, url: &Url) -> FetchResult<String> {
    let response = client
        .get(url.as_str())
        .send()
        .await
        .map_err(|source| network_error(url, source))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response
        .text()
        .await
        .map_err(|source| network_error(url, source))
}

/// Streams a media file to `destination` plus the extension of `kind`
///
/// The destination is given without extension; `.jpg` or `.mp4` is appended
/// from the media kind. An existing file at the final path is overwritten.
/// A failure mid-stream leaves the partial file in place.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - Resolved media address
/// * `destination` - Target path without extension
/// * `kind` - Classified media kind; `Unknown` is rejected before any request
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the written file
/// * `Err(FetchError)` - `Write` for local disk failures, otherwise a network fault
pub async fn download_media(
    client: &Client,
    url: &Url,
    destination: &Path,
    kind: MediaKind,
) -> FetchResult<PathBuf> {
    let extension = kind
        .extension()
        .ok_or(FetchError::UnsupportedKind(kind))?;
    let path = with_appended_extension(destination, extension);

    let mut response = client
        .get(url.as_str())
        .send()
        .await
        .map_err(|source| network_error(url, source))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let write_error = |source: std::io::Error| FetchError::Write {
        path: path.clone(),
        source,
    };

    let file = tokio::fs::File::create(&path).await.map_err(write_error)?;
    let mut writer = BufWriter::with_capacity(MEDIA_CHUNK_SIZE, file);
    let mut written: u64 = 0;

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|source| network_error(url, source))?
    {
        writer.write_all(&chunk).await.map_err(write_error)?;
        written += chunk.len() as u64;
    }
    writer.flush().await.map_err(write_error)?;

    tracing::debug!(url = %url, path = %path.display(), bytes = written, "Downloaded media");
    Ok(path)
}

fn network_error(url: &Url, source: reqwest::Error) -> FetchError {
    FetchError::Network {
        url: url.to_string(),
        source,
    }
}

/// Appends `.ext` without touching dots already in the file name
fn with_appended_extension(path: &Path, extension: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}
