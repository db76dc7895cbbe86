//! Crawler module for profile feed harvesting
//!
//! This module contains the core harvesting logic, including:
//! - Scroll-driven post discovery on a browser session
//! - HTTP fetching of post pages and streamed media downloads
//! - Per-profile orchestration over a bounded worker pool

mod coordinator;
mod discovery;
mod fetcher;

pub use coordinator::Harvester;
pub use discovery::{DiscoveryOptions, PostDiscovery};
pub use fetcher::{
    build_http_client, download_media, fetch_post_page, FetchError, FetchResult, MEDIA_CHUNK_SIZE,
};

use crate::config::Config;
use crate::output::ProfileReport;
use crate::session::ChromeSession;
use crate::url::Profile;
use crate::Result;
use tokio_util::sync::CancellationToken;

/// Runs a complete harvest over a Chromium session
///
/// This is the main entry point for a harvest. It will:
/// 1. Launch the browser session
/// 2. Open and lease the ledger in the target directory
/// 3. Harvest every profile in order, flushing after each one
/// 4. Close the browser
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `profiles` - Profiles to harvest, in order
/// * `cancel` - Token that aborts the harvest between scroll passes and posts
///
/// # Returns
///
/// * `Ok(Vec<ProfileReport>)` - One report per harvested profile
/// * `Err(HarvestError)` - A session, storage or cancellation fault ended the harvest
///
/// # Example
///
/// ```no_run
/// use feed_harvest::config::load_config;
/// use feed_harvest::crawler::run_harvest;
/// use feed_harvest::url::Profile;
/// use std::path::Path;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let profiles = vec![Profile::new("joerogan")?];
/// run_harvest(config, profiles, CancellationToken::new()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(
    config: Config,
    profiles: Vec<Profile>,
    cancel: CancellationToken,
) -> Result<Vec<ProfileReport>> {
    let session = ChromeSession::launch(&config.session).await?;
    let mut harvester = Harvester::new(config, session, cancel)?;

    let result = harvester.harvest_all(&profiles).await;
    harvester.into_session().close().await;

    result
}
