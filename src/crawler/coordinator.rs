//! Harvest coordinator - per-profile crawl orchestration
//!
//! This module contains the profile crawl loop that ties every component
//! together:
//! - Opening the ledger under its single-writer lease
//! - Running discovery on the browser session
//! - Fetching and extracting posts through a bounded worker pool
//! - Appending completed downloads and flushing the ledger once per profile

use crate::config::Config;
use crate::crawler::discovery::{DiscoveryOptions, PostDiscovery};
use crate::crawler::fetcher::{build_http_client, download_media, fetch_post_page, FetchError};
use crate::extract::parse_post_page;
use crate::output::{log_report, ProfileReport};
use crate::session::BrowserSession;
use crate::state::PostOutcome;
use crate::storage::{
    open_ledger, CrawlLedger, CsvLedgerStore, DownloadRecord, LedgerLease, StorageError,
};
use crate::url::{PostReference, Profile};
use crate::{HarvestError, Result};
use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Where one post's media goes
#[derive(Debug, Clone)]
struct MediaDestination {
    /// Path without extension, relative to the target directory, `/`-separated
    relative_stem: String,

    /// Absolute path without extension
    absolute_stem: PathBuf,
}

/// Main harvest coordinator structure
///
/// Holds the ledger lease for its whole lifetime, so two harvesters can never
/// flush the same snapshot.
pub struct Harvester<S> {
    config: Config,
    discovery: PostDiscovery<S>,
    client: Client,
    ledger: CrawlLedger,
    store: CsvLedgerStore,
    _lease: LedgerLease,
    cancel: CancellationToken,
}

impl<S: BrowserSession> Harvester<S> {
    /// Creates a new harvester instance
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `session` - Browser session used for discovery, owned from here on
    /// * `cancel` - Token that aborts the crawl cooperatively
    ///
    /// # Returns
    ///
    /// * `Ok(Harvester)` - Target directory exists and the ledger is loaded and leased
    /// * `Err(HarvestError)` - Failed to initialize
    pub fn new(config: Config, session: S, cancel: CancellationToken) -> Result<Self> {
        std::fs::create_dir_all(&config.crawl.target_directory)?;

        let (ledger, store, lease) = open_ledger(&config.ledger_path())?;
        let client = build_http_client(&config.user_agent)?;
        let options = DiscoveryOptions::from_config(&config)?;
        let discovery = PostDiscovery::new(session, options, cancel.clone());

        Ok(Self {
            config,
            discovery,
            client,
            ledger,
            store,
            _lease: lease,
            cancel,
        })
    }

    pub fn ledger(&self) -> &CrawlLedger {
        &self.ledger
    }

    /// Releases the ledger lease and hands the session back
    pub fn into_session(self) -> S {
        self.discovery.into_session()
    }

    /// Crawls profiles in order, stopping at the first fatal error
    ///
    /// Each completed profile is flushed before the next one starts, so a
    /// failure only loses the profile in progress.
    pub async fn harvest_all(&mut self, profiles: &[Profile]) -> Result<Vec<ProfileReport>> {
        let mut reports = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let report = self.harvest_profile(profile).await?;
            log_report(&report);
            reports.push(report);
        }
        Ok(reports)
    }

    /// Crawls one profile and flushes the ledger
    ///
    /// Posts are fetched and extracted with at most `concurrent-fetches` in
    /// flight, but consumed in discovery order so ledger indices follow
    /// discovery order. Skipped posts never abort the crawl; a local media
    /// write failure does. A cancelled crawl returns
    /// [`HarvestError::Cancelled`] without flushing. On either failure the
    /// records appended for this profile are rolled back.
    pub async fn harvest_profile(&mut self, profile: &Profile) -> Result<ProfileReport> {
        let started_at = Utc::now();
        let target_dir = self.config.crawl.target_directory.clone();
        let namespaced = self.config.crawl.namespace_by_subdirectory;

        if namespaced {
            std::fs::create_dir_all(target_dir.join(profile.handle()))?;
        }

        let references = self
            .discovery
            .discover(profile, self.config.crawl.max_posts)
            .await?;

        let checkpoint = self.ledger.next_index();
        let mut report = ProfileReport::new(profile, started_at, references.len());
        tracing::info!(
            profile = %profile,
            posts = references.len(),
            workers = self.config.crawl.concurrent_fetches,
            "Fetching posts"
        );

        let client = &self.client;
        let cancel = &self.cancel;
        let mut outcomes = stream::iter(references.into_iter().map(|reference| {
            let destination = media_destination(&target_dir, profile, reference.ordinal, namespaced);
            process_post(client, reference, destination, cancel)
        }))
        .buffered(self.config.crawl.concurrent_fetches.max(1));

        let mut cancelled = false;
        while let Some(outcome) = outcomes.next().await {
            match &outcome {
                PostOutcome::Downloaded(record) => {
                    let index = self.ledger.append(record.clone());
                    tracing::debug!(profile = %profile, index, path = %record.path, "Recorded download");
                    report.record(&outcome, Some(index));
                }
                PostOutcome::StorageFailed { path, message } => {
                    self.ledger.rollback_to(checkpoint);
                    return Err(StorageError::MediaWrite {
                        path: path.clone(),
                        message: message.clone(),
                    }
                    .into());
                }
                PostOutcome::Cancelled => cancelled = true,
                skipped => report.record(skipped, None),
            }
        }
        drop(outcomes);

        if cancelled || self.cancel.is_cancelled() {
            self.ledger.rollback_to(checkpoint);
            tracing::warn!(profile = %profile, "Harvest cancelled; ledger not flushed");
            return Err(HarvestError::Cancelled);
        }

        self.ledger.flush(&self.store)?;
        report.finish(Utc::now(), self.ledger.len());

        Ok(report)
    }
}

fn media_destination(
    target_dir: &Path,
    profile: &Profile,
    ordinal: usize,
    namespaced: bool,
) -> MediaDestination {
    let handle = profile.handle();
    let file_stem = format!("{}_{}", handle, ordinal);

    if namespaced {
        MediaDestination {
            relative_stem: format!("{}/{}", handle, file_stem),
            absolute_stem: target_dir.join(handle).join(&file_stem),
        }
    } else {
        MediaDestination {
            relative_stem: file_stem.clone(),
            absolute_stem: target_dir.join(file_stem),
        }
    }
}

/// Fetches, extracts and downloads one post
///
/// Every failure is folded into the returned outcome; nothing here aborts
/// sibling posts.
async fn process_post(
    client: &Client,
    reference: PostReference,
    destination: MediaDestination,
    cancel: &CancellationToken,
) -> PostOutcome {
    if cancel.is_cancelled() {
        return PostOutcome::Cancelled;
    }

    tokio::select! {
        _ = cancel.cancelled() => PostOutcome::Cancelled,
        outcome = fetch_and_store(client, &reference, &destination) => outcome,
    }
}

async fn fetch_and_store(
    client: &Client,
    reference: &PostReference,
    destination: &MediaDestination,
) -> PostOutcome {
    let address = &reference.address;

    let html = match fetch_post_page(client, address).await {
        Ok(html) => html,
        Err(e) => {
            tracing::warn!(post = %address, "Skipping post, page fetch failed: {e}");
            return PostOutcome::PageFetchFailed(e.to_string());
        }
    };

    let page = parse_post_page(&html, address);
    let kind = page.metadata.media_kind;

    let Some(extension) = kind.extension() else {
        tracing::debug!(post = %address, "Skipping post with unknown media kind");
        return PostOutcome::UnknownKind;
    };

    let Some(media_url) = page.media_url else {
        tracing::warn!(post = %address, kind = %kind, "Skipping post without media URL");
        return PostOutcome::MissingMediaUrl;
    };

    match download_media(client, &media_url, &destination.absolute_stem, kind).await {
        Ok(_) => PostOutcome::Downloaded(DownloadRecord {
            path: format!("{}.{}", destination.relative_stem, extension),
            like_count: page.metadata.like_count,
            title: page.metadata.title,
        }),
        Err(FetchError::Write { path, source }) => PostOutcome::StorageFailed {
            path,
            message: source.to_string(),
        },
        Err(e) => {
            tracing::warn!(post = %address, media = %media_url, "Skipping post, media fetch failed: {e}");
            PostOutcome::MediaFetchFailed(e.to_string())
        }
    }
}
