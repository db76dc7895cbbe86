//! Scroll-driven post discovery
//!
//! Discovery navigates the browser session to a profile feed and keeps
//! scrolling until the feed stops growing:
//!
//! 1. Read the scroll extent
//! 2. Harvest post anchors from the rendered markup, keeping first-seen order
//! 3. Scroll to the bottom and wait for the settle interval
//! 4. Re-read the scroll extent; an unchanged extent counts towards a stall
//!
//! The session is owned by the engine for its whole lifetime, so navigation
//! and scrolling are never interleaved.

use crate::config::Config;
use crate::extract::extract_post_links;
use crate::session::BrowserSession;
use crate::state::DiscoveryPhase;
use crate::url::{parse_base_url, profile_url, PostReference, Profile};
use crate::{HarvestError, Result};
use std::collections::HashSet;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Tunables of a discovery run
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Base address of the network; profiles and posts are resolved against it
    pub base_url: Url,
    pub post_path_prefix: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub settle_interval: Duration,
    pub stall_threshold: u32,
}

impl DiscoveryOptions {
    /// Builds discovery options from a validated configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(&config.session.base_url)?,
            post_path_prefix: config.session.post_path_prefix.clone(),
            viewport_width: config.session.viewport_width,
            viewport_height: config.session.viewport_height,
            settle_interval: config.crawl.settle_interval(),
            stall_threshold: config.crawl.stall_threshold.max(1),
        })
    }
}

/// Post discovery engine over an exclusively owned browser session
pub struct PostDiscovery<S> {
    session: S,
    options: DiscoveryOptions,
    cancel: CancellationToken,
}

impl<S: BrowserSession> PostDiscovery<S> {
    pub fn new(session: S, options: DiscoveryOptions, cancel: CancellationToken) -> Self {
        Self {
            session,
            options,
            cancel,
        }
    }

    /// Gives the session back, e.g. to close the browser
    pub fn into_session(self) -> S {
        self.session
    }

    /// Discovers up to `max_posts` post references of `profile`
    ///
    /// A feed without posts yields an empty list. Session failures end the
    /// crawl and are returned as [`HarvestError::Session`]; cancellation is
    /// checked before every scroll pass and during the settle wait.
    ///
    /// # Returns
    ///
    /// References in first-seen order, numbered from 0, with absolute addresses
    pub async fn discover(
        &mut self,
        profile: &Profile,
        max_posts: usize,
    ) -> Result<Vec<PostReference>> {
        let mut phase = DiscoveryPhase::Priming;
        let feed_url = profile_url(&self.options.base_url, profile);

        tracing::info!(profile = %profile, url = %feed_url, phase = %phase, "Opening profile feed");
        self.session.navigate(&feed_url).await?;
        self.session
            .set_viewport(self.options.viewport_width, self.options.viewport_height)
            .await?;

        let mut seen: HashSet<Url> = HashSet::new();
        let mut references: Vec<PostReference> = Vec::new();
        let mut unchanged_passes: u32 = 0;
        let mut pass: u32 = 0;
        phase = DiscoveryPhase::Scrolling;

        while references.len() < max_posts {
            if self.cancel.is_cancelled() {
                return Err(HarvestError::Cancelled);
            }
            pass += 1;

            let extent_before = self.session.scroll_extent().await?;
            let markup = self.session.rendered_markup().await?;
            let found = self.harvest(&markup, max_posts, &mut seen, &mut references);

            tracing::debug!(
                profile = %profile,
                pass,
                new_posts = found,
                total = references.len(),
                extent = extent_before,
                "Harvested scroll pass"
            );

            if references.len() >= max_posts {
                break;
            }

            self.session.scroll_to_bottom().await?;
            tokio::select! {
                _ = self.cancel.cancelled() => return Err(HarvestError::Cancelled),
                _ = tokio::time::sleep(self.options.settle_interval) => {}
            }

            let extent_after = self.session.scroll_extent().await?;
            if extent_after == extent_before {
                unchanged_passes += 1;
            } else {
                unchanged_passes = 0;
            }

            phase = phase.after_pass(unchanged_passes, self.options.stall_threshold);
            if phase.is_terminal() {
                break;
            }
        }

        references.truncate(max_posts);
        tracing::info!(
            profile = %profile,
            posts = references.len(),
            passes = pass,
            phase = %phase,
            "Discovery finished"
        );

        Ok(references)
    }

    /// Adds unseen addresses from one pass; returns how many were new
    fn harvest(
        &self,
        markup: &str,
        max_posts: usize,
        seen: &mut HashSet<Url>,
        references: &mut Vec<PostReference>,
    ) -> usize {
        let mut found = 0;
        let links = extract_post_links(
            markup,
            &self.options.base_url,
            &self.options.post_path_prefix,
        );

        for address in links {
            if references.len() >= max_posts {
                break;
            }
            if seen.insert(address.clone()) {
                references.push(PostReference {
                    address,
                    ordinal: references.len(),
                });
                found += 1;
            }
        }

        found
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::session::{SessionError, SessionResult};
    use async_trait::async_trait;

    /// Browser session that replays a fixed sequence of feed states
    ///
    /// Each stage is `(scroll extent, post hrefs rendered)`. Scrolling moves to
    /// the next stage and stays on the last one, so the extent stops growing.
    pub(crate) struct ScriptedSession {
        stages: Vec<(u64, Vec<String>)>,
        position: usize,
        pub navigated: Vec<Url>,
        pub viewport: Option<(u32, u32)>,
        pub scrolls: usize,
        fail_markup: bool,
    }

    impl ScriptedSession {
        pub(crate) fn new(stages: Vec<(u64, Vec<&str>)>) -> Self {
            Self {
                stages: stages
                    .into_iter()
                    .map(|(extent, hrefs)| (extent, hrefs.into_iter().map(String::from).collect()))
                    .collect(),
                position: 0,
                navigated: Vec::new(),
                viewport: None,
                scrolls: 0,
                fail_markup: false,
            }
        }

        pub(crate) fn failing() -> Self {
            let mut session = Self::new(vec![(100, vec![])]);
            session.fail_markup = true;
            session
        }
    }

    #[async_trait]
    impl BrowserSession for ScriptedSession {
        async fn navigate(&mut self, url: &Url) -> SessionResult<()> {
            self.navigated.push(url.clone());
            Ok(())
        }

        async fn set_viewport(&mut self, width: u32, height: u32) -> SessionResult<()> {
            self.viewport = Some((width, height));
            Ok(())
        }

        async fn rendered_markup(&mut self) -> SessionResult<String> {
            if self.fail_markup {
                return Err(SessionError::Markup("target closed".to_string()));
            }
            let anchors: String = self
                .stages
                .get(self.position)
                .map(|(_, hrefs)| {
                    hrefs
                        .iter()
                        .map(|href| format!("<a href=\"{}\"><img></a>", href))
                        .collect()
                })
                .unwrap_or_default();
            Ok(format!("<html><body><main>{}</main></body></html>", anchors))
        }

        async fn scroll_to_bottom(&mut self) -> SessionResult<()> {
            self.scrolls += 1;
            if self.position + 1 < self.stages.len() {
                self.position += 1;
            }
            Ok(())
        }

        async fn scroll_extent(&mut self) -> SessionResult<u64> {
            Ok(self.stages.get(self.position).map(|(e, _)| *e).unwrap_or(0))
        }
    }

    fn options() -> DiscoveryOptions {
        DiscoveryOptions {
            base_url: Url::parse("https://feed.example").unwrap(),
            post_path_prefix: "/p/".to_string(),
            viewport_width: 300,
            viewport_height: 1000,
            settle_interval: Duration::ZERO,
            stall_threshold: 1,
        }
    }

    /// Feed rendering R1..R5 over three scroll stages, then stalling
    pub(crate) fn five_post_feed() -> ScriptedSession {
        ScriptedSession::new(vec![
            (1000, vec!["/p/R1/", "/p/R2/"]),
            (2000, vec!["/p/R2/", "/p/R3/", "/p/R4/"]),
            (3000, vec!["/p/R4/", "/p/R5/"]),
        ])
    }

    fn paths(references: &[PostReference]) -> Vec<String> {
        references
            .iter()
            .map(|r| r.address.path().to_string())
            .collect()
    }

    async fn discover(
        session: ScriptedSession,
        max_posts: usize,
    ) -> (Vec<PostReference>, ScriptedSession) {
        let mut engine = PostDiscovery::new(session, options(), CancellationToken::new());
        let profile = Profile::new("someone").unwrap();
        let references = engine.discover(&profile, max_posts).await.unwrap();
        (references, engine.into_session())
    }

    #[tokio::test]
    async fn test_max_posts_truncates_in_first_seen_order() {
        let (references, _) = discover(five_post_feed(), 3).await;
        assert_eq!(paths(&references), vec!["/p/R1/", "/p/R2/", "/p/R3/"]);
    }

    #[tokio::test]
    async fn test_discovery_ends_on_stall() {
        let (references, session) = discover(five_post_feed(), 10).await;

        assert_eq!(
            paths(&references),
            vec!["/p/R1/", "/p/R2/", "/p/R3/", "/p/R4/", "/p/R5/"]
        );
        // Two growing scrolls plus the one that found no growth
        assert_eq!(session.scrolls, 3);
    }

    #[tokio::test]
    async fn test_duplicates_keep_first_ordinal() {
        let (references, _) = discover(five_post_feed(), 10).await;

        let ordinals: Vec<usize> = references.iter().map(|r| r.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3, 4]);
        assert_eq!(references[1].address.path(), "/p/R2/");
    }

    #[tokio::test]
    async fn test_addresses_are_absolute() {
        let (references, _) = discover(five_post_feed(), 1).await;
        assert_eq!(references[0].address.as_str(), "https://feed.example/p/R1/");
    }

    #[tokio::test]
    async fn test_primes_session_with_profile_and_viewport() {
        let (_, session) = discover(five_post_feed(), 1).await;

        assert_eq!(session.navigated[0].as_str(), "https://feed.example/someone");
        assert_eq!(session.viewport, Some((300, 1000)));
    }

    #[tokio::test]
    async fn test_empty_feed_is_not_an_error() {
        let (references, session) =
            discover(ScriptedSession::new(vec![(800, vec![])]), 10).await;

        assert!(references.is_empty());
        assert_eq!(session.scrolls, 1);
    }

    #[tokio::test]
    async fn test_stall_threshold_tolerates_slow_loads() {
        let mut opts = options();
        opts.stall_threshold = 3;
        let mut engine = PostDiscovery::new(
            ScriptedSession::new(vec![(500, vec!["/p/A/"])]),
            opts,
            CancellationToken::new(),
        );

        let profile = Profile::new("someone").unwrap();
        let references = engine.discover(&profile, 10).await.unwrap();

        assert_eq!(references.len(), 1);
        assert_eq!(engine.into_session().scrolls, 3);
    }

    #[tokio::test]
    async fn test_session_failure_propagates() {
        let mut engine =
            PostDiscovery::new(ScriptedSession::failing(), options(), CancellationToken::new());
        let profile = Profile::new("someone").unwrap();

        let result = engine.discover(&profile, 10).await;
        assert!(matches!(result, Err(HarvestError::Session(_))));
    }

    #[tokio::test]
    async fn test_cancelled_before_first_pass() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut engine = PostDiscovery::new(five_post_feed(), options(), cancel);
        let profile = Profile::new("someone").unwrap();

        let result = engine.discover(&profile, 10).await;
        assert!(matches!(result, Err(HarvestError::Cancelled)));
    }
}
