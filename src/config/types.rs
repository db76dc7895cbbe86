use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Feed-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default, rename = "profile")]
    pub profiles: Vec<ProfileEntry>,
}

impl Config {
    /// Full path of the ledger snapshot file
    pub fn ledger_path(&self) -> PathBuf {
        self.crawl.target_directory.join(&self.ledger.file_name)
    }
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Directory that receives media files and the ledger snapshot
    #[serde(rename = "target-directory")]
    pub target_directory: PathBuf,

    /// Store each profile's media under its own subdirectory
    #[serde(rename = "namespace-by-subdirectory", default = "default_true")]
    pub namespace_by_subdirectory: bool,

    /// Pause after each scroll so lazily loaded tiles can render (seconds)
    #[serde(
        rename = "settle-interval-seconds",
        default = "default_settle_interval"
    )]
    pub settle_interval_seconds: f64,

    /// Maximum number of posts gathered per profile
    #[serde(rename = "max-posts", default = "default_max_posts")]
    pub max_posts: usize,

    /// Consecutive unchanged scroll extents that end discovery
    #[serde(rename = "stall-threshold", default = "default_stall_threshold")]
    pub stall_threshold: u32,

    /// Number of posts fetched and extracted concurrently
    #[serde(rename = "concurrent-fetches", default = "default_concurrent_fetches")]
    pub concurrent_fetches: usize,
}

impl CrawlConfig {
    /// Settle interval as a [`Duration`]
    pub fn settle_interval(&self) -> Duration {
        Duration::from_secs_f64(self.settle_interval_seconds)
    }
}

/// Automated browser session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Base address of the social network; profiles live at `<base>/<handle>`
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Path prefix identifying post anchors in the rendered feed
    #[serde(rename = "post-path-prefix", default = "default_post_path_prefix")]
    pub post_path_prefix: String,

    #[serde(rename = "viewport-width", default = "default_viewport_width")]
    pub viewport_width: u32,

    #[serde(rename = "viewport-height", default = "default_viewport_height")]
    pub viewport_height: u32,

    /// Path to Chrome/Chromium executable (None for auto-detection)
    #[serde(rename = "chrome-path", default)]
    pub chrome_path: Option<String>,

    #[serde(default = "default_true")]
    pub headless: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            post_path_prefix: default_post_path_prefix(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            chrome_path: None,
            headless: true,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Ledger snapshot configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Snapshot file name, relative to the target directory
    #[serde(rename = "file-name", default = "default_ledger_file_name")]
    pub file_name: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            file_name: default_ledger_file_name(),
        }
    }
}

/// A profile to harvest
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileEntry {
    pub handle: String,
}

fn default_true() -> bool {
    true
}

fn default_settle_interval() -> f64 {
    1.0
}

fn default_max_posts() -> usize {
    100
}

fn default_stall_threshold() -> u32 {
    1
}

fn default_concurrent_fetches() -> usize {
    1
}

fn default_base_url() -> String {
    "https://www.instagram.com".to_string()
}

fn default_post_path_prefix() -> String {
    "/p/".to_string()
}

fn default_viewport_width() -> u32 {
    300
}

fn default_viewport_height() -> u32 {
    1000
}

fn default_ledger_file_name() -> String {
    "stats.csv".to_string()
}
