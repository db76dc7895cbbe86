//! Integration tests for the harvester
//!
//! These tests use wiremock to serve post pages and media, and a scripted
//! browser session to stand in for the rendered feed, and run full profile
//! harvests end-to-end.

use async_trait::async_trait;
use feed_harvest::config::{
    Config, CrawlConfig, LedgerConfig, SessionConfig, UserAgentConfig,
};
use feed_harvest::crawler::Harvester;
use feed_harvest::session::{BrowserSession, SessionResult};
use feed_harvest::storage::{CrawlLedger, CsvLedgerStore, LedgerStore, StorageError};
use feed_harvest::{DownloadRecord, HarvestError, Profile};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Browser session that renders a fixed feed per profile path
///
/// Each feed is a list of `(scroll extent, post hrefs)` stages; scrolling
/// advances one stage and sticks on the last, so the extent stops growing.
struct ScriptedFeed {
    feeds: HashMap<String, Vec<(u64, Vec<String>)>>,
    current: String,
    position: usize,
}

impl ScriptedFeed {
    fn new() -> Self {
        Self {
            feeds: HashMap::new(),
            current: String::new(),
            position: 0,
        }
    }

    fn with_feed(mut self, profile: &str, stages: Vec<(u64, Vec<&str>)>) -> Self {
        let stages = stages
            .into_iter()
            .map(|(extent, hrefs)| (extent, hrefs.into_iter().map(String::from).collect()))
            .collect();
        self.feeds.insert(format!("/{}", profile), stages);
        self
    }

    fn stage(&self) -> Option<&(u64, Vec<String>)> {
        self.feeds
            .get(&self.current)
            .and_then(|stages| stages.get(self.position))
    }
}

#[async_trait]
impl BrowserSession for ScriptedFeed {
    async fn navigate(&mut self, url: &Url) -> SessionResult<()> {
        self.current = url.path().to_string();
        self.position = 0;
        Ok(())
    }

    async fn set_viewport(&mut self, _width: u32, _height: u32) -> SessionResult<()> {
        Ok(())
    }

    async fn rendered_markup(&mut self) -> SessionResult<String> {
        let anchors: String = self
            .stage()
            .map(|(_, hrefs)| {
                hrefs
                    .iter()
                    .map(|href| format!(r#"<article><a href="{}">post</a></article>"#, href))
                    .collect()
            })
            .unwrap_or_default();
        Ok(format!("<html><body>{}</body></html>", anchors))
    }

    async fn scroll_to_bottom(&mut self) -> SessionResult<()> {
        let stages = self.feeds.get(&self.current).map(Vec::len).unwrap_or(0);
        if self.position + 1 < stages {
            self.position += 1;
        }
        Ok(())
    }

    async fn scroll_extent(&mut self) -> SessionResult<u64> {
        Ok(self.stage().map(|(extent, _)| *extent).unwrap_or(0))
    }
}

/// Creates a test configuration pointing the session at the mock server
fn create_test_config(base_url: &str, target: &Path, namespaced: bool) -> Config {
    Config {
        crawl: CrawlConfig {
            target_directory: target.to_path_buf(),
            namespace_by_subdirectory: namespaced,
            settle_interval_seconds: 0.0,
            max_posts: 100,
            stall_threshold: 1,
            concurrent_fetches: 1,
        },
        session: SessionConfig {
            base_url: base_url.to_string(),
            ..SessionConfig::default()
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        ledger: LedgerConfig::default(),
        profiles: vec![],
    }
}

fn post_page(medium: &str, media_path: &str, likes: &str, title: &str) -> String {
    format!(
        r#"<html><head>
<title>{title}</title>
<meta name="medium" content="{medium}">
<meta content="{likes} Likes, 12 Comments - someone on Instagram" name="description">
<meta property="og:image" content="{media_path}">
<meta property="og:video" content="{media_path}">
</head><body><p>post</p></body></html>"#
    )
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_media(server: &MockServer, route: &str, bytes: &[u8]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes.to_vec()))
        .mount(server)
        .await;
}

fn load_snapshot(target: &Path) -> Vec<DownloadRecord> {
    CsvLedgerStore::new(target.join("stats.csv")).load().unwrap()
}

async fn harvest(
    config: Config,
    session: ScriptedFeed,
    profile: &str,
) -> Result<Vec<DownloadRecord>, HarvestError> {
    let mut harvester = Harvester::new(config, session, CancellationToken::new())?;
    harvester
        .harvest_profile(&Profile::new(profile).unwrap())
        .await?;
    Ok(harvester.ledger().records().cloned().collect())
}

#[tokio::test]
async fn test_two_images_and_one_unknown_post() {
    let server = MockServer::start().await;
    mount_page(&server, "/p/one/", post_page("image", "/m/one.jpg", "2.1k", "One")).await;
    mount_page(&server, "/p/two/", post_page("carousel", "/m/two.jpg", "9", "Two")).await;
    mount_page(&server, "/p/three/", post_page("image", "/m/three.jpg", "1,204", "Three")).await;
    mount_media(&server, "/m/one.jpg", b"image-one").await;
    mount_media(&server, "/m/three.jpg", b"image-three").await;

    let dir = TempDir::new().unwrap();
    let session = ScriptedFeed::new().with_feed(
        "joe",
        vec![
            (1000, vec!["/p/one/", "/p/two/"]),
            (2000, vec!["/p/two/", "/p/three/"]),
        ],
    );

    let records = harvest(create_test_config(&server.uri(), dir.path(), true), session, "joe")
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].path, "joe/joe_0.jpg");
    assert_eq!(records[0].like_count, Some(2100));
    assert_eq!(records[0].title.as_deref(), Some("One"));
    assert_eq!(records[1].path, "joe/joe_2.jpg");
    assert_eq!(records[1].like_count, Some(1204));

    assert_eq!(
        std::fs::read(dir.path().join("joe/joe_0.jpg")).unwrap(),
        b"image-one"
    );
    assert_eq!(
        std::fs::read(dir.path().join("joe/joe_2.jpg")).unwrap(),
        b"image-three"
    );
    assert!(!dir.path().join("joe/joe_1.jpg").exists());
    assert!(!dir.path().join("joe/joe_1.mp4").exists());

    // The snapshot matches the in-memory ledger
    assert_eq!(load_snapshot(dir.path()), records);
}

#[tokio::test]
async fn test_rerun_appends_duplicate_records() {
    let server = MockServer::start().await;
    mount_page(&server, "/p/a/", post_page("image", "/m/a.jpg", "5", "A")).await;
    mount_page(&server, "/p/b/", post_page("video", "/m/b.mp4", "1.2m", "B")).await;
    mount_media(&server, "/m/a.jpg", b"a").await;
    mount_media(&server, "/m/b.mp4", b"b").await;

    let dir = TempDir::new().unwrap();
    let feed = || ScriptedFeed::new().with_feed("joe", vec![(500, vec!["/p/a/", "/p/b/"])]);

    harvest(create_test_config(&server.uri(), dir.path(), true), feed(), "joe")
        .await
        .unwrap();
    let records = harvest(create_test_config(&server.uri(), dir.path(), true), feed(), "joe")
        .await
        .unwrap();

    let paths: Vec<&str> = records.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(
        paths,
        vec!["joe/joe_0.jpg", "joe/joe_1.mp4", "joe/joe_0.jpg", "joe/joe_1.mp4"]
    );
    assert_eq!(records[1].like_count, Some(1_200_000));

    let store = CsvLedgerStore::new(dir.path().join("stats.csv"));
    let ledger = CrawlLedger::load(&store).unwrap();
    let indices: Vec<u64> = ledger.entries().iter().map(|e| e.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn test_failed_fetches_are_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p/broken/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_page(&server, "/p/nomedia/", post_page("image", "/m/gone.jpg", "3", "Gone")).await;
    Mock::given(method("GET"))
        .and(path("/m/gone.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_page(&server, "/p/fine/", post_page("image", "/m/fine.jpg", "7", "Fine")).await;
    mount_media(&server, "/m/fine.jpg", b"fine").await;

    let dir = TempDir::new().unwrap();
    let session = ScriptedFeed::new().with_feed(
        "joe",
        vec![(800, vec!["/p/broken/", "/p/nomedia/", "/p/fine/"])],
    );

    let records = harvest(create_test_config(&server.uri(), dir.path(), true), session, "joe")
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].path, "joe/joe_2.jpg");
    assert!(dir.path().join("joe/joe_2.jpg").exists());
}

#[tokio::test]
async fn test_flat_layout_without_subdirectory() {
    let server = MockServer::start().await;
    mount_page(&server, "/p/x/", post_page("video", "/m/x.mp4", "abc", "Untitled\nclip")).await;
    mount_media(&server, "/m/x.mp4", b"video").await;

    let dir = TempDir::new().unwrap();
    let session = ScriptedFeed::new().with_feed("ann", vec![(300, vec!["/p/x/"])]);

    let records = harvest(create_test_config(&server.uri(), dir.path(), false), session, "ann")
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].path, "ann_0.mp4");
    // An unparsable like token leaves only the count absent
    assert_eq!(records[0].like_count, None);
    assert_eq!(records[0].title.as_deref(), Some("Untitledclip"));
    assert!(dir.path().join("ann_0.mp4").exists());
    assert!(!dir.path().join("ann").exists());
}

#[tokio::test]
async fn test_concurrent_fetches_keep_discovery_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p/slow/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(post_page("image", "/m/slow.jpg", "1", "Slow"))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/p/fast/", post_page("image", "/m/fast.jpg", "2", "Fast")).await;
    mount_media(&server, "/m/slow.jpg", b"slow").await;
    mount_media(&server, "/m/fast.jpg", b"fast").await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server.uri(), dir.path(), true);
    config.crawl.concurrent_fetches = 4;
    let session = ScriptedFeed::new().with_feed("joe", vec![(100, vec!["/p/slow/", "/p/fast/"])]);

    let records = harvest(config, session, "joe").await.unwrap();

    let titles: Vec<&str> = records.iter().filter_map(|r| r.title.as_deref()).collect();
    assert_eq!(titles, vec!["Slow", "Fast"]);
}

#[tokio::test]
async fn test_max_posts_limits_downloads() {
    let server = MockServer::start().await;
    mount_page(&server, "/p/1/", post_page("image", "/m/1.jpg", "1", "1")).await;
    mount_media(&server, "/m/1.jpg", b"1").await;
    Mock::given(method("GET"))
        .and(path("/p/2/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server.uri(), dir.path(), true);
    config.crawl.max_posts = 1;
    let session = ScriptedFeed::new().with_feed("joe", vec![(100, vec!["/p/1/", "/p/2/"])]);

    let records = harvest(config, session, "joe").await.unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_multiple_profiles_share_one_ledger() {
    let server = MockServer::start().await;
    mount_page(&server, "/p/ja/", post_page("image", "/m/ja.jpg", "10", "Joe")).await;
    mount_page(&server, "/p/ba/", post_page("image", "/m/ba.jpg", "20", "Bert")).await;
    mount_media(&server, "/m/ja.jpg", b"j").await;
    mount_media(&server, "/m/ba.jpg", b"b").await;

    let dir = TempDir::new().unwrap();
    let session = ScriptedFeed::new()
        .with_feed("joe", vec![(100, vec!["/p/ja/"])])
        .with_feed("bert", vec![(100, vec!["/p/ba/"])]);

    let mut harvester = Harvester::new(
        create_test_config(&server.uri(), dir.path(), true),
        session,
        CancellationToken::new(),
    )
    .unwrap();

    let profiles = vec![Profile::new("joe").unwrap(), Profile::new("bert").unwrap()];
    let reports = harvester.harvest_all(&profiles).await.unwrap();
    drop(harvester);

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[1].first_index, Some(1));

    let paths: Vec<String> = load_snapshot(dir.path())
        .into_iter()
        .map(|r| r.path)
        .collect();
    assert_eq!(paths, vec!["joe/joe_0.jpg", "bert/bert_0.jpg"]);
    assert!(!dir.path().join("stats.csv.lock").exists());
}

#[tokio::test]
async fn test_empty_feed_flushes_header_only_snapshot() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let session = ScriptedFeed::new().with_feed("nobody", vec![(100, vec![])]);

    let records = harvest(create_test_config(&server.uri(), dir.path(), true), session, "nobody")
        .await
        .unwrap();

    assert!(records.is_empty());
    assert_eq!(
        std::fs::read_to_string(dir.path().join("stats.csv")).unwrap(),
        "path,likes,title\n"
    );
}

#[tokio::test]
async fn test_media_write_failure_keeps_previous_snapshot() {
    let server = MockServer::start().await;
    mount_page(&server, "/p/a/", post_page("image", "/m/a.jpg", "5", "A")).await;
    mount_page(&server, "/p/b/", post_page("image", "/m/b.jpg", "6", "B")).await;
    mount_page(&server, "/p/c/", post_page("video", "/m/c.mp4", "7", "C")).await;
    mount_media(&server, "/m/a.jpg", b"a").await;
    mount_media(&server, "/m/b.jpg", b"b").await;
    mount_media(&server, "/m/c.mp4", b"c").await;

    let dir = TempDir::new().unwrap();
    let snapshot = dir.path().join("stats.csv");
    CsvLedgerStore::new(&snapshot)
        .flush(&[DownloadRecord {
            path: "old/old_0.jpg".to_string(),
            like_count: Some(1),
            title: Some("Old".to_string()),
        }])
        .unwrap();
    let before = std::fs::read(&snapshot).unwrap();

    // A directory where the second media file should go makes its creation fail
    std::fs::create_dir_all(dir.path().join("joe/joe_1.jpg")).unwrap();

    let session = ScriptedFeed::new()
        .with_feed("joe", vec![(100, vec!["/p/a/", "/p/b/"])])
        .with_feed("ann", vec![(100, vec!["/p/c/"])]);
    let mut harvester = Harvester::new(
        create_test_config(&server.uri(), dir.path(), true),
        session,
        CancellationToken::new(),
    )
    .unwrap();

    let result = harvester
        .harvest_profile(&Profile::new("joe").unwrap())
        .await;

    assert!(matches!(
        result,
        Err(HarvestError::Storage(StorageError::MediaWrite { .. }))
    ));
    assert_eq!(std::fs::read(&snapshot).unwrap(), before);
    assert!(dir.path().join("joe/joe_0.jpg").exists());
    assert_eq!(harvester.ledger().len(), 1);

    // The failed profile's records never reach a later flush
    harvester
        .harvest_profile(&Profile::new("ann").unwrap())
        .await
        .unwrap();

    let paths: Vec<String> = load_snapshot(dir.path())
        .into_iter()
        .map(|r| r.path)
        .collect();
    assert_eq!(paths, vec!["old/old_0.jpg", "ann/ann_0.mp4"]);
}

#[tokio::test]
async fn test_cancel_between_posts_discards_profile() {
    let server = MockServer::start().await;
    mount_page(&server, "/p/a/", post_page("image", "/m/a.jpg", "5", "A")).await;
    Mock::given(method("GET"))
        .and(path("/p/b/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(post_page("image", "/m/b.jpg", "6", "B"))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;
    mount_media(&server, "/m/a.jpg", b"a").await;
    mount_media(&server, "/m/b.jpg", b"b").await;

    let dir = TempDir::new().unwrap();
    let cancel = CancellationToken::new();
    let session = ScriptedFeed::new().with_feed("joe", vec![(100, vec!["/p/a/", "/p/b/"])]);
    let mut harvester = Harvester::new(
        create_test_config(&server.uri(), dir.path(), true),
        session,
        cancel.clone(),
    )
    .unwrap();

    // Cancel once the first post's media has landed, while the second page is pending
    let first_media = dir.path().join("joe/joe_0.jpg");
    let trigger = cancel.clone();
    tokio::spawn(async move {
        while !first_media.exists() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        trigger.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        harvester.harvest_profile(&Profile::new("joe").unwrap()),
    )
    .await
    .unwrap();

    assert!(matches!(result, Err(HarvestError::Cancelled)));
    assert!(!dir.path().join("stats.csv").exists());
    assert!(!dir.path().join("joe/joe_1.jpg").exists());
    assert!(harvester.ledger().is_empty());
}

