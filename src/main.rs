//! Feed-Harvest main entry point
//!
//! This is the command-line interface for the Feed-Harvest profile downloader.

use anyhow::{Context, Result};
use clap::Parser;
use feed_harvest::config::{load_config_with_hash, Config};
use feed_harvest::crawler::run_harvest;
use feed_harvest::url::Profile;
use feed_harvest::HarvestError;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Feed-Harvest: a scroll-driven profile feed downloader
///
/// Feed-Harvest scrolls public profile feeds in an automated browser,
/// downloads each post's image or video, and keeps a CSV ledger of the
/// downloaded files with their like counts and titles.
#[derive(Parser, Debug)]
#[command(name = "feed-harvest")]
#[command(version)]
#[command(about = "A scroll-driven profile feed downloader", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Profiles to harvest (overrides [[profile]] entries in the config)
    #[arg(value_name = "PROFILE")]
    profiles: Vec<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be harvested without harvesting
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the ledger and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let profiles = resolve_profiles(&config, &cli.profiles)?;

    if cli.dry_run {
        handle_dry_run(&config, &profiles);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_harvest(config, profiles).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("feed_harvest=info,warn"),
            1 => EnvFilter::new("feed_harvest=debug,info"),
            2 => EnvFilter::new("feed_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Command-line profiles win over the config file's `[[profile]]` entries
fn resolve_profiles(config: &Config, cli_profiles: &[String]) -> Result<Vec<Profile>> {
    let handles: Vec<&str> = if cli_profiles.is_empty() {
        config.profiles.iter().map(|p| p.handle.as_str()).collect()
    } else {
        cli_profiles.iter().map(String::as_str).collect()
    };

    handles
        .into_iter()
        .map(|handle| Profile::new(handle).map_err(anyhow::Error::from))
        .collect()
}

/// Handles the --dry-run mode: validates config and shows what would be harvested
fn handle_dry_run(config: &Config, profiles: &[Profile]) {
    println!("=== Feed-Harvest Dry Run ===\n");

    println!("Crawl Configuration:");
    println!(
        "  Target directory: {}",
        config.crawl.target_directory.display()
    );
    println!(
        "  Namespace by subdirectory: {}",
        config.crawl.namespace_by_subdirectory
    );
    println!(
        "  Settle interval: {}s",
        config.crawl.settle_interval_seconds
    );
    println!("  Max posts per profile: {}", config.crawl.max_posts);
    println!("  Stall threshold: {}", config.crawl.stall_threshold);
    println!("  Concurrent fetches: {}", config.crawl.concurrent_fetches);

    println!("\nSession:");
    println!("  Base URL: {}", config.session.base_url);
    println!("  Post path prefix: {}", config.session.post_path_prefix);
    println!(
        "  Viewport: {}x{}",
        config.session.viewport_width, config.session.viewport_height
    );
    println!("  Headless: {}", config.session.headless);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nLedger: {}", config.ledger_path().display());

    println!("\nProfiles ({}):", profiles.len());
    for profile in profiles {
        println!("  - {}", profile);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would harvest up to {} posts from {} profiles",
        config.crawl.max_posts * profiles.len(),
        profiles.len()
    );
}

/// Handles the --stats mode: shows statistics from the ledger
fn handle_stats(config: &Config) -> Result<()> {
    use feed_harvest::output::{load_statistics, print_statistics};
    use feed_harvest::storage::{CrawlLedger, CsvLedgerStore};

    let path = config.ledger_path();
    println!("Ledger: {}\n", path.display());

    let store = CsvLedgerStore::new(&path);
    let ledger = CrawlLedger::load(&store)
        .with_context(|| format!("Failed to read ledger {}", path.display()))?;

    let stats = load_statistics(&ledger);
    print_statistics(&stats);

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config, profiles: Vec<Profile>) -> Result<()> {
    if profiles.is_empty() {
        anyhow::bail!("No profiles to harvest; pass them on the command line or add [[profile]] entries");
    }

    tracing::info!(
        "Harvesting {} profiles into {}",
        profiles.len(),
        config.crawl.target_directory.display()
    );

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current step");
            signal_token.cancel();
        }
    });

    match run_harvest(config, profiles, cancel).await {
        Ok(reports) => {
            for report in &reports {
                println!("{}", report);
            }
            tracing::info!("Harvest completed successfully");
            Ok(())
        }
        Err(HarvestError::Cancelled) => {
            tracing::warn!("Harvest cancelled; the profile in progress was not recorded");
            Err(HarvestError::Cancelled.into())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
