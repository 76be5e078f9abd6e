//! Trawler main entry point
//!
//! This is the command-line interface for the Trawler topical crawler.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use trawler::config::{load_config_with_hash, Config, GeoProvider};
use trawler::crawler::run_crawl;
use trawler::output::{export_sets, print_run_stats, print_summary, CrawlSummary};
use trawler::storage::SqliteStorage;
use tracing_subscriber::EnvFilter;

/// Trawler: a bounded, polite, topical web crawler
///
/// Trawler crawls outward from seed URLs while respecting robots.txt,
/// records network metadata for every page, and reports the pages whose
/// address and content match the configured keywords.
#[derive(Parser, Debug)]
#[command(name = "trawler")]
#[command(version)]
#[command(about = "A bounded, polite, topical web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics of the latest run from the database and exit
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

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(&config, &config_hash).await?;
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
            0 => EnvFilter::new("trawler=info,warn"),
            1 => EnvFilter::new("trawler=debug,info"),
            2 => EnvFilter::new("trawler=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Trawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Limit: {}", config.crawler.limit);
    println!("  Max workers: {}", config.crawler.max_workers);
    println!("  Pacing delay: {}ms", config.crawler.pacing_delay_ms);
    println!("  Stuck timeout: {}ms", config.crawler.stuck_timeout_ms);
    println!("  Settle delay: {}ms", config.crawler.settle_delay_ms);
    println!("  Max URL length: {}", config.crawler.max_url_length);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Export directory: {}", config.output.export_dir);

    let geolocation = match config.geolocation.provider {
        GeoProvider::None => "disabled".to_string(),
        GeoProvider::IpApi => config.geolocation.endpoint.clone(),
    };
    println!("\nGeolocation: {}", geolocation);

    println!("\nSeeds ({}):", config.seeds.urls.len());
    for seed in &config.seeds.urls {
        println!("  - {}", seed);
    }

    println!("\nKeywords ({}):", config.filters.keywords.len());
    for keyword in &config.filters.keywords {
        println!("  - {}", keyword);
    }

    println!("\nIgnored ({}):", config.filters.ignore.len());
    for pattern in &config.filters.ignore {
        println!("  - {}", pattern);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start crawling with {} seed URLs",
        config.seeds.urls.len()
    );
}

/// Handles the --stats mode: shows statistics of the latest run
fn handle_stats(config: &Config) -> Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))
        .context("Failed to open database")?;

    match storage.get_latest_run()? {
        Some(run) => {
            let stats = storage.run_stats(run.id)?;
            print_run_stats(&stats);
        }
        None => println!("No crawl runs recorded yet"),
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, config_hash: &str) -> Result<()> {
    tracing::info!(
        "Seeds: {}, keywords: {}, ignored: {}",
        config.seeds.urls.len(),
        config.filters.keywords.len(),
        config.filters.ignore.len()
    );

    let report = run_crawl(config, config_hash).await.context("Crawl failed")?;
    tracing::info!(
        "Crawl finished ({}) in {:.1}s",
        report.stop_reason,
        report.elapsed.as_secs_f64()
    );

    let export_dir = Path::new(&config.output.export_dir);
    export_sets(&report.sets, export_dir)
        .with_context(|| format!("Failed to export results to {}", export_dir.display()))?;
    tracing::info!("Results exported to {}", export_dir.display());

    print_summary(&CrawlSummary::from_sets(&report.sets, report.abandoned()));

    Ok(())
}
