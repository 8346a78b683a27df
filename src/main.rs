//! Wiki-Movies main entry point
//!
//! This is the command-line interface for the Wiki-Movies catalogue crawler.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use wiki_movies::config::{load_config_with_hash, validate_seed_url, Config, OutputFormat};
use wiki_movies::crawler::run_crawl;
use wiki_movies::output::{load_run_summary, print_run_summary, print_statistics};

/// Wiki-Movies: a movie catalogue crawler
///
/// Wiki-Movies walks a wiki category of movie articles, extracts infobox
/// metadata and the IMDb rating of every movie, and writes one record per
/// movie as JSON Lines or into SQLite.
#[derive(Parser, Debug)]
#[command(name = "wiki-movies")]
#[command(version)]
#[command(about = "A polite movie catalogue crawler", long_about = None)]
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

    /// Category URL to start from, overriding the configuration
    #[arg(long, value_name = "URL")]
    seed: Option<String>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show the summary of the last run from the SQLite output and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(seed) = cli.seed {
        validate_seed_url(&seed).context("Invalid --seed")?;
        config.crawler.seed_url = seed;
    }

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("wiki_movies=info,warn"),
            1 => EnvFilter::new("wiki_movies=debug,info"),
            2 => EnvFilter::new("wiki_movies=trace,debug"),
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

/// Handles the --dry-run mode: prints the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Wiki-Movies Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Seed URL: {}", config.crawler.seed_url);
    println!(
        "  Max concurrent requests: {}",
        config.crawler.max_concurrent_requests
    );
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);
    println!(
        "  Retries: {} (after {}ms)",
        config.crawler.max_retries, config.crawler.retry_delay_ms
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Obey robots.txt: {}", config.crawler.obey_robots);
    match config.crawler.max_category_pages {
        0 => println!("  Category pages: unlimited"),
        n => println!("  Category pages: {}", n),
    }

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Format: {}", config.output.format);
    println!("  Path: {}", config.output.path);

    println!("\nInfobox labels:");
    println!("  Genre: {}", config.spider.genre_marker);
    println!("  Director: {}", config.spider.director_marker);
    println!("  Countries: {}", config.spider.countries_marker);
    println!("  Year: {}", config.spider.year_marker);
    println!("  Rating link: {}", config.spider.rating_authority);
    println!("  Next page link: {}", config.spider.next_page_label);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows the last run stored in SQLite output
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    if config.output.format != OutputFormat::Sqlite {
        bail!(
            "--stats needs SQLite output, but the configured format is {}",
            config.output.format
        );
    }

    println!("Database: {}\n", config.output.path);

    match load_run_summary(Path::new(&config.output.path))? {
        Some(summary) => print_run_summary(&summary),
        None => println!("No runs recorded yet"),
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: &str) -> anyhow::Result<()> {
    let stats = run_crawl(config, config_hash).await.context("Crawl failed")?;

    println!();
    print_statistics(&stats);

    Ok(())
}
