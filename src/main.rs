//! Threadweave main entry point
//!
//! This is the command-line interface for the Threadweave crawl engine.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use threadweave::config::{load_config_with_hash, validate, BackendKind, Config, CrawlMode};
use threadweave::output::print_summary;
use threadweave::storage::{RecordStore, SqliteRecordStore};
use threadweave::Coordinator;
use tracing_subscriber::EnvFilter;

/// Threadweave: a concurrent crawl scheduler
///
/// Threadweave runs a fixed pool of workers over a shared work queue and
/// visited set, following same-domain links from the seed URLs and
/// optionally sampling visited pages for record extraction.
#[derive(Parser, Debug)]
#[command(name = "threadweave")]
#[command(version = "1.0.0")]
#[command(about = "A concurrent crawl scheduler", long_about = None)]
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

    /// Override the worker pool size
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Override the seed URLs (repeatable)
    #[arg(long = "seed", value_name = "URL")]
    seeds: Vec<String>,

    /// Clear the work queue and visited set before seeding
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show the number of stored records and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_overrides(&mut config, &cli).context("Invalid command-line override")?;

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("threadweave=info,warn"),
            1 => EnvFilter::new("threadweave=debug,info"),
            2 => EnvFilter::new("threadweave=trace,debug"),
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

/// Applies `--workers` / `--seed` and revalidates
fn apply_overrides(config: &mut Config, cli: &Cli) -> Result<(), threadweave::ConfigError> {
    if let Some(workers) = cli.workers {
        config.crawler.workers = workers;
    }
    if !cli.seeds.is_empty() {
        config.crawler.seeds = cli.seeds.clone();
    }
    validate(config)
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Threadweave Dry Run ===\n");

    let crawler = &config.crawler;
    println!("Crawler Configuration:");
    println!("  Workers: {}", crawler.workers);
    println!(
        "  Mode: {}",
        match crawler.mode {
            CrawlMode::Discover => "discover",
            CrawlMode::SampleExtract => "sample-extract",
        }
    );
    println!("  Domain: {}://{}", crawler.default_scheme, crawler.domain);
    if let Some(pattern) = &crawler.detail_path_pattern {
        println!("  Detail path pattern: {}", pattern);
    }
    println!("  Pop timeout: {}ms", crawler.pop_timeout_ms);
    println!(
        "  Completion polling: {}ms..{}ms, {} quiet checks",
        crawler.poll_interval_ms, crawler.max_poll_interval_ms, crawler.quiet_checks
    );

    println!("\nFetch:");
    println!("  Charsets: {}", config.fetch.charsets.join(", "));
    println!(
        "  User agent: {}",
        config.fetch.user_agent.as_deref().unwrap_or("(client default)")
    );
    println!("  Proxy: {}", config.fetch.proxy.as_deref().unwrap_or("(none)"));
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!(
        "  Retries: {} attempts, {}s base wait, on {:?} errors",
        config.retry.max_attempts, config.retry.base_wait_secs, config.retry.retry_on
    );

    println!("\nBackend:");
    match config.backend.kind {
        BackendKind::Local => println!("  In-process queue and visited set"),
        BackendKind::Redis => {
            println!("  Redis: {}", config.backend.redis_url);
            println!("  Queue key: {}", config.backend.queue_key);
            println!("  Visited key: {}", config.backend.visited_key);
        }
    }

    println!("\nOutput:");
    println!(
        "  Database: {}",
        config.output.database_path.as_deref().unwrap_or("(memory)")
    );

    println!("\nSeeds ({}):", crawler.seeds.len());
    for seed in &crawler.seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows the stored record count
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let path = config
        .output
        .database_path
        .as_deref()
        .context("No database-path configured; nothing to report")?;

    println!("Database: {}\n", path);
    let store = SqliteRecordStore::new(Path::new(path))
        .with_context(|| format!("Failed to open {}", path))?;
    println!("Stored records: {}", store.count()?);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, fresh: bool) -> anyhow::Result<()> {
    tracing::info!(
        "Crawling {} with {} workers, {} seeds",
        config.crawler.domain,
        config.crawler.workers,
        config.crawler.seeds.len()
    );

    let coordinator = Coordinator::new(config)
        .await
        .context("Failed to initialize crawl")?;

    if fresh {
        tracing::info!("Starting fresh crawl (clearing previous queue and visited set)");
        coordinator.reset().await?;
    }

    let shutdown = coordinator.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight work");
            shutdown.cancel();
        }
    });

    let summary = coordinator.run().await.context("Crawl failed")?;
    tracing::info!("Crawl finished in {}s", summary.duration_seconds());
    print_summary(&summary);

    Ok(())
}
