//! Newsbot main entry point
//!
//! This is the command-line interface for the newsbot crawl-and-ingest run.

use chrono::Utc;
use clap::Parser;
use newsbot::config::{load_config_with_hash, Config, SourceRegistry};
use newsbot::delivery::{open_store, Deliverer};
use newsbot::fetch::{
    build_http_client, effective_user_agent, ChromeRenderer, ExtractorRegistry, FetcherSet,
    RenderedPageFetcher, SyndicationFetcher,
};
use newsbot::pipeline::{FreshnessFilter, SelectionPolicy};
use newsbot::runner::print_summary;
use newsbot::Runner;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Newsbot: crawls news sources and delivers a balanced batch
///
/// Newsbot reads syndication feeds and client-rendered news pages, keeps
/// recent items, caps how many each source contributes, and posts the batch
/// to an ingestion endpoint with a backing-store fallback.
#[derive(Parser, Debug)]
#[command(name = "newsbot")]
#[command(version = "1.0.0")]
#[command(about = "News crawler and ingestion pipeline", long_about = None)]
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

    /// Validate config and show the sources without fetching anything
    #[arg(long, conflicts_with = "no_deliver")]
    dry_run: bool,

    /// Fetch and select, print the batch as JSON lines, skip delivery
    #[arg(long, conflicts_with = "dry_run")]
    no_deliver: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // A missing .env file is fine
    dotenvy::dotenv().ok();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let base_dir = cli
        .config
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let registry = match SourceRegistry::from_config(&config, &base_dir) {
        Ok(registry) => registry,
        Err(e) => {
            tracing::error!("Failed to build source registry: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config, &registry);
        return Ok(());
    }

    handle_run(config, registry, &base_dir, cli.no_deliver).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("newsbot=info,warn"),
            1 => EnvFilter::new("newsbot=debug,info"),
            2 => EnvFilter::new("newsbot=trace,debug"),
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

/// Handles the --dry-run mode: shows the sources and settings
fn handle_dry_run(config: &Config, registry: &SourceRegistry) {
    println!("=== Newsbot Dry Run ===\n");

    println!("Crawler:");
    println!("  Lookback: {}h", config.crawler.lookback_hours);
    println!("  Source delay: {}ms", config.crawler.source_delay_ms);
    println!("  Feed timeout: {}s", config.crawler.feed_timeout_secs);
    println!("  User agent: {}", effective_user_agent(&config.crawler));

    println!("\nSelection:");
    println!("  Per-source quota: {}", config.selection.per_source_quota);
    println!("  Global cap: {}", config.selection.global_cap);

    println!("\nBrowser:");
    println!("  Headless: {}", config.browser.headless);
    println!(
        "  Navigation timeout: {}s",
        config.browser.navigation_timeout_secs
    );
    println!("  Max items per page: {}", config.browser.max_items_per_page);

    println!("\nDelivery:");
    println!("  Ingest URL: {}", config.delivery.ingest_url);
    match &config.fallback {
        Some(fallback) => println!("  Fallback: {:?} ({})", fallback.backend, fallback.table),
        None => println!("  Fallback: none"),
    }

    println!("\nSources ({}):", registry.len());
    for source in registry.iter() {
        println!("  - {} [{}] {}", source.name, source.kind, source.url);
        if let Some(rules) = &source.rules {
            for (field, selector) in rules.entries() {
                println!("    * {}: {}", field, selector);
            }
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Handles a full run, or a collect-only run with --no-deliver
async fn handle_run(
    config: Config,
    registry: SourceRegistry,
    base_dir: &Path,
    no_deliver: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let user_agent = effective_user_agent(&config.crawler).to_string();

    let syndication = SyndicationFetcher::from_config(&config.crawler)?;
    let renderer = Arc::new(ChromeRenderer::new(config.browser.clone(), user_agent.clone()));
    let rendered = RenderedPageFetcher::new(
        renderer,
        ExtractorRegistry::with_builtin(),
        config.browser.max_items_per_page,
    );
    let fetchers = FetcherSet::new(Box::new(syndication), Box::new(rendered));

    let mut runner = Runner::new(
        registry,
        fetchers,
        FreshnessFilter::from_hours(config.crawler.lookback_hours),
        SelectionPolicy::from_config(&config.selection),
    )
    .with_source_delay(Duration::from_millis(config.crawler.source_delay_ms));

    if no_deliver {
        let (batch, mut summary) = runner.collect(Utc::now()).await;
        for item in &batch {
            println!("{}", serde_json::to_string(item)?);
        }
        summary.delivery_skipped = true;
        print_summary(&summary);
        return Ok(());
    }

    let client = build_http_client(
        &user_agent,
        Duration::from_secs(config.delivery.timeout_secs),
    )?;

    let fallback = match &config.fallback {
        Some(fallback_config) => match open_store(fallback_config, client.clone(), base_dir) {
            Ok(store) => {
                tracing::info!("Fallback store: {}", store.name());
                Some(store)
            }
            Err(e) => {
                tracing::error!("Failed to open fallback store: {}", e);
                return Err(e.into());
            }
        },
        None => {
            tracing::warn!("No fallback store configured; failed deliveries will be dropped");
            None
        }
    };

    runner = runner.with_deliverer(Deliverer::from_config(&config.delivery, client, fallback));

    let summary = runner.run().await;
    print_summary(&summary);

    Ok(())
}
