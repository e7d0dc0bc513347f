//! Sitelens main entry point
//!
//! Command-line scan runner: submits one or more website scans to the job
//! queue, drives the worker pipeline to completion, and prints outcomes.

use anyhow::{bail, Context};
use clap::Parser;
use sitelens::analyzer::{AnalyzerRegistry, FontAnalyzer, MetaAnalyzer};
use sitelens::config::{load_config_with_hash, Config};
use sitelens::crawler::{build_http_client, SiteCrawler};
use sitelens::job::{JobState, ScanOptions, ScanPayload};
use sitelens::queue::ScanQueue;
use sitelens::storage::SqliteStore;
use sitelens::worker::{spawn_workers, LogReporter, WorkerContext};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Sitelens: a website analysis pipeline
///
/// Sitelens crawls a bounded set of pages from each target URL, runs the
/// selected analyzers over every page, and stores the aggregated report.
#[derive(Parser, Debug)]
#[command(name = "sitelens")]
#[command(version = "1.0.0")]
#[command(about = "Website analysis scan runner", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Target URL to scan (repeatable)
    #[arg(long = "url", value_name = "URL")]
    urls: Vec<String>,

    /// Comma-separated analyzer names (defaults to all registered)
    #[arg(long)]
    analyzers: Option<String>,

    /// Maximum number of pages to crawl per scan
    #[arg(long)]
    max_pages: Option<u32>,

    /// Maximum crawl depth from the target URL
    #[arg(long)]
    max_depth: Option<u32>,

    /// Skip sitemap.xml seeding
    #[arg(long)]
    no_sitemap: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would run without scanning
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) =
        load_config_with_hash(&cli.config).context("Failed to load configuration")?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    if cli.urls.is_empty() {
        bail!("at least one --url is required (or use --dry-run)");
    }

    handle_scan(config, cli).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitelens=info,warn"),
            1 => EnvFilter::new("sitelens=debug,info"),
            2 => EnvFilter::new("sitelens=trace,debug"),
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

/// Handles --dry-run: validates config and shows what would run
fn handle_dry_run(config: &Config) {
    println!("=== Sitelens Dry Run ===\n");

    println!("Queue Configuration:");
    println!("  Capacity: {}", config.queue.capacity);
    println!("  Max attempts: {}", config.queue.max_attempts);
    println!("  Retry jitter: {}", config.queue.retry_jitter);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\n✓ Configuration is valid");
}

/// Submits the requested scans and drives the queue until every job is
/// terminal
async fn handle_scan(config: Config, cli: Cli) -> anyhow::Result<()> {
    let store = Arc::new(
        SqliteStore::new(Path::new(&config.output.database_path))
            .context("Failed to open scan database")?,
    );

    let client = build_http_client(&config.user_agent.header_value())
        .context("Failed to build HTTP client")?;

    let mut registry = AnalyzerRegistry::new();
    registry.register(Arc::new(FontAnalyzer::new(client.clone())));
    registry.register(Arc::new(MetaAnalyzer::new(client.clone())));
    let registry = Arc::new(registry);

    // Analyzer names are part of submission validation: unknown names are
    // rejected before anything is enqueued
    let analyzers = match &cli.analyzers {
        Some(csv) => {
            let names: Vec<String> = csv
                .split(',')
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect();
            for name in &names {
                if !registry.contains(name) {
                    bail!(
                        "unknown analyzer '{}' (available: {})",
                        name,
                        registry.names().join(", ")
                    );
                }
            }
            Some(names)
        }
        None => None,
    };

    let mut options = ScanOptions {
        analyzers,
        ..Default::default()
    };
    if let Some(max_pages) = cli.max_pages {
        options.max_pages = max_pages;
    }
    if let Some(max_depth) = cli.max_depth {
        options.max_depth = max_depth;
    }
    if cli.no_sitemap {
        options.include_sitemap = false;
    }

    let crawler = Arc::new(SiteCrawler::new(
        client,
        config.user_agent.crawler_name.clone(),
    ));

    let (queue, dispatch_rx) = ScanQueue::new(&config.queue);
    let ctx = Arc::new(WorkerContext {
        crawler,
        registry,
        store,
        progress: Arc::new(LogReporter),
    });
    spawn_workers(Arc::clone(&queue), dispatch_rx, ctx);

    let mut job_ids = Vec::new();
    for url in &cli.urls {
        let job = queue
            .enqueue(None, ScanPayload::new(url.clone(), options.clone()))
            .with_context(|| format!("Failed to submit scan for {}", url))?;
        println!("Submitted scan {} for {}", job.id, url);
        job_ids.push(job.id);
    }

    // Poll until every submitted job reaches a terminal state
    loop {
        let all_done = job_ids.iter().all(|id| {
            queue
                .status(id)
                .map(|status| status.state.is_terminal())
                .unwrap_or(true)
        });
        if all_done {
            break;
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }

    let mut failures = 0;
    for id in &job_ids {
        let Some(status) = queue.status(id) else {
            println!("? {} has no status record", id);
            continue;
        };

        match status.state {
            JobState::Completed => match &status.result {
                Some(report) => println!(
                    "✓ {} completed: {} pages, {} analyzers",
                    id, report.summary.total_pages, report.summary.analyzers_run
                ),
                None => println!("✓ {} completed", id),
            },
            JobState::Failed => {
                failures += 1;
                println!(
                    "✗ {} failed after {} attempts: {}",
                    id,
                    status.attempts,
                    status.last_error.unwrap_or_default()
                );
            }
            other => println!("? {} ended in state {}", id, other),
        }
    }

    let summary = queue.summary();
    tracing::info!(
        "Queue drained: {} queued, {} processing (capacity {})",
        summary.queued,
        summary.processing,
        summary.capacity
    );

    if failures > 0 {
        bail!("{} scan(s) failed", failures);
    }

    Ok(())
}
