//! Crawlcore main entry point
//!
//! Command-line interface that runs a single crawl task to completion.

use anyhow::Context;
use clap::Parser;
use crawlcore::config::load_config;
use crawlcore::crawler::Orchestrator;
use crawlcore::models::{CrawlRequest, CrawlStatus};
use crawlcore::storage::JsonStorage;
use crawlcore::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Crawlcore: a bounded-depth website crawl engine
///
/// Crawls a website breadth-first from a root URL while staying on the
/// root's domain, respecting per-domain rate limits, and adapting its
/// concurrency to observed success rates.
#[derive(Parser, Debug)]
#[command(name = "crawlcore")]
#[command(version)]
#[command(about = "A bounded-depth website crawl engine", long_about = None)]
struct Cli {
    /// Root URL to crawl
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum crawl depth (0 = unlimited)
    #[arg(short, long, default_value_t = 2)]
    depth: u32,

    /// Do not follow links beyond the root page
    #[arg(long)]
    no_follow: bool,

    /// Directory for tasks, results, and pages
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path).with_context(|| format!("loading {}", path.display()))?
        }
        None => Config::default(),
    };
    let config = Arc::new(config);

    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.storage.data_dir));
    let storage = Arc::new(JsonStorage::new(&data_dir)
        .with_context(|| format!("opening data dir {}", data_dir.display()))?);

    let orchestrator = Orchestrator::new(Arc::clone(&config), storage)?;

    let mut request = CrawlRequest::new(&cli.url);
    request.max_depth = cli.depth;
    request.follow_links = !cli.no_follow;

    let task = orchestrator.submit(request)?;
    tracing::info!("Submitted task {}", task.task_id);

    // Ctrl-C triggers a graceful cancellation: in-flight fetches finish,
    // nothing new is dequeued
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling crawl");
            signal_token.cancel();
        }
    });

    match orchestrator.run(&task, cancel).await {
        Ok(result) => {
            println!("Task:     {}", result.task_id);
            println!("Status:   {:?}", result.status);
            println!("Pages:    {}", result.total_pages);
            println!("Errors:   {}", result.errors.len());
            println!("Retries:  {}", result.retry_stats.total_retries);
            if let Some(duration) = result.duration {
                println!("Duration: {duration:.2}s");
            }
            println!("Data dir: {}", data_dir.display());

            if result.status == CrawlStatus::Cancelled {
                std::process::exit(130);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("crawlcore=info,warn"),
            1 => EnvFilter::new("crawlcore=debug,info"),
            2 => EnvFilter::new("crawlcore=trace,debug"),
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
