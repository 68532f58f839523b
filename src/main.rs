//! Apod-Harvest main entry point
//!
//! Command-line interface for the resumable archive image harvester.

use anyhow::Context;
use apod_harvest::config::load_config_with_hash;
use apod_harvest::harvest;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Apod-Harvest: a resumable archive image harvester
///
/// Walks a daily-entry archive index, extracts the image link behind each
/// entry, and downloads every image exactly once. Interrupted runs resume
/// where they left off.
#[derive(Parser, Debug)]
#[command(name = "apod-harvest")]
#[command(version)]
#[command(about = "A resumable archive image harvester", long_about = None)]
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

    /// Skip the crawl and download from the cached link records
    #[arg(long)]
    from_cache: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.from_cache {
        config.harvest.resume_from_cache = true;
    }

    // A fatal pipeline error exits nonzero with a diagnostic; per-entry
    // failures were already logged and absorbed inside the run.
    harvest::run(config).await.context("harvest failed")?;

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("apod_harvest=info,warn"),
            1 => EnvFilter::new("apod_harvest=debug,info"),
            2 => EnvFilter::new("apod_harvest=trace,debug"),
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
