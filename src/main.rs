//! Timing Report - charts from a JSONL timing log
//!
//! A CLI tool that reads `timing-log.jsonl` and renders either a box plot of
//! activity durations or a Sankey diagram of iteration lifecycle
//! progression, each as PNG, SVG and interactive HTML.
//!
//! Exit codes:
//!   0 - Success, including "no data in range"
//!   1 - Runtime error (missing log, malformed line, write failure, etc.)

mod analysis;
mod cli;
mod config;
mod models;
mod report;
mod timelog;

use anyhow::{Context, Result};
use chrono::Local;
use cli::{Args, ReportKind};
use config::Config;
use report::pipeline;
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("Timing Report v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run_report(args) {
        error!("Report failed: {:#}", e);
        eprintln!("\nError: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .timing-report.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            config::DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::DEFAULT_CONFIG_FILE))?;

    println!("Created {} with default settings.", config::DEFAULT_CONFIG_FILE);
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so the printed summary stays readable on stdout.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load the log and produce the requested report.
fn run_report(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    let Some(kind) = args.report else {
        // validate() guarantees a report unless --init-config was given
        return Ok(());
    };

    let range = kind.dates().range(Local::now().date_naive());
    info!("Date range: {}", range);

    let log_path = config.general.log_file.clone();
    info!("Reading timing log: {}", log_path.display());
    let entries = timelog::read_entries(&log_path)?;

    let text = match kind {
        ReportKind::Duration(_) => pipeline::duration_report(&config, &entries, &range)?,
        ReportKind::Funnel(_) => pipeline::funnel_report(&config, &entries, &range)?,
    };

    print!("{}", text);
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", config::DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
