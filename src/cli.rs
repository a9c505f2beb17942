//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::DateRange;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Timing Report - charts from a JSONL timing log
///
/// Reads `timing-log.jsonl` and renders either a box plot of command
/// durations or a Sankey diagram of iteration lifecycle progression.
/// Each chart is written as PNG, SVG and interactive HTML.
///
/// Examples:
///   timing-report duration
///   timing-report duration 2024-01-01 2024-01-31
///   timing-report funnel 2024-01-01 --log metrics/timing-log.jsonl
///   timing-report --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Report to generate
    #[command(subcommand)]
    pub report: Option<ReportKind>,

    /// Path to the timing log
    ///
    /// Defaults to timing-log.jsonl in the current directory, or the
    /// log_file setting of the config file.
    #[arg(short, long, value_name = "FILE", env = "TIMING_REPORT_LOG", global = true)]
    pub log: Option<PathBuf>,

    /// Directory to write chart files to
    ///
    /// Defaults to the directory containing the timing log
    #[arg(short, long, value_name = "DIR", global = true)]
    pub output_dir: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .timing-report.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .timing-report.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// The two reports.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ReportKind {
    /// Box plot of activity durations by command
    Duration(DateArgs),
    /// Sankey diagram of iteration lifecycle progression
    Funnel(DateArgs),
}

impl ReportKind {
    pub fn dates(&self) -> &DateArgs {
        match self {
            ReportKind::Duration(dates) | ReportKind::Funnel(dates) => dates,
        }
    }
}

/// Optional inclusive date window.
#[derive(clap::Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct DateArgs {
    /// First day to include (YYYY-MM-DD); all history when omitted
    #[arg(value_name = "START_DATE", value_parser = parse_date)]
    pub start: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD); today when omitted
    #[arg(value_name = "END_DATE", value_parser = parse_date)]
    pub end: Option<NaiveDate>,
}

impl DateArgs {
    /// Resolve the window, with `today` as the default end.
    pub fn range(&self, today: NaiveDate) -> DateRange {
        DateRange::new(self.start, self.end.unwrap_or(today))
    }
}

/// Parse a `YYYY-MM-DD` date argument.
pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}': expected YYYY-MM-DD", value))
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.report.is_none() {
            return Err("A report is required: use 'duration' or 'funnel'".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
