//! Aggregate, render and summarize one report.
//!
//! Each function returns the console text instead of printing it. A window
//! without data yields the "no data" message and writes nothing.

use super::{duration_figure, funnel_figure, summary, write_artifacts};
use crate::analysis::{aggregate_durations, build_funnel};
use crate::config::Config;
use crate::models::DateRange;
use crate::timelog::LogEntry;
use anyhow::Result;
use tracing::info;

/// Duration box plot and statistics.
pub fn duration_report(config: &Config, entries: &[LogEntry], range: &DateRange) -> Result<String> {
    let durations = aggregate_durations(entries, range)?;

    if durations.is_empty() {
        info!("No positive durations in {}", range);
        return Ok(format!("{}\n", summary::NO_DURATION_DATA));
    }

    let figure = duration_figure(&durations, &config.layout(&config.duration));
    let paths = write_artifacts(
        &figure,
        &config.output_dir(),
        &config.duration.output_stem,
        &config.render,
    )?;

    Ok(summary::artifacts_listing(&paths) + &summary::duration_summary(&durations))
}

/// Lifecycle Sankey diagram and flow summary.
pub fn funnel_report(config: &Config, entries: &[LogEntry], range: &DateRange) -> Result<String> {
    let funnel = build_funnel(entries, range);

    if funnel.is_empty() {
        info!("No iterations in {}", range);
        return Ok(format!("{}\n", summary::NO_ITERATION_DATA));
    }

    let figure = funnel_figure(&funnel, &config.layout(&config.funnel));
    let paths = write_artifacts(
        &figure,
        &config.output_dir(),
        &config.funnel.output_stem,
        &config.render,
    )?;

    Ok(summary::artifacts_listing(&paths) + &summary::funnel_summary(&funnel))
}
