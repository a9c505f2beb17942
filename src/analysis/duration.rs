//! Duration aggregation.
//!
//! Buckets command durations (in minutes) from the timing log and computes
//! the statistics shown in the box plot and the console summary.

use crate::models::{command_priority, CommandDisplay, DateRange};
use crate::timelog::{filter_entries, LogEntry, LogError};
use std::collections::BTreeMap;
use tracing::debug;

/// Durations recorded for one command.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationGroup {
    pub command: String,
    pub display: CommandDisplay,
    /// Durations in minutes, in log order. Always positive.
    pub minutes: Vec<f64>,
}

impl DurationGroup {
    pub fn stats(&self) -> DurationStats {
        DurationStats::from_values(&self.minutes)
    }
}

/// Summary statistics of a non-empty sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Lowest sample within 1.5 IQR below q1.
    pub lower_whisker: f64,
    /// Highest sample within 1.5 IQR above q3.
    pub upper_whisker: f64,
}

impl DurationStats {
    /// Compute statistics; an empty sample yields all zeros.
    pub fn from_values(values: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let count = sorted.len();
        if count == 0 {
            return Self {
                count: 0,
                min: 0.0,
                max: 0.0,
                mean: 0.0,
                q1: 0.0,
                median: 0.0,
                q3: 0.0,
                lower_whisker: 0.0,
                upper_whisker: 0.0,
            };
        }

        let q1 = quantile(&sorted, 0.25);
        let q3 = quantile(&sorted, 0.75);
        let iqr = q3 - q1;
        let low_fence = q1 - 1.5 * iqr;
        let high_fence = q3 + 1.5 * iqr;

        let lower_whisker = sorted
            .iter()
            .copied()
            .find(|v| *v >= low_fence)
            .unwrap_or(sorted[0]);
        let upper_whisker = sorted
            .iter()
            .rev()
            .copied()
            .find(|v| *v <= high_fence)
            .unwrap_or(sorted[count - 1]);

        Self {
            count,
            min: sorted[0],
            max: sorted[count - 1],
            mean: sorted.iter().sum::<f64>() / count as f64,
            q1,
            median: quantile(&sorted, 0.5),
            q3,
            lower_whisker,
            upper_whisker,
        }
    }
}

/// Linear-interpolation quantile of a sorted, non-empty slice.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let pos = (sorted.len() - 1) as f64 * p;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (pos - lo as f64) * (sorted[hi] - sorted[lo])
}

/// Durations per command within a date window.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationReport {
    pub range: DateRange,
    /// Known commands in priority order, then unknown commands by name.
    pub groups: Vec<DurationGroup>,
}

impl DurationReport {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Group positive durations (seconds → minutes) by command.
///
/// Entries outside `range` are ignored. An in-range entry without a
/// duration is an error.
pub fn aggregate_durations(
    entries: &[LogEntry],
    range: &DateRange,
) -> Result<DurationReport, LogError> {
    let mut by_command: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    for entry in filter_entries(entries, range) {
        let seconds = entry
            .record
            .duration_seconds
            .ok_or(LogError::MissingDuration { line: entry.line })?;

        let minutes = seconds / 60.0;
        if minutes > 0.0 {
            by_command
                .entry(entry.record.command.clone())
                .or_default()
                .push(minutes);
        }
    }

    let mut groups: Vec<DurationGroup> = by_command
        .into_iter()
        .map(|(command, minutes)| DurationGroup {
            display: CommandDisplay::for_command(&command),
            command,
            minutes,
        })
        .collect();

    // BTreeMap order already sorts unknown commands by name
    groups.sort_by_key(|g| command_priority(&g.command).unwrap_or(usize::MAX));

    debug!("Aggregated durations for {} commands", groups.len());

    Ok(DurationReport {
        range: *range,
        groups,
    })
}
