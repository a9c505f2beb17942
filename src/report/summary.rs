//! Console summaries printed after the charts are written.

use super::generator::ArtifactPaths;
use crate::analysis::{DurationReport, FunnelReport};
use crate::models::Stage;

/// Message printed when the duration window holds no positive durations.
pub const NO_DURATION_DATA: &str = "No duration data found (all entries have 0 duration)";

/// Message printed when the funnel window holds no iterations.
pub const NO_ITERATION_DATA: &str = "No iteration data found (no entries with an iteration)";

/// List of the files written for a chart.
pub fn artifacts_listing(paths: &ArtifactPaths) -> String {
    let mut text = String::from("Charts saved:\n");
    for path in paths.all() {
        text.push_str(&format!("  {}\n", path.display()));
    }
    text
}

/// Date range and per-command statistics, one decimal place.
pub fn duration_summary(report: &DurationReport) -> String {
    let mut text = String::new();

    text.push_str("\nSummary:\n");
    text.push_str(&format!("  Date range: {}\n", report.range));
    text.push_str("\nDuration statistics (minutes):\n");

    for group in &report.groups {
        let stats = group.stats();
        text.push_str(&format!("  {}:\n", group.display.label));
        text.push_str(&format!("    Count: {}\n", stats.count));
        text.push_str(&format!("    Min: {:.1}\n", stats.min));
        text.push_str(&format!("    Max: {:.1}\n", stats.max));
        text.push_str(&format!("    Avg: {:.1}\n", stats.mean));
    }

    text
}

/// Stage flow with drop-off, then the stages each iteration reached.
pub fn funnel_summary(report: &FunnelReport) -> String {
    let mut text = String::new();

    text.push_str("\nSummary:\n");
    text.push_str(&format!("  Total iterations: {}\n", report.total_iterations()));
    text.push_str(&format!("  Date range: {}\n", report.range));

    text.push_str("\nFlow:\n");
    text.push_str(&format!("  Started: {}\n", report.count(Stage::Started)));
    for stage in Stage::ALL {
        if let (Some(next), Some(stalled)) = (stage.next(), report.stalled_after(stage)) {
            text.push_str(&format!(
                "  → {}: {} ({} stalled)\n",
                next,
                report.count(next),
                stalled
            ));
        }
    }

    text.push_str("\nIterations analyzed:\n");
    for iteration in &report.iterations {
        let stages: Vec<String> = iteration
            .stages_reached()
            .iter()
            .map(|s| s.to_string())
            .collect();
        text.push_str(&format!("  {}: {}\n", iteration.name, stages.join(" → ")));
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{aggregate_durations, build_funnel};
    use crate::models::DateRange;
    use crate::timelog::parse_log;
    use chrono::NaiveDate;
    use std::path::Path;

    fn all_time() -> DateRange {
        DateRange::new(None, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap())
    }

    fn fixture() -> Vec<crate::timelog::LogEntry> {
        parse_log(include_str!("../../fixtures/timing-log.jsonl")).unwrap()
    }

    #[test]
    fn test_artifacts_listing() {
        let paths = ArtifactPaths::new(Path::new("out"), "lifecycle_funnel");
        let text = artifacts_listing(&paths);
        assert!(text.starts_with("Charts saved:\n"));
        assert!(text.contains("  out/lifecycle_funnel.png\n"));
        assert!(text.contains("  out/lifecycle_funnel.html\n"));
    }

    #[test]
    fn test_duration_summary() {
        let report = aggregate_durations(&fixture(), &all_time()).unwrap();
        let text = duration_summary(&report);

        assert!(text.contains("  Date range: All time\n"));
        assert!(text.contains(
            "  Iteration Start:\n    Count: 4\n    Min: 3.0\n    Max: 7.0\n    Avg: 4.9\n"
        ));
        assert!(text.contains("  Synthesis:\n    Count: 2\n    Min: 10.0\n    Max: 15.0\n    Avg: 12.5\n"));
        assert!(text.contains("  /status:\n    Count: 1\n"));

        // Groups appear in priority order
        let iter_pos = text.find("Iteration Start").unwrap();
        let rel_pos = text.find("Release:").unwrap();
        assert!(iter_pos < rel_pos);
    }

    #[test]
    fn test_funnel_summary() {
        let report = build_funnel(&fixture(), &all_time());
        let text = funnel_summary(&report);

        assert!(text.contains("  Total iterations: 4\n"));
        assert!(text.contains("  Started: 4\n"));
        assert!(text.contains("  → Synthesized: 2 (2 stalled)\n"));
        assert!(text.contains("  → Requirements: 2 (0 stalled)\n"));
        assert!(text.contains("  → Released: 2 (0 stalled)\n"));
        assert!(text.contains("  2024-01-10-delta: Started → Requirements → Released\n"));
        assert!(text.contains("  2024-01-08-gamma: Started\n"));
    }

    #[test]
    fn test_funnel_summary_negative_drop_off() {
        let entries = parse_log(concat!(
            "{\"timestamp\":\"2024-01-01T00:00:00Z\",\"command\":\"/iter\",\"iteration\":\"it-1\"}\n",
            "{\"timestamp\":\"2024-01-01T00:05:00Z\",\"command\":\"/rel\",\"iteration\":\"it-1\"}\n",
        ))
        .unwrap();
        let report = build_funnel(&entries, &all_time());
        let text = funnel_summary(&report);

        assert!(text.contains("  → Synthesized: 0 (1 stalled)\n"));
        assert!(text.contains("  → Released: 1 (-1 stalled)\n"));
    }
}
