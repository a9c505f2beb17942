//! Iteration lifecycle aggregation.
//!
//! Collects the commands seen per iteration, counts how many iterations
//! reached each stage and derives the drop-off between consecutive stages.
//! Drop-off is the plain difference of stage counts; iterations are not
//! checked for reaching stages in order, so a drop-off can be negative.

use crate::models::{DateRange, IterationStatus, Stage, STALLED_COLOR, STALLED_LINK_COLOR};
use crate::timelog::{filter_entries, LogEntry};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Commands observed for one iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationSummary {
    pub name: String,
    pub commands: BTreeSet<String>,
}

impl IterationSummary {
    pub fn reached(&self, stage: Stage) -> bool {
        self.commands.contains(stage.command())
    }

    /// Stages reached, in lifecycle order.
    pub fn stages_reached(&self) -> Vec<Stage> {
        Stage::ALL
            .into_iter()
            .filter(|stage| self.reached(*stage))
            .collect()
    }

    pub fn status(&self) -> IterationStatus {
        if self.reached(Stage::Released) {
            IterationStatus::Released
        } else if self.reached(Stage::Requirements) || self.reached(Stage::Synthesized) {
            IterationStatus::InProgress
        } else {
            IterationStatus::Stalled
        }
    }

    /// Name without its first three dash-separated segments
    /// (`2024-01-02-alpha` → `alpha`).
    pub fn short_name(&self) -> &str {
        self.name.splitn(4, '-').last().unwrap_or(&self.name)
    }
}

/// Stage reachability for all iterations within a date window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunnelReport {
    pub range: DateRange,
    /// Iterations sorted by name.
    pub iterations: Vec<IterationSummary>,
    /// Iterations reaching each stage, indexed by [`Stage::index`].
    pub stage_counts: [usize; 4],
}

impl FunnelReport {
    pub fn total_iterations(&self) -> usize {
        self.iterations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.iterations.is_empty()
    }

    pub fn count(&self, stage: Stage) -> usize {
        self.stage_counts[stage.index()]
    }

    /// Difference between this stage's count and the next one's.
    ///
    /// `None` for the last stage.
    pub fn stalled_after(&self, stage: Stage) -> Option<i64> {
        let next = stage.next()?;
        Some(self.count(stage) as i64 - self.count(next) as i64)
    }

    /// Sankey graph: stage nodes first, then one node per positive drop-off.
    pub fn flow_graph(&self) -> FlowGraph {
        let mut nodes: Vec<FlowNode> = Stage::ALL
            .into_iter()
            .map(|stage| FlowNode {
                label: format!("{} ({})", stage, self.count(stage)),
                color: stage.color(),
                column: stage.index(),
                value: self.count(stage) as u64,
            })
            .collect();
        let mut links = Vec::new();

        for stage in Stage::ALL {
            let (Some(next), Some(stalled), Some(stalled_label)) =
                (stage.next(), self.stalled_after(stage), stage.stalled_label())
            else {
                continue;
            };

            let continuing = self.count(next);
            if continuing > 0 {
                links.push(FlowLink {
                    source: stage.index(),
                    target: next.index(),
                    value: continuing as u64,
                    color: next.link_color(),
                });
            }

            if stalled > 0 {
                let stalled_idx = nodes.len();
                nodes.push(FlowNode {
                    label: format!("{} ({})", stalled_label, stalled),
                    color: STALLED_COLOR,
                    column: next.index(),
                    value: stalled as u64,
                });
                links.push(FlowLink {
                    source: stage.index(),
                    target: stalled_idx,
                    value: stalled as u64,
                    color: STALLED_LINK_COLOR,
                });
            }
        }

        FlowGraph { nodes, links }
    }

    /// Annotation text: `short name (status)` for every iteration.
    pub fn status_line(&self) -> String {
        self.iterations
            .iter()
            .map(|it| format!("{} ({})", it.short_name(), it.status()))
            .collect::<Vec<_>>()
            .join("  |  ")
    }
}

/// Node of the lifecycle flow graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowNode {
    pub label: String,
    pub color: &'static str,
    /// Horizontal position, 0 for the first stage.
    pub column: usize,
    pub value: u64,
}

/// Weighted edge between two nodes, by index into [`FlowGraph::nodes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowLink {
    pub source: usize,
    pub target: usize,
    pub value: u64,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowGraph {
    pub nodes: Vec<FlowNode>,
    pub links: Vec<FlowLink>,
}

/// Build per-iteration command sets and stage counts.
///
/// Entries without an iteration (absent, null or empty) are skipped.
pub fn build_funnel(entries: &[LogEntry], range: &DateRange) -> FunnelReport {
    let mut by_iteration: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for entry in filter_entries(entries, range) {
        if let Some(name) = entry.record.iteration_key() {
            by_iteration
                .entry(name.to_string())
                .or_default()
                .insert(entry.record.command.clone());
        }
    }

    let iterations: Vec<IterationSummary> = by_iteration
        .into_iter()
        .map(|(name, commands)| IterationSummary { name, commands })
        .collect();

    let mut stage_counts = [0usize; 4];
    for stage in Stage::ALL {
        stage_counts[stage.index()] = iterations.iter().filter(|it| it.reached(stage)).count();
    }

    debug!(
        "Funnel over {} iterations: {:?}",
        iterations.len(),
        stage_counts
    );

    FunnelReport {
        range: *range,
        iterations,
        stage_counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timelog::parse_log;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn fixture() -> Vec<LogEntry> {
        parse_log(include_str!("../../fixtures/timing-log.jsonl")).unwrap()
    }

    fn all_time() -> DateRange {
        DateRange::new(None, date("2024-12-31"))
    }

    #[test]
    fn test_release_without_synthesis() {
        let content = concat!(
            "{\"timestamp\":\"2024-01-01T00:00:00Z\",\"command\":\"/iter\",\"duration_seconds\":120,\"iteration\":\"it-1\"}\n",
            "{\"timestamp\":\"2024-01-01T00:05:00Z\",\"command\":\"/rel\",\"duration_seconds\":0,\"iteration\":\"it-1\"}\n",
        );
        let entries = parse_log(content).unwrap();
        let report = build_funnel(&entries, &DateRange::new(None, date("2024-01-01")));

        assert_eq!(report.count(Stage::Started), 1);
        assert_eq!(report.count(Stage::Synthesized), 0);
        assert_eq!(report.count(Stage::Requirements), 0);
        assert_eq!(report.count(Stage::Released), 1);
        assert_eq!(report.stalled_after(Stage::Started), Some(1));
        assert_eq!(report.stalled_after(Stage::Requirements), Some(-1));
        assert_eq!(report.iterations[0].status(), IterationStatus::Released);
    }

    #[test]
    fn test_fixture_counts() {
        let report = build_funnel(&fixture(), &all_time());

        assert_eq!(report.total_iterations(), 4);
        assert_eq!(report.stage_counts, [4, 2, 2, 2]);
        assert_eq!(report.stalled_after(Stage::Started), Some(2));
        assert_eq!(report.stalled_after(Stage::Synthesized), Some(0));
        assert_eq!(report.stalled_after(Stage::Released), None);
    }

    #[test]
    fn test_started_equals_synthesized_plus_stalled() {
        for range in [
            all_time(),
            DateRange::new(Some(date("2024-01-01")), date("2024-01-05")),
            DateRange::new(Some(date("2024-01-08")), date("2024-01-11")),
        ] {
            let report = build_funnel(&fixture(), &range);
            let started = report.count(Stage::Started) as i64;
            let synthesized = report.count(Stage::Synthesized) as i64;
            assert_eq!(
                started,
                synthesized + report.stalled_after(Stage::Started).unwrap()
            );
        }
    }

    #[test]
    fn test_iterations_without_key_skipped() {
        let report = build_funnel(&fixture(), &all_time());
        let names: Vec<_> = report.iterations.iter().map(|it| it.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "2024-01-02-alpha",
                "2024-01-05-beta",
                "2024-01-08-gamma",
                "2024-01-10-delta"
            ]
        );
        assert!(report
            .iterations
            .iter()
            .all(|it| !it.commands.contains("/status")));
    }

    #[test]
    fn test_status_and_short_names() {
        let report = build_funnel(&fixture(), &all_time());
        assert_eq!(
            report.status_line(),
            "alpha (Released)  |  beta (In Progress)  |  gamma (Stalled)  |  delta (Released)"
        );

        let plain = IterationSummary {
            name: "sprint".to_string(),
            commands: BTreeSet::new(),
        };
        assert_eq!(plain.short_name(), "sprint");
        assert_eq!(plain.status(), IterationStatus::Stalled);

        let nested = IterationSummary {
            name: "a-b-c-d-e".to_string(),
            commands: BTreeSet::new(),
        };
        assert_eq!(nested.short_name(), "d-e");
    }

    #[test]
    fn test_stages_reached_in_order() {
        let report = build_funnel(&fixture(), &all_time());
        let delta = report
            .iterations
            .iter()
            .find(|it| it.name.ends_with("delta"))
            .unwrap();
        assert_eq!(
            delta.stages_reached(),
            vec![Stage::Started, Stage::Requirements, Stage::Released]
        );
    }

    #[test]
    fn test_flow_graph_fixture() {
        let graph = build_funnel(&fixture(), &all_time()).flow_graph();

        let labels: Vec<_> = graph.nodes.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Started (4)",
                "Synthesized (2)",
                "Requirements (2)",
                "Released (2)",
                "Stalled at Start (2)"
            ]
        );

        let edges: Vec<_> = graph
            .links
            .iter()
            .map(|l| (l.source, l.target, l.value))
            .collect();
        assert_eq!(edges, vec![(0, 1, 2), (0, 4, 2), (1, 2, 2), (2, 3, 2)]);
        assert_eq!(graph.links[1].color, STALLED_LINK_COLOR);
        assert_eq!(graph.nodes[4].column, 1);
    }

    #[test]
    fn test_flow_graph_skips_non_positive_values() {
        let range = DateRange::new(Some(date("2024-01-01")), date("2024-01-05"));
        let graph = build_funnel(&fixture(), &range).flow_graph();

        // Started 2, Synthesized 2, Requirements 1, Released 1
        assert_eq!(graph.nodes.len(), 5);
        assert_eq!(graph.nodes[4].label, "Stalled at Synth (1)");
        assert_eq!(graph.nodes[4].column, 2);

        let edges: Vec<_> = graph
            .links
            .iter()
            .map(|l| (l.source, l.target, l.value))
            .collect();
        assert_eq!(edges, vec![(0, 1, 2), (1, 2, 1), (1, 4, 1), (2, 3, 1)]);
    }

    #[test]
    fn test_numeric_iteration_keys() {
        let content = concat!(
            "{\"timestamp\":\"2024-01-01T00:00:00Z\",\"command\":\"/iter\",\"iteration\":7}\n",
            "{\"timestamp\":\"2024-01-01T00:05:00Z\",\"command\":\"/synth\",\"iteration\":7}\n",
            "{\"timestamp\":\"2024-01-01T00:10:00Z\",\"command\":\"/iter\",\"iteration\":0}\n",
        );
        let entries = parse_log(content).unwrap();
        let report = build_funnel(&entries, &DateRange::new(None, date("2024-01-01")));

        assert_eq!(report.total_iterations(), 1);
        assert_eq!(report.iterations[0].name, "7");
        assert_eq!(report.stage_counts, [1, 1, 0, 0]);
    }

    #[test]
    fn test_empty_funnel() {
        let report = build_funnel(&[], &all_time());
        assert!(report.is_empty());
        assert_eq!(report.stage_counts, [0, 0, 0, 0]);
        assert!(report.flow_graph().links.is_empty());
    }
}
