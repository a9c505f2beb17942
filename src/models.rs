//! Data models for the timing reports.
//!
//! This module contains the event record read from the timing log, the
//! static command table used for labels and colors, and the lifecycle
//! stages tracked by the funnel report.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;

/// Color used for commands missing from [`COMMAND_STYLES`].
pub const FALLBACK_COLOR: &str = "#888888";

/// Color used for stalled nodes in the funnel.
pub const STALLED_COLOR: &str = "#cccccc";

/// Color used for links into stalled nodes.
pub const STALLED_LINK_COLOR: &str = "rgba(200, 200, 200, 0.4)";

/// Display settings for a known command token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStyle {
    /// Command token as written in the log (e.g. `/iter`).
    pub command: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    /// Hex color.
    pub color: &'static str,
}

/// Known commands, in chart priority order.
pub const COMMAND_STYLES: [CommandStyle; 4] = [
    CommandStyle {
        command: "/iter",
        label: "Iteration Start",
        color: "#1795d4",
    },
    CommandStyle {
        command: "/synth",
        label: "Synthesis",
        color: "#22567c",
    },
    CommandStyle {
        command: "/req",
        label: "Requirements",
        color: "#2c3234",
    },
    CommandStyle {
        command: "/rel",
        label: "Release",
        color: "#6b8e23",
    },
];

/// Resolved label and color for any command, known or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDisplay {
    pub label: String,
    pub color: &'static str,
}

impl CommandDisplay {
    /// Look up a command, falling back to a gray, self-labeled entry.
    pub fn for_command(command: &str) -> Self {
        match COMMAND_STYLES.iter().find(|s| s.command == command) {
            Some(style) => Self {
                label: style.label.to_string(),
                color: style.color,
            },
            None => Self {
                label: command.to_string(),
                color: FALLBACK_COLOR,
            },
        }
    }
}

/// Position of a command in the priority order, if it is known.
pub fn command_priority(command: &str) -> Option<usize> {
    COMMAND_STYLES.iter().position(|s| s.command == command)
}

/// One line of the timing log.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventRecord {
    /// ISO-8601 timestamp; `Z` is accepted as `+00:00`.
    pub timestamp: String,
    /// Command token (e.g. `/synth`).
    pub command: String,
    /// Wall-clock duration of the command in seconds.
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    /// Iteration identifier, absent for commands outside an iteration.
    ///
    /// Numbers and other JSON values are keyed by their JSON text; falsy
    /// values (`null`, `false`, `0`, `""`, `[]`, `{}`) mean no iteration.
    #[serde(default, deserialize_with = "deserialize_iteration")]
    pub iteration: Option<String>,
}

fn deserialize_iteration<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let key = match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::String(s) => Some(s),
        Value::Number(n) => (n.as_f64() != Some(0.0)).then(|| n.to_string()),
        Value::Array(ref items) if items.is_empty() => None,
        Value::Object(ref map) if map.is_empty() => None,
        other => Some(other.to_string()),
    };
    Ok(key)
}

impl EventRecord {
    /// The iteration key, treating an empty string like a missing one.
    pub fn iteration_key(&self) -> Option<&str> {
        self.iteration.as_deref().filter(|name| !name.is_empty())
    }
}

/// Inclusive calendar-day window applied to log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// First day included; `None` means unbounded.
    pub start: Option<NaiveDate>,
    /// Last day included.
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Returns true if `date` falls inside the window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        if let Some(start) = self.start {
            if date < start {
                return false;
            }
        }
        date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.start {
            None => write!(f, "All time"),
            Some(start) => write!(f, "{} to {}", start, self.end),
        }
    }
}

/// Lifecycle checkpoint of an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Started,
    Synthesized,
    Requirements,
    Released,
}

impl Stage {
    /// All stages in lifecycle order.
    pub const ALL: [Stage; 4] = [
        Stage::Started,
        Stage::Synthesized,
        Stage::Requirements,
        Stage::Released,
    ];

    /// Command whose presence marks the stage as reached.
    pub fn command(&self) -> &'static str {
        match self {
            Stage::Started => "/iter",
            Stage::Synthesized => "/synth",
            Stage::Requirements => "/req",
            Stage::Released => "/rel",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Stage::Started => 0,
            Stage::Synthesized => 1,
            Stage::Requirements => 2,
            Stage::Released => 3,
        }
    }

    /// The stage that follows this one, if any.
    pub fn next(&self) -> Option<Stage> {
        Stage::ALL.get(self.index() + 1).copied()
    }

    /// Node color in the funnel chart.
    pub fn color(&self) -> &'static str {
        COMMAND_STYLES[self.index()].color
    }

    /// Semi-transparent color for links flowing into this stage.
    pub fn link_color(&self) -> &'static str {
        match self {
            Stage::Started => "rgba(23, 149, 212, 0.4)",
            Stage::Synthesized => "rgba(34, 86, 124, 0.4)",
            Stage::Requirements => "rgba(44, 50, 52, 0.4)",
            Stage::Released => "rgba(107, 142, 35, 0.4)",
        }
    }

    /// Label of the drop-off node that follows this stage.
    pub fn stalled_label(&self) -> Option<&'static str> {
        match self {
            Stage::Started => Some("Stalled at Start"),
            Stage::Synthesized => Some("Stalled at Synth"),
            Stage::Requirements => Some("Stalled at Req"),
            Stage::Released => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Started => write!(f, "Started"),
            Stage::Synthesized => write!(f, "Synthesized"),
            Stage::Requirements => write!(f, "Requirements"),
            Stage::Released => write!(f, "Released"),
        }
    }
}

/// Coarse status shown next to each iteration in the funnel annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationStatus {
    Released,
    InProgress,
    Stalled,
}

impl fmt::Display for IterationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IterationStatus::Released => write!(f, "Released"),
            IterationStatus::InProgress => write!(f, "In Progress"),
            IterationStatus::Stalled => write!(f, "Stalled"),
        }
    }
}
