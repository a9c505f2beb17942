//! Timing log reader.
//!
//! Loads `timing-log.jsonl` fully into memory, parsing every line into an
//! [`EventRecord`] and resolving its calendar date. Any malformed line
//! aborts the whole read.

use crate::models::{DateRange, EventRecord};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors raised while reading the timing log.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to read timing log {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed JSON at line {line}: {source}")]
    MalformedLine {
        line: usize,
        source: serde_json::Error,
    },
    #[error("invalid timestamp `{value}` at line {line}")]
    InvalidTimestamp { line: usize, value: String },
    #[error("entry at line {line} has no duration_seconds")]
    MissingDuration { line: usize },
}

/// A parsed log line together with its position and date.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// 1-based line number in the log file.
    pub line: usize,
    /// Calendar date of the timestamp, in the timestamp's own offset.
    pub date: NaiveDate,
    pub record: EventRecord,
}

/// Read and parse the whole timing log.
pub fn read_entries(path: &Path) -> Result<Vec<LogEntry>, LogError> {
    let content = fs::read_to_string(path).map_err(|source| LogError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let entries = parse_log(&content)?;
    debug!("Read {} entries from {}", entries.len(), path.display());
    Ok(entries)
}

/// Parse log content, skipping blank lines.
pub fn parse_log(content: &str) -> Result<Vec<LogEntry>, LogError> {
    let mut entries = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }

        let record: EventRecord = serde_json::from_str(trimmed)
            .map_err(|source| LogError::MalformedLine { line, source })?;

        let date = parse_event_date(&record.timestamp).ok_or_else(|| {
            LogError::InvalidTimestamp {
                line,
                value: record.timestamp.clone(),
            }
        })?;

        entries.push(LogEntry { line, date, record });
    }

    Ok(entries)
}

/// Entries whose date falls inside `range`.
pub fn filter_entries<'a>(
    entries: &'a [LogEntry],
    range: &'a DateRange,
) -> impl Iterator<Item = &'a LogEntry> + 'a {
    entries.iter().filter(move |e| range.contains(e.date))
}

/// Resolve the calendar date of an ISO-8601 timestamp.
///
/// Zone-aware timestamps keep their own offset; naive timestamps and bare
/// dates are taken as written.
pub fn parse_event_date(raw: &str) -> Option<NaiveDate> {
    let normalized = raw.trim().replace('Z', "+00:00");

    if let Ok(ts) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(ts.date_naive());
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%:z"] {
        if let Ok(ts) = DateTime::parse_from_str(&normalized, fmt) {
            return Some(ts.date_naive());
        }
    }

    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(&normalized, fmt) {
            return Some(ts.date());
        }
    }

    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_parse_zulu_timestamp() {
        assert_eq!(
            parse_event_date("2024-01-01T23:59:59Z"),
            Some(date("2024-01-01"))
        );
    }

    #[test]
    fn test_parse_keeps_own_offset() {
        // 23:30 at -05:00 is already the next day in UTC
        assert_eq!(
            parse_event_date("2024-03-10T23:30:00-05:00"),
            Some(date("2024-03-10"))
        );
    }

    #[test]
    fn test_parse_fractional_and_naive() {
        assert_eq!(
            parse_event_date("2024-03-10T08:15:42.123456+02:00"),
            Some(date("2024-03-10"))
        );
        assert_eq!(
            parse_event_date("2024-03-10T08:15:42"),
            Some(date("2024-03-10"))
        );
        assert_eq!(parse_event_date("2024-03-10"), Some(date("2024-03-10")));
        assert_eq!(parse_event_date("yesterday"), None);
    }

    #[test]
    fn test_parse_log_skips_blank_lines() {
        let content = "\n{\"timestamp\":\"2024-01-01T00:00:00Z\",\"command\":\"/iter\",\"duration_seconds\":120}\n   \n";
        let entries = parse_log(content).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].line, 2);
        assert_eq!(entries[0].record.command, "/iter");
    }

    #[test]
    fn test_parse_log_rejects_malformed_json() {
        let content = "{\"timestamp\":\"2024-01-01T00:00:00Z\",\"command\":\"/iter\"}\n{not json";
        match parse_log(content) {
            Err(LogError::MalformedLine { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected malformed line error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_log_rejects_bad_timestamp() {
        let content = "{\"timestamp\":\"soon\",\"command\":\"/iter\"}";
        let err = parse_log(content).unwrap_err();
        assert!(matches!(err, LogError::InvalidTimestamp { line: 1, .. }));
        assert!(err.to_string().contains("soon"));
    }

    #[test]
    fn test_read_entries_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("timing-log.jsonl");
        let err = read_entries(&missing).unwrap_err();
        assert!(matches!(err, LogError::Io { .. }));
    }

    #[test]
    fn test_read_entries_from_fixture() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("timing-log.jsonl");
        std::fs::write(&path, include_str!("../../fixtures/timing-log.jsonl")).unwrap();

        let entries = read_entries(&path).unwrap();
        assert_eq!(entries.len(), 12);
    }

    #[test]
    fn test_filter_entries_by_day() {
        let content = concat!(
            "{\"timestamp\":\"2024-01-31T23:59:00Z\",\"command\":\"/iter\"}\n",
            "{\"timestamp\":\"2024-02-01T00:00:00Z\",\"command\":\"/iter\"}\n",
        );
        let entries = parse_log(content).unwrap();
        let range = DateRange::new(None, date("2024-01-31"));
        let kept: Vec<_> = filter_entries(&entries, &range).collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].line, 1);
    }
}
