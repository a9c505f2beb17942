//! Log aggregation for the two reports.
//!
//! Both aggregators consume entries from [`crate::timelog`] and a date
//! window; neither touches the file system.

pub mod duration;
pub mod funnel;

pub use duration::{aggregate_durations, DurationReport};
pub use funnel::{build_funnel, FlowGraph, FunnelReport};
