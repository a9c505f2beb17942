//! Chart rendering and report output.
//!
//! Charts are built as [`figure::Figure`]s and written as PNG, SVG and HTML by the
//! generator; console summaries live alongside.

pub mod boxplot;
pub mod figure;
pub mod generator;
pub mod pipeline;
pub mod sankey;
pub mod summary;
pub mod svg;

pub use boxplot::duration_figure;
pub use generator::write_artifacts;
pub use sankey::funnel_figure;

/// Canvas size and font of a chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartLayout {
    pub width: u32,
    pub height: u32,
    pub font_family: String,
}
