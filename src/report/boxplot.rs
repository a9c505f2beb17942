//! Duration box plot.

use super::figure::Figure;
use super::svg::{Anchor, SvgCanvas, TextStyle};
use super::ChartLayout;
use crate::analysis::DurationReport;
use serde_json::{json, Value};

pub const TITLE: &str = "Activity Duration by Type";
const Y_AXIS_TITLE: &str = "Duration (minutes)";

const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 40.0;
const MARGIN_TOP: f64 = 90.0;
const MARGIN_BOTTOM: f64 = 60.0;

/// Horizontal spread of the overlaid points, as a fraction of box width.
const JITTER: f64 = 0.3;
/// Center of the points relative to the box center, in half box widths.
const POINT_POS: f64 = -1.8;

const GRID_COLOR: &str = "#e5ecf6";
const AXIS_TEXT_COLOR: &str = "#444444";

/// Build the box plot figure: one trace per command group.
pub fn duration_figure(report: &DurationReport, layout: &ChartLayout) -> Figure {
    let subtitle = report.range.to_string();

    Figure {
        title: TITLE.to_string(),
        svg: render_svg(report, layout, &subtitle),
        plotly: plotly_figure(report, layout, &subtitle),
        subtitle,
        width: layout.width,
        height: layout.height,
    }
}

fn plotly_figure(report: &DurationReport, layout: &ChartLayout, subtitle: &str) -> Value {
    let traces: Vec<Value> = report
        .groups
        .iter()
        .map(|group| {
            json!({
                "type": "box",
                "y": group.minutes,
                "name": group.display.label,
                "marker": {"color": group.display.color},
                "boxpoints": "all",
                "jitter": JITTER,
                "pointpos": POINT_POS,
                "hovertemplate": "%{y:.1f} min<extra></extra>",
            })
        })
        .collect();

    json!({
        "data": traces,
        "layout": {
            "title": {
                "text": format!("{}<br><sup>{}</sup>", TITLE, subtitle),
                "font": {"size": 18},
            },
            "yaxis": {"title": {"text": Y_AXIS_TITLE}},
            "font": {"size": 12, "family": layout.font_family},
            "height": layout.height,
            "width": layout.width,
            "showlegend": false,
        },
    })
}

fn render_svg(report: &DurationReport, layout: &ChartLayout, subtitle: &str) -> String {
    let mut canvas = SvgCanvas::new(layout.width, layout.height, &layout.font_family);

    let plot_left = MARGIN_LEFT;
    let plot_top = MARGIN_TOP;
    let plot_w = (canvas.width() - MARGIN_LEFT - MARGIN_RIGHT).max(1.0);
    let plot_h = (canvas.height() - MARGIN_TOP - MARGIN_BOTTOM).max(1.0);
    let plot_bottom = plot_top + plot_h;

    canvas.text(MARGIN_LEFT, 36.0, TITLE, TextStyle::new(18.0));
    canvas.text(
        MARGIN_LEFT,
        58.0,
        subtitle,
        TextStyle::new(12.0).color(AXIS_TEXT_COLOR),
    );

    let data_max = report
        .groups
        .iter()
        .flat_map(|g| g.minutes.iter().copied())
        .fold(0.0_f64, f64::max);
    let (step, axis_max) = nice_axis(data_max);
    let y_of = |v: f64| plot_bottom - (v / axis_max) * plot_h;

    // Grid and tick labels
    let ticks = (axis_max / step).round() as usize;
    for i in 0..=ticks {
        let value = step * i as f64;
        let y = y_of(value);
        canvas.line(plot_left, y, plot_left + plot_w, y, GRID_COLOR, 1.0);
        canvas.text(
            plot_left - 8.0,
            y + 4.0,
            &format_tick(value),
            TextStyle::new(12.0)
                .color(AXIS_TEXT_COLOR)
                .anchor(Anchor::End),
        );
    }

    let y_title_x = 24.0;
    let y_title_y = plot_top + plot_h / 2.0;
    canvas.text(
        y_title_x,
        y_title_y,
        Y_AXIS_TITLE,
        TextStyle::new(12.0)
            .color(AXIS_TEXT_COLOR)
            .anchor(Anchor::Middle)
            .rotate(-90.0),
    );

    let slots = report.groups.len().max(1) as f64;
    let slot_w = plot_w / slots;
    let box_w = (slot_w * 0.45).min(120.0);
    let half = box_w / 2.0;

    for (idx, group) in report.groups.iter().enumerate() {
        let stats = group.stats();
        let color = group.display.color;
        let center = plot_left + slot_w * (idx as f64 + 0.5);

        // Whiskers
        canvas.line(center, y_of(stats.lower_whisker), center, y_of(stats.q1), color, 1.5);
        canvas.line(center, y_of(stats.q3), center, y_of(stats.upper_whisker), color, 1.5);
        for cap in [stats.lower_whisker, stats.upper_whisker] {
            canvas.line(center - half / 2.0, y_of(cap), center + half / 2.0, y_of(cap), color, 1.5);
        }

        // Box and median
        let tooltip = format!(
            "{}: median {:.1}, q1 {:.1}, q3 {:.1} min",
            group.display.label, stats.median, stats.q1, stats.q3
        );
        canvas.rect(
            center - half,
            y_of(stats.q3),
            box_w,
            (y_of(stats.q1) - y_of(stats.q3)).max(1.0),
            color,
            0.5,
            Some(color),
            Some(&tooltip),
        );
        canvas.line(center - half, y_of(stats.median), center + half, y_of(stats.median), color, 2.0);

        // All points, offset to the left of the box
        let points_center = center + POINT_POS * half;
        for (i, minutes) in group.minutes.iter().enumerate() {
            let x = points_center + jitter_offset(i) * JITTER * box_w;
            let label = format!("{:.1} min", minutes);
            canvas.circle(x, y_of(*minutes), 3.0, color, 0.8, Some(&label));
        }

        canvas.text(
            center,
            plot_bottom + 22.0,
            &group.display.label,
            TextStyle::new(12.0)
                .color(AXIS_TEXT_COLOR)
                .anchor(Anchor::Middle),
        );
    }

    canvas.line(plot_left, plot_bottom, plot_left + plot_w, plot_bottom, AXIS_TEXT_COLOR, 1.0);

    canvas.finish()
}

/// Deterministic offset in `[-0.5, 0.5)` for the `i`-th point.
fn jitter_offset(i: usize) -> f64 {
    const GOLDEN: f64 = 0.618_033_988_749_895;
    ((i as f64 + 1.0) * GOLDEN).fract() - 0.5
}

/// Tick step and axis maximum covering `max` with roughly five ticks.
fn nice_axis(max: f64) -> (f64, f64) {
    if max <= 0.0 || !max.is_finite() {
        return (1.0, 1.0);
    }

    let raw = max / 5.0;
    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let nice = if normalized <= 1.0 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    };

    let step = nice * magnitude;
    let top = (max / step).ceil() * step;
    // Leave headroom when the largest value sits on the top gridline
    let top = if top - max < step * 0.05 { top + step } else { top };
    (step, top)
}

fn format_tick(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{}", value.round() as i64)
    } else {
        format!("{:.1}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregate_durations;
    use crate::models::DateRange;
    use crate::report::svg::looks_like_svg;
    use crate::timelog::parse_log;
    use chrono::NaiveDate;

    fn fixture_report() -> DurationReport {
        let entries = parse_log(include_str!("../../fixtures/timing-log.jsonl")).unwrap();
        let range = DateRange::new(None, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
        aggregate_durations(&entries, &range).unwrap()
    }

    fn layout() -> ChartLayout {
        ChartLayout {
            width: 800,
            height: 500,
            font_family: "Arial".to_string(),
        }
    }

    #[test]
    fn test_plotly_traces_follow_groups() {
        let figure = duration_figure(&fixture_report(), &layout());
        let traces = figure.plotly["data"].as_array().unwrap();

        let names: Vec<_> = traces.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(
            names,
            vec!["Iteration Start", "Synthesis", "Requirements", "Release", "/status"]
        );
        assert_eq!(traces[4]["marker"]["color"], "#888888");
        assert_eq!(traces[0]["boxpoints"], "all");
        assert_eq!(figure.plotly["layout"]["showlegend"], false);
        assert_eq!(figure.plotly["layout"]["width"], 800);
    }

    #[test]
    fn test_svg_contains_points_and_labels() {
        let figure = duration_figure(&fixture_report(), &layout());

        assert!(looks_like_svg(&figure.svg));
        assert!(figure.svg.contains(TITLE));
        assert!(figure.svg.contains("All time"));
        assert!(figure.svg.contains("Iteration Start"));
        assert!(figure.svg.contains("<title>25.0 min</title>"));
        // 4 + 2 + 2 + 1 + 1 positive durations
        assert_eq!(figure.svg.matches("<circle").count(), 10);
    }

    #[test]
    fn test_nice_axis() {
        assert_eq!(nice_axis(0.0), (1.0, 1.0));
        assert_eq!(nice_axis(23.0), (5.0, 25.0));
        assert_eq!(nice_axis(25.0), (5.0, 30.0));
        let (step, top) = nice_axis(0.8);
        assert!((step - 0.2).abs() < 1e-9);
        assert!(top >= 0.8);
    }

    #[test]
    fn test_jitter_offsets_in_range() {
        for i in 0..100 {
            let offset = jitter_offset(i);
            assert!((-0.5..0.5).contains(&offset));
        }
    }
}
