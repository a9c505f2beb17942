//! Lifecycle Sankey diagram.

use super::figure::Figure;
use super::svg::{Anchor, SvgCanvas, TextStyle};
use super::ChartLayout;
use crate::analysis::{FlowGraph, FunnelReport};
use serde_json::{json, Value};

pub const TITLE: &str = "Iteration Lifecycle Flow";

const NODE_PAD: f64 = 20.0;
const NODE_THICKNESS: f64 = 30.0;
const COLUMNS: usize = 4;

const MARGIN_X: f64 = 30.0;
const MARGIN_TOP: f64 = 80.0;
const MARGIN_BOTTOM: f64 = 70.0;

const LABEL_COLOR: &str = "#2a3f5f";
const ANNOTATION_COLOR: &str = "gray";

/// Build the Sankey figure with the per-iteration status annotation.
pub fn funnel_figure(report: &FunnelReport, layout: &ChartLayout) -> Figure {
    let graph = report.flow_graph();
    let subtitle = format!(
        "{} iterations ({})",
        report.total_iterations(),
        report.range
    );
    let annotation = report.status_line();

    Figure {
        title: TITLE.to_string(),
        svg: render_svg(&graph, layout, &subtitle, &annotation),
        plotly: plotly_figure(&graph, layout, &subtitle, &annotation),
        subtitle,
        width: layout.width,
        height: layout.height,
    }
}

fn plotly_figure(graph: &FlowGraph, layout: &ChartLayout, subtitle: &str, annotation: &str) -> Value {
    let labels: Vec<&str> = graph.nodes.iter().map(|n| n.label.as_str()).collect();
    let colors: Vec<&str> = graph.nodes.iter().map(|n| n.color).collect();

    json!({
        "data": [{
            "type": "sankey",
            "node": {
                "pad": NODE_PAD,
                "thickness": NODE_THICKNESS,
                "line": {"color": "white", "width": 1},
                "label": labels,
                "color": colors,
            },
            "link": {
                "source": graph.links.iter().map(|l| l.source).collect::<Vec<_>>(),
                "target": graph.links.iter().map(|l| l.target).collect::<Vec<_>>(),
                "value": graph.links.iter().map(|l| l.value).collect::<Vec<_>>(),
                "color": graph.links.iter().map(|l| l.color).collect::<Vec<_>>(),
            },
        }],
        "layout": {
            "title": {
                "text": format!("{}<br><sup>{}</sup>", TITLE, subtitle),
                "font": {"size": 18},
            },
            "font": {"size": 12, "family": layout.font_family},
            "height": layout.height,
            "width": layout.width,
            "annotations": [{
                "text": annotation,
                "x": 0.5,
                "y": -0.1,
                "xref": "paper",
                "yref": "paper",
                "showarrow": false,
                "font": {"size": 10, "color": ANNOTATION_COLOR},
            }],
        },
    })
}

/// Vertical extent of a placed node.
#[derive(Debug, Clone, Copy, PartialEq)]
struct NodeBox {
    x: f64,
    y: f64,
    height: f64,
}

/// Node sizes: the largest of the node's own value, inflow and outflow.
fn node_values(graph: &FlowGraph) -> Vec<u64> {
    let mut inflow = vec![0u64; graph.nodes.len()];
    let mut outflow = vec![0u64; graph.nodes.len()];
    for link in &graph.links {
        outflow[link.source] += link.value;
        inflow[link.target] += link.value;
    }

    graph
        .nodes
        .iter()
        .enumerate()
        .map(|(i, node)| node.value.max(inflow[i]).max(outflow[i]))
        .collect()
}

/// Stack nodes per column, scaled so the fullest column fits `plot_h`.
///
/// Zero-valued nodes are not placed.
fn layout_nodes(graph: &FlowGraph, left: f64, top: f64, plot_w: f64, plot_h: f64) -> (Vec<Option<NodeBox>>, f64) {
    let values = node_values(graph);

    let mut scale = f64::INFINITY;
    for column in 0..COLUMNS {
        let members: Vec<u64> = graph
            .nodes
            .iter()
            .enumerate()
            .filter(|(i, n)| n.column == column && values[*i] > 0)
            .map(|(i, _)| values[i])
            .collect();
        if members.is_empty() {
            continue;
        }
        let total: u64 = members.iter().sum();
        let room = (plot_h - NODE_PAD * (members.len() - 1) as f64).max(1.0);
        scale = scale.min(room / total as f64);
    }
    if !scale.is_finite() {
        scale = 0.0;
    }

    let column_step = (plot_w - NODE_THICKNESS).max(0.0) / (COLUMNS - 1) as f64;
    let mut boxes = vec![None; graph.nodes.len()];

    for column in 0..COLUMNS {
        let members: Vec<usize> = (0..graph.nodes.len())
            .filter(|i| graph.nodes[*i].column == column && values[*i] > 0)
            .collect();
        if members.is_empty() {
            continue;
        }

        let used: f64 = members.iter().map(|i| values[*i] as f64 * scale).sum::<f64>()
            + NODE_PAD * (members.len() - 1) as f64;
        let mut y = top + (plot_h - used).max(0.0) / 2.0;
        let x = left + column_step * column as f64;

        for i in members {
            let height = values[i] as f64 * scale;
            boxes[i] = Some(NodeBox { x, y, height });
            y += height + NODE_PAD;
        }
    }

    (boxes, scale)
}

fn render_svg(graph: &FlowGraph, layout: &ChartLayout, subtitle: &str, annotation: &str) -> String {
    let mut canvas = SvgCanvas::new(layout.width, layout.height, &layout.font_family);

    let plot_w = (canvas.width() - 2.0 * MARGIN_X).max(1.0);
    let plot_h = (canvas.height() - MARGIN_TOP - MARGIN_BOTTOM).max(1.0);

    canvas.text(MARGIN_X, 32.0, TITLE, TextStyle::new(18.0));
    canvas.text(
        MARGIN_X,
        54.0,
        subtitle,
        TextStyle::new(12.0).color(LABEL_COLOR),
    );

    let (boxes, scale) = layout_nodes(graph, MARGIN_X, MARGIN_TOP, plot_w, plot_h);

    // Bands first so nodes are drawn over their ends
    let mut out_cursor: Vec<f64> = boxes.iter().map(|b| b.map_or(0.0, |b| b.y)).collect();
    let mut in_cursor = out_cursor.clone();

    for link in &graph.links {
        let (Some(src), Some(dst)) = (boxes[link.source], boxes[link.target]) else {
            continue;
        };
        let band = link.value as f64 * scale;
        let x0 = src.x + NODE_THICKNESS;
        let x1 = dst.x;
        let xm = (x0 + x1) / 2.0;
        let y0 = out_cursor[link.source];
        let y1 = in_cursor[link.target];
        out_cursor[link.source] += band;
        in_cursor[link.target] += band;

        let d = format!(
            "M{x0:.2},{y0:.2} C{xm:.2},{y0:.2} {xm:.2},{y1:.2} {x1:.2},{y1:.2} L{x1:.2},{y1b:.2} C{xm:.2},{y1b:.2} {xm:.2},{y0b:.2} {x0:.2},{y0b:.2} Z",
            y0b = y0 + band,
            y1b = y1 + band,
        );
        let tooltip = format!(
            "{} → {}: {}",
            graph.nodes[link.source].label, graph.nodes[link.target].label, link.value
        );
        canvas.path(&d, link.color, Some(&tooltip));
    }

    let last_column_x = MARGIN_X + plot_w - NODE_THICKNESS;
    for (node, placed) in graph.nodes.iter().zip(&boxes) {
        let Some(b) = placed else {
            continue;
        };
        canvas.rect(b.x, b.y, NODE_THICKNESS, b.height, node.color, 1.0, Some("white"), Some(&node.label));

        let label_y = b.y + b.height / 2.0 + 4.0;
        if b.x >= last_column_x - 0.5 {
            canvas.text(
                b.x - 6.0,
                label_y,
                &node.label,
                TextStyle::new(12.0).color(LABEL_COLOR).anchor(Anchor::End),
            );
        } else {
            canvas.text(
                b.x + NODE_THICKNESS + 6.0,
                label_y,
                &node.label,
                TextStyle::new(12.0).color(LABEL_COLOR),
            );
        }
    }

    canvas.text(
        canvas.width() / 2.0,
        canvas.height() - 24.0,
        annotation,
        TextStyle::new(10.0)
            .color(ANNOTATION_COLOR)
            .anchor(Anchor::Middle),
    );

    canvas.finish()
}
