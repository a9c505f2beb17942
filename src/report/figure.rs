//! A rendered chart and its three output encodings.
//!
//! The SVG document is the source of truth for the static outputs: the PNG
//! is rasterized from it. The HTML document draws the same chart with
//! Plotly.js from the embedded figure JSON, and shows the SVG when the
//! script cannot be loaded.

use anyhow::{anyhow, Context, Result};
use resvg::{tiny_skia, usvg};
use serde_json::Value;

/// A chart ready to be written out.
#[derive(Debug, Clone)]
pub struct Figure {
    pub title: String,
    pub subtitle: String,
    pub width: u32,
    pub height: u32,
    /// Complete SVG document.
    pub svg: String,
    /// Plotly figure: `{"data": [...], "layout": {...}}`.
    pub plotly: Value,
}

impl Figure {
    /// Interactive HTML page loading Plotly.js from `plotly_js_url`.
    pub fn to_html(&self, plotly_js_url: &str) -> Result<String> {
        let figure_json =
            serde_json::to_string(&self.plotly).context("Failed to serialize chart figure")?;
        // A literal `</script>` inside the payload would end the script block
        let figure_json = figure_json.replace("</", "<\\/");

        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        html.push_str("<meta charset=\"utf-8\">\n");
        html.push_str(&format!(
            "<title>{}</title>\n",
            super::svg::xml_escape(&self.title)
        ));
        html.push_str(&format!(
            "<script src=\"{}\" charset=\"utf-8\"></script>\n",
            super::svg::xml_escape(plotly_js_url)
        ));
        html.push_str("</head>\n<body>\n");
        // The static chart stays in place unless Plotly.js actually loaded
        html.push_str(&format!(
            "<div id=\"chart\" style=\"width:{}px;height:{}px;\">\n",
            self.width, self.height
        ));
        html.push_str(&self.svg);
        html.push_str("\n</div>\n");
        html.push_str("<script>\n");
        html.push_str(&format!("const figure = {};\n", figure_json));
        html.push_str("if (typeof Plotly !== \"undefined\") {\n");
        html.push_str("  const chart = document.getElementById(\"chart\");\n");
        html.push_str("  chart.innerHTML = \"\";\n");
        html.push_str(
            "  Plotly.newPlot(chart, figure.data, figure.layout, {responsive: true});\n",
        );
        html.push_str("}\n");
        html.push_str("</script>\n</body>\n</html>\n");

        Ok(html)
    }

    /// Rasterize the SVG at `scale` times its nominal size.
    pub fn to_png(&self, scale: f32) -> Result<Vec<u8>> {
        rasterize_svg(&self.svg, scale)
    }
}

/// Render an SVG document to PNG bytes on a white background.
pub fn rasterize_svg(svg: &str, scale: f32) -> Result<Vec<u8>> {
    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &options).context("Failed to parse chart SVG")?;
    let size = tree
        .size()
        .to_int_size()
        .scale_by(scale)
        .ok_or_else(|| anyhow!("Invalid PNG scale: {}", scale))?;

    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow!("Cannot allocate {}x{} image", size.width(), size.height()))?;
    pixmap.fill(tiny_skia::Color::WHITE);

    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    pixmap.encode_png().context("Failed to encode PNG")
}
