//! Minimal SVG document builder shared by both charts.

/// Horizontal anchoring of a text element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    fn as_str(&self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        }
    }
}

/// Styling of a text element.
#[derive(Debug, Clone, Copy)]
pub struct TextStyle<'a> {
    pub size: f64,
    pub color: &'a str,
    pub anchor: Anchor,
    /// Rotation in degrees around the text origin.
    pub rotate: Option<f64>,
}

impl<'a> TextStyle<'a> {
    pub fn new(size: f64) -> Self {
        Self {
            size,
            color: "#2a3f5f",
            anchor: Anchor::Start,
            rotate: None,
        }
    }

    pub fn color(mut self, color: &'a str) -> Self {
        self.color = color;
        self
    }

    pub fn anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn rotate(mut self, degrees: f64) -> Self {
        self.rotate = Some(degrees);
        self
    }
}

/// An SVG document under construction.
#[derive(Debug, Clone)]
pub struct SvgCanvas {
    width: u32,
    height: u32,
    font_family: String,
    body: String,
}

impl SvgCanvas {
    pub fn new(width: u32, height: u32, font_family: &str) -> Self {
        Self {
            width,
            height,
            font_family: font_family.to_string(),
            body: String::new(),
        }
    }

    pub fn width(&self) -> f64 {
        self.width as f64
    }

    pub fn height(&self) -> f64 {
        self.height as f64
    }

    /// Filled rectangle with an optional outline and hover text.
    #[allow(clippy::too_many_arguments)]
    pub fn rect(
        &mut self,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        fill: &str,
        fill_opacity: f64,
        stroke: Option<&str>,
        tooltip: Option<&str>,
    ) {
        let stroke_attr = match stroke {
            Some(color) => format!(" stroke=\"{}\" stroke-width=\"1\"", color),
            None => String::new(),
        };
        self.body.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\" fill-opacity=\"{:.2}\"{}>{}</rect>",
            x,
            y,
            w.max(0.0),
            h.max(0.0),
            fill,
            fill_opacity,
            stroke_attr,
            tooltip_element(tooltip)
        ));
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: &str, width: f64) {
        self.body.push_str(&format!(
            "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"{:.2}\"/>",
            x1, y1, x2, y2, stroke, width
        ));
    }

    pub fn circle(&mut self, cx: f64, cy: f64, r: f64, fill: &str, opacity: f64, tooltip: Option<&str>) {
        self.body.push_str(&format!(
            "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"{}\" fill-opacity=\"{:.2}\">{}</circle>",
            cx,
            cy,
            r,
            fill,
            opacity,
            tooltip_element(tooltip)
        ));
    }

    /// Filled path. `fill` may be any CSS color, including `rgba(...)`.
    pub fn path(&mut self, d: &str, fill: &str, tooltip: Option<&str>) {
        let (color, opacity) = split_rgba(fill);
        self.body.push_str(&format!(
            "<path d=\"{}\" fill=\"{}\" fill-opacity=\"{}\">{}</path>",
            d,
            color,
            opacity,
            tooltip_element(tooltip)
        ));
    }

    pub fn text(&mut self, x: f64, y: f64, content: &str, style: TextStyle<'_>) {
        let transform = match style.rotate {
            Some(deg) => format!(" transform=\"rotate({:.1} {:.2} {:.2})\"", deg, x, y),
            None => String::new(),
        };
        self.body.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" font-size=\"{:.1}\" fill=\"{}\" text-anchor=\"{}\"{}>{}</text>",
            x,
            y,
            style.size,
            style.color,
            style.anchor.as_str(),
            transform,
            xml_escape(content)
        ));
    }

    /// Close the document on a white background.
    pub fn finish(self) -> String {
        let mut svg = String::new();
        svg.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" font-family=\"{font}\">",
            w = self.width,
            h = self.height,
            font = xml_escape(&self.font_family)
        ));
        svg.push_str(&format!(
            "<rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" fill=\"#ffffff\"/>",
            self.width, self.height
        ));
        svg.push_str(&self.body);
        svg.push_str("</svg>");
        svg
    }
}

fn tooltip_element(tooltip: Option<&str>) -> String {
    match tooltip {
        Some(text) => format!("<title>{}</title>", xml_escape(text)),
        None => String::new(),
    }
}

/// Split `rgba(r, g, b, a)` into `rgb(r, g, b)` and `a`; other colors are
/// returned as-is with full opacity.
fn split_rgba(color: &str) -> (String, String) {
    let inner = color
        .trim()
        .strip_prefix("rgba(")
        .and_then(|rest| rest.strip_suffix(')'));

    if let Some(inner) = inner {
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        if parts.len() == 4 {
            return (
                format!("rgb({}, {}, {})", parts[0], parts[1], parts[2]),
                parts[3].to_string(),
            );
        }
    }

    (color.to_string(), "1".to_string())
}

pub fn xml_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Does the string look like a complete SVG document?
pub fn looks_like_svg(svg: &str) -> bool {
    let trimmed = svg.trim();
    trimmed.starts_with("<svg") && trimmed.ends_with("</svg>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_escape() {
        assert_eq!(xml_escape("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
    }

    #[test]
    fn test_split_rgba() {
        let (color, alpha) = split_rgba("rgba(34, 86, 124, 0.4)");
        assert_eq!(color, "rgb(34, 86, 124)");
        assert_eq!(alpha, "0.4");

        let (color, alpha) = split_rgba("#cccccc");
        assert_eq!(color, "#cccccc");
        assert_eq!(alpha, "1");
    }

    #[test]
    fn test_canvas_document() {
        let mut canvas = SvgCanvas::new(200, 100, "Arial");
        canvas.rect(10.0, 10.0, 50.0, 20.0, "#1795d4", 0.5, Some("#1795d4"), Some("box"));
        canvas.text(5.0, 95.0, "Iteration <Start>", TextStyle::new(12.0).rotate(-90.0));
        let svg = canvas.finish();

        assert!(looks_like_svg(&svg));
        assert!(svg.contains("viewBox=\"0 0 200 100\""));
        assert!(svg.contains("<title>box</title>"));
        assert!(svg.contains("Iteration &lt;Start&gt;"));
        assert!(svg.contains("transform=\"rotate(-90.0 5.00 95.00)\""));
    }
}
