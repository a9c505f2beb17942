//! Chart file output.
//!
//! Every figure is written three ways: a PNG raster, an SVG vector image and
//! an interactive HTML document. All three are rendered in memory before
//! the first file is written.

use super::figure::Figure;
use super::svg::looks_like_svg;
use crate::config::RenderConfig;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Paths of the files written for one chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub png: PathBuf,
    pub svg: PathBuf,
    pub html: PathBuf,
}

impl ArtifactPaths {
    /// `<dir>/<stem>.{png,svg,html}`.
    pub fn new(dir: &Path, stem: &str) -> Self {
        Self {
            png: dir.join(format!("{}.png", stem)),
            svg: dir.join(format!("{}.svg", stem)),
            html: dir.join(format!("{}.html", stem)),
        }
    }

    pub fn all(&self) -> [&Path; 3] {
        [&self.png, &self.svg, &self.html]
    }
}

/// Render and write the PNG, SVG and HTML files of a figure.
///
/// The returned paths are absolute.
pub fn write_artifacts(
    figure: &Figure,
    dir: &Path,
    stem: &str,
    render: &RenderConfig,
) -> Result<ArtifactPaths> {
    debug!(
        "Rendering {} - {} ({}x{})",
        figure.title, figure.subtitle, figure.width, figure.height
    );
    if !looks_like_svg(&figure.svg) {
        bail!("{} did not produce a complete SVG document", figure.title);
    }
    let png = figure
        .to_png(render.png_scale)
        .with_context(|| format!("Failed to render {} PNG", figure.title))?;
    let html = figure.to_html(&render.plotly_js_url)?;

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    let dir = std::fs::canonicalize(dir)
        .with_context(|| format!("Failed to resolve output directory {}", dir.display()))?;
    let paths = ArtifactPaths::new(&dir, stem);

    write_file(&paths.png, &png)?;
    write_file(&paths.svg, figure.svg.as_bytes())?;
    write_file(&paths.html, html.as_bytes())?;

    info!("Wrote {} chart files to {}", figure.title, dir.display());
    Ok(paths)
}

fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))
}
