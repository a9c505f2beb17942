//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.timing-report.toml` files.

use crate::report::ChartLayout;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".timing-report.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Output rendering settings.
    #[serde(default)]
    pub render: RenderConfig,

    /// Duration box plot settings.
    #[serde(default = "ChartConfig::duration")]
    pub duration: ChartConfig,

    /// Lifecycle funnel settings.
    #[serde(default = "ChartConfig::funnel")]
    pub funnel: ChartConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            render: RenderConfig::default(),
            duration: ChartConfig::duration(),
            funnel: ChartConfig::funnel(),
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Path of the timing log.
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// Directory for chart files. Defaults to the log's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            output_dir: None,
        }
    }
}

fn default_log_file() -> PathBuf {
    PathBuf::from("timing-log.jsonl")
}

/// Settings shared by every output file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Raster scale of the PNG relative to the chart size.
    #[serde(default = "default_png_scale")]
    pub png_scale: f32,

    /// Font family for all chart text.
    #[serde(default = "default_font_family")]
    pub font_family: String,

    /// Plotly.js script loaded by the HTML output.
    #[serde(default = "default_plotly_js_url")]
    pub plotly_js_url: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            png_scale: default_png_scale(),
            font_family: default_font_family(),
            plotly_js_url: default_plotly_js_url(),
        }
    }
}

fn default_png_scale() -> f32 {
    2.0
}

fn default_font_family() -> String {
    "Arial".to_string()
}

fn default_plotly_js_url() -> String {
    "https://cdn.plot.ly/plotly-2.35.2.min.js".to_string()
}

/// Size and file name of one chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    /// File name without extension.
    pub output_stem: String,
}

impl ChartConfig {
    fn duration() -> Self {
        Self {
            width: 800,
            height: 500,
            output_stem: "duration_chart".to_string(),
        }
    }

    fn funnel() -> Self {
        Self {
            width: 900,
            height: 500,
            output_stem: "lifecycle_funnel".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref log) = args.log {
            self.general.log_file = log.clone();
        }
        if let Some(ref dir) = args.output_dir {
            self.general.output_dir = Some(dir.clone());
        }
    }

    /// Reject settings that cannot produce a chart.
    pub fn validate(&self) -> Result<()> {
        if !(self.render.png_scale > 0.0 && self.render.png_scale.is_finite()) {
            bail!("png_scale must be a positive number, got {}", self.render.png_scale);
        }

        for (name, chart) in [("duration", &self.duration), ("funnel", &self.funnel)] {
            if chart.width == 0 || chart.height == 0 {
                bail!("[{}] width and height must be at least 1", name);
            }
            if chart.output_stem.trim().is_empty() {
                bail!("[{}] output_stem must not be empty", name);
            }
        }

        Ok(())
    }

    /// Directory the chart files are written to.
    pub fn output_dir(&self) -> PathBuf {
        if let Some(ref dir) = self.general.output_dir {
            return dir.clone();
        }

        match self.general.log_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Canvas settings for a chart.
    pub fn layout(&self, chart: &ChartConfig) -> ChartLayout {
        ChartLayout {
            width: chart.width,
            height: chart.height,
            font_family: self.render.font_family.clone(),
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
