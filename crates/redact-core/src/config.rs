//! Editor configuration
//!
//! Loaded from TOML. Every section and field is optional; an empty file
//! yields [`EditorConfig::default`].

use crate::raster::Rgb;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub draw: DrawConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl EditorConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the TOML is malformed
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    ///
    /// ```
    /// use redact_core::config::{EditorConfig, HistoryScope};
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let config = EditorConfig::from_str(r#"
    ///     [history]
    ///     scope = "retain"
    /// "#)?;
    /// assert_eq!(config.history.scope, HistoryScope::Retain);
    /// # Ok(())
    /// # }
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }

    /// Pixel width pages are rendered at
    pub fn target_width(&self) -> u32 {
        self.render
            .display_width
            .saturating_sub(self.render.width_margin)
            .max(1)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.draw.tick_interval_ms.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Available display width in pixels (default: 1280)
    #[serde(default = "default_display_width")]
    pub display_width: u32,
    /// Pixels kept free beside the page (default: 50)
    #[serde(default = "default_width_margin")]
    pub width_margin: u32,
    /// Render every page right after load (default: true)
    #[serde(default = "default_true")]
    pub preload_all: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            display_width: default_display_width(),
            width_margin: default_width_margin(),
            preload_all: true,
        }
    }
}

fn default_display_width() -> u32 {
    1280
}

fn default_width_margin() -> u32 {
    50
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawConfig {
    /// Period of the draw tick (default: 16ms)
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Mark colour (default: black)
    #[serde(default)]
    pub fill: Rgb,
    /// Opacity of the live preview rectangle (default: 0.5)
    #[serde(default = "default_preview_alpha")]
    pub preview_alpha: f32,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            fill: Rgb::BLACK,
            preview_alpha: default_preview_alpha(),
        }
    }
}

fn default_tick_interval_ms() -> u64 {
    16
}

fn default_preview_alpha() -> f32 {
    0.5
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default)]
    pub scope: HistoryScope,
}

/// What happens to a page's undo/redo stacks when the user navigates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryScope {
    /// Marks stay on the page but can no longer be undone
    #[default]
    ResetOnNavigate,
    /// Each page keeps its stacks for the life of the document
    Retain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_vector_filename")]
    pub vector_filename: String,
    #[serde(default = "default_flattened_filename")]
    pub flattened_filename: String,
    /// Raster resolution assumed when sizing flattened pages (default: 96)
    #[serde(default = "default_flatten_dpi")]
    pub flatten_dpi: f64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            vector_filename: default_vector_filename(),
            flattened_filename: default_flattened_filename(),
            flatten_dpi: default_flatten_dpi(),
        }
    }
}

fn default_vector_filename() -> String {
    "redacted.pdf".to_string()
}

fn default_flattened_filename() -> String {
    "download.pdf".to_string()
}

fn default_flatten_dpi() -> f64 {
    96.0
}
