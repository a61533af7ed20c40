//! Editor configuration.
//!
//! Every field has a default so a partial JSON object (or none at all) is a
//! valid configuration. Environment variables override individual fields:
//!
//! - `LIVERY_DATA_DIR`: directory holding the saved slot
//! - `LIVERY_TEXTURE_SIZE`: rasterized texture side in pixels
//! - `LIVERY_DEBOUNCE_MS`: resync quiescence window in milliseconds

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::CANVAS_SIZE;

/// Default rasterized texture side in pixels.
pub const DEFAULT_TEXTURE_SIZE: u32 = 4096;

/// Default on-screen size of the authoring surface in pixels.
pub const DEFAULT_DISPLAY_SIZE: f32 = 512.0;

/// Default bound for the longer side of an inserted image, in canvas units.
pub const DEFAULT_MAX_IMAGE_DIMENSION: f32 = 1024.0;

/// Default resync quiescence window in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 50;

/// Labels of overlay layers that never reach the texture.
pub const DEFAULT_EXCLUDE_LABELS: [&str; 7] = [
    "stencil_left",
    "stencil_right",
    "stencil_front",
    "stencil_back",
    "stencil_lid",
    "frame",
    "selection-rect",
];

/// Whether authoring actions are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    /// Full authoring.
    #[default]
    Full,
    /// View and sync only; authoring actions are ignored.
    Basic,
}

/// Configuration for an editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Side of the square canvas in canvas units.
    pub canvas_size: f32,
    /// Rasterized texture side in pixels.
    pub texture_size: u32,
    /// On-screen size of the authoring surface in pixels.
    pub display_size: f32,
    /// Bound for the longer side of an inserted image.
    pub max_image_dimension: f32,
    /// Resync quiescence window in milliseconds.
    pub debounce_ms: u64,
    /// Layer labels and ids stripped from the serialized texture.
    pub exclude_labels: Vec<String>,
    /// Directory for the saved slot. `None` keeps saves in memory.
    pub data_dir: Option<PathBuf>,
    /// Authoring mode.
    pub mode: EditorMode,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas_size: CANVAS_SIZE,
            texture_size: DEFAULT_TEXTURE_SIZE,
            display_size: DEFAULT_DISPLAY_SIZE,
            max_image_dimension: DEFAULT_MAX_IMAGE_DIMENSION,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            exclude_labels: DEFAULT_EXCLUDE_LABELS
                .iter()
                .map(|label| (*label).to_string())
                .collect(),
            data_dir: None,
            mode: EditorMode::Full,
        }
    }
}

impl EditorConfig {
    /// Defaults overlaid with environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Parse a host-provided JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup. Unparseable values are ignored
    /// with a warning.
    #[must_use]
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup("LIVERY_DATA_DIR").filter(|v| !v.is_empty()) {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(raw) = lookup("LIVERY_TEXTURE_SIZE") {
            match raw.parse::<u32>() {
                Ok(size) if size > 0 => self.texture_size = size,
                _ => tracing::warn!("Ignoring invalid LIVERY_TEXTURE_SIZE: {raw}"),
            }
        }
        if let Some(raw) = lookup("LIVERY_DEBOUNCE_MS") {
            match raw.parse::<u64>() {
                Ok(ms) => self.debounce_ms = ms,
                Err(_) => tracing::warn!("Ignoring invalid LIVERY_DEBOUNCE_MS: {raw}"),
            }
        }
        self
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] naming the first offending field.
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.canvas_size.is_finite() && self.canvas_size > 0.0) {
            return Err(CoreError::Config("canvas_size must be positive".to_string()));
        }
        if self.texture_size == 0 {
            return Err(CoreError::Config("texture_size must be positive".to_string()));
        }
        if !(self.display_size.is_finite() && self.display_size > 0.0) {
            return Err(CoreError::Config("display_size must be positive".to_string()));
        }
        if !(self.max_image_dimension.is_finite() && self.max_image_dimension > 0.0) {
            return Err(CoreError::Config(
                "max_image_dimension must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Resync quiescence window.
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
