//! Editor configuration.
//!
//! Every field has a default, so a partial JSON document only needs to
//! name the values it overrides.

use crate::timing::Duration;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level configuration for one editor session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub history: HistoryConfig,
    pub guides: GuideConfig,
    pub sync: SyncConfig,
    pub thumbnail: ThumbnailConfig,
    pub canvas: CanvasConfig,
}

impl EditorConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize the configuration to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Undo history limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of entries kept in the undo stack.
    pub max_stack_size: usize,
    /// Window in which same-key pushes merge into one undo step.
    pub coalesce_window_ms: u64,
}

impl HistoryConfig {
    /// Get the coalescing window.
    pub fn coalesce_window(&self) -> Duration {
        Duration::from_millis(self.coalesce_window_ms)
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_stack_size: 200,
            coalesce_window_ms: 300,
        }
    }
}

/// Alignment guide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuideConfig {
    pub enabled: bool,
    /// Maximum distance (canvas units) at which a guide is considered.
    pub snap_threshold: f64,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            snap_threshold: 10.0,
        }
    }
}

/// Canvas-to-model sync timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub debounce_ms: u64,
    /// Delay of the forced sync that follows a slide switch.
    pub slide_switch_delay_ms: u64,
}

impl SyncConfig {
    /// Get the sync debounce delay.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Get the delay of the forced sync after a slide switch.
    pub fn slide_switch_delay(&self) -> Duration {
        Duration::from_millis(self.slide_switch_delay_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            slide_switch_delay_ms: 100,
        }
    }
}

/// Thumbnail output size and cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// Logical thumbnail width.
    pub width: u32,
    /// Logical thumbnail height.
    pub height: u32,
    /// Pixel density multiplier applied to width and height.
    pub scale: f64,
    pub debounce_ms: u64,
}

impl ThumbnailConfig {
    /// Get the capture debounce delay.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Raster size in pixels after applying `scale`.
    pub fn pixel_size(&self) -> (u32, u32) {
        let scale = if self.scale.is_finite() && self.scale > 0.0 {
            self.scale
        } else {
            1.0
        };
        (
            ((self.width as f64 * scale).round() as u32).max(1),
            ((self.height as f64 * scale).round() as u32).max(1),
        )
    }
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            width: 200,
            height: 112,
            scale: 2.0,
            debounce_ms: 500,
        }
    }
}

/// Logical slide canvas size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 540.0,
        }
    }
}
