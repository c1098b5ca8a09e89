//! Text element payload.

use super::SerializableColor;
use serde::{Deserialize, Serialize};

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// A text box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub content: String,
    /// Font size in slide units.
    pub font_size: f64,
    pub font_family: String,
    pub color: SerializableColor,
    #[serde(default)]
    pub align: TextAlign,
}

impl Text {
    /// Default font size for new text boxes.
    pub const DEFAULT_FONT_SIZE: f64 = 24.0;

    /// Create left-aligned black text at the default size.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            font_size: Self::DEFAULT_FONT_SIZE,
            font_family: "Inter".to_string(),
            color: SerializableColor::black(),
            align: TextAlign::default(),
        }
    }
}
