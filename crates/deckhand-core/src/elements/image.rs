//! Image element payload.

use serde::{Deserialize, Serialize};

/// An image referenced by URL or data URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub src: String,
    #[serde(default)]
    pub alt: String,
}

impl Image {
    /// Create an image with no alt text.
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            alt: String::new(),
        }
    }
}
