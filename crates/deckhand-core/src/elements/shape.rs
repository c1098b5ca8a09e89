//! Vector shape payload.

use super::SerializableColor;
use serde::{Deserialize, Serialize};

/// Geometry drawn inside the element bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Ellipse,
    Triangle,
    Line,
    Arrow,
}

/// A filled and/or stroked shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub shape: ShapeKind,
    /// Fill color (None = no fill).
    pub fill: Option<SerializableColor>,
    pub stroke: SerializableColor,
    pub stroke_width: f64,
}

impl Shape {
    /// Create an unfilled shape with a black outline.
    pub fn new(shape: ShapeKind) -> Self {
        Self {
            shape,
            fill: Some(SerializableColor::new(59, 130, 246, 255)),
            stroke: SerializableColor::black(),
            stroke_width: 0.0,
        }
    }
}
