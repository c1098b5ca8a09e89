//! Slide element definitions.
//!
//! An element is a rectangle of slide space plus a type-specific payload.
//! The editor core only reasons about the geometry; payloads are carried
//! through history and sync untouched.

mod chart;
mod image;
mod shape;
mod table;
mod text;

pub use chart::{Chart, ChartSeries, ChartType};
pub use image::Image;
pub use shape::{Shape, ShapeKind};
pub use table::Table;
pub use text::{Text, TextAlign};

use kurbo::{Point, Rect};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for elements.
pub type ElementId = Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    /// Create a color from RGBA components.
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque black.
    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    /// Opaque white.
    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    /// Fully transparent black.
    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Components as `[r, g, b, a]`.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Discriminant of [`ElementKind`], used where the payload is irrelevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    Text,
    Image,
    Shape,
    Chart,
    Table,
}

/// Type-specific element payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementKind {
    Text(Text),
    Image(Image),
    Shape(Shape),
    Chart(Chart),
    Table(Table),
}

impl ElementKind {
    /// Get the payload discriminant.
    pub fn element_type(&self) -> ElementType {
        match self {
            ElementKind::Text(_) => ElementType::Text,
            ElementKind::Image(_) => ElementType::Image,
            ElementKind::Shape(_) => ElementType::Shape,
            ElementKind::Chart(_) => ElementType::Chart,
            ElementKind::Table(_) => ElementType::Table,
        }
    }

    /// Copy the payload field by field for history storage.
    pub fn snapshot_copy(&self) -> Self {
        match self {
            ElementKind::Text(text) => ElementKind::Text(Text {
                content: text.content.clone(),
                font_size: text.font_size,
                font_family: text.font_family.clone(),
                color: text.color,
                align: text.align,
            }),
            ElementKind::Image(image) => ElementKind::Image(Image {
                src: image.src.clone(),
                alt: image.alt.clone(),
            }),
            ElementKind::Shape(shape) => ElementKind::Shape(Shape {
                shape: shape.shape,
                fill: shape.fill,
                stroke: shape.stroke,
                stroke_width: shape.stroke_width,
            }),
            ElementKind::Chart(chart) => ElementKind::Chart(Chart {
                chart_type: chart.chart_type,
                labels: chart.labels.clone(),
                series: chart
                    .series
                    .iter()
                    .map(|s| ChartSeries {
                        name: s.name.clone(),
                        values: s.values.clone(),
                    })
                    .collect(),
            }),
            ElementKind::Table(table) => ElementKind::Table(Table {
                rows: table.rows.iter().map(|row| row.to_vec()).collect(),
                header_row: table.header_row,
            }),
        }
    }
}

/// A positioned element on a slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    /// Left edge in slide coordinates.
    pub x: f64,
    /// Top edge in slide coordinates.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Rotation in degrees around the center.
    #[serde(default)]
    pub rotation: f64,
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl Element {
    /// Create an element with a fresh id.
    pub fn new(x: f64, y: f64, width: f64, height: f64, kind: ElementKind) -> Self {
        Self::with_id(Uuid::new_v4(), x, y, width, height, kind)
    }

    /// Reconstruct an element with a known id (for sync/storage).
    pub fn with_id(id: ElementId, x: f64, y: f64, width: f64, height: f64, kind: ElementKind) -> Self {
        Self {
            id,
            x,
            y,
            width,
            height,
            rotation: 0.0,
            kind,
        }
    }

    /// Get the element type.
    pub fn element_type(&self) -> ElementType {
        self.kind.element_type()
    }

    /// Bounding rectangle, ignoring rotation.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// Center of the bounding rectangle.
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// A copy of this element with its top-left corner at `(x, y)`.
    pub fn moved_to(&self, x: f64, y: f64) -> Self {
        let mut moved = self.clone();
        moved.x = x;
        moved.y = y;
        moved
    }

    /// Move the element by the given offset.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    /// Independent copy for history storage.
    pub fn snapshot_copy(&self) -> Self {
        Self {
            id: self.id,
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            rotation: self.rotation,
            kind: self.kind.snapshot_copy(),
        }
    }
}

/// Copy a whole element list for history storage.
pub fn snapshot_elements(elements: &[Element]) -> Vec<Element> {
    elements.iter().map(Element::snapshot_copy).collect()
}
