//! Deckhand Core Library
//!
//! Platform-agnostic editing core for the Deckhand slide editor: snapshot
//! undo history, alignment guides, debounced canvas sync and slide
//! thumbnails.

pub mod config;
pub mod deck;
pub mod editor;
pub mod elements;
pub mod guides;
pub mod history;
pub mod sync;
pub mod thumbnail;
pub mod timing;

pub use config::{ConfigError, EditorConfig};
pub use deck::{DeckError, Presentation, Slide, SlideDeck, SlideId, SlidePatch};
pub use editor::Editor;
pub use elements::{Element, ElementId, ElementKind, ElementType};
pub use guides::{Guide, GuideEngine, GuideOrientation, SnapInfo};
pub use history::{HistoryState, PushOptions, Snapshot, SnapshotStore};
pub use sync::{CanvasSyncBridge, DrawingSurface, MemorySurface, SurfaceEvent, SurfaceEventKind, SurfaceObject, SyncPhase};
pub use thumbnail::{CaptureError, CaptureRequest, RgbaImage, SlideCapture, SoftwareRasterizer, ThumbnailSync};
