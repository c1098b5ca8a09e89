//! Slide list and the in-memory presentation.

use crate::elements::{Element, SerializableColor};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for slides.
pub type SlideId = Uuid;

/// Slide list errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeckError {
    #[error("Slide index {index} out of range (len {len})")]
    SlideOutOfRange { index: usize, len: usize },
    #[error("Cannot remove the last slide")]
    LastSlide,
}

/// Result type for slide list operations.
pub type DeckResult<T> = Result<T, DeckError>;

/// One slide of a presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    pub id: SlideId,
    /// Elements in z-order (back to front).
    pub elements: Vec<Element>,
    pub background: SerializableColor,
    /// Encoded preview image (data URL), if one has been captured.
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub notes: String,
}

impl Default for Slide {
    fn default() -> Self {
        Self::new()
    }
}

impl Slide {
    /// A blank white slide.
    pub fn new() -> Self {
        Self::with_elements(Vec::new())
    }

    /// A blank white slide holding `elements`.
    pub fn with_elements(elements: Vec<Element>) -> Self {
        Self {
            id: Uuid::new_v4(),
            elements,
            background: SerializableColor::white(),
            thumbnail: None,
            notes: String::new(),
        }
    }

    /// Deep copy with fresh slide and element ids.
    pub fn duplicate(&self) -> Self {
        let elements = self
            .elements
            .iter()
            .map(|element| {
                let mut copy = element.snapshot_copy();
                copy.id = Uuid::new_v4();
                copy
            })
            .collect();
        Self {
            id: Uuid::new_v4(),
            elements,
            background: self.background,
            thumbnail: self.thumbnail.clone(),
            notes: self.notes.clone(),
        }
    }

    fn apply(&mut self, patch: SlidePatch) {
        if let Some(elements) = patch.elements {
            self.elements = elements;
        }
        if let Some(background) = patch.background {
            self.background = background;
        }
        if let Some(thumbnail) = patch.thumbnail {
            self.thumbnail = thumbnail;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
    }
}

/// Partial slide update; `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlidePatch {
    pub elements: Option<Vec<Element>>,
    pub background: Option<SerializableColor>,
    /// `Some(None)` clears the thumbnail.
    pub thumbnail: Option<Option<String>>,
    pub notes: Option<String>,
}

impl SlidePatch {
    /// Patch that replaces the element list.
    pub fn elements(elements: Vec<Element>) -> Self {
        Self {
            elements: Some(elements),
            ..Self::default()
        }
    }

    /// Patch that sets or clears the thumbnail.
    pub fn thumbnail(thumbnail: Option<String>) -> Self {
        Self {
            thumbnail: Some(thumbnail),
            ..Self::default()
        }
    }
}

/// Read/write access to an ordered slide list.
pub trait SlideDeck {
    /// All slides in order.
    fn slides(&self) -> &[Slide];

    /// Index of the active slide.
    fn current_index(&self) -> usize;

    /// Apply a partial update to the slide at `index`.
    fn update_slide(&mut self, index: usize, patch: SlidePatch) -> DeckResult<()>;

    /// Position of the slide with the given id.
    fn index_of(&self, id: SlideId) -> Option<usize> {
        self.slides().iter().position(|slide| slide.id == id)
    }

    fn current_slide(&self) -> Option<&Slide> {
        self.slides().get(self.current_index())
    }
}

/// In-memory presentation. Always holds at least one slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    pub id: String,
    pub name: String,
    slides: Vec<Slide>,
    current_index: usize,
}

impl Default for Presentation {
    fn default() -> Self {
        Self::new()
    }
}

impl Presentation {
    /// A presentation with one blank slide.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: "Untitled".to_string(),
            slides: vec![Slide::new()],
            current_index: 0,
        }
    }

    /// Build from existing slides; an empty list gets one blank slide.
    pub fn from_slides(slides: Vec<Slide>) -> Self {
        let mut presentation = Self::new();
        if !slides.is_empty() {
            presentation.slides = slides;
        }
        presentation
    }

    /// Number of slides.
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// Never true; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Get a slide by index.
    pub fn slide(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    /// Make the slide at `index` current.
    pub fn set_current(&mut self, index: usize) -> DeckResult<()> {
        self.check_index(index)?;
        self.current_index = index;
        Ok(())
    }

    /// Insert a blank slide after the current one and make it current.
    pub fn add_slide(&mut self) -> usize {
        self.insert_after_current(Slide::new())
    }

    /// Insert a copy of the slide at `index` right after it.
    pub fn duplicate_slide(&mut self, index: usize) -> DeckResult<usize> {
        self.check_index(index)?;
        let copy = self.slides[index].duplicate();
        self.slides.insert(index + 1, copy);
        self.current_index = index + 1;
        Ok(index + 1)
    }

    /// Remove a slide, keeping the current index valid.
    pub fn remove_slide(&mut self, index: usize) -> DeckResult<Slide> {
        self.check_index(index)?;
        if self.slides.len() == 1 {
            return Err(DeckError::LastSlide);
        }
        let removed = self.slides.remove(index);
        if self.current_index > index || self.current_index >= self.slides.len() {
            self.current_index = self.current_index.saturating_sub(1);
        }
        Ok(removed)
    }

    /// Move a slide; the current index follows the slide it pointed at.
    pub fn move_slide(&mut self, from: usize, to: usize) -> DeckResult<()> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from == to {
            return Ok(());
        }
        let current_id = self.slides[self.current_index].id;
        let slide = self.slides.remove(from);
        self.slides.insert(to, slide);
        if let Some(index) = self.index_of(current_id) {
            self.current_index = index;
        }
        Ok(())
    }

    /// Serialize the presentation to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a presentation from JSON, repairing an empty slide list
    /// or an out-of-range current index.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut presentation: Self = serde_json::from_str(json)?;
        if presentation.slides.is_empty() {
            presentation.slides.push(Slide::new());
        }
        if presentation.current_index >= presentation.slides.len() {
            presentation.current_index = presentation.slides.len() - 1;
        }
        Ok(presentation)
    }

    fn insert_after_current(&mut self, slide: Slide) -> usize {
        let index = self.current_index + 1;
        self.slides.insert(index, slide);
        self.current_index = index;
        index
    }

    fn check_index(&self, index: usize) -> DeckResult<()> {
        if index < self.slides.len() {
            Ok(())
        } else {
            Err(DeckError::SlideOutOfRange {
                index,
                len: self.slides.len(),
            })
        }
    }
}

impl SlideDeck for Presentation {
    fn slides(&self) -> &[Slide] {
        &self.slides
    }

    fn current_index(&self) -> usize {
        self.current_index
    }

    fn update_slide(&mut self, index: usize, patch: SlidePatch) -> DeckResult<()> {
        self.check_index(index)?;
        self.slides[index].apply(patch);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{ElementKind, Text};

    fn text(content: &str) -> Element {
        Element::new(0.0, 0.0, 100.0, 30.0, ElementKind::Text(Text::new(content)))
    }

    #[test]
    fn test_new_has_one_slide() {
        let deck = Presentation::new();
        assert_eq!(deck.len(), 1);
        assert_eq!(deck.current_index(), 0);
        assert!(deck.current_slide().is_some());
    }

    #[test]
    fn test_add_slide_after_current() {
        let mut deck = Presentation::new();
        let first = deck.slides()[0].id;
        assert_eq!(deck.add_slide(), 1);
        deck.set_current(0).unwrap();
        assert_eq!(deck.add_slide(), 1);

        assert_eq!(deck.len(), 3);
        assert_eq!(deck.slides()[0].id, first);
        assert_eq!(deck.current_index(), 1);
    }

    #[test]
    fn test_update_slide() {
        let mut deck = Presentation::new();
        deck.update_slide(0, SlidePatch::elements(vec![text("a")])).unwrap();
        deck.update_slide(0, SlidePatch::thumbnail(Some("data:x".into()))).unwrap();

        let slide = &deck.slides()[0];
        assert_eq!(slide.elements.len(), 1);
        assert_eq!(slide.thumbnail.as_deref(), Some("data:x"));

        let err = deck.update_slide(3, SlidePatch::default()).unwrap_err();
        assert_eq!(err, DeckError::SlideOutOfRange { index: 3, len: 1 });
    }

    #[test]
    fn test_remove_last_slide_fails() {
        let mut deck = Presentation::new();
        assert_eq!(deck.remove_slide(0), Err(DeckError::LastSlide));
    }

    #[test]
    fn test_remove_keeps_current_in_range() {
        let mut deck = Presentation::new();
        deck.add_slide();
        deck.add_slide();
        assert_eq!(deck.current_index(), 2);

        deck.remove_slide(2).unwrap();
        assert_eq!(deck.current_index(), 1);

        deck.remove_slide(0).unwrap();
        assert_eq!(deck.current_index(), 0);
        assert_eq!(deck.len(), 1);
    }

    #[test]
    fn test_duplicate_slide_fresh_ids() {
        let mut deck = Presentation::new();
        deck.update_slide(0, SlidePatch::elements(vec![text("a")])).unwrap();
        let index = deck.duplicate_slide(0).unwrap();

        let original = &deck.slides()[0];
        let copy = &deck.slides()[index];
        assert_ne!(original.id, copy.id);
        assert_ne!(original.elements[0].id, copy.elements[0].id);
        assert_eq!(original.elements[0].kind, copy.elements[0].kind);
        assert_eq!(deck.current_index(), 1);
    }

    #[test]
    fn test_move_slide_tracks_current() {
        let mut deck = Presentation::new();
        deck.add_slide();
        deck.add_slide();
        deck.set_current(0).unwrap();
        let current = deck.slides()[0].id;

        deck.move_slide(0, 2).unwrap();
        assert_eq!(deck.current_index(), 2);
        assert_eq!(deck.slides()[2].id, current);
        assert_eq!(deck.index_of(current), Some(2));
    }

    #[test]
    fn test_json_repairs_current_index() {
        let mut deck = Presentation::new();
        deck.name = "Quarterly".into();
        let mut value: serde_json::Value = serde_json::from_str(&deck.to_json().unwrap()).unwrap();
        value["current_index"] = serde_json::json!(9);

        let loaded = Presentation::from_json(&value.to_string()).unwrap();
        assert_eq!(loaded.name, "Quarterly");
        assert_eq!(loaded.current_index(), 0);
    }
}
