//! Smart alignment guides for drag snapping.
//!
//! While an element is dragged, its edges and center are compared against
//! the slide canvas and every sibling element. Lines within the snap
//! threshold become [`Guide`]s; the nearest one decides the snapped
//! position on its axis.

use crate::config::GuideConfig;
use crate::elements::{Element, ElementId};
use kurbo::Vec2;

/// Default distance threshold for snapping (in slide units).
pub const DEFAULT_SNAP_THRESHOLD: f64 = 10.0;

/// Direction of a guide line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideOrientation {
    /// A horizontal line `y = position`; snapping moves the element vertically.
    Horizontal,
    /// A vertical line `x = position`; snapping moves the element horizontally.
    Vertical,
}

/// Which part of the dragged element lines up with a guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideAnchor {
    /// Left edge (vertical guides) or top edge (horizontal guides).
    Start,
    Center,
    /// Right edge or bottom edge.
    End,
}

/// A candidate alignment line.
#[derive(Debug, Clone, PartialEq)]
pub struct Guide {
    pub id: String,
    pub orientation: GuideOrientation,
    /// Coordinate of the line on the axis it constrains.
    pub position: f64,
    /// Elements the line comes from (empty for canvas guides).
    pub related_element_ids: Vec<ElementId>,
    /// Gap between the anchor and the line.
    pub distance: f64,
    pub anchor: GuideAnchor,
}

/// What the last successful snap did, for visual feedback.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapInfo {
    pub element_id: ElementId,
    pub guide_id: String,
    /// Applied offset; only one component is ever non-zero.
    pub offset: Vec2,
}

/// Extent of an element along one axis.
#[derive(Debug, Clone, Copy)]
struct Span {
    start: f64,
    center: f64,
    end: f64,
}

impl Span {
    fn of(element: &Element, orientation: GuideOrientation) -> Self {
        let (start, size) = match orientation {
            GuideOrientation::Vertical => (element.x, element.width),
            GuideOrientation::Horizontal => (element.y, element.height),
        };
        Self {
            start,
            center: start + size / 2.0,
            end: start + size,
        }
    }

    fn anchor(&self, anchor: GuideAnchor) -> f64 {
        match anchor {
            GuideAnchor::Start => self.start,
            GuideAnchor::Center => self.center,
            GuideAnchor::End => self.end,
        }
    }

    /// Closest anchor to `line`; ties go to the earlier anchor.
    fn nearest_anchor(&self, line: f64) -> (GuideAnchor, f64) {
        let mut best = (GuideAnchor::Start, (self.start - line).abs());
        for anchor in [GuideAnchor::Center, GuideAnchor::End] {
            let distance = (self.anchor(anchor) - line).abs();
            if distance < best.1 {
                best = (anchor, distance);
            }
        }
        best
    }
}

/// Computes alignment guides and snaps dragged elements to them.
#[derive(Debug, Clone)]
pub struct GuideEngine {
    enabled: bool,
    snap_threshold: f64,
    active_guides: Vec<Guide>,
    last_snap: Option<SnapInfo>,
}

impl Default for GuideEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl GuideEngine {
    /// Create an enabled engine with the default threshold.
    pub fn new() -> Self {
        Self {
            enabled: true,
            snap_threshold: DEFAULT_SNAP_THRESHOLD,
            active_guides: Vec::new(),
            last_snap: None,
        }
    }

    /// Create an engine from configuration.
    pub fn with_config(config: &GuideConfig) -> Self {
        Self {
            enabled: config.enabled,
            snap_threshold: config.snap_threshold,
            ..Self::new()
        }
    }

    /// Check if guide computation is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Flip guide computation on or off. Returns the new state.
    pub fn toggle_guides(&mut self) -> bool {
        self.set_enabled(!self.enabled);
        self.enabled
    }

    /// Enable or disable guides. Disabling clears active guides.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.clear_guides();
        }
    }

    /// Get the snap distance threshold.
    pub fn snap_threshold(&self) -> f64 {
        self.snap_threshold
    }

    /// Set the distance threshold used by later calls.
    pub fn set_snap_threshold(&mut self, threshold: f64) {
        self.snap_threshold = threshold;
    }

    /// Guides found by the last calculation.
    pub fn active_guides(&self) -> &[Guide] {
        &self.active_guides
    }

    /// What the last snap did, if it moved anything.
    pub fn last_snap(&self) -> Option<&SnapInfo> {
        self.last_snap.as_ref()
    }

    /// Drop active guides and snap feedback.
    pub fn clear_guides(&mut self) {
        self.active_guides.clear();
        self.last_snap = None;
    }

    /// Guides within the snap threshold of `dragged`, in enumeration order:
    /// canvas edges, canvas centers, then each sibling in slice order.
    pub fn calculate_guides(
        &mut self,
        dragged: &Element,
        all_elements: &[Element],
        canvas_width: f64,
        canvas_height: f64,
    ) -> Vec<Guide> {
        if !self.enabled {
            self.active_guides.clear();
            return Vec::new();
        }

        let threshold = self.snap_threshold;
        self.active_guides = candidate_guides(dragged, all_elements, canvas_width, canvas_height)
            .into_iter()
            .filter(|guide| guide.distance <= threshold)
            .collect();
        self.active_guides.clone()
    }

    /// Move `dragged` onto the nearest guide along that guide's axis.
    ///
    /// Returns the element unchanged when no guide qualifies.
    pub fn snap_to_guides(
        &mut self,
        dragged: &Element,
        all_elements: &[Element],
        canvas_width: f64,
        canvas_height: f64,
    ) -> Element {
        let guides = self.calculate_guides(dragged, all_elements, canvas_width, canvas_height);

        let mut nearest: Option<&Guide> = None;
        for guide in &guides {
            if nearest.is_none_or(|best| guide.distance < best.distance) {
                nearest = Some(guide);
            }
        }

        let Some(guide) = nearest else {
            self.last_snap = None;
            return dragged.clone();
        };

        let delta = guide.position - Span::of(dragged, guide.orientation).anchor(guide.anchor);
        let offset = match guide.orientation {
            GuideOrientation::Vertical => Vec2::new(delta, 0.0),
            GuideOrientation::Horizontal => Vec2::new(0.0, delta),
        };

        let mut snapped = dragged.clone();
        snapped.translate(offset.x, offset.y);
        self.last_snap = Some(SnapInfo {
            element_id: dragged.id,
            guide_id: guide.id.clone(),
            offset,
        });
        snapped
    }
}

/// Every candidate line with its distance, before threshold filtering.
fn candidate_guides(
    dragged: &Element,
    all_elements: &[Element],
    canvas_width: f64,
    canvas_height: f64,
) -> Vec<Guide> {
    let h = Span::of(dragged, GuideOrientation::Vertical);
    let v = Span::of(dragged, GuideOrientation::Horizontal);

    let canvas = |id: &str, orientation, position: f64, anchor| {
        let span = match orientation {
            GuideOrientation::Vertical => h,
            GuideOrientation::Horizontal => v,
        };
        Guide {
            id: id.to_string(),
            orientation,
            position,
            related_element_ids: Vec::new(),
            distance: (span.anchor(anchor) - position).abs(),
            anchor,
        }
    };

    let mut guides = vec![
        canvas("canvas-left", GuideOrientation::Vertical, 0.0, GuideAnchor::Start),
        canvas("canvas-right", GuideOrientation::Vertical, canvas_width, GuideAnchor::End),
        canvas("canvas-top", GuideOrientation::Horizontal, 0.0, GuideAnchor::Start),
        canvas("canvas-bottom", GuideOrientation::Horizontal, canvas_height, GuideAnchor::End),
        canvas("canvas-center-x", GuideOrientation::Vertical, canvas_width / 2.0, GuideAnchor::Center),
        canvas("canvas-center-y", GuideOrientation::Horizontal, canvas_height / 2.0, GuideAnchor::Center),
    ];

    for other in all_elements.iter().filter(|e| e.id != dragged.id) {
        let lines = [
            ("left", GuideOrientation::Vertical, other.x),
            ("right", GuideOrientation::Vertical, other.x + other.width),
            ("center-x", GuideOrientation::Vertical, other.x + other.width / 2.0),
            ("top", GuideOrientation::Horizontal, other.y),
            ("bottom", GuideOrientation::Horizontal, other.y + other.height),
            ("center-y", GuideOrientation::Horizontal, other.y + other.height / 2.0),
        ];
        for (edge, orientation, position) in lines {
            let span = match orientation {
                GuideOrientation::Vertical => h,
                GuideOrientation::Horizontal => v,
            };
            let (anchor, distance) = span.nearest_anchor(position);
            guides.push(Guide {
                id: format!("{}-{}", other.id, edge),
                orientation,
                position,
                related_element_ids: vec![other.id],
                distance,
                anchor,
            });
        }
    }

    guides
}
