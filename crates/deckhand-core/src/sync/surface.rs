//! The drawing-surface side of canvas sync.
//!
//! A surface owns the live, mutable object graph the user manipulates. The
//! sync bridge only subscribes to its mutation events and enumerates its
//! objects; it never edits them.

use crate::elements::{Element, ElementId, ElementKind};
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

/// Errors a surface may report while enumerating objects.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Surface not ready")]
    NotReady,
    #[error("Surface in invalid state: {0}")]
    Invalid(String),
}

/// Events a surface can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceEventKind {
    ObjectAdded,
    ObjectModified,
    ObjectRemoved,
    ObjectMoving,
    ObjectScaling,
    ObjectRotating,
    ObjectSkewing,
    TextChanged,
    SelectionCreated,
    SelectionUpdated,
    SelectionCleared,
    MouseMove,
    AfterRender,
}

/// The event kinds that schedule a sync.
pub const SYNC_EVENTS: &[SurfaceEventKind] = &[
    SurfaceEventKind::ObjectAdded,
    SurfaceEventKind::ObjectModified,
    SurfaceEventKind::ObjectRemoved,
    SurfaceEventKind::ObjectMoving,
    SurfaceEventKind::ObjectScaling,
    SurfaceEventKind::ObjectRotating,
    SurfaceEventKind::ObjectSkewing,
    SurfaceEventKind::TextChanged,
    SurfaceEventKind::SelectionCreated,
    SurfaceEventKind::SelectionUpdated,
    SurfaceEventKind::SelectionCleared,
];

impl SurfaceEventKind {
    /// Whether this event changes model-relevant state.
    pub fn triggers_sync(self) -> bool {
        SYNC_EVENTS.contains(&self)
    }
}

/// One event from the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceEvent {
    pub kind: SurfaceEventKind,
    /// Object the event is about, when there is one.
    pub target: Option<ElementId>,
}

impl SurfaceEvent {
    /// An event without a target.
    pub fn new(kind: SurfaceEventKind) -> Self {
        Self { kind, target: None }
    }

    /// An event about one object.
    pub fn on(kind: SurfaceEventKind, target: ElementId) -> Self {
        Self {
            kind,
            target: Some(target),
        }
    }
}

/// A live object as the surface reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceObject {
    /// Missing for objects the surface created without a model id.
    pub id: Option<ElementId>,
    pub left: f64,
    pub top: f64,
    /// Unscaled width.
    pub width: f64,
    /// Unscaled height.
    pub height: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Rotation in degrees.
    pub angle: f64,
    /// Helper objects (guides, handles) that never reach the model.
    pub exclude_from_export: bool,
    pub payload: ElementKind,
}

impl SurfaceObject {
    /// An unscaled, unrotated object mirroring `element`.
    pub fn from_element(element: &Element) -> Self {
        Self {
            id: Some(element.id),
            left: element.x,
            top: element.y,
            width: element.width,
            height: element.height,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: element.rotation,
            exclude_from_export: false,
            payload: element.kind.clone(),
        }
    }

    /// Plain element record with scale folded into the size.
    ///
    /// Non-finite geometry is zeroed (non-finite scale becomes 1) so a
    /// surface caught mid-transform cannot poison the model.
    pub fn normalize(&self) -> Element {
        let scale_x = finite_or(self.scale_x, 1.0);
        let scale_y = finite_or(self.scale_y, 1.0);
        Element {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            x: finite_or(self.left, 0.0),
            y: finite_or(self.top, 0.0),
            width: finite_or((self.width * scale_x).abs(), 0.0),
            height: finite_or((self.height * scale_y).abs(), 0.0),
            rotation: finite_or(self.angle, 0.0),
            kind: self.payload.clone(),
        }
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

/// Normalized surface contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// Exportable objects as elements, in surface order, with unique ids.
    pub elements: Vec<Element>,
    /// Ids given to objects that had none or repeated an earlier id, keyed
    /// by the object's position in the surface's object list.
    pub assigned_ids: Vec<(usize, ElementId)>,
}

/// Normalize every exportable object, preserving surface order.
///
/// The first object carrying an id keeps it; later objects repeating that
/// id, and objects without one, get a fresh id.
pub fn extract_elements(objects: &[SurfaceObject]) -> Extraction {
    let mut seen = HashSet::new();
    let mut extraction = Extraction::default();

    for (position, object) in objects.iter().enumerate() {
        if object.exclude_from_export {
            continue;
        }
        let mut element = object.normalize();
        let duplicate = object.id.is_some_and(|id| !seen.insert(id));
        if duplicate {
            element.id = Uuid::new_v4();
        }
        if duplicate || object.id.is_none() {
            seen.insert(element.id);
            extraction.assigned_ids.push((position, element.id));
        }
        extraction.elements.push(element);
    }

    extraction
}

/// A mutable drawing surface the bridge can observe.
pub trait DrawingSurface {
    /// Start delivering the given event kinds through `drain_events`.
    fn subscribe(&mut self, kinds: &[SurfaceEventKind]);

    /// Stop delivering events.
    fn unsubscribe(&mut self);

    /// Take all events emitted since the last drain.
    fn drain_events(&mut self) -> Vec<SurfaceEvent>;

    /// Enumerate the current objects, back to front.
    fn objects(&self) -> Result<Vec<SurfaceObject>, SurfaceError>;

    /// Replace the whole object graph with `elements` (slide load, undo).
    ///
    /// Any events this emits are treated as self-triggered.
    fn load(&mut self, elements: &[Element]);

    /// Give the object at `position` in [`objects`](Self::objects) order the
    /// model id `id`.
    fn assign_id(&mut self, position: usize, id: ElementId);
}

/// In-memory surface for headless hosts and tests.
///
/// Mutations queue the matching event when that kind is subscribed.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    objects: Vec<SurfaceObject>,
    subscribed: Vec<SurfaceEventKind>,
    pending: Vec<SurfaceEvent>,
    /// When set, `objects()` fails with this message.
    fault: Option<String>,
}

impl MemorySurface {
    /// An empty surface with no subscriptions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if `kind` is being delivered.
    pub fn is_subscribed(&self, kind: SurfaceEventKind) -> bool {
        self.subscribed.contains(&kind)
    }

    /// Queue an event as if the surface had fired it.
    pub fn emit(&mut self, event: SurfaceEvent) {
        if self.is_subscribed(event.kind) {
            self.pending.push(event);
        }
    }

    /// Add an object on top, emitting an added event.
    pub fn add(&mut self, object: SurfaceObject) {
        let target = object.id;
        self.objects.push(object);
        self.emit(SurfaceEvent {
            kind: SurfaceEventKind::ObjectAdded,
            target,
        });
    }

    /// Move an object by id, emitting a moving event.
    pub fn move_object(&mut self, id: ElementId, left: f64, top: f64) -> bool {
        let Some(object) = self.objects.iter_mut().find(|o| o.id == Some(id)) else {
            return false;
        };
        object.left = left;
        object.top = top;
        self.emit(SurfaceEvent::on(SurfaceEventKind::ObjectMoving, id));
        true
    }

    /// Remove an object by id, emitting a removed event.
    pub fn remove(&mut self, id: ElementId) -> bool {
        let before = self.objects.len();
        self.objects.retain(|o| o.id != Some(id));
        let removed = self.objects.len() != before;
        if removed {
            self.emit(SurfaceEvent::on(SurfaceEventKind::ObjectRemoved, id));
        }
        removed
    }

    /// Make `objects()` fail until cleared with `None`.
    pub fn set_fault(&mut self, fault: Option<String>) {
        self.fault = fault;
    }

    /// Number of objects, helpers included.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}

impl DrawingSurface for MemorySurface {
    fn subscribe(&mut self, kinds: &[SurfaceEventKind]) {
        for kind in kinds {
            if !self.subscribed.contains(kind) {
                self.subscribed.push(*kind);
            }
        }
    }

    fn unsubscribe(&mut self) {
        self.subscribed.clear();
        self.pending.clear();
    }

    fn drain_events(&mut self) -> Vec<SurfaceEvent> {
        std::mem::take(&mut self.pending)
    }

    fn objects(&self) -> Result<Vec<SurfaceObject>, SurfaceError> {
        match &self.fault {
            Some(message) => Err(SurfaceError::Invalid(message.clone())),
            None => Ok(self.objects.clone()),
        }
    }

    fn load(&mut self, elements: &[Element]) {
        self.objects = elements.iter().map(SurfaceObject::from_element).collect();
    }

    fn assign_id(&mut self, position: usize, id: ElementId) {
        if let Some(object) = self.objects.get_mut(position) {
            object.id = Some(id);
        }
    }
}
