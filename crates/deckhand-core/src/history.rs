//! Snapshot-based undo/redo history.
//!
//! Every committed edit becomes an immutable [`Snapshot`] shared through an
//! `Arc`. Undo and redo only move those references between the `past`,
//! `present` and `future` slots; a stored snapshot is never mutated.

use crate::config::HistoryConfig;
use crate::elements::{Element, ElementId, snapshot_elements};
use crate::timing::{Duration, Instant};
use std::collections::VecDeque;
use std::sync::Arc;

/// Default maximum number of undo states to keep.
pub const DEFAULT_MAX_STACK_SIZE: usize = 200;

/// Default window in which same-key pushes merge.
pub const DEFAULT_COALESCE_WINDOW: Duration = Duration::from_millis(300);

/// One recorded state of the editable content plus view metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Elements of the active slide, in z-order.
    pub elements: Vec<Element>,
    pub current_slide_index: usize,
    pub selected_element_id: Option<ElementId>,
    pub zoom: f64,
}

impl Snapshot {
    /// A snapshot of `elements` on the first slide at 100% zoom.
    pub fn new(elements: Vec<Element>) -> Self {
        Self {
            elements,
            current_slide_index: 0,
            selected_element_id: None,
            zoom: 1.0,
        }
    }

    /// A snapshot with no elements.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Set the active slide index.
    pub fn with_slide_index(mut self, index: usize) -> Self {
        self.current_slide_index = index;
        self
    }

    /// Set the selected element.
    pub fn with_selection(mut self, id: Option<ElementId>) -> Self {
        self.selected_element_id = id;
        self
    }

    /// Set the zoom level.
    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = zoom;
        self
    }

    /// Look up an element by id.
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Per-push overrides.
///
/// Metadata left as `None` is carried over from the current present.
#[derive(Debug, Clone, Default)]
pub struct PushOptions {
    /// Same-cause key; consecutive pushes sharing it inside the coalescing
    /// window collapse into one undo step.
    pub coalesce_key: Option<String>,
    pub current_slide_index: Option<usize>,
    pub selected_element_id: Option<Option<ElementId>>,
    pub zoom: Option<f64>,
}

impl PushOptions {
    /// Options that coalesce under `key`.
    pub fn coalesce(key: impl Into<String>) -> Self {
        Self {
            coalesce_key: Some(key.into()),
            ..Self::default()
        }
    }

    /// Override the slide index.
    pub fn slide(mut self, index: usize) -> Self {
        self.current_slide_index = Some(index);
        self
    }

    /// Override the selection.
    pub fn select(mut self, id: Option<ElementId>) -> Self {
        self.selected_element_id = Some(id);
        self
    }

    /// Override the zoom level.
    pub fn zoom(mut self, zoom: f64) -> Self {
        self.zoom = Some(zoom);
        self
    }
}

/// The three history slots.
#[derive(Debug, Clone)]
pub struct HistoryState {
    /// Oldest first.
    pub past: VecDeque<Arc<Snapshot>>,
    pub present: Arc<Snapshot>,
    /// Soonest redo first.
    pub future: VecDeque<Arc<Snapshot>>,
}

impl HistoryState {
    fn fresh(present: Arc<Snapshot>) -> Self {
        Self {
            past: VecDeque::new(),
            present,
            future: VecDeque::new(),
        }
    }
}

/// Bounded undo/redo store with time-windowed coalescing.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    state: HistoryState,
    initial: Arc<Snapshot>,
    max_stack_size: usize,
    coalesce_window: Duration,
    /// Key and time of the last push that carried a coalesce key.
    last_coalesce: Option<(String, Instant)>,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(Snapshot::empty())
    }
}

impl SnapshotStore {
    /// Create a store whose present (and `clear()` target) is `initial`.
    pub fn new(initial: Snapshot) -> Self {
        let initial = Arc::new(initial);
        Self {
            state: HistoryState::fresh(initial.clone()),
            initial,
            max_stack_size: DEFAULT_MAX_STACK_SIZE,
            coalesce_window: DEFAULT_COALESCE_WINDOW,
            last_coalesce: None,
        }
    }

    /// Create a store with limits from configuration.
    pub fn with_config(initial: Snapshot, config: &HistoryConfig) -> Self {
        let mut store = Self::new(initial);
        store.set_max_stack_size(config.max_stack_size);
        store.coalesce_window = config.coalesce_window();
        store
    }

    /// Get the maximum number of undo entries.
    pub fn max_stack_size(&self) -> usize {
        self.max_stack_size
    }

    /// Change the stack bound, evicting the oldest entries if needed.
    pub fn set_max_stack_size(&mut self, max: usize) {
        self.max_stack_size = max;
        self.evict_overflow();
    }

    /// Get the coalescing window.
    pub fn coalesce_window(&self) -> Duration {
        self.coalesce_window
    }

    /// Set the coalescing window.
    pub fn set_coalesce_window(&mut self, window: Duration) {
        self.coalesce_window = window;
    }

    /// Get all three history slots.
    pub fn state(&self) -> &HistoryState {
        &self.state
    }

    /// Get the current snapshot.
    pub fn present(&self) -> &Arc<Snapshot> {
        &self.state.present
    }

    /// Number of undo entries.
    pub fn past_len(&self) -> usize {
        self.state.past.len()
    }

    /// Number of redo entries.
    pub fn future_len(&self) -> usize {
        self.state.future.len()
    }

    /// Check if undo is available.
    pub fn can_undo(&self) -> bool {
        !self.state.past.is_empty()
    }

    /// Check if redo is available.
    pub fn can_redo(&self) -> bool {
        !self.state.future.is_empty()
    }

    /// Record a new present built from `elements`.
    pub fn push(&mut self, elements: &[Element], options: PushOptions) {
        self.push_at(elements, options, Instant::now());
    }

    /// Record a new present, using `now` for the coalescing window.
    pub fn push_at(&mut self, elements: &[Element], options: PushOptions, now: Instant) {
        let current = &self.state.present;
        let snapshot = Arc::new(Snapshot {
            elements: snapshot_elements(elements),
            current_slide_index: options
                .current_slide_index
                .unwrap_or(current.current_slide_index),
            selected_element_id: options
                .selected_element_id
                .unwrap_or(current.selected_element_id),
            zoom: options.zoom.unwrap_or(current.zoom),
        });

        if self.should_coalesce(options.coalesce_key.as_deref(), now) {
            log::trace!("coalescing history push ({:?})", options.coalesce_key);
            self.state.present = snapshot;
        } else {
            let previous = std::mem::replace(&mut self.state.present, snapshot);
            self.state.past.push_back(previous);
            self.evict_overflow();
        }
        self.state.future.clear();

        self.last_coalesce = options.coalesce_key.map(|key| (key, now));
    }

    /// Step back one entry. Returns false if there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.state.past.pop_back() else {
            return false;
        };
        let current = std::mem::replace(&mut self.state.present, previous);
        self.state.future.push_front(current);
        self.last_coalesce = None;
        true
    }

    /// Step forward one entry. Returns false if there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.state.future.pop_front() else {
            return false;
        };
        let current = std::mem::replace(&mut self.state.present, next);
        self.state.past.push_back(current);
        self.evict_overflow();
        self.last_coalesce = None;
        true
    }

    /// Drop all history and return to the initial snapshot.
    pub fn clear(&mut self) {
        self.state = HistoryState::fresh(self.initial.clone());
        self.last_coalesce = None;
    }

    /// Replace the initial snapshot (e.g. after loading a document) and clear.
    pub fn reset(&mut self, initial: Snapshot) {
        self.initial = Arc::new(initial);
        self.clear();
    }

    fn should_coalesce(&self, key: Option<&str>, now: Instant) -> bool {
        let (Some(key), Some((last_key, last_at))) = (key, self.last_coalesce.as_ref()) else {
            return false;
        };
        key == last_key.as_str()
            && now.saturating_duration_since(*last_at) < self.coalesce_window
            && !self.state.past.is_empty()
    }

    fn evict_overflow(&mut self) {
        while self.state.past.len() > self.max_stack_size {
            self.state.past.pop_front();
            log::debug!("history full, evicted oldest snapshot");
        }
    }
}
