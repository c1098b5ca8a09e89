//! Editor session: one presentation with its history, guides, canvas sync
//! and thumbnails.
//!
//! Nothing here runs on its own. The host forwards surface events, calls
//! [`Editor::tick`] when [`Editor::next_deadline`] passes, and runs the
//! thumbnail captures the editor hands out.

use crate::config::EditorConfig;
use crate::deck::{DeckResult, Presentation, Slide, SlideDeck, SlidePatch};
use crate::elements::{Element, ElementId, snapshot_elements};
use crate::guides::GuideEngine;
use crate::history::{PushOptions, Snapshot, SnapshotStore};
use crate::sync::{CanvasSyncBridge, DrawingSurface, SurfaceEvent, SyncPhase};
use crate::thumbnail::{CaptureRequest, CaptureResult, RgbaImage, SlideCapture, ThumbnailSync};
use crate::timing::Instant;

/// Minimum zoom level.
pub const MIN_ZOOM: f64 = 0.1;

/// Maximum zoom level.
pub const MAX_ZOOM: f64 = 5.0;

/// Coalescing key for drops of one element.
pub fn move_key(id: ElementId) -> String {
    format!("move:{id}")
}

/// A single editing session.
#[derive(Debug)]
pub struct Editor<S: DrawingSurface> {
    config: EditorConfig,
    presentation: Presentation,
    history: SnapshotStore,
    guides: GuideEngine,
    bridge: CanvasSyncBridge<S>,
    thumbnails: ThumbnailSync,
    selected: Option<ElementId>,
    zoom: f64,
}

impl<S: DrawingSurface> Default for Editor<S> {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl<S: DrawingSurface> Editor<S> {
    /// A session on a fresh one-slide presentation.
    pub fn new(config: EditorConfig) -> Self {
        Self::with_presentation(config, Presentation::new())
    }

    /// A session on an existing presentation.
    pub fn with_presentation(config: EditorConfig, presentation: Presentation) -> Self {
        let initial = initial_snapshot(&presentation);
        let mut editor = Self {
            history: SnapshotStore::with_config(initial, &config.history),
            guides: GuideEngine::with_config(&config.guides),
            bridge: CanvasSyncBridge::new(&config.sync),
            thumbnails: ThumbnailSync::new(&config.thumbnail),
            presentation,
            config,
            selected: None,
            zoom: 1.0,
        };
        editor.thumbnails.observe(&editor.presentation, Instant::now());
        editor
    }

    /// Get the session configuration.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Get the presentation being edited.
    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    /// Get the undo history.
    pub fn history(&self) -> &SnapshotStore {
        &self.history
    }

    /// Get the guide engine (active guides, last snap).
    pub fn guides(&self) -> &GuideEngine {
        &self.guides
    }

    /// Guide settings (toggle, threshold) can be changed at any time.
    pub fn guides_mut(&mut self) -> &mut GuideEngine {
        &mut self.guides
    }

    /// Get the canvas sync bridge.
    pub fn bridge(&self) -> &CanvasSyncBridge<S> {
        &self.bridge
    }

    /// Get the attached surface, if any.
    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.bridge.surface_mut()
    }

    /// Get the thumbnail scheduler.
    pub fn thumbnails(&self) -> &ThumbnailSync {
        &self.thumbnails
    }

    /// Currently selected element.
    pub fn selected_element(&self) -> Option<ElementId> {
        self.selected
    }

    /// Current zoom level.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Check if undo is available.
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Check if redo is available.
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Elements of the active slide.
    pub fn current_elements(&self) -> &[Element] {
        self.presentation
            .current_slide()
            .map(|slide| slide.elements.as_slice())
            .unwrap_or(&[])
    }

    /// Earliest instant at which `tick` or a thumbnail capture has work.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.bridge.next_deadline(), self.thumbnails.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Attach a drawing surface and show the active slide on it.
    ///
    /// A previously attached surface is detached and returned.
    pub fn attach_surface(&mut self, surface: S, now: Instant) -> Option<S> {
        let previous = self.bridge.attach(surface);
        let index = self.presentation.current_index();
        let elements = self.current_elements().to_vec();
        self.bridge.load_slide(index, &elements);
        self.bridge.switch_slide(index, now);
        previous
    }

    /// Stop observing the surface and hand it back.
    pub fn detach_surface(&mut self) -> Option<S> {
        self.bridge.detach()
    }

    /// Forward one surface event. Returns true if it scheduled a sync.
    pub fn handle_surface_event(&mut self, event: SurfaceEvent, now: Instant) -> bool {
        self.bridge.handle_event(event, now)
    }

    /// Run whatever sync work is due. Returns true if the surface state was
    /// committed to the model.
    ///
    /// Every commit also feeds the thumbnail debounce; the capture it
    /// schedules is collected with [`take_thumbnail_request`](Self::take_thumbnail_request)
    /// or [`refresh_thumbnail`](Self::refresh_thumbnail).
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut update = None;
        self.bridge.pump(now, |index, elements| update = Some((index, elements)));
        let Some((index, elements)) = update else {
            return false;
        };
        self.apply_sync(index, elements, now)
    }

    /// Write synced surface state into slide `index`.
    fn apply_sync(&mut self, index: usize, elements: Vec<Element>, now: Instant) -> bool {
        if self.presentation.slide(index).map(|slide| &slide.elements) == Some(&elements) {
            return false;
        }
        if let Err(err) = self.presentation.update_slide(index, SlidePatch::elements(elements.clone())) {
            log::warn!("dropping sync for slide {index}: {err}");
            return false;
        }
        if index == self.presentation.current_index() {
            self.push_history(&elements, None, now);
        }
        self.thumbnails.observe(&self.presentation, now);
        true
    }

    /// Replace the active slide's elements as one edit.
    ///
    /// The surface is reloaded to match. Pushes sharing `coalesce_key`
    /// inside the coalescing window merge into one undo step.
    pub fn commit_elements(&mut self, elements: Vec<Element>, coalesce_key: Option<&str>, now: Instant) {
        let index = self.presentation.current_index();
        if let Err(err) = self.presentation.update_slide(index, SlidePatch::elements(elements.clone())) {
            log::warn!("commit to slide {index} failed: {err}");
            return;
        }
        self.push_history(&elements, coalesce_key, now);
        self.bridge.load_slide(index, &elements);
        self.thumbnails.observe(&self.presentation, now);
    }

    fn push_history(&mut self, elements: &[Element], coalesce_key: Option<&str>, now: Instant) {
        let options = PushOptions {
            coalesce_key: coalesce_key.map(str::to_string),
            ..PushOptions::default()
        }
        .slide(self.presentation.current_index())
        .select(self.selected)
        .zoom(self.zoom);
        self.history.push_at(elements, options, now);
    }

    /// Change the selection. Recorded with the next committed edit.
    pub fn select_element(&mut self, id: Option<ElementId>) {
        self.selected = id;
    }

    /// Set the zoom level, clamped to `[MIN_ZOOM, MAX_ZOOM]`.
    ///
    /// Non-finite values are ignored.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    /// Step back one edit. Returns false if there is nothing to undo.
    pub fn undo(&mut self, now: Instant) -> bool {
        if !self.history.undo() {
            return false;
        }
        self.restore_present(now);
        true
    }

    /// Step forward one edit. Returns false if there is nothing to redo.
    pub fn redo(&mut self, now: Instant) -> bool {
        if !self.history.redo() {
            return false;
        }
        self.restore_present(now);
        true
    }

    /// Put the history's present back into the deck and on the surface.
    fn restore_present(&mut self, now: Instant) {
        let snapshot = self.history.present().clone();
        let index = snapshot
            .current_slide_index
            .min(self.presentation.len().saturating_sub(1));
        let elements = snapshot_elements(&snapshot.elements);

        if let Err(err) = self.presentation.set_current(index) {
            log::warn!("cannot restore slide {index}: {err}");
            return;
        }
        if let Err(err) = self.presentation.update_slide(index, SlidePatch::elements(elements.clone())) {
            log::warn!("cannot restore slide {index}: {err}");
            return;
        }
        self.selected = snapshot.selected_element_id;
        self.zoom = snapshot.zoom;
        self.guides.clear_guides();
        self.bridge.load_slide(index, &elements);
        self.thumbnails.observe(&self.presentation, now);
    }

    /// Make slide `index` active.
    ///
    /// Surface edits still waiting for their debounce are committed to
    /// the old slide first. Going to the slide already shown does nothing.
    pub fn go_to_slide(&mut self, index: usize, now: Instant) -> DeckResult<()> {
        if index >= self.presentation.len() {
            // Let the deck produce the error.
            return self.presentation.set_current(index);
        }
        if index == self.presentation.current_index() {
            return Ok(());
        }

        self.flush_pending_sync(now);
        self.presentation.set_current(index)?;
        self.selected = None;
        self.guides.clear_guides();

        let elements = self.current_elements().to_vec();
        self.push_history(&elements, None, now);
        self.show_current_slide(now);
        Ok(())
    }

    /// Insert a blank slide after the current one and make it current.
    pub fn add_slide(&mut self, now: Instant) -> usize {
        self.flush_pending_sync(now);
        let index = self.presentation.add_slide();
        self.slides_restructured(now);
        index
    }

    /// Insert a copy of slide `index` after it and make the copy current.
    pub fn duplicate_slide(&mut self, index: usize, now: Instant) -> DeckResult<usize> {
        self.flush_pending_sync(now);
        let copy = self.presentation.duplicate_slide(index)?;
        self.slides_restructured(now);
        Ok(copy)
    }

    /// Remove slide `index`. The last remaining slide cannot be removed.
    pub fn remove_slide(&mut self, index: usize, now: Instant) -> DeckResult<Slide> {
        self.flush_pending_sync(now);
        let removed = self.presentation.remove_slide(index)?;
        self.slides_restructured(now);
        Ok(removed)
    }

    /// Move slide `from` to position `to`; the current slide stays current.
    pub fn move_slide(&mut self, from: usize, to: usize, now: Instant) -> DeckResult<()> {
        self.flush_pending_sync(now);
        self.presentation.move_slide(from, to)?;
        self.slides_restructured(now);
        Ok(())
    }

    /// Commit surface edits still waiting for their debounce.
    fn flush_pending_sync(&mut self, now: Instant) {
        if let SyncPhase::Scheduled { .. } = self.bridge.phase() {
            let mut update = None;
            self.bridge.sync_now(now, |i, elements| update = Some((i, elements)));
            if let Some((i, elements)) = update {
                self.apply_sync(i, elements, now);
            }
        }
    }

    /// Slide positions changed, so recorded slide indices no longer hold.
    /// History restarts at the current slide.
    fn slides_restructured(&mut self, now: Instant) {
        self.selected = None;
        self.guides.clear_guides();
        let initial = initial_snapshot(&self.presentation).with_zoom(self.zoom);
        self.history.reset(initial);
        self.show_current_slide(now);
    }

    /// Put the current slide on the surface and let thumbnails catch up.
    fn show_current_slide(&mut self, now: Instant) {
        let index = self.presentation.current_index();
        let elements = self.current_elements().to_vec();
        self.bridge.load_slide(index, &elements);
        self.bridge.switch_slide(index, now);
        self.thumbnails.observe(&self.presentation, now);
    }

    /// Snap an element being dragged against the canvas and its siblings.
    ///
    /// Nothing is committed; active guides are left for rendering.
    pub fn drag_move(&mut self, element: &Element) -> Element {
        let canvas = &self.config.canvas;
        let siblings = self
            .presentation
            .current_slide()
            .map(|slide| slide.elements.as_slice())
            .unwrap_or(&[]);
        self.guides
            .snap_to_guides(element, siblings, canvas.width, canvas.height)
    }

    /// Finish a drag: snap once more, clear guides and commit the move.
    ///
    /// An element not yet on the slide is appended. Returns the committed
    /// element.
    pub fn drop_element(&mut self, element: &Element, now: Instant) -> Element {
        let snapped = self.drag_move(element);
        self.guides.clear_guides();

        let mut elements = self.current_elements().to_vec();
        match elements.iter_mut().find(|e| e.id == snapped.id) {
            Some(existing) => *existing = snapped.clone(),
            None => elements.push(snapped.clone()),
        }
        let key = move_key(snapped.id);
        self.commit_elements(elements, Some(key.as_str()), now);
        snapped
    }

    /// Hand out a thumbnail capture once its debounce has expired.
    pub fn take_thumbnail_request(&mut self, now: Instant) -> Option<CaptureRequest> {
        self.thumbnails.take_due(&self.presentation, now)
    }

    /// Store a finished capture. Returns true if a thumbnail changed.
    pub fn complete_thumbnail(&mut self, request: &CaptureRequest, result: CaptureResult<RgbaImage>) -> bool {
        self.thumbnails.apply(request, result, &mut self.presentation)
    }

    /// Capture and store the due thumbnail, if any.
    pub async fn refresh_thumbnail<C>(&mut self, capture: &C, now: Instant) -> bool
    where
        C: SlideCapture + ?Sized,
    {
        self.thumbnails
            .run_due(&mut self.presentation, capture, now)
            .await
    }

    /// Replace the presentation and start a fresh history for it.
    pub fn load_presentation(&mut self, presentation: Presentation, now: Instant) {
        self.presentation = presentation;
        self.history.reset(initial_snapshot(&self.presentation));
        self.selected = None;
        self.zoom = 1.0;
        self.guides.clear_guides();

        let index = self.presentation.current_index();
        let elements = self.current_elements().to_vec();
        self.bridge.load_slide(index, &elements);
        self.thumbnails.cancel();
        self.thumbnails.invalidate();
        self.thumbnails.observe(&self.presentation, now);
    }
}

fn initial_snapshot(presentation: &Presentation) -> Snapshot {
    let elements = presentation
        .current_slide()
        .map(|slide| snapshot_elements(&slide.elements))
        .unwrap_or_default();
    Snapshot::new(elements).with_slide_index(presentation.current_index())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::DeckError;
    use crate::elements::{ElementKind, Shape, ShapeKind, Text};
    use crate::sync::{MemorySurface, SurfaceEvent, SurfaceEventKind, SurfaceObject};
    use crate::thumbnail::SoftwareRasterizer;
    use crate::timing::Duration;

    fn rect(x: f64, y: f64) -> Element {
        Element::new(x, y, 100.0, 50.0, ElementKind::Shape(Shape::new(ShapeKind::Rectangle)))
    }

    fn editor() -> (Editor<MemorySurface>, Instant) {
        let start = Instant::now();
        let mut editor = Editor::default();
        editor.attach_surface(MemorySurface::new(), start);
        (editor, start)
    }

    #[test]
    fn test_commit_and_undo() {
        let (mut editor, start) = editor();
        let a = rect(100.0, 100.0);

        editor.commit_elements(vec![a.clone()], None, start);
        assert_eq!(editor.current_elements(), &[a.clone()]);
        assert!(editor.can_undo());
        assert_eq!(editor.surface_mut().unwrap().object_count(), 1);

        assert!(editor.undo(start));
        assert!(editor.current_elements().is_empty());
        assert_eq!(editor.surface_mut().unwrap().object_count(), 0);

        assert!(editor.redo(start));
        assert_eq!(editor.current_elements(), &[a]);
        assert!(!editor.redo(start));
    }

    #[test]
    fn test_surface_edits_sync_after_debounce() {
        let (mut editor, start) = editor();
        // Forced sync of the freshly attached slide has nothing to commit
        assert!(!editor.tick(start + Duration::from_millis(100)));

        let a = rect(100.0, 100.0);
        let id = a.id;
        editor.surface_mut().unwrap().add(SurfaceObject::from_element(&a));
        for step in 0..5u64 {
            editor
                .surface_mut()
                .unwrap()
                .move_object(id, 100.0 + step as f64 * 10.0, 100.0);
            editor.tick(start + Duration::from_millis(200 + step * 50));
        }
        assert!(editor.current_elements().is_empty());

        assert!(editor.tick(start + Duration::from_millis(700)));
        let elements = editor.current_elements();
        assert_eq!(elements.len(), 1);
        assert!((elements[0].x - 140.0).abs() < f64::EPSILON);
        assert_eq!(editor.history().past_len(), 1);

        // The commit produced no further sync
        assert!(!editor.tick(start + Duration::from_secs(5)));
    }

    #[test]
    fn test_handle_surface_event_schedules() {
        let (mut editor, start) = editor();
        editor.tick(start + Duration::from_millis(100));

        assert!(!editor.handle_surface_event(SurfaceEvent::new(SurfaceEventKind::MouseMove), start));
        assert!(editor.handle_surface_event(SurfaceEvent::new(SurfaceEventKind::ObjectModified), start));
        assert!(editor.next_deadline().is_some());
    }

    #[test]
    fn test_synced_edit_schedules_thumbnail() {
        let (mut editor, start) = editor();
        editor.tick(start + Duration::from_millis(100));
        editor.take_thumbnail_request(start + Duration::from_secs(1));

        let edited = start + Duration::from_secs(2);
        editor.surface_mut().unwrap().add(SurfaceObject::from_element(&rect(0.0, 0.0)));
        editor.tick(edited);
        let committed = edited + Duration::from_millis(300);
        assert!(editor.tick(committed));

        let due = committed + Duration::from_millis(500);
        assert_eq!(editor.next_deadline(), Some(due));
        assert!(editor.take_thumbnail_request(due - Duration::from_millis(1)).is_none());
        let request = editor.take_thumbnail_request(due).unwrap();
        assert_eq!(request.slide_id, editor.presentation().slides()[0].id);
    }

    #[test]
    fn test_drag_then_drop_is_one_undo_step() {
        let (mut editor, start) = editor();
        let a = rect(100.0, 100.0);
        editor.commit_elements(vec![a.clone()], None, start);
        let before = editor.history().past_len();

        let mut dragged = a.clone();
        for step in 1..=5u64 {
            dragged = dragged.moved_to(100.0 + step as f64 * 20.0, 100.0);
            editor.drop_element(&dragged, start + Duration::from_millis(step * 100));
        }
        assert_eq!(editor.history().past_len(), before + 1);

        assert!(editor.undo(start + Duration::from_secs(1)));
        assert!((editor.current_elements()[0].x - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_drag_move_snaps_without_committing() {
        let (mut editor, _) = editor();
        let a = rect(3.0, 200.0);
        let snapped = editor.drag_move(&a);

        assert!((snapped.x - 0.0).abs() < f64::EPSILON);
        assert!((snapped.y - 200.0).abs() < f64::EPSILON);
        assert!(!editor.guides().active_guides().is_empty());
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_drop_clears_guides() {
        let (mut editor, start) = editor();
        let dropped = editor.drop_element(&rect(3.0, 200.0), start);

        assert!((dropped.x - 0.0).abs() < f64::EPSILON);
        assert!(editor.guides().active_guides().is_empty());
        assert_eq!(editor.current_elements(), &[dropped]);
    }

    #[test]
    fn test_undo_restores_slide_and_metadata() {
        let (mut editor, start) = editor();
        assert_eq!(editor.add_slide(start), 1);
        editor.go_to_slide(0, start).unwrap();

        let a = rect(10.0, 10.0);
        editor.select_element(Some(a.id));
        editor.set_zoom(2.0);
        editor.commit_elements(vec![a.clone()], None, start);

        editor.go_to_slide(1, start).unwrap();
        assert_eq!(editor.selected_element(), None);

        let b = Element::new(0.0, 0.0, 80.0, 20.0, ElementKind::Text(Text::new("b")));
        editor.commit_elements(vec![b], None, start);

        assert!(editor.undo(start));
        assert_eq!(editor.presentation().current_index(), 1);
        assert!(editor.current_elements().is_empty());

        assert!(editor.undo(start));
        assert_eq!(editor.presentation().current_index(), 0);
        assert_eq!(editor.current_elements(), &[a.clone()]);
        assert_eq!(editor.selected_element(), Some(a.id));
        assert!((editor.zoom() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_go_to_slide_flushes_pending_edits() {
        let (mut editor, start) = editor();
        editor.add_slide(start);
        editor.go_to_slide(0, start).unwrap();
        editor.tick(start + Duration::from_millis(100));

        editor.surface_mut().unwrap().add(SurfaceObject::from_element(&rect(5.0, 5.0)));
        editor.tick(start + Duration::from_millis(150));
        editor.go_to_slide(1, start + Duration::from_millis(200)).unwrap();

        assert_eq!(editor.presentation().slides()[0].elements.len(), 1);
        assert_eq!(editor.bridge().slide_index(), 1);
        assert_eq!(editor.surface_mut().unwrap().object_count(), 0);
    }

    #[test]
    fn test_go_to_current_slide_adds_no_undo_step() {
        let (mut editor, start) = editor();
        editor.commit_elements(vec![rect(0.0, 0.0)], None, start);
        assert_eq!(editor.history().past_len(), 1);

        editor.go_to_slide(0, start).unwrap();
        assert_eq!(editor.history().past_len(), 1);

        assert!(editor.undo(start));
        assert!(editor.current_elements().is_empty());
    }

    #[test]
    fn test_synced_ids_are_stable() {
        let (mut editor, start) = editor();
        editor.tick(start + Duration::from_millis(100));

        let mut anonymous = SurfaceObject::from_element(&rect(20.0, 20.0));
        anonymous.id = None;
        editor.surface_mut().unwrap().add(anonymous);
        editor.tick(start + Duration::from_millis(200));
        assert!(editor.tick(start + Duration::from_millis(500)));

        let id = editor.current_elements()[0].id;
        let past = editor.history().past_len();

        let surface = editor.surface_mut().unwrap();
        surface.emit(SurfaceEvent::on(SurfaceEventKind::SelectionCreated, id));
        editor.tick(start + Duration::from_millis(600));
        assert!(!editor.tick(start + Duration::from_millis(900)));

        assert_eq!(editor.current_elements()[0].id, id);
        assert_eq!(editor.history().past_len(), past);
    }

    #[test]
    fn test_repeated_surface_ids_are_made_unique() {
        let (mut editor, start) = editor();
        let object = SurfaceObject::from_element(&rect(20.0, 20.0));
        let surface = editor.surface_mut().unwrap();
        surface.add(object.clone());
        surface.add(object);

        editor.tick(start + Duration::from_millis(100));
        assert!(editor.tick(start + Duration::from_millis(400)));

        let ids: Vec<_> = editor.history().present().elements.iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);

        let surface = editor.surface_mut().unwrap();
        surface.emit(SurfaceEvent::new(SurfaceEventKind::SelectionUpdated));
        editor.tick(start + Duration::from_millis(500));
        assert!(!editor.tick(start + Duration::from_millis(800)));
    }

    #[test]
    fn test_slide_management() {
        let (mut editor, start) = editor();
        let a = rect(0.0, 0.0);
        editor.commit_elements(vec![a.clone()], None, start);

        assert_eq!(editor.add_slide(start), 1);
        assert_eq!(editor.presentation().len(), 2);
        assert_eq!(editor.presentation().current_index(), 1);
        assert_eq!(editor.surface_mut().unwrap().object_count(), 0);
        assert!(!editor.can_undo());

        let b = rect(50.0, 50.0);
        editor.commit_elements(vec![b.clone()], None, start);
        assert_eq!(editor.duplicate_slide(1, start), Ok(2));
        assert_eq!(editor.presentation().current_index(), 2);
        assert_eq!(editor.surface_mut().unwrap().object_count(), 1);

        editor.move_slide(2, 0, start).unwrap();
        assert_eq!(editor.presentation().current_index(), 0);
        assert_eq!(editor.current_elements()[0].kind, b.kind);
        assert_eq!(editor.bridge().slide_index(), 0);

        let removed = editor.remove_slide(0, start).unwrap();
        assert_eq!(removed.elements[0].kind, b.kind);
        assert_eq!(editor.presentation().current_index(), 0);
        assert_eq!(editor.current_elements(), &[a]);
        assert_eq!(editor.surface_mut().unwrap().object_count(), 1);
    }

    #[test]
    fn test_remove_current_last_slide_keeps_index_in_range() {
        let (mut editor, start) = editor();
        editor.add_slide(start);
        editor.remove_slide(1, start).unwrap();

        assert_eq!(editor.presentation().current_index(), 0);
        assert_eq!(editor.bridge().slide_index(), 0);
        assert_eq!(editor.remove_slide(0, start), Err(DeckError::LastSlide));
        assert!(editor.move_slide(0, 3, start).is_err());
    }

    #[test]
    fn test_go_to_slide_out_of_range() {
        let (mut editor, start) = editor();
        assert!(editor.go_to_slide(4, start).is_err());
        assert_eq!(editor.presentation().current_index(), 0);
    }

    #[test]
    fn test_set_zoom_clamps() {
        let mut editor: Editor<MemorySurface> = Editor::default();
        editor.set_zoom(100.0);
        assert!((editor.zoom() - MAX_ZOOM).abs() < f64::EPSILON);
        editor.set_zoom(f64::NAN);
        assert!((editor.zoom() - MAX_ZOOM).abs() < f64::EPSILON);
    }

    #[test]
    fn test_thumbnail_flow() {
        let (mut editor, start) = editor();
        editor.commit_elements(vec![rect(0.0, 0.0)], None, start);
        assert!(editor.take_thumbnail_request(start + Duration::from_millis(100)).is_none());

        let request = editor
            .take_thumbnail_request(start + Duration::from_millis(500))
            .unwrap();
        let slide = editor.presentation().slides()[0].clone();
        let image = SoftwareRasterizer::default().render(&slide, request.width, request.height);
        assert!(editor.complete_thumbnail(&request, image));
        assert!(editor.presentation().slides()[0].thumbnail.is_some());

        // Writing the thumbnail does not schedule another capture
        assert!(editor.take_thumbnail_request(start + Duration::from_secs(5)).is_none());
    }

    #[test]
    fn test_load_presentation_resets_history() {
        let (mut editor, start) = editor();
        editor.commit_elements(vec![rect(0.0, 0.0)], None, start);
        assert!(editor.can_undo());

        let mut loaded = Presentation::new();
        loaded
            .update_slide(0, SlidePatch::elements(vec![rect(1.0, 1.0), rect(2.0, 2.0)]))
            .unwrap();
        editor.load_presentation(loaded, start);

        assert!(!editor.can_undo());
        assert_eq!(editor.history().present().elements.len(), 2);
        assert_eq!(editor.surface_mut().unwrap().object_count(), 2);
    }

    #[test]
    fn test_detach_stops_sync() {
        let (mut editor, start) = editor();
        let surface = editor.detach_surface().unwrap();
        assert!(!surface.is_subscribed(SurfaceEventKind::ObjectAdded));
        assert!(!editor.tick(start + Duration::from_secs(1)));
        assert!(editor.detach_surface().is_none());
    }
}
