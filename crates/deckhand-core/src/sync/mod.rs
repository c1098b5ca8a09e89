//! Debounced drawing-surface to model synchronization.
//!
//! The bridge listens for mutation events from a [`DrawingSurface`],
//! waits for a quiet period, then normalizes the surface's objects into
//! plain [`Element`] records and hands them to the caller.
//!
//! The bridge moves through `Idle → Scheduled → Extracting → Idle`.
//! Events seen while `Extracting` are the surface echoing the caller's
//! own write-back and are rejected, so a commit can never schedule
//! another commit of itself.

mod surface;

pub use surface::{
    DrawingSurface, Extraction, MemorySurface, SYNC_EVENTS, SurfaceError, SurfaceEvent,
    SurfaceEventKind, SurfaceObject, extract_elements,
};

use crate::config::SyncConfig;
use crate::elements::Element;
use crate::timing::{Duration, Instant};

/// Where the bridge is in its sync cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    /// A sync will run once `deadline` passes.
    Scheduled { deadline: Instant },
    /// Objects are being extracted and handed to the caller.
    Extracting,
}

/// Debounced bridge between a drawing surface and the slide model.
#[derive(Debug)]
pub struct CanvasSyncBridge<S: DrawingSurface> {
    surface: Option<S>,
    phase: SyncPhase,
    debounce: Duration,
    slide_switch_delay: Duration,
    /// Slide the surface currently shows.
    slide_index: usize,
    sync_count: u64,
}

impl<S: DrawingSurface> Default for CanvasSyncBridge<S> {
    fn default() -> Self {
        Self::new(&SyncConfig::default())
    }
}

impl<S: DrawingSurface> CanvasSyncBridge<S> {
    /// Create a detached bridge.
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            surface: None,
            phase: SyncPhase::Idle,
            debounce: config.debounce(),
            slide_switch_delay: config.slide_switch_delay(),
            slide_index: 0,
            sync_count: 0,
        }
    }

    /// Subscribe to `surface` and start observing it.
    ///
    /// A previously attached surface is detached and returned.
    pub fn attach(&mut self, mut surface: S) -> Option<S> {
        let previous = self.detach();
        surface.subscribe(SYNC_EVENTS);
        self.surface = Some(surface);
        previous
    }

    /// Cancel any pending sync, unsubscribe and hand the surface back.
    pub fn detach(&mut self) -> Option<S> {
        self.cancel();
        let mut surface = self.surface.take()?;
        surface.unsubscribe();
        Some(surface)
    }

    /// Check if a surface is attached.
    pub fn is_attached(&self) -> bool {
        self.surface.is_some()
    }

    /// Get the attached surface.
    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    /// Get the attached surface mutably.
    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    /// Current phase of the sync cycle.
    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    /// Slide the surface currently shows.
    pub fn slide_index(&self) -> usize {
        self.slide_index
    }

    /// Number of completed syncs.
    pub fn sync_count(&self) -> u64 {
        self.sync_count
    }

    /// When the host loop should next call [`pump`](Self::pump).
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.phase {
            SyncPhase::Scheduled { deadline } => Some(deadline),
            _ => None,
        }
    }

    /// Feed one surface event. Returns true if it (re)scheduled a sync.
    pub fn handle_event(&mut self, event: SurfaceEvent, now: Instant) -> bool {
        if self.surface.is_none() || !event.kind.triggers_sync() {
            return false;
        }
        match self.phase {
            SyncPhase::Extracting => {
                log::trace!("ignoring self-triggered {:?} during extraction", event.kind);
                false
            }
            SyncPhase::Idle | SyncPhase::Scheduled { .. } => {
                log::trace!("sync scheduled by {:?}", event.kind);
                self.phase = SyncPhase::Scheduled {
                    deadline: now + self.debounce,
                };
                true
            }
        }
    }

    /// Drop a pending sync without running it.
    pub fn cancel(&mut self) {
        if let SyncPhase::Scheduled { .. } = self.phase {
            self.phase = SyncPhase::Idle;
        }
    }

    /// The surface now shows slide `index`.
    ///
    /// Pending work for the old slide is dropped and a short forced sync
    /// is scheduled to capture the new slide's initial state.
    pub fn switch_slide(&mut self, index: usize, now: Instant) {
        self.cancel();
        self.slide_index = index;
        if self.surface.is_some() {
            self.phase = SyncPhase::Scheduled {
                deadline: now + self.slide_switch_delay,
            };
        }
    }

    /// Put `elements` for slide `index` on the surface.
    ///
    /// Pending work is dropped. Events the reload makes the surface emit
    /// are discarded, so loading never schedules a sync of itself.
    pub fn load_slide(&mut self, index: usize, elements: &[Element]) {
        self.cancel();
        self.slide_index = index;
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        surface.load(elements);
        let echoes = surface.drain_events();
        if !echoes.is_empty() {
            log::trace!("discarding {} events from slide load", echoes.len());
        }
    }

    /// Drain surface events and run the sync if its deadline has passed.
    ///
    /// `on_slide_update` receives the slide index and the extracted
    /// records. Returns true if it was called.
    pub fn pump<F>(&mut self, now: Instant, on_slide_update: F) -> bool
    where
        F: FnOnce(usize, Vec<Element>),
    {
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };
        for event in surface.drain_events() {
            self.handle_event(event, now);
        }

        match self.phase {
            SyncPhase::Scheduled { deadline } if now >= deadline => {
                self.extract(now, on_slide_update)
            }
            _ => false,
        }
    }

    /// Sync immediately, ignoring the debounce.
    pub fn sync_now<F>(&mut self, now: Instant, on_slide_update: F) -> bool
    where
        F: FnOnce(usize, Vec<Element>),
    {
        if self.phase == SyncPhase::Extracting {
            return false;
        }
        self.extract(now, on_slide_update)
    }

    fn extract<F>(&mut self, now: Instant, on_slide_update: F) -> bool
    where
        F: FnOnce(usize, Vec<Element>),
    {
        let Some(surface) = self.surface.as_mut() else {
            self.phase = SyncPhase::Idle;
            return false;
        };
        self.phase = SyncPhase::Extracting;

        let committed = match surface.objects() {
            Ok(objects) => {
                let Extraction {
                    elements,
                    assigned_ids,
                } = extract_elements(&objects);
                // Write new ids back so the next extraction sees the same ones.
                for (position, id) in assigned_ids {
                    surface.assign_id(position, id);
                }
                log::trace!(
                    "syncing {} elements to slide {}",
                    elements.len(),
                    self.slide_index
                );
                on_slide_update(self.slide_index, elements);
                self.sync_count += 1;
                true
            }
            Err(err) => {
                log::warn!("canvas sync skipped: {err}");
                false
            }
        };

        // Whatever the write-back made the surface emit is rejected here.
        let echoes = surface.drain_events();
        for event in echoes {
            self.handle_event(event, now);
        }
        self.phase = SyncPhase::Idle;
        committed
    }
}
