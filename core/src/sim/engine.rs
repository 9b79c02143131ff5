use std::sync::Arc;

use parking_lot::Mutex;

use super::{Journal, describe_geometry, next_surface_id};
use crate::engine::{EndNotifier, MediaEngine, RenderSurface, SurfaceId};
use crate::error::EngineError;
use crate::geometry::PlaybackGeometry;

const DEFAULT_DURATION_MS: u64 = 10_000;

struct SurfaceState {
    source: Option<String>,
    playing: bool,
    position_ms: u64,
    duration_ms: u64,
    released: bool,
    notifier: Option<EndNotifier>,
}

struct EngineState {
    surfaces: Vec<Arc<Mutex<SurfaceState>>>,
    duration_ms: u64,
    rejected_sources: Vec<String>,
    surface_unavailable: bool,
    last_geometry: Option<PlaybackGeometry>,
}

/// Media engine that "decodes" by advancing a position counter
#[derive(Clone)]
pub struct SimMediaEngine {
    state: Arc<Mutex<EngineState>>,
    journal: Journal,
}

impl SimMediaEngine {
    pub fn new(journal: Journal) -> Self {
        Self {
            state: Arc::new(Mutex::new(EngineState {
                surfaces: Vec::new(),
                duration_ms: DEFAULT_DURATION_MS,
                rejected_sources: Vec::new(),
                surface_unavailable: false,
                last_geometry: None,
            })),
            journal,
        }
    }

    /// Length of every media loaded from now on
    pub fn with_duration(self, duration_ms: u64) -> Self {
        self.state.lock().duration_ms = duration_ms;
        self
    }

    /// Make `set_source` fail for `uri`
    pub fn reject_source(&self, uri: impl Into<String>) {
        self.state.lock().rejected_sources.push(uri.into());
    }

    /// Make `create_surface` fail until switched back
    pub fn set_surface_unavailable(&self, unavailable: bool) {
        self.state.lock().surface_unavailable = unavailable;
    }

    /// Move the clock forward for every playing surface, firing completion at the end
    pub fn advance(&self, millis: u64) {
        let mut finished = Vec::new();
        {
            let mut state = self.state.lock();
            state.surfaces.retain(|surface| !surface.lock().released);

            for surface in &state.surfaces {
                let mut surface = surface.lock();
                if !surface.playing {
                    continue;
                }
                surface.position_ms = (surface.position_ms + millis).min(surface.duration_ms);
                if surface.position_ms >= surface.duration_ms {
                    surface.playing = false;
                    if let Some(notifier) = surface.notifier.take() {
                        finished.push(notifier);
                    }
                }
            }
        }

        for notifier in finished {
            self.journal.record("local complete");
            notifier.notify();
        }
    }

    /// Surfaces created and not yet released
    pub fn live_surfaces(&self) -> usize {
        self.state
            .lock()
            .surfaces
            .iter()
            .filter(|surface| !surface.lock().released)
            .count()
    }

    /// Source of the most recently created live surface
    pub fn current_source(&self) -> Option<String> {
        self.state
            .lock()
            .surfaces
            .iter()
            .rev()
            .find(|surface| !surface.lock().released)
            .and_then(|surface| surface.lock().source.clone())
    }

    /// Geometry most recently pushed to any surface
    pub fn last_geometry(&self) -> Option<PlaybackGeometry> {
        self.state.lock().last_geometry
    }
}

impl MediaEngine for SimMediaEngine {
    fn create_surface(&mut self) -> Result<Box<dyn RenderSurface>, EngineError> {
        let mut state = self.state.lock();
        if state.surface_unavailable {
            return Err(EngineError::SurfaceUnavailable(
                "simulated engine is offline".to_string(),
            ));
        }

        let surface = Arc::new(Mutex::new(SurfaceState {
            source: None,
            playing: false,
            position_ms: 0,
            duration_ms: state.duration_ms,
            released: false,
            notifier: None,
        }));
        state.surfaces.push(surface.clone());

        let id = next_surface_id();
        self.journal.record(format!("local create {}", id));
        Ok(Box::new(SimSurface {
            id,
            state: surface,
            engine: self.state.clone(),
            journal: self.journal.clone(),
        }))
    }
}

struct SimSurface {
    id: SurfaceId,
    state: Arc<Mutex<SurfaceState>>,
    engine: Arc<Mutex<EngineState>>,
    journal: Journal,
}

impl SimSurface {
    fn push_geometry(&self, update: impl FnOnce(&mut PlaybackGeometry)) {
        let mut engine = self.engine.lock();
        let mut geometry = engine.last_geometry.unwrap_or_default();
        update(&mut geometry);
        engine.last_geometry = Some(geometry);
    }
}

impl RenderSurface for SimSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn set_completion_notifier(&mut self, notifier: EndNotifier) {
        self.state.lock().notifier = Some(notifier);
    }

    fn set_source(&mut self, uri: &str) -> Result<(), EngineError> {
        if self
            .engine
            .lock()
            .rejected_sources
            .iter()
            .any(|rejected| rejected == uri)
        {
            return Err(EngineError::SourceRejected {
                uri: uri.to_string(),
                reason: "unsupported format".to_string(),
            });
        }
        self.journal.record(format!("local source {}", uri));
        self.state.lock().source = Some(uri.to_string());
        Ok(())
    }

    fn start(&mut self) {
        let mut state = self.state.lock();
        if state.released || state.source.is_none() {
            return;
        }
        // Starting again after the end restarts from the beginning
        if state.position_ms >= state.duration_ms {
            state.position_ms = 0;
        }
        state.playing = true;
        self.journal.record("local start");
    }

    fn pause(&mut self) {
        self.state.lock().playing = false;
        self.journal.record("local pause");
    }

    fn stop_and_release(&mut self) {
        let mut state = self.state.lock();
        state.playing = false;
        state.released = true;
        state.notifier = None;
        self.journal.record("local stop_release");
    }

    fn seek_to(&mut self, millis: u64) {
        let mut state = self.state.lock();
        state.position_ms = millis.min(state.duration_ms);
        self.journal.record(format!("local seek {}", millis));
    }

    fn position_ms(&self) -> u64 {
        self.state.lock().position_ms
    }

    fn duration_ms(&self) -> u64 {
        self.state.lock().duration_ms
    }

    fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    fn set_position(&mut self, x: i32, y: i32) {
        self.push_geometry(|geometry| geometry.set_position(x, y));
        self.journal.record(format!("local position {},{}", x, y));
    }

    fn set_fixed_size(&mut self, width: u32, height: u32) {
        self.push_geometry(|geometry| geometry.set_size(width, height));
        if let Some(geometry) = self.engine.lock().last_geometry {
            self.journal
                .record(format!("local layout {}", describe_geometry(&geometry)));
        }
    }
}
