use std::sync::Arc;

use log::debug;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::engine::{
    BackendEvent, EndNotifier, MediaEngine, RenderSurface, SharedContainer, SurfaceFit,
};
use crate::error::EngineError;
use crate::geometry::PlaybackGeometry;
use crate::observe::{LogObserver, Notice, PlaybackObserver};
use crate::{Backend, EndHandler, MediaPlayer};

use super::millis_to_secs;

/// A player for local files and direct stream URLs
pub struct LocalMediaPlayer {
    container: SharedContainer,
    engine: Box<dyn MediaEngine>,
    on_end: EndHandler,
    observer: Arc<dyn PlaybackObserver>,
    geometry: PlaybackGeometry,
    /// The live playback resource, if any
    surface: Option<Box<dyn RenderSurface>>,
    /// Bumped on every teardown so completions from an old surface are ignored
    generation: u64,
    events_tx: UnboundedSender<BackendEvent>,
    events_rx: UnboundedReceiver<BackendEvent>,
}

impl LocalMediaPlayer {
    /// Create a new local media player placed in `container`.
    ///
    /// `on_end` runs after each media finishes and its surface has been removed.
    pub fn new<F>(container: SharedContainer, engine: Box<dyn MediaEngine>, on_end: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let (events_tx, events_rx) = unbounded_channel();
        Self {
            container,
            engine,
            on_end: Box::new(on_end),
            observer: Arc::new(LogObserver),
            geometry: PlaybackGeometry::default(),
            surface: None,
            generation: 0,
            events_tx,
            events_rx,
        }
    }

    /// Report lifecycle notices to `observer` instead of the log
    pub fn with_observer(mut self, observer: Arc<dyn PlaybackObserver>) -> Self {
        self.observer = observer;
        self
    }

    fn acquire(&mut self, media: &str) -> Result<Box<dyn RenderSurface>, EngineError> {
        let mut surface = self.engine.create_surface()?;
        surface.set_completion_notifier(EndNotifier::new(self.generation, self.events_tx.clone()));
        self.container.lock().add_surface(surface.id(), SurfaceFit::Fill);

        if let Err(e) = surface.set_source(media) {
            surface.stop_and_release();
            self.container.lock().remove_surface(surface.id());
            return Err(e);
        }

        surface.start();
        surface.set_position(self.geometry.x, self.geometry.y);
        surface.set_fixed_size(self.geometry.width, self.geometry.height);
        Ok(surface)
    }

    /// Stop the engine and take the surface out of the container
    fn delete_surface(&mut self) -> bool {
        self.generation += 1;
        match self.surface.take() {
            Some(mut surface) => {
                surface.stop_and_release();
                self.container.lock().remove_surface(surface.id());
                true
            }
            None => false,
        }
    }

    fn notice(&self, notice: Notice) {
        self.observer.notice(Backend::Local, &notice);
    }
}

impl MediaPlayer for LocalMediaPlayer {
    fn play(&mut self, media: &str) {
        self.delete_surface();
        self.notice(Notice::Acquiring {
            media: media.to_string(),
        });

        match self.acquire(media) {
            Ok(surface) => {
                self.surface = Some(surface);
                self.notice(Notice::Ready);
            }
            Err(e) => self.notice(Notice::EngineFailure(e)),
        }
    }

    fn resume(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.start();
        }
    }

    fn pause(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.pause();
        }
    }

    fn stop(&mut self) {
        if self.delete_surface() {
            self.notice(Notice::Stopped);
        }
    }

    fn seek(&mut self, millis: u64) {
        if let Some(surface) = self.surface.as_mut() {
            surface.seek_to(millis);
        }
    }

    fn move_to(&mut self, x: i32, y: i32) {
        self.geometry.set_position(x, y);
        if let Some(surface) = self.surface.as_mut() {
            surface.set_position(x, y);
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.geometry.set_size(width, height);
        if let Some(surface) = self.surface.as_mut() {
            surface.set_fixed_size(width, height);
        }
    }

    fn current_time(&self) -> Option<u64> {
        self.surface
            .as_ref()
            .map(|surface| millis_to_secs(surface.position_ms()))
    }

    fn total_time(&self) -> Option<u64> {
        self.surface
            .as_ref()
            .map(|surface| millis_to_secs(surface.duration_ms()))
    }

    fn is_playing(&self) -> bool {
        self.surface
            .as_ref()
            .is_some_and(|surface| surface.is_playing())
    }

    fn bring_to_front(&mut self) {
        if let Some(surface) = self.surface.as_ref() {
            self.container.lock().raise_surface(surface.id());
        }
    }

    fn provider(&self) -> Backend {
        Backend::Local
    }

    fn geometry(&self) -> PlaybackGeometry {
        self.geometry
    }

    fn update(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                BackendEvent::Ended { generation }
                    if generation == self.generation && self.surface.is_some() =>
                {
                    self.delete_surface();
                    self.notice(Notice::Completed);
                    (self.on_end)();
                }
                BackendEvent::Ended { generation } => {
                    debug!("Ignoring completion from superseded surface {}", generation);
                }
                // The media engine never performs a handshake
                BackendEvent::HandshakeSucceeded { .. } | BackendEvent::HandshakeFailed { .. } => {}
            }
        }
    }
}

impl Drop for LocalMediaPlayer {
    fn drop(&mut self) {
        self.delete_surface();
    }
}
