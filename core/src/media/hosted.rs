use std::sync::Arc;

use log::debug;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::engine::{
    BackendEvent, EmbedSurface, EndNotifier, HandshakeReply, HostedHandle, HostingSdk,
    SharedContainer, SurfaceFit,
};
use crate::error::HandshakeError;
use crate::geometry::PlaybackGeometry;
use crate::observe::{LogObserver, Notice, PlaybackObserver};
use crate::{Backend, EndHandler, MediaPlayer};

use super::millis_to_secs;
use super::video_id::{VideoId, extract_video_id};

/// Where the hosted player is in acquiring its playback resource
enum Acquisition {
    Idle,
    /// Surface created, waiting on the SDK handshake. Not attached to the container yet
    Pending {
        surface: Box<dyn EmbedSurface>,
        video_id: VideoId,
    },
    Live {
        surface: Box<dyn EmbedSurface>,
        handle: Box<dyn HostedHandle>,
    },
}

/// A player for videos on the hosting service.
///
/// `play` takes a URL, resolves it to a video id and starts the SDK handshake. Playback
/// begins once the handshake result is applied by `update`. Any `play` or `stop` issued in
/// between supersedes the attempt, and a late success for it is released without ever
/// touching the container.
pub struct HostedVideoPlayer {
    container: SharedContainer,
    sdk: Box<dyn HostingSdk>,
    api_key: String,
    on_end: EndHandler,
    observer: Arc<dyn PlaybackObserver>,
    geometry: PlaybackGeometry,
    state: Acquisition,
    /// Acquisition attempt counter, bumped on every teardown
    generation: u64,
    events_tx: UnboundedSender<BackendEvent>,
    events_rx: UnboundedReceiver<BackendEvent>,
}

impl HostedVideoPlayer {
    /// Create a hosted player placed in `container`.
    ///
    /// `api_key` is passed unchanged to the SDK on every handshake. `on_end` runs after each
    /// video finishes and its resource has been released.
    pub fn new<F>(
        container: SharedContainer,
        sdk: Box<dyn HostingSdk>,
        api_key: impl Into<String>,
        on_end: F,
    ) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let (events_tx, events_rx) = unbounded_channel();
        Self {
            container,
            sdk,
            api_key: api_key.into(),
            on_end: Box::new(on_end),
            observer: Arc::new(LogObserver),
            geometry: PlaybackGeometry::default(),
            state: Acquisition::Idle,
            generation: 0,
            events_tx,
            events_rx,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PlaybackObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// True while a handshake is outstanding for the current attempt
    pub fn is_initializing(&self) -> bool {
        matches!(self.state, Acquisition::Pending { .. })
    }

    /// Release the SDK resource and detach the surface, or abandon a pending handshake
    fn delete_player(&mut self) -> bool {
        self.generation += 1;
        match std::mem::replace(&mut self.state, Acquisition::Idle) {
            Acquisition::Idle => false,
            Acquisition::Pending { .. } => true,
            Acquisition::Live {
                surface,
                mut handle,
            } => {
                handle.release();
                self.container.lock().remove_surface(surface.id());
                true
            }
        }
    }

    fn on_handshake_success(&mut self, generation: u64, mut handle: Box<dyn HostedHandle>) {
        if generation != self.generation {
            handle.release();
            self.notice(Notice::StaleHandshake { generation });
            return;
        }

        let (mut surface, video_id) = match std::mem::replace(&mut self.state, Acquisition::Idle) {
            Acquisition::Pending { surface, video_id } => (surface, video_id),
            other => {
                self.state = other;
                handle.release();
                self.notice(Notice::StaleHandshake { generation });
                return;
            }
        };

        handle.set_chromeless();
        handle.disable_fullscreen_controls();
        handle.set_end_notifier(EndNotifier::new(generation, self.events_tx.clone()));
        handle.load(video_id.as_str());

        self.container.lock().add_surface(surface.id(), SurfaceFit::Wrap);
        surface.set_layout(self.geometry);

        self.state = Acquisition::Live { surface, handle };
        self.notice(Notice::Ready);
    }

    fn on_handshake_failure(&mut self, generation: u64, error: HandshakeError) {
        if generation != self.generation || !self.is_initializing() {
            debug!("Ignoring handshake failure for superseded attempt {}: {}", generation, error);
            return;
        }
        self.state = Acquisition::Idle;
        self.notice(Notice::HandshakeFailed(error));
    }

    fn on_video_ended(&mut self, generation: u64) {
        if generation != self.generation || !matches!(self.state, Acquisition::Live { .. }) {
            debug!("Ignoring end of superseded video {}", generation);
            return;
        }
        self.delete_player();
        self.notice(Notice::Completed);
        (self.on_end)();
    }

    fn handle(&self) -> Option<&dyn HostedHandle> {
        match &self.state {
            Acquisition::Live { handle, .. } => Some(&**handle),
            _ => None,
        }
    }

    fn handle_mut(&mut self) -> Option<&mut Box<dyn HostedHandle>> {
        match &mut self.state {
            Acquisition::Live { handle, .. } => Some(handle),
            _ => None,
        }
    }

    fn notice(&self, notice: Notice) {
        self.observer.notice(Backend::Hosted, &notice);
    }
}

impl MediaPlayer for HostedVideoPlayer {
    fn play(&mut self, url: &str) {
        self.delete_player();

        let Some(video_id) = extract_video_id(url) else {
            self.notice(Notice::InvalidReference {
                media: url.to_string(),
            });
            return;
        };

        self.notice(Notice::Acquiring {
            media: url.to_string(),
        });
        let surface = self.sdk.create_surface();
        let reply = HandshakeReply::new(self.generation, self.events_tx.clone());
        self.sdk.initialize(&self.api_key, surface.id(), reply);
        self.state = Acquisition::Pending { surface, video_id };
    }

    fn resume(&mut self) {
        if let Some(handle) = self.handle_mut() {
            handle.play();
        }
    }

    fn pause(&mut self) {
        if let Some(handle) = self.handle_mut() {
            handle.pause();
        }
    }

    fn stop(&mut self) {
        if self.delete_player() {
            self.notice(Notice::Stopped);
        }
    }

    fn seek(&mut self, millis: u64) {
        if let Some(handle) = self.handle_mut() {
            handle.seek_to(millis);
        }
    }

    fn move_to(&mut self, x: i32, y: i32) {
        self.geometry.set_position(x, y);
        if let Acquisition::Live { surface, .. } = &mut self.state {
            surface.set_layout(self.geometry);
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.geometry.set_size(width, height);
        if let Acquisition::Live { surface, .. } = &mut self.state {
            surface.set_layout(self.geometry);
        }
    }

    fn current_time(&self) -> Option<u64> {
        self.handle().map(|handle| millis_to_secs(handle.current_ms()))
    }

    fn total_time(&self) -> Option<u64> {
        self.handle().map(|handle| millis_to_secs(handle.duration_ms()))
    }

    fn is_playing(&self) -> bool {
        self.handle().is_some_and(|handle| handle.is_playing())
    }

    fn bring_to_front(&mut self) {
        if let Acquisition::Live { surface, .. } = &self.state {
            self.container.lock().raise_surface(surface.id());
        }
    }

    fn provider(&self) -> Backend {
        Backend::Hosted
    }

    fn geometry(&self) -> PlaybackGeometry {
        self.geometry
    }

    fn update(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                BackendEvent::HandshakeSucceeded { generation, handle } => {
                    self.on_handshake_success(generation, handle)
                }
                BackendEvent::HandshakeFailed { generation, error } => {
                    self.on_handshake_failure(generation, error)
                }
                BackendEvent::Ended { generation } => self.on_video_ended(generation),
            }
        }
    }
}

impl Drop for HostedVideoPlayer {
    fn drop(&mut self) {
        self.delete_player();
        // Handshakes already answered but not applied still hold SDK handles
        while let Ok(event) = self.events_rx.try_recv() {
            if let BackendEvent::HandshakeSucceeded { mut handle, .. } = event {
                handle.release();
            }
        }
    }
}
