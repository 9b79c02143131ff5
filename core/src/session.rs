use log::{debug, warn};

use crate::geometry::PlaybackGeometry;
use crate::media::{Backend, MediaPlayer};

/// Builds the player for a backend when a session switches to it
pub trait BackendFactory {
    /// `None` when the backend cannot be provided, e.g. no hosting SDK is configured
    fn create(&mut self, backend: Backend) -> Option<Box<dyn MediaPlayer>>;
}

impl<F> BackendFactory for F
where
    F: FnMut(Backend) -> Option<Box<dyn MediaPlayer>>,
{
    fn create(&mut self, backend: Backend) -> Option<Box<dyn MediaPlayer>> {
        self(backend)
    }
}

/// Holds at most one player and swaps it when a reference needs a different backend.
///
/// The session itself is a [`MediaPlayer`]; with no player every command is a no-op and
/// `provider()` reports [`Backend::None`].
pub struct PlayerSession {
    factory: Box<dyn BackendFactory>,
    player: Option<Box<dyn MediaPlayer>>,
    geometry: PlaybackGeometry,
}

impl PlayerSession {
    pub fn new<F>(factory: F) -> Self
    where
        F: BackendFactory + 'static,
    {
        Self {
            factory: Box::new(factory),
            player: None,
            geometry: PlaybackGeometry::default(),
        }
    }

    /// Start from `geometry` instead of the default 640x360 at the origin
    pub fn with_geometry(mut self, geometry: PlaybackGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Play `media` on an explicit backend, bypassing detection
    pub fn play_on(&mut self, backend: Backend, media: &str) {
        if let Some(player) = self.switch_to(backend) {
            player.play(media);
        }
    }

    /// The current player, if any
    pub fn player(&self) -> Option<&dyn MediaPlayer> {
        self.player.as_deref()
    }

    fn switch_to(&mut self, backend: Backend) -> Option<&mut Box<dyn MediaPlayer>> {
        let current = self.provider();
        if current != backend {
            if let Some(mut old) = self.player.take() {
                debug!("Switching backend from {} to {}", current, backend);
                old.stop();
            }

            if backend != Backend::None {
                match self.factory.create(backend) {
                    Some(mut player) => {
                        player.move_to(self.geometry.x, self.geometry.y);
                        player.resize(self.geometry.width, self.geometry.height);
                        self.player = Some(player);
                    }
                    None => warn!("No {} backend available", backend),
                }
            }
        }
        self.player.as_mut()
    }
}

impl MediaPlayer for PlayerSession {
    fn play(&mut self, media: &str) {
        self.play_on(crate::detect_backend(media), media);
    }

    fn resume(&mut self) {
        if let Some(player) = self.player.as_mut() {
            player.resume();
        }
    }

    fn pause(&mut self) {
        if let Some(player) = self.player.as_mut() {
            player.pause();
        }
    }

    fn stop(&mut self) {
        if let Some(player) = self.player.as_mut() {
            player.stop();
        }
    }

    fn seek(&mut self, millis: u64) {
        if let Some(player) = self.player.as_mut() {
            player.seek(millis);
        }
    }

    fn move_to(&mut self, x: i32, y: i32) {
        self.geometry.set_position(x, y);
        if let Some(player) = self.player.as_mut() {
            player.move_to(x, y);
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.geometry.set_size(width, height);
        if let Some(player) = self.player.as_mut() {
            player.resize(width, height);
        }
    }

    fn current_time(&self) -> Option<u64> {
        self.player.as_ref().and_then(|player| player.current_time())
    }

    fn total_time(&self) -> Option<u64> {
        self.player.as_ref().and_then(|player| player.total_time())
    }

    fn is_playing(&self) -> bool {
        self.player.as_ref().is_some_and(|player| player.is_playing())
    }

    fn bring_to_front(&mut self) {
        if let Some(player) = self.player.as_mut() {
            player.bring_to_front();
        }
    }

    fn provider(&self) -> Backend {
        self.player
            .as_ref()
            .map_or(Backend::None, |player| player.provider())
    }

    fn geometry(&self) -> PlaybackGeometry {
        self.geometry
    }

    fn update(&mut self) {
        if let Some(player) = self.player.as_mut() {
            player.update();
        }
    }
}
