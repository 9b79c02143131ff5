//! Traits for the collaborators a player drives: the host container its surface lives in,
//! the local media engine and the hosting SDK. Implementations report asynchronous outcomes
//! through [`EndNotifier`] and [`HandshakeReply`], which queue events for the owning player
//! to apply on its next `update()`.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::error::SendError;

use crate::error::{EngineError, HandshakeError};
use crate::geometry::PlaybackGeometry;

/// Identifies a visual surface inside a host container
pub type SurfaceId = u64;

/// How a surface is laid out when added to its container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceFit {
    /// Stretch to the container bounds
    Fill,
    /// Size to the surface's own content
    Wrap,
}

/// The host view that player surfaces are attached to
pub trait HostContainer {
    fn add_surface(&mut self, id: SurfaceId, fit: SurfaceFit);
    fn remove_surface(&mut self, id: SurfaceId);
    /// Draw the surface above its siblings
    fn raise_surface(&mut self, id: SurfaceId);
}

/// A host container shared by every player placed in it
pub type SharedContainer = Arc<Mutex<dyn HostContainer + Send>>;

/// Generic decoding engine used by the local backend
pub trait MediaEngine: Send {
    /// Create a fresh render surface, not yet attached anywhere
    fn create_surface(&mut self) -> Result<Box<dyn RenderSurface>, EngineError>;
}

/// A live decode/render session created by a [`MediaEngine`]
pub trait RenderSurface: Send {
    fn id(&self) -> SurfaceId;

    /// Register the observer fired once when playback reaches the end
    fn set_completion_notifier(&mut self, notifier: EndNotifier);

    fn set_source(&mut self, uri: &str) -> Result<(), EngineError>;
    fn start(&mut self);
    fn pause(&mut self);
    fn stop_and_release(&mut self);
    fn seek_to(&mut self, millis: u64);

    fn position_ms(&self) -> u64;
    fn duration_ms(&self) -> u64;
    fn is_playing(&self) -> bool;

    fn set_position(&mut self, x: i32, y: i32);
    fn set_fixed_size(&mut self, width: u32, height: u32);
}

/// Client for the third-party video hosting service
pub trait HostingSdk: Send {
    /// Create the embeddable view the hosted player renders into
    fn create_surface(&mut self) -> Box<dyn EmbedSurface>;

    /// Start the initialization handshake for `surface`.
    ///
    /// Must return immediately. The outcome is delivered later through `reply`, from
    /// whatever context the SDK completes in.
    fn initialize(&mut self, api_key: &str, surface: SurfaceId, reply: HandshakeReply);
}

/// The embeddable view owned by a hosted player
pub trait EmbedSurface: Send {
    fn id(&self) -> SurfaceId;
    fn set_layout(&mut self, geometry: PlaybackGeometry);
}

/// Playback handle returned by a successful handshake
pub trait HostedHandle: Send {
    /// Hide the service's own controls
    fn set_chromeless(&mut self);
    fn disable_fullscreen_controls(&mut self);
    fn set_end_notifier(&mut self, notifier: EndNotifier);

    /// Load the video and begin playing it
    fn load(&mut self, video_id: &str);
    fn play(&mut self);
    fn pause(&mut self);
    fn seek_to(&mut self, millis: u64);

    fn current_ms(&self) -> u64;
    fn duration_ms(&self) -> u64;
    fn is_playing(&self) -> bool;

    fn release(&mut self);
}

/// Events queued by collaborators for the owning player
pub(crate) enum BackendEvent {
    HandshakeSucceeded {
        generation: u64,
        handle: Box<dyn HostedHandle>,
    },
    HandshakeFailed {
        generation: u64,
        error: HandshakeError,
    },
    Ended {
        generation: u64,
    },
}

/// Completion observer handed to a render surface or hosted handle
#[derive(Clone)]
pub struct EndNotifier {
    generation: u64,
    tx: UnboundedSender<BackendEvent>,
}

impl EndNotifier {
    pub(crate) fn new(generation: u64, tx: UnboundedSender<BackendEvent>) -> Self {
        Self { generation, tx }
    }

    /// Report that the media finished playing
    pub fn notify(&self) {
        // The player may already be gone
        let _ = self.tx.send(BackendEvent::Ended {
            generation: self.generation,
        });
    }
}

/// One-shot completion slot for an SDK handshake.
///
/// Dropping an unresolved reply reports the handshake as abandoned so the player
/// never waits on it forever.
pub struct HandshakeReply {
    generation: u64,
    tx: Option<UnboundedSender<BackendEvent>>,
}

impl HandshakeReply {
    pub(crate) fn new(generation: u64, tx: UnboundedSender<BackendEvent>) -> Self {
        Self {
            generation,
            tx: Some(tx),
        }
    }

    /// The acquisition attempt this reply belongs to
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn succeed(mut self, handle: Box<dyn HostedHandle>) {
        let event = BackendEvent::HandshakeSucceeded {
            generation: self.generation,
            handle,
        };
        let Some(tx) = self.tx.take() else {
            return;
        };
        // Nobody is left to own the handle, release it here
        if let Err(SendError(BackendEvent::HandshakeSucceeded { mut handle, .. })) = tx.send(event) {
            handle.release();
        }
    }

    pub fn fail(mut self, error: HandshakeError) {
        self.send_failure(error);
    }

    fn send_failure(&mut self, error: HandshakeError) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(BackendEvent::HandshakeFailed {
                generation: self.generation,
                error,
            });
        }
    }
}

impl Drop for HandshakeReply {
    fn drop(&mut self) {
        self.send_failure(HandshakeError::Other("handshake abandoned by SDK".to_string()));
    }
}
