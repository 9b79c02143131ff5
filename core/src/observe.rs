use log::{debug, error, info, warn};

use crate::error::{EngineError, HandshakeError};
use crate::media::Backend;

/// Something worth reporting about a player's lifecycle.
///
/// None of these are returned to the caller; players stay inert after a failure and
/// surface it here instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Acquisition of a new playback resource started
    Acquiring { media: String },
    /// The resource is live and the geometry applied
    Ready,
    /// The reference could not be resolved to something playable
    InvalidReference { media: String },
    /// The local engine refused to create or load a surface
    EngineFailure(EngineError),
    /// The hosting SDK handshake failed
    HandshakeFailed(HandshakeError),
    /// A handshake finished after its acquisition was superseded
    StaleHandshake { generation: u64 },
    /// Playback reached the end and the resource was torn down
    Completed,
    /// The live or pending resource was torn down on request
    Stopped,
}

/// Receives lifecycle notices from players
pub trait PlaybackObserver: Send + Sync {
    fn notice(&self, backend: Backend, notice: &Notice);
}

/// Default observer forwarding notices to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl PlaybackObserver for LogObserver {
    fn notice(&self, backend: Backend, notice: &Notice) {
        match notice {
            Notice::Acquiring { media } => info!("[{}] Acquiring playback for {}", backend, media),
            Notice::Ready => info!("[{}] Player is now ready to play", backend),
            Notice::InvalidReference { media } => {
                warn!("[{}] Invalid media reference: {}", backend, media)
            }
            Notice::EngineFailure(e) => error!("[{}] Media engine failure: {}", backend, e),
            Notice::HandshakeFailed(e) => {
                error!("[{}] Error while trying to initialize player: {}", backend, e)
            }
            Notice::StaleHandshake { generation } => debug!(
                "[{}] Discarding handshake result for superseded attempt {}",
                backend, generation
            ),
            Notice::Completed => info!("[{}] End of media reached", backend),
            Notice::Stopped => debug!("[{}] Playback stopped", backend),
        }
    }
}
