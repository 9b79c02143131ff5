pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod media;
pub mod observe;
pub mod session;
pub mod sim;

// Re-exports
pub use config::{HostedConfig, PlayerConfig};
pub use engine::{
    EmbedSurface, EndNotifier, HandshakeReply, HostContainer, HostedHandle, HostingSdk,
    MediaEngine, RenderSurface, SharedContainer, SurfaceFit, SurfaceId,
};
pub use error::{ConfigError, EngineError, HandshakeError};
pub use geometry::PlaybackGeometry;
pub use media::{
    Backend, EndHandler, HostedVideoPlayer, LocalMediaPlayer, MediaPlayer, VideoId,
    extract_video_id, is_hosted_url,
};
pub use observe::{LogObserver, Notice, PlaybackObserver};
pub use session::{BackendFactory, PlayerSession};

/// Detect which backend should play a media reference
pub fn detect_backend(media: &str) -> Backend {
    if is_hosted_url(media) {
        Backend::Hosted
    } else {
        Backend::Local
    }
}
