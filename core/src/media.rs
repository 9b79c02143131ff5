mod hosted;
mod local;
#[cfg(test)]
mod tests;
mod video_id;

use std::fmt;

pub use hosted::HostedVideoPlayer;
pub use local::LocalMediaPlayer;
pub use video_id::{VideoId, extract_video_id, is_hosted_url};

use crate::geometry::PlaybackGeometry;

/// Which playback engine a player wraps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Local file or direct stream, played by the media engine
    Local,
    /// Video resolved through the hosting service SDK
    Hosted,
    /// No engine; every command is a no-op
    None,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Backend::Local => "local",
            Backend::Hosted => "hosted",
            Backend::None => "none",
        };
        f.write_str(name)
    }
}

/// Handler invoked once per completed playback, after its resource is torn down
pub type EndHandler = Box<dyn FnMut() + Send>;

/// Common for all media players
pub trait MediaPlayer {
    /// Tear down any live resource and start acquiring one for `media`.
    ///
    /// Returns immediately. Whether playback actually started is observed later through
    /// `is_playing`, the time queries or the end handler.
    fn play(&mut self, media: &str);

    /// Resume after `pause`. No-op when nothing is live
    fn resume(&mut self);

    /// Pause the current media. No-op when nothing is live
    fn pause(&mut self);

    /// Tear down the current media. It cannot be resumed afterwards, only replaced by `play`
    fn stop(&mut self);

    /// Move playback to `millis` milliseconds from the start
    fn seek(&mut self, millis: u64);

    /// Move the upper left corner of the surface, relative to the host container
    fn move_to(&mut self, x: i32, y: i32);

    fn resize(&mut self, width: u32, height: u32);

    /// Elapsed time in whole seconds, `None` when nothing is live
    fn current_time(&self) -> Option<u64>;

    /// Total duration in whole seconds, `None` when nothing is live
    fn total_time(&self) -> Option<u64>;

    fn is_playing(&self) -> bool;

    /// Raise the surface above its siblings in the host container
    fn bring_to_front(&mut self);

    /// The backend this player was built for; never changes
    fn provider(&self) -> Backend;

    /// Last geometry requested through `move_to`/`resize`
    fn geometry(&self) -> PlaybackGeometry;

    /// Apply notifications queued by the backend since the last call.
    ///
    /// The host event loop calls this on every tick; handshake results and end-of-media
    /// callbacks only take effect here.
    fn update(&mut self);
}

/// Whole seconds from an engine's millisecond value
pub(crate) fn millis_to_secs(millis: u64) -> u64 {
    millis / 1000
}
