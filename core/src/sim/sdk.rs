use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{Journal, describe_geometry, next_surface_id};
use crate::engine::{EmbedSurface, EndNotifier, HandshakeReply, HostedHandle, HostingSdk, SurfaceId};
use crate::error::HandshakeError;
use crate::geometry::PlaybackGeometry;

const DEFAULT_DURATION_MS: u64 = 30_000;

struct PendingHandshake {
    api_key: String,
    surface: SurfaceId,
    reply: HandshakeReply,
    waited_ms: u64,
}

struct HandleState {
    video_id: Option<String>,
    playing: bool,
    position_ms: u64,
    duration_ms: u64,
    released: bool,
    notifier: Option<EndNotifier>,
}

struct SdkState {
    pending: VecDeque<PendingHandshake>,
    handles: Vec<Arc<Mutex<HandleState>>>,
    duration_ms: u64,
    auto_complete_ms: Option<u64>,
}

/// Hosting SDK whose handshakes complete when the test or driver says so
#[derive(Clone)]
pub struct SimHostingSdk {
    state: Arc<Mutex<SdkState>>,
    journal: Journal,
}

impl SimHostingSdk {
    pub fn new(journal: Journal) -> Self {
        Self {
            state: Arc::new(Mutex::new(SdkState {
                pending: VecDeque::new(),
                handles: Vec::new(),
                duration_ms: DEFAULT_DURATION_MS,
                auto_complete_ms: None,
            })),
            journal,
        }
    }

    /// Length of every video loaded from now on
    pub fn with_duration(self, duration_ms: u64) -> Self {
        self.state.lock().duration_ms = duration_ms;
        self
    }

    /// Resolve handshakes on their own once `delay_ms` of clock time has passed
    pub fn with_auto_complete(self, delay_ms: u64) -> Self {
        self.state.lock().auto_complete_ms = Some(delay_ms);
        self
    }

    /// Handshakes started and not resolved yet
    pub fn pending_handshakes(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Resolve the oldest handshake the way the service would.
    ///
    /// An empty API key is refused; anything else succeeds. Returns false when nothing
    /// was pending.
    pub fn complete_next(&self) -> bool {
        let Some(pending) = self.state.lock().pending.pop_front() else {
            return false;
        };
        self.resolve(pending);
        true
    }

    /// Fail the oldest handshake with `error`
    pub fn fail_next(&self, error: HandshakeError) -> bool {
        let Some(pending) = self.state.lock().pending.pop_front() else {
            return false;
        };
        self.journal
            .record(format!("hosted handshake_failed {}", pending.surface));
        pending.reply.fail(error);
        true
    }

    /// Move the clock forward: resolve due handshakes, advance playing videos
    pub fn advance(&self, millis: u64) {
        let mut due = Vec::new();
        let mut finished = Vec::new();
        {
            let mut state = self.state.lock();
            let auto_complete = state.auto_complete_ms;
            if let Some(delay) = auto_complete {
                for pending in state.pending.iter_mut() {
                    pending.waited_ms += millis;
                }
                while state
                    .pending
                    .front()
                    .is_some_and(|pending| pending.waited_ms >= delay)
                {
                    if let Some(pending) = state.pending.pop_front() {
                        due.push(pending);
                    }
                }
            }

            state.handles.retain(|handle| !handle.lock().released);
            for handle in &state.handles {
                let mut handle = handle.lock();
                if !handle.playing {
                    continue;
                }
                handle.position_ms = (handle.position_ms + millis).min(handle.duration_ms);
                if handle.position_ms >= handle.duration_ms {
                    handle.playing = false;
                    if let Some(notifier) = handle.notifier.take() {
                        finished.push(notifier);
                    }
                }
            }
        }

        for pending in due {
            self.resolve(pending);
        }
        for notifier in finished {
            self.journal.record("hosted ended");
            notifier.notify();
        }
    }

    /// Handles handed out and not released yet
    pub fn live_handles(&self) -> usize {
        self.state
            .lock()
            .handles
            .iter()
            .filter(|handle| !handle.lock().released)
            .count()
    }

    /// Video id loaded by the most recent live handle
    pub fn current_video(&self) -> Option<String> {
        self.state
            .lock()
            .handles
            .iter()
            .rev()
            .find(|handle| !handle.lock().released)
            .and_then(|handle| handle.lock().video_id.clone())
    }

    fn resolve(&self, pending: PendingHandshake) {
        if pending.api_key.is_empty() {
            self.journal
                .record(format!("hosted handshake_failed {}", pending.surface));
            pending.reply.fail(HandshakeError::InvalidApiKey);
            return;
        }

        let handle = Arc::new(Mutex::new(HandleState {
            video_id: None,
            playing: false,
            position_ms: 0,
            duration_ms: self.state.lock().duration_ms,
            released: false,
            notifier: None,
        }));
        self.state.lock().handles.push(handle.clone());

        self.journal
            .record(format!("hosted handshake_ok {}", pending.surface));
        pending.reply.succeed(Box::new(SimHandle {
            state: handle,
            journal: self.journal.clone(),
        }));
    }
}

impl HostingSdk for SimHostingSdk {
    fn create_surface(&mut self) -> Box<dyn EmbedSurface> {
        let id = next_surface_id();
        self.journal.record(format!("hosted surface {}", id));
        Box::new(SimEmbedSurface {
            id,
            journal: self.journal.clone(),
        })
    }

    fn initialize(&mut self, api_key: &str, surface: SurfaceId, reply: HandshakeReply) {
        self.journal.record(format!(
            "hosted initialize {} attempt {}",
            surface,
            reply.generation()
        ));
        self.state.lock().pending.push_back(PendingHandshake {
            api_key: api_key.to_string(),
            surface,
            reply,
            waited_ms: 0,
        });
    }
}

struct SimEmbedSurface {
    id: SurfaceId,
    journal: Journal,
}

impl EmbedSurface for SimEmbedSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn set_layout(&mut self, geometry: PlaybackGeometry) {
        self.journal
            .record(format!("hosted layout {}", describe_geometry(&geometry)));
    }
}

struct SimHandle {
    state: Arc<Mutex<HandleState>>,
    journal: Journal,
}

impl HostedHandle for SimHandle {
    fn set_chromeless(&mut self) {
        self.journal.record("hosted chromeless");
    }

    fn disable_fullscreen_controls(&mut self) {
        self.journal.record("hosted no_fullscreen");
    }

    fn set_end_notifier(&mut self, notifier: EndNotifier) {
        self.state.lock().notifier = Some(notifier);
    }

    fn load(&mut self, video_id: &str) {
        let mut state = self.state.lock();
        if state.released {
            return;
        }
        state.video_id = Some(video_id.to_string());
        state.position_ms = 0;
        state.playing = true;
        self.journal.record(format!("hosted load {}", video_id));
    }

    fn play(&mut self) {
        let mut state = self.state.lock();
        if state.released || state.video_id.is_none() {
            return;
        }
        state.playing = true;
        self.journal.record("hosted play");
    }

    fn pause(&mut self) {
        self.state.lock().playing = false;
        self.journal.record("hosted pause");
    }

    fn seek_to(&mut self, millis: u64) {
        let mut state = self.state.lock();
        state.position_ms = millis.min(state.duration_ms);
        self.journal.record(format!("hosted seek {}", millis));
    }

    fn current_ms(&self) -> u64 {
        self.state.lock().position_ms
    }

    fn duration_ms(&self) -> u64 {
        self.state.lock().duration_ms
    }

    fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    fn release(&mut self) {
        let mut state = self.state.lock();
        state.playing = false;
        state.released = true;
        state.notifier = None;
        self.journal.record("hosted release");
    }
}
