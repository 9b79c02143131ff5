use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dualplay_core::sim::{Journal, SimContainer, SimHostingSdk, SimMediaEngine};
use dualplay_core::{
    Backend, BackendFactory, HostedVideoPlayer, LocalMediaPlayer, LogObserver, MediaPlayer,
    Notice, PlaybackObserver, PlayerConfig, PlayerSession, SharedContainer,
};
use log::{info, warn};

use crate::commands::{Command, CommandHandler, TimedCommand};

/// Behaviour of the headless engines the app plays against
#[derive(Debug, Clone, Copy)]
pub struct SimOptions {
    /// Length of every simulated media
    pub duration_ms: u64,
    /// Time the hosting SDK takes to answer a handshake
    pub handshake_delay_ms: u64,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            duration_ms: 5_000,
            handshake_delay_ms: 300,
        }
    }
}

/// Logs every notice and flags the ones that mean the current media will never play
struct QueueObserver {
    failed: Arc<AtomicBool>,
}

impl PlaybackObserver for QueueObserver {
    fn notice(&self, backend: Backend, notice: &Notice) {
        LogObserver.notice(backend, notice);
        if matches!(
            notice,
            Notice::InvalidReference { .. } | Notice::EngineFailure(_) | Notice::HandshakeFailed(_)
        ) {
            self.failed.store(true, Ordering::SeqCst);
        }
    }
}

/// Builds players wired to the headless engines
struct SimBackends {
    container: SharedContainer,
    engine: SimMediaEngine,
    sdk: SimHostingSdk,
    api_key: String,
    observer: Arc<dyn PlaybackObserver>,
    ended: Arc<AtomicBool>,
}

impl BackendFactory for SimBackends {
    fn create(&mut self, backend: Backend) -> Option<Box<dyn MediaPlayer>> {
        let ended = self.ended.clone();
        let on_end = move || ended.store(true, Ordering::SeqCst);

        match backend {
            Backend::Local => Some(Box::new(
                LocalMediaPlayer::new(self.container.clone(), Box::new(self.engine.clone()), on_end)
                    .with_observer(self.observer.clone()),
            )),
            Backend::Hosted => Some(Box::new(
                HostedVideoPlayer::new(
                    self.container.clone(),
                    Box::new(self.sdk.clone()),
                    self.api_key.clone(),
                    on_end,
                )
                .with_observer(self.observer.clone()),
            )),
            Backend::None => None,
        }
    }
}

/// Main application state
pub struct App {
    session: PlayerSession,
    engine: SimMediaEngine,
    sdk: SimHostingSdk,
    /// Media references still to play
    queue: VecDeque<String>,
    /// Scheduled commands, earliest first
    commands: VecDeque<TimedCommand>,
    elapsed_ms: u64,
    ended: Arc<AtomicBool>,
    failed: Arc<AtomicBool>,
    /// Whether the app should exit
    pub should_quit: bool,
}

impl App {
    pub fn new(
        config: &PlayerConfig,
        options: SimOptions,
        media: Vec<String>,
        mut commands: Vec<TimedCommand>,
    ) -> Self {
        commands.sort_by_key(|timed| timed.at_ms);

        let journal = Journal::new();
        let container = SimContainer::new(journal.clone());
        let engine = SimMediaEngine::new(journal.clone()).with_duration(options.duration_ms);
        let sdk = SimHostingSdk::new(journal)
            .with_duration(options.duration_ms)
            .with_auto_complete(options.handshake_delay_ms);

        let ended = Arc::new(AtomicBool::new(false));
        let failed = Arc::new(AtomicBool::new(false));
        let backends = SimBackends {
            container: container.shared(),
            engine: engine.clone(),
            sdk: sdk.clone(),
            api_key: config.hosted.api_key.clone(),
            observer: Arc::new(QueueObserver {
                failed: failed.clone(),
            }),
            ended: ended.clone(),
        };

        Self {
            session: PlayerSession::new(backends).with_geometry(config.geometry),
            engine,
            sdk,
            queue: media.into(),
            commands: commands.into(),
            elapsed_ms: 0,
            ended,
            failed,
            should_quit: false,
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn session(&self) -> &PlayerSession {
        &self.session
    }

    /// Start the first media in the queue
    pub fn start(&mut self) {
        self.play_next();
    }

    /// Advance the simulated clock by `millis` and apply whatever happened
    pub fn tick(&mut self, millis: u64) {
        self.elapsed_ms += millis;
        self.engine.advance(millis);
        self.sdk.advance(millis);
        self.session.update();

        while self
            .commands
            .front()
            .is_some_and(|timed| timed.at_ms <= self.elapsed_ms)
        {
            if let Some(timed) = self.commands.pop_front() {
                self.apply(timed.command);
            }
        }

        if self.ended.swap(false, Ordering::SeqCst) {
            self.play_next();
        } else if self.failed.swap(false, Ordering::SeqCst) {
            warn!("Skipping media that could not be played");
            self.play_next();
        }
    }

    fn apply(&mut self, command: Command) {
        if let Some(status) = CommandHandler::execute(&mut self.session, command) {
            info!("{}", status);
        }
        if command == Command::Stop {
            self.play_next();
        }
    }

    fn play_next(&mut self) {
        self.ended.store(false, Ordering::SeqCst);
        self.failed.store(false, Ordering::SeqCst);

        match self.queue.pop_front() {
            Some(media) => {
                info!("Playing {}", media);
                self.session.play(&media);
            }
            None => {
                info!("Queue finished");
                self.session.stop();
                self.should_quit = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dualplay_core::PlaybackGeometry;

    fn options() -> SimOptions {
        SimOptions {
            duration_ms: 1_000,
            handshake_delay_ms: 200,
        }
    }

    fn config(api_key: &str) -> PlayerConfig {
        let mut config = PlayerConfig::default();
        config.hosted.api_key = api_key.to_string();
        config
    }

    fn run(app: &mut App, limit_ms: u64) {
        while !app.should_quit && app.elapsed_ms() < limit_ms {
            app.tick(100);
        }
    }

    #[test]
    fn test_plays_queue_in_order() {
        let mut app = App::new(
            &config("key"),
            options(),
            vec![
                "/media/a.mp4".to_string(),
                "https://youtu.be/dQw4w9WgXcQ".to_string(),
            ],
            Vec::new(),
        );

        app.start();
        assert_eq!(app.session().provider(), Backend::Local);

        while app.session().provider() == Backend::Local && app.elapsed_ms() < 5_000 {
            app.tick(100);
        }
        assert_eq!(app.session().provider(), Backend::Hosted);

        run(&mut app, 10_000);
        assert!(app.should_quit);
        assert!(app.elapsed_ms() < 10_000);
    }

    #[test]
    fn test_unplayable_media_is_skipped() {
        let mut app = App::new(
            &config(""),
            options(),
            vec![
                "https://youtu.be/dQw4w9WgXcQ".to_string(),
                "https://www.youtube.com/watch?v=".to_string(),
            ],
            Vec::new(),
        );
        app.start();
        run(&mut app, 10_000);
        assert!(app.should_quit);
        assert!(!app.session().is_playing());
    }

    #[test]
    fn test_scheduled_commands() {
        let commands = vec![
            "300:resize 320 240".parse().unwrap(),
            "100:pause".parse().unwrap(),
        ];
        let mut app = App::new(
            &config("key"),
            options(),
            vec!["/media/a.mp4".to_string()],
            commands,
        );

        app.start();
        app.tick(100);
        assert!(!app.session().is_playing());

        app.tick(200);
        assert_eq!(app.session().geometry(), PlaybackGeometry::new(0, 0, 320, 240));
        assert!(!app.should_quit);
    }

    #[test]
    fn test_stop_moves_to_next_media() {
        let mut app = App::new(
            &config("key"),
            options(),
            vec!["/media/a.mp4".to_string(), "/media/b.mp4".to_string()],
            vec!["100:stop".parse().unwrap(), "200:stop".parse().unwrap()],
        );

        app.start();
        app.tick(100);
        assert!(app.session().is_playing());
        app.tick(100);
        assert!(app.should_quit);
    }
}
