use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::engine::SurfaceFit;
use crate::error::HandshakeError;
use crate::geometry::PlaybackGeometry;
use crate::observe::Notice;
use crate::observe::tests::RecordingObserver;
use crate::sim::{Journal, SimContainer, SimHostingSdk, SimMediaEngine};

const FIRST_VIDEO: &str = "https://youtu.be/dQw4w9WgXcQ";
const SECOND_VIDEO: &str = "https://www.youtube.com/watch?v=9bZkp7q19f0";

/// Everything a test needs to drive one player and inspect its collaborators
struct Fixture<P> {
    journal: Journal,
    container: SimContainer,
    observer: RecordingObserver,
    ends: Arc<AtomicUsize>,
    player: P,
}

impl<P> Fixture<P> {
    fn ends(&self) -> usize {
        self.ends.load(Ordering::SeqCst)
    }
}

fn end_counter(journal: &Journal) -> (Arc<AtomicUsize>, impl FnMut() + Send + 'static) {
    let ends = Arc::new(AtomicUsize::new(0));
    let counter = ends.clone();
    let journal = journal.clone();
    let on_end = move || {
        counter.fetch_add(1, Ordering::SeqCst);
        journal.record("on_end");
    };
    (ends, on_end)
}

fn local_player(duration_ms: u64) -> (Fixture<LocalMediaPlayer>, SimMediaEngine) {
    let journal = Journal::new();
    let container = SimContainer::new(journal.clone());
    let engine = SimMediaEngine::new(journal.clone()).with_duration(duration_ms);
    let observer = RecordingObserver::default();
    let (ends, on_end) = end_counter(&journal);

    let player = LocalMediaPlayer::new(container.shared(), Box::new(engine.clone()), on_end)
        .with_observer(Arc::new(observer.clone()));

    let fixture = Fixture {
        journal,
        container,
        observer,
        ends,
        player,
    };
    (fixture, engine)
}

fn hosted_player(api_key: &str, duration_ms: u64) -> (Fixture<HostedVideoPlayer>, SimHostingSdk) {
    let journal = Journal::new();
    let container = SimContainer::new(journal.clone());
    let sdk = SimHostingSdk::new(journal.clone()).with_duration(duration_ms);
    let observer = RecordingObserver::default();
    let (ends, on_end) = end_counter(&journal);

    let player = HostedVideoPlayer::new(container.shared(), Box::new(sdk.clone()), api_key, on_end)
        .with_observer(Arc::new(observer.clone()));

    let fixture = Fixture {
        journal,
        container,
        observer,
        ends,
        player,
    };
    (fixture, sdk)
}

/// Play a hosted video and complete its handshake
fn hosted_playing(duration_ms: u64) -> (Fixture<HostedVideoPlayer>, SimHostingSdk) {
    let (mut fx, sdk) = hosted_player("test-key", duration_ms);
    fx.player.play(FIRST_VIDEO);
    assert!(sdk.complete_next());
    fx.player.update();
    (fx, sdk)
}

fn assert_inert(player: &dyn MediaPlayer) {
    assert_eq!(player.current_time(), None);
    assert_eq!(player.total_time(), None);
    assert!(!player.is_playing());
}

// Local backend

#[test]
fn test_local_fresh_player_is_inert() {
    let (fx, _) = local_player(5_000);
    assert_inert(&fx.player);
    assert_eq!(fx.player.provider(), Backend::Local);
    assert_eq!(fx.player.geometry(), PlaybackGeometry::default());
}

#[test]
fn test_local_commands_without_media_are_noops() {
    let (mut fx, _) = local_player(5_000);
    fx.player.pause();
    fx.player.resume();
    fx.player.seek(1_000);
    fx.player.stop();
    fx.player.bring_to_front();
    fx.player.update();

    assert_inert(&fx.player);
    assert!(fx.journal.entries().is_empty());
    assert_eq!(fx.ends(), 0);
}

#[test]
fn test_local_play_attaches_and_reports_time() {
    let (mut fx, engine) = local_player(8_000);
    fx.player.play("/media/intro.mp4");

    assert!(fx.player.is_playing());
    assert_eq!(fx.container.len(), 1);
    let surface = fx.container.children()[0];
    assert_eq!(fx.container.fit_of(surface), Some(SurfaceFit::Fill));
    assert_eq!(engine.current_source().as_deref(), Some("/media/intro.mp4"));

    engine.advance(2_999);
    assert_eq!(fx.player.current_time(), Some(2));
    assert_eq!(fx.player.total_time(), Some(8));
    assert!(fx.observer.contains(&Notice::Ready));
}

#[test]
fn test_local_geometry_before_play_keeps_last_values() {
    let (mut fx, engine) = local_player(5_000);
    fx.player.move_to(5, 6);
    fx.player.resize(100, 100);
    fx.player.resize(800, 450);
    fx.player.move_to(10, 20);
    assert!(engine.last_geometry().is_none());

    fx.player.play("/media/intro.mp4");
    assert_eq!(engine.last_geometry(), Some(PlaybackGeometry::new(10, 20, 800, 450)));
}

#[test]
fn test_local_geometry_survives_media_change() {
    let (mut fx, engine) = local_player(5_000);
    fx.player.play("/media/a.mp4");
    fx.player.resize(1280, 720);
    fx.player.move_to(40, 30);
    assert_eq!(engine.last_geometry(), Some(PlaybackGeometry::new(40, 30, 1280, 720)));

    fx.player.play("/media/b.mp4");
    assert_eq!(fx.player.geometry(), PlaybackGeometry::new(40, 30, 1280, 720));
    assert_eq!(
        fx.journal.last_with_prefix("local layout").as_deref(),
        Some("local layout 40,30 1280x720")
    );
}

#[test]
fn test_local_pause_is_idempotent() {
    let (mut fx, _) = local_player(5_000);
    fx.player.play("/media/intro.mp4");

    fx.player.pause();
    let once = (fx.player.is_playing(), fx.player.current_time());
    fx.player.pause();
    let twice = (fx.player.is_playing(), fx.player.current_time());
    assert_eq!(once, twice);
    assert!(!fx.player.is_playing());

    fx.player.resume();
    assert!(fx.player.is_playing());
}

#[test]
fn test_local_stop_cannot_be_resumed() {
    let (mut fx, engine) = local_player(5_000);
    fx.player.play("/media/intro.mp4");
    fx.player.stop();
    fx.player.resume();

    assert_inert(&fx.player);
    assert!(fx.container.is_empty());
    assert_eq!(engine.live_surfaces(), 0);
    assert!(fx.observer.contains(&Notice::Stopped));
}

#[test]
fn test_local_seek_normalizes_to_seconds() {
    let (mut fx, _) = local_player(60_000);
    fx.player.play("/media/intro.mp4");
    fx.player.seek(4_200);
    assert_eq!(fx.player.current_time(), Some(4));
    assert!(fx.journal.contains("local seek 4200"));
}

#[test]
fn test_local_completion_tears_down_before_end_hook() {
    let (mut fx, engine) = local_player(3_000);
    fx.player.play("/media/intro.mp4");

    engine.advance(3_000);
    // The completion only lands on the next update
    assert_eq!(fx.ends(), 0);

    fx.player.update();
    assert_eq!(fx.ends(), 1);
    assert!(!fx.player.is_playing());
    assert!(fx.container.is_empty());

    let released = fx.journal.position("local stop_release").unwrap();
    let ended = fx.journal.position("on_end").unwrap();
    assert!(released < ended);

    fx.player.update();
    engine.advance(1_000);
    fx.player.update();
    assert_eq!(fx.ends(), 1);
}

#[test]
fn test_local_play_replaces_previous_surface() {
    let (mut fx, engine) = local_player(5_000);
    fx.player.play("/media/a.mp4");
    fx.player.play("/media/b.mp4");

    assert_eq!(engine.live_surfaces(), 1);
    assert_eq!(fx.container.len(), 1);
    assert_eq!(engine.current_source().as_deref(), Some("/media/b.mp4"));
    assert_eq!(fx.journal.count_prefix("local stop_release"), 1);
}

#[test]
fn test_local_completion_of_replaced_media_is_ignored() {
    let (mut fx, engine) = local_player(1_000);
    fx.player.play("/media/a.mp4");
    engine.advance(1_000);

    // Superseded before the host loop saw the completion
    fx.player.play("/media/b.mp4");
    fx.player.update();

    assert_eq!(fx.ends(), 0);
    assert!(fx.player.is_playing());
    assert_eq!(engine.current_source().as_deref(), Some("/media/b.mp4"));
}

#[test]
fn test_local_engine_failure_leaves_player_inert() {
    let (mut fx, engine) = local_player(5_000);
    engine.set_surface_unavailable(true);
    fx.player.play("/media/a.mp4");

    assert_inert(&fx.player);
    assert!(fx.container.is_empty());
    assert!(
        fx.observer
            .notices()
            .iter()
            .any(|n| matches!(n, Notice::EngineFailure(_)))
    );

    engine.set_surface_unavailable(false);
    fx.player.play("/media/a.mp4");
    assert!(fx.player.is_playing());
}

#[test]
fn test_local_rejected_source_detaches_surface() {
    let (mut fx, engine) = local_player(5_000);
    engine.reject_source("/media/broken.avi");
    fx.player.play("/media/broken.avi");

    assert_inert(&fx.player);
    assert!(fx.container.is_empty());
    assert_eq!(engine.live_surfaces(), 0);
}

#[test]
fn test_local_bring_to_front() {
    let journal = Journal::new();
    let container = SimContainer::new(journal.clone());
    let shared = container.shared();
    let engine = SimMediaEngine::new(journal.clone());

    let mut first = LocalMediaPlayer::new(shared.clone(), Box::new(engine.clone()), || {});
    let mut second = LocalMediaPlayer::new(shared, Box::new(engine.clone()), || {});
    first.play("/media/a.mp4");
    second.play("/media/b.mp4");

    let first_surface = container.children()[0];
    assert_ne!(container.top(), Some(first_surface));

    first.bring_to_front();
    assert_eq!(container.top(), Some(first_surface));
    second.stop();
    assert_eq!(container.children(), vec![first_surface]);
}

#[test]
fn test_local_drop_releases_surface() {
    let (mut fx, engine) = local_player(5_000);
    fx.player.play("/media/a.mp4");
    let Fixture {
        player, container, ..
    } = fx;
    drop(player);

    assert!(container.is_empty());
    assert_eq!(engine.live_surfaces(), 0);
}

// Hosted backend

#[test]
fn test_hosted_fresh_player_is_inert() {
    let (fx, _) = hosted_player("test-key", 5_000);
    assert_inert(&fx.player);
    assert_eq!(fx.player.provider(), Backend::Hosted);
    assert!(!fx.player.is_initializing());
}

#[test]
fn test_hosted_invalid_url_aborts_silently() {
    let (mut fx, sdk) = hosted_player("test-key", 5_000);
    fx.player.play("not a url");

    assert_inert(&fx.player);
    assert_eq!(sdk.pending_handshakes(), 0);
    assert_eq!(fx.journal.count_prefix("hosted surface"), 0);
    assert!(fx.observer.contains(&Notice::InvalidReference {
        media: "not a url".to_string()
    }));
}

#[test]
fn test_hosted_handshake_sequence() {
    let (mut fx, sdk) = hosted_player("test-key", 5_000);
    fx.player.play(FIRST_VIDEO);

    // Nothing is live until the handshake lands
    assert!(fx.player.is_initializing());
    assert_inert(&fx.player);
    assert!(fx.container.is_empty());

    fx.player.resize(320, 180);
    fx.player.move_to(8, 9);
    assert_eq!(fx.journal.count_prefix("hosted layout"), 0);

    assert!(sdk.complete_next());
    fx.player.update();

    assert!(fx.player.is_playing());
    assert_eq!(sdk.current_video().as_deref(), Some("dQw4w9WgXcQ"));
    assert_eq!(fx.container.len(), 1);
    let surface = fx.container.children()[0];
    assert_eq!(fx.container.fit_of(surface), Some(SurfaceFit::Wrap));

    let order = [
        "hosted chromeless".to_string(),
        "hosted no_fullscreen".to_string(),
        "hosted load dQw4w9WgXcQ".to_string(),
        format!("container add {}", surface),
        "hosted layout 8,9 320x180".to_string(),
    ];
    let positions: Vec<usize> = order
        .iter()
        .map(|entry| fx.journal.position(entry).unwrap())
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(fx.observer.contains(&Notice::Ready));
}

#[test]
fn test_hosted_commands_during_handshake_are_noops() {
    let (mut fx, sdk) = hosted_player("test-key", 5_000);
    fx.player.play(FIRST_VIDEO);
    fx.player.pause();
    fx.player.resume();
    fx.player.seek(2_000);
    fx.player.bring_to_front();

    assert_eq!(fx.journal.count_prefix("hosted seek"), 0);
    assert_eq!(fx.journal.count_prefix("container"), 0);

    sdk.complete_next();
    fx.player.update();
    assert_eq!(fx.player.current_time(), Some(0));
}

#[test]
fn test_hosted_superseded_handshake_is_discarded() {
    let (mut fx, sdk) = hosted_player("test-key", 5_000);
    fx.player.play(FIRST_VIDEO);
    fx.player.play(SECOND_VIDEO);
    assert_eq!(sdk.pending_handshakes(), 2);
    let attempts: Vec<String> = fx
        .journal
        .entries()
        .into_iter()
        .filter(|e| e.starts_with("hosted initialize"))
        .collect();
    assert_eq!(attempts.len(), 2);
    assert!(attempts[0].ends_with("attempt 1"));
    assert!(attempts[1].ends_with("attempt 2"));

    // The first attempt finishes first
    assert!(sdk.complete_next());
    fx.player.update();
    assert!(!fx.player.is_playing());
    assert!(fx.container.is_empty());
    assert_eq!(sdk.live_handles(), 0);

    assert!(sdk.complete_next());
    fx.player.update();

    assert_eq!(sdk.live_handles(), 1);
    assert_eq!(sdk.current_video().as_deref(), Some("9bZkp7q19f0"));
    assert_eq!(fx.container.len(), 1);
    assert_eq!(fx.journal.count_prefix("container add"), 1);
    assert_eq!(fx.journal.count_prefix("hosted load"), 1);
    assert_eq!(fx.ends(), 0);
    assert!(fx.observer.contains(&Notice::StaleHandshake { generation: 1 }));
}

#[test]
fn test_hosted_plays_reference_without_scheme() {
    let (mut fx, sdk) = hosted_player("test-key", 5_000);
    fx.player.play("www.youtube.com/watch?v=dQw4w9WgXcQ");
    assert!(fx.player.is_initializing());

    assert!(sdk.complete_next());
    fx.player.update();
    assert_eq!(sdk.current_video().as_deref(), Some("dQw4w9WgXcQ"));
    assert!(fx.player.is_playing());
}

#[test]
fn test_hosted_stop_during_handshake() {
    let (mut fx, sdk) = hosted_player("test-key", 5_000);
    fx.player.play(FIRST_VIDEO);
    fx.player.stop();
    assert!(!fx.player.is_initializing());

    sdk.complete_next();
    fx.player.update();

    assert_inert(&fx.player);
    assert!(fx.container.is_empty());
    assert_eq!(sdk.live_handles(), 0);
    assert!(fx.journal.contains("hosted release"));
}

#[test]
fn test_hosted_late_failure_of_superseded_attempt_is_ignored() {
    let (mut fx, sdk) = hosted_player("test-key", 5_000);
    fx.player.play(FIRST_VIDEO);
    fx.player.play(SECOND_VIDEO);

    sdk.fail_next(HandshakeError::Network("timeout".to_string()));
    fx.player.update();
    assert!(fx.player.is_initializing());
    assert!(
        !fx.observer
            .notices()
            .iter()
            .any(|n| matches!(n, Notice::HandshakeFailed(_)))
    );

    sdk.complete_next();
    fx.player.update();
    assert!(fx.player.is_playing());
}

#[test]
fn test_hosted_handshake_failure_then_retry() {
    let (mut fx, sdk) = hosted_player("test-key", 5_000);
    fx.player.play(FIRST_VIDEO);
    sdk.fail_next(HandshakeError::ServiceMissing);
    fx.player.update();

    assert_inert(&fx.player);
    assert!(!fx.player.is_initializing());
    assert!(fx.container.is_empty());
    assert!(
        fx.observer
            .contains(&Notice::HandshakeFailed(HandshakeError::ServiceMissing))
    );

    fx.player.play(FIRST_VIDEO);
    sdk.complete_next();
    fx.player.update();
    assert!(fx.player.is_playing());
}

#[test]
fn test_hosted_empty_api_key_fails_handshake() {
    let (mut fx, sdk) = hosted_player("", 5_000);
    fx.player.play(FIRST_VIDEO);
    sdk.complete_next();
    fx.player.update();

    assert_inert(&fx.player);
    assert!(
        fx.observer
            .contains(&Notice::HandshakeFailed(HandshakeError::InvalidApiKey))
    );
}

#[test]
fn test_hosted_auto_completed_handshake() {
    let journal = Journal::new();
    let container = SimContainer::new(journal.clone());
    let sdk = SimHostingSdk::new(journal.clone()).with_auto_complete(250);
    let mut player = HostedVideoPlayer::new(container.shared(), Box::new(sdk.clone()), "k", || {});

    player.play(FIRST_VIDEO);
    sdk.advance(100);
    player.update();
    assert!(player.is_initializing());

    sdk.advance(150);
    player.update();
    assert!(player.is_playing());
}

#[test]
fn test_hosted_time_queries() {
    let (mut fx, sdk) = hosted_playing(90_000);
    sdk.advance(3_999);
    assert_eq!(fx.player.current_time(), Some(3));
    assert_eq!(fx.player.total_time(), Some(90));

    fx.player.seek(61_500);
    assert_eq!(fx.player.current_time(), Some(61));
}

#[test]
fn test_hosted_pause_resume_and_stop() {
    let (mut fx, _) = hosted_playing(5_000);
    fx.player.pause();
    fx.player.pause();
    assert!(!fx.player.is_playing());
    assert_eq!(fx.journal.count_prefix("hosted pause"), 2);

    fx.player.resume();
    assert!(fx.player.is_playing());

    fx.player.stop();
    fx.player.resume();
    assert_inert(&fx.player);
    assert!(fx.container.is_empty());
}

#[test]
fn test_hosted_move_and_resize_while_live() {
    let (mut fx, _) = hosted_playing(5_000);
    fx.player.move_to(100, 50);
    assert_eq!(
        fx.journal.last_with_prefix("hosted layout").as_deref(),
        Some("hosted layout 100,50 640x360")
    );
    fx.player.resize(1920, 1080);
    assert_eq!(
        fx.journal.last_with_prefix("hosted layout").as_deref(),
        Some("hosted layout 100,50 1920x1080")
    );
}

#[test]
fn test_hosted_video_end_releases_before_end_hook() {
    let (mut fx, sdk) = hosted_playing(2_000);
    sdk.advance(2_000);
    fx.player.update();

    assert_eq!(fx.ends(), 1);
    assert_inert(&fx.player);
    assert!(fx.container.is_empty());
    assert_eq!(sdk.live_handles(), 0);

    let released = fx.journal.position("hosted release").unwrap();
    let ended = fx.journal.position("on_end").unwrap();
    assert!(released < ended);
    assert!(fx.observer.contains(&Notice::Completed));
}

#[test]
fn test_hosted_bring_to_front() {
    let (mut fx, _) = hosted_playing(5_000);
    let hosted_surface = fx.container.children()[0];
    fx.container.shared().lock().add_surface(999_999, SurfaceFit::Fill);
    assert_eq!(fx.container.top(), Some(999_999));

    fx.player.bring_to_front();
    assert_eq!(fx.container.top(), Some(hosted_surface));
}

#[test]
fn test_hosted_drop_while_pending_releases_late_handle() {
    let (mut fx, sdk) = hosted_player("test-key", 5_000);
    fx.player.play(FIRST_VIDEO);
    let Fixture {
        player, container, ..
    } = fx;
    drop(player);

    sdk.complete_next();
    assert_eq!(sdk.live_handles(), 0);
    assert!(container.is_empty());
}

#[test]
fn test_hosted_drop_with_unapplied_success_releases_handle() {
    let (mut fx, sdk) = hosted_player("test-key", 5_000);
    fx.player.play(FIRST_VIDEO);
    sdk.complete_next();
    assert_eq!(sdk.live_handles(), 1);

    let Fixture { player, .. } = fx;
    drop(player);
    assert_eq!(sdk.live_handles(), 0);
}
