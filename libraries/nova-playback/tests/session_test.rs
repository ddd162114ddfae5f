//! Session projector tests

mod common;

use common::*;
use nova_core::TrackId;
use nova_playback::{PlaybackConfig, PlaybackState, SessionAction, SessionProjector};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn test_projects_current_track() {
    let (handle, _remote) = spawn_controller(PlaybackConfig::default());
    let surface = Arc::new(RecordingSurface::default());
    let _projector = SessionProjector::spawn(&handle, surface.clone(), None);

    handle
        .set_queue(create_tracks(&["yt:a", "yt:b"]), None)
        .await
        .unwrap();
    wait_for_state(&handle, PlaybackState::Playing).await;
    settle().await;

    let summary = surface.last().expect("summary pushed");
    assert_eq!(summary.title, "Title yt:a");
    assert_eq!(summary.artist, "Test Artist");
    assert_eq!(summary.duration_ms, Some(180_000));
    assert!(summary.is_playing);
    assert!(summary.available_actions.pause);
    assert!(summary.available_actions.next);
}

#[tokio::test]
async fn test_never_pushes_the_same_summary_twice_in_a_row() {
    let (handle, _remote) = spawn_controller(PlaybackConfig::default());
    let surface = Arc::new(RecordingSurface::default());
    let _projector = SessionProjector::spawn(&handle, surface.clone(), None);

    handle
        .set_queue(create_tracks(&["yt:a", "yt:b", "yt:c"]), None)
        .await
        .unwrap();
    wait_for_state(&handle, PlaybackState::Playing).await;

    // Queue edits change the snapshot but not what the surface shows
    handle.move_down(TrackId::new("yt:b")).await.unwrap();
    handle.move_up(TrackId::new("yt:b")).await.unwrap();
    settle().await;

    let pushes = surface.pushes();
    assert!(!pushes.is_empty());
    for pair in pushes.windows(2) {
        assert_ne!(pair[0], pair[1]);
    }
}

#[tokio::test]
async fn test_clears_surface_on_stop() {
    let (handle, _remote) = spawn_controller(PlaybackConfig::default());
    let surface = Arc::new(RecordingSurface::default());
    let _projector = SessionProjector::spawn(&handle, surface.clone(), None);

    handle
        .set_queue(create_tracks(&["yt:a"]), None)
        .await
        .unwrap();
    wait_for_state(&handle, PlaybackState::Playing).await;
    settle().await;

    handle.stop().await.unwrap();
    settle().await;

    assert_eq!(surface.pushes().last(), Some(&None));
}

#[tokio::test(start_paused = true)]
async fn test_late_artwork_does_not_overwrite_newer_track() {
    let (handle, _remote) = spawn_controller(PlaybackConfig::default());
    let surface = Arc::new(RecordingSurface::default());
    let artwork = Arc::new(DelayedArtwork {
        delays: HashMap::from([
            ("yt:a".to_string(), Duration::from_millis(500)),
            ("yt:b".to_string(), Duration::from_millis(10)),
        ]),
    });
    let _projector = SessionProjector::spawn(&handle, surface.clone(), Some(artwork));

    handle
        .set_queue(create_tracks(&["yt:a", "yt:b"]), None)
        .await
        .unwrap();
    wait_for_state(&handle, PlaybackState::Playing).await;
    handle.skip_next().await.unwrap();
    wait_for(&handle, |s| {
        s.state == PlaybackState::Playing && s.current_index == Some(1)
    })
    .await;

    tokio::time::sleep(Duration::from_secs(1)).await;

    let pushes: Vec<_> = surface.pushes().into_iter().flatten().collect();
    let last = pushes.last().expect("pushes recorded");
    assert_eq!(last.track_id.as_str(), "yt:b");
    assert_eq!(last.artwork.as_deref(), Some("art://yt:b"));

    // Track A's artwork resolved after the skip and must never be shown
    assert!(pushes
        .iter()
        .all(|p| p.artwork.as_deref() != Some("art://yt:a")));
    let first_b = pushes
        .iter()
        .position(|p| p.track_id.as_str() == "yt:b")
        .unwrap();
    assert!(pushes[first_b..]
        .iter()
        .all(|p| p.track_id.as_str() == "yt:b"));
}

#[tokio::test]
async fn test_inbound_actions_reach_controller() {
    let (handle, _remote) = spawn_controller(PlaybackConfig::default());
    let surface = Arc::new(RecordingSurface::default());
    let projector = SessionProjector::spawn(&handle, surface.clone(), None);

    handle
        .set_queue(create_tracks(&["yt:a", "yt:b"]), None)
        .await
        .unwrap();
    wait_for_state(&handle, PlaybackState::Playing).await;

    assert!(projector.dispatch(SessionAction::Pause));
    wait_for_state(&handle, PlaybackState::Paused).await;

    assert!(projector.dispatch(SessionAction::Next));
    let snapshot = wait_for(&handle, |s| {
        s.state == PlaybackState::Playing && s.current_index == Some(1)
    })
    .await;
    assert_eq!(current_id(&snapshot).as_deref(), Some("yt:b"));

    assert!(projector.dispatch(SessionAction::Seek(30_000)));
    wait_for(&handle, |s| s.position_ms == 30_000).await;

    assert!(projector.dispatch(SessionAction::Stop));
    wait_for_state(&handle, PlaybackState::Idle).await;
}

#[tokio::test]
async fn test_dispatch_after_controller_gone() {
    let (handle, _remote) = spawn_controller(PlaybackConfig::default());
    let surface = Arc::new(RecordingSurface::default());
    let projector = SessionProjector::spawn(&handle, surface, None);

    drop(handle);
    settle().await;
    assert!(!projector.dispatch(SessionAction::Play));
}
