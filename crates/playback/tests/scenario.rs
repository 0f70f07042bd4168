//! End-to-end switching scenarios against the recording backend.

use std::sync::Arc;
use std::time::Duration;

use bd_common::{RenderTarget, SourceKey, Viewport};
use bd_player::recording::{PlayerCall, RecordingFactory};
use bd_player::{PlayerBackend, SyntheticOptions};
use bd_playback::{ManagerConfig, PlayOutcome, VideoManager, VideoState};

const A: &str = "https://cdn.example/a.m3u8";
const B: &str = "https://cdn.example/b.m3u8";

fn target() -> RenderTarget {
    RenderTarget::cover(Viewport::new(1280, 720))
}

async fn settle() {
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn a_b_a_round_trip() {
    let factory = RecordingFactory::new();
    factory.manual_frame_ready(true);
    let manager = VideoManager::new(Arc::new(factory.clone()), ManagerConfig::default());

    // A plays for 5s.
    assert_eq!(manager.play(A, target()).await, PlayOutcome::Started);
    tokio::time::advance(Duration::from_secs(5)).await;

    // Switch to B: A is paused with a screenshot.
    assert_eq!(manager.play(B, target()).await, PlayOutcome::Started);
    let a = manager.source_info(&SourceKey::from(A)).await.unwrap();
    assert_eq!(a.state, VideoState::Paused);
    assert!((a.position_secs - 5.0).abs() < 0.01);
    assert!(a.screenshot_visible);
    assert!(!a.has_player);

    // Back to A: the screenshot stays up until the new handle renders.
    tokio::time::advance(Duration::from_secs(3)).await;
    assert_eq!(manager.play(A, target()).await, PlayOutcome::Started);
    settle().await;
    let a = manager.source_info(&SourceKey::from(A)).await.unwrap();
    assert_eq!(a.state, VideoState::Playing);
    assert!(a.screenshot_visible);

    let handle = factory.last_handle().unwrap();
    assert!(factory.fire_frame_ready(handle));
    settle().await;
    let a = manager.source_info(&SourceKey::from(A)).await.unwrap();
    assert!(!a.screenshot_visible);

    let b = manager.source_info(&SourceKey::from(B)).await.unwrap();
    assert!((b.position_secs - 3.0).abs() < 0.01);

    let loads = factory.loads();
    assert_eq!(loads.len(), 3);
    assert!((loads[2].1 - 5.0).abs() < 0.01);
    assert_eq!(factory.max_live(), 1);
    assert_eq!(factory.count(|c| matches!(c, PlayerCall::Destroy { .. })), 2);
}

#[tokio::test(start_paused = true)]
async fn stale_frame_ready_does_not_hide_new_screenshot() {
    let factory = RecordingFactory::new();
    factory.manual_frame_ready(true);
    let manager = VideoManager::new(Arc::new(factory.clone()), ManagerConfig::default());

    manager.play(A, target()).await;
    let first = factory.last_handle().unwrap();
    manager.play(B, target()).await;

    // The first handle is gone; raising its signal does nothing.
    assert!(!factory.fire_frame_ready(first));
    settle().await;
    let a = manager.source_info(&SourceKey::from(A)).await.unwrap();
    assert!(a.screenshot_visible);
}

#[tokio::test(start_paused = true)]
async fn synthetic_backend_produces_png_screenshots() {
    let options = SyntheticOptions {
        first_frame_delay: Duration::from_millis(10),
        ..Default::default()
    };
    let factory = PlayerBackend::Synthetic.factory(options);
    let manager = VideoManager::new(factory, ManagerConfig::default());

    assert_eq!(manager.play(A, target()).await, PlayOutcome::Started);
    tokio::time::sleep(Duration::from_secs(2)).await;
    manager.play(B, target()).await;

    let shot = manager.screenshot(&SourceKey::from(A)).await.unwrap();
    assert!(shot.png_bytes().starts_with(&[0x89, b'P', b'N', b'G']));
    assert!(shot.data_uri().starts_with("data:image/png;base64,"));
    assert!(shot.width <= 480);
    assert_eq!(manager.live_players().await, 1);
}

#[tokio::test]
async fn unsupported_url_fails_without_leaking_a_player() {
    let factory = PlayerBackend::Synthetic.factory(SyntheticOptions::default());
    let manager = VideoManager::new(factory, ManagerConfig::default());

    let outcome = manager.play("ftp://nowhere/clip.avi", target()).await;
    assert!(matches!(outcome, PlayOutcome::Failed(_)));
    assert_eq!(manager.live_players().await, 0);
    assert_eq!(manager.len().await, 1);
}
