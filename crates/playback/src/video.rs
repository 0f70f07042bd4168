//! Per-source playback lifecycle.
//!
//! A [`ManagedVideo`] owns at most one player handle and the screenshot that
//! stands in for it while paused:
//!
//! ```text
//!            play(target)                    pause()
//!   Idle ───────────────────► Playing ───────────────────► Paused
//!                               ▲                            │
//!                               └────────── play(target) ────┘
//! ```
//!
//! * Playing: a handle exists, is attached and was asked to play.
//! * Paused: the handle was destroyed; position and screenshot survive.
//!
//! The screenshot is hidden only when the handle reports that frames are
//! actually rendering, never as soon as `play()` returns.

use std::sync::Arc;

use bd_common::{Layer, PlayerError, RenderTarget, SourceKey, Viewport};
use bd_player::{Player, PlayerFactory, Screenshot};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::settings::PlaybackSettings;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoState {
    /// Never played; no resource, position 0.
    Idle,
    /// Holds a live player handle.
    Playing,
    /// Handle destroyed; screenshot shown in its place.
    Paused,
}

impl VideoState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Playing => "playing",
            Self::Paused => "paused",
        }
    }
}

/// How a successful [`ManagedVideo::play`] went.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayStart {
    /// A fresh handle was created, loaded and started.
    Started,
    /// The existing handle was kept and is playing.
    Resumed,
    /// The handle is attached but the platform refused to start playback.
    Blocked(PlayerError),
}

/// Screenshot plus its visibility.
///
/// Shared with the frame-ready watcher task. `generation` is bumped on every
/// play/pause so a watcher left over from an earlier play cannot hide a
/// screenshot taken afterwards.
#[derive(Default)]
struct Overlay {
    screenshot: Option<Screenshot>,
    visible: bool,
    generation: u64,
}

// ---------------------------------------------------------------------------
// ManagedVideo
// ---------------------------------------------------------------------------

pub struct ManagedVideo {
    key: SourceKey,
    layer: Layer,
    state: VideoState,
    player: Option<Box<dyn Player>>,
    target: Option<RenderTarget>,
    /// Last known position in seconds.
    position_secs: f64,
    /// The handle is attached but its `play()` was refused.
    awaiting_gesture: bool,
    overlay: Arc<Mutex<Overlay>>,
    frame_watch: Option<JoinHandle<()>>,
}

impl ManagedVideo {
    pub fn new(key: SourceKey, layer: Layer) -> Self {
        Self {
            key,
            layer,
            state: VideoState::Idle,
            player: None,
            target: None,
            position_secs: 0.0,
            awaiting_gesture: false,
            overlay: Arc::new(Mutex::new(Overlay::default())),
            frame_watch: None,
        }
    }

    pub fn key(&self) -> &SourceKey {
        &self.key
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    pub fn state(&self) -> VideoState {
        self.state
    }

    pub fn position_secs(&self) -> f64 {
        self.position_secs
    }

    pub fn target(&self) -> Option<RenderTarget> {
        self.target
    }

    /// Whether this record currently holds the live player resource.
    pub fn has_player(&self) -> bool {
        self.player.is_some()
    }

    pub fn screenshot(&self) -> Option<Screenshot> {
        self.overlay.lock().screenshot.clone()
    }

    pub fn screenshot_visible(&self) -> bool {
        let overlay = self.overlay.lock();
        overlay.visible && overlay.screenshot.is_some()
    }

    /// Start or resume playback into `target`.
    ///
    /// With a live handle already present, the handle is only re-targeted
    /// (and `play()` retried if it was refused earlier); nothing is reloaded.
    /// Otherwise a new handle is created, configured, loaded at the retained
    /// position and started.
    ///
    /// Load and attach failures are returned; the record is then left without
    /// a handle. A refused `play()` is not an error: the handle stays
    /// attached and [`PlayStart::Blocked`] is returned.
    pub async fn play(
        &mut self,
        factory: &dyn PlayerFactory,
        target: RenderTarget,
        settings: &PlaybackSettings,
    ) -> Result<PlayStart, PlayerError> {
        self.layer = target.layer;

        if let Some(player) = self.player.as_mut() {
            if self.target != Some(target) {
                player.apply_target(&target);
                self.target = Some(target);
            }
            if !self.awaiting_gesture {
                trace!(source = %self.key, "Already playing, handle kept");
                return Ok(PlayStart::Resumed);
            }
            return Ok(self.start_playback().await.unwrap_or(PlayStart::Resumed));
        }

        let mut player = factory.create(&target)?;
        player.apply_audio(&settings.audio);
        player.set_brightness(settings.brightness.level());
        let ready = player.frame_ready();

        if let Err(e) = player.load(self.key.as_str(), self.position_secs).await {
            if let Err(teardown) = player.destroy().await {
                warn!(source = %self.key, error = %teardown, "Teardown after failed load also failed");
            }
            return Err(e);
        }

        debug!(
            source = %self.key,
            position_secs = self.position_secs,
            backend = factory.name(),
            "Player attached"
        );

        self.player = Some(player);
        self.target = Some(target);
        self.state = VideoState::Playing;
        self.watch_first_frame(ready);

        Ok(self.start_playback().await.unwrap_or(PlayStart::Started))
    }

    /// Ask the handle to play. `None` means it did.
    async fn start_playback(&mut self) -> Option<PlayStart> {
        let player = self.player.as_mut()?;
        match player.play().await {
            Ok(()) => {
                self.awaiting_gesture = false;
                None
            }
            Err(e) => {
                if e.is_autoplay_blocked() {
                    warn!(source = %self.key, error = %e, "Autoplay blocked, waiting for user gesture");
                } else {
                    warn!(source = %self.key, error = %e, "Playback did not start");
                }
                self.awaiting_gesture = true;
                Some(PlayStart::Blocked(e))
            }
        }
    }

    /// Hide the screenshot once the handle reports rendered frames.
    fn watch_first_frame(&mut self, mut ready: watch::Receiver<bool>) {
        self.abort_frame_watch();

        let generation = {
            let mut overlay = self.overlay.lock();
            overlay.generation += 1;
            overlay.generation
        };
        let overlay = self.overlay.clone();
        let key = self.key.clone();

        self.frame_watch = Some(tokio::spawn(async move {
            // Err means the handle went away before a frame was shown.
            let rendered = ready.wait_for(|playing| *playing).await.is_ok();
            if !rendered {
                return;
            }
            let mut overlay = overlay.lock();
            if overlay.generation == generation && overlay.visible {
                overlay.visible = false;
                debug!(source = %key, "First frame rendered, screenshot hidden");
            }
        }));
    }

    fn abort_frame_watch(&mut self) {
        if let Some(task) = self.frame_watch.take() {
            task.abort();
        }
    }

    /// Capture a screenshot, remember the position and release the handle.
    ///
    /// Returns whether a handle was released. Without a live handle this is a
    /// no-op and leaves position and screenshot untouched.
    pub async fn pause(&mut self) -> bool {
        let Some(mut player) = self.player.take() else {
            return false;
        };
        self.abort_frame_watch();

        self.position_secs = player.current_time_secs();

        let shot = match player.capture_frame() {
            Some(frame) => match Screenshot::encode(&frame) {
                Ok(shot) => Some(shot),
                Err(e) => {
                    warn!(source = %self.key, error = %e, "Screenshot encoding failed");
                    None
                }
            },
            None => {
                debug!(source = %self.key, "No frame to capture, keeping previous screenshot");
                None
            }
        };

        {
            let mut overlay = self.overlay.lock();
            overlay.generation += 1;
            if shot.is_some() {
                overlay.screenshot = shot;
            }
            overlay.visible = overlay.screenshot.is_some();
        }

        if let Err(e) = player.destroy().await {
            warn!(source = %self.key, error = %e, "Player teardown failed, continuing");
        }
        drop(player);

        self.state = VideoState::Paused;
        self.awaiting_gesture = false;
        debug!(
            source = %self.key,
            position_secs = self.position_secs,
            "Paused and released player"
        );
        true
    }

    /// Push audio and brightness to the live handle, if any.
    pub fn apply_settings(&mut self, settings: &PlaybackSettings) {
        if let Some(player) = self.player.as_mut() {
            player.apply_audio(&settings.audio);
            player.set_brightness(settings.brightness.level());
        }
    }

    /// Fit the stored target (and the live handle) to a resized viewport.
    pub fn retarget(&mut self, viewport: Viewport) {
        let Some(current) = self.target else {
            return;
        };
        let next = current.retarget(viewport);
        if next == current {
            return;
        }
        if let Some(player) = self.player.as_mut() {
            player.apply_target(&next);
        }
        self.target = Some(next);
    }
}

impl Drop for ManagedVideo {
    fn drop(&mut self) {
        self.abort_frame_watch();
    }
}

impl std::fmt::Debug for ManagedVideo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedVideo")
            .field("key", &self.key)
            .field("state", &self.state)
            .field("position_secs", &self.position_secs)
            .field("has_player", &self.player.is_some())
            .field("screenshot_visible", &self.screenshot_visible())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use bd_player::recording::{PlayerCall, RecordingFactory};
    use std::time::Duration;

    fn target() -> RenderTarget {
        RenderTarget::cover(Viewport::new(1280, 720))
    }

    fn video() -> ManagedVideo {
        ManagedVideo::new(SourceKey::from("https://cdn.example/a.m3u8"), Layer::Background)
    }

    /// Let spawned watcher tasks run.
    async fn settle() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn starts_idle() {
        let v = video();
        assert_eq!(v.state(), VideoState::Idle);
        assert_eq!(v.position_secs(), 0.0);
        assert!(!v.has_player());
        assert!(v.screenshot().is_none());
    }

    #[tokio::test]
    async fn play_creates_configures_and_loads() {
        let factory = RecordingFactory::new();
        let mut v = video();
        let settings = PlaybackSettings::default();

        let start = v.play(&factory, target(), &settings).await.unwrap();
        assert_eq!(start, PlayStart::Started);
        assert_eq!(v.state(), VideoState::Playing);
        assert!(v.has_player());

        let calls = factory.calls();
        assert!(matches!(calls[0], PlayerCall::Create { handle: 0, .. }));
        assert!(calls.contains(&PlayerCall::SetMuted { handle: 0, muted: true }));
        assert!(calls.contains(&PlayerCall::SetBrightness { handle: 0, level: 1.0 }));
        assert_eq!(
            factory.loads(),
            vec![("https://cdn.example/a.m3u8".to_string(), 0.0)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn pause_keeps_position_and_screenshot() {
        let factory = RecordingFactory::new();
        let mut v = video();
        v.play(&factory, target(), &PlaybackSettings::default())
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(v.pause().await);

        assert_eq!(v.state(), VideoState::Paused);
        assert!(!v.has_player());
        assert!((v.position_secs() - 5.0).abs() < 0.01);
        let shot = v.screenshot().unwrap();
        assert!(!shot.is_empty());
        assert!(v.screenshot_visible());
        assert_eq!(factory.live_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn second_pause_is_a_no_op() {
        let factory = RecordingFactory::new();
        let mut v = video();
        v.play(&factory, target(), &PlaybackSettings::default())
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;
        v.pause().await;

        let position = v.position_secs();
        let shot = v.screenshot();
        tokio::time::advance(Duration::from_secs(2)).await;

        assert!(!v.pause().await);
        assert_eq!(v.position_secs(), position);
        assert_eq!(v.screenshot(), shot);
        assert_eq!(
            factory.count(|c| matches!(c, PlayerCall::Destroy { .. })),
            1
        );
    }

    #[tokio::test]
    async fn pause_on_idle_does_nothing() {
        let mut v = video();
        assert!(!v.pause().await);
        assert_eq!(v.state(), VideoState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn screenshot_hidden_only_after_frame_ready() {
        let factory = RecordingFactory::new();
        factory.manual_frame_ready(true);
        let mut v = video();
        let settings = PlaybackSettings::default();

        v.play(&factory, target(), &settings).await.unwrap();
        tokio::time::advance(Duration::from_secs(3)).await;
        v.pause().await;
        assert!(v.screenshot_visible());

        v.play(&factory, target(), &settings).await.unwrap();
        settle().await;
        assert!(v.screenshot_visible(), "hidden before frames flowed");

        let handle = factory.last_handle().unwrap();
        assert!(factory.fire_frame_ready(handle));
        settle().await;
        assert!(!v.screenshot_visible());
        assert!(v.screenshot().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn resume_loads_at_retained_position() {
        let factory = RecordingFactory::new();
        let mut v = video();
        let settings = PlaybackSettings::default();

        v.play(&factory, target(), &settings).await.unwrap();
        tokio::time::advance(Duration::from_secs(7)).await;
        v.pause().await;
        v.play(&factory, target(), &settings).await.unwrap();

        let loads = factory.loads();
        assert_eq!(loads.len(), 2);
        assert!((loads[1].1 - 7.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn play_while_playing_keeps_handle() {
        let factory = RecordingFactory::new();
        let mut v = video();
        let settings = PlaybackSettings::default();

        v.play(&factory, target(), &settings).await.unwrap();
        let start = v.play(&factory, target(), &settings).await.unwrap();
        assert_eq!(start, PlayStart::Resumed);
        assert_eq!(factory.handles_created(), 1);
        assert_eq!(factory.loads().len(), 1);
    }

    #[tokio::test]
    async fn load_failure_leaves_no_handle() {
        let factory = RecordingFactory::new();
        factory.fail_load("https://cdn.example/a.m3u8");
        let mut v = video();

        let err = v
            .play(&factory, target(), &PlaybackSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PlayerError::Load { .. }));
        assert!(!v.has_player());
        assert_eq!(v.state(), VideoState::Idle);
        assert_eq!(factory.live_count(), 0);
    }

    #[tokio::test]
    async fn blocked_autoplay_keeps_handle_and_retries_on_next_play() {
        let factory = RecordingFactory::new();
        factory.block_autoplay(1);
        let mut v = video();
        let settings = PlaybackSettings::default();

        let start = v.play(&factory, target(), &settings).await.unwrap();
        assert!(matches!(start, PlayStart::Blocked(PlayerError::AutoplayBlocked(_))));
        assert_eq!(v.state(), VideoState::Playing);
        assert!(v.has_player());

        let start = v.play(&factory, target(), &settings).await.unwrap();
        assert_eq!(start, PlayStart::Resumed);
        assert_eq!(factory.handles_created(), 1);
        assert_eq!(factory.loads().len(), 1);
        assert_eq!(factory.count(|c| matches!(c, PlayerCall::Play { .. })), 2);
    }

    #[tokio::test]
    async fn teardown_failure_still_pauses() {
        let factory = RecordingFactory::new();
        factory.fail_teardown(true);
        let mut v = video();
        v.play(&factory, target(), &PlaybackSettings::default())
            .await
            .unwrap();

        assert!(v.pause().await);
        assert_eq!(v.state(), VideoState::Paused);
        assert!(!v.has_player());
    }

    #[tokio::test]
    async fn retarget_moves_live_handle() {
        let factory = RecordingFactory::new();
        let mut v = video();
        v.play(&factory, target(), &PlaybackSettings::default())
            .await
            .unwrap();
        factory.clear_calls();

        v.retarget(Viewport::new(800, 600));
        assert_eq!(
            factory.calls(),
            vec![
                PlayerCall::SetPosition { handle: 0, x: 0, y: 0 },
                PlayerCall::SetSize { handle: 0, width: 800, height: 600 },
            ]
        );
        assert_eq!(v.target().map(|t| t.width), Some(800));
    }
}
