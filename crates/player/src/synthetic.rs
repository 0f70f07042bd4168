//! Synthetic backend: a clock-driven player that renders a test pattern.
//!
//! Stands in for a real media stack on hosts without one (CI, headless
//! demos). It validates URLs the way a streaming player would reject
//! unsupported manifests, honours an autoplay policy, and raises the
//! frame-ready signal after a configurable first-frame delay.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bd_common::{PlayerError, RenderTarget};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::clock::PlaybackClock;
use crate::frame::{capture_size, Frame, MAX_CAPTURE_WIDTH};
use crate::pattern;
use crate::player::{Player, PlayerFactory};

/// URL schemes the synthetic backend accepts.
const SUPPORTED_SCHEMES: &[&str] = &["http", "https", "file"];

/// Container / manifest extensions the synthetic backend accepts.
const SUPPORTED_EXTENSIONS: &[&str] = &["m3u8", "mpd", "mp4", "webm", "mov"];

/// How the simulated platform treats playback that no user gesture started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoplayPolicy {
    /// Always allowed.
    #[default]
    Allow,
    /// Allowed only while muted (typical browser behaviour).
    RequireMuted,
    /// Always rejected.
    Block,
}

#[derive(Debug, Clone)]
pub struct SyntheticOptions {
    pub autoplay: AutoplayPolicy,
    /// Delay between `play()` and the frame-ready signal.
    pub first_frame_delay: Duration,
    /// Simulated manifest fetch time.
    pub load_latency: Duration,
    /// Loop length of the simulated media; `None` plays forever.
    pub loop_secs: Option<f64>,
}

impl Default for SyntheticOptions {
    fn default() -> Self {
        Self {
            autoplay: AutoplayPolicy::Allow,
            first_frame_delay: Duration::from_millis(40),
            load_latency: Duration::ZERO,
            loop_secs: None,
        }
    }
}

/// Factory for [`SyntheticPlayer`] handles.
#[derive(Debug, Clone, Default)]
pub struct SyntheticFactory {
    options: SyntheticOptions,
}

impl SyntheticFactory {
    pub fn new(options: SyntheticOptions) -> Self {
        Self { options }
    }
}

impl PlayerFactory for SyntheticFactory {
    fn create(&self, target: &RenderTarget) -> Result<Box<dyn Player>, PlayerError> {
        if target.width == 0 || target.height == 0 {
            return Err(PlayerError::Attach(format!(
                "empty render target {}x{}",
                target.width, target.height
            )));
        }
        Ok(Box::new(SyntheticPlayer::new(*target, self.options.clone())))
    }

    fn name(&self) -> &'static str {
        "synthetic"
    }
}

pub struct SyntheticPlayer {
    target: RenderTarget,
    options: SyntheticOptions,
    clock: PlaybackClock,
    url: Option<String>,
    hue: f32,
    muted: bool,
    volume: f32,
    brightness: f32,
    destroyed: bool,
    ready_tx: Arc<watch::Sender<bool>>,
    ready_task: Option<JoinHandle<()>>,
}

impl SyntheticPlayer {
    fn new(target: RenderTarget, options: SyntheticOptions) -> Self {
        let (ready_tx, _) = watch::channel(false);
        let clock = match options.loop_secs {
            Some(len) => PlaybackClock::looping(len),
            None => PlaybackClock::new(),
        };
        Self {
            target,
            options,
            clock,
            url: None,
            hue: 0.0,
            muted: true,
            volume: 1.0,
            brightness: 1.0,
            destroyed: false,
            ready_tx: Arc::new(ready_tx),
            ready_task: None,
        }
    }

    fn cancel_ready_task(&mut self) {
        if let Some(task) = self.ready_task.take() {
            task.abort();
        }
    }
}

/// Check scheme and extension the way a manifest-based player would.
fn validate_url(url: &str) -> Result<(), PlayerError> {
    let (scheme, rest) = url
        .split_once("://")
        .ok_or_else(|| PlayerError::load(url, "missing URL scheme"))?;

    if !SUPPORTED_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str()) {
        return Err(PlayerError::load(url, format!("unsupported scheme '{scheme}'")));
    }

    let path = rest.split(['?', '#']).next().unwrap_or_default();
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(PlayerError::load(url, "unsupported media type"));
    }
    Ok(())
}

#[async_trait]
impl Player for SyntheticPlayer {
    async fn load(&mut self, url: &str, start_secs: f64) -> Result<(), PlayerError> {
        if self.destroyed {
            return Err(PlayerError::load(url, "player destroyed"));
        }
        validate_url(url)?;

        if !self.options.load_latency.is_zero() {
            tokio::time::sleep(self.options.load_latency).await;
        }

        self.clock.stop();
        self.clock.seek(start_secs);
        self.hue = pattern::hue_for(url);
        self.url = Some(url.to_string());
        debug!(url, start_secs, "synthetic source loaded");
        Ok(())
    }

    async fn play(&mut self) -> Result<(), PlayerError> {
        let Some(url) = self.url.as_deref() else {
            return Err(PlayerError::load("", "play() before load()"));
        };

        let blocked = match self.options.autoplay {
            AutoplayPolicy::Allow => false,
            AutoplayPolicy::RequireMuted => !self.muted,
            AutoplayPolicy::Block => true,
        };
        if blocked {
            return Err(PlayerError::AutoplayBlocked(format!(
                "playback of {url} requires a user gesture"
            )));
        }

        self.clock.start();

        if *self.ready_tx.borrow() {
            return Ok(());
        }
        self.cancel_ready_task();
        let delay = self.options.first_frame_delay;
        if delay.is_zero() {
            self.ready_tx.send_replace(true);
        } else {
            let tx = self.ready_tx.clone();
            self.ready_task = Some(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                tx.send_replace(true);
            }));
        }
        Ok(())
    }

    async fn pause(&mut self) -> Result<(), PlayerError> {
        self.cancel_ready_task();
        self.clock.stop();
        self.ready_tx.send_replace(false);
        Ok(())
    }

    async fn destroy(&mut self) -> Result<(), PlayerError> {
        if self.destroyed {
            return Ok(());
        }
        self.cancel_ready_task();
        self.clock.stop();
        self.ready_tx.send_replace(false);
        self.destroyed = true;
        trace!(url = ?self.url, "synthetic player destroyed");
        self.url = None;
        Ok(())
    }

    fn current_time_secs(&self) -> f64 {
        self.clock.position_secs()
    }

    fn capture_frame(&self) -> Option<Frame> {
        if self.destroyed || self.url.is_none() {
            return None;
        }
        let (w, h) = capture_size(&self.target, MAX_CAPTURE_WIDTH);
        let mut frame = pattern::synthetic_frame(w, h, self.clock.position_secs(), self.hue);
        frame.dim(self.brightness);
        Some(frame)
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.target.width = width;
        self.target.height = height;
    }

    fn set_position(&mut self, x: i32, y: i32) {
        self.target.x = x;
        self.target.y = y;
    }

    fn set_brightness(&mut self, level: f32) {
        self.brightness = level.clamp(0.0, 1.0);
    }

    fn frame_ready(&self) -> watch::Receiver<bool> {
        self.ready_tx.subscribe()
    }
}

impl Drop for SyntheticPlayer {
    fn drop(&mut self) {
        self.cancel_ready_task();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bd_common::Viewport;

    fn target() -> RenderTarget {
        RenderTarget::cover(Viewport::new(640, 360))
    }

    fn player(options: SyntheticOptions) -> Box<dyn Player> {
        SyntheticFactory::new(options).create(&target()).unwrap()
    }

    #[test]
    fn url_validation() {
        assert!(validate_url("https://stream.example/v.m3u8").is_ok());
        assert!(validate_url("https://stream.example/v.MPD?token=1").is_ok());
        assert!(validate_url("file:///tmp/clip.mp4").is_ok());
        assert!(validate_url("stream.example/v.m3u8").is_err());
        assert!(validate_url("rtmp://stream.example/live.m3u8").is_err());
        assert!(validate_url("https://stream.example/page.html").is_err());
    }

    #[test]
    fn empty_target_cannot_attach() {
        let factory = SyntheticFactory::default();
        let empty = RenderTarget::cover(Viewport::new(0, 0));
        assert!(matches!(factory.create(&empty), Err(PlayerError::Attach(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn load_seeks_and_play_advances() {
        let mut p = player(SyntheticOptions::default());
        p.load("https://cdn.example/a.m3u8", 12.0).await.unwrap();
        assert_eq!(p.current_time_secs(), 12.0);

        p.play().await.unwrap();
        tokio::time::advance(Duration::from_secs(3)).await;
        assert!((p.current_time_secs() - 15.0).abs() < 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn frame_ready_fires_after_delay() {
        let mut p = player(SyntheticOptions {
            first_frame_delay: Duration::from_millis(100),
            ..Default::default()
        });
        let mut ready = p.frame_ready();
        p.load("https://cdn.example/a.m3u8", 0.0).await.unwrap();
        p.play().await.unwrap();
        assert!(!*ready.borrow());

        ready.wait_for(|r| *r).await.unwrap();
        assert!(*ready.borrow());
    }

    #[tokio::test]
    async fn require_muted_policy_blocks_unmuted_play() {
        let mut p = player(SyntheticOptions {
            autoplay: AutoplayPolicy::RequireMuted,
            ..Default::default()
        });
        p.load("https://cdn.example/a.m3u8", 0.0).await.unwrap();
        p.set_muted(false);
        assert!(matches!(p.play().await, Err(PlayerError::AutoplayBlocked(_))));
        p.set_muted(true);
        assert!(p.play().await.is_ok());
    }

    #[tokio::test]
    async fn unsupported_url_fails_to_load() {
        let mut p = player(SyntheticOptions::default());
        let err = p.load("ftp://cdn.example/a.m3u8", 0.0).await.unwrap_err();
        assert!(matches!(err, PlayerError::Load { .. }));
    }

    #[tokio::test]
    async fn destroy_is_idempotent_and_stops_capture() {
        let mut p = player(SyntheticOptions::default());
        p.load("https://cdn.example/a.m3u8", 0.0).await.unwrap();
        assert!(p.capture_frame().is_some());

        p.destroy().await.unwrap();
        p.destroy().await.unwrap();
        assert!(p.capture_frame().is_none());
        assert!(p.load("https://cdn.example/a.m3u8", 0.0).await.is_err());
    }

    #[tokio::test]
    async fn capture_is_scaled_down() {
        let mut p = SyntheticFactory::default()
            .create(&RenderTarget::cover(Viewport::new(1920, 1080)))
            .unwrap();
        p.load("https://cdn.example/a.m3u8", 0.0).await.unwrap();
        let frame = p.capture_frame().unwrap();
        assert_eq!((frame.width, frame.height), (MAX_CAPTURE_WIDTH, 270));
    }
}
