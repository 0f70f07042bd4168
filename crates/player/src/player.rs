//! The player façade consumed by the coordinator.

use std::sync::Arc;

use async_trait::async_trait;
use bd_common::{AudioSettings, PlayerError, RenderTarget};
use tokio::sync::watch;

use crate::frame::Frame;

/// One live playback resource (video element, decoder pipeline, ...).
///
/// A handle is created already attached to its render target. It is
/// single-use: once [`Player::destroy`] has run, the coordinator drops it and
/// asks the factory for a new one.
#[async_trait]
pub trait Player: Send + Sync {
    /// Load `url` and seek to `start_secs`.
    async fn load(&mut self, url: &str, start_secs: f64) -> Result<(), PlayerError>;

    /// Begin playback. May fail with [`PlayerError::AutoplayBlocked`].
    async fn play(&mut self) -> Result<(), PlayerError>;

    async fn pause(&mut self) -> Result<(), PlayerError>;

    /// Release every underlying resource. Must be idempotent.
    async fn destroy(&mut self) -> Result<(), PlayerError>;

    /// Current playback position in seconds.
    fn current_time_secs(&self) -> f64;

    /// Snapshot of the frame currently on screen, if any.
    fn capture_frame(&self) -> Option<Frame>;

    fn set_muted(&mut self, muted: bool);

    /// Volume in `[0, 1]`.
    fn set_volume(&mut self, volume: f32);

    fn set_size(&mut self, width: u32, height: u32);

    fn set_position(&mut self, x: i32, y: i32);

    /// Brightness multiplier in `[0, 1]`.
    fn set_brightness(&mut self, level: f32);

    /// Flips to `true` once decoded frames are actually rendering.
    ///
    /// The sender lives inside the handle, so receivers observe a closed
    /// channel after the handle is dropped.
    fn frame_ready(&self) -> watch::Receiver<bool>;

    /// Move and resize to `target`.
    fn apply_target(&mut self, target: &RenderTarget) {
        self.set_position(target.x, target.y);
        self.set_size(target.width, target.height);
    }

    fn apply_audio(&mut self, audio: &AudioSettings) {
        self.set_muted(audio.muted);
        self.set_volume(audio.volume());
    }
}

/// Creates player handles bound to a render target.
pub trait PlayerFactory: Send + Sync {
    /// Create a handle attached to `target`. No media is loaded yet.
    fn create(&self, target: &RenderTarget) -> Result<Box<dyn Player>, PlayerError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

pub type SharedPlayerFactory = Arc<dyn PlayerFactory>;
