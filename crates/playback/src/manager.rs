//! Video manager: arbitrates the single player resource across sources.
//!
//! Architecture:
//!
//! ```text
//!  caller ──play(B)──► VideoManager (async mutex held for the whole switch)
//!                        │ 1. pause A  ── capture screenshot, destroy A's player
//!                        │ 2. look up / create B's record
//!                        │ 3. B.play() ── create player, load at B's position, play
//!                        └ 4. active = B
//! ```
//!
//! Only the active record may hold a player. Every transition runs under one
//! `tokio::sync::Mutex`, so overlapping `play()` calls are serialized and two
//! records can never both believe they own the resource.

use bd_common::{Brightness, Layer, PlayerError, RenderTarget, SourceKey, Viewport};
use bd_player::{Screenshot, SharedPlayerFactory};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::registry::Registry;
use crate::settings::{ManagerConfig, PlaybackSettings};
use crate::video::{ManagedVideo, PlayStart, VideoState};

// ---------------------------------------------------------------------------
// Public result types
// ---------------------------------------------------------------------------

/// Result of [`VideoManager::play`].
///
/// Failures are reported here rather than as `Err`: whatever happens, the
/// requested source is the active one afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayOutcome {
    /// A player was created for the source and started.
    Started,
    /// The source was already active; its player was kept.
    AlreadyActive,
    /// The player is attached but the platform refused to start it.
    AutoplayBlocked(PlayerError),
    /// No player could be attached or loaded for the source.
    Failed(PlayerError),
}

impl PlayOutcome {
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Started | Self::AlreadyActive)
    }
}

/// Snapshot of one registry record.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceInfo {
    pub key: SourceKey,
    pub state: VideoState,
    pub layer: Layer,
    pub position_secs: f64,
    pub has_player: bool,
    pub has_screenshot: bool,
    pub screenshot_visible: bool,
}

impl SourceInfo {
    fn of(video: &ManagedVideo) -> Self {
        Self {
            key: video.key().clone(),
            state: video.state(),
            layer: video.layer(),
            position_secs: video.position_secs(),
            has_player: video.has_player(),
            has_screenshot: video.screenshot().is_some(),
            screenshot_visible: video.screenshot_visible(),
        }
    }
}

// ---------------------------------------------------------------------------
// VideoManager
// ---------------------------------------------------------------------------

struct Inner {
    registry: Registry,
    active: Option<SourceKey>,
    settings: PlaybackSettings,
    viewport: Option<Viewport>,
}

pub struct VideoManager {
    factory: SharedPlayerFactory,
    config: ManagerConfig,
    inner: Mutex<Inner>,
}

impl VideoManager {
    pub fn new(factory: SharedPlayerFactory, config: ManagerConfig) -> Self {
        Self::with_settings(factory, config, PlaybackSettings::default())
    }

    /// Manager whose players start with the given audio/brightness settings.
    pub fn with_settings(
        factory: SharedPlayerFactory,
        config: ManagerConfig,
        settings: PlaybackSettings,
    ) -> Self {
        Self {
            factory,
            config,
            inner: Mutex::new(Inner {
                registry: Registry::default(),
                active: None,
                settings,
                viewport: None,
            }),
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Make `key` the active source and start it in `target`.
    ///
    /// A different active source is paused first (screenshot taken, player
    /// destroyed). Calling this with the already-active key keeps its player:
    /// only the target is re-applied, and a play refused by autoplay policy is
    /// retried on the same handle.
    pub async fn play(&self, key: impl Into<SourceKey>, target: RenderTarget) -> PlayOutcome {
        let key = key.into();
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        let settings = inner.settings;
        // Callers may still hold a target sized for the viewport before the last resize.
        let target = match inner.viewport {
            Some(viewport) => target.retarget(viewport),
            None => target,
        };

        if inner.active.as_ref() == Some(&key) {
            if let Some(video) = inner.registry.get_mut(&key) {
                if video.has_player() {
                    return match video.play(&*self.factory, target, &settings).await {
                        Ok(PlayStart::Blocked(e)) => PlayOutcome::AutoplayBlocked(e),
                        Ok(_) => PlayOutcome::AlreadyActive,
                        Err(e) => PlayOutcome::Failed(e),
                    };
                }
            }
        }

        if let Some(previous) = inner.active.take() {
            if previous != key {
                if let Some(video) = inner.registry.get_mut(&previous) {
                    info!(from = %previous, to = %key, "Switching video source");
                    video.pause().await;
                }
            }
        }

        inner.active = Some(key.clone());
        let video = inner.registry.touch_or_insert(&key, target.layer);
        let result = video.play(&*self.factory, target, &settings).await;

        if let Some(max) = self.config.max_sources {
            inner.registry.evict_over(max, &key);
        }

        match result {
            Ok(PlayStart::Blocked(e)) => PlayOutcome::AutoplayBlocked(e),
            Ok(_) => {
                debug!(source = %key, "Playback started");
                PlayOutcome::Started
            }
            Err(e) => {
                warn!(source = %key, error = %e, "Failed to start source, staying on it without a player");
                PlayOutcome::Failed(e)
            }
        }
    }

    /// Pause the active source and clear the active pointer.
    ///
    /// Returns the key that was active. Its record (and screenshot) stays in
    /// the registry until a later `play()` evicts it.
    pub async fn pause_active(&self) -> Option<SourceKey> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        let key = inner.active.take()?;
        if let Some(video) = inner.registry.get_mut(&key) {
            video.pause().await;
        }
        debug!(source = %key, "Paused active source");
        Some(key)
    }

    /// Pause every source and clear the active pointer.
    pub async fn pause_all(&self) {
        let mut inner = self.inner.lock().await;
        for key in inner.registry.keys() {
            if let Some(video) = inner.registry.get_mut(&key) {
                video.pause().await;
            }
        }
        if let Some(previous) = inner.active.take() {
            info!(source = %previous, "Paused all sources");
        }
    }

    // -----------------------------------------------------------------------
    // Controls
    // -----------------------------------------------------------------------

    pub async fn settings(&self) -> PlaybackSettings {
        self.inner.lock().await.settings
    }

    pub async fn set_muted(&self, muted: bool) {
        self.update_settings(|s| s.audio.muted = muted).await;
    }

    /// Flip the mute flag; returns the new value.
    pub async fn toggle_muted(&self) -> bool {
        self.update_settings(|s| s.audio.muted = !s.audio.muted)
            .await
            .audio
            .muted
    }

    /// Set volume (clamped to `[0, 1]`); returns the stored value.
    pub async fn set_volume(&self, volume: f32) -> f32 {
        self.update_settings(|s| s.audio.set_volume(volume))
            .await
            .audio
            .volume()
    }

    pub async fn set_brightness(&self, brightness: Brightness) {
        self.update_settings(|s| s.brightness = brightness).await;
    }

    /// Advance brightness on → dim → off; returns the new level.
    pub async fn cycle_brightness(&self) -> Brightness {
        self.update_settings(|s| s.brightness = s.brightness.cycle())
            .await
            .brightness
    }

    async fn update_settings(&self, f: impl FnOnce(&mut PlaybackSettings)) -> PlaybackSettings {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        f(&mut inner.settings);
        let settings = inner.settings;
        if let Some(key) = inner.active.clone() {
            if let Some(video) = inner.registry.get_mut(&key) {
                video.apply_settings(&settings);
            }
        }
        debug!(
            muted = settings.audio.muted,
            volume = settings.audio.volume(),
            brightness = settings.brightness.label(),
            "Playback settings updated"
        );
        settings
    }

    /// Fit every source's target to a new viewport.
    ///
    /// The live player is moved/resized immediately. Every later `play()` has
    /// its target fitted to this viewport before a player is created.
    pub async fn resize(&self, viewport: Viewport) {
        let mut inner = self.inner.lock().await;
        if inner.viewport == Some(viewport) {
            return;
        }
        inner.viewport = Some(viewport);
        for video in inner.registry.values_mut() {
            video.retarget(viewport);
        }
        info!(%viewport, "Viewport resized");
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    pub async fn active(&self) -> Option<SourceKey> {
        self.inner.lock().await.active.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.registry.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn viewport(&self) -> Option<Viewport> {
        self.inner.lock().await.viewport
    }

    pub async fn source_info(&self, key: &SourceKey) -> Option<SourceInfo> {
        self.inner.lock().await.registry.get(key).map(SourceInfo::of)
    }

    /// All records, least recently played first.
    pub async fn sources(&self) -> Vec<SourceInfo> {
        self.inner
            .lock()
            .await
            .registry
            .values()
            .map(SourceInfo::of)
            .collect()
    }

    pub async fn screenshot(&self, key: &SourceKey) -> Option<Screenshot> {
        self.inner
            .lock()
            .await
            .registry
            .get(key)
            .and_then(ManagedVideo::screenshot)
    }

    /// Number of records currently holding a player. Never more than one.
    pub async fn live_players(&self) -> usize {
        self.inner
            .lock()
            .await
            .registry
            .values()
            .filter(|v| v.has_player())
            .count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
