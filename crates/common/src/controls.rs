//! Viewer-facing playback controls: audio and brightness.

use serde::{Deserialize, Serialize};

/// Mute flag and volume applied to whichever player is live.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    pub muted: bool,
    volume: f32,
}

impl AudioSettings {
    pub fn new(muted: bool, volume: f32) -> Self {
        Self {
            muted,
            volume: clamp_volume(volume),
        }
    }

    /// Volume in `[0, 1]`.
    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = clamp_volume(volume);
    }
}

impl Default for AudioSettings {
    /// Muted at full volume, so autoplay is not rejected on first launch.
    fn default() -> Self {
        Self {
            muted: true,
            volume: 1.0,
        }
    }
}

fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        return 0.0;
    }
    volume.clamp(0.0, 1.0)
}

/// Three-step brightness filter applied over the video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Brightness {
    #[default]
    On,
    Dim,
    Off,
}

impl Brightness {
    /// Multiplier passed to the player.
    pub fn level(self) -> f32 {
        match self {
            Self::On => 1.0,
            Self::Dim => 0.5,
            Self::Off => 0.0,
        }
    }

    /// Next step in the on → dim → off cycle.
    pub fn cycle(self) -> Self {
        match self {
            Self::On => Self::Dim,
            Self::Dim => Self::Off,
            Self::Off => Self::On,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Dim => "dim",
            Self::Off => "off",
        }
    }
}
