//! Render geometry: the host viewport and where a video is drawn inside it.

use serde::{Deserialize, Serialize};

/// Size of the host surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Parse a `WIDTHxHEIGHT` string such as `1920x1080`.
    pub fn parse(s: &str) -> Option<Self> {
        let (w, h) = s.trim().split_once(['x', 'X'])?;
        let width = w.trim().parse().ok()?;
        let height = h.trim().parse().ok()?;
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self { width, height })
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

impl std::fmt::Display for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Whether a video fills the background or floats above the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    /// Covers the whole viewport behind the UI.
    #[default]
    Background,
    /// Drawn at its own size and position above the background.
    Overlay,
}

/// Where a player draws its frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderTarget {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub layer: Layer,
}

impl RenderTarget {
    /// Background target anchored at the origin and covering `viewport`.
    pub fn cover(viewport: Viewport) -> Self {
        Self {
            x: 0,
            y: 0,
            width: viewport.width,
            height: viewport.height,
            layer: Layer::Background,
        }
    }

    /// Overlay target with an explicit rectangle.
    pub fn overlay(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            layer: Layer::Overlay,
        }
    }

    /// Fit this target to a resized viewport.
    ///
    /// Background targets grow or shrink to cover the new viewport. Overlay
    /// targets keep their size and are pulled back inside the viewport when
    /// the resize would leave them off-screen.
    pub fn retarget(&self, viewport: Viewport) -> Self {
        match self.layer {
            Layer::Background => Self::cover(viewport),
            Layer::Overlay => {
                let max_x = viewport.width.saturating_sub(self.width) as i32;
                let max_y = viewport.height.saturating_sub(self.height) as i32;
                Self {
                    x: self.x.clamp(0, max_x),
                    y: self.y.clamp(0, max_y),
                    ..*self
                }
            }
        }
    }
}
