//! Error types shared by player backends and the playback coordinator.

/// Errors a player backend can report.
///
/// The coordinator treats every variant as recoverable: failures are logged
/// and the state machine moves on. The variant only decides *how* it moves
/// on (keep the handle, drop the handle, or ignore).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlayerError {
    /// The source could not be loaded (bad URL, unsupported format, network).
    #[error("failed to load {url}: {reason}")]
    Load { url: String, reason: String },

    /// Platform policy rejected playback that was not started by a user gesture.
    #[error("autoplay blocked: {0}")]
    AutoplayBlocked(String),

    /// Releasing the underlying resource failed.
    #[error("teardown failed: {0}")]
    Teardown(String),

    /// The backend could not bind a surface to the render target.
    #[error("cannot attach to render target: {0}")]
    Attach(String),

    /// A captured frame could not be encoded.
    #[error("frame encoding failed: {0}")]
    Encode(String),
}

impl PlayerError {
    /// Shorthand for a [`PlayerError::Load`].
    pub fn load(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Load {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Whether a fresh `play()` on the same handle may succeed later.
    pub fn is_autoplay_blocked(&self) -> bool {
        matches!(self, Self::AutoplayBlocked(_))
    }
}
