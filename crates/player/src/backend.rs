//! Backend selection.
//!
//! The host picks one backend at startup; everything downstream only sees a
//! [`SharedPlayerFactory`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::info;

use crate::black::BlackFactory;
use crate::player::SharedPlayerFactory;
use crate::synthetic::{SyntheticFactory, SyntheticOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerBackend {
    /// Clock-driven test pattern.
    #[default]
    Synthetic,
    /// Solid black frames; nothing decodes.
    Black,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown player backend '{0}' (expected 'synthetic' or 'black')")]
pub struct UnknownBackend(String);

impl PlayerBackend {
    pub const ALL: [PlayerBackend; 2] = [PlayerBackend::Synthetic, PlayerBackend::Black];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Synthetic => "synthetic",
            Self::Black => "black",
        }
    }

    /// Build the factory for this backend.
    ///
    /// `options` only affects the synthetic backend.
    pub fn factory(self, options: SyntheticOptions) -> SharedPlayerFactory {
        info!(backend = self.as_str(), "Player backend selected");
        match self {
            Self::Synthetic => Arc::new(SyntheticFactory::new(options)),
            Self::Black => Arc::new(BlackFactory),
        }
    }
}

impl fmt::Display for PlayerBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlayerBackend {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "synthetic" | "test" | "pattern" => Ok(Self::Synthetic),
            "black" | "off" => Ok(Self::Black),
            other => Err(UnknownBackend(other.to_string())),
        }
    }
}
