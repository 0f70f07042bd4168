//! Shared types for the Backdrop workspace.
//!
//! Everything here is plain data: source identifiers, render geometry, the
//! viewer-facing audio/brightness settings, and the error enum returned by
//! player backends. Crates further up the stack (`bd-player`, `bd-playback`)
//! depend on these so that a backend and the coordinator agree on a single
//! vocabulary.

pub mod controls;
pub mod error;
pub mod geometry;
pub mod source;

pub use controls::{AudioSettings, Brightness};
pub use error::PlayerError;
pub use geometry::{Layer, RenderTarget, Viewport};
pub use source::SourceKey;
