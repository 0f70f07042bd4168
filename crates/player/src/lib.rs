//! Player façade and backends.
//!
//! The playback coordinator never talks to a media stack directly. It asks a
//! [`PlayerFactory`] for a fresh [`Player`] bound to a render target, and drives
//! that handle through a narrow async interface:
//!
//! ```text
//! PlayerFactory::create(target) ──► Box<dyn Player>
//!                                     load(url, start) ─► play() ─► ... ─► destroy()
//!                                     current_time_secs / capture_frame
//!                                     set_muted / set_volume / set_size / set_position
//!                                     frame_ready()  (watch: true once frames flow)
//! ```
//!
//! Backends are picked once at startup through [`PlayerBackend`]; call sites
//! stay identical whatever platform adapter is behind the trait.

pub mod backend;
pub mod black;
pub mod clock;
pub mod frame;
mod pattern;
pub mod player;
#[cfg(any(test, feature = "testing"))]
pub mod recording;
pub mod synthetic;

pub use backend::PlayerBackend;
pub use clock::PlaybackClock;
pub use frame::{Frame, Screenshot};
pub use player::{Player, PlayerFactory, SharedPlayerFactory};
pub use synthetic::{AutoplayPolicy, SyntheticFactory, SyntheticOptions};
