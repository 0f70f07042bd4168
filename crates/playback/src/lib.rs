//! Playback coordination for backdrop.
//!
//! Many video sources, one player resource. [`VideoManager`] keeps a record
//! per source (position, screenshot, render target) and guarantees that only
//! the active source holds a live player handle. Inactive sources are shown
//! as the screenshot taken when they were paused.

pub mod debounce;
pub mod manager;
mod registry;
pub mod settings;
pub mod video;

pub use debounce::ResizeDebouncer;
pub use manager::{PlayOutcome, SourceInfo, VideoManager};
pub use settings::{ManagerConfig, PlaybackSettings, DEFAULT_RESIZE_DEBOUNCE_MS};
pub use video::{ManagedVideo, PlayStart, VideoState};
