//! Coordinator configuration and the viewer settings pushed to players.

use std::time::Duration;

use bd_common::{AudioSettings, Brightness};
use serde::{Deserialize, Serialize};

/// Resize bursts shorter than this collapse into a single resize.
pub const DEFAULT_RESIZE_DEBOUNCE_MS: u64 = 100;

/// Settings applied to every player handle the manager creates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlaybackSettings {
    pub audio: AudioSettings,
    pub brightness: Brightness,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Registry capacity. Least-recently-played sources beyond it are
    /// forgotten (screenshot and position included). `None` keeps all.
    pub max_sources: Option<usize>,
    pub resize_debounce_ms: u64,
}

impl ManagerConfig {
    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            max_sources: None,
            resize_debounce_ms: DEFAULT_RESIZE_DEBOUNCE_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_fill_missing_fields() {
        let config: ManagerConfig = serde_json::from_str(r#"{"max_sources": 4}"#).unwrap();
        assert_eq!(config.max_sources, Some(4));
        assert_eq!(config.resize_debounce(), Duration::from_millis(100));
    }
}
