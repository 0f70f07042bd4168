//! Viewer preferences persisted between runs.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bd_common::{AudioSettings, Brightness};
use bd_playback::PlaybackSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed preferences in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Saved mute, volume and brightness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub muted: bool,
    pub volume: f32,
    pub brightness: Brightness,
}

impl Default for Preferences {
    fn default() -> Self {
        Self::from_settings(&PlaybackSettings::default())
    }
}

impl Preferences {
    pub fn from_settings(settings: &PlaybackSettings) -> Self {
        Self {
            muted: settings.audio.muted,
            volume: settings.audio.volume(),
            brightness: settings.brightness,
        }
    }

    pub fn settings(&self) -> PlaybackSettings {
        PlaybackSettings {
            audio: AudioSettings::new(self.muted, self.volume),
            brightness: self.brightness,
        }
    }

    /// `<config dir>/backdrop/preferences.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("backdrop").join("preferences.json"))
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, PrefsError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(PrefsError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&contents).map_err(|source| PrefsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), PrefsError> {
        let io_err = |source| PrefsError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let contents = serde_json::to_string_pretty(self).map_err(|source| PrefsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, contents).map_err(io_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = Preferences::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(prefs, Preferences::default());
        assert!(prefs.muted);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.json");
        let prefs = Preferences {
            muted: false,
            volume: 0.4,
            brightness: Brightness::Dim,
        };

        prefs.save(&path).unwrap();
        assert_eq!(Preferences::load(&path).unwrap(), prefs);
    }

    #[test]
    fn partial_file_fills_defaults_and_clamps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, r#"{"volume": 3.0}"#).unwrap();

        let prefs = Preferences::load(&path).unwrap();
        assert_eq!(prefs.brightness, Brightness::On);
        assert_eq!(prefs.settings().audio.volume(), 1.0);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            Preferences::load(&path),
            Err(PrefsError::Parse { .. })
        ));
    }
}
