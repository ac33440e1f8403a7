// Settings loaded from an optional JSON file
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::SettingsError;

/// Playback loop settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    pub poll_interval_ms: u64, // how often the wait loop checks the stream
    pub progress_log_interval_ms: u64, // 0 disables progress logging
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            progress_log_interval_ms: 1000,
        }
    }
}

impl PlaybackSettings {
    /// Poll interval, never shorter than one millisecond
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn progress_log_interval(&self) -> Option<Duration> {
        (self.progress_log_interval_ms > 0)
            .then(|| Duration::from_millis(self.progress_log_interval_ms))
    }
}

/// Main application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub version: i32, // Settings schema version for future migrations
    pub playback: PlaybackSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: 1,
            playback: PlaybackSettings::default(),
        }
    }
}

impl AppSettings {
    /// Load settings from file, or return defaults if the file doesn't exist
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: AppSettings = serde_json::from_str(&content)?;

        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}
