// Error types for loading and playback
// Driver failures are wrapped per lifecycle step so callers can tell them apart

use std::path::PathBuf;
use thiserror::Error;

/// Error reported by an audio backend, carrying the driver's own error text
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures while reading a WAV file into memory
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("header truncated: need {needed} bytes, file has {len}")]
    TruncatedHeader { needed: usize, len: usize },

    #[error("data chunk not found")]
    MissingDataChunk,

    #[error("data chunk at byte {offset} is missing its length field")]
    TruncatedDataChunk { offset: usize },
}

/// Failures while driving a playback session
#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("audio device initialization failed: {0}")]
    DeviceInit(#[source] DriverError),

    #[error("unsupported bits per sample: {bits} (format tag {format_tag})")]
    UnsupportedFormat { format_tag: u16, bits: u16 },

    #[error("invalid channel count: {0}")]
    InvalidChannels(u16),

    #[error("failed to open output stream: {0}")]
    StreamOpen(#[source] DriverError),

    #[error("failed to start output stream: {0}")]
    StreamStart(#[source] DriverError),

    #[error("failed to stop output stream: {0}")]
    StreamStop(#[source] DriverError),

    #[error("output stream failed while playing: {0}")]
    Poll(#[source] DriverError),
}

impl PlaybackError {
    /// True for errors raised by the audio driver itself rather than by the input
    pub fn is_driver_error(&self) -> bool {
        !matches!(
            self,
            PlaybackError::UnsupportedFormat { .. } | PlaybackError::InvalidChannels(_)
        )
    }
}

/// Failures while loading or saving settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_error_classification() {
        assert!(PlaybackError::DeviceInit("no device".into()).is_driver_error());
        assert!(PlaybackError::Poll("stream lost".into()).is_driver_error());
        assert!(!PlaybackError::UnsupportedFormat { format_tag: 1, bits: 24 }.is_driver_error());
        assert!(!PlaybackError::InvalidChannels(0).is_driver_error());
    }
}
