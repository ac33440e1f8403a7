// Settings module
// JSON-backed settings for the playback loop

#[allow(clippy::module_inception)]
pub mod settings;

pub use settings::{AppSettings, PlaybackSettings};
