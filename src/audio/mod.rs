// Audio playback module
// Streams in-memory PCM through cpal with a pull-based feed callback

pub mod backend;
pub mod format;
pub mod output;
pub mod player;
pub mod session;

pub use format::SampleFormat;
pub use output::CpalHost;
pub use player::{PlaybackHandle, PlaybackReport, Player, PlayerState};
pub use session::{CancelToken, FeedStatus, PlaybackSession};
