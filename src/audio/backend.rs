// Audio backend abstraction
// The playback driver talks to the device through these traits; cpal is the
// production implementation, tests plug in a scripted one

use super::format::SampleFormat;
use super::session::PlaybackSession;
use crate::error::DriverError;

/// Parameters of the output stream to open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSpec {
    pub channels: u16,
    pub sample_rate: u32,
    pub format: SampleFormat,
}

/// Entry point into an audio subsystem
pub trait AudioHost {
    type Device: OutputDevice;

    /// Initialize the subsystem and acquire the default output device.
    /// Dropping the device tears the subsystem down.
    fn open_device(&self) -> Result<Self::Device, DriverError>;
}

/// An acquired output device
pub trait OutputDevice {
    type Stream: OutputStream;

    fn name(&self) -> String;

    /// Open an output-only stream whose callback feeds from `session`.
    /// The host chooses the block size. Dropping the stream closes it.
    fn open_stream(
        &self,
        spec: &StreamSpec,
        session: PlaybackSession,
    ) -> Result<Self::Stream, DriverError>;
}

/// An open output stream
pub trait OutputStream {
    fn start(&self) -> Result<(), DriverError>;
    fn stop(&self) -> Result<(), DriverError>;
}
