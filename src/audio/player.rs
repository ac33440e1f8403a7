// Playback driver
// Owns the device and stream for exactly one session and tears both down on
// every exit path

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::backend::{AudioHost, OutputDevice, OutputStream, StreamSpec};
use super::format::SampleFormat;
use super::session::{CancelToken, PlaybackSession, SessionState};
use crate::error::PlaybackError;
use crate::settings::PlaybackSettings;
use crate::wav::WavFile;

/// Lifecycle of one playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Uninitialized,
    DeviceOpen,
    StreamOpen,
    Streaming,
    Stopped,
    Terminated,
    Error,
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Tracks and logs state transitions
#[derive(Debug)]
pub(crate) struct StateMachine {
    state: PlayerState,
    history: Vec<PlayerState>,
}

impl StateMachine {
    pub(crate) fn new() -> Self {
        Self {
            state: PlayerState::Uninitialized,
            history: vec![PlayerState::Uninitialized],
        }
    }

    fn enter(&mut self, next: PlayerState) {
        debug!("Playback state {} -> {}", self.state, next);
        self.state = next;
        self.history.push(next);
    }

    /// Every state entered so far, oldest first
    pub(crate) fn history(&self) -> &[PlayerState] {
        &self.history
    }

    /// Log `err`, move to `Error` and hand the error back for propagation
    fn fail(&mut self, err: PlaybackError) -> PlaybackError {
        error!("{}", err);
        self.enter(PlayerState::Error);
        err
    }
}

/// Device held for the length of one session; dropping it tears down the subsystem
struct DeviceGuard<D> {
    device: D,
}

impl<D> Drop for DeviceGuard<D> {
    fn drop(&mut self) {
        debug!("Releasing output device");
    }
}

/// Open stream; dropping it closes the stream
struct StreamGuard<S> {
    stream: S,
}

impl<S> Drop for StreamGuard<S> {
    fn drop(&mut self) {
        debug!("Closing output stream");
    }
}

/// Summary of a finished session
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackReport {
    pub bytes_played: usize,
    pub total_bytes: usize,
    pub cancelled: bool,
    pub elapsed: Duration,
    /// States the session passed through
    pub states: Vec<PlayerState>,
}

/// Resources held by a session that made it to `Streaming`
pub(crate) struct Acquired<H: AudioHost> {
    // Stream closes before the device is released
    stream: StreamGuard<<H::Device as OutputDevice>::Stream>,
    device: DeviceGuard<H::Device>,
    shared: Arc<SessionState>,
    total_bytes: usize,
}

/// Plays WAV files through an audio host
pub struct Player<H: AudioHost> {
    host: H,
    settings: PlaybackSettings,
}

impl<H: AudioHost> Player<H> {
    pub fn new(host: H, settings: PlaybackSettings) -> Self {
        Self { host, settings }
    }

    /// Play `wav` to completion, blocking the caller
    pub fn play(&self, wav: &WavFile, cancel: CancelToken) -> Result<PlaybackReport, PlaybackError> {
        self.start(wav, cancel)?.wait()
    }

    /// Open the device and stream and start playback.
    ///
    /// Anything acquired before a failure is released before returning.
    pub fn start(
        &self,
        wav: &WavFile,
        cancel: CancelToken,
    ) -> Result<PlaybackHandle<H>, PlaybackError> {
        let mut machine = StateMachine::new();
        let acquired = self.start_with(wav, cancel, &mut machine)?;

        Ok(PlaybackHandle {
            stream: Some(acquired.stream),
            device: Some(acquired.device),
            shared: acquired.shared,
            total_bytes: acquired.total_bytes,
            byte_rate: wav.header().byte_rate,
            settings: self.settings.clone(),
            machine,
            started: Instant::now(),
        })
    }

    /// Run the setup steps, recording transitions in `machine`.
    ///
    /// On failure the partially acquired resources are dropped here, so the
    /// machine ends in `Terminated` on every error path.
    pub(crate) fn start_with(
        &self,
        wav: &WavFile,
        cancel: CancelToken,
        machine: &mut StateMachine,
    ) -> Result<Acquired<H>, PlaybackError> {
        let result = self.acquire(wav, cancel, machine);
        if result.is_err() {
            machine.enter(PlayerState::Terminated);
        }
        result
    }

    fn acquire(
        &self,
        wav: &WavFile,
        cancel: CancelToken,
        machine: &mut StateMachine,
    ) -> Result<Acquired<H>, PlaybackError> {
        let header = wav.header();

        let device = match self.host.open_device() {
            Ok(device) => DeviceGuard { device },
            Err(e) => return Err(machine.fail(PlaybackError::DeviceInit(e))),
        };
        machine.enter(PlayerState::DeviceOpen);
        info!("Using output device: {}", device.device.name());

        let format = match SampleFormat::resolve(header.format_tag, header.bits_per_sample) {
            Ok(format) => format,
            Err(e) => return Err(machine.fail(e)),
        };
        if header.channels == 0 {
            return Err(machine.fail(PlaybackError::InvalidChannels(header.channels)));
        }

        let bytes_per_frame = format.bytes_per_sample() * header.channels as usize;
        let Some(session) = PlaybackSession::new(wav.samples(), bytes_per_frame, cancel) else {
            return Err(machine.fail(PlaybackError::InvalidChannels(header.channels)));
        };
        let shared = session.shared_state();
        let total_bytes = session.total_bytes();

        let spec = StreamSpec {
            channels: header.channels,
            sample_rate: header.sample_rate,
            format,
        };
        debug!(
            "Opening stream: {} channels, {} Hz, {}",
            spec.channels, spec.sample_rate, spec.format
        );
        let stream = match device.device.open_stream(&spec, session) {
            Ok(stream) => StreamGuard { stream },
            Err(e) => return Err(machine.fail(PlaybackError::StreamOpen(e))),
        };
        machine.enter(PlayerState::StreamOpen);

        if let Err(e) = stream.stream.start() {
            return Err(machine.fail(PlaybackError::StreamStart(e)));
        }
        machine.enter(PlayerState::Streaming);

        Ok(Acquired {
            stream,
            device,
            shared,
            total_bytes,
        })
    }
}

/// A running session.
///
/// Dropping the handle without calling [`PlaybackHandle::wait`] cancels
/// playback and releases the stream and device.
pub struct PlaybackHandle<H: AudioHost> {
    // Field order matters: the stream must close before the device goes
    stream: Option<StreamGuard<<H::Device as OutputDevice>::Stream>>,
    device: Option<DeviceGuard<H::Device>>,
    shared: Arc<SessionState>,
    total_bytes: usize,
    byte_rate: u32,
    settings: PlaybackSettings,
    machine: StateMachine,
    started: Instant,
}

impl<H: AudioHost> PlaybackHandle<H> {
    /// True until the feed callback has drained the buffer
    pub fn is_active(&self) -> bool {
        !self.shared.is_complete()
    }

    /// Bytes handed to the device so far
    pub fn position(&self) -> usize {
        self.shared.offset()
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Ask the session to stop; [`PlaybackHandle::wait`] returns within one poll interval
    pub fn cancel(&self) {
        self.shared.cancel();
    }

    /// Block until playback finishes, is cancelled or the stream fails
    pub fn wait(mut self) -> Result<PlaybackReport, PlaybackError> {
        let poll_interval = self.settings.poll_interval();
        let progress_interval = self.settings.progress_log_interval();
        let mut last_progress = Instant::now();
        let mut fault = None;

        // A stalled driver never runs the callback, so cancellation is
        // checked here as well as in the feed
        while self.is_active() && !self.shared.is_cancelled() {
            if let Some(message) = self.shared.take_fault() {
                fault = Some(message);
                break;
            }
            thread::sleep(poll_interval);

            if let Some(interval) = progress_interval {
                if last_progress.elapsed() >= interval {
                    self.log_progress();
                    last_progress = Instant::now();
                }
            }
        }

        if fault.is_none() && !self.shared.is_cancelled() {
            // Let the last buffer handed to the device play out
            thread::sleep(poll_interval);
            fault = self.shared.take_fault();
        }

        if let Some(message) = fault {
            let err = self.machine.fail(PlaybackError::Poll(message.into()));
            self.stop();
            self.release();
            return Err(err);
        }

        self.stop();
        self.release();

        let report = PlaybackReport {
            bytes_played: self.shared.offset(),
            total_bytes: self.total_bytes,
            cancelled: self.shared.is_cancelled(),
            elapsed: self.started.elapsed(),
            states: self.machine.history().to_vec(),
        };
        info!(
            "Playback {} after {:.1}s ({} of {} bytes)",
            if report.cancelled { "cancelled" } else { "finished" },
            report.elapsed.as_secs_f64(),
            report.bytes_played,
            report.total_bytes
        );
        Ok(report)
    }

    fn log_progress(&self) {
        let position = self.position();
        if self.byte_rate > 0 {
            info!(
                "Played {:.1}s of {:.1}s",
                position as f64 / self.byte_rate as f64,
                self.total_bytes as f64 / self.byte_rate as f64
            );
        } else {
            info!("Played {} of {} bytes", position, self.total_bytes);
        }
    }

    /// Best-effort stop; failures are logged and otherwise ignored
    fn stop(&mut self) {
        if let Some(guard) = &self.stream {
            if let Err(e) = guard.stream.stop() {
                warn!("{}", PlaybackError::StreamStop(e));
            }
            if self.machine.state == PlayerState::Streaming {
                self.machine.enter(PlayerState::Stopped);
            }
        }
    }

    /// Close the stream, then release the device
    fn release(&mut self) {
        let had_resources = self.stream.is_some() || self.device.is_some();
        drop(self.stream.take());
        drop(self.device.take());
        if had_resources {
            self.machine.enter(PlayerState::Terminated);
        }
    }
}

impl<H: AudioHost> Drop for PlaybackHandle<H> {
    fn drop(&mut self) {
        if self.stream.is_some() {
            warn!("Playback handle dropped while streaming, stopping");
            self.shared.cancel();
            self.stop();
        }
        self.release();
    }
}
