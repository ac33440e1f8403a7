// Audio output using cpal
// Opens the default output device and streams a playback session through it

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SizedSample, Stream, StreamConfig};
use tracing::error;

use super::backend::{AudioHost, OutputDevice, OutputStream, StreamSpec};
use super::format::{LeSample, SampleFormat};
use super::session::PlaybackSession;
use crate::error::DriverError;

/// The platform's default cpal host
pub struct CpalHost {
    host: cpal::Host,
}

impl CpalHost {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }
}

impl Default for CpalHost {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioHost for CpalHost {
    type Device = CpalDevice;

    fn open_device(&self) -> Result<CpalDevice, DriverError> {
        let device = self
            .host
            .default_output_device()
            .ok_or("No output device available")?;
        Ok(CpalDevice { device })
    }
}

pub struct CpalDevice {
    device: cpal::Device,
}

impl OutputDevice for CpalDevice {
    type Stream = CpalStream;

    fn name(&self) -> String {
        self.device
            .name()
            .unwrap_or_else(|_| "<unnamed device>".to_string())
    }

    fn open_stream(
        &self,
        spec: &StreamSpec,
        session: PlaybackSession,
    ) -> Result<CpalStream, DriverError> {
        let config = StreamConfig {
            channels: spec.channels,
            sample_rate: cpal::SampleRate(spec.sample_rate),
            buffer_size: BufferSize::Default,
        };

        let stream = match spec.format {
            SampleFormat::U8 => Self::build_stream::<u8>(&self.device, &config, session)?,
            SampleFormat::I16 => Self::build_stream::<i16>(&self.device, &config, session)?,
            SampleFormat::I32 => Self::build_stream::<i32>(&self.device, &config, session)?,
            SampleFormat::F32 => Self::build_stream::<f32>(&self.device, &config, session)?,
            SampleFormat::F64 => Self::build_stream::<f64>(&self.device, &config, session)?,
        };

        Ok(CpalStream { stream })
    }
}

impl CpalDevice {
    fn build_stream<T: SizedSample + LeSample>(
        device: &cpal::Device,
        config: &StreamConfig,
        mut session: PlaybackSession,
    ) -> Result<Stream, cpal::BuildStreamError> {
        let faults = session.fault_reporter();

        device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                // cpal has no "complete" return; once drained the session
                // keeps producing silence until the stream is stopped
                session.fill_samples(data);
            },
            move |err| {
                error!("Audio output error: {}", err);
                faults.report(err.to_string());
            },
            None,
        )
    }
}

pub struct CpalStream {
    stream: Stream,
}

impl OutputStream for CpalStream {
    fn start(&self) -> Result<(), DriverError> {
        self.stream.play()?;
        Ok(())
    }

    fn stop(&self) -> Result<(), DriverError> {
        self.stream.pause()?;
        Ok(())
    }
}
