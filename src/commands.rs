// Command-line handlers
// Wires the WAV loader to the playback driver and maps outcomes to exit codes

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::audio::backend::AudioHost;
use crate::audio::{CancelToken, Player};
use crate::error::PlaybackError;
use crate::settings::AppSettings;
use crate::wav::{WavFile, WavHeader};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;

/// Play a PCM WAV file on the default output device
#[derive(Parser, Debug, Clone)]
#[command(name = "wavplay")]
#[command(version, about)]
pub struct Cli {
    /// WAV file to play
    #[arg(default_value = "practice1.wav")]
    pub path: PathBuf,

    /// Settings file (JSON)
    #[arg(short, long, env = "WAVPLAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the stream poll interval in milliseconds
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Print the header and exit without playing
    #[arg(long)]
    pub info: bool,
}

impl Cli {
    /// Settings from the config file with command-line overrides applied
    pub fn settings(&self) -> AppSettings {
        let mut settings = match &self.config {
            Some(path) => AppSettings::load(path).unwrap_or_else(|e| {
                warn!("Ignoring settings file: {}", e);
                AppSettings::default()
            }),
            None => AppSettings::default(),
        };
        if let Some(ms) = self.poll_interval_ms {
            settings.playback.poll_interval_ms = ms;
        }
        settings
    }
}

/// Load a file for playback
pub fn load_source(path: &Path) -> Result<WavFile> {
    let wav = WavFile::open(path).with_context(|| format!("Error opening {}", path.display()))?;
    println!("Done reading file");
    Ok(wav)
}

/// Human-readable header dump
pub fn describe(header: &WavHeader, data_len: usize) -> String {
    let mut lines = vec![
        format!("File Size: {} MB", header.file_size_mb()),
        format!("Format Tag: {}", header.format_tag),
        format!("{} channels", header.channels),
        format!("Sample Rate: {} Hz", header.sample_rate),
        format!("Byte Rate: {}", header.byte_rate),
        format!("Sample Size: {}", header.sample_size),
        format!("Bits per Sample: {}", header.bits_per_sample),
        format!("Data Size: {} bytes", header.data_size),
    ];
    if data_len != header.data_size as usize {
        lines.push(format!("Data Present: {} bytes", data_len));
    }
    if let Some(secs) = header.duration_secs() {
        lines.push(format!("Duration: {:.2} s", secs));
    }
    lines.join("\n")
}

/// Play `wav` through `host`
pub fn play_file<H: AudioHost>(
    host: H,
    settings: &AppSettings,
    wav: &WavFile,
    cancel: CancelToken,
) -> Result<()> {
    let player = Player::new(host, settings.playback.clone());
    match player.play(wav, cancel) {
        Ok(_) => Ok(()),
        // Nothing was played, but the device was released cleanly
        Err(e @ PlaybackError::UnsupportedFormat { .. }) => {
            warn!("{}", e);
            Ok(())
        }
        Err(e) if e.is_driver_error() => Err(e).context("Audio driver error"),
        Err(e) => Err(e).context("Cannot play file"),
    }
}

/// Full command flow against a given audio host
pub fn run_with<H: AudioHost>(cli: &Cli, host: H, cancel: CancelToken) -> Result<()> {
    let settings = cli.settings();

    let wav = load_source(&cli.path)?;
    println!("{}", describe(wav.header(), wav.data_len()));

    if cli.info {
        return Ok(());
    }

    info!("Playing {}", cli.path.display());
    play_file(host, &settings, &wav, cancel)
}

/// Process exit code for the outcome of [`run_with`]
pub fn exit_code(result: &Result<()>) -> u8 {
    match result {
        Ok(()) => EXIT_SUCCESS,
        Err(_) => EXIT_FAILURE,
    }
}
