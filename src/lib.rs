// wavplay - PCM WAV playback on the default output device
// Module declarations
pub mod audio;
pub mod commands;
pub mod error;
pub mod settings;
pub mod wav;

use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use audio::{CancelToken, CpalHost};
use commands::Cli;

pub use error::{LoadError, PlaybackError, SettingsError};

/// Cancel `token` when the process receives Ctrl-C.
///
/// The process is never terminated from here: every blocking phase of
/// playback watches the token, so `run` always unwinds through the stream
/// and device guards.
fn spawn_interrupt_listener(token: CancelToken) {
    let spawned = std::thread::Builder::new()
        .name("ctrl-c".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    warn!("Ctrl-C handling unavailable: {}", e);
                    return;
                }
            };
            runtime.block_on(async {
                if tokio::signal::ctrl_c().await.is_err() {
                    return;
                }
                info!("Received Ctrl+C, stopping playback");
                token.cancel();
            });
        });
    if let Err(e) = spawned {
        warn!("Failed to spawn Ctrl-C listener: {}", e);
    }
}

pub fn run() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wavplay=info,wavplay_lib=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    debug!("{:?}", cli);

    println!("Program Started");
    match std::env::current_dir() {
        Ok(dir) => println!("Current Working Directory: {}", dir.display()),
        Err(e) => warn!("Cannot determine working directory: {}", e),
    }

    let cancel = CancelToken::new();
    spawn_interrupt_listener(cancel.clone());

    let result = commands::run_with(&cli, CpalHost::new(), cancel);
    if let Err(e) = &result {
        error!("{:#}", e);
    }
    ExitCode::from(commands::exit_code(&result))
}
