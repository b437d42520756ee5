//! specterm - real-time terminal spectrum visualizer.
//!
//! Plays an audio file and draws its smoothed frequency spectrum as a
//! grid of characters, with the DC bin in the middle of the screen.

mod app;
mod audio;
mod config;
mod error;
mod logging;
mod ui;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use app::App;
use config::{VisualizerConfig, DEFAULT_CAPACITY, DEFAULT_FRAME_INTERVAL_MS};

/// Terminal spectrum visualizer
///
/// Plays an audio file and renders its spectrum until a key is pressed
/// or the file ends.
#[derive(Parser, Debug)]
#[command(name = "specterm")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Audio file to play
    file: Option<PathBuf>,

    /// Samples per analysis window
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    samples: usize,

    /// Milliseconds to sleep between frames
    #[arg(long, default_value_t = DEFAULT_FRAME_INTERVAL_MS)]
    interval_ms: u64,

    /// Playback volume (0.0-1.0)
    #[arg(long, default_value_t = 1.0)]
    volume: f32,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    // Show the cursor again if anything panics mid-frame
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = crossterm::execute!(std::io::stdout(), crossterm::cursor::Show);
        original_hook(panic_info);
    }));

    let args = Args::parse();
    logging::init_logging(Some(&args.log_level));

    let Some(path) = args.file.as_deref() else {
        info!("No file name provided.");
        return ExitCode::SUCCESS;
    };

    let result = VisualizerConfig::new(args.samples, args.interval_ms, args.volume)
        .map_err(anyhow::Error::from)
        .and_then(|config| App::new(path, config))
        .and_then(|mut app| app.run());

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let startup = e
                .downcast_ref::<error::VisualizerError>()
                .is_some_and(|e| e.is_startup());
            if startup {
                error!("Startup failed: {:#}", e);
            } else {
                error!("{:#}", e);
            }
            ExitCode::from(1)
        }
    }
}
