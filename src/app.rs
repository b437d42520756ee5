//! Application wiring and the render loop.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use crossterm::{
    cursor::{Hide, Show},
    execute,
};
use tracing::{debug, info};

use crate::audio::{AudioDecoder, AudioPlayer, AudioSource, SampleRingBuffer};
use crate::config::{TerminalSize, VisualizerConfig};
use crate::ui::{KeyWatcher, Visualizer};

/// Main application state.
pub struct App {
    config: VisualizerConfig,
    /// Audio player
    player: AudioPlayer,
    /// Audio decoder
    decoder: AudioDecoder,
    /// Opened source, handed to the decoder when playback starts
    source: Option<AudioSource>,
    /// Samples shared between the output callback and the render loop
    buffer: Arc<SampleRingBuffer>,
    visualizer: Visualizer,
}

impl App {
    /// Perform every startup check: config, file, output device, terminal.
    pub fn new(path: &Path, config: VisualizerConfig) -> Result<Self> {
        config.validate()?;

        let source = AudioSource::open(path)?;
        let player = AudioPlayer::new()?;
        player.set_volume(config.volume);

        let size = TerminalSize::query()?;
        info!("Terminal is {}x{}", size.cols, size.rows);

        let buffer = Arc::new(SampleRingBuffer::new(config.capacity)?);
        let visualizer = Visualizer::new(config.capacity, size.rows, size.cols);

        Ok(Self {
            config,
            player,
            decoder: AudioDecoder::new(),
            source: Some(source),
            buffer,
            visualizer,
        })
    }

    /// Play the file and draw frames until a key is pressed or the stream
    /// ends.
    pub fn run(&mut self) -> Result<()> {
        let source = self
            .source
            .take()
            .context("Audio source already consumed")?;

        let tap = Arc::clone(&self.buffer);
        let producer = self
            .player
            .start(source.sample_rate(), move |samples, frames, stride| {
                tap.write(samples, frames, stride)
            })?;
        self.decoder
            .start(source, producer, self.player.finished_flag());

        let keys = KeyWatcher::stdin();
        let mut stdout = io::stdout();
        execute!(stdout, Hide)?;

        let result = self.run_loop(&keys, &mut stdout);

        self.decoder.stop();
        self.player.stop();

        // Restore the terminal even if the loop errored
        let _ = execute!(stdout, Show);
        let _ = writeln!(stdout);

        result
    }

    fn run_loop<W: Write>(&mut self, keys: &KeyWatcher, out: &mut W) -> Result<()> {
        let mut frames: u64 = 0;

        loop {
            if keys.pressed() {
                info!("Key pressed, stopping");
                break;
            }

            self.decoder.update();
            if !self.player.is_playing() {
                info!("End of stream");
                break;
            }

            let grid = self.visualizer.frame(&self.buffer)?;
            grid.render(out)?;
            frames += 1;

            thread::sleep(self.config.frame_interval);
        }

        debug!("Rendered {} frames", frames);
        Ok(())
    }
}
