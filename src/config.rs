//! Runtime configuration and terminal dimensions.

use std::time::Duration;

use crate::error::{Result, VisualizerError};

/// Default ring buffer capacity, which is also the FFT length.
pub const DEFAULT_CAPACITY: usize = 2048;

/// Default sleep between frames.
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 10;

/// Validated runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualizerConfig {
    /// Samples held by the ring buffer and fed to each transform
    pub capacity: usize,
    /// Sleep between frames
    pub frame_interval: Duration,
    /// Initial playback volume (0.0-1.0)
    pub volume: f32,
}

impl VisualizerConfig {
    pub fn new(capacity: usize, frame_interval_ms: u64, volume: f32) -> Result<Self> {
        let config = Self {
            capacity,
            frame_interval: Duration::from_millis(frame_interval_ms),
            volume: volume.clamp(0.0, 1.0),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity < 2 {
            return Err(VisualizerError::InvalidConfig(format!(
                "sample capacity must be at least 2, got {}",
                self.capacity
            )));
        }
        if self.frame_interval.is_zero() {
            return Err(VisualizerError::InvalidConfig(
                "frame interval must be at least 1 ms".into(),
            ));
        }
        Ok(())
    }
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            frame_interval: Duration::from_millis(DEFAULT_FRAME_INTERVAL_MS),
            volume: 1.0,
        }
    }
}

/// Terminal dimensions, read once at startup and never re-queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSize {
    pub rows: usize,
    pub cols: usize,
}

impl TerminalSize {
    /// Query the controlling terminal.
    pub fn query() -> Result<Self> {
        let (cols, rows) = crossterm::terminal::size().map_err(VisualizerError::TerminalQuery)?;
        Self::from_reported(cols, rows)
    }

    /// Reject a zero-sized report; the bin mapper divides by `cols`.
    pub fn from_reported(cols: u16, rows: u16) -> Result<Self> {
        if cols == 0 || rows == 0 {
            return Err(VisualizerError::TerminalSize { cols, rows });
        }
        Ok(Self {
            rows: rows as usize,
            cols: cols as usize,
        })
    }
}
