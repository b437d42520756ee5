//! Error taxonomy for the visualizer.

use std::path::PathBuf;

/// Errors raised while starting up or running the visualizer.
///
/// Everything except [`VisualizerError::Transform`] is a startup failure:
/// reported once, mapped to exit code 1, never retried.
#[derive(thiserror::Error, Debug)]
pub enum VisualizerError {
    /// Rejected runtime configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No default audio output device
    #[error("No output device available")]
    NoOutputDevice,

    /// Output stream could not be built or started
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// Audio file could not be opened, probed or decoded
    #[error("Failed to load {path:?}: {reason}")]
    Load { path: PathBuf, reason: String },

    /// Terminal reported an unusable size
    #[error("Terminal size {cols}x{rows} is unusable")]
    TerminalSize { cols: u16, rows: u16 },

    /// Terminal size could not be queried at all
    #[error("Failed to query terminal size: {0}")]
    TerminalQuery(#[source] std::io::Error),

    /// FFT collaborator failed for a frame
    #[error("Transform failed: {0}")]
    Transform(String),
}

impl VisualizerError {
    pub fn load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Load {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error belongs to the startup failure class.
    pub fn is_startup(&self) -> bool {
        !matches!(self, Self::Transform(_))
    }
}

pub type Result<T> = std::result::Result<T, VisualizerError>;
