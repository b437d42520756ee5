//! Per-frame driver tying the sample buffer, spectrum pipeline and grid together.

use rand::rngs::ThreadRng;
use rand::Rng;

use crate::audio::spectrum::{FftEngine, RustFftEngine, SpectrumPipeline};
use crate::audio::SampleRingBuffer;
use crate::error::Result;

use super::grid::TerminalGrid;
use super::mapper;

/// Spectrum visualizer.
///
/// Owns the smoothing state and the grid; the glyph source is injected so
/// tests can use a seeded generator.
pub struct Visualizer<R: Rng = ThreadRng, E: FftEngine = RustFftEngine> {
    pipeline: SpectrumPipeline<E>,
    grid: TerminalGrid,
    time_domain: Vec<f32>,
    rng: R,
}

impl Visualizer {
    pub fn new(samples: usize, rows: usize, cols: usize) -> Self {
        Self::with_parts(SpectrumPipeline::new(samples), rows, cols, rand::thread_rng())
    }
}

impl<R: Rng, E: FftEngine> Visualizer<R, E> {
    pub fn with_parts(pipeline: SpectrumPipeline<E>, rows: usize, cols: usize, rng: R) -> Self {
        let time_domain = vec![0.0; pipeline.len()];
        Self {
            pipeline,
            grid: TerminalGrid::new(rows, cols),
            time_domain,
            rng,
        }
    }

    /// Build the next frame from the latest buffer contents.
    ///
    /// The buffer lock is held only while copying the snapshot.
    pub fn frame(&mut self, buffer: &SampleRingBuffer) -> Result<&TerminalGrid> {
        buffer.snapshot_into(&mut self.time_domain);
        let smoothed = self.pipeline.process(&self.time_domain)?;

        self.grid.clear();
        mapper::plot(smoothed, &mut self.grid, &mut self.rng);
        Ok(&self.grid)
    }

    #[cfg(test)]
    pub fn grid(&self) -> &TerminalGrid {
        &self.grid
    }
}
