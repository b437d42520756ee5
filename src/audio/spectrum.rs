//! Spectrum computation: transform, magnitude and per-bin smoothing.
//!
//! Every one of the N transform bins is kept, including the mirrored upper
//! half of a real signal's spectrum. The bin mapper spreads all N bins
//! across the display and centers bin 0, so dropping the mirror would
//! change the layout.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner, Length};

use crate::error::{Result, VisualizerError};

/// Weight of the newest magnitude in the per-bin moving average.
pub const SMOOTHING_ALPHA: f32 = 0.1;

/// Real-to-complex forward transform.
pub trait FftEngine: Send {
    /// Transform `input` into `output`; both must have the engine's length.
    fn transform(&mut self, input: &[f32], output: &mut [Complex<f32>]) -> Result<()>;
}

/// [`FftEngine`] backed by a planned rustfft forward transform.
pub struct RustFftEngine {
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl RustFftEngine {
    pub fn new(len: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(len);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        Self { fft, scratch }
    }
}

impl FftEngine for RustFftEngine {
    fn transform(&mut self, input: &[f32], output: &mut [Complex<f32>]) -> Result<()> {
        let len = self.fft.len();
        if input.len() != len || output.len() != len {
            return Err(VisualizerError::Transform(format!(
                "expected {} samples, got input {} / output {}",
                len,
                input.len(),
                output.len()
            )));
        }

        for (out, &sample) in output.iter_mut().zip(input) {
            *out = Complex::new(sample, 0.0);
        }
        self.fft.process_with_scratch(output, &mut self.scratch);
        Ok(())
    }
}

/// Elementwise complex absolute value.
pub fn magnitude(frequency_domain: &[Complex<f32>], out: &mut [f32]) {
    for (m, c) in out.iter_mut().zip(frequency_domain) {
        *m = c.norm();
    }
}

/// Single-pole low-pass per bin: `state = α·magnitude + (1-α)·state`.
pub fn smooth(magnitudes: &[f32], state: &mut [f32]) {
    for (s, &m) in state.iter_mut().zip(magnitudes) {
        *s = SMOOTHING_ALPHA * m + (1.0 - SMOOTHING_ALPHA) * *s;
    }
}

/// Snapshot → transform → magnitude → smoothing, with state that persists
/// for the lifetime of the run.
pub struct SpectrumPipeline<E: FftEngine = RustFftEngine> {
    engine: E,
    frequency_domain: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,
    smoothed: Vec<f32>,
}

impl SpectrumPipeline<RustFftEngine> {
    pub fn new(len: usize) -> Self {
        Self::with_engine(RustFftEngine::new(len), len)
    }
}

impl<E: FftEngine> SpectrumPipeline<E> {
    pub fn with_engine(engine: E, len: usize) -> Self {
        Self {
            engine,
            frequency_domain: vec![Complex::new(0.0, 0.0); len],
            magnitudes: vec![0.0; len],
            smoothed: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.smoothed.len()
    }

    /// Run one frame over `time_domain` and return the smoothed spectrum.
    pub fn process(&mut self, time_domain: &[f32]) -> Result<&[f32]> {
        self.engine
            .transform(time_domain, &mut self.frequency_domain)?;
        magnitude(&self.frequency_domain, &mut self.magnitudes);
        smooth(&self.magnitudes, &mut self.smoothed);
        Ok(&self.smoothed)
    }

    /// Raw magnitudes of the last processed frame (used in tests)
    #[cfg(test)]
    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes
    }

    #[cfg(test)]
    pub fn smoothed(&self) -> &[f32] {
        &self.smoothed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_smoothing_closed_form() {
        let magnitudes = [4.0f32];
        let mut state = [0.0f32];

        for _ in 0..5 {
            smooth(&magnitudes, &mut state);
        }
        assert_relative_eq!(state[0], 4.0 * (1.0 - 0.9f32.powi(5)), epsilon = 1e-5);
        assert_relative_eq!(state[0], 1.638, epsilon = 1e-3);

        for _ in 5..50 {
            smooth(&magnitudes, &mut state);
        }
        assert_relative_eq!(state[0], 3.98, epsilon = 5e-3);
    }

    #[test]
    fn test_magnitude_is_abs() {
        let fd = [Complex::new(3.0, 4.0), Complex::new(0.0, -2.0)];
        let mut out = [0.0; 2];
        magnitude(&fd, &mut out);
        assert_relative_eq!(out[0], 5.0);
        assert_relative_eq!(out[1], 2.0);
    }

    #[test]
    fn test_impulse_has_flat_spectrum() {
        let mut engine = RustFftEngine::new(16);
        let mut input = vec![0.0; 16];
        input[0] = 1.0;
        let mut output = vec![Complex::new(0.0, 0.0); 16];
        engine.transform(&input, &mut output).unwrap();
        for c in &output {
            assert_relative_eq!(c.norm(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_constant_lands_in_dc_bin() {
        let mut pipeline = SpectrumPipeline::new(32);
        pipeline.process(&[0.5; 32]).unwrap();
        assert_relative_eq!(pipeline.magnitudes()[0], 16.0, epsilon = 1e-4);
        assert!(pipeline.magnitudes()[1..].iter().all(|&m| m < 1e-4));
        assert_relative_eq!(pipeline.smoothed()[0], 1.6, epsilon = 1e-4);
    }

    #[test]
    fn test_mirrored_half_is_kept() {
        let n = 64;
        let tone: Vec<f32> = (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * 4.0 * i as f32 / n as f32).cos())
            .collect();
        let mut pipeline = SpectrumPipeline::new(n);
        pipeline.process(&tone).unwrap();
        let mags = pipeline.magnitudes();
        assert_eq!(mags.len(), n);
        assert_relative_eq!(mags[4], 32.0, epsilon = 1e-3);
        assert_relative_eq!(mags[n - 4], 32.0, epsilon = 1e-3);
    }

    #[test]
    fn test_silence_stays_zero() {
        let mut pipeline = SpectrumPipeline::new(128);
        for _ in 0..3 {
            let smoothed = pipeline.process(&[0.0; 128]).unwrap();
            assert!(smoothed.iter().all(|&s| s == 0.0));
        }
    }

    #[test]
    fn test_length_mismatch_is_transform_error() {
        let mut pipeline = SpectrumPipeline::new(64);
        assert!(matches!(
            pipeline.process(&[0.0; 32]),
            Err(VisualizerError::Transform(_))
        ));
    }

    #[test]
    fn test_custom_engine_is_used() {
        struct Flat;
        impl FftEngine for Flat {
            fn transform(&mut self, _input: &[f32], output: &mut [Complex<f32>]) -> Result<()> {
                output.fill(Complex::new(10.0, 0.0));
                Ok(())
            }
        }

        let mut pipeline = SpectrumPipeline::with_engine(Flat, 8);
        let smoothed = pipeline.process(&[0.0; 8]).unwrap();
        assert!(smoothed.iter().all(|&s| (s - 1.0).abs() < 1e-6));
    }
}
