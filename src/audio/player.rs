//! Audio playback via cpal with real-time audio callback.
//!
//! The output callback runs on the audio thread. Apart from the sample
//! tap's short critical section it must never allocate, lock or block.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};
use ringbuf::{traits::*, HeapRb};
use tracing::{info, warn};

use crate::error::{Result, VisualizerError};

/// Atomic f32 for lock-free volume control.
/// Stores f32 bits as u32 for atomic operations.
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(val: f32) -> Self {
        Self(AtomicU32::new(val.to_bits()))
    }

    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn store(&self, val: f32) {
        self.0.store(val.to_bits(), Ordering::Relaxed);
    }
}

/// Playback ring size: ~500ms of stereo audio at 44100 Hz
pub const RING_BUFFER_SIZE: usize = 44100;

/// Interleaved output channels; the decoder always produces stereo.
pub const CHANNELS: u16 = 2;

/// State moved into the output callback.
struct OutputState<F> {
    consumer: ringbuf::HeapCons<f32>,
    tap: F,
    volume: Arc<AtomicF32>,
    finished: Arc<AtomicBool>,
    drained: Arc<AtomicBool>,
}

impl<F> OutputState<F>
where
    F: FnMut(&[f32], usize, usize),
{
    /// Fill one device block. The tap sees the samples before volume.
    fn fill(&mut self, output: &mut [f32]) {
        let popped = self.consumer.pop_slice(output);
        output[popped..].fill(0.0);

        if popped == 0 && self.finished.load(Ordering::Relaxed) {
            self.drained.store(true, Ordering::Relaxed);
        }

        let channels = CHANNELS as usize;
        (self.tap)(&*output, output.len() / channels, channels);

        let vol = self.volume.load();
        if vol != 1.0 {
            for sample in output.iter_mut() {
                *sample *= vol;
            }
        }
    }
}

/// Audio player with real-time playback using cpal.
pub struct AudioPlayer {
    device: Device,
    stream: Option<Stream>,
    volume: Arc<AtomicF32>,
    finished: Arc<AtomicBool>,
    drained: Arc<AtomicBool>,
}

impl AudioPlayer {
    /// Open the default output device.
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(VisualizerError::NoOutputDevice)?;

        if let Ok(name) = device.name() {
            info!("Using output device {}", name);
        }

        Ok(Self {
            device,
            stream: None,
            volume: Arc::new(AtomicF32::new(1.0)),
            finished: Arc::new(AtomicBool::new(false)),
            drained: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Start an output stream at `sample_rate` with `tap` attached.
    ///
    /// `tap(samples, frame_count, channel_stride)` is invoked on the audio
    /// thread for every block sent to the device. Returns the producer the
    /// decoder feeds.
    pub fn start<F>(&mut self, sample_rate: u32, tap: F) -> Result<ringbuf::HeapProd<f32>>
    where
        F: FnMut(&[f32], usize, usize) + Send + 'static,
    {
        self.stop();

        let ring = HeapRb::<f32>::new(RING_BUFFER_SIZE);
        let (producer, consumer) = ring.split();

        self.finished.store(false, Ordering::SeqCst);
        self.drained.store(false, Ordering::SeqCst);

        let config = StreamConfig {
            channels: CHANNELS,
            sample_rate: SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let mut state = OutputState {
            consumer,
            tap,
            volume: Arc::clone(&self.volume),
            finished: Arc::clone(&self.finished),
            drained: Arc::clone(&self.drained),
        };

        let stream = self
            .device
            .build_output_stream(
                &config,
                move |output: &mut [f32], _: &cpal::OutputCallbackInfo| state.fill(output),
                |err| warn!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| VisualizerError::Stream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| VisualizerError::Stream(e.to_string()))?;
        self.stream = Some(stream);

        Ok(producer)
    }

    pub fn set_volume(&self, vol: f32) {
        self.volume.store(vol.clamp(0.0, 1.0));
    }

    /// True until the decoder has finished and the device has played
    /// everything it produced.
    pub fn is_playing(&self) -> bool {
        self.stream.is_some() && !self.drained.load(Ordering::Relaxed)
    }

    pub fn finished_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.finished)
    }

    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn state_with(
        samples: &[f32],
        volume: f32,
    ) -> (
        OutputState<impl FnMut(&[f32], usize, usize)>,
        Arc<Mutex<Vec<(Vec<f32>, usize, usize)>>>,
    ) {
        let (mut producer, consumer) = HeapRb::<f32>::new(64).split();
        producer.push_slice(samples);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let state = OutputState {
            consumer,
            tap: move |block: &[f32], frames: usize, stride: usize| {
                sink.lock().unwrap().push((block.to_vec(), frames, stride));
            },
            volume: Arc::new(AtomicF32::new(volume)),
            finished: Arc::new(AtomicBool::new(false)),
            drained: Arc::new(AtomicBool::new(false)),
        };
        (state, seen)
    }

    #[test]
    fn test_atomic_f32_roundtrip() {
        let v = AtomicF32::new(0.25);
        assert_eq!(v.load(), 0.25);
        v.store(0.75);
        assert_eq!(v.load(), 0.75);
    }

    #[test]
    fn test_fill_taps_before_volume() {
        let (mut state, seen) = state_with(&[1.0, -1.0, 0.5, -0.5], 0.5);
        let mut output = [9.0f32; 6];
        state.fill(&mut output);

        assert_eq!(output, [0.5, -0.5, 0.25, -0.25, 0.0, 0.0]);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, vec![1.0, -1.0, 0.5, -0.5, 0.0, 0.0]);
        assert_eq!((seen[0].1, seen[0].2), (3, 2));
    }

    #[test]
    fn test_drained_only_after_finished() {
        let (mut state, _) = state_with(&[], 1.0);
        let drained = Arc::clone(&state.drained);
        let mut output = [0.0f32; 4];

        state.fill(&mut output);
        assert!(!drained.load(Ordering::Relaxed));

        state.finished.store(true, Ordering::Relaxed);
        state.fill(&mut output);
        assert!(drained.load(Ordering::Relaxed));
    }
}
