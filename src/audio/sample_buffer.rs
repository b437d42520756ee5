//! Circular store of downmixed samples shared between the audio callback
//! and the render loop.
//!
//! The audio thread writes through [`SampleRingBuffer::write`], the render
//! thread copies the whole store out with [`SampleRingBuffer::snapshot_into`].
//! Both take the same short-lived lock around the copy only.

use parking_lot::Mutex;

use crate::error::{Result, VisualizerError};

#[derive(Debug)]
struct Inner {
    samples: Vec<f32>,
    cursor: usize,
}

/// Fixed-capacity ring of channel-0 samples.
///
/// # Thread Safety
/// - One writer (the audio output callback)
/// - One reader (the render loop, via snapshot copies)
/// - Storage and cursor live behind a single `parking_lot::Mutex`
#[derive(Debug)]
pub struct SampleRingBuffer {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl SampleRingBuffer {
    /// Create a zero-filled buffer holding `capacity` samples.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(VisualizerError::InvalidConfig(
                "ring buffer capacity must be greater than 0".into(),
            ));
        }

        Ok(Self {
            inner: Mutex::new(Inner {
                samples: vec![0.0; capacity],
                cursor: 0,
            }),
            capacity,
        })
    }

    /// Capacity of the buffer (used in tests)
    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append channel 0 of each of `frame_count` interleaved frames.
    ///
    /// Called from the real-time audio thread: no allocation, and the lock
    /// is held only for the copy. Frames missing from a short `source` are
    /// skipped rather than read out of bounds.
    pub fn write(&self, source: &[f32], frame_count: usize, channel_stride: usize) {
        let stride = channel_stride.max(1);
        let frames = frame_count.min(source.len().div_ceil(stride));

        let mut inner = self.inner.lock();
        let mut cursor = inner.cursor;
        for frame in source.chunks(stride).take(frames) {
            inner.samples[cursor] = frame[0];
            cursor = (cursor + 1) % self.capacity;
        }
        inner.cursor = cursor;
    }

    /// Copy the store verbatim, in storage order, into `dest`.
    ///
    /// Copies `min(dest.len(), capacity)` samples starting at slot 0.
    pub fn snapshot_into(&self, dest: &mut [f32]) {
        let inner = self.inner.lock();
        let n = dest.len().min(self.capacity);
        dest[..n].copy_from_slice(&inner.samples[..n]);
    }

    /// Owned copy of the store, in storage order (used in tests)
    #[cfg(test)]
    pub fn snapshot(&self) -> Vec<f32> {
        let mut out = vec![0.0; self.capacity];
        self.snapshot_into(&mut out);
        out
    }

    /// Current write slot (used in tests)
    #[cfg(test)]
    pub fn cursor(&self) -> usize {
        self.inner.lock().cursor
    }
}
