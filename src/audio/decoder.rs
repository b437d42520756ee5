//! Audio file decoding using symphonia.
//!
//! [`AudioSource::open`] probes the file up front so that a missing or
//! undecodable file fails at startup. [`AudioDecoder`] then streams packets
//! on a background thread into the playback ring buffer.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use ringbuf::traits::*;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, info, warn};

use crate::error::{Result, VisualizerError};

/// Sample rate assumed when the container does not report one.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// An opened, decodable audio track.
pub struct AudioSource {
    path: PathBuf,
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
    sample_buf: Option<SampleBuffer<f32>>,
}

impl AudioSource {
    /// Open and probe `path`, selecting its first audio track.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| VisualizerError::load(path, e))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| VisualizerError::load(path, e))?;

        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| VisualizerError::load(path, "no audio track found"))?;

        let track_id = track.id;
        let sample_rate = track.codec_params.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE);

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| VisualizerError::load(path, e))?;

        info!("Opened {:?} ({} Hz)", path, sample_rate);

        Ok(Self {
            path: path.to_path_buf(),
            format,
            decoder,
            track_id,
            sample_rate,
            sample_buf: None,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Decode the next packet of the track into `out` as interleaved stereo.
    ///
    /// Mono is duplicated to both channels; anything wider keeps the first
    /// two. Returns `Ok(false)` at end of stream. Corrupt packets are
    /// skipped.
    pub fn decode_next(&mut self, out: &mut Vec<f32>) -> Result<bool> {
        out.clear();

        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(false);
                }
                Err(SymphoniaError::ResetRequired) => return Ok(false),
                Err(e) => return Err(VisualizerError::load(&self.path, e)),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Skipping corrupt packet: {}", e);
                    continue;
                }
                Err(e) => return Err(VisualizerError::load(&self.path, e)),
            };

            let channels = decoded.spec().channels.count().max(1);
            let sample_buf = self.sample_buf.get_or_insert_with(|| {
                SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec())
            });
            sample_buf.copy_interleaved_ref(decoded);

            out.reserve(sample_buf.samples().len() / channels * 2);
            for frame in sample_buf.samples().chunks(channels) {
                if channels == 1 {
                    out.push(frame[0]);
                    out.push(frame[0]);
                } else {
                    out.push(frame[0]);
                    out.push(frame[1]);
                }
            }
            return Ok(true);
        }
    }
}

/// Background decode thread feeding the playback ring buffer.
pub struct AudioDecoder {
    /// Flag to signal the decoder to stop
    should_stop: Arc<AtomicBool>,
    /// Decoder thread handle
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl AudioDecoder {
    pub fn new() -> Self {
        Self {
            should_stop: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }

    /// Start streaming `source` into `producer`.
    ///
    /// `finished` is raised once the stream ends, whether normally or on a
    /// fatal decode error.
    pub fn start(
        &mut self,
        mut source: AudioSource,
        mut producer: ringbuf::HeapProd<f32>,
        finished: Arc<AtomicBool>,
    ) {
        self.stop();

        let should_stop = Arc::new(AtomicBool::new(false));
        self.should_stop = Arc::clone(&should_stop);

        let handle = thread::spawn(move || {
            if let Err(e) = stream_source(&mut source, &mut producer, &should_stop) {
                warn!("Decoder error: {}", e);
            }
            finished.store(true, Ordering::SeqCst);
        });

        self.thread_handle = Some(handle);
    }

    /// Reap the decode thread once it has exited. Returns whether it is
    /// still running.
    pub fn update(&mut self) -> bool {
        let finished = match &self.thread_handle {
            Some(handle) => handle.is_finished(),
            None => return false,
        };
        if !finished {
            return true;
        }

        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
        debug!("Decoder finished");
        false
    }

    /// Stop the current decode operation.
    pub fn stop(&mut self) {
        self.should_stop.store(true, Ordering::SeqCst);

        if let Some(handle) = self.thread_handle.take() {
            // Give the thread a moment to notice; detach it otherwise
            let start = std::time::Instant::now();
            while !handle.is_finished() {
                if start.elapsed() > Duration::from_millis(500) {
                    break;
                }
                thread::sleep(Duration::from_millis(10));
            }
            if handle.is_finished() {
                let _ = handle.join();
            }
        }
    }

    /// Check if the decode thread is alive (used in tests)
    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

impl Default for AudioDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AudioDecoder {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Decode packets and push them with backpressure until the stream ends.
fn stream_source(
    source: &mut AudioSource,
    producer: &mut ringbuf::HeapProd<f32>,
    should_stop: &AtomicBool,
) -> Result<()> {
    let mut samples = Vec::new();

    while !should_stop.load(Ordering::Relaxed) {
        if !source.decode_next(&mut samples)? {
            break;
        }

        let mut offset = 0;
        while offset < samples.len() {
            if should_stop.load(Ordering::Relaxed) {
                return Ok(());
            }

            let written = producer.push_slice(&samples[offset..]);
            offset += written;

            if written == 0 {
                // Playback ring full, let the output callback catch up
                thread::sleep(Duration::from_millis(5));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringbuf::HeapRb;
    use std::time::Instant;

    fn write_wav(path: &Path, channels: u16, frames: usize) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..frames {
            for ch in 0..channels {
                let value = if ch == 0 { (i % 100) as i16 * 100 } else { -1000 };
                writer.write_sample(value).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    fn decode_all(source: &mut AudioSource) -> Vec<f32> {
        let mut all = Vec::new();
        let mut chunk = Vec::new();
        while source.decode_next(&mut chunk).unwrap() {
            all.extend_from_slice(&chunk);
        }
        all
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let err = AudioSource::open(Path::new("/nonexistent/track.mp3"))
            .err()
            .unwrap();
        assert!(matches!(err, VisualizerError::Load { .. }));
        assert!(err.is_startup());
    }

    #[test]
    fn test_garbage_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.bin");
        std::fs::write(&path, vec![0x5a; 4096]).unwrap();
        assert!(matches!(
            AudioSource::open(&path),
            Err(VisualizerError::Load { .. })
        ));
    }

    #[test]
    fn test_mono_wav_is_duplicated_to_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_wav(&path, 1, 1000);

        let mut source = AudioSource::open(&path).unwrap();
        assert_eq!(source.sample_rate(), 22050);

        let samples = decode_all(&mut source);
        assert_eq!(samples.len(), 2000);
        for frame in samples.chunks(2) {
            assert_eq!(frame[0], frame[1]);
        }
    }

    #[test]
    fn test_stereo_wav_keeps_channel_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 2, 500);

        let mut source = AudioSource::open(&path).unwrap();
        let samples = decode_all(&mut source);
        assert_eq!(samples.len(), 1000);
        assert!(samples.chunks(2).all(|f| f[1] < 0.0));
    }

    #[test]
    fn test_decoder_thread_streams_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_wav(&path, 1, 3000);

        let source = AudioSource::open(&path).unwrap();
        let (producer, consumer) = HeapRb::<f32>::new(8192).split();
        let finished = Arc::new(AtomicBool::new(false));

        let mut decoder = AudioDecoder::new();
        decoder.start(source, producer, Arc::clone(&finished));

        let start = Instant::now();
        while decoder.update() && start.elapsed() < Duration::from_secs(5) {
            thread::sleep(Duration::from_millis(5));
        }

        assert!(finished.load(Ordering::SeqCst));
        assert!(!decoder.is_running());
        assert_eq!(consumer.occupied_len(), 6000);
    }
}
