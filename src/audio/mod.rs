pub mod decoder;
pub mod player;
pub mod sample_buffer;
pub mod spectrum;

pub use decoder::{AudioDecoder, AudioSource};
pub use player::AudioPlayer;
pub use sample_buffer::SampleRingBuffer;
