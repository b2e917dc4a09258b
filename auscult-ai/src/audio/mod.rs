//! Audio input: decoding and sample rate conversion

pub mod decoder;
pub mod resampler;

pub use decoder::{decode_audio_file, DecodedAudio};
pub use resampler::resample_mono;
