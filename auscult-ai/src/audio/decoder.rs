//! Audio decoding
//!
//! Decodes an uploaded recording to mono f32 PCM using symphonia
//! (WAV, FLAC, MP3, OGG/Vorbis, AAC, ...). Multi-channel audio is averaged
//! down to one channel.

use anyhow::{Context, Result};
use std::path::Path;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::FromSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;

/// Decoded audio result
#[derive(Debug)]
pub struct DecodedAudio {
    /// Mono audio samples (f32, range [-1.0, 1.0])
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Original channel count
    pub channels: usize,
}

impl DecodedAudio {
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode an audio file to mono f32 PCM samples
///
/// # Errors
/// * File I/O errors
/// * Unsupported or unrecognized format
/// * Corrupt audio data
pub fn decode_audio_file(file_path: &Path) -> Result<DecodedAudio> {
    tracing::debug!(path = %file_path.display(), "Decoding audio file");

    let file = std::fs::File::open(file_path)
        .with_context(|| format!("Failed to open audio file: {}", file_path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Upload names keep their extension, which speeds up probing
    let mut hint = Hint::new();
    if let Some(extension) = file_path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let detected = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .with_context(|| format!("Failed to detect audio format: {}", file_path.display()))?;

    let mut format = detected.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio track found in file")?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .context("Sample rate unknown")?;
    let channel_count = track
        .codec_params
        .channels
        .map(|c| c.count())
        .unwrap_or(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .with_context(|| format!("Failed to create decoder for: {}", file_path.display()))?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                return Err(anyhow::anyhow!("Error reading packet: {}", e));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder
            .decode(&packet)
            .with_context(|| format!("Failed to decode packet in: {}", file_path.display()))?;

        append_mono(&decoded, &mut samples);
    }

    tracing::debug!(
        path = %file_path.display(),
        sample_rate,
        channels = channel_count,
        total_samples = samples.len(),
        "Audio decoding complete"
    );

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels: channel_count,
    })
}

/// Average all channels of a decoded buffer into `out`
fn append_mono(decoded: &AudioBufferRef, out: &mut Vec<f32>) {
    match decoded {
        AudioBufferRef::U8(buf) => mix_down(buf, out),
        AudioBufferRef::U16(buf) => mix_down(buf, out),
        AudioBufferRef::U24(buf) => mix_down(buf, out),
        AudioBufferRef::U32(buf) => mix_down(buf, out),
        AudioBufferRef::S8(buf) => mix_down(buf, out),
        AudioBufferRef::S16(buf) => mix_down(buf, out),
        AudioBufferRef::S24(buf) => mix_down(buf, out),
        AudioBufferRef::S32(buf) => mix_down(buf, out),
        AudioBufferRef::F32(buf) => mix_down(buf, out),
        AudioBufferRef::F64(buf) => mix_down(buf, out),
    }
}

fn mix_down<S>(buf: &AudioBuffer<S>, out: &mut Vec<f32>)
where
    S: Sample,
    f32: FromSample<S>,
{
    let num_channels = buf.spec().channels.count();
    let num_frames = buf.frames();
    if num_channels == 0 {
        return;
    }

    out.reserve(num_frames);
    for frame_idx in 0..num_frames {
        let mut sum = 0.0f32;
        for ch in 0..num_channels {
            sum += f32::from_sample(buf.chan(ch)[frame_idx]);
        }
        out.push(sum / num_channels as f32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_audio_file_not_found() {
        let result = decode_audio_file(Path::new("/nonexistent/file.wav"));
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to open audio file"));
    }

    #[test]
    fn test_decode_rejects_non_audio() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.wav");
        std::fs::write(&path, b"this is definitely not a RIFF file").unwrap();

        assert!(decode_audio_file(&path).is_err());
    }
}
