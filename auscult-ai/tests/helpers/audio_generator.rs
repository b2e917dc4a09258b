//! Audio Test Fixture Generator
//!
//! Utilities for generating test recordings with hound

use std::path::{Path, PathBuf};

/// Configuration for generated audio
#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    /// Tone frequency in Hz
    pub frequency: f32,
    /// Peak amplitude (0.0 - 1.0)
    pub amplitude: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 2.0,
            sample_rate: 44100,
            channels: 2,
            frequency: 120.0,
            amplitude: 0.3,
        }
    }
}

/// Generate a 16-bit PCM WAV tone with the given configuration
///
/// Every channel carries the same signal.
pub fn generate_test_wav(path: &Path, config: &AudioConfig) -> anyhow::Result<PathBuf> {
    let spec = hound::WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    let total_frames = (config.duration_seconds * config.sample_rate as f64) as usize;

    for i in 0..total_frames {
        let t = i as f32 / config.sample_rate as f32;
        let sample = (config.amplitude
            * (2.0 * std::f32::consts::PI * config.frequency * t).sin()
            * i16::MAX as f32) as i16;

        for _ in 0..config.channels {
            writer.write_sample(sample)?;
        }
    }

    writer.finalize()?;
    Ok(path.to_path_buf())
}

/// Write bytes that no decoder will recognise as audio
pub fn write_corrupt_file(path: &Path) -> anyhow::Result<PathBuf> {
    std::fs::write(path, b"this is definitely not an audio stream\x00\x01\x02")?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generate_simple_wav() {
        let temp_dir = TempDir::new().unwrap();
        let wav_path = temp_dir.path().join("test.wav");

        let result = generate_test_wav(&wav_path, &AudioConfig::default());

        assert!(result.is_ok());
        let reader = hound::WavReader::open(&wav_path).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.duration(), 88200);
    }
}
