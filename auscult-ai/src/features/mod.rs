//! Acoustic feature extraction
//!
//! Turns an audio file into the fixed-length vector the classifiers were
//! trained on: decode → mono → resample to 22.05 kHz → MFCC → mean over
//! time.

pub mod mfcc;

pub use mfcc::{MfccConfig, MfccExtractor};

use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::audio::{decode_audio_file, resample_mono};

/// Length of the feature vector the models expect
pub const N_FEATURES: usize = 40;

/// Feature extraction errors
#[derive(Debug, Error)]
pub enum FeatureError {
    /// Unreadable, unsupported or corrupt audio
    #[error("Audio decoding failed: {0:#}")]
    Audio(#[from] anyhow::Error),

    #[error("Audio contains no samples")]
    EmptyAudio,

    #[error("FFT failed: {0}")]
    Fft(String),

    #[error("Invalid MFCC configuration: {0}")]
    InvalidConfig(String),

    #[error("Sample {index} is not finite")]
    NonFiniteSample { index: usize },

    #[error("Coefficient {index} is not finite")]
    NonFinite { index: usize },
}

/// Time-averaged cepstral coefficients for one recording
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// Extract the feature vector from an audio file
pub fn extract_features(path: &Path, config: &MfccConfig) -> Result<FeatureVector, FeatureError> {
    let decoded = decode_audio_file(path)?;
    if decoded.samples.is_empty() {
        return Err(FeatureError::EmptyAudio);
    }
    debug!(
        path = %path.display(),
        duration_seconds = format!("{:.2}", decoded.duration_seconds()),
        "Extracting features"
    );

    let samples = resample_mono(&decoded.samples, decoded.sample_rate, config.sample_rate)?;
    extract_from_samples(&samples, config)
}

/// Extract the feature vector from mono samples already at `config.sample_rate`
pub fn extract_from_samples(
    samples: &[f32],
    config: &MfccConfig,
) -> Result<FeatureVector, FeatureError> {
    if samples.is_empty() {
        return Err(FeatureError::EmptyAudio);
    }
    if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
        return Err(FeatureError::NonFiniteSample { index });
    }

    let extractor = MfccExtractor::new(config.clone())?;
    let coefficients = extractor.mean_coefficients(samples)?;

    if let Some(index) = coefficients.iter().position(|c| !c.is_finite()) {
        return Err(FeatureError::NonFinite { index });
    }

    Ok(FeatureVector(coefficients))
}
