//! Mel-frequency cepstral coefficients
//!
//! Pipeline per frame:
//! 1. Centered STFT (zero padded by `n_fft / 2`), periodic Hann window
//! 2. Power spectrum `|X|²`
//! 3. Slaney-style mel filter bank with area normalization
//! 4. `10·log10` with an 80 dB dynamic range floor
//! 5. Orthonormal DCT-II, first `n_mfcc` coefficients

use std::f64::consts::PI;
use std::sync::Arc;

use realfft::{RealFftPlanner, RealToComplex};

use super::FeatureError;

/// Analysis parameters
#[derive(Debug, Clone, PartialEq)]
pub struct MfccConfig {
    /// Rate the audio is resampled to before analysis
    pub sample_rate: u32,
    pub n_mfcc: usize,
    pub n_fft: usize,
    pub hop_length: usize,
    pub n_mels: usize,
    pub fmin: f64,
    /// Upper filter bank edge; Nyquist when `None`
    pub fmax: Option<f64>,
    /// Dynamic range kept below the loudest bin; unclipped when `None`
    pub top_db: Option<f64>,
}

impl Default for MfccConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            n_mfcc: 40,
            n_fft: 2048,
            hop_length: 512,
            n_mels: 128,
            fmin: 0.0,
            fmax: None,
            top_db: Some(80.0),
        }
    }
}

const AMIN: f64 = 1e-10;

/// MFCC extractor with precomputed window, filter bank and DCT basis
pub struct MfccExtractor {
    config: MfccConfig,
    window: Vec<f32>,
    /// `[n_mels][n_fft / 2 + 1]`
    mel_filters: Vec<Vec<f32>>,
    /// `[n_mfcc][n_mels]`
    dct_basis: Vec<Vec<f32>>,
    fft: Arc<dyn RealToComplex<f32>>,
}

impl MfccExtractor {
    pub fn new(config: MfccConfig) -> Result<Self, FeatureError> {
        if config.n_fft < 2 || config.hop_length == 0 || config.n_mels == 0 || config.n_mfcc == 0
        {
            return Err(FeatureError::InvalidConfig(format!("{:?}", config)));
        }
        if config.n_mfcc > config.n_mels {
            return Err(FeatureError::InvalidConfig(format!(
                "n_mfcc ({}) exceeds n_mels ({})",
                config.n_mfcc, config.n_mels
            )));
        }

        let fmax = config.fmax.unwrap_or(config.sample_rate as f64 / 2.0);
        let mel_filters = mel_filter_bank(
            config.sample_rate as f64,
            config.n_fft,
            config.n_mels,
            config.fmin,
            fmax,
        );
        let dct_basis = dct_ii_ortho(config.n_mfcc, config.n_mels);
        let window = hann_window(config.n_fft);
        let fft = RealFftPlanner::<f32>::new().plan_fft_forward(config.n_fft);

        Ok(Self {
            config,
            window,
            mel_filters,
            dct_basis,
            fft,
        })
    }

    /// Visit the power spectrum `|X|²` of every centered STFT frame
    ///
    /// Frames read the zero-padded signal in place; only one spectrum is held
    /// at a time. Returns the number of frames visited.
    fn for_each_power_frame(
        &self,
        samples: &[f32],
        mut visit: impl FnMut(&[f32]),
    ) -> Result<usize, FeatureError> {
        let n_fft = self.config.n_fft;
        let hop = self.config.hop_length;
        let pad = n_fft / 2;
        let padded_len = samples.len() + 2 * pad;
        let n_frames = 1 + padded_len.saturating_sub(n_fft) / hop;

        let mut input = self.fft.make_input_vec();
        let mut spectrum = self.fft.make_output_vec();
        let mut power = vec![0.0f32; spectrum.len()];

        for frame_idx in 0..n_frames {
            let start = frame_idx * hop;
            for (i, (dst, &w)) in input.iter_mut().zip(&self.window).enumerate() {
                let x = (start + i)
                    .checked_sub(pad)
                    .and_then(|j| samples.get(j))
                    .copied()
                    .unwrap_or(0.0);
                *dst = x * w;
            }

            self.fft
                .process(&mut input, &mut spectrum)
                .map_err(|e| FeatureError::Fft(e.to_string()))?;

            for (p, c) in power.iter_mut().zip(&spectrum) {
                *p = c.norm_sqr();
            }
            visit(&power);
        }

        Ok(n_frames)
    }

    /// Log-mel energies in dB, flattened `[frames][n_mels]`
    ///
    /// With `top_db` set, every value is floored at `peak - top_db` where the
    /// peak is taken over the whole recording.
    fn log_mel_frames(&self, samples: &[f32]) -> Result<Vec<f32>, FeatureError> {
        let mut log_mel = Vec::new();
        self.for_each_power_frame(samples, |power| {
            log_mel.extend(self.mel_filters.iter().map(|filter| {
                let energy: f64 = filter
                    .iter()
                    .zip(power)
                    .map(|(&w, &p)| w as f64 * p as f64)
                    .sum();
                (10.0 * energy.max(AMIN).log10()) as f32
            }));
        })?;

        if let Some(top_db) = self.config.top_db {
            let peak = log_mel.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let floor = peak - top_db as f32;
            for value in &mut log_mel {
                *value = value.max(floor);
            }
        }

        Ok(log_mel)
    }

    /// Coefficients averaged over all frames, length `n_mfcc`
    pub fn mean_coefficients(&self, samples: &[f32]) -> Result<Vec<f32>, FeatureError> {
        let n_mels = self.config.n_mels;
        let log_mel = self.log_mel_frames(samples)?;
        let n_frames = (log_mel.len() / n_mels).max(1) as f64;

        // DCT is linear: the mean of per-frame coefficients is the DCT of the mean bands
        let mut band_means = vec![0.0f64; n_mels];
        for frame in log_mel.chunks_exact(n_mels) {
            for (sum, &value) in band_means.iter_mut().zip(frame) {
                *sum += value as f64;
            }
        }
        for mean in &mut band_means {
            *mean /= n_frames;
        }

        Ok(self
            .dct_basis
            .iter()
            .map(|basis| {
                basis
                    .iter()
                    .zip(&band_means)
                    .map(|(&b, &m)| b as f64 * m)
                    .sum::<f64>() as f32
            })
            .collect())
    }

    #[cfg(test)]
    fn frame_count(&self, n_samples: usize) -> usize {
        1 + n_samples / self.config.hop_length
    }

    /// Per-frame coefficients, `[frames][n_mfcc]`
    #[cfg(test)]
    fn compute(&self, samples: &[f32]) -> Result<Vec<Vec<f32>>, FeatureError> {
        let log_mel = self.log_mel_frames(samples)?;
        Ok(log_mel
            .chunks_exact(self.config.n_mels)
            .map(|frame| {
                self.dct_basis
                    .iter()
                    .map(|basis| basis.iter().zip(frame).map(|(b, x)| b * x).sum::<f32>())
                    .collect()
            })
            .collect())
    }
}

/// Periodic Hann window
fn hann_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| (0.5 - 0.5 * (2.0 * PI * i as f64 / n as f64).cos()) as f32)
        .collect()
}

// Slaney mel scale: linear below 1 kHz, logarithmic above
const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

fn log_step() -> f64 {
    6.4f64.ln() / 27.0
}

pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        F_SP * mel
    }
}

/// Triangular mel filters with Slaney area normalization
fn mel_filter_bank(sr: f64, n_fft: usize, n_mels: usize, fmin: f64, fmax: f64) -> Vec<Vec<f32>> {
    let n_freq = n_fft / 2 + 1;
    let fft_freqs: Vec<f64> = (0..n_freq).map(|k| k as f64 * sr / n_fft as f64).collect();

    let mel_min = hz_to_mel(fmin);
    let mel_max = hz_to_mel(fmax);
    let mel_points: Vec<f64> = (0..n_mels + 2)
        .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f64 / (n_mels + 1) as f64))
        .collect();

    (0..n_mels)
        .map(|m| {
            let (lo, center, hi) = (mel_points[m], mel_points[m + 1], mel_points[m + 2]);
            let enorm = 2.0 / (hi - lo);
            fft_freqs
                .iter()
                .map(|&f| {
                    let lower = (f - lo) / (center - lo);
                    let upper = (hi - f) / (hi - center);
                    (lower.min(upper).max(0.0) * enorm) as f32
                })
                .collect()
        })
        .collect()
}

/// First `n_out` rows of the orthonormal DCT-II matrix of size `n_in`
fn dct_ii_ortho(n_out: usize, n_in: usize) -> Vec<Vec<f32>> {
    let n = n_in as f64;
    (0..n_out)
        .map(|k| {
            let norm = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
            (0..n_in)
                .map(|i| (norm * (PI * k as f64 * (2 * i + 1) as f64 / (2.0 * n)).cos()) as f32)
                .collect()
        })
        .collect()
}
