//! Mono resampling using rubato
//!
//! Feature extraction runs at a fixed analysis rate, so every decoded
//! recording is converted to that rate first. A band-limited sinc resampler
//! is used so content above the target Nyquist is filtered out instead of
//! folding back into the analysed band.

use anyhow::{anyhow, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

/// Input frames fed to the resampler per call
const CHUNK_FRAMES: usize = 1024;

/// Anti-alias cutoff relative to the lower Nyquist frequency
const CUTOFF: f32 = 0.85;

fn sinc_parameters() -> SincInterpolationParameters {
    SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: CUTOFF,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    }
}

/// Resample mono audio from `input_rate` to `output_rate`
///
/// Output is aligned with the input (filter delay removed) and has
/// `ceil(len * output_rate / input_rate)` samples. Returns a copy when the
/// rates already match.
pub fn resample_mono(input: &[f32], input_rate: u32, output_rate: u32) -> Result<Vec<f32>> {
    if input_rate == output_rate {
        debug!("Sample rate already at {}Hz, skipping resample", output_rate);
        return Ok(input.to_vec());
    }
    if input_rate == 0 || output_rate == 0 {
        return Err(anyhow!(
            "Invalid sample rate conversion {}Hz -> {}Hz",
            input_rate,
            output_rate
        ));
    }
    if input.is_empty() {
        return Ok(Vec::new());
    }

    debug!("Resampling from {}Hz to {}Hz", input_rate, output_rate);

    let ratio = output_rate as f64 / input_rate as f64;
    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, sinc_parameters(), CHUNK_FRAMES, 1)
        .map_err(|e| anyhow!("Failed to create resampler: {}", e))?;

    let delay = resampler.output_delay();
    let expected_len = (input.len() as f64 * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(expected_len + delay + CHUNK_FRAMES);

    let mut position = 0;
    while input.len() - position >= resampler.input_frames_next() {
        let frames = resampler.input_frames_next();
        let chunk = resampler
            .process(&[&input[position..position + frames]][..], None)
            .map_err(|e| anyhow!("Resampling failed: {}", e))?;
        output.extend_from_slice(&chunk[0]);
        position += frames;
    }

    if position < input.len() {
        let chunk = resampler
            .process_partial(Some(&[&input[position..]][..]), None)
            .map_err(|e| anyhow!("Resampling failed: {}", e))?;
        output.extend_from_slice(&chunk[0]);
    }

    // Flush the filter tail until the delayed signal is complete
    while output.len() < delay + expected_len {
        let chunk = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(|e| anyhow!("Resampling failed: {}", e))?;
        if chunk[0].is_empty() {
            break;
        }
        output.extend_from_slice(&chunk[0]);
    }

    output.drain(..delay.min(output.len()));
    output.truncate(expected_len);

    debug!(
        "Resampled {} input frames to {} output frames",
        input.len(),
        output.len()
    );

    Ok(output)
}
