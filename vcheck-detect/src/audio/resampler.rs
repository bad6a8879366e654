//! Audio resampling using rubato
//!
//! Converts decoded mono audio to the analysis sample rate.
//!
//! Downsampling goes through a windowed-sinc resampler so content above the
//! new Nyquist frequency is filtered out rather than aliased into the
//! analysis band. Upsampling uses the cheaper polynomial resampler.

use rubato::{
    FastFixedIn, PolynomialDegree, Resampler, SincFixedIn, SincInterpolationParameters,
    SincInterpolationType, WindowFunction,
};
use tracing::debug;

use crate::error::{DetectError, DetectResult};

/// Resample mono audio from `input_rate` to `output_rate`
///
/// Returns a copy when the rates already match. The sinc path delays the
/// signal by half the filter length (a few milliseconds); the analysis is
/// insensitive to that offset.
pub fn resample_mono(input: &[f32], input_rate: u32, output_rate: u32) -> DetectResult<Vec<f32>> {
    if input_rate == output_rate {
        debug!("Sample rate already at {}Hz, skipping resample", output_rate);
        return Ok(input.to_vec());
    }
    if input_rate == 0 || output_rate == 0 {
        return Err(DetectError::Decode(format!(
            "invalid sample rate conversion {}Hz -> {}Hz",
            input_rate, output_rate
        )));
    }
    if input.is_empty() {
        return Ok(Vec::new());
    }

    let ratio = output_rate as f64 / input_rate as f64;
    let chunk_size = input.len();
    let planar_input = [input];

    let planar_output = if ratio < 1.0 {
        let params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };
        let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, chunk_size, 1)
            .map_err(|e| DetectError::Decode(format!("Failed to create resampler: {}", e)))?;
        resampler
            .process(&planar_input, None)
            .map_err(|e| DetectError::Decode(format!("Resampling failed: {}", e)))?
    } else {
        let mut resampler =
            FastFixedIn::<f32>::new(ratio, 1.0, PolynomialDegree::Septic, chunk_size, 1)
                .map_err(|e| DetectError::Decode(format!("Failed to create resampler: {}", e)))?;
        resampler
            .process(&planar_input, None)
            .map_err(|e| DetectError::Decode(format!("Resampling failed: {}", e)))?
    };

    let output = planar_output.into_iter().next().unwrap_or_default();

    debug!(
        input_rate = input_rate,
        output_rate = output_rate,
        input_frames = input.len(),
        output_frames = output.len(),
        "Resampled audio"
    );

    Ok(output)
}
