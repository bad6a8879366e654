//! Shared signal-processing helpers for the feature extractors
//!
//! **Purpose:** framing, basic statistics, FFT power spectra and the
//! autocorrelation pitch estimator. All functions are pure.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;

/// Iterate over full frames of `size` samples advancing by `hop`
///
/// A trailing partial frame is dropped.
pub fn frames(samples: &[f32], size: usize, hop: usize) -> impl Iterator<Item = &[f32]> {
    let count = if size == 0 || hop == 0 || samples.len() < size {
        0
    } else {
        (samples.len() - size) / hop + 1
    };
    (0..count).map(move |i| &samples[i * hop..i * hop + size])
}

/// Convert a duration to a whole number of samples (at least 1)
pub fn seconds_to_samples(seconds: f64, sample_rate: u32) -> usize {
    ((seconds * sample_rate as f64).round() as usize).max(1)
}

/// Periodic Hann window
pub fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| (0.5 - 0.5 * (2.0 * PI * i as f64 / size as f64).cos()) as f32)
        .collect()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Coefficient of variation (std / mean)
///
/// `None` for empty input or a mean too close to zero to divide by.
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    let m = mean(values);
    if values.is_empty() || m.abs() < 1e-12 {
        return None;
    }
    let cv = std_dev(values) / m.abs();
    cv.is_finite().then_some(cv)
}

/// Median of finite values (`None` when there are none)
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    })
}

/// Root-mean-square amplitude
pub fn rms(frame: &[f32]) -> f64 {
    if frame.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = frame.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_squares / frame.len() as f64).sqrt()
}

/// Fraction of adjacent sample pairs that change sign
pub fn zero_crossing_rate(frame: &[f32]) -> f64 {
    if frame.len() < 2 {
        return 0.0;
    }
    let crossings = frame
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();
    crossings as f64 / (frame.len() - 1) as f64
}

/// Linear ramp between two reference points
///
/// Returns 1.0 at `one_at`, 0.0 at `zero_at`, interpolating in between and
/// clamping outside. Works for either ordering of the two points.
pub fn ramp(value: f64, one_at: f64, zero_at: f64) -> f64 {
    if (one_at - zero_at).abs() < f64::EPSILON {
        return if value <= one_at { 1.0 } else { 0.0 };
    }
    ((value - zero_at) / (one_at - zero_at)).clamp(0.0, 1.0)
}

/// Windowed FFT power spectrum of fixed-size frames
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    size: usize,
}

impl SpectrumAnalyzer {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        Self {
            fft: planner.plan_fft_forward(size),
            window: hann_window(size),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of non-negative frequency bins (size / 2 + 1)
    pub fn bins(&self) -> usize {
        self.size / 2 + 1
    }

    /// Hann-windowed power spectrum, bins 0..=size/2
    ///
    /// Frames shorter than the analyzer size are zero-padded.
    pub fn power_spectrum(&self, frame: &[f32]) -> Vec<f64> {
        let mut buffer: Vec<Complex<f32>> = (0..self.size)
            .map(|i| {
                let s = frame.get(i).copied().unwrap_or(0.0);
                Complex::new(s * self.window[i], 0.0)
            })
            .collect();

        self.fft.process(&mut buffer);

        buffer[..self.bins()]
            .iter()
            .map(|c| c.norm_sqr() as f64)
            .collect()
    }
}

/// Normalized autocorrelation of `frame` at `lag`
///
/// Correlates `frame[..n-lag]` with `frame[lag..]`, normalized by the energy
/// of both segments, so a perfectly periodic signal scores 1.0 at its period.
pub fn normalized_autocorrelation(frame: &[f32], lag: usize) -> f64 {
    if lag == 0 || lag >= frame.len() {
        return 0.0;
    }
    let (mut cross, mut energy_a, mut energy_b) = (0.0f64, 0.0f64, 0.0f64);
    for (a, b) in frame[..frame.len() - lag].iter().zip(&frame[lag..]) {
        let (a, b) = (*a as f64, *b as f64);
        cross += a * b;
        energy_a += a * a;
        energy_b += b * b;
    }
    let denom = (energy_a * energy_b).sqrt();
    if denom <= f64::MIN_POSITIVE {
        0.0
    } else {
        cross / denom
    }
}

/// One voiced pitch measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate {
    pub f0_hz: f64,
    /// Normalized autocorrelation at the chosen period, in [-1, 1]
    pub periodicity: f64,
}

/// Parameters for [`estimate_pitch`]
#[derive(Debug, Clone, Copy)]
pub struct PitchSearch {
    pub sample_rate: u32,
    pub min_f0_hz: f64,
    pub max_f0_hz: f64,
    /// Minimum peak autocorrelation for the frame to count as voiced
    pub voicing_threshold: f64,
}

/// Frames quieter than this RMS are never voiced
const VOICING_RMS_FLOOR: f64 = 1e-4;

/// Autocorrelation pitch estimator
///
/// **Algorithm:**
/// 1. Normalized autocorrelation over lags covering [min_f0, max_f0]
/// 2. Unvoiced if the global maximum is below the voicing threshold
/// 3. Pick the FIRST local peak reaching 85% of the global maximum, which
///    avoids locking onto period multiples (octave errors)
/// 4. Refine the lag with parabolic interpolation
pub fn estimate_pitch(frame: &[f32], search: &PitchSearch) -> Option<PitchEstimate> {
    if rms(frame) < VOICING_RMS_FLOOR || search.max_f0_hz <= search.min_f0_hz {
        return None;
    }

    let sr = search.sample_rate as f64;
    let min_lag = ((sr / search.max_f0_hz).floor() as usize).max(2);
    let max_lag = ((sr / search.min_f0_hz).ceil() as usize).min(frame.len().saturating_sub(2));
    if max_lag <= min_lag {
        return None;
    }

    // r[i] holds the correlation at lag (min_lag - 1 + i)
    let first_lag = min_lag - 1;
    let r: Vec<f64> = (first_lag..=max_lag + 1)
        .map(|lag| normalized_autocorrelation(frame, lag))
        .collect();

    let search_range = 1..r.len() - 1;
    let global_max = r[search_range.clone()]
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    if !global_max.is_finite() || global_max < search.voicing_threshold {
        return None;
    }

    let peak = search_range
        .into_iter()
        .find(|&i| r[i] >= r[i - 1] && r[i] >= r[i + 1] && r[i] >= 0.85 * global_max)?;

    let (left, centre, right) = (r[peak - 1], r[peak], r[peak + 1]);
    let curvature = left - 2.0 * centre + right;
    let offset = if curvature.abs() > 1e-12 {
        (0.5 * (left - right) / curvature).clamp(-0.5, 0.5)
    } else {
        0.0
    };

    let lag = (first_lag + peak) as f64 + offset;
    Some(PitchEstimate {
        f0_hz: sr / lag,
        periodicity: centre,
    })
}
