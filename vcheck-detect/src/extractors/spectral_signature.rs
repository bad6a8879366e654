//! Spectral Signature Extractor
//!
//! **Purpose:** Detect vocoder-like spectral envelopes: too smooth or too
//! peaky, band-limited, and static over time.
//!
//! **Algorithm:**
//! 1. Hann-windowed power spectra over short frames; frames more than
//!    `gate_db` below the loudest frame are ignored (pauses)
//! 2. Per frame: spectral flatness (geometric / arithmetic mean), rolloff
//!    frequency (`rolloff_fraction` of energy) and centroid
//! 3. Deviation of the median flatness and median rolloff from the expected
//!    human ranges, plus lack of centroid movement (low centroid CV)
//! 4. Weighted average of the three deviations
//!
//! The rolloff range scales with the language profile's spectral multiplier.

use tracing::debug;

use crate::audio::dsp::{coefficient_of_variation, frames, median, ramp, SpectrumAnalyzer};
use crate::config::SpectralConfig;
use crate::error::{DetectError, DetectResult};
use crate::extractors::{ensure_finite, FeatureExtractor};
use crate::types::{AudioSample, FeatureScore, Indicator, LanguageProfile};

/// Per-frame spectral summary
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSpectrum {
    pub energy: f64,
    pub flatness: f64,
    pub rolloff_hz: f64,
    pub centroid_hz: f64,
}

pub struct SpectralSignatureExtractor {
    config: SpectralConfig,
}

impl SpectralSignatureExtractor {
    pub fn new(config: SpectralConfig) -> Self {
        Self { config }
    }

    /// Summaries of the frames that pass the loudness gate
    pub fn frame_spectra(&self, audio: &AudioSample) -> Vec<FrameSpectrum> {
        let analyzer = SpectrumAnalyzer::new(self.config.frame_size);
        let bin_hz = audio.sample_rate() as f64 / self.config.frame_size as f64;

        let all: Vec<FrameSpectrum> = frames(audio.samples(), self.config.frame_size, self.config.hop_size)
            .filter_map(|frame| summarize(&analyzer.power_spectrum(frame), bin_hz, self.config.rolloff_fraction))
            .collect();

        let loudest = all.iter().map(|f| f.energy).fold(0.0f64, f64::max);
        let gate = loudest * 10f64.powf(self.config.gate_db / 10.0);

        all.into_iter().filter(|f| f.energy >= gate).collect()
    }

    fn flatness_deviation(&self, flatness: f64) -> f64 {
        let c = &self.config;
        if flatness < c.flatness_min {
            let decades = (c.flatness_min / flatness.max(f64::MIN_POSITIVE)).log10();
            (decades / c.flatness_low_decades).min(1.0)
        } else if flatness > c.flatness_max {
            ((flatness - c.flatness_max) / c.flatness_high_width).min(1.0)
        } else {
            0.0
        }
    }

    fn rolloff_deviation(&self, rolloff_hz: f64, profile: &LanguageProfile) -> f64 {
        let c = &self.config;
        let low = c.rolloff_min_hz * profile.spectral;
        let high = c.rolloff_max_hz * profile.spectral;
        if rolloff_hz < low {
            ((low - rolloff_hz) / c.rolloff_low_width_hz).min(1.0)
        } else if rolloff_hz > high {
            ((rolloff_hz - high) / c.rolloff_high_width_hz).min(1.0)
        } else {
            0.0
        }
    }
}

/// Flatness, rolloff and centroid of one power spectrum
///
/// Returns `None` for an all-zero frame. DC is excluded.
fn summarize(power: &[f64], bin_hz: f64, rolloff_fraction: f64) -> Option<FrameSpectrum> {
    let bins = power.get(1..)?;
    let energy: f64 = bins.iter().sum();
    if bins.is_empty() || energy <= 0.0 {
        return None;
    }

    const FLOOR: f64 = 1e-12;
    let log_mean = bins.iter().map(|p| (p + FLOOR).ln()).sum::<f64>() / bins.len() as f64;
    let arith_mean = energy / bins.len() as f64 + FLOOR;
    let flatness = (log_mean.exp() / arith_mean).clamp(0.0, 1.0);

    let target = energy * rolloff_fraction;
    let mut cumulative = 0.0;
    let mut rolloff_bin = bins.len();
    for (i, p) in bins.iter().enumerate() {
        cumulative += p;
        if cumulative >= target {
            rolloff_bin = i + 1;
            break;
        }
    }

    let centroid_bin = bins
        .iter()
        .enumerate()
        .map(|(i, p)| (i + 1) as f64 * p)
        .sum::<f64>()
        / energy;

    Some(FrameSpectrum {
        energy,
        flatness,
        rolloff_hz: rolloff_bin as f64 * bin_hz,
        centroid_hz: centroid_bin * bin_hz,
    })
}

impl FeatureExtractor for SpectralSignatureExtractor {
    fn indicator(&self) -> Indicator {
        Indicator::SpectralSignature
    }

    fn measure(&self, audio: &AudioSample, profile: &LanguageProfile) -> DetectResult<FeatureScore> {
        let spectra = self.frame_spectra(audio);
        if spectra.len() < self.config.min_frames {
            debug!(frames = spectra.len(), "Too few loud frames for spectral signature");
            return Ok(FeatureScore::neutral(Indicator::SpectralSignature));
        }

        let flatness: Vec<f64> = spectra.iter().map(|f| f.flatness).collect();
        let rolloff: Vec<f64> = spectra.iter().map(|f| f.rolloff_hz).collect();
        let centroid: Vec<f64> = spectra.iter().map(|f| f.centroid_hz).collect();

        let missing = || DetectError::InternalComputation("spectral statistic undefined".to_string());
        let median_flatness = ensure_finite("median flatness", median(&flatness).ok_or_else(missing)?)?;
        let median_rolloff = ensure_finite("median rolloff", median(&rolloff).ok_or_else(missing)?)?;
        let centroid_cv = ensure_finite(
            "centroid CV",
            coefficient_of_variation(&centroid).ok_or_else(missing)?,
        )?;

        let c = &self.config;
        let flat_dev = self.flatness_deviation(median_flatness);
        let rolloff_dev = self.rolloff_deviation(median_rolloff, profile);
        let centroid_dev = ramp(centroid_cv, c.centroid_cv_ai, c.centroid_cv_human);

        let total_weight = c.flatness_weight + c.rolloff_weight + c.centroid_weight;
        if total_weight <= 0.0 {
            return Err(DetectError::InternalComputation(
                "spectral component weights sum to zero".to_string(),
            ));
        }
        let value = (c.flatness_weight * flat_dev + c.rolloff_weight * rolloff_dev + c.centroid_weight * centroid_dev)
            / total_weight;

        debug!(
            frames = spectra.len(),
            median_flatness = median_flatness,
            median_rolloff_hz = median_rolloff,
            centroid_cv = centroid_cv,
            value = value,
            "Spectral signature"
        );

        Ok(FeatureScore::triggered(
            Indicator::SpectralSignature,
            value,
            c.trigger_threshold,
        ))
    }
}
