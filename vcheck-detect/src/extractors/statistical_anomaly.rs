//! Statistical Anomaly Extractor
//!
//! **Purpose:** Detect amplitude distributions that do not look like a
//! recorded voice.
//!
//! **Algorithm:**
//! 1. Excess kurtosis and skewness of the raw sample distribution
//! 2. Kurtosis outside the natural envelope scores as deviation
//!    (platykurtic tone-like signals below it, spiky artifacts above it)
//! 3. Strong asymmetry (|skewness|) scores as deviation
//! 4. Quantization: fraction of the reachable 16-bit codes actually used.
//!    Synthesized audio rendered at low bit depth or through a coarse
//!    codebook occupies very few codes
//! 5. Weighted average of the three components

use tracing::debug;

use crate::audio::dsp::ramp;
use crate::config::StatisticalConfig;
use crate::error::{DetectError, DetectResult};
use crate::extractors::{ensure_finite, FeatureExtractor};
use crate::types::{AudioSample, FeatureScore, Indicator, LanguageProfile};

const CODE_SCALE: f64 = 32768.0;
const CODE_COUNT: usize = 1 << 16;

/// Standardized moments of a sample distribution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    pub mean: f64,
    pub std_dev: f64,
    pub skewness: f64,
    /// Excess kurtosis (0 for a Gaussian)
    pub kurtosis: f64,
}

/// Mean, standard deviation, skewness and excess kurtosis
///
/// Fails on a constant signal, where the standardized moments are undefined.
pub fn moments(samples: &[f32]) -> DetectResult<Moments> {
    if samples.is_empty() {
        return Err(DetectError::InternalComputation("no samples".to_string()));
    }
    let n = samples.len() as f64;
    let mean = samples.iter().map(|&s| s as f64).sum::<f64>() / n;

    let (mut m2, mut m3, mut m4) = (0.0f64, 0.0f64, 0.0f64);
    for &s in samples {
        let d = s as f64 - mean;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    m2 /= n;
    m3 /= n;
    m4 /= n;

    let std_dev = m2.sqrt();
    if std_dev < 1e-9 {
        return Err(DetectError::InternalComputation(
            "amplitude distribution has zero variance".to_string(),
        ));
    }

    Ok(Moments {
        mean,
        std_dev,
        skewness: m3 / (std_dev * m2),
        kurtosis: m4 / (m2 * m2) - 3.0,
    })
}

/// Fraction of reachable 16-bit codes the signal occupies
///
/// The reachable set is bounded both by the signal's peak and by the number
/// of samples, so short or quiet clips are not penalized for the codes they
/// could never have hit.
pub fn code_occupancy(samples: &[f32], peak: f32) -> f64 {
    let mut used = vec![0u64; CODE_COUNT / 64];
    let mut distinct = 0usize;

    for &s in samples {
        let code = ((s as f64 * CODE_SCALE).round().clamp(-CODE_SCALE, CODE_SCALE - 1.0) as i64 + 32768) as usize;
        let (word, bit) = (code / 64, code % 64);
        if used[word] & (1 << bit) == 0 {
            used[word] |= 1 << bit;
            distinct += 1;
        }
    }

    let reachable = ((2.0 * peak as f64 * CODE_SCALE).ceil() as usize + 1).min(samples.len()).max(1);
    distinct as f64 / reachable as f64
}

pub struct StatisticalAnomalyExtractor {
    config: StatisticalConfig,
}

impl StatisticalAnomalyExtractor {
    pub fn new(config: StatisticalConfig) -> Self {
        Self { config }
    }

    fn kurtosis_deviation(&self, kurtosis: f64) -> f64 {
        let c = &self.config;
        if kurtosis < c.kurtosis_min {
            ((c.kurtosis_min - kurtosis) / c.kurtosis_low_width).min(1.0)
        } else if kurtosis > c.kurtosis_max {
            ((kurtosis - c.kurtosis_max) / c.kurtosis_high_width).min(1.0)
        } else {
            0.0
        }
    }
}

impl FeatureExtractor for StatisticalAnomalyExtractor {
    fn indicator(&self) -> Indicator {
        Indicator::StatisticalAnomaly
    }

    fn measure(&self, audio: &AudioSample, _profile: &LanguageProfile) -> DetectResult<FeatureScore> {
        let c = &self.config;
        if audio.len() < c.min_samples {
            debug!(samples = audio.len(), "Too few samples for amplitude statistics");
            return Ok(FeatureScore::neutral(Indicator::StatisticalAnomaly));
        }

        let m = moments(audio.samples())?;
        let kurtosis = ensure_finite("kurtosis", m.kurtosis)?;
        let skewness = ensure_finite("skewness", m.skewness)?;
        let occupancy = ensure_finite("code occupancy", code_occupancy(audio.samples(), audio.peak()))?;

        let kurtosis_score = self.kurtosis_deviation(kurtosis);
        let skew_score = ramp(skewness.abs(), c.skew_ai, c.skew_human);
        let quantization_score = ramp(occupancy, c.occupancy_ai, c.occupancy_human);

        let total_weight = c.kurtosis_weight + c.skew_weight + c.quantization_weight;
        if total_weight <= 0.0 {
            return Err(DetectError::InternalComputation(
                "statistical component weights sum to zero".to_string(),
            ));
        }
        let value = (c.kurtosis_weight * kurtosis_score
            + c.skew_weight * skew_score
            + c.quantization_weight * quantization_score)
            / total_weight;

        debug!(
            kurtosis = kurtosis,
            skewness = skewness,
            occupancy = occupancy,
            value = value,
            "Amplitude statistics"
        );

        Ok(FeatureScore::triggered(
            Indicator::StatisticalAnomaly,
            value,
            c.trigger_threshold,
        ))
    }
}
