//! Temporal Micro-variation Extractor
//!
//! **Purpose:** Detect overly uniform energy envelopes and missing or
//! mechanically regular pauses.
//!
//! **Algorithm:**
//! 1. Short-term RMS energy and zero-crossing rate per frame
//! 2. Energy CV over all frames; ZCR CV over active frames
//! 3. Pauses: runs of at least `min_gap_frames` frames quieter than
//!    `gap_rms_ratio` × the loudest frame, ignoring runs touching either edge
//!    of the clip (leading/trailing silence)
//! 4. Pause score:
//!    - none: 1.0 for clips of at least `pauseless_full_seconds`, else 0.5
//!      (too short to expect a breath)
//!    - one or two: `few_pauses_score`
//!    - three or more: regularity of the pause spacing, 1.0 for perfectly even
//!      spacing down to 0.0 at `pause_interval_cv_human`
//! 5. Weighted average of the energy, ZCR and pause components
//!
//! The energy CV band scales with the language profile's temporal multiplier.

use tracing::debug;

use crate::audio::dsp::{coefficient_of_variation, frames, ramp, rms, seconds_to_samples, zero_crossing_rate};
use crate::config::TemporalConfig;
use crate::error::{DetectError, DetectResult};
use crate::extractors::{ensure_finite, FeatureExtractor};
use crate::types::{AudioSample, FeatureScore, Indicator, LanguageProfile};

/// A detected pause, in frame indices (end exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pause {
    pub start_frame: usize,
    pub end_frame: usize,
}

pub struct TemporalVariationExtractor {
    config: TemporalConfig,
}

impl TemporalVariationExtractor {
    pub fn new(config: TemporalConfig) -> Self {
        Self { config }
    }

    /// Interior pauses in an RMS envelope
    pub fn find_pauses(&self, energies: &[f64]) -> Vec<Pause> {
        let loudest = energies.iter().copied().fold(0.0f64, f64::max);
        if loudest <= 0.0 {
            return Vec::new();
        }
        let threshold = loudest * self.config.gap_rms_ratio;

        let mut pauses = Vec::new();
        let mut run_start: Option<usize> = None;

        for (i, &energy) in energies.iter().enumerate() {
            match (energy < threshold, run_start) {
                (true, None) => run_start = Some(i),
                (false, Some(start)) => {
                    if start > 0 && i - start >= self.config.min_gap_frames {
                        pauses.push(Pause {
                            start_frame: start,
                            end_frame: i,
                        });
                    }
                    run_start = None;
                }
                _ => {}
            }
        }
        // A run still open at the end is trailing silence and is dropped

        pauses
    }

    fn pause_score(&self, pauses: &[Pause], duration_seconds: f64) -> f64 {
        let c = &self.config;
        match pauses.len() {
            0 if duration_seconds >= c.pauseless_full_seconds => 1.0,
            0 => 0.5,
            1 | 2 => c.few_pauses_score,
            _ => {
                let intervals: Vec<f64> = pauses
                    .windows(2)
                    .map(|w| (w[1].start_frame - w[0].start_frame) as f64)
                    .collect();
                match coefficient_of_variation(&intervals) {
                    Some(cv) => ramp(cv, 0.0, c.pause_interval_cv_human),
                    None => 1.0,
                }
            }
        }
    }
}

impl FeatureExtractor for TemporalVariationExtractor {
    fn indicator(&self) -> Indicator {
        Indicator::TemporalVariation
    }

    fn measure(&self, audio: &AudioSample, profile: &LanguageProfile) -> DetectResult<FeatureScore> {
        let c = &self.config;
        let sr = audio.sample_rate();
        let frame_len = seconds_to_samples(c.frame_seconds, sr);
        let hop = seconds_to_samples(c.hop_seconds, sr);

        let (energies, zcrs): (Vec<f64>, Vec<f64>) = frames(audio.samples(), frame_len, hop)
            .map(|frame| (rms(frame), zero_crossing_rate(frame)))
            .unzip();

        if energies.len() < c.min_frames {
            debug!(frames = energies.len(), "Too few frames for temporal variation");
            return Ok(FeatureScore::neutral(Indicator::TemporalVariation));
        }

        let loudest = energies.iter().copied().fold(0.0f64, f64::max);
        let active_zcr: Vec<f64> = energies
            .iter()
            .zip(&zcrs)
            .filter(|(e, _)| **e >= loudest * c.gap_rms_ratio)
            .map(|(_, z)| *z)
            .collect();

        let energy_cv = ensure_finite(
            "energy CV",
            coefficient_of_variation(&energies).ok_or_else(|| {
                DetectError::InternalComputation("energy envelope is all zero".to_string())
            })?,
        )?;
        // A clip with no zero crossings in its active frames (DC-like) is as
        // uniform as it gets
        let zcr_cv = ensure_finite("ZCR CV", coefficient_of_variation(&active_zcr).unwrap_or(0.0))?;

        let pauses = self.find_pauses(&energies);

        let energy_score = ramp(
            energy_cv,
            c.energy_cv_ai * profile.temporal,
            c.energy_cv_human * profile.temporal,
        );
        let zcr_score = ramp(zcr_cv, c.zcr_cv_ai, c.zcr_cv_human);
        let pause_score = self.pause_score(&pauses, audio.duration_seconds());

        let total_weight = c.energy_weight + c.zcr_weight + c.pause_weight;
        if total_weight <= 0.0 {
            return Err(DetectError::InternalComputation(
                "temporal component weights sum to zero".to_string(),
            ));
        }
        let value = (c.energy_weight * energy_score + c.zcr_weight * zcr_score + c.pause_weight * pause_score)
            / total_weight;

        debug!(
            frames = energies.len(),
            energy_cv = energy_cv,
            zcr_cv = zcr_cv,
            pauses = pauses.len(),
            value = value,
            "Temporal variation"
        );

        Ok(FeatureScore::triggered(
            Indicator::TemporalVariation,
            value,
            c.trigger_threshold,
        ))
    }
}
