//! Pitch Regularity Extractor
//!
//! **Purpose:** Detect unnaturally steady pitch.
//!
//! **Algorithm:**
//! 1. Estimate f0 per short overlapping window (normalized autocorrelation);
//!    windows without clear periodicity are unvoiced and dropped
//! 2. Coefficient of variation of the voiced contour
//! 3. CV <= `cv_ai` → 1.0, CV >= `cv_human` → 0.0, linear in between. Both
//!    band edges scale with the language profile's pitch multiplier
//!
//! Human speech carries continuous jitter and intonation, so its contour CV
//! sits well above the synthetic band. Too few voiced windows yields the
//! neutral score.

use tracing::debug;

use crate::audio::dsp::{
    coefficient_of_variation, estimate_pitch, frames, ramp, seconds_to_samples, PitchSearch,
};
use crate::config::PitchConfig;
use crate::error::{DetectError, DetectResult};
use crate::extractors::{ensure_finite, FeatureExtractor};
use crate::types::{AudioSample, FeatureScore, Indicator, LanguageProfile};

pub struct PitchRegularityExtractor {
    config: PitchConfig,
}

impl PitchRegularityExtractor {
    pub fn new(config: PitchConfig) -> Self {
        Self { config }
    }

    /// Voiced f0 estimates in Hz, in time order
    pub fn pitch_contour(&self, audio: &AudioSample) -> Vec<f64> {
        let sr = audio.sample_rate();
        let window = seconds_to_samples(self.config.window_seconds, sr);
        let hop = seconds_to_samples(self.config.hop_seconds, sr);
        let search = PitchSearch {
            sample_rate: sr,
            min_f0_hz: self.config.min_f0_hz,
            max_f0_hz: self.config.max_f0_hz,
            voicing_threshold: self.config.voicing_threshold,
        };

        frames(audio.samples(), window, hop)
            .filter_map(|frame| estimate_pitch(frame, &search))
            .map(|estimate| estimate.f0_hz)
            .collect()
    }
}

impl FeatureExtractor for PitchRegularityExtractor {
    fn indicator(&self) -> Indicator {
        Indicator::PitchRegularity
    }

    fn measure(&self, audio: &AudioSample, profile: &LanguageProfile) -> DetectResult<FeatureScore> {
        let contour = self.pitch_contour(audio);

        if contour.len() < self.config.min_voiced_windows {
            debug!(
                voiced_windows = contour.len(),
                required = self.config.min_voiced_windows,
                "Too few voiced windows for pitch regularity"
            );
            return Ok(FeatureScore::neutral(Indicator::PitchRegularity));
        }

        let cv = coefficient_of_variation(&contour).ok_or_else(|| {
            DetectError::InternalComputation("pitch contour has zero mean".to_string())
        })?;
        let cv = ensure_finite("pitch contour CV", cv)?;

        let value = ramp(
            cv,
            self.config.cv_ai * profile.pitch,
            self.config.cv_human * profile.pitch,
        );

        debug!(
            voiced_windows = contour.len(),
            pitch_cv = cv,
            value = value,
            "Pitch regularity"
        );

        Ok(FeatureScore::triggered(
            Indicator::PitchRegularity,
            value,
            self.config.trigger_threshold,
        ))
    }
}
