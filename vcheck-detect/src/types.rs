//! Core types for voice authenticity analysis
//!
//! **Data flow:** one [`AudioSample`] feeds five extractors, each producing one
//! [`FeatureScore`]; fusion turns the five scores into one
//! [`ClassificationResult`]. Nothing here is shared across requests.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DetectError, DetectResult};

/// Acoustic indicator identifiers, in extractor-definition order
///
/// The derived `Ord` follows declaration order, which is also the order
/// findings are listed in explanations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    PitchRegularity,
    SpectralSignature,
    TemporalVariation,
    StatisticalAnomaly,
    HarmonicStructure,
}

impl Indicator {
    /// All indicators in definition order
    pub const ALL: [Indicator; 5] = [
        Indicator::PitchRegularity,
        Indicator::SpectralSignature,
        Indicator::TemporalVariation,
        Indicator::StatisticalAnomaly,
        Indicator::HarmonicStructure,
    ];

    /// Stable identifier used in logs and JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            Indicator::PitchRegularity => "pitch_regularity",
            Indicator::SpectralSignature => "spectral_signature",
            Indicator::TemporalVariation => "temporal_variation",
            Indicator::StatisticalAnomaly => "statistical_anomaly",
            Indicator::HarmonicStructure => "harmonic_structure",
        }
    }

    /// Readable name used in fallback explanations
    pub fn display_name(&self) -> &'static str {
        match self {
            Indicator::PitchRegularity => "pitch regularity",
            Indicator::SpectralSignature => "spectral signature",
            Indicator::TemporalVariation => "temporal micro-variation",
            Indicator::StatisticalAnomaly => "amplitude statistics",
            Indicator::HarmonicStructure => "harmonic structure",
        }
    }

    /// Finding text emitted when this indicator's score is triggered
    pub fn finding(&self) -> &'static str {
        match self {
            Indicator::PitchRegularity => "unnatural pitch consistency",
            Indicator::SpectralSignature => "synthetic spectral pattern",
            Indicator::TemporalVariation => "missing natural breathing/pause pattern",
            Indicator::StatisticalAnomaly => "anomalous amplitude distribution",
            Indicator::HarmonicStructure => "overly clean harmonic structure",
        }
    }

    /// Phrase describing a human-consistent reading of this indicator
    pub fn human_signal(&self) -> &'static str {
        match self {
            Indicator::PitchRegularity => "natural pitch dynamics",
            Indicator::SpectralSignature => "organic spectral characteristics",
            Indicator::TemporalVariation => "human-like rhythm and pauses",
            Indicator::StatisticalAnomaly => "natural amplitude distribution",
            Indicator::HarmonicStructure => "natural breathiness in the harmonic structure",
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded mono PCM audio at the analysis sample rate
///
/// Invariants: non-empty, sample rate > 0, every amplitude finite and within
/// [-1.0, 1.0]. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct AudioSample {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioSample {
    /// Build an audio sample, clamping amplitudes into [-1.0, 1.0]
    ///
    /// Non-finite amplitudes are replaced by silence.
    pub fn new(mut samples: Vec<f32>, sample_rate: u32) -> DetectResult<Self> {
        if samples.is_empty() {
            return Err(DetectError::InsufficientAudio(
                "audio contains no samples".to_string(),
            ));
        }
        if sample_rate == 0 {
            return Err(DetectError::InternalComputation(
                "sample rate must be positive".to_string(),
            ));
        }

        for s in samples.iter_mut() {
            *s = if s.is_finite() { s.clamp(-1.0, 1.0) } else { 0.0 };
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Largest absolute amplitude
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    /// Keep at most `max_seconds` of audio
    pub fn truncated(mut self, max_seconds: f64) -> Self {
        let max_len = (max_seconds * self.sample_rate as f64).floor() as usize;
        if max_len > 0 && self.samples.len() > max_len {
            self.samples.truncate(max_len);
        }
        self
    }
}

/// One extractor's verdict on one indicator
///
/// `value` is "how AI-like" the dimension appears: 0 = strongly human-like,
/// 1 = strongly synthetic-like.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureScore {
    indicator: Indicator,
    value: f64,
    findings: Vec<String>,
}

/// Score reported when an indicator cannot be measured meaningfully
pub const NEUTRAL_SCORE: f64 = 0.5;

impl FeatureScore {
    /// Build a score, attaching the indicator's finding only when the clamped
    /// value exceeds `trigger_threshold`
    pub fn triggered(indicator: Indicator, value: f64, trigger_threshold: f64) -> Self {
        let value = clamp_unit(value);
        let findings = if value > trigger_threshold {
            vec![indicator.finding().to_string()]
        } else {
            Vec::new()
        };

        Self {
            indicator,
            value,
            findings,
        }
    }

    /// Neutral 0.5 score with no finding
    pub fn neutral(indicator: Indicator) -> Self {
        Self {
            indicator,
            value: NEUTRAL_SCORE,
            findings: Vec::new(),
        }
    }

    pub fn indicator(&self) -> Indicator {
        self.indicator
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn findings(&self) -> &[String] {
        &self.findings
    }

    pub fn is_triggered(&self) -> bool {
        !self.findings.is_empty()
    }
}

/// Clamp into [0.0, 1.0]; NaN maps to the neutral score
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        NEUTRAL_SCORE
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Classification label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    #[serde(rename = "AI_GENERATED")]
    AiGenerated,
    #[serde(rename = "HUMAN")]
    Human,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::AiGenerated => "AI_GENERATED",
            Label::Human => "HUMAN",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final analysis output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub label: Label,
    /// Certainty in `label`, in [0.0, 1.0]
    pub confidence: f64,
    pub explanation: String,
    /// Raw weighted AI-likelihood before label selection
    pub aggregate: f64,
    /// Per-indicator scores in definition order
    pub scores: Vec<FeatureScore>,
}

/// Per-language multipliers applied to extractor threshold bands
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageProfile {
    pub pitch: f64,
    pub spectral: f64,
    pub temporal: f64,
}

impl LanguageProfile {
    pub const NEUTRAL: LanguageProfile = LanguageProfile {
        pitch: 1.0,
        spectral: 1.0,
        temporal: 1.0,
    };
}

impl Default for LanguageProfile {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicator_order_matches_definition() {
        let mut shuffled = vec![
            Indicator::HarmonicStructure,
            Indicator::PitchRegularity,
            Indicator::StatisticalAnomaly,
            Indicator::SpectralSignature,
            Indicator::TemporalVariation,
        ];
        shuffled.sort();
        assert_eq!(shuffled, Indicator::ALL.to_vec());
    }

    #[test]
    fn test_audio_sample_clamps_and_sanitizes() {
        let audio = AudioSample::new(vec![1.5, -2.0, f32::NAN, 0.25], 16000).unwrap();
        assert_eq!(audio.samples(), &[1.0, -1.0, 0.0, 0.25]);
        assert_eq!(audio.peak(), 1.0);
    }

    #[test]
    fn test_audio_sample_rejects_empty() {
        assert!(matches!(
            AudioSample::new(Vec::new(), 16000),
            Err(DetectError::InsufficientAudio(_))
        ));
    }

    #[test]
    fn test_audio_sample_truncation() {
        let audio = AudioSample::new(vec![0.1; 16000 * 3], 16000).unwrap();
        let audio = audio.truncated(2.0);
        assert_eq!(audio.len(), 32000);
        assert!((audio.duration_seconds() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_feature_score_clamped_and_triggered() {
        let high = FeatureScore::triggered(Indicator::PitchRegularity, 1.7, 0.6);
        assert_eq!(high.value(), 1.0);
        assert_eq!(high.findings(), &["unnatural pitch consistency".to_string()]);

        let low = FeatureScore::triggered(Indicator::PitchRegularity, -0.3, 0.6);
        assert_eq!(low.value(), 0.0);
        assert!(!low.is_triggered());
    }

    #[test]
    fn test_feature_score_at_threshold_is_not_triggered() {
        let score = FeatureScore::triggered(Indicator::HarmonicStructure, 0.6, 0.6);
        assert!(!score.is_triggered());
    }

    #[test]
    fn test_nan_value_becomes_neutral() {
        let score = FeatureScore::triggered(Indicator::SpectralSignature, f64::NAN, 0.6);
        assert_eq!(score.value(), NEUTRAL_SCORE);
        assert!(!score.is_triggered());
    }

    #[test]
    fn test_label_serialization() {
        assert_eq!(serde_json::to_string(&Label::AiGenerated).unwrap(), "\"AI_GENERATED\"");
        assert_eq!(serde_json::to_string(&Label::Human).unwrap(), "\"HUMAN\"");
    }
}
