// Fusion Classifier - weighted decision rule
//
// Five indicator scores → one aggregate AI-likelihood → label + confidence.
// Pure function of its inputs: no randomness, no state, cannot fail.

pub mod weights;

pub use weights::FusionWeights;

use serde::Serialize;

use crate::config::FusionConfig;
use crate::types::{clamp_unit, FeatureScore, Indicator, Label, NEUTRAL_SCORE};

/// Outcome of fusion, before the explanation is rendered
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Decision {
    pub label: Label,
    /// Certainty in `label`
    pub confidence: f64,
    /// Weighted AI-likelihood in [0.0, 1.0]
    pub aggregate: f64,
}

/// Weighted-sum fusion of indicator scores
#[derive(Debug, Clone)]
pub struct FusionClassifier {
    weights: FusionWeights,
    decision_threshold: f64,
}

impl FusionClassifier {
    pub fn new(config: &FusionConfig) -> Self {
        Self {
            weights: config.weights,
            decision_threshold: config.decision_threshold,
        }
    }

    pub fn weights(&self) -> &FusionWeights {
        &self.weights
    }

    /// Weighted sum of the five indicator scores, clamped to [0.0, 1.0]
    ///
    /// An indicator missing from `scores` contributes the neutral score; if
    /// an indicator appears twice, the first occurrence wins.
    pub fn aggregate(&self, scores: &[FeatureScore]) -> f64 {
        let sum: f64 = Indicator::ALL
            .iter()
            .map(|indicator| {
                let value = scores
                    .iter()
                    .find(|s| s.indicator() == *indicator)
                    .map(FeatureScore::value)
                    .unwrap_or(NEUTRAL_SCORE);
                self.weights.weight(*indicator) * value
            })
            .sum();

        clamp_unit(sum)
    }

    /// Apply the decision rule
    ///
    /// aggregate >= threshold → AI_GENERATED with confidence = aggregate,
    /// otherwise HUMAN with confidence = 1 - aggregate. Ties go to
    /// AI_GENERATED.
    pub fn classify(&self, scores: &[FeatureScore]) -> Decision {
        let aggregate = self.aggregate(scores);

        let (label, confidence) = if aggregate >= self.decision_threshold {
            (Label::AiGenerated, aggregate)
        } else {
            (Label::Human, 1.0 - aggregate)
        };

        tracing::debug!(
            aggregate = aggregate,
            label = %label,
            confidence = confidence,
            "Fusion decision"
        );

        Decision {
            label,
            confidence,
            aggregate,
        }
    }
}
