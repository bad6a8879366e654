//! Explanation Renderer
//!
//! **Purpose:** Turn the triggered findings and the fused decision into one
//! readable sentence.
//!
//! **Rules:**
//! - Findings are listed in indicator-definition order (pitch, spectral,
//!   temporal, statistical, harmonic), comma-joined
//! - `AI_GENERATED` with findings: `"Detected AI indicators: ..."`
//! - `AI_GENERATED` without findings (the aggregate crossed the threshold
//!   through many small contributions): a fallback naming the indicator with
//!   the largest weighted contribution
//! - `HUMAN`: `"No significant AI indicators detected; ..."` followed by the
//!   most human-like indicator, plus any minor findings
//!
//! The result is never empty.

use crate::fusion::{Decision, FusionWeights};
use crate::types::{FeatureScore, Indicator, Label, NEUTRAL_SCORE};

/// Render the explanation sentence for a decision
pub fn render_explanation(scores: &[FeatureScore], decision: &Decision, weights: &FusionWeights) -> String {
    let findings = ordered_findings(scores);

    match decision.label {
        Label::AiGenerated if !findings.is_empty() => {
            format!("Detected AI indicators: {}", findings.join(", "))
        }
        Label::AiGenerated => {
            let dominant = dominant_indicator(scores, weights);
            format!(
                "Synthetic voice patterns detected across multiple audio features, led by {}",
                dominant.display_name()
            )
        }
        Label::Human => {
            let strongest = most_human_indicator(scores);
            let mut sentence = format!(
                "No significant AI indicators detected; voice exhibits {}",
                strongest.human_signal()
            );
            if !findings.is_empty() {
                sentence.push_str(", with minor indicators: ");
                sentence.push_str(&findings.join(", "));
            }
            sentence
        }
    }
}

/// All findings, in indicator order regardless of the order of `scores`
fn ordered_findings(scores: &[FeatureScore]) -> Vec<&str> {
    Indicator::ALL
        .iter()
        .filter_map(|indicator| scores.iter().find(|s| s.indicator() == *indicator))
        .flat_map(|score| score.findings().iter().map(String::as_str))
        .collect()
}

fn value_of(scores: &[FeatureScore], indicator: Indicator) -> f64 {
    scores
        .iter()
        .find(|s| s.indicator() == indicator)
        .map(FeatureScore::value)
        .unwrap_or(NEUTRAL_SCORE)
}

/// Indicator with the largest weight × value; ties go to the earlier one
fn dominant_indicator(scores: &[FeatureScore], weights: &FusionWeights) -> Indicator {
    let mut best = Indicator::ALL[0];
    let mut best_contribution = f64::NEG_INFINITY;
    for indicator in Indicator::ALL {
        let contribution = weights.weight(indicator) * value_of(scores, indicator);
        if contribution > best_contribution {
            best = indicator;
            best_contribution = contribution;
        }
    }
    best
}

/// Indicator with the lowest (most human-like) value; ties go to the earlier one
fn most_human_indicator(scores: &[FeatureScore]) -> Indicator {
    let mut best = Indicator::ALL[0];
    let mut best_value = f64::INFINITY;
    for indicator in Indicator::ALL {
        let value = value_of(scores, indicator);
        if value < best_value {
            best = indicator;
            best_value = value;
        }
    }
    best
}
