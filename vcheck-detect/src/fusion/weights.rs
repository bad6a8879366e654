// Fusion Weights - named indicator → weight table
//
// Kept as data so the table can be inspected, configured and tested
// independently of the decision rule.

use serde::{Deserialize, Serialize};

use crate::types::Indicator;

/// Allowed drift of the weight sum from 1.0
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Per-indicator fusion weights (must be non-negative and sum to 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionWeights {
    pub pitch_regularity: f64,
    pub spectral_signature: f64,
    pub temporal_variation: f64,
    pub statistical_anomaly: f64,
    pub harmonic_structure: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            pitch_regularity: 0.25,
            spectral_signature: 0.20,
            temporal_variation: 0.20,
            statistical_anomaly: 0.10,
            harmonic_structure: 0.25,
        }
    }
}

impl FusionWeights {
    pub fn weight(&self, indicator: Indicator) -> f64 {
        match indicator {
            Indicator::PitchRegularity => self.pitch_regularity,
            Indicator::SpectralSignature => self.spectral_signature,
            Indicator::TemporalVariation => self.temporal_variation,
            Indicator::StatisticalAnomaly => self.statistical_anomaly,
            Indicator::HarmonicStructure => self.harmonic_structure,
        }
    }

    pub fn sum(&self) -> f64 {
        Indicator::ALL.iter().map(|i| self.weight(*i)).sum()
    }

    /// Check weights are finite, non-negative and sum to 1.0
    pub fn validate(&self) -> Result<(), String> {
        for indicator in Indicator::ALL {
            let w = self.weight(indicator);
            if !w.is_finite() || w < 0.0 {
                return Err(format!("fusion weight for {} must be non-negative, got {}", indicator, w));
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(format!("fusion weights must sum to 1.0, got {:.6}", sum));
        }

        Ok(())
    }
}
