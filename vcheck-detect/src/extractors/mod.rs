//! Acoustic Feature Extractors
//!
//! Five independent extractors, each reading the same immutable
//! [`AudioSample`] and producing one [`FeatureScore`].
//!
//! # Extractors
//! 1. **pitch_regularity** - variation of the voiced pitch contour
//! 2. **spectral_signature** - spectral flatness, rolloff and centroid movement
//! 3. **temporal_variation** - energy/ZCR variability and pause structure
//! 4. **statistical_anomaly** - amplitude distribution shape and quantization
//! 5. **harmonic_structure** - harmonic-to-noise ratio and partial spacing
//!
//! # Error isolation
//! `measure` may fail with `InternalComputation` on numerically degenerate
//! input. `extract` never fails: a failed measurement becomes the neutral
//! score (0.5, no finding) and is logged, so one weak signal cannot fail the
//! whole classification.

pub mod harmonic_structure;
pub mod pitch_regularity;
pub mod spectral_signature;
pub mod statistical_anomaly;
pub mod temporal_variation;

pub use harmonic_structure::HarmonicStructureExtractor;
pub use pitch_regularity::PitchRegularityExtractor;
pub use spectral_signature::SpectralSignatureExtractor;
pub use statistical_anomaly::StatisticalAnomalyExtractor;
pub use temporal_variation::TemporalVariationExtractor;

use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::DetectorConfig;
use crate::error::{DetectError, DetectResult};
use crate::types::{AudioSample, FeatureScore, Indicator, LanguageProfile};

/// One acoustic indicator
pub trait FeatureExtractor: Send + Sync {
    /// Indicator this extractor scores
    fn indicator(&self) -> Indicator;

    /// Measure the indicator, failing on degenerate intermediate values
    fn measure(&self, audio: &AudioSample, profile: &LanguageProfile) -> DetectResult<FeatureScore>;

    /// Measure the indicator, substituting the neutral score on failure
    fn extract(&self, audio: &AudioSample, profile: &LanguageProfile) -> FeatureScore {
        let indicator = self.indicator();
        match self.measure(audio, profile) {
            Ok(score) if score.indicator() == indicator => {
                debug!(
                    indicator = %indicator,
                    value = score.value(),
                    triggered = score.is_triggered(),
                    "Indicator measured"
                );
                score
            }
            Ok(score) => {
                warn!(
                    indicator = %indicator,
                    reported = %score.indicator(),
                    "Extractor reported the wrong indicator, using neutral score"
                );
                FeatureScore::neutral(indicator)
            }
            Err(e) => {
                warn!(
                    indicator = %indicator,
                    error = %e,
                    "Indicator measurement degenerate, using neutral score"
                );
                FeatureScore::neutral(indicator)
            }
        }
    }
}

/// Fail with `InternalComputation` unless `value` is finite
pub(crate) fn ensure_finite(what: &str, value: f64) -> DetectResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DetectError::InternalComputation(format!(
            "{} is not finite ({})",
            what, value
        )))
    }
}

/// The five extractors in definition order
pub fn default_extractors(config: &DetectorConfig) -> Vec<Arc<dyn FeatureExtractor>> {
    vec![
        Arc::new(PitchRegularityExtractor::new(config.pitch.clone())),
        Arc::new(SpectralSignatureExtractor::new(config.spectral.clone())),
        Arc::new(TemporalVariationExtractor::new(config.temporal.clone())),
        Arc::new(StatisticalAnomalyExtractor::new(config.statistical.clone())),
        Arc::new(HarmonicStructureExtractor::new(config.harmonic.clone())),
    ]
}

/// Parallel extractor executor
///
/// Runs every extractor on the blocking thread pool and joins them all before
/// returning: the join point that fusion waits on. Results keep extractor
/// order. A panicking extractor is isolated and reported as neutral.
pub struct ParallelExtractor {
    extractors: Vec<Arc<dyn FeatureExtractor>>,
}

impl ParallelExtractor {
    pub fn new(extractors: Vec<Arc<dyn FeatureExtractor>>) -> Self {
        Self { extractors }
    }

    pub fn extractors(&self) -> &[Arc<dyn FeatureExtractor>] {
        &self.extractors
    }

    /// Run all extractors sequentially on the current thread
    pub fn extract_sequential(&self, audio: &AudioSample, profile: &LanguageProfile) -> Vec<FeatureScore> {
        self.extractors
            .iter()
            .map(|extractor| extractor.extract(audio, profile))
            .collect()
    }

    /// Run all extractors concurrently and wait for every one of them
    pub async fn extract_all(&self, audio: Arc<AudioSample>, profile: LanguageProfile) -> Vec<FeatureScore> {
        let tasks = self.extractors.iter().map(|extractor| {
            let extractor = Arc::clone(extractor);
            let audio = Arc::clone(&audio);
            async move {
                let indicator = extractor.indicator();
                match tokio::task::spawn_blocking(move || extractor.extract(&audio, &profile)).await {
                    Ok(score) => score,
                    Err(e) => {
                        warn!(
                            indicator = %indicator,
                            error = %e,
                            "Extractor task failed, using neutral score"
                        );
                        FeatureScore::neutral(indicator)
                    }
                }
            }
        });

        join_all(tasks).await
    }

    pub fn count(&self) -> usize {
        self.extractors.len()
    }
}

// ============================================================================
// Mock Extractor for Testing
// ============================================================================


// ============================================================================
// Tests
// ============================================================================
