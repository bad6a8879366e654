// Voice Analyzer - per-request orchestration
//
// Decode → Extract × 5 → Fuse → Render. Holds only read-only configuration;
// nothing is retained between requests.

use std::sync::Arc;
use tracing::{debug, info};

use crate::audio::decode;
use crate::config::DetectorConfig;
use crate::error::{DetectError, DetectResult};
use crate::explanation::render_explanation;
use crate::extractors::{default_extractors, FeatureExtractor, ParallelExtractor};
use crate::fusion::FusionClassifier;
use crate::types::{AudioSample, ClassificationResult, FeatureScore};

/// One analysis request, with the payload already base64-decoded
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub audio: Vec<u8>,
    /// Declared container format (e.g. "mp3")
    pub audio_format: String,
    /// Declared language; selects the threshold profile only
    pub language: Option<String>,
}

impl AnalysisRequest {
    pub fn new(audio: Vec<u8>, audio_format: impl Into<String>, language: Option<String>) -> Self {
        Self {
            audio,
            audio_format: audio_format.into(),
            language,
        }
    }
}

/// Engine facade
pub struct VoiceAnalyzer {
    config: Arc<DetectorConfig>,
    extractors: ParallelExtractor,
    fusion: FusionClassifier,
}

impl VoiceAnalyzer {
    /// Build an analyzer with the five default extractors
    ///
    /// # Errors
    /// `Error::Config` when the configuration fails validation
    pub fn new(config: DetectorConfig) -> vcheck_common::Result<Self> {
        config.validate()?;
        let extractors = default_extractors(&config);
        Ok(Self::with_extractors(config, extractors))
    }

    /// Build an analyzer around a custom extractor set
    pub fn with_extractors(config: DetectorConfig, extractors: Vec<Arc<dyn FeatureExtractor>>) -> Self {
        let fusion = FusionClassifier::new(&config.fusion);
        Self {
            config: Arc::new(config),
            extractors: ParallelExtractor::new(extractors),
            fusion,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Analyze a request on the current thread
    pub fn analyze(&self, request: &AnalysisRequest) -> DetectResult<ClassificationResult> {
        let audio = decode(&request.audio, &request.audio_format, &self.config.decoder)?;
        Ok(self.analyze_samples(&audio, request.language.as_deref()))
    }

    /// Analyze already-decoded audio on the current thread
    pub fn analyze_samples(&self, audio: &AudioSample, language: Option<&str>) -> ClassificationResult {
        let profile = self.config.languages.profile_for(language);
        let scores = self.extractors.extract_sequential(audio, &profile);
        self.finish(scores)
    }

    /// Analyze a request with decoding and every extractor on the blocking pool
    ///
    /// The five extractors run concurrently; fusion starts once all of them
    /// have finished.
    pub async fn analyze_async(&self, request: AnalysisRequest) -> DetectResult<ClassificationResult> {
        let AnalysisRequest {
            audio,
            audio_format,
            language,
        } = request;

        let config = Arc::clone(&self.config);
        let audio = tokio::task::spawn_blocking(move || decode(&audio, &audio_format, &config.decoder))
            .await
            .map_err(|e| DetectError::InternalComputation(format!("decode task failed: {}", e)))??;

        debug!(
            samples = audio.len(),
            duration_seconds = audio.duration_seconds(),
            "Decoded, running extractors"
        );

        let profile = self.config.languages.profile_for(language.as_deref());
        let scores = self.extractors.extract_all(Arc::new(audio), profile).await;
        Ok(self.finish(scores))
    }

    fn finish(&self, mut scores: Vec<FeatureScore>) -> ClassificationResult {
        scores.sort_by_key(FeatureScore::indicator);

        let decision = self.fusion.classify(&scores);
        let explanation = render_explanation(&scores, &decision, self.fusion.weights());

        info!(
            label = %decision.label,
            confidence = decision.confidence,
            aggregate = decision.aggregate,
            "Classification complete"
        );

        ClassificationResult {
            label: decision.label,
            confidence: decision.confidence,
            explanation,
            aggregate: decision.aggregate,
            scores,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::mock::{MockBehaviour, MockExtractor};
    use crate::types::{Indicator, Label};

    fn mock_analyzer(values: [f64; 5]) -> VoiceAnalyzer {
        let extractors: Vec<Arc<dyn FeatureExtractor>> = Indicator::ALL
            .iter()
            .rev()
            .zip(values.iter().rev())
            .map(|(indicator, value)| {
                Arc::new(MockExtractor::new(*indicator, MockBehaviour::Score(*value))) as Arc<dyn FeatureExtractor>
            })
            .collect();
        VoiceAnalyzer::with_extractors(DetectorConfig::default(), extractors)
    }

    fn audio() -> AudioSample {
        AudioSample::new(vec![0.1; 16000], 16000).unwrap()
    }

    #[test]
    fn test_scores_are_returned_in_indicator_order() {
        let result = mock_analyzer([0.9, 0.1, 0.1, 0.1, 0.9]).analyze_samples(&audio(), None);
        let indicators: Vec<Indicator> = result.scores.iter().map(|s| s.indicator()).collect();
        assert_eq!(indicators, Indicator::ALL.to_vec());
    }

    #[test]
    fn test_result_is_consistent_with_fusion() {
        // 0.25*0.9 + 0.2*0.1 + 0.2*0.1 + 0.1*0.1 + 0.25*0.9 = 0.5
        let result = mock_analyzer([0.9, 0.1, 0.1, 0.1, 0.9]).analyze_samples(&audio(), Some("English"));
        assert!((result.aggregate - 0.5).abs() < 1e-9);
        match result.label {
            Label::AiGenerated => assert_eq!(result.confidence, result.aggregate),
            Label::Human => assert_eq!(result.confidence, 1.0 - result.aggregate),
        }
        assert!(!result.explanation.is_empty());
    }

    #[test]
    fn test_analyze_rejects_wrong_format() {
        let analyzer = VoiceAnalyzer::new(DetectorConfig::default()).unwrap();
        let request = AnalysisRequest::new(vec![1, 2, 3], "wav", None);
        assert!(matches!(
            analyzer.analyze(&request),
            Err(DetectError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = DetectorConfig::default();
        config.fusion.weights.pitch_regularity = 0.9;
        assert!(VoiceAnalyzer::new(config).is_err());
    }

    #[tokio::test]
    async fn test_async_propagates_decode_errors() {
        let analyzer = VoiceAnalyzer::new(DetectorConfig::default()).unwrap();
        let result = analyzer.analyze_async(AnalysisRequest::new(Vec::new(), "mp3", None)).await;
        assert!(matches!(result, Err(DetectError::Decode(_))));
    }
}
