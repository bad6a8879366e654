//! Engine scenario tests
//!
//! End-to-end runs of the engine (decode → extract → fuse → render) on
//! synthesized fixtures.

mod helpers;

use helpers::{harmonic_tone, silence, speech_like, wav_bytes, TEST_SAMPLE_RATE};
use vcheck_detect::config::DetectorConfig;
use vcheck_detect::types::AudioSample;
use vcheck_detect::{AnalysisRequest, DetectError, Indicator, Label, VoiceAnalyzer};

fn analyzer() -> VoiceAnalyzer {
    VoiceAnalyzer::new(DetectorConfig::default()).unwrap()
}

fn score_of(result: &vcheck_detect::ClassificationResult, indicator: Indicator) -> f64 {
    result
        .scores
        .iter()
        .find(|s| s.indicator() == indicator)
        .map(|s| s.value())
        .unwrap()
}

#[test]
fn regular_harmonic_tone_is_ai_generated() {
    let tone = harmonic_tone(125.0, 2.0, TEST_SAMPLE_RATE);
    let request = AnalysisRequest::new(wav_bytes(&tone, TEST_SAMPLE_RATE), "mp3", Some("English".to_string()));

    let result = analyzer().analyze(&request).unwrap();

    assert!(score_of(&result, Indicator::PitchRegularity) >= 0.9);
    assert!(score_of(&result, Indicator::HarmonicStructure) >= 0.9);
    assert!(result.aggregate >= 0.5);
    assert_eq!(result.label, Label::AiGenerated);
    assert_eq!(result.confidence, result.aggregate);
    assert!(result.explanation.starts_with("Detected AI indicators: unnatural pitch consistency"));
    assert!(result.explanation.contains("overly clean harmonic structure"));
}

#[test]
fn speech_like_clip_is_human() {
    let speech = speech_like(42);
    let request = AnalysisRequest::new(wav_bytes(&speech, TEST_SAMPLE_RATE), "mp3", Some("Tamil".to_string()));

    let result = analyzer().analyze(&request).unwrap();

    assert!(result.aggregate < 0.5, "aggregate = {}", result.aggregate);
    assert_eq!(result.label, Label::Human);
    assert!((result.confidence - (1.0 - result.aggregate)).abs() < 1e-12);
    assert!(result
        .explanation
        .starts_with("No significant AI indicators detected; voice exhibits"));
}

#[test]
fn short_near_silent_clip_is_insufficient() {
    let clip = silence(0.1, TEST_SAMPLE_RATE, 1e-4);
    let request = AnalysisRequest::new(wav_bytes(&clip, TEST_SAMPLE_RATE), "mp3", None);

    let result = analyzer().analyze(&request);
    assert!(matches!(result, Err(DetectError::InsufficientAudio(_))), "{:?}", result);
}

#[test]
fn long_silent_clip_is_insufficient() {
    let clip = silence(2.0, TEST_SAMPLE_RATE, 1e-4);
    let request = AnalysisRequest::new(wav_bytes(&clip, TEST_SAMPLE_RATE), "mp3", None);

    assert!(matches!(
        analyzer().analyze(&request),
        Err(DetectError::InsufficientAudio(_))
    ));
}

#[test]
fn wav_declared_format_is_unsupported() {
    let tone = harmonic_tone(125.0, 1.0, TEST_SAMPLE_RATE);
    let request = AnalysisRequest::new(wav_bytes(&tone, TEST_SAMPLE_RATE), "wav", None);

    match analyzer().analyze(&request) {
        Err(DetectError::UnsupportedFormat { declared, supported }) => {
            assert_eq!(declared, "wav");
            assert_eq!(supported, "mp3");
        }
        other => panic!("expected UnsupportedFormat, got {:?}", other),
    }
}

#[test]
fn empty_payload_never_classifies() {
    let request = AnalysisRequest::new(Vec::new(), "mp3", None);
    assert!(matches!(analyzer().analyze(&request), Err(DetectError::Decode(_))));
}

#[test]
fn results_are_bounded_and_consistent() {
    let analyzer = analyzer();
    let fixtures = [
        harmonic_tone(125.0, 1.5, TEST_SAMPLE_RATE),
        harmonic_tone(210.0, 1.0, TEST_SAMPLE_RATE),
        speech_like(1),
        speech_like(2),
    ];

    for samples in fixtures {
        let audio = AudioSample::new(samples, TEST_SAMPLE_RATE).unwrap();
        let result = analyzer.analyze_samples(&audio, Some("Hindi"));

        assert_eq!(result.scores.len(), 5);
        for score in &result.scores {
            assert!((0.0..=1.0).contains(&score.value()));
            if !score.is_triggered() {
                assert!(score.findings().is_empty());
            }
        }
        assert!((0.0..=1.0).contains(&result.confidence));
        match result.label {
            Label::AiGenerated => assert_eq!(result.confidence, result.aggregate),
            Label::Human => assert_eq!(result.confidence, 1.0 - result.aggregate),
        }
        assert!(!result.explanation.is_empty());
    }
}

/// 150 Hz harmonic voice with a 5% vibrato at 4 Hz
fn vibrato_tone(seconds: f64) -> Vec<f32> {
    use std::f64::consts::PI;
    let sr = TEST_SAMPLE_RATE as f64;
    let mut phase = 0.0f64;
    (0..(seconds * sr) as usize)
        .map(|i| {
            let t = i as f64 / sr;
            phase += 2.0 * PI * 150.0 * (1.0 + 0.05 * (2.0 * PI * 4.0 * t).sin()) / sr;
            (1..=4).map(|k| 0.4 / k as f64 * (k as f64 * phase).sin()).sum::<f64>() as f32
        })
        .collect()
}

#[test]
fn language_profile_shifts_pitch_score_and_aggregate() {
    let analyzer = analyzer();
    let audio = AudioSample::new(vibrato_tone(2.0), TEST_SAMPLE_RATE).unwrap();

    let tamil = analyzer.analyze_samples(&audio, Some("Tamil"));
    let english = analyzer.analyze_samples(&audio, Some("English"));

    // Only the pitch band differs between these two profiles
    let tamil_pitch = score_of(&tamil, Indicator::PitchRegularity);
    let english_pitch = score_of(&english, Indicator::PitchRegularity);
    assert!(english_pitch > 0.0 && english_pitch < 1.0, "pitch = {}", english_pitch);
    assert!(tamil_pitch > english_pitch, "{} <= {}", tamil_pitch, english_pitch);
    for indicator in [
        Indicator::SpectralSignature,
        Indicator::TemporalVariation,
        Indicator::StatisticalAnomaly,
        Indicator::HarmonicStructure,
    ] {
        assert_eq!(score_of(&tamil, indicator), score_of(&english, indicator));
    }
    assert!(tamil.aggregate > english.aggregate);
}

#[test]
fn analysis_is_deterministic() {
    let analyzer = analyzer();
    let audio = AudioSample::new(speech_like(9), TEST_SAMPLE_RATE).unwrap();

    let first = analyzer.analyze_samples(&audio, Some("English"));
    let second = analyzer.analyze_samples(&audio, Some("English"));
    assert_eq!(first, second);
}

#[test]
fn explanation_lists_only_produced_findings_in_order() {
    let audio = AudioSample::new(harmonic_tone(125.0, 2.0, TEST_SAMPLE_RATE), TEST_SAMPLE_RATE).unwrap();
    let result = analyzer().analyze_samples(&audio, None);

    let produced: Vec<&str> = result
        .scores
        .iter()
        .flat_map(|s| s.findings().iter().map(String::as_str))
        .collect();
    let listed: Vec<&str> = result
        .explanation
        .trim_start_matches("Detected AI indicators: ")
        .split(", ")
        .collect();
    assert_eq!(listed, produced);
}

#[tokio::test]
async fn parallel_path_matches_sequential_path() {
    let analyzer = analyzer();
    let bytes = wav_bytes(&speech_like(5), TEST_SAMPLE_RATE);

    let sequential = analyzer
        .analyze(&AnalysisRequest::new(bytes.clone(), "mp3", Some("Telugu".to_string())))
        .unwrap();
    let parallel = analyzer
        .analyze_async(AnalysisRequest::new(bytes, "mp3", Some("Telugu".to_string())))
        .await
        .unwrap();

    assert_eq!(parallel, sequential);
}

#[test]
fn real_mp3_payload_is_classified() {
    let bytes = include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/tone_292hz.mp3"));
    let request = AnalysisRequest::new(bytes.to_vec(), "mp3", Some("English".to_string()));

    let result = analyzer().analyze(&request).unwrap();

    assert_eq!(result.scores.len(), 5);
    assert!((0.0..=1.0).contains(&result.aggregate));
    assert!((0.5..=1.0).contains(&result.confidence));
    assert!(!result.explanation.is_empty());
}
