//! Configuration for vcheck-detect
//!
//! **Purpose:** every threshold, window size and weight used by the engine is
//! data here, so it can be tuned from `detect.toml` without touching code.
//!
//! Any table may be omitted from the TOML file; omitted fields take the
//! compiled defaults below.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use vcheck_common::config::{load_toml_config, LoggingConfig};
use vcheck_common::{Error, Result};

use crate::fusion::FusionWeights;
use crate::types::LanguageProfile;

/// Module name used for config file resolution
pub const MODULE_NAME: &str = "detect";

/// Development key used when neither the config file nor the environment sets one
pub const DEFAULT_API_KEY: &str = "sk_test_123456789";

/// Languages accepted at the HTTP boundary
pub const DEFAULT_LANGUAGES: [&str; 5] = ["Tamil", "English", "Hindi", "Malayalam", "Telugu"];

/// Top-level service configuration (`detect.toml`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Shared secret expected in the `x-api-key` header
    pub api_key: String,
    pub supported_languages: Vec<String>,
    /// Maximum accepted request body, in bytes
    pub max_body_bytes: usize,
    pub logging: LoggingConfig,
    pub detector: DetectorConfig,

    /// File this configuration was loaded from (None = compiled defaults)
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            api_key: DEFAULT_API_KEY.to_string(),
            supported_languages: DEFAULT_LANGUAGES.iter().map(|l| l.to_string()).collect(),
            max_body_bytes: 25 * 1024 * 1024,
            logging: LoggingConfig::default(),
            detector: DetectorConfig::default(),
            source: None,
        }
    }
}

impl ServiceConfig {
    /// Load from `path`, falling back to defaults when the file is missing
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => match load_toml_config::<ServiceConfig>(path)? {
                Some(mut loaded) => {
                    loaded.source = Some(path.to_path_buf());
                    loaded
                }
                None => ServiceConfig::default(),
            },
            None => ServiceConfig::default(),
        };

        config.detector.validate()?;
        if config.api_key.trim().is_empty() {
            return Err(Error::Config("api_key must not be empty".to_string()));
        }
        config.api_key = config.api_key.trim().to_string();

        Ok(config)
    }

    /// True while the publicly known development key is in effect
    pub fn uses_default_api_key(&self) -> bool {
        self.api_key == DEFAULT_API_KEY
    }
}

/// Engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub decoder: DecoderConfig,
    pub pitch: PitchConfig,
    pub spectral: SpectralConfig,
    pub temporal: TemporalConfig,
    pub statistical: StatisticalConfig,
    pub harmonic: HarmonicConfig,
    pub fusion: FusionConfig,
    pub languages: LanguageTable,
}

impl DetectorConfig {
    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        self.fusion
            .weights
            .validate()
            .map_err(Error::Config)?;

        if !(0.0..=1.0).contains(&self.fusion.decision_threshold) {
            return Err(Error::Config(format!(
                "fusion.decision_threshold must be within [0, 1], got {}",
                self.fusion.decision_threshold
            )));
        }

        let d = &self.decoder;
        if d.analysis_sample_rate < 8000 {
            return Err(Error::Config(format!(
                "decoder.analysis_sample_rate must be at least 8000 Hz, got {}",
                d.analysis_sample_rate
            )));
        }
        if d.supported_format.trim().is_empty() {
            return Err(Error::Config("decoder.supported_format must not be empty".to_string()));
        }
        if d.min_duration_seconds <= 0.0 || d.max_duration_seconds < d.min_duration_seconds {
            return Err(Error::Config(format!(
                "decoder duration bounds invalid: min {} s, max {} s",
                d.min_duration_seconds, d.max_duration_seconds
            )));
        }

        // (name, lower, upper): each band must be non-empty
        let bands = [
            ("pitch.cv", self.pitch.cv_ai, self.pitch.cv_human),
            ("pitch.f0", self.pitch.min_f0_hz, self.pitch.max_f0_hz),
            ("spectral.flatness", self.spectral.flatness_min, self.spectral.flatness_max),
            ("spectral.rolloff", self.spectral.rolloff_min_hz, self.spectral.rolloff_max_hz),
            ("spectral.centroid_cv", self.spectral.centroid_cv_ai, self.spectral.centroid_cv_human),
            ("temporal.energy_cv", self.temporal.energy_cv_ai, self.temporal.energy_cv_human),
            ("temporal.zcr_cv", self.temporal.zcr_cv_ai, self.temporal.zcr_cv_human),
            ("statistical.kurtosis", self.statistical.kurtosis_min, self.statistical.kurtosis_max),
            ("statistical.skew", self.statistical.skew_human, self.statistical.skew_ai),
            ("statistical.occupancy", self.statistical.occupancy_ai, self.statistical.occupancy_human),
            ("harmonic.f0", self.harmonic.min_f0_hz, self.harmonic.max_f0_hz),
            ("harmonic.hnr_db", self.harmonic.hnr_human_db, self.harmonic.hnr_ai_db),
            ("harmonic.ratio", self.harmonic.ratio_human, self.harmonic.ratio_ai),
            ("harmonic.spacing_cv", self.harmonic.spacing_cv_ai, self.harmonic.spacing_cv_human),
        ];
        for (name, lower, upper) in bands {
            if !(upper > lower) {
                return Err(Error::Config(format!(
                    "{} band is inverted or empty (lower {}, upper {})",
                    name, lower, upper
                )));
            }
        }

        let sizes = [
            ("spectral", self.spectral.frame_size, self.spectral.hop_size),
            ("harmonic", self.harmonic.frame_size, self.harmonic.hop_size),
        ];
        for (name, frame, hop) in sizes {
            if frame < 64 || hop == 0 || hop > frame {
                return Err(Error::Config(format!(
                    "{} frame size {} / hop {} invalid",
                    name, frame, hop
                )));
            }
        }
        if self.pitch.hop_seconds <= 0.0 || self.pitch.window_seconds < self.pitch.hop_seconds {
            return Err(Error::Config("pitch window/hop invalid".to_string()));
        }
        if self.temporal.hop_seconds <= 0.0 || self.temporal.frame_seconds < self.temporal.hop_seconds {
            return Err(Error::Config("temporal frame/hop invalid".to_string()));
        }

        for (name, profile) in &self.languages.profiles {
            if profile.pitch <= 0.0 || profile.spectral <= 0.0 || profile.temporal <= 0.0 {
                return Err(Error::Config(format!(
                    "language profile '{}' has a non-positive multiplier",
                    name
                )));
            }
        }

        Ok(())
    }
}

/// Audio decoder settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// The one accepted declared container format (compared case-insensitively)
    pub supported_format: String,
    pub analysis_sample_rate: u32,
    pub min_duration_seconds: f64,
    /// Longer clips are truncated to this length, not rejected
    pub max_duration_seconds: f64,
    /// Clips whose peak amplitude is below this are treated as silent
    pub silence_peak_floor: f32,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            supported_format: "mp3".to_string(),
            analysis_sample_rate: 16000,
            min_duration_seconds: 0.3,
            max_duration_seconds: 300.0,
            silence_peak_floor: 1e-3,
        }
    }
}

/// Pitch regularity settings
///
/// Pitch contour CV at or below `cv_ai` scores 1.0; at or above `cv_human`
/// scores 0.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchConfig {
    pub window_seconds: f64,
    pub hop_seconds: f64,
    pub min_f0_hz: f64,
    pub max_f0_hz: f64,
    /// Minimum normalized autocorrelation for a window to count as voiced
    pub voicing_threshold: f64,
    pub min_voiced_windows: usize,
    pub cv_ai: f64,
    pub cv_human: f64,
    pub trigger_threshold: f64,
}

impl Default for PitchConfig {
    fn default() -> Self {
        Self {
            window_seconds: 0.04,
            hop_seconds: 0.01,
            min_f0_hz: 60.0,
            max_f0_hz: 400.0,
            voicing_threshold: 0.5,
            min_voiced_windows: 10,
            cv_ai: 0.02,
            cv_human: 0.06,
            trigger_threshold: 0.6,
        }
    }
}

/// Spectral signature settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectralConfig {
    pub frame_size: usize,
    pub hop_size: usize,
    /// Frames quieter than the loudest frame by more than this are ignored
    pub gate_db: f64,
    pub min_frames: usize,
    /// Expected human range of median spectral flatness
    pub flatness_min: f64,
    pub flatness_max: f64,
    /// Decades below `flatness_min` at which deviation saturates
    pub flatness_low_decades: f64,
    /// Distance above `flatness_max` at which deviation saturates
    pub flatness_high_width: f64,
    pub rolloff_fraction: f64,
    /// Expected human range of median rolloff frequency
    pub rolloff_min_hz: f64,
    pub rolloff_max_hz: f64,
    pub rolloff_low_width_hz: f64,
    pub rolloff_high_width_hz: f64,
    /// Centroid CV at or below this scores fully synthetic
    pub centroid_cv_ai: f64,
    /// Centroid CV at or above this scores fully human
    pub centroid_cv_human: f64,
    pub flatness_weight: f64,
    pub rolloff_weight: f64,
    pub centroid_weight: f64,
    pub trigger_threshold: f64,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            frame_size: 512,
            hop_size: 256,
            gate_db: -20.0,
            min_frames: 4,
            flatness_min: 0.005,
            flatness_max: 0.35,
            flatness_low_decades: 2.0,
            flatness_high_width: 0.3,
            rolloff_fraction: 0.85,
            rolloff_min_hz: 1000.0,
            rolloff_max_hz: 5500.0,
            rolloff_low_width_hz: 800.0,
            rolloff_high_width_hz: 1500.0,
            centroid_cv_ai: 0.05,
            centroid_cv_human: 0.25,
            flatness_weight: 0.4,
            rolloff_weight: 0.35,
            centroid_weight: 0.25,
            trigger_threshold: 0.6,
        }
    }
}

/// Temporal micro-variation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemporalConfig {
    pub frame_seconds: f64,
    pub hop_seconds: f64,
    pub min_frames: usize,
    /// Frames below this fraction of the loudest frame's RMS are "quiet"
    pub gap_rms_ratio: f64,
    /// Minimum run of quiet frames that counts as a pause
    pub min_gap_frames: usize,
    pub energy_cv_ai: f64,
    pub energy_cv_human: f64,
    pub zcr_cv_ai: f64,
    pub zcr_cv_human: f64,
    /// Pause-interval CV at or above this scores fully human
    pub pause_interval_cv_human: f64,
    /// Clips at least this long with no pause score fully synthetic
    pub pauseless_full_seconds: f64,
    /// Score when only one or two pauses are found
    pub few_pauses_score: f64,
    pub energy_weight: f64,
    pub zcr_weight: f64,
    pub pause_weight: f64,
    pub trigger_threshold: f64,
}

impl Default for TemporalConfig {
    fn default() -> Self {
        Self {
            frame_seconds: 0.02,
            hop_seconds: 0.01,
            min_frames: 10,
            gap_rms_ratio: 0.1,
            min_gap_frames: 5,
            energy_cv_ai: 0.1,
            energy_cv_human: 0.4,
            zcr_cv_ai: 0.1,
            zcr_cv_human: 0.3,
            pause_interval_cv_human: 0.25,
            pauseless_full_seconds: 2.0,
            few_pauses_score: 0.3,
            energy_weight: 0.4,
            zcr_weight: 0.25,
            pause_weight: 0.35,
            trigger_threshold: 0.6,
        }
    }
}

/// Statistical anomaly settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticalConfig {
    pub min_samples: usize,
    /// Natural excess-kurtosis envelope
    pub kurtosis_min: f64,
    pub kurtosis_max: f64,
    pub kurtosis_low_width: f64,
    pub kurtosis_high_width: f64,
    /// |skewness| at or below this is natural
    pub skew_human: f64,
    /// |skewness| at or above this scores fully anomalous
    pub skew_ai: f64,
    /// 16-bit code occupancy at or below this scores fully anomalous
    pub occupancy_ai: f64,
    /// 16-bit code occupancy at or above this is natural
    pub occupancy_human: f64,
    pub kurtosis_weight: f64,
    pub skew_weight: f64,
    pub quantization_weight: f64,
    pub trigger_threshold: f64,
}

impl Default for StatisticalConfig {
    fn default() -> Self {
        Self {
            min_samples: 1024,
            kurtosis_min: -0.8,
            kurtosis_max: 25.0,
            kurtosis_low_width: 0.7,
            kurtosis_high_width: 25.0,
            skew_human: 1.5,
            skew_ai: 3.0,
            occupancy_ai: 0.02,
            occupancy_human: 0.15,
            kurtosis_weight: 0.35,
            skew_weight: 0.2,
            quantization_weight: 0.45,
            trigger_threshold: 0.6,
        }
    }
}

/// Harmonic structure settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarmonicConfig {
    pub frame_size: usize,
    pub hop_size: usize,
    pub min_f0_hz: f64,
    pub max_f0_hz: f64,
    pub voicing_threshold: f64,
    pub min_voiced_frames: usize,
    /// Highest frequency considered for partials
    pub max_harmonic_hz: f64,
    /// Search radius (bins) around each expected partial
    pub peak_search_bins: usize,
    /// Half-width (bins) of the band credited to each partial
    pub partial_half_width_bins: usize,
    /// Partials weaker than the strongest by more than this are ignored for spacing
    pub partial_floor_db: f64,
    /// Harmonic-to-noise ratio at or below this is natural
    pub hnr_human_db: f64,
    /// Harmonic-to-noise ratio at or above this scores fully synthetic
    pub hnr_ai_db: f64,
    pub ratio_human: f64,
    pub ratio_ai: f64,
    pub spacing_cv_ai: f64,
    pub spacing_cv_human: f64,
    pub hnr_weight: f64,
    pub ratio_weight: f64,
    pub spacing_weight: f64,
    pub trigger_threshold: f64,
}

impl Default for HarmonicConfig {
    fn default() -> Self {
        Self {
            frame_size: 2048,
            hop_size: 1024,
            min_f0_hz: 60.0,
            max_f0_hz: 400.0,
            voicing_threshold: 0.5,
            min_voiced_frames: 2,
            max_harmonic_hz: 4000.0,
            peak_search_bins: 3,
            partial_half_width_bins: 2,
            partial_floor_db: -30.0,
            hnr_human_db: 12.0,
            hnr_ai_db: 25.0,
            ratio_human: 0.85,
            ratio_ai: 0.97,
            spacing_cv_ai: 0.005,
            spacing_cv_human: 0.02,
            hnr_weight: 0.4,
            ratio_weight: 0.35,
            spacing_weight: 0.25,
            trigger_threshold: 0.6,
        }
    }
}

/// Fusion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    pub weights: FusionWeights,
    /// Aggregate at or above this is labelled AI_GENERATED
    pub decision_threshold: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            weights: FusionWeights::default(),
            decision_threshold: 0.5,
        }
    }
}

/// Per-language threshold multipliers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageTable {
    pub profiles: BTreeMap<String, LanguageProfile>,
}

impl Default for LanguageTable {
    fn default() -> Self {
        let profile = |pitch| LanguageProfile {
            pitch,
            ..LanguageProfile::NEUTRAL
        };

        let profiles = [
            ("Tamil", profile(1.10)),
            ("English", profile(1.00)),
            ("Hindi", profile(1.05)),
            ("Malayalam", profile(1.10)),
            ("Telugu", profile(1.08)),
        ]
        .into_iter()
        .map(|(name, p)| (name.to_string(), p))
        .collect();

        Self { profiles }
    }
}

impl LanguageTable {
    /// Profile for `language` (case-insensitive); unknown or absent → neutral
    pub fn profile_for(&self, language: Option<&str>) -> LanguageProfile {
        let Some(language) = language.map(str::trim) else {
            return LanguageProfile::NEUTRAL;
        };

        self.profiles
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(language))
            .map(|(_, profile)| *profile)
            .unwrap_or(LanguageProfile::NEUTRAL)
    }
}
