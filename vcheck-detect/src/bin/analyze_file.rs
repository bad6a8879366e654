//! Local file analysis utility
//!
//! Classifies one audio file and prints the full result, including the
//! per-indicator scores, as JSON.
//!
//! **Usage:**
//! ```bash
//! analyze-file <PATH> [--language English] [--format mp3] [--config <file>]
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use vcheck_common::config::resolve_config_path;
use vcheck_detect::config::{ServiceConfig, MODULE_NAME};
use vcheck_detect::{AnalysisRequest, VoiceAnalyzer};

/// Classify a local audio file
#[derive(Parser, Debug)]
#[command(name = "analyze-file")]
#[command(about = "Classify an audio file as AI_GENERATED or HUMAN")]
struct Args {
    /// Audio file to analyze
    path: PathBuf,

    /// Declared language (selects threshold normalization)
    #[arg(short, long, default_value = "English")]
    language: String,

    /// Declared container format
    #[arg(short, long, default_value = "mp3")]
    format: String,

    /// Path to detect.toml
    #[arg(short, long, env = "VCHECK_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref(), "VCHECK_CONFIG", MODULE_NAME);
    let config = ServiceConfig::load(config_path.as_deref()).context("Failed to load configuration")?;
    let analyzer = VoiceAnalyzer::new(config.detector).context("Invalid detector configuration")?;

    let audio = std::fs::read(&args.path).with_context(|| format!("Failed to read {}", args.path.display()))?;
    info!(path = %args.path.display(), bytes = audio.len(), "Analyzing file");

    let request = AnalysisRequest::new(audio, args.format, Some(args.language));
    let result = analyzer
        .analyze(&request)
        .with_context(|| format!("Analysis of {} failed", args.path.display()))?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
