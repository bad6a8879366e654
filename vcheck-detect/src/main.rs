//! vcheck-detect - Voice Authenticity Service
//!
//! Classifies a short spoken clip as AI_GENERATED or HUMAN.
//!
//! **Endpoints:**
//! - `POST /api/voice-detection` (requires `x-api-key`)
//! - `GET /api/health`
//! - `GET /`

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use vcheck_common::config::{init_logging, resolve_config_path};
use vcheck_detect::config::{ServiceConfig, MODULE_NAME};
use vcheck_detect::{AppState, VoiceAnalyzer};

/// Command-line arguments for vcheck-detect
#[derive(Parser, Debug)]
#[command(name = "vcheck-detect")]
#[command(about = "Voice authenticity detection service")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "VCHECK_PORT")]
    port: Option<u16>,

    /// Address to bind (overrides the config file)
    #[arg(long, env = "VCHECK_HOST")]
    host: Option<String>,

    /// Path to detect.toml
    #[arg(short, long, env = "VCHECK_CONFIG")]
    config: Option<PathBuf>,

    /// Expected x-api-key value (overrides the config file)
    #[arg(long, env = "VCHECK_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref(), "VCHECK_CONFIG", MODULE_NAME);
    let mut config = ServiceConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(key) = args.api_key.filter(|k| !k.trim().is_empty()) {
        config.api_key = key.trim().to_string();
    }

    init_logging(&config.logging).context("Failed to initialize logging")?;

    info!("Starting vcheck-detect (Voice Authenticity) service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    match (&config.source, &config_path) {
        (Some(source), _) => info!("Configuration: {}", source.display()),
        (None, Some(path)) => warn!(
            "Config file not found at {}, using compiled defaults",
            path.display()
        ),
        (None, None) => warn!("No config directory available, using compiled defaults"),
    }
    if config.uses_default_api_key() {
        warn!("Using the built-in development API key; set api_key in the config file or VCHECK_API_KEY");
    }

    let analyzer = VoiceAnalyzer::new(config.detector.clone()).context("Invalid detector configuration")?;
    info!(
        analysis_sample_rate = config.detector.decoder.analysis_sample_rate,
        supported_format = %config.detector.decoder.supported_format,
        "Voice analyzer initialized"
    );

    let state = AppState::new(analyzer, &config);
    let app = vcheck_detect::build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/api/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
