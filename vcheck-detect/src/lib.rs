//! vcheck-detect library interface
//!
//! The voice-authenticity engine ([`engine::VoiceAnalyzer`]) plus the thin
//! HTTP boundary that serves it.

pub mod api;
pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod explanation;
pub mod extractors;
pub mod fusion;
pub mod types;

pub use crate::engine::{AnalysisRequest, VoiceAnalyzer};
pub use crate::error::{ApiError, ApiResult, DetectError, DetectResult};
pub use crate::types::{ClassificationResult, FeatureScore, Indicator, Label};

use axum::extract::DefaultBodyLimit;
use axum::{middleware, Router};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServiceConfig;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<VoiceAnalyzer>,
    /// Expected `x-api-key` value
    pub api_key: Arc<String>,
    /// Languages accepted in requests (canonical spelling)
    pub supported_languages: Arc<Vec<String>>,
    pub max_body_bytes: usize,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(analyzer: VoiceAnalyzer, config: &ServiceConfig) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            api_key: Arc::new(config.api_key.clone()),
            supported_languages: Arc::new(config.supported_languages.clone()),
            max_body_bytes: config.max_body_bytes,
            startup_time: Utc::now(),
        }
    }

    /// Canonical spelling of `language` if accepted (case-insensitive)
    pub fn canonical_language(&self, language: &str) -> Option<String> {
        let language = language.trim();
        self.supported_languages
            .iter()
            .find(|l| l.eq_ignore_ascii_case(language))
            .cloned()
    }
}

/// Build application router
///
/// `/api/voice-detection` sits behind the API-key middleware; health and
/// service info are public.
pub fn build_router(state: AppState) -> Router {
    let protected = api::voice_detection_routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        api::require_api_key,
    ));

    Router::new()
        .merge(api::health_routes())
        .merge(protected)
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
