//! Voice detection endpoint
//!
//! POST /api/voice-detection
//!
//! Request: `{ "language": "...", "audioFormat": "mp3", "audioBase64": "..." }`
//! Response: `{ "status": "success", "language", "classification",
//! "confidenceScore", "explanation" }`

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::engine::AnalysisRequest;
use crate::error::{ApiError, ApiResult};
use crate::types::Label;
use crate::AppState;

fn default_format() -> String {
    "mp3".to_string()
}

/// Voice detection request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceDetectionRequest {
    pub language: String,
    #[serde(default = "default_format")]
    pub audio_format: String,
    pub audio_base64: String,
}

/// Voice detection response body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceDetectionResponse {
    pub status: String,
    pub language: String,
    pub classification: Label,
    /// Confidence in `classification`, rounded to two decimals
    pub confidence_score: f64,
    pub explanation: String,
}

/// Round to two decimal places for presentation
fn round_confidence(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// POST /api/voice-detection
pub async fn voice_detection(
    State(state): State<AppState>,
    payload: Result<Json<VoiceDetectionRequest>, JsonRejection>,
) -> ApiResult<Json<VoiceDetectionResponse>> {
    let result = detect(&state, payload).await;

    if let Err(e) = &result {
        warn!(
            status = e.status_code().as_u16(),
            error = %e,
            "Voice detection request rejected"
        );
    }

    result
}

async fn detect(
    state: &AppState,
    payload: Result<Json<VoiceDetectionRequest>, JsonRejection>,
) -> ApiResult<Json<VoiceDetectionResponse>> {
    let Json(request) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let language = state.canonical_language(&request.language).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "Unsupported language '{}'. Supported: {}",
            request.language,
            state.supported_languages.join(", ")
        ))
    })?;

    let encoded = request.audio_base64.trim();
    if encoded.is_empty() {
        return Err(ApiError::BadRequest("audioBase64 must not be empty".to_string()));
    }
    let audio = STANDARD.decode(encoded).map_err(|e| {
        warn!(error = %e, "Rejected malformed base64 payload");
        ApiError::BadRequest(format!("audioBase64 is not valid base64: {}", e))
    })?;

    info!(
        language = %language,
        audio_format = %request.audio_format,
        bytes = audio.len(),
        "Voice detection request"
    );

    let result = state
        .analyzer
        .analyze_async(AnalysisRequest::new(audio, request.audio_format, Some(language.clone())))
        .await?;

    Ok(Json(VoiceDetectionResponse {
        status: "success".to_string(),
        language,
        classification: result.label,
        confidence_score: round_confidence(result.confidence),
        explanation: result.explanation,
    }))
}

/// Build voice detection routes
pub fn voice_detection_routes() -> Router<AppState> {
    Router::new().route("/api/voice-detection", post(voice_detection))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_confidence() {
        assert_eq!(round_confidence(0.8765), 0.88);
        assert_eq!(round_confidence(0.5), 0.5);
        assert_eq!(round_confidence(1.0), 1.0);
        assert_eq!(round_confidence(0.004), 0.0);
    }

    #[test]
    fn test_request_defaults_format() {
        let request: VoiceDetectionRequest =
            serde_json::from_str(r#"{"language":"Tamil","audioBase64":"AAAA"}"#).unwrap();
        assert_eq!(request.audio_format, "mp3");
        assert_eq!(request.language, "Tamil");
    }

    #[test]
    fn test_response_shape() {
        let response = VoiceDetectionResponse {
            status: "success".to_string(),
            language: "English".to_string(),
            classification: Label::AiGenerated,
            confidence_score: 0.91,
            explanation: "Detected AI indicators: unnatural pitch consistency".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["classification"], "AI_GENERATED");
        assert_eq!(json["confidenceScore"], 0.91);
        assert_eq!(json["status"], "success");
    }
}
