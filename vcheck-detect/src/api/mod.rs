//! HTTP API handlers for vcheck-detect
//!
//! Thin boundary around the engine: authentication, request validation,
//! base64 decoding and response shaping. No analysis logic lives here.

pub mod auth;
pub mod health;
pub mod voice_detection;

pub use auth::require_api_key;
pub use health::health_routes;
pub use voice_detection::voice_detection_routes;
