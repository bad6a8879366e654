//! API key authentication
//!
//! Requests carry a shared secret in the `x-api-key` header. This module
//! contains ONLY pure functions; the HTTP middleware that extracts the header
//! lives in the service crate.
//!
//! Both the provided and the expected key are hashed with SHA-256 before
//! comparison, and the digests are compared without early exit, so the time
//! taken does not reveal how many leading bytes matched.

use sha2::{Digest, Sha256};

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Authentication error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiAuthError {
    /// No API key supplied (maps to 401)
    MissingKey,

    /// API key supplied but does not match (maps to 403)
    InvalidKey,
}

impl ApiAuthError {
    /// HTTP status code the boundary layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            ApiAuthError::MissingKey => 401,
            ApiAuthError::InvalidKey => 403,
        }
    }
}

impl std::fmt::Display for ApiAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiAuthError::MissingKey => write!(
                f,
                "API key is missing. Please provide {} header.",
                API_KEY_HEADER
            ),
            ApiAuthError::InvalidKey => write!(f, "Invalid API key or malformed request"),
        }
    }
}

impl std::error::Error for ApiAuthError {}

/// Verify a provided API key against the configured one
///
/// An empty (or whitespace-only) header value counts as missing.
pub fn verify_api_key(provided: Option<&str>, expected: &str) -> Result<(), ApiAuthError> {
    let provided = match provided.map(str::trim) {
        Some(key) if !key.is_empty() => key,
        _ => return Err(ApiAuthError::MissingKey),
    };

    let provided_digest = Sha256::digest(provided.as_bytes());
    let expected_digest = Sha256::digest(expected.as_bytes());

    let difference = provided_digest
        .iter()
        .zip(expected_digest.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b));

    if difference == 0 {
        Ok(())
    } else {
        Err(ApiAuthError::InvalidKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_key_accepted() {
        assert_eq!(verify_api_key(Some("sk_live_abc"), "sk_live_abc"), Ok(()));
    }

    #[test]
    fn test_missing_key_rejected_with_401() {
        let err = verify_api_key(None, "secret").unwrap_err();
        assert_eq!(err, ApiAuthError::MissingKey);
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        assert_eq!(
            verify_api_key(Some("   "), "secret"),
            Err(ApiAuthError::MissingKey)
        );
    }

    #[test]
    fn test_wrong_key_rejected_with_403() {
        let err = verify_api_key(Some("secreT"), "secret").unwrap_err();
        assert_eq!(err, ApiAuthError::InvalidKey);
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn test_prefix_of_key_rejected() {
        assert_eq!(
            verify_api_key(Some("sec"), "secret"),
            Err(ApiAuthError::InvalidKey)
        );
    }

    #[test]
    fn test_error_messages() {
        assert!(ApiAuthError::MissingKey.to_string().contains("x-api-key"));
        assert_eq!(
            ApiAuthError::InvalidKey.to_string(),
            "Invalid API key or malformed request"
        );
    }
}
