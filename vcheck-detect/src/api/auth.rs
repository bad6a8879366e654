//! API key middleware
//!
//! Applied to protected routes only; `/api/health` and `/` are public.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;
use vcheck_common::api::{verify_api_key, API_KEY_HEADER};

use crate::error::ApiError;
use crate::AppState;

/// Reject requests without a valid `x-api-key` header
///
/// Missing (or blank) key → 401, wrong key → 403.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    if let Err(e) = verify_api_key(provided, &state.api_key) {
        warn!(
            path = %request.uri().path(),
            reason = ?e,
            "Rejected unauthenticated request"
        );
        return Err(ApiError::Auth(e));
    }

    Ok(next.run(request).await)
}
