//! API helpers shared by vcheck services

pub mod auth;

pub use auth::{verify_api_key, ApiAuthError, API_KEY_HEADER};
