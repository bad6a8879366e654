//! # vcheck Common Library
//!
//! Shared code for the vcheck services including:
//! - Configuration file resolution and TOML loading
//! - Logging bootstrap
//! - API key verification (pure functions, no HTTP framework)
//! - Common error types

pub mod api;
pub mod config;
pub mod error;

pub use error::{Error, Result};
