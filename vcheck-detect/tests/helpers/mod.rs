//! Test Helper Utilities
//!
//! Shared utilities for testing vcheck-detect

#![allow(dead_code)]

pub mod audio_generator;

pub use audio_generator::{harmonic_tone, silence, speech_like, wav_bytes, TEST_SAMPLE_RATE};
