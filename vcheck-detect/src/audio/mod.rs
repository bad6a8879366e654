//! Audio input: decoding, resampling and shared DSP helpers

pub mod decoder;
pub mod dsp;
pub mod resampler;

pub use decoder::{decode, sniff_container, Container};
pub use resampler::resample_mono;
