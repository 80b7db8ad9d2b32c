//! DSP Error Types

use thiserror::Error;

/// Errors that can occur while setting up DSP components
///
/// Nothing on the per-sample path returns these; they only come out of
/// preparation and configuration calls made off the audio thread.
#[derive(Error, Debug)]
pub enum DspError {
    #[error("Sample rate must be positive and finite, got {0}")]
    InvalidSampleRate(f64),

    #[error("Block size must be non-zero")]
    InvalidBlockSize,

    #[error("Unsupported FFT size {0} (expected 2048, 4096 or 8192)")]
    InvalidFftOrder(usize),
}
