//! Engine Error Types

use thiserror::Error;

/// Errors that can occur in the engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Stream configuration error: {0}")]
    ConfigError(String),

    #[error("DSP error: {0}")]
    Dsp(#[from] triband_dsp::DspError),

    #[error("Invalid plugin state: {0}")]
    StateError(String),

    #[error("Failed to spawn thread: {0}")]
    ThreadSpawn(String),

    #[error("Refresh thread panicked")]
    ThreadPanicked,

    #[error("Refresh loop already stopped")]
    AlreadyStopped,
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
