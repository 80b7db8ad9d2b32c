//! Engine and Stream Configuration

use serde::{Deserialize, Serialize};
use triband_dsp::{FftOrder, ANALYZER_NEGATIVE_INFINITY_DB, DEFAULT_FIFO_CAPACITY, MAX_BLOCK_SIZE};

use crate::error::{EngineError, EngineResult};

/// Audio stream configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Sample rate in Hz (e.g., 44100, 48000, 96000)
    pub sample_rate: u32,

    /// Largest block the host will hand to `process_block`, in samples
    pub block_size: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            block_size: 512,
        }
    }
}

impl StreamConfig {
    /// Calculate latency in milliseconds for this configuration
    pub fn latency_ms(&self) -> f32 {
        (self.block_size as f32 / self.sample_rate as f32) * 1000.0
    }

    /// Validate configuration
    pub fn validate(&self) -> EngineResult<()> {
        if self.sample_rate < 8000 || self.sample_rate > 192000 {
            return Err(EngineError::ConfigError(format!(
                "Invalid sample rate: {}",
                self.sample_rate
            )));
        }
        if self.block_size < 16 || self.block_size as usize > MAX_BLOCK_SIZE {
            return Err(EngineError::ConfigError(format!(
                "Invalid block size: {}",
                self.block_size
            )));
        }
        Ok(())
    }
}

/// Spectrum analyzer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub fft_order: FftOrder,

    /// Display refresh rate in Hz
    pub refresh_hz: u32,

    /// Blocks each collector can queue before dropping
    pub fifo_capacity: usize,

    /// Level drawn at the bottom of the analyzer (dB)
    pub negative_infinity_db: f32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fft_order: FftOrder::Order2048,
            refresh_hz: 60,
            fifo_capacity: DEFAULT_FIFO_CAPACITY,
            negative_infinity_db: ANALYZER_NEGATIVE_INFINITY_DB,
        }
    }
}

impl AnalyzerConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.refresh_hz == 0 || self.refresh_hz > 240 {
            return Err(EngineError::ConfigError(format!(
                "Invalid refresh rate: {} Hz",
                self.refresh_hz
            )));
        }
        if self.fifo_capacity == 0 {
            return Err(EngineError::ConfigError("Fifo capacity must be non-zero".into()));
        }
        if !self.negative_infinity_db.is_finite() || self.negative_infinity_db >= 0.0 {
            return Err(EngineError::ConfigError(format!(
                "Analyzer floor must be below 0 dB, got {}",
                self.negative_infinity_db
            )));
        }
        Ok(())
    }
}

/// Overall engine configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub stream: StreamConfig,
    pub analyzer: AnalyzerConfig,
}

impl EngineConfig {
    /// Create config optimized for low latency
    pub fn low_latency() -> Self {
        Self {
            stream: StreamConfig {
                sample_rate: 48000,
                block_size: 128, // ~2.6ms latency
            },
            analyzer: AnalyzerConfig {
                fft_order: FftOrder::Order2048,
                refresh_hz: 60,
                ..Default::default()
            },
        }
    }

    /// Create config favouring analyzer detail over latency
    pub fn high_resolution() -> Self {
        Self {
            stream: StreamConfig {
                sample_rate: 48000,
                block_size: 1024, // ~21ms latency
            },
            analyzer: AnalyzerConfig {
                fft_order: FftOrder::Order8192,
                refresh_hz: 30,
                ..Default::default()
            },
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        self.stream.validate()?;
        self.analyzer.validate()
    }
}
