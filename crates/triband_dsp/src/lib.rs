//! Triband DSP - Digital Signal Processing Module
//!
//! This crate provides the signal path of the Triband equalizer, including:
//! - Low cut / peak / high cut filter chain built from cascaded biquads
//! - Coefficient factory (RBJ peaking EQ, Butterworth cut cascades)
//! - Lock-free SPSC fifo for moving blocks between threads
//! - Per-channel sample collector feeding the analyzer
//! - FFT spectrum pipeline producing render paths
//! - Frequency response curve for the display
//!
//! # Architecture
//!
//! The DSP chain follows a strict "no allocation in audio callback" rule.
//! Filter coefficients are recomputed from a settings snapshot between
//! buffers and installed without resetting filter state. Everything that
//! crosses a thread boundary goes through a preallocated [`fifo`].

mod chain;
mod coefficients;
mod collector;
mod error;
mod fft;
mod fifo;
mod path;
mod processor;
mod response;
mod settings;
mod spectrum;

pub use chain::{CutFilter, FilterStage, MonoChain, RESPONSE_FLOOR_DB};
pub use coefficients::{
    decibels_to_gain, gain_to_decibels, make_high_cut_coefficients, make_low_cut_coefficients,
    make_peak_coefficients, CoefficientSet, CutCoefficients,
};
pub use collector::{channel_collector, Channel, ChannelBlocks, ChannelCollector, MAX_BLOCK_SIZE};
pub use error::DspError;
pub use fft::{FftDataGenerator, FftOrder};
pub use fifo::{fifo, fifo_with, FifoConsumer, FifoProducer, DEFAULT_FIFO_CAPACITY};
pub use path::{
    jmap, map_from_log10, map_to_log10, AnalyzerPathGenerator, Bounds, PathPoint, RenderPath,
};
pub use processor::{AudioProcessor, ProcessContext};
pub use response::{response_curve, write_response_curve, RESPONSE_MAX_DB, RESPONSE_MIN_DB};
pub use settings::{
    ChainSettings, Slope, HIGH_CUT_DEFAULT_HZ, LOW_CUT_DEFAULT_HZ, MAX_CUT_STAGES,
    MAX_FREQUENCY_HZ, MIN_FREQUENCY_HZ, PEAK_DEFAULT_HZ, PEAK_GAIN_MAX_DB, PEAK_GAIN_MIN_DB,
    PEAK_QUALITY_DEFAULT, PEAK_QUALITY_MAX, PEAK_QUALITY_MIN,
};
pub use spectrum::{PathProducer, ANALYZER_NEGATIVE_INFINITY_DB};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_exports() {
        // Verify all public types are accessible
        let settings = ChainSettings::default();
        let mut chain = MonoChain::new();
        chain.update_filters(&settings, 48000.0);
        let _curve = response_curve(&chain, 48000.0, Bounds::default());
        let (_collector, blocks) = channel_collector(Channel::Left, DEFAULT_FIFO_CAPACITY);
        let _producer = PathProducer::new(blocks, FftOrder::default());
    }
}
