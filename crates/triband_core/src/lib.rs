//! Triband Core - Engine
//!
//! This crate wires the DSP building blocks into the three execution
//! contexts of the equalizer:
//! - Parameter store shared by host, UI and audio thread
//! - Audio-thread processor (filter chains + analyzer collectors)
//! - Display-thread response curve and spectrum paths
//! - Fixed-rate refresh loop delivering frames to a renderer
//! - Persistent plugin state
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Host / UI (control)                       │
//! │      ParameterStore::set ──notify──▶ ChangeFlag             │
//! └─────────────────────────────────────────────────────────────┘
//!            │ atomic snapshot                │ test-and-clear
//!            ▼                                ▼
//! ┌───────────────────────────┐    ┌───────────────────────────┐
//! │       Audio Thread        │    │      Refresh Thread       │
//! │ EqProcessor               │    │ ResponseDisplay           │
//! │  MonoChain L/R            │    │  MonoChain (own copy)     │
//! │  ChannelCollector L/R ────┼fifo┼▶ PathProducer L/R        │
//! │ (Zero allocation here)    │    │                           │
//! └───────────────────────────┘    └─────────────┬─────────────┘
//!                                                │ crossbeam-channel
//!                                                ▼
//!                                         Event::Frame
//! ```

mod config;
mod display;
mod error;
mod message;
mod params;
mod processor;
mod refresh;
mod settings;

pub use config::{AnalyzerConfig, EngineConfig, StreamConfig};
pub use display::ResponseDisplay;
pub use error::{EngineError, EngineResult};
pub use message::Event;
pub use params::{ChangeFlag, ChangeNotifier, ListenerId, ParamId, ParamRange, ParameterStore};
pub use processor::{AnalyzerTaps, EqProcessor};
pub use refresh::RefreshLoop;
pub use settings::{PluginState, STATE_VERSION};

// Re-export DSP types for convenience
pub use triband_dsp::{Bounds, Channel, ChainSettings, FftOrder, MonoChain, RenderPath, Slope};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_crate_exports() {
        // Verify public API is accessible
        let config = EngineConfig::default();
        let params = Arc::new(ParameterStore::new());
        let (_processor, taps) = EqProcessor::new(Arc::clone(&params), config.analyzer.fifo_capacity);
        let _display = ResponseDisplay::new(params, taps, &config.analyzer);
    }
}
