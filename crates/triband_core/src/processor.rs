//! Audio-Thread Processor
//!
//! Owns the stereo filter chains and the analyzer collectors. The host calls
//! [`EqProcessor::prepare`] before streaming and then
//! [`EqProcessor::process_block`] once per callback.
//!
//! ```text
//! ParameterStore ──snapshot──▶ update_filters ──▶ left/right MonoChain ──▶ collectors ──fifo──▶ AnalyzerTaps
//! ```

use std::sync::Arc;

use tracing::info;
use triband_dsp::{
    channel_collector, AudioProcessor, Channel, ChannelBlocks, ChannelCollector, MonoChain,
    ProcessContext, MAX_BLOCK_SIZE,
};

use crate::error::{EngineError, EngineResult};
use crate::params::ParameterStore;

/// Consumer ends of the two analyzer collectors, handed to the display
pub struct AnalyzerTaps {
    pub left: ChannelBlocks,
    pub right: ChannelBlocks,
}

pub struct EqProcessor {
    params: Arc<ParameterStore>,
    left_chain: MonoChain,
    right_chain: MonoChain,
    left_collector: ChannelCollector,
    right_collector: ChannelCollector,
    context: ProcessContext,
    prepared: bool,
}

impl EqProcessor {
    /// Create the processor and the analyzer taps fed by it
    ///
    /// `capacity` is the number of blocks each collector can queue.
    pub fn new(params: Arc<ParameterStore>, capacity: usize) -> (Self, AnalyzerTaps) {
        let (left_collector, left) = channel_collector(Channel::Left, capacity);
        let (right_collector, right) = channel_collector(Channel::Right, capacity);

        let processor = Self {
            params,
            left_chain: MonoChain::new(),
            right_chain: MonoChain::new(),
            left_collector,
            right_collector,
            context: ProcessContext::new(48000.0, 512),
            prepared: false,
        };

        (processor, AnalyzerTaps { left, right })
    }

    /// Size the collectors, clear filter state and install the current settings
    ///
    /// Allocates. Call from the host's prepare step, not from the callback.
    pub fn prepare(&mut self, sample_rate: f64, max_block_size: usize) -> EngineResult<()> {
        let context = ProcessContext::new(sample_rate, max_block_size);
        context.validate()?;
        if max_block_size > MAX_BLOCK_SIZE {
            return Err(EngineError::ConfigError(format!(
                "Block size {} exceeds maximum {}",
                max_block_size, MAX_BLOCK_SIZE
            )));
        }

        self.left_collector.prepare(max_block_size)?;
        self.right_collector.prepare(max_block_size)?;
        self.context = context;

        self.left_chain.reset();
        self.right_chain.reset();
        self.update_filters();
        self.prepared = true;

        info!(
            "Processor prepared: {} Hz, {} samples per block",
            sample_rate, max_block_size
        );
        Ok(())
    }

    /// Filter one block in place and feed the analyzer
    ///
    /// # Real-time Safety
    /// No allocations, no locks, no logging.
    pub fn process_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert!(self.prepared, "EqProcessor::process_block called before prepare");

        self.update_filters();

        AudioProcessor::process(&mut self.left_chain, left, &self.context);
        AudioProcessor::process(&mut self.right_chain, right, &self.context);

        self.left_collector.update(left);
        self.right_collector.update(right);
    }

    /// Snapshot the parameters and install fresh coefficients in both chains
    pub fn update_filters(&mut self) {
        let settings = self.params.chain_settings();
        self.left_chain.update_filters(&settings, self.context.sample_rate);
        self.right_chain.update_filters(&settings, self.context.sample_rate);
    }

    /// Clear every delay line
    pub fn reset(&mut self) {
        AudioProcessor::reset(&mut self.left_chain);
        AudioProcessor::reset(&mut self.right_chain);
    }

    pub fn sample_rate(&self) -> f64 {
        self.context.sample_rate
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn chain(&self, channel: Channel) -> &MonoChain {
        match channel {
            Channel::Left => &self.left_chain,
            Channel::Right => &self.right_chain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamId;

    fn sine(freq: f32, sample_rate: f32, len: usize, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate).sin() * amplitude)
            .collect()
    }

    #[test]
    fn test_prepare_rejects_bad_context() {
        let params = Arc::new(ParameterStore::new());
        let (mut processor, _taps) = EqProcessor::new(params, 8);

        assert!(matches!(processor.prepare(0.0, 512), Err(EngineError::Dsp(_))));
        assert!(matches!(processor.prepare(48000.0, 0), Err(EngineError::Dsp(_))));
        assert!(matches!(
            processor.prepare(48000.0, MAX_BLOCK_SIZE + 1),
            Err(EngineError::ConfigError(_))
        ));
        assert!(!processor.is_prepared());

        processor.prepare(44100.0, 256).unwrap();
        assert!(processor.is_prepared());
        assert_eq!(processor.sample_rate(), 44100.0);
    }

    #[test]
    fn test_block_feeds_both_taps() {
        let params = Arc::new(ParameterStore::new());
        let (mut processor, mut taps) = EqProcessor::new(params, 8);
        processor.prepare(48000.0, 256).unwrap();

        let mut left = sine(440.0, 48000.0, 256, 0.5);
        let mut right = sine(880.0, 48000.0, 256, 0.5);
        processor.process_block(&mut left, &mut right);

        let mut block = Vec::new();
        assert!(taps.left.pull_block(&mut block));
        assert_eq!(block, left, "Analyzer sees the filtered signal");
        assert!(taps.right.pull_block(&mut block));
        assert_eq!(block, right);
    }

    #[test]
    fn test_parameter_change_applies_next_block() {
        let params = Arc::new(ParameterStore::new());
        let (mut processor, _taps) = EqProcessor::new(Arc::clone(&params), 8);
        processor.prepare(48000.0, 512).unwrap();

        let flat_db = processor.chain(Channel::Left).magnitude_db(1000.0, 48000.0);
        assert!(flat_db.abs() < 0.1);

        params.set(ParamId::PeakFreq, 1000.0);
        params.set(ParamId::PeakGain, 12.0);

        let mut left = vec![0.0; 512];
        let mut right = vec![0.0; 512];
        processor.process_block(&mut left, &mut right);

        for channel in [Channel::Left, Channel::Right] {
            let db = processor.chain(channel).magnitude_db(1000.0, 48000.0);
            assert!((db - 12.0).abs() < 0.2, "{:?}: {}", channel, db);
        }
    }

    #[test]
    fn test_high_cut_attenuates_block() {
        let params = Arc::new(ParameterStore::new());
        params.set(ParamId::HighCutFreq, 300.0);
        params.set(ParamId::HighCutSlope, 3.0);
        let (mut processor, _taps) = EqProcessor::new(Arc::clone(&params), 30);
        processor.prepare(48000.0, 480).unwrap();

        let input = sine(6000.0, 48000.0, 4800, 0.5);
        let mut left = input.clone();
        let mut right = input;
        for (l, r) in left.chunks_mut(480).zip(right.chunks_mut(480)) {
            processor.process_block(l, r);
        }

        let tail_peak = left[2400..].iter().fold(0.0_f32, |m, s| m.max(s.abs()));
        assert!(tail_peak < 0.001, "6 kHz should be gone, got {}", tail_peak);
    }

    #[test]
    fn test_reset_clears_state() {
        let params = Arc::new(ParameterStore::new());
        let (mut processor, _taps) = EqProcessor::new(params, 8);
        processor.prepare(48000.0, 64).unwrap();

        let mut left = vec![1.0; 64];
        let mut right = vec![1.0; 64];
        processor.process_block(&mut left, &mut right);
        processor.reset();

        let mut silence_l = vec![0.0; 64];
        let mut silence_r = vec![0.0; 64];
        processor.process_block(&mut silence_l, &mut silence_r);
        assert!(silence_l.iter().all(|&s| s == 0.0), "No ringing after reset");
    }
}
