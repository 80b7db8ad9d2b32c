//! Response Display
//!
//! Display-thread state: a private copy of the filter chain for drawing the
//! response curve, plus the two analyzer path producers. Nothing here is
//! shared with the audio thread except the fifo ends inside the producers.

use std::sync::Arc;

use triband_dsp::{
    response_curve, write_response_curve, Bounds, Channel, FftOrder, MonoChain, PathProducer,
    RenderPath,
};

use crate::config::AnalyzerConfig;
use crate::params::{ChangeFlag, ChangeNotifier, ListenerId, ParameterStore};
use crate::processor::AnalyzerTaps;

pub struct ResponseDisplay {
    params: Arc<ParameterStore>,
    chain: MonoChain,
    change_flag: ChangeFlag,
    listener: ListenerId,
    left: PathProducer,
    right: PathProducer,
    sample_rate: f64,
    response: RenderPath,
    response_bounds: Option<Bounds>,
}

impl ResponseDisplay {
    /// Build the display and subscribe it to parameter changes
    ///
    /// The subscription ends when the display is dropped.
    pub fn new(params: Arc<ParameterStore>, taps: AnalyzerTaps, config: &AnalyzerConfig) -> Self {
        let change_flag = ChangeFlag::new();
        let listener = params.add_listener(change_flag.notifier());
        let producer = |blocks| {
            PathProducer::with_options(
                blocks,
                config.fft_order,
                config.negative_infinity_db,
                config.fifo_capacity,
            )
        };

        let mut display = Self {
            left: producer(taps.left),
            right: producer(taps.right),
            params,
            chain: MonoChain::new(),
            change_flag,
            listener,
            sample_rate: 48000.0,
            response: RenderPath::new(),
            response_bounds: None,
        };
        display.update_chain();
        display
    }

    /// Track the stream's sample rate; the next tick rebuilds the chain
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        if sample_rate > 0.0 && sample_rate.is_finite() && sample_rate != self.sample_rate {
            self.sample_rate = sample_rate;
            self.change_flag.notifier().notify();
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Handle for anything else that should force a rebuild
    pub fn notifier(&self) -> ChangeNotifier {
        self.change_flag.notifier()
    }

    pub fn set_fft_order(&mut self, order: FftOrder) {
        self.left.set_fft_order(order);
        self.right.set_fft_order(order);
    }

    /// One refresh: run the analyzer, rebuild the chain if parameters moved
    ///
    /// Returns `true` when something visible changed and a repaint is due.
    pub fn tick(&mut self, bounds: Bounds) -> bool {
        let mut repaint = false;

        if self.params.analyzer_enabled() {
            repaint |= self.left.process(bounds, self.sample_rate);
            repaint |= self.right.process(bounds, self.sample_rate);
        } else {
            self.left.discard_pending();
            self.right.discard_pending();
            // A hidden analyzer must not leave its last spectrum on screen
            repaint |= self.left.clear_path();
            repaint |= self.right.clear_path();
        }

        let changed = self.change_flag.take();
        if changed {
            self.update_chain();
        }

        if changed || self.response_bounds != Some(bounds) {
            write_response_curve(&self.chain, self.sample_rate, bounds, &mut self.response);
            self.response_bounds = Some(bounds);
            repaint = true;
        }

        repaint
    }

    fn update_chain(&mut self) {
        let settings = self.params.chain_settings();
        self.chain.update_filters(&settings, self.sample_rate);
    }

    /// Fresh response curve for arbitrary bounds
    pub fn response_curve(&self, bounds: Bounds) -> RenderPath {
        response_curve(&self.chain, self.sample_rate, bounds)
    }

    /// Response curve as of the last tick
    pub fn current_response(&self) -> &RenderPath {
        &self.response
    }

    pub fn left_path(&self) -> &RenderPath {
        self.left.path()
    }

    pub fn right_path(&self) -> &RenderPath {
        self.right.path()
    }

    pub fn dropped_blocks(&self, channel: Channel) -> u64 {
        match channel {
            Channel::Left => self.left.dropped_blocks(),
            Channel::Right => self.right.dropped_blocks(),
        }
    }

    pub fn chain(&self) -> &MonoChain {
        &self.chain
    }

    pub fn analyzer_enabled(&self) -> bool {
        self.params.analyzer_enabled()
    }
}

impl Drop for ResponseDisplay {
    fn drop(&mut self) {
        self.params.remove_listener(self.listener);
    }
}
