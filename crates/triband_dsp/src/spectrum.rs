//! Spectrum Path Producer
//!
//! Display-thread side of one analyzer channel:
//!
//! ```text
//! ChannelBlocks ──▶ sliding mono window ──▶ FftDataGenerator ──▶ AnalyzerPathGenerator ──▶ path()
//!   (blocks)          (fft_size samples)      (dB spectra)          (polylines)            (newest)
//! ```
//!
//! Each `process` call drains everything the collector has queued since the
//! last tick, so the displayed path always reflects the latest audio.

use crate::collector::{Channel, ChannelBlocks, MAX_BLOCK_SIZE};
use crate::fft::{FftDataGenerator, FftOrder};
use crate::fifo::DEFAULT_FIFO_CAPACITY;
use crate::path::{AnalyzerPathGenerator, Bounds, RenderPath};

/// Level mapped to the bottom edge of the analyzer
pub const ANALYZER_NEGATIVE_INFINITY_DB: f32 = -48.0;

pub struct PathProducer {
    blocks: ChannelBlocks,
    incoming: Vec<f32>,
    mono_buffer: Vec<f32>,
    fft_data: Vec<f32>,
    fft_generator: FftDataGenerator,
    path_generator: AnalyzerPathGenerator,
    path: RenderPath,
    negative_infinity: f32,
}

impl PathProducer {
    pub fn new(blocks: ChannelBlocks, order: FftOrder) -> Self {
        Self::with_options(blocks, order, ANALYZER_NEGATIVE_INFINITY_DB, DEFAULT_FIFO_CAPACITY)
    }

    /// Like [`new`](Self::new) with a custom bottom-edge level and depth for
    /// the spectrum and path fifos
    pub fn with_options(
        blocks: ChannelBlocks,
        order: FftOrder,
        negative_infinity: f32,
        capacity: usize,
    ) -> Self {
        Self {
            blocks,
            incoming: Vec::with_capacity(MAX_BLOCK_SIZE),
            mono_buffer: vec![0.0; order.fft_size()],
            fft_data: vec![0.0; order.num_bins()],
            fft_generator: FftDataGenerator::new(order, capacity),
            path_generator: AnalyzerPathGenerator::new(capacity),
            path: RenderPath::new(),
            negative_infinity,
        }
    }

    /// Change the analysis window, clearing the sliding buffer
    pub fn set_fft_order(&mut self, order: FftOrder) {
        if order == self.fft_generator.order() {
            return;
        }
        self.fft_generator.change_order(order);
        self.mono_buffer = vec![0.0; order.fft_size()];
        self.fft_data = vec![0.0; order.num_bins()];
    }

    /// Drain queued blocks through the FFT into a fresh path
    ///
    /// Returns `true` when [`path`](Self::path) was replaced.
    pub fn process(&mut self, bounds: Bounds, sample_rate: f64) -> bool {
        while self.blocks.pull_block(&mut self.incoming) {
            slide_window(&mut self.mono_buffer, &self.incoming);
            // A full FFT fifo only means the display is behind; the newest
            // spectra still win below.
            let _ = self
                .fft_generator
                .produce_fft_data(&self.mono_buffer, self.negative_infinity);
        }

        let fft_size = self.fft_generator.fft_size();
        let bin_width = (sample_rate / fft_size as f64) as f32;

        while self.fft_generator.pull_fft_data(&mut self.fft_data) {
            let _ = self.path_generator.generate_path(
                &self.fft_data,
                bounds,
                fft_size,
                bin_width,
                self.negative_infinity,
            );
        }

        let mut updated = false;
        while self.path_generator.pull_path(&mut self.path) {
            updated = true;
        }
        updated
    }

    /// Throw away queued blocks without analyzing them
    ///
    /// Keeps the collector from overflowing while the analyzer is switched off.
    pub fn discard_pending(&mut self) -> usize {
        let mut discarded = 0;
        while self.blocks.pull_block(&mut self.incoming) {
            discarded += 1;
        }
        discarded
    }

    /// Forget the last path, e.g. while the analyzer is hidden
    ///
    /// Returns `true` if there was anything to forget.
    pub fn clear_path(&mut self) -> bool {
        let had_points = !self.path.is_empty();
        self.path.clear();
        had_points
    }

    /// Newest analyzer path (empty until the first full block arrives)
    pub fn path(&self) -> &RenderPath {
        &self.path
    }

    pub fn channel(&self) -> Channel {
        self.blocks.channel()
    }

    /// Total blocks the collector had to drop
    pub fn dropped_blocks(&self) -> u64 {
        self.blocks.dropped_blocks()
    }

    pub fn fft_order(&self) -> FftOrder {
        self.fft_generator.order()
    }

    /// Depth of the internal spectrum and path fifos
    pub fn fifo_capacity(&self) -> usize {
        self.path_generator.capacity()
    }
}

/// Shift `window` left by `block.len()` and append `block` at the end
///
/// A block at least as long as the window replaces it with the block's tail.
fn slide_window(window: &mut [f32], block: &[f32]) {
    let size = window.len();
    if block.len() >= size {
        window.copy_from_slice(&block[block.len() - size..]);
        return;
    }

    let keep = size - block.len();
    window.copy_within(block.len().., 0);
    window[keep..].copy_from_slice(block);
}
