//! Channel Sample Collector
//!
//! Turns the host's arbitrarily-sized callback buffers into fixed-size blocks
//! for the analyzer. One collector per channel; the audio thread owns the
//! [`ChannelCollector`] half, the analysis thread owns [`ChannelBlocks`].
//!
//! ```text
//! host buffer (n samples) ──▶ ChannelCollector ──fifo──▶ ChannelBlocks ──▶ PathProducer
//!                              (fixed block_size)
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::DspError;
use crate::fifo::{fifo_with, FifoConsumer, FifoProducer};

/// Largest block size that fifo slots reserve room for up front
///
/// Blocks up to this size never make the audio thread allocate, whatever
/// `prepare` is later called with.
pub const MAX_BLOCK_SIZE: usize = 8192;

/// Which side of the stereo pair a collector taps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    Left,
    Right,
}

/// Create a connected collector/consumer pair with `capacity` block slots
pub fn channel_collector(channel: Channel, capacity: usize) -> (ChannelCollector, ChannelBlocks) {
    let (producer, consumer) = fifo_with(capacity, || Vec::with_capacity(MAX_BLOCK_SIZE));
    let dropped = Arc::new(AtomicU64::new(0));

    (
        ChannelCollector {
            channel,
            buffer: Vec::new(),
            write_index: 0,
            prepared: false,
            blocks: producer,
            dropped: Arc::clone(&dropped),
        },
        ChannelBlocks {
            channel,
            blocks: consumer,
            dropped,
        },
    )
}

/// Audio-thread half: accumulates samples into fixed-size blocks
pub struct ChannelCollector {
    channel: Channel,
    buffer: Vec<f32>,
    write_index: usize,
    prepared: bool,
    blocks: FifoProducer<Vec<f32>>,
    dropped: Arc<AtomicU64>,
}

impl ChannelCollector {
    /// Size the fill buffer to `block_size` samples and reset the cursor
    ///
    /// Allocates. Call from the host's prepare step, not from the callback.
    pub fn prepare(&mut self, block_size: usize) -> Result<(), DspError> {
        if block_size == 0 {
            return Err(DspError::InvalidBlockSize);
        }

        self.prepared = false;
        self.buffer.clear();
        self.buffer.resize(block_size, 0.0);
        self.write_index = 0;
        self.prepared = true;
        Ok(())
    }

    /// Feed the next run of samples from this channel
    ///
    /// Every time the fill buffer reaches `block_size` it is pushed to the
    /// analyzer fifo. A full fifo drops the block and counts it.
    ///
    /// # Real-time Safety
    /// No allocations, no locks. O(n) in `samples.len()`.
    #[inline]
    pub fn update(&mut self, samples: &[f32]) {
        debug_assert!(self.prepared, "ChannelCollector::update called before prepare");
        if !self.prepared {
            return;
        }

        for &sample in samples {
            self.buffer[self.write_index] = sample;
            self.write_index += 1;

            if self.write_index == self.buffer.len() {
                if !self.blocks.push(&self.buffer) {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                }
                self.write_index = 0;
            }
        }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    /// Current block size (0 before `prepare`)
    pub fn block_size(&self) -> usize {
        self.buffer.len()
    }

    /// Number of completed blocks not yet pulled by the consumer
    pub fn available_blocks(&self) -> usize {
        self.blocks.available_for_read()
    }
}

/// Analysis-thread half: hands out completed blocks
pub struct ChannelBlocks {
    channel: Channel,
    blocks: FifoConsumer<Vec<f32>>,
    dropped: Arc<AtomicU64>,
}

impl ChannelBlocks {
    /// Copy the oldest completed block into `out`
    pub fn pull_block(&mut self, out: &mut Vec<f32>) -> bool {
        self.blocks.pull(out)
    }

    pub fn available_blocks(&self) -> usize {
        self.blocks.available_for_read()
    }

    /// Total blocks lost because the fifo was full
    pub fn dropped_blocks(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_multiple_yields_k_blocks() {
        let (mut collector, mut blocks) = channel_collector(Channel::Left, 30);
        collector.prepare(64).unwrap();

        let samples: Vec<f32> = (0..64 * 5).map(|i| i as f32).collect();
        collector.update(&samples);

        assert_eq!(blocks.available_blocks(), 5);

        let mut out = Vec::new();
        let mut joined = Vec::new();
        while blocks.pull_block(&mut out) {
            assert_eq!(out.len(), 64);
            joined.extend_from_slice(&out);
        }
        assert_eq!(joined, samples, "Blocks must concatenate back to the input");
    }

    #[test]
    fn test_arbitrary_host_buffer_sizes() {
        let (mut collector, mut blocks) = channel_collector(Channel::Right, 30);
        collector.prepare(100).unwrap();

        let samples: Vec<f32> = (0..300).map(|i| i as f32).collect();
        // Feed in uneven chunks
        for chunk in samples.chunks(37) {
            collector.update(chunk);
        }

        assert_eq!(blocks.available_blocks(), 3);
        let mut out = Vec::new();
        assert!(blocks.pull_block(&mut out));
        assert_eq!(out[0], 0.0);
        assert_eq!(out[99], 99.0);
    }

    #[test]
    fn test_partial_block_is_held_back() {
        let (mut collector, blocks) = channel_collector(Channel::Left, 30);
        collector.prepare(128).unwrap();
        collector.update(&[0.5; 127]);
        assert_eq!(blocks.available_blocks(), 0);
        collector.update(&[0.5]);
        assert_eq!(blocks.available_blocks(), 1);
    }

    #[test]
    fn test_overflow_counts_dropped_blocks() {
        let (mut collector, mut blocks) = channel_collector(Channel::Left, 2);
        collector.prepare(4).unwrap();

        let samples: Vec<f32> = (0..16).map(|i| i as f32).collect();
        collector.update(&samples);

        assert_eq!(blocks.available_blocks(), 2);
        assert_eq!(blocks.dropped_blocks(), 2);

        // The surviving blocks are the oldest ones, intact
        let mut out = Vec::new();
        assert!(blocks.pull_block(&mut out));
        assert_eq!(out, vec![0.0, 1.0, 2.0, 3.0]);
        assert!(blocks.pull_block(&mut out));
        assert_eq!(out, vec![4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_prepare_rejects_zero_block_size() {
        let (mut collector, _blocks) = channel_collector(Channel::Left, 4);
        assert!(collector.prepare(0).is_err());
        assert!(!collector.is_prepared());
    }

    #[test]
    fn test_reprepare_resets_cursor() {
        let (mut collector, mut blocks) = channel_collector(Channel::Left, 8);
        collector.prepare(8).unwrap();
        collector.update(&[1.0; 5]);

        collector.prepare(4).unwrap();
        assert_eq!(collector.block_size(), 4);
        collector.update(&[2.0; 4]);

        let mut out = Vec::new();
        assert!(blocks.pull_block(&mut out));
        assert_eq!(out, vec![2.0; 4]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "before prepare")]
    fn test_update_before_prepare_panics_in_debug() {
        let (mut collector, _blocks) = channel_collector(Channel::Left, 4);
        collector.update(&[0.0; 8]);
    }
}
