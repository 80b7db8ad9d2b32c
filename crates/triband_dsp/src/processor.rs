//! Audio Processor Trait
//!
//! Interface the host-facing engine drives each channel's DSP through.

use crate::chain::MonoChain;
use crate::error::DspError;

/// Context passed to processors containing stream metadata
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessContext {
    pub sample_rate: f64,
    pub block_size: usize,
}

impl ProcessContext {
    pub fn new(sample_rate: f64, block_size: usize) -> Self {
        Self {
            sample_rate,
            block_size,
        }
    }

    /// Reject contexts no filter can be designed for
    pub fn validate(&self) -> Result<(), DspError> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(DspError::InvalidSampleRate(self.sample_rate));
        }
        if self.block_size == 0 {
            return Err(DspError::InvalidBlockSize);
        }
        Ok(())
    }
}

/// Trait for per-channel audio processors
///
/// # Real-time Safety Contract
///
/// Implementors MUST follow these rules in `process()`:
/// - NO heap allocations (no Vec::push, no Box::new, no String)
/// - NO syscalls (no file I/O, no network, no mutex locks)
/// - NO unbounded loops
/// - Constant or O(n) time complexity where n = buffer size
///
/// Violating these rules causes audio dropouts ("glitches").
pub trait AudioProcessor: Send {
    /// Process one channel's samples in place
    fn process(&mut self, buffer: &mut [f32], context: &ProcessContext);

    /// Reset internal state (delay lines, envelopes, etc.)
    fn reset(&mut self);

    /// Human-readable name for debugging/UI
    fn name(&self) -> &'static str;
}

impl AudioProcessor for MonoChain {
    fn process(&mut self, buffer: &mut [f32], _context: &ProcessContext) {
        MonoChain::process(self, buffer);
    }

    fn reset(&mut self) {
        MonoChain::reset(self);
    }

    fn name(&self) -> &'static str {
        "Three-Band EQ"
    }
}
