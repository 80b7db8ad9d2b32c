//! FFT Data Generator
//!
//! Turns one window of mono audio into a dB magnitude spectrum for the
//! analyzer display. Runs on the display thread, never in the audio callback.
//!
//! # Pipeline
//!
//! ```text
//! audio[fft_size] ─▶ × Blackman-Harris ─▶ rustfft ─▶ |X[k]|, k < N/2 ─▶ ÷ N/2 ─▶ dB ─▶ fifo
//! ```
//!
//! The window is normalized to unit mean, so a full-scale sine centred on a
//! bin reads close to 0 dB.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use serde::{Deserialize, Serialize};

use crate::coefficients::gain_to_decibels;
use crate::error::DspError;
use crate::fifo::{fifo, FifoConsumer, FifoProducer};

/// Analysis window length
///
/// 2048 samples at 48kHz = ~42ms window, ~23Hz resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FftOrder {
    #[default]
    Order2048,
    Order4096,
    Order8192,
}

impl FftOrder {
    pub const ALL: [FftOrder; 3] = [FftOrder::Order2048, FftOrder::Order4096, FftOrder::Order8192];

    /// Power-of-two exponent: 11, 12 or 13
    pub fn exponent(self) -> u32 {
        match self {
            FftOrder::Order2048 => 11,
            FftOrder::Order4096 => 12,
            FftOrder::Order8192 => 13,
        }
    }

    pub fn fft_size(self) -> usize {
        1 << self.exponent()
    }

    /// Number of meaningful output bins (`fft_size / 2`)
    pub fn num_bins(self) -> usize {
        self.fft_size() / 2
    }
}

impl TryFrom<usize> for FftOrder {
    type Error = DspError;

    fn try_from(fft_size: usize) -> Result<Self, Self::Error> {
        FftOrder::ALL
            .into_iter()
            .find(|order| order.fft_size() == fft_size)
            .ok_or(DspError::InvalidFftOrder(fft_size))
    }
}

/// 4-term Blackman-Harris window scaled so its mean is 1
fn blackman_harris_window(size: usize) -> Vec<f32> {
    const A0: f64 = 0.35875;
    const A1: f64 = 0.48829;
    const A2: f64 = 0.14128;
    const A3: f64 = 0.01168;

    let denominator = (size.max(2) - 1) as f64;
    let raw: Vec<f64> = (0..size)
        .map(|i| {
            let phase = 2.0 * std::f64::consts::PI * i as f64 / denominator;
            A0 - A1 * phase.cos() + A2 * (2.0 * phase).cos() - A3 * (3.0 * phase).cos()
        })
        .collect();

    let sum: f64 = raw.iter().sum();
    let scale = if sum > 0.0 { size as f64 / sum } else { 1.0 };
    raw.into_iter().map(|w| (w * scale) as f32).collect()
}

/// Windowed magnitude spectra, queued for the path generator
pub struct FftDataGenerator {
    order: FftOrder,
    capacity: usize,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    fft_data: Vec<f32>,
    producer: FifoProducer<Vec<f32>>,
    consumer: FifoConsumer<Vec<f32>>,
}

impl FftDataGenerator {
    pub fn new(order: FftOrder, capacity: usize) -> Self {
        let fft = FftPlanner::new().plan_fft_forward(order.fft_size());
        let (producer, consumer) = fifo(capacity, vec![0.0_f32; order.num_bins()]);

        Self {
            order,
            capacity,
            buffer: vec![Complex::new(0.0, 0.0); order.fft_size()],
            scratch: vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()],
            fft,
            window: blackman_harris_window(order.fft_size()),
            fft_data: vec![0.0; order.num_bins()],
            producer,
            consumer,
        }
    }

    /// Switch to a different window length
    ///
    /// Rebuilds the plan, window and fifo. Queued spectra are discarded.
    pub fn change_order(&mut self, order: FftOrder) {
        if order == self.order {
            return;
        }

        self.order = order;
        self.fft = FftPlanner::new().plan_fft_forward(order.fft_size());
        self.window = blackman_harris_window(order.fft_size());
        self.buffer = vec![Complex::new(0.0, 0.0); order.fft_size()];
        self.scratch = vec![Complex::new(0.0, 0.0); self.fft.get_inplace_scratch_len()];
        self.fft_data = vec![0.0; order.num_bins()];

        let (producer, consumer) = fifo(self.capacity, vec![0.0_f32; order.num_bins()]);
        self.producer = producer;
        self.consumer = consumer;
    }

    /// Analyze the first `fft_size` samples of `audio` and queue the result
    ///
    /// Shorter input is zero-padded. Every bin is expressed in dB and floored
    /// at `negative_infinity`. Returns `false` if the fifo was full.
    pub fn produce_fft_data(&mut self, audio: &[f32], negative_infinity: f32) -> bool {
        let num_bins = self.order.num_bins();

        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = audio.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        let scale = 1.0 / num_bins as f32;
        for (out, bin) in self.fft_data.iter_mut().zip(&self.buffer[..num_bins]) {
            let magnitude = bin.norm() * scale;
            *out = gain_to_decibels(magnitude, negative_infinity);
        }

        self.producer.push(&self.fft_data)
    }

    /// Copy the oldest queued spectrum into `out`
    pub fn pull_fft_data(&mut self, out: &mut Vec<f32>) -> bool {
        self.consumer.pull(out)
    }

    pub fn available_fft_blocks(&self) -> usize {
        self.consumer.available_for_read()
    }

    /// Spectra the fifo can hold
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn order(&self) -> FftOrder {
        self.order
    }

    pub fn fft_size(&self) -> usize {
        self.order.fft_size()
    }

    pub fn num_bins(&self) -> usize {
        self.order.num_bins()
    }
}
