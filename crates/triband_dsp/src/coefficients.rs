//! Filter Coefficient Factory
//!
//! Pure functions that turn a [`ChainSettings`] snapshot into biquad
//! coefficients. Based on the RBJ (Robert Bristow-Johnson) Audio EQ Cookbook;
//! the cut bands are Butterworth filters of order 2..8 factored into
//! second-order sections.
//!
//! Designs are computed in f64 and rounded to f32 once, when stored.

use std::f64::consts::PI;

use rustfft::num_complex::Complex;

use crate::settings::{ChainSettings, MAX_CUT_STAGES};

/// One biquad section, normalized so that a0 = 1
///
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
///
/// Write-once: a stage swaps in a whole new set rather than editing one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoefficientSet {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl CoefficientSet {
    /// Pass-through section (H(z) = 1)
    pub const fn identity() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
        }
    }

    fn from_unnormalized(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        let inv_a0 = 1.0 / a0;
        Self {
            b0: (b0 * inv_a0) as f32,
            b1: (b1 * inv_a0) as f32,
            b2: (b2 * inv_a0) as f32,
            a1: (a1 * inv_a0) as f32,
            a2: (a2 * inv_a0) as f32,
        }
    }

    /// |H(e^jw)| at `frequency` Hz
    pub fn magnitude_for_frequency(&self, frequency: f64, sample_rate: f64) -> f64 {
        let omega = 2.0 * PI * frequency / sample_rate;
        // z^-1 on the unit circle
        let z1 = Complex::from_polar(1.0, -omega);
        let z2 = z1 * z1;

        let numerator = Complex::new(self.b0 as f64, 0.0) + z1 * self.b1 as f64 + z2 * self.b2 as f64;
        let denominator = Complex::new(1.0, 0.0) + z1 * self.a1 as f64 + z2 * self.a2 as f64;

        numerator.norm() / denominator.norm()
    }

    pub fn to_biquad(self) -> biquad::Coefficients<f32> {
        biquad::Coefficients {
            a1: self.a1,
            a2: self.a2,
            b0: self.b0,
            b1: self.b1,
            b2: self.b2,
        }
    }
}

impl Default for CoefficientSet {
    fn default() -> Self {
        Self::identity()
    }
}

/// The sections of one cut band, up to four, stored inline (no heap)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutCoefficients {
    sections: [CoefficientSet; MAX_CUT_STAGES],
    len: usize,
}

impl CutCoefficients {
    pub fn as_slice(&self) -> &[CoefficientSet] {
        &self.sections[..self.len]
    }

    pub fn get(&self, index: usize) -> Option<&CoefficientSet> {
        self.as_slice().get(index)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Convert dB gain to linear amplitude
/// Formula: amplitude = 10^(dB/20)
pub fn decibels_to_gain(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear amplitude to dB, flooring at `minus_infinity_db`
///
/// Zero, negative and tiny gains all map to the floor instead of -inf.
pub fn gain_to_decibels(gain: f32, minus_infinity_db: f32) -> f32 {
    if gain > 0.0 {
        (20.0 * gain.log10()).max(minus_infinity_db)
    } else {
        minus_infinity_db
    }
}

/// Peaking EQ section for the mid band
///
/// Magnitude at `peak_freq` equals `10^(peak_gain_db / 20)`.
pub fn make_peak_coefficients(settings: &ChainSettings, sample_rate: f64) -> CoefficientSet {
    let gain = decibels_to_gain(settings.peak_gain_db) as f64;
    peaking(
        sample_rate,
        settings.peak_freq as f64,
        settings.peak_quality as f64,
        gain,
    )
}

/// Butterworth high-pass cascade for the low cut band
pub fn make_low_cut_coefficients(settings: &ChainSettings, sample_rate: f64) -> CutCoefficients {
    butterworth_cascade(
        settings.low_cut_freq as f64,
        sample_rate,
        settings.low_cut_slope.order(),
        high_pass,
    )
}

/// Butterworth low-pass cascade for the high cut band
pub fn make_high_cut_coefficients(settings: &ChainSettings, sample_rate: f64) -> CutCoefficients {
    butterworth_cascade(
        settings.high_cut_freq as f64,
        sample_rate,
        settings.high_cut_slope.order(),
        low_pass,
    )
}

/// Q of the `index`-th section of an even-order Butterworth filter
fn butterworth_q(order: usize, index: usize) -> f64 {
    1.0 / (2.0 * ((2 * index + 1) as f64 * PI / (2 * order) as f64).cos())
}

fn butterworth_cascade(
    frequency: f64,
    sample_rate: f64,
    order: usize,
    section: fn(f64, f64, f64) -> CoefficientSet,
) -> CutCoefficients {
    let len = (order / 2).min(MAX_CUT_STAGES);
    let mut sections = [CoefficientSet::identity(); MAX_CUT_STAGES];
    for (i, slot) in sections.iter_mut().take(len).enumerate() {
        *slot = section(sample_rate, frequency, butterworth_q(order, i));
    }
    CutCoefficients { sections, len }
}

fn peaking(sample_rate: f64, frequency: f64, q: f64, gain: f64) -> CoefficientSet {
    let a = gain.sqrt();
    let omega = 2.0 * PI * frequency / sample_rate;
    let alpha = omega.sin() / (2.0 * q);
    let cos_omega = omega.cos();

    CoefficientSet::from_unnormalized(
        1.0 + alpha * a,
        -2.0 * cos_omega,
        1.0 - alpha * a,
        1.0 + alpha / a,
        -2.0 * cos_omega,
        1.0 - alpha / a,
    )
}

fn low_pass(sample_rate: f64, frequency: f64, q: f64) -> CoefficientSet {
    let omega = 2.0 * PI * frequency / sample_rate;
    let alpha = omega.sin() / (2.0 * q);
    let cos_omega = omega.cos();

    CoefficientSet::from_unnormalized(
        (1.0 - cos_omega) / 2.0,
        1.0 - cos_omega,
        (1.0 - cos_omega) / 2.0,
        1.0 + alpha,
        -2.0 * cos_omega,
        1.0 - alpha,
    )
}

fn high_pass(sample_rate: f64, frequency: f64, q: f64) -> CoefficientSet {
    let omega = 2.0 * PI * frequency / sample_rate;
    let alpha = omega.sin() / (2.0 * q);
    let cos_omega = omega.cos();

    CoefficientSet::from_unnormalized(
        (1.0 + cos_omega) / 2.0,
        -(1.0 + cos_omega),
        (1.0 + cos_omega) / 2.0,
        1.0 + alpha,
        -2.0 * cos_omega,
        1.0 - alpha,
    )
}
