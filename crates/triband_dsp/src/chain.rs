//! Three-Band Filter Chain
//!
//! One mono signal path: a low cut band (up to four Butterworth sections), a
//! peaking band, then a high cut band (up to four sections). A stereo signal
//! uses two independent chains.
//!
//! ```text
//! x ─▶ [LC0]─[LC1]─[LC2]─[LC3] ─▶ [Peak] ─▶ [HC0]─[HC1]─[HC2]─[HC3] ─▶ y
//! ```
//!
//! # Hot-swap
//!
//! `update_filters` recomputes every band from a [`ChainSettings`] snapshot and
//! installs the new coefficients while keeping each stage's delay line, so a
//! parameter change never clicks. A chain is owned by one thread; the audio
//! thread and the display thread each keep their own instance.

use biquad::{Biquad, DirectForm2Transposed};

use crate::coefficients::{
    make_high_cut_coefficients, make_low_cut_coefficients, make_peak_coefficients,
    CoefficientSet, CutCoefficients,
};
use crate::settings::{ChainSettings, Slope, MAX_CUT_STAGES};

/// Floor for [`MonoChain::magnitude_db`], in place of -inf
pub const RESPONSE_FLOOR_DB: f64 = -100.0;

/// A single biquad with its installed coefficients and a bypass flag
///
/// A bypassed stage is the identity: samples pass through untouched.
pub struct FilterStage {
    // DirectForm2Transposed: better numerical stability than DF1
    filter: DirectForm2Transposed<f32>,
    coefficients: CoefficientSet,
    bypassed: bool,
}

impl FilterStage {
    pub fn new() -> Self {
        let coefficients = CoefficientSet::identity();
        Self {
            filter: DirectForm2Transposed::<f32>::new(coefficients.to_biquad()),
            coefficients,
            bypassed: false,
        }
    }

    /// Swap in a new coefficient set, keeping the delay-line state
    pub fn set_coefficients(&mut self, coefficients: CoefficientSet) {
        self.coefficients = coefficients;
        self.filter.update_coefficients(coefficients.to_biquad());
    }

    pub fn coefficients(&self) -> &CoefficientSet {
        &self.coefficients
    }

    pub fn set_bypassed(&mut self, bypassed: bool) {
        self.bypassed = bypassed;
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    #[inline]
    pub fn process_sample(&mut self, sample: f32) -> f32 {
        if self.bypassed {
            sample
        } else {
            self.filter.run(sample)
        }
    }

    /// Magnitude this stage contributes at `frequency` (1.0 when bypassed)
    pub fn magnitude_for_frequency(&self, frequency: f64, sample_rate: f64) -> f64 {
        if self.bypassed {
            1.0
        } else {
            self.coefficients.magnitude_for_frequency(frequency, sample_rate)
        }
    }

    pub fn reset(&mut self) {
        self.filter.reset_state();
    }
}

impl Default for FilterStage {
    fn default() -> Self {
        Self::new()
    }
}

/// A cut band: four cascaded stages plus the band's own bypass switch
pub struct CutFilter {
    stages: [FilterStage; MAX_CUT_STAGES],
    bypassed: bool,
}

impl CutFilter {
    pub fn new() -> Self {
        Self {
            stages: core::array::from_fn(|_| FilterStage::new()),
            bypassed: false,
        }
    }

    /// Install a new cascade for `slope`
    ///
    /// All four stages are bypassed first, then stages `0..=slope.index()` are
    /// activated with coefficient set `i` each. 12 dB/Oct therefore runs one
    /// stage and 48 dB/Oct runs all four.
    pub fn update(&mut self, coefficients: &CutCoefficients, slope: Slope) {
        for stage in &mut self.stages {
            stage.set_bypassed(true);
        }

        for (i, stage) in self.stages.iter_mut().enumerate().take(slope.stage_count()) {
            if let Some(section) = coefficients.get(i) {
                stage.set_coefficients(*section);
                stage.set_bypassed(false);
            }
        }
    }

    pub fn set_bypassed(&mut self, bypassed: bool) {
        self.bypassed = bypassed;
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    /// Number of stages currently running (ignores the band bypass)
    pub fn active_stage_count(&self) -> usize {
        self.stages.iter().filter(|s| !s.is_bypassed()).count()
    }

    pub fn stages(&self) -> &[FilterStage; MAX_CUT_STAGES] {
        &self.stages
    }

    #[inline]
    pub fn process_sample(&mut self, sample: f32) -> f32 {
        if self.bypassed {
            return sample;
        }
        self.stages
            .iter_mut()
            .fold(sample, |acc, stage| stage.process_sample(acc))
    }

    pub fn magnitude_for_frequency(&self, frequency: f64, sample_rate: f64) -> f64 {
        if self.bypassed {
            return 1.0;
        }
        self.stages
            .iter()
            .map(|s| s.magnitude_for_frequency(frequency, sample_rate))
            .product()
    }

    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
    }
}

impl Default for CutFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Low cut → peak → high cut for one channel
///
/// Designed for real-time use: no allocations in `process()` or
/// `update_filters()`.
pub struct MonoChain {
    low_cut: CutFilter,
    peak: FilterStage,
    high_cut: CutFilter,
}

impl MonoChain {
    pub fn new() -> Self {
        Self {
            low_cut: CutFilter::new(),
            peak: FilterStage::new(),
            high_cut: CutFilter::new(),
        }
    }

    /// Recompute and install all three bands from `settings`
    ///
    /// Call once per block, on the thread that owns this chain, before
    /// processing the block. Identical settings install bit-identical
    /// coefficients.
    pub fn update_filters(&mut self, settings: &ChainSettings, sample_rate: f64) {
        let low_cut = make_low_cut_coefficients(settings, sample_rate);
        let peak = make_peak_coefficients(settings, sample_rate);
        let high_cut = make_high_cut_coefficients(settings, sample_rate);

        self.low_cut.set_bypassed(settings.low_cut_bypassed);
        self.low_cut.update(&low_cut, settings.low_cut_slope);

        self.peak.set_bypassed(settings.peak_bypassed);
        self.peak.set_coefficients(peak);

        self.high_cut.set_bypassed(settings.high_cut_bypassed);
        self.high_cut.update(&high_cut, settings.high_cut_slope);
    }

    /// Run one sample through every active stage in order
    ///
    /// # Real-time Safety
    /// No allocations, no syscalls. At most nine biquads per sample.
    #[inline]
    pub fn process_sample(&mut self, sample: f32) -> f32 {
        let x = self.low_cut.process_sample(sample);
        let x = self.peak.process_sample(x);
        self.high_cut.process_sample(x)
    }

    /// Process one channel's buffer in place
    #[inline]
    pub fn process(&mut self, samples: &mut [f32]) {
        for sample in samples.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }

    /// Combined linear magnitude of every active stage at `frequency`
    pub fn magnitude_for_frequency(&self, frequency: f64, sample_rate: f64) -> f64 {
        self.low_cut.magnitude_for_frequency(frequency, sample_rate)
            * self.peak.magnitude_for_frequency(frequency, sample_rate)
            * self.high_cut.magnitude_for_frequency(frequency, sample_rate)
    }

    /// [`magnitude_for_frequency`](Self::magnitude_for_frequency) in dB
    pub fn magnitude_db(&self, frequency: f64, sample_rate: f64) -> f64 {
        let magnitude = self.magnitude_for_frequency(frequency, sample_rate);
        if magnitude > 0.0 {
            (20.0 * magnitude.log10()).max(RESPONSE_FLOOR_DB)
        } else {
            RESPONSE_FLOOR_DB
        }
    }

    pub fn low_cut(&self) -> &CutFilter {
        &self.low_cut
    }

    pub fn peak(&self) -> &FilterStage {
        &self.peak
    }

    pub fn high_cut(&self) -> &CutFilter {
        &self.high_cut
    }

    pub fn is_peak_bypassed(&self) -> bool {
        self.peak.is_bypassed()
    }

    /// Clear every delay line
    ///
    /// Call when the stream restarts to prevent filter ringing
    pub fn reset(&mut self) {
        self.low_cut.reset();
        self.peak.reset();
        self.high_cut.reset();
    }
}

impl Default for MonoChain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f64 = 48000.0;

    fn stage_bits(stage: &FilterStage) -> [u32; 5] {
        let c = stage.coefficients();
        [c.b0.to_bits(), c.b1.to_bits(), c.b2.to_bits(), c.a1.to_bits(), c.a2.to_bits()]
    }

    fn chain_bits(chain: &MonoChain) -> Vec<[u32; 5]> {
        chain
            .low_cut()
            .stages()
            .iter()
            .chain(std::iter::once(chain.peak()))
            .chain(chain.high_cut().stages().iter())
            .map(stage_bits)
            .collect()
    }

    #[test]
    fn test_active_stage_count_matches_slope() {
        for slope in Slope::ALL {
            let settings = ChainSettings {
                low_cut_slope: slope,
                high_cut_slope: slope,
                ..Default::default()
            };
            let mut chain = MonoChain::new();
            chain.update_filters(&settings, SAMPLE_RATE);

            for band in [chain.low_cut(), chain.high_cut()] {
                assert_eq!(band.active_stage_count(), slope.index() + 1);
                let bypassed = band.stages().iter().filter(|s| s.is_bypassed()).count();
                assert_eq!(bypassed, 4 - (slope.index() + 1));
            }
        }
    }

    #[test]
    fn test_lowering_slope_bypasses_upper_stages() {
        let mut chain = MonoChain::new();
        let steep = ChainSettings {
            low_cut_slope: Slope::Db48,
            ..Default::default()
        };
        chain.update_filters(&steep, SAMPLE_RATE);
        assert_eq!(chain.low_cut().active_stage_count(), 4);

        let gentle = ChainSettings {
            low_cut_slope: Slope::Db24,
            ..Default::default()
        };
        chain.update_filters(&gentle, SAMPLE_RATE);
        let flags: Vec<bool> = chain.low_cut().stages().iter().map(|s| s.is_bypassed()).collect();
        assert_eq!(flags, vec![false, false, true, true]);
    }

    #[test]
    fn test_update_filters_is_idempotent() {
        let settings = ChainSettings {
            peak_freq: 1234.0,
            peak_gain_db: -7.5,
            peak_quality: 2.3,
            low_cut_freq: 80.0,
            high_cut_freq: 9000.0,
            low_cut_slope: Slope::Db36,
            high_cut_slope: Slope::Db24,
            ..Default::default()
        };
        let mut chain = MonoChain::new();
        chain.update_filters(&settings, SAMPLE_RATE);
        let first = chain_bits(&chain);
        chain.update_filters(&settings, SAMPLE_RATE);
        let second = chain_bits(&chain);
        assert_eq!(first, second);
    }

    #[test]
    fn test_flat_midband_with_extreme_cuts() {
        let settings = ChainSettings {
            low_cut_freq: 20.0,
            high_cut_freq: 20000.0,
            low_cut_slope: Slope::Db12,
            high_cut_slope: Slope::Db12,
            peak_bypassed: true,
            ..Default::default()
        };
        let mut chain = MonoChain::new();
        chain.update_filters(&settings, SAMPLE_RATE);

        let db = chain.magnitude_db(1000.0, SAMPLE_RATE);
        assert!(db.abs() < 0.5, "Expected ~0 dB at 1 kHz, got {}", db);
    }

    #[test]
    fn test_full_boost_reads_plus_24db_at_peak() {
        let settings = ChainSettings {
            peak_freq: 750.0,
            peak_gain_db: 24.0,
            peak_quality: 1.0,
            ..Default::default()
        };
        let mut chain = MonoChain::new();
        chain.update_filters(&settings, SAMPLE_RATE);

        let db = chain.magnitude_db(750.0, SAMPLE_RATE);
        assert!((db - 24.0).abs() < 0.3, "Expected ~+24 dB at 750 Hz, got {}", db);
    }

    #[test]
    fn test_bypassed_bands_are_excluded_from_response() {
        let settings = ChainSettings {
            low_cut_freq: 2000.0,
            low_cut_slope: Slope::Db48,
            low_cut_bypassed: true,
            peak_gain_db: 12.0,
            peak_bypassed: true,
            high_cut_freq: 100.0,
            high_cut_bypassed: true,
            ..Default::default()
        };
        let mut chain = MonoChain::new();
        chain.update_filters(&settings, SAMPLE_RATE);

        for &f in &[50.0, 750.0, 5000.0] {
            assert_eq!(chain.magnitude_for_frequency(f, SAMPLE_RATE), 1.0);
        }
    }

    #[test]
    fn test_fully_bypassed_chain_is_identity() {
        let settings = ChainSettings {
            low_cut_bypassed: true,
            peak_bypassed: true,
            high_cut_bypassed: true,
            peak_gain_db: 18.0,
            ..Default::default()
        };
        let mut chain = MonoChain::new();
        chain.update_filters(&settings, SAMPLE_RATE);

        let input: Vec<f32> = (0..256).map(|i| (i as f32 * 0.1).sin()).collect();
        let mut buffer = input.clone();
        chain.process(&mut buffer);
        assert_eq!(buffer, input);
    }

    #[test]
    fn test_high_cut_attenuates_above_cutoff() {
        let settings = ChainSettings {
            high_cut_freq: 500.0,
            high_cut_slope: Slope::Db48,
            ..Default::default()
        };
        let mut chain = MonoChain::new();
        chain.update_filters(&settings, SAMPLE_RATE);

        // 5 kHz sine, measure after the transient settles
        let freq = 5000.0;
        let mut max_output = 0.0_f32;
        for i in 0..4800 {
            let t = i as f32 / SAMPLE_RATE as f32;
            let sample = (2.0 * std::f32::consts::PI * freq * t).sin() * 0.5;
            let out = chain.process_sample(sample);
            if i > 2400 {
                max_output = max_output.max(out.abs());
            }
        }
        assert!(max_output < 0.001, "High cut should remove 5 kHz: {}", max_output);
    }

    #[test]
    fn test_boost_increases_amplitude() {
        let settings = ChainSettings {
            peak_freq: 1000.0,
            peak_gain_db: 12.0,
            ..Default::default()
        };
        let mut chain = MonoChain::new();
        chain.update_filters(&settings, SAMPLE_RATE);

        let freq = 1000.0;
        let mut max_input = 0.0_f32;
        let mut max_output = 0.0_f32;
        for i in 0..4800 {
            let t = i as f32 / SAMPLE_RATE as f32;
            let sample = (2.0 * std::f32::consts::PI * freq * t).sin() * 0.1;
            max_input = max_input.max(sample.abs());
            max_output = max_output.max(chain.process_sample(sample).abs());
        }

        assert!(max_output > max_input * 3.0, "+12 dB boost should roughly quadruple amplitude");
    }

    #[test]
    fn test_reset_doesnt_panic() {
        let mut chain = MonoChain::new();
        chain.update_filters(&ChainSettings::default(), SAMPLE_RATE);
        for _ in 0..100 {
            chain.process_sample(0.5);
        }
        chain.reset();
        assert!(chain.process_sample(0.5).is_finite());
    }

    #[test]
    fn test_magnitude_db_floors_silence() {
        let settings = ChainSettings {
            high_cut_freq: 20.0,
            high_cut_slope: Slope::Db48,
            ..Default::default()
        };
        let mut chain = MonoChain::new();
        chain.update_filters(&settings, SAMPLE_RATE);
        let db = chain.magnitude_db(20000.0, SAMPLE_RATE);
        assert!(db >= RESPONSE_FLOOR_DB);
        assert!(db.is_finite());
    }
}
