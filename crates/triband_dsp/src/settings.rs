//! Chain Settings
//!
//! The value snapshot every coefficient computation starts from. A fresh
//! `ChainSettings` is read from the parameter store at the start of each audio
//! block and on each display refresh; it is never edited in place.

use serde::{Deserialize, Serialize};

/// Lowest frequency any band can be tuned to (Hz)
pub const MIN_FREQUENCY_HZ: f32 = 20.0;
/// Highest frequency any band can be tuned to (Hz)
pub const MAX_FREQUENCY_HZ: f32 = 20000.0;

pub const LOW_CUT_DEFAULT_HZ: f32 = 20.0;
pub const PEAK_DEFAULT_HZ: f32 = 750.0;
pub const HIGH_CUT_DEFAULT_HZ: f32 = 20000.0;

pub const PEAK_GAIN_MIN_DB: f32 = -24.0;
pub const PEAK_GAIN_MAX_DB: f32 = 24.0;
pub const PEAK_QUALITY_MIN: f32 = 0.1;
pub const PEAK_QUALITY_MAX: f32 = 10.0;
pub const PEAK_QUALITY_DEFAULT: f32 = 1.0;

/// Number of biquad sections in a cut band at its steepest slope
pub const MAX_CUT_STAGES: usize = 4;

/// Roll-off steepness of a cut band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Slope {
    #[default]
    Db12,
    Db24,
    Db36,
    Db48,
}

impl Slope {
    pub const ALL: [Slope; 4] = [Slope::Db12, Slope::Db24, Slope::Db36, Slope::Db48];

    /// Map a choice index (0..=3) to a slope, clamping anything outside
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    pub fn index(self) -> usize {
        match self {
            Slope::Db12 => 0,
            Slope::Db24 => 1,
            Slope::Db36 => 2,
            Slope::Db48 => 3,
        }
    }

    pub fn db_per_octave(self) -> u32 {
        12 * (self.index() as u32 + 1)
    }

    /// Butterworth filter order: 2, 4, 6 or 8
    pub fn order(self) -> usize {
        2 * (self.index() + 1)
    }

    /// Number of second-order sections in the cascade
    pub fn stage_count(self) -> usize {
        self.index() + 1
    }

    /// Display label, e.g. "24 dB/Oct"
    pub fn label(self) -> String {
        format!("{} dB/Oct", self.db_per_octave())
    }
}

/// Everything needed to compute the coefficients of all three bands
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainSettings {
    pub peak_freq: f32,
    pub peak_gain_db: f32,
    pub peak_quality: f32,
    pub low_cut_freq: f32,
    pub high_cut_freq: f32,
    pub low_cut_slope: Slope,
    pub high_cut_slope: Slope,
    pub low_cut_bypassed: bool,
    pub peak_bypassed: bool,
    pub high_cut_bypassed: bool,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            peak_freq: PEAK_DEFAULT_HZ,
            peak_gain_db: 0.0,
            peak_quality: PEAK_QUALITY_DEFAULT,
            low_cut_freq: LOW_CUT_DEFAULT_HZ,
            high_cut_freq: HIGH_CUT_DEFAULT_HZ,
            low_cut_slope: Slope::Db12,
            high_cut_slope: Slope::Db12,
            low_cut_bypassed: false,
            peak_bypassed: false,
            high_cut_bypassed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slope_orders() {
        let orders: Vec<usize> = Slope::ALL.iter().map(|s| s.order()).collect();
        assert_eq!(orders, vec![2, 4, 6, 8]);

        let stages: Vec<usize> = Slope::ALL.iter().map(|s| s.stage_count()).collect();
        assert_eq!(stages, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_slope_from_index_clamps() {
        assert_eq!(Slope::from_index(0), Slope::Db12);
        assert_eq!(Slope::from_index(3), Slope::Db48);
        assert_eq!(Slope::from_index(17), Slope::Db48);
    }

    #[test]
    fn test_slope_labels() {
        assert_eq!(Slope::Db12.label(), "12 dB/Oct");
        assert_eq!(Slope::Db48.db_per_octave(), 48);
    }

    #[test]
    fn test_default_settings_match_parameter_defaults() {
        let settings = ChainSettings::default();
        assert_eq!(settings.low_cut_freq, 20.0);
        assert_eq!(settings.peak_freq, 750.0);
        assert_eq!(settings.high_cut_freq, 20000.0);
        assert_eq!(settings.peak_gain_db, 0.0);
        assert_eq!(settings.peak_quality, 1.0);
        assert!(!settings.low_cut_bypassed);
        assert!(!settings.peak_bypassed);
        assert!(!settings.high_cut_bypassed);
    }
}
