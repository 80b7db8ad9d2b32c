//! Persistent Plugin State
//!
//! Every parameter value as a flat JSON object. Hosts store the bytes from
//! [`PluginState::to_bytes`] with the session; missing or unknown fields fall
//! back to defaults so older sessions keep loading.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{EngineError, EngineResult};
use crate::params::ParamId;

/// Current on-disk format version
pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginState {
    pub version: u32,
    pub low_cut_freq: f32,
    pub high_cut_freq: f32,
    pub peak_freq: f32,
    pub peak_gain: f32,
    pub peak_quality: f32,
    pub low_cut_slope: f32,
    pub high_cut_slope: f32,
    pub low_cut_bypassed: f32,
    pub peak_bypassed: f32,
    pub high_cut_bypassed: f32,
    pub analyzer_enabled: f32,
}

impl Default for PluginState {
    fn default() -> Self {
        let default = |id: ParamId| id.range().default;
        Self {
            version: STATE_VERSION,
            low_cut_freq: default(ParamId::LowCutFreq),
            high_cut_freq: default(ParamId::HighCutFreq),
            peak_freq: default(ParamId::PeakFreq),
            peak_gain: default(ParamId::PeakGain),
            peak_quality: default(ParamId::PeakQuality),
            low_cut_slope: default(ParamId::LowCutSlope),
            high_cut_slope: default(ParamId::HighCutSlope),
            low_cut_bypassed: default(ParamId::LowCutBypassed),
            peak_bypassed: default(ParamId::PeakBypassed),
            high_cut_bypassed: default(ParamId::HighCutBypassed),
            analyzer_enabled: default(ParamId::AnalyzerEnabled),
        }
    }
}

impl PluginState {
    pub fn value(&self, id: ParamId) -> f32 {
        match id {
            ParamId::LowCutFreq => self.low_cut_freq,
            ParamId::HighCutFreq => self.high_cut_freq,
            ParamId::PeakFreq => self.peak_freq,
            ParamId::PeakGain => self.peak_gain,
            ParamId::PeakQuality => self.peak_quality,
            ParamId::LowCutSlope => self.low_cut_slope,
            ParamId::HighCutSlope => self.high_cut_slope,
            ParamId::LowCutBypassed => self.low_cut_bypassed,
            ParamId::PeakBypassed => self.peak_bypassed,
            ParamId::HighCutBypassed => self.high_cut_bypassed,
            ParamId::AnalyzerEnabled => self.analyzer_enabled,
        }
    }

    pub fn set_value(&mut self, id: ParamId, value: f32) {
        let slot = match id {
            ParamId::LowCutFreq => &mut self.low_cut_freq,
            ParamId::HighCutFreq => &mut self.high_cut_freq,
            ParamId::PeakFreq => &mut self.peak_freq,
            ParamId::PeakGain => &mut self.peak_gain,
            ParamId::PeakQuality => &mut self.peak_quality,
            ParamId::LowCutSlope => &mut self.low_cut_slope,
            ParamId::HighCutSlope => &mut self.high_cut_slope,
            ParamId::LowCutBypassed => &mut self.low_cut_bypassed,
            ParamId::PeakBypassed => &mut self.peak_bypassed,
            ParamId::HighCutBypassed => &mut self.high_cut_bypassed,
            ParamId::AnalyzerEnabled => &mut self.analyzer_enabled,
        };
        *slot = value;
    }

    pub fn to_bytes(&self) -> EngineResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| EngineError::StateError(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> EngineResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| EngineError::StateError(e.to_string()))
    }

    /// Load state from `path`, or return default if missing/corrupt
    pub fn load_from(path: &Path) -> Self {
        match fs::read(path) {
            Ok(bytes) => match Self::from_bytes(&bytes) {
                Ok(state) => {
                    info!("State loaded from {:?}", path);
                    return state;
                }
                Err(e) => error!("Failed to parse state file: {}", e),
            },
            Err(e) => error!("Failed to read state file: {}", e),
        }

        info!("Using default state");
        Self::default()
    }

    /// Save state to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> EngineResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| EngineError::StateError(e.to_string()))?;
        }

        let file = fs::File::create(path).map_err(|e| EngineError::StateError(e.to_string()))?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| EngineError::StateError(e.to_string()))?;

        info!("State saved to {:?}", path);
        Ok(())
    }
}
