//! Parameter Store
//!
//! The host-visible parameters, stored as atomic `f32` bit patterns so the
//! audio thread can snapshot them without locking. Writers (host automation,
//! UI, state restore) clamp into range at this boundary and then poke every
//! registered [`ChangeNotifier`].

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use triband_dsp::{
    ChainSettings, Slope, HIGH_CUT_DEFAULT_HZ, LOW_CUT_DEFAULT_HZ, MAX_FREQUENCY_HZ,
    MIN_FREQUENCY_HZ, PEAK_DEFAULT_HZ, PEAK_GAIN_MAX_DB, PEAK_GAIN_MIN_DB, PEAK_QUALITY_DEFAULT,
    PEAK_QUALITY_MAX, PEAK_QUALITY_MIN,
};

use crate::settings::PluginState;

const FREQUENCY_STEP_HZ: f32 = 1.0;
const FREQUENCY_SKEW: f32 = 0.25;
const PEAK_GAIN_STEP_DB: f32 = 0.5;
const PEAK_QUALITY_STEP: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamId {
    LowCutFreq,
    HighCutFreq,
    PeakFreq,
    PeakGain,
    PeakQuality,
    LowCutSlope,
    HighCutSlope,
    LowCutBypassed,
    PeakBypassed,
    HighCutBypassed,
    AnalyzerEnabled,
}

impl ParamId {
    pub const COUNT: usize = 11;

    pub const ALL: [ParamId; Self::COUNT] = [
        ParamId::LowCutFreq,
        ParamId::HighCutFreq,
        ParamId::PeakFreq,
        ParamId::PeakGain,
        ParamId::PeakQuality,
        ParamId::LowCutSlope,
        ParamId::HighCutSlope,
        ParamId::LowCutBypassed,
        ParamId::PeakBypassed,
        ParamId::HighCutBypassed,
        ParamId::AnalyzerEnabled,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Host-facing parameter name
    pub fn name(self) -> &'static str {
        match self {
            ParamId::LowCutFreq => "LowCut Freq",
            ParamId::HighCutFreq => "HighCut Freq",
            ParamId::PeakFreq => "Peak Freq",
            ParamId::PeakGain => "Peak Gain",
            ParamId::PeakQuality => "Peak Quality",
            ParamId::LowCutSlope => "LowCut Slope",
            ParamId::HighCutSlope => "HighCut Slope",
            ParamId::LowCutBypassed => "LowCut Bypassed",
            ParamId::PeakBypassed => "Peak Bypassed",
            ParamId::HighCutBypassed => "HighCut Bypassed",
            ParamId::AnalyzerEnabled => "Analyzer Enabled",
        }
    }

    /// Look up a parameter by its host-facing name, ignoring case and spaces
    pub fn from_name(name: &str) -> Option<Self> {
        let key = |s: &str| -> String {
            s.chars()
                .filter(|c| !c.is_whitespace() && *c != '_')
                .flat_map(char::to_lowercase)
                .collect()
        };
        let wanted = key(name);
        ParamId::ALL.into_iter().find(|id| key(id.name()) == wanted)
    }

    pub fn range(self) -> ParamRange {
        let frequency = |default| ParamRange {
            min: MIN_FREQUENCY_HZ,
            max: MAX_FREQUENCY_HZ,
            step: FREQUENCY_STEP_HZ,
            skew: FREQUENCY_SKEW,
            default,
        };
        let slope = ParamRange {
            min: 0.0,
            max: (Slope::ALL.len() - 1) as f32,
            step: 1.0,
            skew: 1.0,
            default: Slope::default().index() as f32,
        };
        let toggle = |on: bool| ParamRange {
            min: 0.0,
            max: 1.0,
            step: 1.0,
            skew: 1.0,
            default: if on { 1.0 } else { 0.0 },
        };

        match self {
            ParamId::LowCutFreq => frequency(LOW_CUT_DEFAULT_HZ),
            ParamId::HighCutFreq => frequency(HIGH_CUT_DEFAULT_HZ),
            ParamId::PeakFreq => frequency(PEAK_DEFAULT_HZ),
            ParamId::PeakGain => ParamRange {
                min: PEAK_GAIN_MIN_DB,
                max: PEAK_GAIN_MAX_DB,
                step: PEAK_GAIN_STEP_DB,
                skew: 1.0,
                default: 0.0,
            },
            ParamId::PeakQuality => ParamRange {
                min: PEAK_QUALITY_MIN,
                max: PEAK_QUALITY_MAX,
                step: PEAK_QUALITY_STEP,
                skew: 1.0,
                default: PEAK_QUALITY_DEFAULT,
            },
            ParamId::LowCutSlope | ParamId::HighCutSlope => slope,
            ParamId::LowCutBypassed | ParamId::PeakBypassed | ParamId::HighCutBypassed => {
                toggle(false)
            }
            ParamId::AnalyzerEnabled => toggle(true),
        }
    }

    pub fn is_toggle(self) -> bool {
        matches!(
            self,
            ParamId::LowCutBypassed
                | ParamId::PeakBypassed
                | ParamId::HighCutBypassed
                | ParamId::AnalyzerEnabled
        )
    }
}

/// Legal values of one parameter
///
/// `skew` shapes the normalized 0..1 control travel: values below 1 give the
/// low end of the range more room, which is what frequency knobs want.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
    pub step: f32,
    pub skew: f32,
    pub default: f32,
}

impl ParamRange {
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    /// Control position (0..1) for `value`
    pub fn to_normalized(&self, value: f32) -> f32 {
        let proportion = (self.clamp(value) - self.min) / (self.max - self.min);
        if self.skew == 1.0 {
            proportion
        } else {
            proportion.powf(self.skew)
        }
    }

    /// Value at control position `normalized` (clamped to 0..1)
    pub fn from_normalized(&self, normalized: f32) -> f32 {
        let mut proportion = normalized.clamp(0.0, 1.0);
        if self.skew != 1.0 && proportion > 0.0 {
            proportion = (proportion.ln() / self.skew).exp();
        }
        self.min + (self.max - self.min) * proportion
    }
}

/// "Parameters changed since the last repaint" flag, owned by the display
///
/// Hand [`ChangeNotifier`]s to anything that mutates parameters; the display
/// calls [`take`](Self::take) once per tick, so any number of changes between
/// two ticks cost exactly one rebuild.
#[derive(Debug)]
pub struct ChangeFlag {
    flag: Arc<AtomicBool>,
}

impl ChangeFlag {
    /// New flag, initially set so the first tick builds everything
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn notifier(&self) -> ChangeNotifier {
        ChangeNotifier {
            flag: Arc::clone(&self.flag),
        }
    }

    /// Atomically test and clear
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::AcqRel)
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

impl Default for ChangeFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable handle that raises a [`ChangeFlag`]
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    flag: Arc<AtomicBool>,
}

impl ChangeNotifier {
    #[inline]
    pub fn notify(&self) {
        self.flag.store(true, Ordering::Release);
    }
}

/// Registration returned by [`ParameterStore::add_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Current value of every parameter
///
/// Shared through `Arc`. Reads are lock-free and safe from the audio thread;
/// `set` takes a read lock on the listener list and belongs on control threads.
pub struct ParameterStore {
    values: [AtomicU32; ParamId::COUNT],
    listeners: RwLock<Vec<(ListenerId, ChangeNotifier)>>,
    next_listener: AtomicU64,
}

impl ParameterStore {
    /// Store with every parameter at its default
    pub fn new() -> Self {
        Self {
            values: core::array::from_fn(|i| AtomicU32::new(ParamId::ALL[i].range().default.to_bits())),
            listeners: RwLock::new(Vec::new()),
            next_listener: AtomicU64::new(0),
        }
    }

    pub fn get(&self, id: ParamId) -> f32 {
        f32::from_bits(self.values[id.index()].load(Ordering::Relaxed))
    }

    /// Clamp `value` into range, store it, and notify listeners
    ///
    /// Non-finite values are ignored. Returns the value now stored.
    pub fn set(&self, id: ParamId, value: f32) -> f32 {
        if !value.is_finite() {
            return self.get(id);
        }
        let clamped = id.range().clamp(value);
        self.values[id.index()].store(clamped.to_bits(), Ordering::Relaxed);
        self.notify_listeners();
        clamped
    }

    /// Set from a 0..1 control position
    pub fn set_normalized(&self, id: ParamId, normalized: f32) -> f32 {
        self.set(id, id.range().from_normalized(normalized))
    }

    pub fn set_bool(&self, id: ParamId, on: bool) {
        self.set(id, if on { 1.0 } else { 0.0 });
    }

    fn get_bool(&self, id: ParamId) -> bool {
        self.get(id) > 0.5
    }

    fn get_slope(&self, id: ParamId) -> Slope {
        Slope::from_index(self.get(id).round().max(0.0) as usize)
    }

    /// Value snapshot of everything the filter chain needs
    pub fn chain_settings(&self) -> ChainSettings {
        ChainSettings {
            peak_freq: self.get(ParamId::PeakFreq),
            peak_gain_db: self.get(ParamId::PeakGain),
            peak_quality: self.get(ParamId::PeakQuality),
            low_cut_freq: self.get(ParamId::LowCutFreq),
            high_cut_freq: self.get(ParamId::HighCutFreq),
            low_cut_slope: self.get_slope(ParamId::LowCutSlope),
            high_cut_slope: self.get_slope(ParamId::HighCutSlope),
            low_cut_bypassed: self.get_bool(ParamId::LowCutBypassed),
            peak_bypassed: self.get_bool(ParamId::PeakBypassed),
            high_cut_bypassed: self.get_bool(ParamId::HighCutBypassed),
        }
    }

    pub fn analyzer_enabled(&self) -> bool {
        self.get_bool(ParamId::AnalyzerEnabled)
    }

    /// Register a handle to poke on every change
    ///
    /// Keep the returned id and pass it to [`remove_listener`](Self::remove_listener)
    /// when the listener goes away.
    pub fn add_listener(&self, notifier: ChangeNotifier) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, notifier));
        id
    }

    /// Unregister a listener. Returns `false` if `id` was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(registered, _)| *registered != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Snapshot every parameter for persistence
    pub fn state(&self) -> PluginState {
        let mut state = PluginState::default();
        for id in ParamId::ALL {
            state.set_value(id, self.get(id));
        }
        state
    }

    /// Load every parameter from `state`, clamping each, then notify once
    pub fn restore(&self, state: &PluginState) {
        for id in ParamId::ALL {
            let value = state.value(id);
            let value = if value.is_finite() { id.range().clamp(value) } else { id.range().default };
            self.values[id.index()].store(value.to_bits(), Ordering::Relaxed);
        }
        self.notify_listeners();
    }

    fn notify_listeners(&self) {
        for (_, listener) in self.listeners.read().iter() {
            listener.notify();
        }
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}
