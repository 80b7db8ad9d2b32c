//! Message Types for Thread Communication
//!
//! Events flow from the display refresh thread to whoever renders frames.

use serde::{Deserialize, Serialize};
use triband_dsp::{Channel, RenderPath};

/// Events sent from the refresh loop to the render consumer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Event {
    /// Refresh loop started
    Started { refresh_hz: u32 },

    /// Refresh loop stopped
    Stopped,

    /// Something visible changed: the paths to draw
    Frame {
        response: RenderPath,
        left: RenderPath,
        right: RenderPath,
    },

    /// A collector fifo overflowed since the last report
    /// `count` is the running total for that channel.
    AnalyzerDropped { channel: Channel, count: u64 },
}
