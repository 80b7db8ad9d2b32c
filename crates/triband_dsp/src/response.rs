//! Response Curve
//!
//! Samples a chain's combined magnitude once per horizontal pixel on a
//! 20 Hz..20 kHz log axis and maps it onto a ±24 dB vertical scale.

use crate::chain::MonoChain;
use crate::path::{jmap, map_to_log10, Bounds, RenderPath};
use crate::settings::{MAX_FREQUENCY_HZ, MIN_FREQUENCY_HZ};

/// Level drawn at the bottom edge
pub const RESPONSE_MIN_DB: f32 = -24.0;
/// Level drawn at the top edge
pub const RESPONSE_MAX_DB: f32 = 24.0;

/// Build the frequency response polyline for `chain` inside `bounds`
pub fn response_curve(chain: &MonoChain, sample_rate: f64, bounds: Bounds) -> RenderPath {
    let mut path = RenderPath::new();
    write_response_curve(chain, sample_rate, bounds, &mut path);
    path
}

/// Like [`response_curve`], reusing `path`'s allocation
pub fn write_response_curve(chain: &MonoChain, sample_rate: f64, bounds: Bounds, path: &mut RenderPath) {
    path.clear();

    let width = bounds.width.max(0.0) as usize;
    if width == 0 {
        return;
    }

    let top = bounds.y;
    let bottom = bounds.bottom();

    for i in 0..width {
        let freq = map_to_log10(
            i as f64 / width as f64,
            MIN_FREQUENCY_HZ as f64,
            MAX_FREQUENCY_HZ as f64,
        );
        let db = chain.magnitude_db(freq, sample_rate) as f32;
        let y = jmap(db, RESPONSE_MIN_DB, RESPONSE_MAX_DB, bottom, top);
        if !y.is_finite() {
            continue;
        }

        let x = bounds.x + i as f32;
        if path.is_empty() {
            path.start_new_sub_path(x, y);
        } else {
            path.line_to(x, y);
        }
    }
}
