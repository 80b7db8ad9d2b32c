//! Render Paths
//!
//! Polylines in display coordinates, plus the analyzer path generator that
//! turns a dB spectrum into one. A renderer draws a [`RenderPath`] as a
//! sequence of line segments from the first point onwards.

use serde::{Deserialize, Serialize};

use crate::fifo::{fifo_with, FifoConsumer, FifoProducer};
use crate::settings::{MAX_FREQUENCY_HZ, MIN_FREQUENCY_HZ};

/// Horizontal points reserved per path at construction
const PATH_RESERVE_POINTS: usize = 4096;

/// Display rectangle a path is mapped into (y grows downwards)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(0.0, 0.0, 600.0, 300.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub x: f32,
    pub y: f32,
}

/// Ordered list of points forming one polyline
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderPath {
    points: Vec<PathPoint>,
}

impl Clone for RenderPath {
    fn clone(&self) -> Self {
        Self {
            points: self.points.clone(),
        }
    }

    // Reuses the existing allocation when the fifo copies paths in and out
    fn clone_from(&mut self, source: &Self) {
        self.points.clone_from(&source.points);
    }
}

impl RenderPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Drop all points, keeping the allocation
    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Start the path over at `(x, y)`
    pub fn start_new_sub_path(&mut self, x: f32, y: f32) {
        self.points.clear();
        self.points.push(PathPoint { x, y });
    }

    pub fn line_to(&mut self, x: f32, y: f32) {
        self.points.push(PathPoint { x, y });
    }

    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point with the smallest y, i.e. the visually highest one
    pub fn highest_point(&self) -> Option<PathPoint> {
        self.points
            .iter()
            .copied()
            .min_by(|a, b| a.y.total_cmp(&b.y))
    }
}

/// Linear remap of `value` from `[source_min, source_max]` to `[target_min, target_max]`
#[inline]
pub fn jmap(value: f32, source_min: f32, source_max: f32, target_min: f32, target_max: f32) -> f32 {
    target_min + (value - source_min) * (target_max - target_min) / (source_max - source_min)
}

/// Map a 0..1 proportion to a frequency on a log10 axis
#[inline]
pub fn map_to_log10(proportion: f64, min: f64, max: f64) -> f64 {
    let log_min = min.log10();
    let log_max = max.log10();
    10f64.powf(log_min + proportion * (log_max - log_min))
}

/// Inverse of [`map_to_log10`]: where `value` falls on a log10 axis, as 0..1
#[inline]
pub fn map_from_log10(value: f32, min: f32, max: f32) -> f32 {
    (value.log10() - min.log10()) / (max.log10() - min.log10())
}

/// Turns dB spectra into analyzer paths and queues them
pub struct AnalyzerPathGenerator {
    scratch: RenderPath,
    paths: FifoProducer<RenderPath>,
    ready: FifoConsumer<RenderPath>,
}

impl AnalyzerPathGenerator {
    pub fn new(capacity: usize) -> Self {
        let (paths, ready) = fifo_with(capacity, || RenderPath::with_capacity(PATH_RESERVE_POINTS));
        Self {
            scratch: RenderPath::with_capacity(PATH_RESERVE_POINTS),
            paths,
            ready,
        }
    }

    /// Build a path from one spectrum and push it into the path fifo
    ///
    /// The first point sits at the left edge at the level of bin 0. After that
    /// every second bin is placed on the log frequency axis and the level axis
    /// `[negative_infinity, 0] dB → [bottom, top]`. Bins outside 20 Hz..20 kHz
    /// and non-finite levels are skipped. Returns `false` if the fifo was full.
    pub fn generate_path(
        &mut self,
        render_data: &[f32],
        bounds: Bounds,
        fft_size: usize,
        bin_width: f32,
        negative_infinity: f32,
    ) -> bool {
        let top = bounds.y;
        let bottom = bounds.bottom();
        let left = bounds.x;
        let width = bounds.width;
        let num_bins = (fft_size / 2).min(render_data.len());

        let map = |v: f32| jmap(v, negative_infinity, 0.0, bottom, top);

        self.scratch.clear();
        let Some(&first) = render_data.first() else {
            return self.paths.push(&self.scratch);
        };

        let y = map(first);
        self.scratch
            .start_new_sub_path(left, if y.is_finite() { y } else { bottom });

        const PATH_RESOLUTION: usize = 2;
        for bin in (1..num_bins).step_by(PATH_RESOLUTION) {
            let bin_freq = bin as f32 * bin_width;
            if bin_freq > MAX_FREQUENCY_HZ {
                break;
            }
            if bin_freq < MIN_FREQUENCY_HZ {
                continue;
            }

            let y = map(render_data[bin]);
            if !y.is_finite() {
                continue;
            }

            let normalized_x = map_from_log10(bin_freq, MIN_FREQUENCY_HZ, MAX_FREQUENCY_HZ);
            let x = left + (normalized_x * width).floor();
            self.scratch.line_to(x, y);
        }

        self.paths.push(&self.scratch)
    }

    /// Copy the oldest queued path into `out`
    pub fn pull_path(&mut self, out: &mut RenderPath) -> bool {
        self.ready.pull(out)
    }

    pub fn available_paths(&self) -> usize {
        self.ready.available_for_read()
    }

    pub fn capacity(&self) -> usize {
        self.paths.capacity()
    }
}
