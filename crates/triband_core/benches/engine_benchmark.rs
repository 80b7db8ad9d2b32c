//! Engine benchmarks
//!
//! Measures the per-callback cost on the audio thread and the per-tick cost
//! on the display thread.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use triband_core::{AnalyzerConfig, Bounds, EqProcessor, ParamId, ParameterStore, ResponseDisplay};

fn benchmark_process_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("eq_processor");

    // Typical buffer sizes used in real-time audio
    for block_size in [64, 128, 256, 512, 1024] {
        let params = Arc::new(ParameterStore::new());
        params.set(ParamId::LowCutSlope, 3.0);
        params.set(ParamId::HighCutSlope, 3.0);
        params.set(ParamId::PeakGain, 6.0);

        let (mut processor, _taps) = EqProcessor::new(Arc::clone(&params), 30);
        processor.prepare(48000.0, block_size).unwrap();

        let mut left: Vec<f32> = (0..block_size).map(|i| (i as f32 * 0.001).sin()).collect();
        let mut right = left.clone();

        group.throughput(Throughput::Elements(block_size as u64 * 2));
        group.bench_function(format!("process_block_{}_samples", block_size), |b| {
            b.iter(|| {
                processor.process_block(black_box(&mut left), black_box(&mut right));
            })
        });
    }

    group.finish();
}

fn benchmark_display_tick(c: &mut Criterion) {
    let params = Arc::new(ParameterStore::new());
    let (mut processor, taps) = EqProcessor::new(Arc::clone(&params), 30);
    processor.prepare(48000.0, 512).unwrap();
    let mut display = ResponseDisplay::new(Arc::clone(&params), taps, &AnalyzerConfig::default());

    let mut left: Vec<f32> = (0..512).map(|i| (i as f32 * 0.05).sin()).collect();
    let mut right = left.clone();
    let bounds = Bounds::default();
    let mut gain = 0.0_f32;

    c.bench_function("display_tick_with_change", |b| {
        b.iter(|| {
            processor.process_block(&mut left, &mut right);
            gain = (gain + 0.5) % 24.0;
            params.set(ParamId::PeakGain, gain);
            black_box(display.tick(bounds));
        })
    });
}

criterion_group!(benches, benchmark_process_block, benchmark_display_tick);
criterion_main!(benches);
