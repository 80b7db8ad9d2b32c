//! Triband offline renderer
//!
//! Plays a test tone through the EQ in real-time-sized blocks while the
//! refresh loop paints, and writes every display event to stdout as one JSON
//! object per line. Logs go to stderr.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use crossbeam_channel::unbounded;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use triband_core::{
    Bounds, EngineConfig, EqProcessor, Event, FftOrder, ParamId, ParameterStore, PluginState,
    RefreshLoop, ResponseDisplay,
};

#[derive(Parser)]
#[command(name = "triband")]
#[command(about = "Render a test tone through the three-band EQ and print display frames as JSON")]
struct Cli {
    /// Engine configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Parameter state to start from (JSON)
    #[arg(short, long)]
    state: Option<PathBuf>,

    /// Write the final parameter state here
    #[arg(long)]
    save_state: Option<PathBuf>,

    /// Parameter override as NAME=VALUE, e.g. "Peak Gain=6" (repeatable)
    #[arg(long = "set", value_parser = parse_assignment)]
    overrides: Vec<(ParamId, f32)>,

    /// Test tone frequency in Hz
    #[arg(long, default_value_t = 1000.0)]
    tone: f32,

    /// Test tone amplitude (linear)
    #[arg(long, default_value_t = 0.5)]
    amplitude: f32,

    /// Seconds of audio to render
    #[arg(long, default_value_t = 1.0)]
    seconds: f32,

    /// Analyzer FFT size: 2048, 4096 or 8192
    #[arg(long)]
    fft_size: Option<usize>,

    /// Display width in pixels
    #[arg(long, default_value_t = 600.0)]
    width: f32,

    /// Display height in pixels
    #[arg(long, default_value_t = 300.0)]
    height: f32,

    /// Trace-level logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_assignment(arg: &str) -> Result<(ParamId, f32)> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("expected NAME=VALUE, got {:?}", arg))?;
    let id = ParamId::from_name(name).ok_or_else(|| anyhow!("unknown parameter {:?}", name.trim()))?;
    let value = match value.trim() {
        "on" | "true" => 1.0,
        "off" | "false" => 0.0,
        v => v.parse().with_context(|| format!("bad value for {}", id.name()))?,
    };
    Ok((id, value))
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => EngineConfig::default(),
    };

    if let Some(size) = cli.fft_size {
        config.analyzer.fft_order = FftOrder::try_from(size)?;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "triband=trace" } else { "triband=debug" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();

    if !(cli.seconds > 0.0 && cli.seconds.is_finite()) {
        bail!("--seconds must be positive");
    }
    if !(cli.width >= 1.0 && cli.height >= 1.0) {
        bail!("display must be at least 1x1 pixels");
    }

    let config = load_config(&cli)?;
    info!(
        "Stream {} Hz / {} samples ({:.1} ms), analyzer {} points at {} Hz",
        config.stream.sample_rate,
        config.stream.block_size,
        config.stream.latency_ms(),
        config.analyzer.fft_order.fft_size(),
        config.analyzer.refresh_hz
    );

    let params = Arc::new(ParameterStore::new());
    if let Some(path) = &cli.state {
        let bytes = fs::read(path).with_context(|| format!("reading state {}", path.display()))?;
        params.restore(&PluginState::from_bytes(&bytes)?);
        info!("Restored parameters from {}", path.display());
    }
    for &(id, value) in &cli.overrides {
        let stored = params.set(id, value);
        debug!("{} = {}", id.name(), stored);
    }

    let sample_rate = config.stream.sample_rate as f64;
    let block_size = config.stream.block_size as usize;

    let (mut processor, taps) = EqProcessor::new(Arc::clone(&params), config.analyzer.fifo_capacity);
    processor.prepare(sample_rate, block_size)?;

    let mut display = ResponseDisplay::new(Arc::clone(&params), taps, &config.analyzer);
    display.set_sample_rate(sample_rate);

    let (tx, rx) = unbounded();
    let printer = thread::Builder::new()
        .name("triband-print".into())
        .spawn(move || -> io::Result<usize> {
            let mut out = BufWriter::new(io::stdout().lock());
            let mut frames = 0;
            for event in rx {
                if matches!(event, Event::Frame { .. }) {
                    frames += 1;
                }
                serde_json::to_writer(&mut out, &event)?;
                out.write_all(b"\n")?;
            }
            out.flush()?;
            Ok(frames)
        })
        .context("spawning output thread")?;

    let bounds = Bounds::new(0.0, 0.0, cli.width, cli.height);
    let mut refresh = RefreshLoop::spawn(display, bounds, config.analyzer.refresh_hz, tx)?;

    // Pace blocks at the stream rate so the collectors drain like they would live
    let block_period = Duration::from_secs_f64(block_size as f64 / sample_rate);
    let total_blocks = (cli.seconds as f64 * sample_rate / block_size as f64).ceil() as usize;
    let phase_step = 2.0 * std::f64::consts::PI * cli.tone as f64 / sample_rate;
    let mut phase = 0.0_f64;
    let mut left = vec![0.0_f32; block_size];
    let mut right = vec![0.0_f32; block_size];
    let mut output_peak = 0.0_f32;

    for _ in 0..total_blocks {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let sample = (phase.sin() as f32) * cli.amplitude;
            *l = sample;
            *r = sample;
            phase = (phase + phase_step) % (2.0 * std::f64::consts::PI);
        }

        processor.process_block(&mut left, &mut right);
        output_peak = left.iter().fold(output_peak, |peak, s| peak.max(s.abs()));

        thread::sleep(block_period);
    }

    let display = refresh.stop()?;

    let frames = printer
        .join()
        .map_err(|_| anyhow!("output thread panicked"))?
        .context("writing frames")?;

    let chain_gain_db = display.chain().magnitude_db(cli.tone as f64, sample_rate);
    info!(
        "Rendered {} blocks, {} frames, output peak {:.1} dB (chain gain at {} Hz: {:.1} dB)",
        total_blocks,
        frames,
        20.0 * output_peak.max(1e-9).log10(),
        cli.tone,
        chain_gain_db
    );

    if let Some(path) = &cli.save_state {
        params.state().save_to(path)?;
    }

    Ok(())
}
