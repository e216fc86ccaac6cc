// SPDX-FileCopyrightText: The fir-equalizer authors
// SPDX-License-Identifier: MPL-2.0

//! Equalizes a WAV file with adjustable bass, mid, and treble gains.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context as _, Result, bail};
use clap::{Parser, ValueEnum};
use fir_equalizer::{
    DesignParams, Equalizer, EqualizerConfig, EqualizerRequest, OutputPolicy, peak, wav,
};
use log::{info, warn};

/// Larger inputs are rejected before decoding.
const MAX_INPUT_BYTES: u64 = 100 * 1024 * 1024;

const MIN_GAIN: f32 = 0.0;
const MAX_GAIN: f32 = 2.0;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputArg {
    /// Keep samples beyond full scale (clipped when encoding)
    Unclamped,
    /// Clip samples at full scale
    Clip,
    /// Attenuate if the peak exceeds full scale
    Normalize,
}

impl From<OutputArg> for OutputPolicy {
    fn from(arg: OutputArg) -> Self {
        match arg {
            OutputArg::Unclamped => Self::Unclamped,
            OutputArg::Clip => Self::Clip,
            OutputArg::Normalize => Self::PeakNormalize,
        }
    }
}

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Input WAV file
    input: PathBuf,

    /// Output WAV file (16-bit PCM, mono)
    output: PathBuf,

    /// Gain of the bass band (60 Hz - 250 Hz)
    #[arg(long, default_value_t = 1.0, value_parser = parse_gain)]
    bass: f32,

    /// Gain of the mid band (250 Hz - 4 kHz)
    #[arg(long, default_value_t = 1.0, value_parser = parse_gain)]
    mid: f32,

    /// Gain of the treble band (4 kHz - 10 kHz)
    #[arg(long, default_value_t = 1.0, value_parser = parse_gain)]
    treble: f32,

    /// Number of filter taps per band
    #[arg(long, default_value_t = fir_equalizer::DEFAULT_NUM_TAPS)]
    taps: usize,

    /// Post-processing before encoding
    #[arg(long, value_enum, default_value_t = OutputArg::Unclamped)]
    output_policy: OutputArg,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn parse_gain(arg: &str) -> Result<f32, String> {
    let gain = arg
        .parse::<f32>()
        .map_err(|err| format!("not a number: {err}"))?;
    if !(MIN_GAIN..=MAX_GAIN).contains(&gain) {
        return Err(format!("must be between {MIN_GAIN} and {MAX_GAIN}"));
    }
    Ok(gain)
}

/// Returns the size of the file in bytes if it is within the limit.
fn check_input_size(path: &Path) -> Result<u64> {
    let len = fs::metadata(path)
        .with_context(|| format!("Failed to access {}", path.display()))?
        .len();
    if len > MAX_INPUT_BYTES {
        bail!(
            "{} exceeds the size limit of {} MiB",
            path.display(),
            MAX_INPUT_BYTES / (1024 * 1024)
        );
    }
    Ok(len)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    check_input_size(&args.input)?;
    let audio = wav::read_mono_file(&args.input)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;
    info!(
        "Loaded {}: {:.1} s at {} Hz",
        args.input.display(),
        audio.duration_secs(),
        audio.sample_rate_hz
    );

    let equalizer = Equalizer::new(EqualizerConfig {
        design: DesignParams {
            num_taps: args.taps,
            ..DesignParams::DEFAULT
        },
        // Single request.
        cache_taps: false,
        ..EqualizerConfig::DEFAULT
    });
    let mut output = equalizer
        .process(&EqualizerRequest {
            samples: &audio.samples,
            sample_rate_hz: audio.sample_rate_hz,
            gains: &[args.bass, args.mid, args.treble],
        })
        .context("Failed to equalize")?;

    let output_peak = peak(&output);
    if output_peak > 1.0 {
        warn!("Output peak {output_peak:.3} exceeds full scale");
    }
    OutputPolicy::from(args.output_policy).apply(&mut output);

    wav::write_pcm16_file(&args.output, &output, audio.sample_rate_hz)
        .with_context(|| format!("Failed to save {}", args.output.display()))?;
    info!("Saved {}", args.output.display());
    Ok(())
}
