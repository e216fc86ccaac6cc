// SPDX-FileCopyrightText: The fir-equalizer authors
// SPDX-License-Identifier: MPL-2.0

//! Uncompressed WAV input and output.

use std::{
    io::{Read, Seek, Write},
    path::Path,
};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::{Error, Result};

/// Decoded mono audio at its native sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct MonoAudio {
    pub samples: Vec<f32>,
    pub sample_rate_hz: u32,
}

impl MonoAudio {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate_hz == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(self.sample_rate_hz)
    }
}

pub fn read_mono_file(path: impl AsRef<Path>) -> Result<MonoAudio> {
    read_mono_from(WavReader::open(path)?)
}

/// Decodes integer or float PCM and down-mixes all channels.
///
/// Integer samples are scaled into `-1.0..1.0`. Channels are
/// averaged frame by frame.
pub fn read_mono<R: Read>(reader: R) -> Result<MonoAudio> {
    read_mono_from(WavReader::new(reader)?)
}

#[allow(clippy::cast_precision_loss)]
fn read_mono_from<R: Read>(reader: WavReader<R>) -> Result<MonoAudio> {
    let WavSpec {
        channels,
        sample_rate,
        bits_per_sample,
        sample_format,
    } = reader.spec();
    let interleaved = match (sample_format, bits_per_sample) {
        (SampleFormat::Float, 32) => reader.into_samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        (SampleFormat::Int, 1..=32) => {
            let scale = ((1_u64 << (bits_per_sample - 1)) as f32).recip();
            reader
                .into_samples::<i32>()
                .map(|sample| sample.map(|sample| sample as f32 * scale))
                .collect::<Result<Vec<_>, _>>()?
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!(
                "{bits_per_sample} bits per {sample_format:?} sample"
            )));
        }
    };
    let samples = downmix(&interleaved, channels);
    log::debug!(
        "Decoded {num_samples} samples with {channels} channel(s) at {sample_rate} Hz",
        num_samples = samples.len(),
    );
    Ok(MonoAudio {
        samples,
        sample_rate_hz: sample_rate,
    })
}

fn downmix(interleaved: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    let scale = f32::from(channels).recip();
    interleaved
        .chunks(channels.into())
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect()
}

/// Converts a sample into 16-bit PCM, clipping at full scale.
#[allow(clippy::cast_possible_truncation)]
fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16
}

const fn pcm16_spec(sample_rate_hz: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate: sample_rate_hz,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

pub fn write_pcm16_file(
    path: impl AsRef<Path>,
    samples: &[f32],
    sample_rate_hz: u32,
) -> Result<()> {
    let writer = WavWriter::create(path, pcm16_spec(sample_rate_hz))?;
    write_pcm16_to(writer, samples)
}

/// Encodes mono 16-bit PCM.
///
/// Samples outside of `-1.0..=1.0` are clipped.
pub fn write_pcm16<W: Write + Seek>(writer: W, samples: &[f32], sample_rate_hz: u32) -> Result<()> {
    let writer = WavWriter::new(writer, pcm16_spec(sample_rate_hz))?;
    write_pcm16_to(writer, samples)
}

fn write_pcm16_to<W: Write + Seek>(mut writer: WavWriter<W>, samples: &[f32]) -> Result<()> {
    for &sample in samples {
        writer.write_sample(to_pcm16(sample))?;
    }
    writer.finalize()?;
    Ok(())
}
