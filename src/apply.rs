// SPDX-FileCopyrightText: The fir-equalizer authors
// SPDX-License-Identifier: MPL-2.0

use std::sync::Arc;

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::{Error, Result};

/// Minimum number of taps for choosing FFT convolution automatically.
const AUTO_FFT_MIN_TAPS: usize = 64;

/// Minimum number of samples for choosing FFT convolution automatically.
const AUTO_FFT_MIN_SAMPLES: usize = 4_096;

const MIN_FFT_LEN: usize = 256;

/// Convolution strategy
///
/// All strategies compute the same causal, zero-padded convolution
/// truncated to the length of the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Convolution {
    /// FFT for long filters and long inputs, direct otherwise.
    #[default]
    Auto,
    Direct,
    /// Overlap-add in the frequency domain.
    Fft,
}

impl Convolution {
    const fn resolve(self, num_taps: usize, num_samples: usize) -> Self {
        match self {
            Self::Auto => {
                if num_taps >= AUTO_FFT_MIN_TAPS && num_samples >= AUTO_FFT_MIN_SAMPLES {
                    Self::Fft
                } else {
                    Self::Direct
                }
            }
            resolved => resolved,
        }
    }
}

/// Filters the input and returns a new sequence of the same length.
///
/// The output is delayed by the group delay of the filter. FFT plans
/// are created per call and not reused across calls.
pub fn filter(taps: &[f32], input: &[f32], convolution: Convolution) -> Result<Vec<f32>> {
    let mut output = vec![0.0; input.len()];
    filter_into(taps, input, &mut output, convolution)?;
    Ok(output)
}

/// Filters the input into a buffer of the same length.
///
/// All previous contents of `output` are overwritten.
///
/// # Panics
///
/// Panics if `input` and `output` differ in length.
pub fn filter_into(
    taps: &[f32],
    input: &[f32],
    output: &mut [f32],
    convolution: Convolution,
) -> Result<()> {
    if taps.is_empty() {
        return Err(Error::InvalidFilter);
    }
    assert_eq!(input.len(), output.len());
    if input.is_empty() {
        return Ok(());
    }
    match convolution.resolve(taps.len(), input.len()) {
        Convolution::Fft => convolve_overlap_add(taps, input, output),
        Convolution::Direct | Convolution::Auto => convolve_direct(taps, input, output),
    }
    Ok(())
}

// output[n] = sum(taps[k] * input[n - k]) with input[n - k] = 0 for n < k
#[allow(clippy::cast_possible_truncation)]
fn convolve_direct(taps: &[f32], input: &[f32], output: &mut [f32]) {
    debug_assert!(!taps.is_empty());
    let max_delay = taps.len() - 1;
    for (n, sample) in output.iter_mut().enumerate() {
        let history = &input[n.saturating_sub(max_delay)..=n];
        let sum = taps
            .iter()
            .zip(history.iter().rev())
            .map(|(&tap, &x)| f64::from(tap) * f64::from(x))
            .sum::<f64>();
        *sample = sum as f32;
    }
}

// Plans once per call, shared by all blocks of the input.
#[allow(clippy::cast_possible_truncation)]
fn convolve_overlap_add(taps: &[f32], input: &[f32], output: &mut [f32]) {
    let num_taps = taps.len();
    let fft_len = (num_taps * 4).next_power_of_two().max(MIN_FFT_LEN);
    // Each block with its tail fits into the FFT without wrapping around.
    let block_len = fft_len - num_taps + 1;

    let mut planner = FftPlanner::<f64>::new();
    let forward: Arc<dyn Fft<f64>> = planner.plan_fft_forward(fft_len);
    let inverse: Arc<dyn Fft<f64>> = planner.plan_fft_inverse(fft_len);

    let mut spectrum = vec![Complex::default(); fft_len];
    for (bin, &tap) in spectrum.iter_mut().zip(taps) {
        *bin = Complex::new(f64::from(tap), 0.0);
    }
    forward.process(&mut spectrum);

    #[allow(clippy::cast_precision_loss)]
    let scale = (fft_len as f64).recip();
    let mut sum = vec![0.0_f64; input.len()];
    let mut buffer = vec![Complex::default(); fft_len];
    for (block_index, block) in input.chunks(block_len).enumerate() {
        buffer.fill(Complex::default());
        for (bin, &x) in buffer.iter_mut().zip(block) {
            *bin = Complex::new(f64::from(x), 0.0);
        }
        forward.process(&mut buffer);
        for (bin, &h) in buffer.iter_mut().zip(&spectrum) {
            *bin *= h;
        }
        inverse.process(&mut buffer);
        // The tail beyond the end of the input is dropped.
        let offset = block_index * block_len;
        for (acc, bin) in sum[offset..].iter_mut().zip(&buffer) {
            *acc += bin.re * scale;
        }
    }
    for (sample, acc) in output.iter_mut().zip(sum) {
        *sample = acc as f32;
    }
}
