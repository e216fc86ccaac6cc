// SPDX-FileCopyrightText: The fir-equalizer authors
// SPDX-License-Identifier: MPL-2.0

use std::f64::consts::PI;

use crate::{Band, Error, Result, Window};

/// Odd, for an integer group delay of 50 samples.
pub const DEFAULT_NUM_TAPS: usize = 101;

/// Coefficients of a finite impulse response
///
/// Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterTaps(Vec<f32>);

impl FilterTaps {
    pub fn new(taps: Vec<f32>) -> Result<Self> {
        if taps.is_empty() {
            return Err(Error::InvalidFilter);
        }
        Ok(Self(taps))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    #[must_use]
    #[allow(clippy::len_without_is_empty)] // never empty
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Delay in samples imposed by a symmetric filter of this length.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn group_delay(&self) -> f32 {
        (self.0.len() - 1) as f32 / 2.0
    }

    #[must_use]
    pub fn is_symmetric(&self, tolerance: f32) -> bool {
        self.0
            .iter()
            .zip(self.0.iter().rev())
            .all(|(lhs, rhs)| (lhs - rhs).abs() <= tolerance)
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl AsRef<[f32]> for FilterTaps {
    fn as_ref(&self) -> &[f32] {
        self.as_slice()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesignParams {
    pub num_taps: usize,
    pub window: Window,

    /// Scale the taps for unity gain at the center of the pass band.
    pub scale: bool,
}

impl DesignParams {
    pub const DEFAULT: Self = Self {
        num_taps: DEFAULT_NUM_TAPS,
        window: Window::Hamming,
        scale: true,
    };
}

impl Default for DesignParams {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Normalized sinc, i.e. `sin(pi * x) / (pi * x)`.
fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let arg = PI * x;
        arg.sin() / arg
    }
}

/// Linear-phase bandpass by the windowed-sinc method
///
/// The ideal response is the difference of two ideal lowpass responses
/// at the upper and lower cutoff, truncated to `num_taps` samples around
/// the midpoint and tapered by the window. All terms depend only on the
/// distance from the midpoint, so the resulting taps are exactly symmetric.
pub fn design_bandpass(
    band: Band,
    sample_rate_hz: u32,
    params: DesignParams,
) -> Result<FilterTaps> {
    let DesignParams {
        num_taps,
        window,
        scale,
    } = params;
    if num_taps == 0 {
        return Err(Error::InvalidFilter);
    }
    let cutoffs = band.normalized_cutoffs(sample_rate_hz)?;
    #[allow(clippy::cast_precision_loss)]
    let center = (num_taps - 1) as f64 / 2.0;
    #[allow(clippy::cast_precision_loss)]
    let offsets = (0..num_taps).map(|i| (i as f64 - center).abs());
    let mut taps = offsets
        .clone()
        .map(|offset| {
            let ideal = cutoffs.high * sinc(cutoffs.high * offset)
                - cutoffs.low * sinc(cutoffs.low * offset);
            ideal * window.weight(offset, num_taps)
        })
        .collect::<Vec<f64>>();
    if scale {
        // Zero-phase response at the band center.
        let center_freq = cutoffs.center();
        let gain = taps
            .iter()
            .zip(offsets)
            .map(|(tap, offset)| tap * (PI * offset * center_freq).cos())
            .sum::<f64>();
        if !gain.is_normal() {
            return Err(Error::InvalidBand {
                low_hz: band.low_hz,
                high_hz: band.high_hz,
                sample_rate_hz,
            });
        }
        for tap in &mut taps {
            *tap /= gain;
        }
    }
    log::trace!(
        "Designed {num_taps} taps for {low_hz} Hz - {high_hz} Hz at {sample_rate_hz} Hz",
        low_hz = band.low_hz,
        high_hz = band.high_hz,
    );
    #[allow(clippy::cast_possible_truncation)]
    FilterTaps::new(taps.into_iter().map(|tap| tap as f32).collect())
}
