// SPDX-FileCopyrightText: The fir-equalizer authors
// SPDX-License-Identifier: MPL-2.0

use std::borrow::Cow;

use biquad::Hertz;

use crate::{Error, Result};

/// Relative distance from Nyquist that is still considered to be Nyquist.
const NYQUIST_TOLERANCE: f64 = f32::EPSILON as f64;

/// Relative distance below Nyquist for clamped upper cutoffs.
///
/// A normalized cutoff of exactly 1.0 would degenerate the design.
const NYQUIST_GUARD: f64 = 1e-6;

/// A fixed bandpass region.
///
/// Valid only for sample rates with `0 < low_hz < high_hz < nyquist`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub low_hz: f32,
    pub high_hz: f32,
}

impl Band {
    pub const BASS: Self = Self::new(60.0, 250.0);
    pub const MID: Self = Self::new(250.0, 4_000.0);
    pub const TREBLE: Self = Self::new(4_000.0, 10_000.0);

    #[must_use]
    pub const fn new(low_hz: f32, high_hz: f32) -> Self {
        Self { low_hz, high_hz }
    }

    /// Cutoffs as fractions of the Nyquist frequency
    ///
    /// An upper cutoff that equals Nyquist within floating-point
    /// tolerance is moved slightly below it.
    pub fn normalized_cutoffs(self, sample_rate_hz: u32) -> Result<NormalizedCutoffs> {
        if sample_rate_hz == 0 {
            return Err(Error::InvalidSampleRate(sample_rate_hz));
        }
        let Self { low_hz, high_hz } = self;
        let invalid = || Error::InvalidBand {
            low_hz,
            high_hz,
            sample_rate_hz,
        };
        // Rejects zero, negative, and NaN cutoffs.
        let low = Hertz::<f32>::from_hz(low_hz).map_err(|_| invalid())?;
        let high = Hertz::<f32>::from_hz(high_hz).map_err(|_| invalid())?;
        let nyquist = f64::from(sample_rate_hz) / 2.0;
        let low = f64::from(low.hz());
        let mut high = f64::from(high.hz());
        if (high - nyquist).abs() <= nyquist * NYQUIST_TOLERANCE {
            high = nyquist * (1.0 - NYQUIST_GUARD);
        }
        if high >= nyquist || low >= high {
            return Err(invalid());
        }
        Ok(NormalizedCutoffs {
            low: low / nyquist,
            high: high / nyquist,
        })
    }
}

/// Band edges relative to Nyquist, both in the open interval `(0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedCutoffs {
    pub low: f64,
    pub high: f64,
}

impl NormalizedCutoffs {
    #[must_use]
    pub const fn center(self) -> f64 {
        0.5 * (self.low + self.high)
    }
}

/// Ordered list of bands
///
/// The order determines the order of the gains.
#[derive(Debug, Clone, PartialEq)]
pub struct BandTable {
    bands: Cow<'static, [Band]>,
}

impl BandTable {
    /// Bass, mid, and treble.
    pub const DEFAULT: Self = Self {
        bands: Cow::Borrowed(&[Band::BASS, Band::MID, Band::TREBLE]),
    };

    #[must_use]
    pub fn new(bands: impl Into<Vec<Band>>) -> Self {
        Self {
            bands: Cow::Owned(bands.into()),
        }
    }

    #[must_use]
    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Checks all bands against the sample rate.
    pub fn validate(&self, sample_rate_hz: u32) -> Result<()> {
        for band in self.bands.iter() {
            band.normalized_cutoffs(sample_rate_hz)?;
        }
        Ok(())
    }
}

impl Default for BandTable {
    fn default() -> Self {
        Self::DEFAULT
    }
}
