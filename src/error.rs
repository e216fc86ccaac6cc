// SPDX-FileCopyrightText: The fir-equalizer authors
// SPDX-License-Identifier: MPL-2.0

use thiserror::Error;

/// Errors of a single design or processing call.
///
/// None of them is transient. Retrying with the same arguments
/// always fails in the same way.
#[derive(Debug, Error)]
pub enum Error {
    /// Cutoffs violate `0 < low < high < nyquist`.
    #[error("invalid band {low_hz} Hz - {high_hz} Hz at sample rate {sample_rate_hz} Hz")]
    InvalidBand {
        low_hz: f32,
        high_hz: f32,
        sample_rate_hz: u32,
    },

    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    /// A filter without any taps.
    #[error("invalid filter: no taps")]
    InvalidFilter,

    /// Rejected only with [`GainPolicy::RejectNegative`](crate::GainPolicy::RejectNegative).
    #[error("invalid gain {gain} for band #{band_index}")]
    InvalidGain { band_index: usize, gain: f32 },

    #[error("band #{band_index} out of range with {band_count} bands")]
    BandIndexOutOfRange {
        band_index: usize,
        band_count: usize,
    },

    #[error("expected {expected} gains, got {actual}")]
    GainCountMismatch { expected: usize, actual: usize },

    #[cfg(feature = "wav")]
    #[error("unsupported WAV format: {0}")]
    UnsupportedFormat(String),

    #[cfg(feature = "wav")]
    #[error(transparent)]
    Wav(#[from] hound::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
