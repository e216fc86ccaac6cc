// SPDX-FileCopyrightText: The fir-equalizer authors
// SPDX-License-Identifier: MPL-2.0

/// Post-processing of equalized samples before playback or encoding
///
/// The equalizer itself never limits its output. Boosted bands may
/// exceed the nominal amplitude range of `-1.0..=1.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputPolicy {
    /// Leave the samples untouched.
    #[default]
    Unclamped,

    /// Clip each sample into the nominal range.
    Clip,

    /// Scale all samples uniformly if the peak exceeds the nominal range.
    ///
    /// Quieter signals are not amplified.
    PeakNormalize,
}

impl OutputPolicy {
    pub fn apply(self, samples: &mut [f32]) {
        match self {
            Self::Unclamped => (),
            Self::Clip => {
                for sample in samples {
                    *sample = sample.clamp(-1.0, 1.0);
                }
            }
            Self::PeakNormalize => {
                let peak = peak(samples);
                if peak > 1.0 {
                    let scale = peak.recip();
                    for sample in samples {
                        *sample *= scale;
                    }
                }
            }
        }
    }
}

/// Absolute peak value, ignoring NaN.
#[must_use]
pub fn peak(samples: &[f32]) -> f32 {
    samples
        .iter()
        .fold(0.0_f32, |peak, sample| peak.max(sample.abs()))
}
