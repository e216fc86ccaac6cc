// SPDX-FileCopyrightText: The fir-equalizer authors
// SPDX-License-Identifier: MPL-2.0

use std::sync::{Arc, LazyLock};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::{
    BandTable, Convolution, DesignParams, Error, FilterTaps, Result, TapCache, TapKey,
    apply::{filter, filter_into},
    design::design_bandpass,
};

/// Handling of gains that no slider would produce
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GainPolicy {
    /// Accept any gain.
    ///
    /// Negative gains invert the phase of the band.
    #[default]
    Permissive,

    /// Reject negative and non-finite gains.
    RejectNegative,
}

impl GainPolicy {
    fn check(self, gains: &[f32]) -> Result<()> {
        match self {
            Self::Permissive => Ok(()),
            Self::RejectNegative => gains
                .iter()
                .position(|gain| !(gain.is_finite() && *gain >= 0.0))
                .map_or(Ok(()), |band_index| {
                    Err(Error::InvalidGain {
                        band_index,
                        gain: gains[band_index],
                    })
                }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EqualizerConfig {
    pub bands: BandTable,
    pub design: DesignParams,
    pub convolution: Convolution,
    pub gain_policy: GainPolicy,

    /// Filter all bands concurrently.
    ///
    /// Only effective with the `rayon` feature. The result is
    /// identical to sequential processing.
    pub parallel: bool,

    /// Reuse the taps of previous requests with the same sample rate.
    pub cache_taps: bool,
}

impl EqualizerConfig {
    pub const DEFAULT: Self = Self {
        bands: BandTable::DEFAULT,
        design: DesignParams::DEFAULT,
        convolution: Convolution::Auto,
        gain_policy: GainPolicy::Permissive,
        parallel: true,
        cache_taps: true,
    };
}

impl Default for EqualizerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Input of a single processing call
///
/// One gain per band, in the order of the band table.
#[derive(Debug, Clone, Copy)]
pub struct EqualizerRequest<'a> {
    pub samples: &'a [f32],
    pub sample_rate_hz: u32,
    pub gains: &'a [f32],
}

/// Filter-bank equalizer
///
/// Processing is a pure function of the request. The only state is
/// the optional cache of designed taps, which is safe to share
/// between threads.
#[derive(Debug)]
pub struct Equalizer {
    config: EqualizerConfig,
    tap_cache: Option<TapCache>,
}

impl Default for Equalizer {
    fn default() -> Self {
        Self::new(Default::default())
    }
}

impl Equalizer {
    #[must_use]
    pub fn new(config: EqualizerConfig) -> Self {
        let tap_cache = config.cache_taps.then(TapCache::new);
        Self { config, tap_cache }
    }

    #[must_use]
    pub const fn config(&self) -> &EqualizerConfig {
        &self.config
    }

    /// Taps of a single band.
    pub fn band_taps(&self, band_index: usize, sample_rate_hz: u32) -> Result<Arc<FilterTaps>> {
        let bands = self.config.bands.bands();
        let Some(&band) = bands.get(band_index) else {
            return Err(Error::BandIndexOutOfRange {
                band_index,
                band_count: bands.len(),
            });
        };
        let design = || design_bandpass(band, sample_rate_hz, self.config.design);
        let Some(tap_cache) = &self.tap_cache else {
            return design().map(Arc::new);
        };
        let key = TapKey {
            band_index,
            sample_rate_hz,
            num_taps: self.config.design.num_taps,
        };
        tap_cache.get_or_design(key, design)
    }

    fn all_band_taps(&self, sample_rate_hz: u32) -> Result<Vec<Arc<FilterTaps>>> {
        (0..self.config.bands.len())
            .map(|band_index| self.band_taps(band_index, sample_rate_hz))
            .collect()
    }

    /// Sum of all gain-weighted band outputs
    ///
    /// The output has the same length as the input. It is neither
    /// clipped nor normalized and delayed by the group delay of the
    /// filters. All bands are designed before filtering starts, so
    /// nothing is filtered if any band is invalid.
    pub fn process(&self, request: &EqualizerRequest<'_>) -> Result<Vec<f32>> {
        let EqualizerRequest {
            samples,
            sample_rate_hz,
            gains,
        } = *request;
        let band_count = self.config.bands.len();
        if gains.len() != band_count {
            return Err(Error::GainCountMismatch {
                expected: band_count,
                actual: gains.len(),
            });
        }
        self.config.gain_policy.check(gains)?;
        let band_taps = self.all_band_taps(sample_rate_hz)?;
        log::debug!(
            "Processing {num_samples} samples at {sample_rate_hz} Hz with gains {gains:?}",
            num_samples = samples.len(),
        );
        if self.config.parallel {
            self.mix_parallel(&band_taps, samples, gains)
        } else {
            self.mix_sequential(&band_taps, samples, gains)
        }
    }

    /// Output of each band at unity gain, in the order of the band table.
    pub fn band_components(&self, samples: &[f32], sample_rate_hz: u32) -> Result<Vec<Vec<f32>>> {
        let band_taps = self.all_band_taps(sample_rate_hz)?;
        band_taps
            .iter()
            .map(|taps| filter(taps.as_slice(), samples, self.config.convolution))
            .collect()
    }

    // Reuses a single scratch buffer for all bands.
    fn mix_sequential(
        &self,
        band_taps: &[Arc<FilterTaps>],
        samples: &[f32],
        gains: &[f32],
    ) -> Result<Vec<f32>> {
        let mut output = vec![0.0; samples.len()];
        let mut scratch = vec![0.0; samples.len()];
        for (taps, &gain) in band_taps.iter().zip(gains) {
            filter_into(
                taps.as_slice(),
                samples,
                &mut scratch,
                self.config.convolution,
            )?;
            accumulate(&mut output, &scratch, gain);
        }
        Ok(output)
    }

    #[cfg(feature = "rayon")]
    fn mix_parallel(
        &self,
        band_taps: &[Arc<FilterTaps>],
        samples: &[f32],
        gains: &[f32],
    ) -> Result<Vec<f32>> {
        let filtered = band_taps
            .par_iter()
            .map(|taps| filter(taps.as_slice(), samples, self.config.convolution))
            .collect::<Result<Vec<_>>>()?;
        let mut output = vec![0.0; samples.len()];
        // Summed in band order, same as sequential.
        for (band, &gain) in filtered.iter().zip(gains) {
            accumulate(&mut output, band, gain);
        }
        Ok(output)
    }

    #[cfg(not(feature = "rayon"))]
    fn mix_parallel(
        &self,
        band_taps: &[Arc<FilterTaps>],
        samples: &[f32],
        gains: &[f32],
    ) -> Result<Vec<f32>> {
        self.mix_sequential(band_taps, samples, gains)
    }
}

fn accumulate(output: &mut [f32], band: &[f32], gain: f32) {
    debug_assert_eq!(output.len(), band.len());
    for (sum, &sample) in output.iter_mut().zip(band) {
        *sum += sample * gain;
    }
}

static DEFAULT_EQUALIZER: LazyLock<Equalizer> = LazyLock::new(Equalizer::default);

/// Equalizes with the default bass, mid, and treble bands.
///
/// Taps are cached per sample rate for the lifetime of the process.
/// The cache grows with every distinct sample rate and is never
/// evicted. Use a dedicated [`Equalizer`] to control its lifetime.
pub fn process(samples: &[f32], sample_rate_hz: u32, gains: [f32; 3]) -> Result<Vec<f32>> {
    DEFAULT_EQUALIZER.process(&EqualizerRequest {
        samples,
        sample_rate_hz,
        gains: &gains,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Band;

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn chirp(len: usize, sample_rate_hz: u32) -> Vec<f32> {
        let sample_rate = f64::from(sample_rate_hz);
        (0..len)
            .map(|i| {
                let t = i as f64 / sample_rate;
                // Sweeps from 20 Hz up to ~11 kHz within 1 second.
                let phase = 2.0 * std::f64::consts::PI * (20.0 * t + 5_500.0 * t * t);
                (0.8 * phase.sin()) as f32
            })
            .collect()
    }

    #[test]
    fn preserve_length() {
        for len in [0, 1, 50, 101, 4_096, 10_000] {
            let samples = chirp(len, 44_100);
            let output = process(&samples, 44_100, [1.0, 0.5, 2.0]).unwrap();
            assert_eq!(output.len(), len);
        }
    }

    #[test]
    fn zero_gains_yield_silence() {
        let samples = chirp(5_000, 44_100);
        let output = process(&samples, 44_100, [0.0, 0.0, 0.0]).unwrap();
        assert!(output.iter().all(|&sample| sample == 0.0));
    }

    #[test]
    fn silence_in_silence_out() {
        let samples = vec![0.0; 3_000];
        let output = process(&samples, 48_000, [2.0, -1.0, 0.7]).unwrap();
        assert_eq!(output, samples);
    }

    #[test]
    fn superposition_of_band_components() {
        let samples = chirp(8_000, 44_100);
        let gains = [1.5, 0.25, 0.8];
        let equalizer = Equalizer::default();
        let output = equalizer
            .process(&EqualizerRequest {
                samples: &samples,
                sample_rate_hz: 44_100,
                gains: &gains,
            })
            .unwrap();
        let components = equalizer.band_components(&samples, 44_100).unwrap();
        assert_eq!(components.len(), 3);
        for (i, &actual) in output.iter().enumerate() {
            let expected = components
                .iter()
                .zip(gains)
                .map(|(component, gain)| component[i] * gain)
                .sum::<f32>();
            assert!((actual - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn sequential_and_parallel_are_identical() {
        let samples = chirp(20_000, 48_000);
        let gains = [0.3, 1.7, 1.1];
        let request = EqualizerRequest {
            samples: &samples,
            sample_rate_hz: 48_000,
            gains: &gains,
        };
        let parallel = Equalizer::new(EqualizerConfig {
            parallel: true,
            ..EqualizerConfig::DEFAULT
        })
        .process(&request)
        .unwrap();
        let sequential = Equalizer::new(EqualizerConfig {
            parallel: false,
            cache_taps: false,
            ..EqualizerConfig::DEFAULT
        })
        .process(&request)
        .unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn direct_and_fft_convolution_agree() {
        let samples = chirp(12_000, 44_100);
        let gains = [1.0, 1.0, 1.0];
        let request = EqualizerRequest {
            samples: &samples,
            sample_rate_hz: 44_100,
            gains: &gains,
        };
        let direct = Equalizer::new(EqualizerConfig {
            convolution: Convolution::Direct,
            ..EqualizerConfig::DEFAULT
        })
        .process(&request)
        .unwrap();
        let fft = Equalizer::new(EqualizerConfig {
            convolution: Convolution::Fft,
            ..EqualizerConfig::DEFAULT
        })
        .process(&request)
        .unwrap();
        for (lhs, rhs) in direct.iter().zip(&fft) {
            assert!((lhs - rhs).abs() < 1e-5);
        }
    }

    #[test]
    fn negative_gains_are_accepted_by_default() {
        let samples = chirp(2_000, 44_100);
        let positive = process(&samples, 44_100, [1.0, 1.0, 1.0]).unwrap();
        let negative = process(&samples, 44_100, [-1.0, -1.0, -1.0]).unwrap();
        for (lhs, rhs) in positive.iter().zip(&negative) {
            assert!((lhs + rhs).abs() < 1e-6);
        }
    }

    #[test]
    fn reject_negative_gains_if_strict() {
        let equalizer = Equalizer::new(EqualizerConfig {
            gain_policy: GainPolicy::RejectNegative,
            ..EqualizerConfig::DEFAULT
        });
        for (gains, expected_index) in [([1.0, -0.1, 1.0], 1), ([f32::NAN, 1.0, 1.0], 0)] {
            let err = equalizer
                .process(&EqualizerRequest {
                    samples: &[0.5; 10],
                    sample_rate_hz: 44_100,
                    gains: &gains,
                })
                .unwrap_err();
            assert!(matches!(
                err,
                Error::InvalidGain { band_index, .. } if band_index == expected_index
            ));
        }
        assert!(
            equalizer
                .process(&EqualizerRequest {
                    samples: &[0.5; 10],
                    sample_rate_hz: 44_100,
                    gains: &[0.0, 2.0, 1.0],
                })
                .is_ok()
        );
    }

    #[test]
    fn gain_count_must_match_band_count() {
        let err = Equalizer::default()
            .process(&EqualizerRequest {
                samples: &[0.0; 4],
                sample_rate_hz: 44_100,
                gains: &[1.0, 1.0],
            })
            .unwrap_err();
        assert!(matches!(
            err,
            Error::GainCountMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn abort_on_invalid_band() {
        // Treble exceeds the Nyquist frequency.
        let err = process(&[0.1; 100], 16_000, [1.0, 1.0, 1.0]).unwrap_err();
        assert!(matches!(err, Error::InvalidBand { .. }));
        // Even without any samples.
        assert!(process(&[], 16_000, [1.0, 1.0, 1.0]).is_err());
    }

    #[test]
    fn custom_band_table() {
        let equalizer = Equalizer::new(EqualizerConfig {
            bands: BandTable::new([Band::new(100.0, 1_000.0), Band::new(1_000.0, 3_000.0)]),
            ..EqualizerConfig::DEFAULT
        });
        let samples = chirp(1_000, 8_000);
        let output = equalizer
            .process(&EqualizerRequest {
                samples: &samples,
                sample_rate_hz: 8_000,
                gains: &[1.0, 0.5],
            })
            .unwrap();
        assert_eq!(output.len(), samples.len());
    }

    #[test]
    fn empty_band_table_yields_silence() {
        let equalizer = Equalizer::new(EqualizerConfig {
            bands: BandTable::new(Vec::new()),
            ..EqualizerConfig::DEFAULT
        });
        let output = equalizer
            .process(&EqualizerRequest {
                samples: &[1.0; 16],
                sample_rate_hz: 44_100,
                gains: &[],
            })
            .unwrap();
        assert_eq!(output, vec![0.0; 16]);
    }

    #[test]
    fn cache_taps_per_sample_rate() {
        let equalizer = Equalizer::default();
        let first = equalizer.band_taps(0, 44_100).unwrap();
        let second = equalizer.band_taps(0, 44_100).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        let other = equalizer.band_taps(0, 48_000).unwrap();
        assert!(!Arc::ptr_eq(&first, &other));
        assert_ne!(*first, *other);
    }

    #[test]
    fn band_index_out_of_range() {
        for equalizer in [
            Equalizer::default(),
            Equalizer::new(EqualizerConfig {
                cache_taps: false,
                ..EqualizerConfig::DEFAULT
            }),
        ] {
            let err = equalizer.band_taps(3, 44_100).unwrap_err();
            assert!(matches!(
                err,
                Error::BandIndexOutOfRange {
                    band_index: 3,
                    band_count: 3
                }
            ));
        }
    }

    #[test]
    fn default_equalizer_keeps_taps_of_each_sample_rate() {
        let tap_cache = DEFAULT_EQUALIZER.tap_cache.as_ref().unwrap();
        // No other test uses this sample rate.
        let sample_rate_hz = 37_800;
        let before = tap_cache.len();
        process(&[0.5; 8], sample_rate_hz, [1.0, 1.0, 1.0]).unwrap();
        let after = tap_cache.len();
        assert!(after >= before + 3);
        process(&[0.5; 8], sample_rate_hz, [1.0, 1.0, 1.0]).unwrap();
        assert!(tap_cache.len() >= after);
    }

    #[test]
    fn cached_and_uncached_taps_are_equal() {
        let cached = Equalizer::default();
        let uncached = Equalizer::new(EqualizerConfig {
            cache_taps: false,
            ..EqualizerConfig::DEFAULT
        });
        for band_index in 0..3 {
            assert_eq!(
                *cached.band_taps(band_index, 44_100).unwrap(),
                *uncached.band_taps(band_index, 44_100).unwrap()
            );
        }
    }
}
