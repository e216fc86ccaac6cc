// SPDX-FileCopyrightText: The fir-equalizer authors
// SPDX-License-Identifier: MPL-2.0

#![allow(rustdoc::invalid_rust_codeblocks)]
#![doc = include_str!("../README.md")]

mod apply;
pub use apply::{Convolution, filter, filter_into};

mod band;
pub use band::{Band, BandTable, NormalizedCutoffs};

mod cache;
pub use cache::{TapCache, TapKey};

mod design;
pub use design::{DEFAULT_NUM_TAPS, DesignParams, FilterTaps, design_bandpass};

mod engine;
pub use engine::{Equalizer, EqualizerConfig, EqualizerRequest, GainPolicy, process};

mod error;
pub use error::{Error, Result};

mod output;
pub use output::{OutputPolicy, peak};

#[cfg(feature = "wav")]
pub mod wav;

mod window;
pub use window::Window;
