// SPDX-FileCopyrightText: The fir-equalizer authors
// SPDX-License-Identifier: MPL-2.0

use std::f64::consts::PI;

/// Tapering window applied to the truncated ideal response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Window {
    #[default]
    Hamming,
    Hann,
    Blackman,
    /// Plain truncation.
    Rectangular,
}

impl Window {
    /// Window weight at `offset` samples from the center of a
    /// symmetric window with `len` points.
    ///
    /// Depends only on the distance from the center, so weights at
    /// mirrored positions are identical.
    #[must_use]
    pub fn weight(self, offset: f64, len: usize) -> f64 {
        debug_assert!(len > 0);
        if len == 1 {
            return 1.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let phase = 2.0 * PI * offset.abs() / (len - 1) as f64;
        // Generalized cosine windows expressed relative to the center.
        match self {
            Self::Hamming => 0.54 + 0.46 * phase.cos(),
            Self::Hann => 0.5 + 0.5 * phase.cos(),
            Self::Blackman => 0.42 + 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos(),
            Self::Rectangular => 1.0,
        }
    }
}
