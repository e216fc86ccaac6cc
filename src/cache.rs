// SPDX-FileCopyrightText: The fir-equalizer authors
// SPDX-License-Identifier: MPL-2.0

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use crate::{FilterTaps, Result};

/// Taps only depend on these values.
///
/// The band is identified by its index into an immutable band table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TapKey {
    pub band_index: usize,
    pub sample_rate_hz: u32,
    pub num_taps: usize,
}

/// Read-through cache of designed filters
#[derive(Debug, Default)]
pub struct TapCache {
    entries: Mutex<HashMap<TapKey, Arc<FilterTaps>>>,
}

impl TapCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached taps or designs and caches them.
    ///
    /// Failed designs are not cached. Concurrent misses for the same
    /// key may design the taps more than once, the first one wins.
    pub fn get_or_design(
        &self,
        key: TapKey,
        design: impl FnOnce() -> Result<FilterTaps>,
    ) -> Result<Arc<FilterTaps>> {
        if let Some(taps) = self.lock().get(&key) {
            log::trace!("Reusing cached taps for {key:?}");
            return Ok(Arc::clone(taps));
        }
        // Not holding the lock while designing.
        let taps = Arc::new(design()?);
        let mut entries = self.lock();
        let cached = entries.entry(key).or_insert(taps);
        Ok(Arc::clone(cached))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<TapKey, Arc<FilterTaps>>> {
        // The map stays consistent even if a holder panicked.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
