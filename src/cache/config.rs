//! Cache configuration.
//!
//! Controls the listing artifact cache via `codebases.toml`.

use std::num::NonZeroUsize;

use serde::Deserialize;

use super::keys::LISTING_KEY_COUNT;

pub const DEFAULT_CAPACITY: usize = 64;

/// Smallest store that holds both entries of every feed at once.
///
/// Below this, writing one feed evicts entries another feed (or the same
/// feed) still needs and the cache never produces a hit.
pub const MIN_CAPACITY: usize = LISTING_KEY_COUNT;

/// Cache configuration from `codebases.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Serve listings from the cache and write fresh ones back.
    pub enabled: bool,
    /// Maximum number of entries held by the in-process store.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            capacity: settings.capacity,
        }
    }
}

impl CacheConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the store capacity, raised to [`MIN_CAPACITY`] if smaller.
    pub fn store_capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity.max(MIN_CAPACITY)).unwrap_or(NonZeroUsize::MIN)
    }
}
