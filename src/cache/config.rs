//! Cache behavior knobs.

/// Runtime configuration for the query cache.
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// When false every query bypasses the cache and fetches directly.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl CacheConfig {
    pub fn disabled() -> Self {
        Self { enabled: false }
    }
}
