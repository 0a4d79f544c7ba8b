//! Cached value plus freshness metadata for one resource key.

use time::OffsetDateTime;

/// Lifecycle of the most recent fetch for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Never fetched (or resolved to a default without a connection).
    Idle,
    /// A fetch is in flight.
    Loading,
    /// The cached value reflects a completed fetch.
    Ready,
    /// The most recent fetch failed; any previous value is preserved.
    Error,
}

/// The latest known state of one resource.
///
/// Entries are replaced wholesale on fetch completion; the value is never
/// edited in place.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: Option<T>,
    pub status: FetchStatus,
    pub last_fetched_at: Option<OffsetDateTime>,
    pub stale: bool,
}

impl<T> CacheEntry<T> {
    /// An entry that has never been touched.
    pub fn absent() -> Self {
        Self {
            value: None,
            status: FetchStatus::Idle,
            last_fetched_at: None,
            stale: false,
        }
    }

    /// An explicit default resolution used when the actor is not ready.
    ///
    /// Not stored in the cache: the resource still counts as never fetched.
    pub fn resolved_default(value: T) -> Self {
        Self {
            value: Some(value),
            status: FetchStatus::Idle,
            last_fetched_at: None,
            stale: false,
        }
    }

    /// Whether the cached value can be served without a fetch.
    pub fn is_fresh(&self) -> bool {
        self.status == FetchStatus::Ready && !self.stale
    }
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self::absent()
    }
}
