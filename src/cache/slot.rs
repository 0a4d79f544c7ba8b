//! Per-resource cache slot.
//!
//! Each resource key owns one slot: the current entry behind a lock, a fetch
//! gate that coalesces concurrent fetches into a single in-flight request,
//! monotonic counters that let a completion prove it is still the most recent
//! fetch (and that no invalidation arrived mid-flight), and a subscriber
//! count used to decide whether invalidation refetches now or defers.

use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use time::OffsetDateTime;
use tokio::sync::{Mutex, MutexGuard};

use crate::util::lock::{rw_read, rw_write};

use super::entry::{CacheEntry, FetchStatus};

const SOURCE: &str = "cache::slot";

/// Proof of a specific issued fetch, checked again at completion.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FetchTicket {
    seq: u64,
    invalidation_mark: u64,
}

pub(crate) struct ResourceSlot<T> {
    entry: RwLock<CacheEntry<T>>,
    fetch_gate: Mutex<()>,
    fetch_seq: AtomicU64,
    resolution_seq: AtomicU64,
    invalidation_seq: AtomicU64,
    subscribers: AtomicUsize,
}

impl<T: Clone> ResourceSlot<T> {
    pub(crate) fn new() -> Self {
        Self {
            entry: RwLock::new(CacheEntry::absent()),
            fetch_gate: Mutex::new(()),
            fetch_seq: AtomicU64::new(0),
            resolution_seq: AtomicU64::new(0),
            invalidation_seq: AtomicU64::new(0),
            subscribers: AtomicUsize::new(0),
        }
    }

    /// Clone of the current entry.
    pub(crate) fn snapshot(&self) -> CacheEntry<T> {
        rw_read(&self.entry, SOURCE, "snapshot").clone()
    }

    /// Serialize fetches for this resource; holders of the guard own the
    /// single in-flight request.
    pub(crate) async fn acquire_gate(&self) -> MutexGuard<'_, ()> {
        self.fetch_gate.lock().await
    }

    /// Count of fetches that have resolved, successfully or not.
    ///
    /// A caller that queues on the gate records this mark first; if it has
    /// moved by the time the gate is acquired, the fetch the caller was
    /// waiting on has resolved and its outcome is the caller's resolution too.
    pub(crate) fn resolution_mark(&self) -> u64 {
        self.resolution_seq.load(Ordering::SeqCst)
    }

    /// Record that a fetch is being issued.
    pub(crate) fn begin_fetch(&self) -> FetchTicket {
        let seq = self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let invalidation_mark = self.invalidation_seq.load(Ordering::SeqCst);
        rw_write(&self.entry, SOURCE, "begin_fetch").status = FetchStatus::Loading;
        FetchTicket {
            seq,
            invalidation_mark,
        }
    }

    /// Apply a successful fetch if it is still the latest issued one.
    ///
    /// Returns false when a newer fetch superseded this ticket; the stale
    /// result is discarded. If an invalidation arrived while the fetch was in
    /// flight the value is stored but stays marked stale, so the deferred
    /// refetch still happens.
    pub(crate) fn complete_fetch(&self, ticket: FetchTicket, value: T) -> bool {
        if self.fetch_seq.load(Ordering::SeqCst) != ticket.seq {
            return false;
        }
        let invalidated_mid_flight =
            self.invalidation_seq.load(Ordering::SeqCst) != ticket.invalidation_mark;
        let mut entry = rw_write(&self.entry, SOURCE, "complete_fetch");
        *entry = CacheEntry {
            value: Some(value),
            status: FetchStatus::Ready,
            last_fetched_at: Some(OffsetDateTime::now_utc()),
            stale: invalidated_mid_flight,
        };
        drop(entry);
        self.resolution_seq.fetch_add(1, Ordering::SeqCst);
        true
    }

    /// Record a failed fetch, preserving the last known good value.
    pub(crate) fn fail_fetch(&self, ticket: FetchTicket) -> bool {
        if self.fetch_seq.load(Ordering::SeqCst) != ticket.seq {
            return false;
        }
        rw_write(&self.entry, SOURCE, "fail_fetch").status = FetchStatus::Error;
        self.resolution_seq.fetch_add(1, Ordering::SeqCst);
        true
    }

    /// Mark the entry stale; the value remains readable until replaced.
    pub(crate) fn mark_stale(&self) {
        self.invalidation_seq.fetch_add(1, Ordering::SeqCst);
        rw_write(&self.entry, SOURCE, "mark_stale").stale = true;
    }

    pub(crate) fn add_subscriber(&self) {
        self.subscribers.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn remove_subscriber(&self) {
        let _ = self
            .subscribers
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                count.checked_sub(1)
            });
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_replaces_entry_wholesale() {
        let slot: ResourceSlot<Vec<u32>> = ResourceSlot::new();
        let ticket = slot.begin_fetch();
        assert_eq!(slot.snapshot().status, FetchStatus::Loading);

        assert!(slot.complete_fetch(ticket, vec![1, 2]));
        let entry = slot.snapshot();
        assert!(entry.is_fresh());
        assert_eq!(entry.value, Some(vec![1, 2]));
        assert!(entry.last_fetched_at.is_some());
    }

    #[test]
    fn superseded_completion_is_discarded() {
        let slot: ResourceSlot<u32> = ResourceSlot::new();
        let old = slot.begin_fetch();
        let new = slot.begin_fetch();

        assert!(slot.complete_fetch(new, 2));
        // The older fetch resolves late; its value must not win.
        assert!(!slot.complete_fetch(old, 1));
        assert_eq!(slot.snapshot().value, Some(2));
    }

    #[test]
    fn invalidation_mid_flight_keeps_entry_stale() {
        let slot: ResourceSlot<u32> = ResourceSlot::new();
        let ticket = slot.begin_fetch();
        slot.mark_stale();

        assert!(slot.complete_fetch(ticket, 7));
        let entry = slot.snapshot();
        assert_eq!(entry.value, Some(7));
        assert!(entry.stale);
        assert!(!entry.is_fresh());
    }

    #[test]
    fn failure_preserves_previous_value() {
        let slot: ResourceSlot<u32> = ResourceSlot::new();
        let ticket = slot.begin_fetch();
        assert!(slot.complete_fetch(ticket, 42));

        slot.mark_stale();
        let retry = slot.begin_fetch();
        assert!(slot.fail_fetch(retry));

        let entry = slot.snapshot();
        assert_eq!(entry.status, FetchStatus::Error);
        assert_eq!(entry.value, Some(42));
    }

    #[test]
    fn resolution_mark_moves_on_success_and_failure_alike() {
        let slot: ResourceSlot<u32> = ResourceSlot::new();
        let before = slot.resolution_mark();

        let ticket = slot.begin_fetch();
        assert_eq!(slot.resolution_mark(), before);
        assert!(slot.complete_fetch(ticket, 1));
        assert_eq!(slot.resolution_mark(), before + 1);

        slot.mark_stale();
        let retry = slot.begin_fetch();
        assert!(slot.fail_fetch(retry));
        assert_eq!(slot.resolution_mark(), before + 2);
    }

    #[test]
    fn superseded_resolutions_do_not_move_the_mark() {
        let slot: ResourceSlot<u32> = ResourceSlot::new();
        let old = slot.begin_fetch();
        let new = slot.begin_fetch();

        assert!(slot.complete_fetch(new, 2));
        let mark = slot.resolution_mark();
        assert!(!slot.complete_fetch(old, 1));
        assert!(!slot.fail_fetch(old));
        assert_eq!(slot.resolution_mark(), mark);
    }

    #[test]
    fn subscriber_count_never_underflows() {
        let slot: ResourceSlot<u32> = ResourceSlot::new();
        slot.remove_subscriber();
        assert_eq!(slot.subscriber_count(), 0);
        slot.add_subscriber();
        slot.add_subscriber();
        slot.remove_subscriber();
        assert_eq!(slot.subscriber_count(), 1);
    }
}
