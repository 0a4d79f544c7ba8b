//! Poison-recovering wrappers over std locks.
//!
//! A panic on another thread must not wedge the client: every lock site goes
//! through these helpers, which log the recovery with the owning module and
//! operation and hand back the inner guard.

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

fn note_poisoned(kind: &'static str, target: &'static str, op: &'static str) {
    warn!(
        op,
        target_module = target,
        lock_kind = kind,
        "recovered poisoned lock; guarded state may be stale after a panic elsewhere"
    );
}

pub(crate) fn rw_read<'a, T>(
    lock: &'a RwLock<T>,
    target: &'static str,
    op: &'static str,
) -> RwLockReadGuard<'a, T> {
    lock.read().unwrap_or_else(|poisoned| {
        note_poisoned("rwlock.read", target, op);
        poisoned.into_inner()
    })
}

pub(crate) fn rw_write<'a, T>(
    lock: &'a RwLock<T>,
    target: &'static str,
    op: &'static str,
) -> RwLockWriteGuard<'a, T> {
    lock.write().unwrap_or_else(|poisoned| {
        note_poisoned("rwlock.write", target, op);
        poisoned.into_inner()
    })
}

pub(crate) fn mutex_lock<'a, T>(
    lock: &'a Mutex<T>,
    target: &'static str,
    op: &'static str,
) -> MutexGuard<'a, T> {
    lock.lock().unwrap_or_else(|poisoned| {
        note_poisoned("mutex.lock", target, op);
        poisoned.into_inner()
    })
}
