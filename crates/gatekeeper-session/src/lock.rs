//! Poison-tolerant lock helpers.
//!
//! A panic while the store is locked must not take every later request
//! down with it. The store's invariants are restored by each operation
//! before it returns, so the guard is recovered and a warning logged.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

pub(crate) fn rw_read<'a, T>(
    lock: &'a RwLock<T>,
    op: &'static str,
) -> RwLockReadGuard<'a, T> {
    lock.read().unwrap_or_else(|poisoned| {
        tracing::warn!(op, lock_kind = "rwlock.read", "recovered poisoned session lock");
        poisoned.into_inner()
    })
}

pub(crate) fn rw_write<'a, T>(
    lock: &'a RwLock<T>,
    op: &'static str,
) -> RwLockWriteGuard<'a, T> {
    lock.write().unwrap_or_else(|poisoned| {
        tracing::warn!(op, lock_kind = "rwlock.write", "recovered poisoned session lock");
        poisoned.into_inner()
    })
}
