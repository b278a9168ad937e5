//! Synchronization utilities for handling poisoned locks.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

/// Extension trait for `RwLock` that ignores lock poisoning.
///
/// Registry shards only hold whole map entries, so a panic while a guard was
/// held cannot leave a shard half-updated.
pub trait IgnorePoison<T> {
    /// Acquire a read guard, ignoring any poison error.
    fn read_ignore_poison(&self) -> RwLockReadGuard<'_, T>;

    /// Acquire a write guard, ignoring any poison error.
    fn write_ignore_poison(&self) -> RwLockWriteGuard<'_, T>;
}

impl<T> IgnorePoison<T> for RwLock<T> {
    fn read_ignore_poison(&self) -> RwLockReadGuard<'_, T> {
        self.read().unwrap_or_else(|poisoned| {
            warn!("recovering poisoned lock for read");
            PoisonError::into_inner(poisoned)
        })
    }

    fn write_ignore_poison(&self) -> RwLockWriteGuard<'_, T> {
        self.write().unwrap_or_else(|poisoned| {
            warn!("recovering poisoned lock for write");
            PoisonError::into_inner(poisoned)
        })
    }
}
