//! Per-key async mutexes.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Number of entries above which idle locks are pruned on acquisition.
const PRUNE_THRESHOLD: usize = 1024;

/// A map of lazily created mutexes, one per key.
///
/// Work holding the guard for a key runs strictly one at a time, in the
/// order the lock was requested.
#[derive(Debug)]
pub struct KeyedLocks<K: Eq + Hash> {
    locks: DashMap<K, Arc<Mutex<()>>>,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    /// Create an empty lock map.
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Wait for exclusive access to `key`.
    pub async fn lock(&self, key: &K) -> OwnedMutexGuard<()> {
        if self.locks.len() > PRUNE_THRESHOLD {
            self.prune_idle();
        }
        let mutex = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }

    /// Drop entries nobody is holding or waiting on.
    pub fn prune_idle(&self) {
        self.locks.retain(|_, m| Arc::strong_count(m) > 1);
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = KeyedLocks::new();
        let guard = locks.lock(&"a").await;
        let other = tokio::time::timeout(std::time::Duration::from_millis(20), locks.lock(&"a"));
        assert!(other.await.is_err());
        drop(guard);
        let _again = locks.lock(&"a").await;
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _a = locks.lock(&"a").await;
        let _b = locks.lock(&"b").await;
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_prune_keeps_held_locks() {
        let locks = KeyedLocks::new();
        let held = locks.lock(&"held").await;
        drop(locks.lock(&"idle").await);
        locks.prune_idle();
        assert_eq!(locks.len(), 1);
        drop(held);
    }
}
