//! In-memory implementation of the StateStore trait.
//!
//! The default backend when the host process handles persistence
//! itself (or accepts losing dedup history on restart). Same semantics
//! as SQLite but everything lives in two hash maps.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use feedgate_core::DedupeKey;

use crate::error::{Result, StoreError};
use crate::traits::{GcStats, ReserveOutcome, RetentionPolicy, StateStore};

/// In-memory store implementation.
///
/// One RwLock guards both collections: the check-then-reserve sequence
/// and the promote sequence each run under a single write acquisition.
pub struct MemoryStore {
    policy: RetentionPolicy,
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Confirmed-published keys, value is insertion time (Unix ms).
    posted: HashMap<String, i64>,

    /// In-flight reservations, value is reservation time (Unix ms).
    pending: HashMap<String, i64>,
}

impl MemoryStore {
    /// Create an empty store with the given retention policy.
    pub fn new(policy: RetentionPolicy) -> Self {
        Self {
            policy,
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    /// The policy this store was built with.
    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner.write().map_err(|_| StoreError::LockPoisoned)
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner.read().map_err(|_| StoreError::LockPoisoned)
    }
}

impl MemoryStoreInner {
    fn sweep(&mut self, policy: &RetentionPolicy, now: i64) -> GcStats {
        let posted_before = self.posted.len();
        self.posted.retain(|_, &mut at| policy.posted_live(at, now));

        let pending_before = self.pending.len();
        self.pending.retain(|_, &mut at| policy.pending_live(at, now));

        GcStats {
            posted_expired: posted_before - self.posted.len(),
            pending_expired: pending_before - self.pending.len(),
        }
    }

    /// Evict oldest entries until the joint total fits `max_keys`.
    /// Assumes a sweep already ran, so every entry counted is live.
    fn evict_oldest(&mut self, policy: &RetentionPolicy) -> usize {
        let total = self.posted.len() + self.pending.len();
        if total <= policy.max_keys {
            return 0;
        }
        let excess = total - policy.max_keys;

        let mut entries: Vec<(i64, bool, String)> = self
            .posted
            .iter()
            .map(|(k, &at)| (at, false, k.clone()))
            .chain(self.pending.iter().map(|(k, &at)| (at, true, k.clone())))
            .collect();
        entries.sort_by(|a, b| (a.0, &a.2).cmp(&(b.0, &b.2)));

        for (_, from_pending, key) in entries.into_iter().take(excess) {
            if from_pending {
                self.pending.remove(&key);
            } else {
                self.posted.remove(&key);
            }
        }
        excess
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn try_reserve(&self, key: &DedupeKey, now: i64) -> Result<ReserveOutcome> {
        let mut inner = self.write()?;
        inner.sweep(&self.policy, now);

        if let Some(&posted_at) = inner.posted.get(key.as_str()) {
            return Ok(ReserveOutcome::AlreadyPosted { posted_at });
        }
        if let Some(&reserved_at) = inner.pending.get(key.as_str()) {
            return Ok(ReserveOutcome::InFlight { reserved_at });
        }

        inner.pending.insert(key.as_str().to_string(), now);
        Ok(ReserveOutcome::Reserved)
    }

    async fn promote(&self, key: &DedupeKey, now: i64) -> Result<()> {
        let mut inner = self.write()?;
        inner.sweep(&self.policy, now);

        inner.posted.insert(key.as_str().to_string(), now);
        inner.pending.remove(key.as_str());
        Ok(())
    }

    async fn is_posted_live(&self, key: &DedupeKey, now: i64) -> Result<bool> {
        let inner = self.read()?;
        Ok(inner
            .posted
            .get(key.as_str())
            .is_some_and(|&at| self.policy.posted_live(at, now)))
    }

    async fn is_pending_live(&self, key: &DedupeKey, now: i64) -> Result<bool> {
        let inner = self.read()?;
        Ok(inner
            .pending
            .get(key.as_str())
            .is_some_and(|&at| self.policy.pending_live(at, now)))
    }

    async fn collect_garbage(&self, now: i64) -> Result<GcStats> {
        let mut inner = self.write()?;
        let stats = inner.sweep(&self.policy, now);
        if stats.total() > 0 {
            tracing::debug!(
                posted_expired = stats.posted_expired,
                pending_expired = stats.pending_expired,
                "swept expired dedupe entries"
            );
        }
        Ok(stats)
    }

    async fn enforce_capacity(&self, now: i64) -> Result<usize> {
        let mut inner = self.write()?;
        inner.sweep(&self.policy, now);
        let evicted = inner.evict_oldest(&self.policy);
        if evicted > 0 {
            tracing::debug!(evicted, max_keys = self.policy.max_keys, "capacity eviction");
        }
        Ok(evicted)
    }

    async fn live_count(&self, now: i64) -> Result<usize> {
        let inner = self.read()?;
        let posted = inner
            .posted
            .values()
            .filter(|&&at| self.policy.posted_live(at, now))
            .count();
        let pending = inner
            .pending
            .values()
            .filter(|&&at| self.policy.pending_live(at, now))
            .count();
        Ok(posted + pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> DedupeKey {
        DedupeKey::from_guid(s)
    }

    fn store() -> MemoryStore {
        MemoryStore::new(RetentionPolicy {
            posted_ttl_ms: 1_000,
            pending_ttl_ms: 100,
            max_keys: 3,
        })
    }

    #[tokio::test]
    async fn reserve_then_inflight() {
        let store = store();
        let k = key("a");

        assert_eq!(store.try_reserve(&k, 0).await.unwrap(), ReserveOutcome::Reserved);
        assert_eq!(
            store.try_reserve(&k, 50).await.unwrap(),
            ReserveOutcome::InFlight { reserved_at: 0 }
        );
    }

    #[tokio::test]
    async fn promote_moves_key_to_posted() {
        let store = store();
        let k = key("a");

        store.try_reserve(&k, 0).await.unwrap();
        store.promote(&k, 10).await.unwrap();

        assert!(store.is_posted_live(&k, 20).await.unwrap());
        assert!(!store.is_pending_live(&k, 20).await.unwrap());
        assert_eq!(
            store.try_reserve(&k, 20).await.unwrap(),
            ReserveOutcome::AlreadyPosted { posted_at: 10 }
        );
    }

    #[tokio::test]
    async fn promote_is_idempotent() {
        let store = store();
        let k = key("a");

        store.try_reserve(&k, 0).await.unwrap();
        store.promote(&k, 10).await.unwrap();
        store.promote(&k, 20).await.unwrap();

        assert_eq!(
            store.try_reserve(&k, 30).await.unwrap(),
            ReserveOutcome::AlreadyPosted { posted_at: 20 }
        );
    }

    #[tokio::test]
    async fn promote_without_reservation_is_allowed() {
        let store = store();
        let k = key("a");

        store.promote(&k, 0).await.unwrap();
        assert!(store.is_posted_live(&k, 1).await.unwrap());
    }

    #[tokio::test]
    async fn pending_lease_expires() {
        let store = store();
        let k = key("a");

        store.try_reserve(&k, 0).await.unwrap();

        // Strictly before expiry: still held.
        assert_eq!(
            store.try_reserve(&k, 99).await.unwrap(),
            ReserveOutcome::InFlight { reserved_at: 0 }
        );
        // At expiry: reclaimed.
        assert_eq!(store.try_reserve(&k, 100).await.unwrap(), ReserveOutcome::Reserved);
    }

    #[tokio::test]
    async fn posted_entry_expires() {
        let store = store();
        let k = key("a");

        store.promote(&k, 0).await.unwrap();
        assert!(store.is_posted_live(&k, 999).await.unwrap());
        assert!(!store.is_posted_live(&k, 1_000).await.unwrap());
        assert_eq!(store.try_reserve(&k, 1_000).await.unwrap(), ReserveOutcome::Reserved);
    }

    #[tokio::test]
    async fn gc_reports_expired_counts() {
        let store = store();
        store.promote(&key("a"), 0).await.unwrap();
        store.try_reserve(&key("b"), 0).await.unwrap();

        let stats = store.collect_garbage(500).await.unwrap();
        assert_eq!(stats.posted_expired, 0);
        assert_eq!(stats.pending_expired, 1);

        let stats = store.collect_garbage(1_000).await.unwrap();
        assert_eq!(stats.posted_expired, 1);
    }

    #[tokio::test]
    async fn capacity_evicts_oldest_across_collections() {
        let store = store();
        store.promote(&key("old"), 0).await.unwrap();
        store.promote(&key("mid"), 10).await.unwrap();
        store.try_reserve(&key("newer"), 20).await.unwrap();
        store.try_reserve(&key("newest"), 30).await.unwrap();

        let evicted = store.enforce_capacity(40).await.unwrap();
        assert_eq!(evicted, 1);
        assert_eq!(store.live_count(40).await.unwrap(), 3);
        // The oldest entry went, regardless of which collection held it.
        assert!(!store.is_posted_live(&key("old"), 40).await.unwrap());
        assert!(store.is_posted_live(&key("mid"), 40).await.unwrap());
    }

    #[tokio::test]
    async fn capacity_noop_when_under_bound() {
        let store = store();
        store.promote(&key("a"), 0).await.unwrap();
        assert_eq!(store.enforce_capacity(1).await.unwrap(), 0);
        assert_eq!(store.live_count(1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn concurrent_reserves_only_one_wins() {
        use std::sync::Arc;

        let store = Arc::new(MemoryStore::new(RetentionPolicy::default()));
        let k = key("contested");

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            let k = k.clone();
            handles.push(tokio::spawn(async move {
                store.try_reserve(&k, 1_000).await.unwrap()
            }));
        }

        let mut reserved = 0;
        for handle in handles {
            if handle.await.unwrap() == ReserveOutcome::Reserved {
                reserved += 1;
            }
        }
        assert_eq!(reserved, 1);
    }
}
