//! StateStore trait: the abstract interface for dedupe state.
//!
//! The store holds two time-stamped key sets: `posted` (keys whose
//! article was published and committed, blocking re-admission for
//! `posted_ttl`) and `pending` (in-flight reservations that expire
//! after `pending_ttl` if never committed). A key lives in at most one
//! of the two at any instant.
//!
//! # Design Notes
//!
//! - **Fused check-then-reserve**: [`StateStore::try_reserve`] performs
//!   the posted check, the pending check, and the reservation as one
//!   critical section. Concurrent calls for the same new key can never
//!   both observe "absent" and both reserve - that is the race the
//!   pending lease exists to prevent.
//! - **Opportunistic GC**: `try_reserve` and `promote` sweep expired
//!   entries before acting, so staleness is bounded even between
//!   external [`StateStore::collect_garbage`] calls.
//! - **Advisory capacity**: [`StateStore::enforce_capacity`] evicts
//!   oldest-first until the joint live total fits `max_keys`. Eviction
//!   trades older dedup history for bounded memory; it is never an
//!   error and never blocks a caller.

use std::time::Duration;

use async_trait::async_trait;
use feedgate_core::DedupeKey;

use crate::error::Result;

/// TTL and capacity configuration, fixed at store construction.
///
/// All arithmetic is in Unix milliseconds. Durations that overflow
/// `i64` milliseconds saturate, which behaves as "never expires".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// How long a committed key blocks re-admission.
    pub posted_ttl_ms: i64,
    /// How long a reservation blocks re-admission before reclaim.
    pub pending_ttl_ms: i64,
    /// Soft cap on total live entries across both collections.
    pub max_keys: usize,
}

impl RetentionPolicy {
    /// Build a policy from human-friendly durations.
    pub fn new(posted_ttl: Duration, pending_ttl: Duration, max_keys: usize) -> Self {
        Self {
            posted_ttl_ms: duration_to_millis(posted_ttl),
            pending_ttl_ms: duration_to_millis(pending_ttl),
            max_keys,
        }
    }

    /// True if a posted entry inserted at `inserted_at` is still live.
    pub fn posted_live(&self, inserted_at: i64, now: i64) -> bool {
        now.saturating_sub(inserted_at) < self.posted_ttl_ms
    }

    /// True if a pending entry inserted at `inserted_at` is still live.
    pub fn pending_live(&self, inserted_at: i64, now: i64) -> bool {
        now.saturating_sub(inserted_at) < self.pending_ttl_ms
    }
}

impl Default for RetentionPolicy {
    /// 30-day posted window, 2-hour pending lease, 10k keys.
    fn default() -> Self {
        Self::new(
            Duration::from_secs(30 * 24 * 60 * 60),
            Duration::from_secs(2 * 60 * 60),
            10_000,
        )
    }
}

fn duration_to_millis(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

/// Result of a reservation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// The key was absent; a pending lease now holds it.
    Reserved,
    /// The key was published within the retention window.
    AlreadyPosted {
        /// When the posted record was written (Unix ms).
        posted_at: i64,
    },
    /// Another execution holds a live lease on the key.
    InFlight {
        /// When the lease was taken (Unix ms).
        reserved_at: i64,
    },
}

/// Counts from a garbage-collection sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GcStats {
    /// Posted entries removed because their age reached `posted_ttl`.
    pub posted_expired: usize,
    /// Pending entries removed because their age reached `pending_ttl`.
    pub pending_expired: usize,
}

impl GcStats {
    /// Total entries removed by the sweep.
    pub fn total(&self) -> usize {
        self.posted_expired + self.pending_expired
    }
}

/// The StateStore trait: async interface for dedupe state.
///
/// All methods take `now` explicitly so TTL behavior is deterministic
/// under test; production callers pass the engine clock's reading.
/// Every method executes as a single atomic critical section against
/// the underlying state.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Atomically check the key and, if absent, reserve it.
    ///
    /// Runs garbage collection first, then: a live posted entry yields
    /// `AlreadyPosted`, a live pending entry yields `InFlight`,
    /// otherwise `pending[key] = now` and `Reserved`.
    async fn try_reserve(&self, key: &DedupeKey, now: i64) -> Result<ReserveOutcome>;

    /// Promote a key to the posted set: `posted[key] = now`, drop any
    /// pending entry.
    ///
    /// Idempotent, and tolerant of keys that are not currently pending
    /// (re-commit after partial success simply rewrites the posted
    /// timestamp).
    async fn promote(&self, key: &DedupeKey, now: i64) -> Result<()>;

    /// True if the key is in `posted` and younger than `posted_ttl`.
    async fn is_posted_live(&self, key: &DedupeKey, now: i64) -> Result<bool>;

    /// True if the key is in `pending` and younger than `pending_ttl`.
    async fn is_pending_live(&self, key: &DedupeKey, now: i64) -> Result<bool>;

    /// Remove every expired entry from both collections.
    async fn collect_garbage(&self, now: i64) -> Result<GcStats>;

    /// After garbage collection, evict oldest entries (by insertion
    /// time, across both collections) until the live total fits
    /// `max_keys`. Returns the number of entries evicted.
    async fn enforce_capacity(&self, now: i64) -> Result<usize>;

    /// Number of live entries across both collections.
    async fn live_count(&self, now: i64) -> Result<usize>;
}
