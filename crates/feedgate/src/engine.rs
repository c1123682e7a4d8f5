//! The engine: admission and commit controllers over a state store.
//!
//! Admission decides, per polled article, whether to forward it
//! downstream: derive the key, then atomically check-and-reserve it
//! against the store. Commit promotes reservations to durable posted
//! records once the delivery collaborator reports a terminal outcome,
//! then runs garbage collection and capacity enforcement.
//!
//! Per key, the state machine is:
//!
//! ```text
//! ABSENT --reserve--> PENDING --promote--> POSTED --posted_ttl--> ABSENT
//!                        |
//!                        +-- pending_ttl, no promote --> ABSENT
//! ```
//!
//! The pending-TTL path is the crash recovery story: a downstream
//! execution that dies without committing simply lets its lease lapse,
//! and the key becomes admissible again. No liveness probes, no
//! explicit crash detection.

use std::sync::Arc;
use std::time::Duration;

use feedgate_core::{
    derive_key, AdmittedArticle, Article, Clock, DedupeKey, SystemClock, DEFAULT_TRACKING_PARAMS,
};
use feedgate_store::{ReserveOutcome, RetentionPolicy, StateStore};

use crate::error::Result;

/// Configuration for the engine.
///
/// Fixed at process start; there is no runtime reload.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long a committed key blocks re-admission.
    pub posted_ttl: Duration,
    /// How long a reservation blocks re-admission before reclaim.
    pub pending_ttl: Duration,
    /// Soft cap on total live store entries before oldest-first eviction.
    pub max_keys: usize,
    /// Query-parameter names stripped during URL normalization.
    pub tracking_params: Vec<String>,
}

impl Default for EngineConfig {
    /// 30-day posted window, 2-hour pending lease, 10k keys, standard
    /// tracking-parameter denylist.
    fn default() -> Self {
        Self {
            posted_ttl: Duration::from_secs(30 * 24 * 60 * 60),
            pending_ttl: Duration::from_secs(2 * 60 * 60),
            max_keys: 10_000,
            tracking_params: DEFAULT_TRACKING_PARAMS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl EngineConfig {
    /// The retention policy a store for this engine should be built with.
    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy::new(self.posted_ttl, self.pending_ttl, self.max_keys)
    }
}

/// Result of admitting one article.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    /// The article was reserved and should be forwarded downstream.
    Accepted(AdmittedArticle),
    /// A key with the same identity was published within the retention
    /// window.
    Duplicate(DedupeKey),
    /// Another execution currently holds a live lease on this key.
    InFlight(DedupeKey),
    /// The article carries no identity at all; filtered, not an error.
    Unidentifiable,
}

impl Admission {
    /// True for the `Accepted` outcome.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Admission::Accepted(_))
    }

    /// The admitted article, if this outcome accepted one.
    pub fn into_accepted(self) -> Option<AdmittedArticle> {
        match self {
            Admission::Accepted(admitted) => Some(admitted),
            _ => None,
        }
    }
}

/// The deduplication engine.
///
/// Generic over the store so the same engine runs against the
/// in-memory store (tests, ephemeral deployments) or SQLite
/// (persistent deployments). Construct once per process and share;
/// the store it owns is the only process-wide mutable state.
pub struct DedupeEngine<S: StateStore> {
    /// The state backend.
    store: Arc<S>,
    /// Injectable time source.
    clock: Arc<dyn Clock>,
    /// Configuration.
    config: EngineConfig,
}

impl<S: StateStore> DedupeEngine<S> {
    /// Create an engine over the given store, using the wall clock.
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self::with_clock(store, Arc::new(SystemClock), config)
    }

    /// Create an engine with an explicit clock.
    ///
    /// Tests inject a manual clock here so TTL expiry is deterministic.
    pub fn with_clock(store: S, clock: Arc<dyn Clock>, config: EngineConfig) -> Self {
        Self {
            store: Arc::new(store),
            clock,
            config,
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Admission
    // ─────────────────────────────────────────────────────────────────────────

    /// Decide whether to emit one article downstream.
    ///
    /// Derives the dedupe key, then atomically checks posted and
    /// pending state and reserves the key. Rejections are ordinary
    /// outcomes carried in [`Admission`], not errors.
    pub async fn admit(&self, article: Article) -> Result<Admission> {
        let Some(key) = derive_key(&article, &self.config.tracking_params) else {
            tracing::debug!("article carries no link, guid, or fingerprint fields; skipped");
            return Ok(Admission::Unidentifiable);
        };

        let now = self.clock.now_millis();
        match self.store.try_reserve(&key, now).await? {
            ReserveOutcome::Reserved => Ok(Admission::Accepted(AdmittedArticle {
                article,
                dedupe_key: key,
            })),
            ReserveOutcome::AlreadyPosted { posted_at } => {
                tracing::debug!(key = %key, posted_at, "rejected: published within retention window");
                Ok(Admission::Duplicate(key))
            }
            ReserveOutcome::InFlight { reserved_at } => {
                tracing::debug!(key = %key, reserved_at, "rejected: held by in-flight lease");
                Ok(Admission::InFlight(key))
            }
        }
    }

    /// Admit a batch in arrival order, keeping only accepted articles.
    ///
    /// Decisions are independent per article; when a batch contains
    /// near-duplicates the first one wins the reservation and the rest
    /// are rejected as in-flight.
    pub async fn admit_batch(&self, articles: Vec<Article>) -> Result<Vec<AdmittedArticle>> {
        let mut accepted = Vec::with_capacity(articles.len());
        for article in articles {
            if let Admission::Accepted(admitted) = self.admit(article).await? {
                accepted.push(admitted);
            }
        }
        Ok(accepted)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Commit
    // ─────────────────────────────────────────────────────────────────────────

    /// Promote keys whose downstream work reached a terminal, accepted
    /// outcome, then garbage-collect and re-establish the capacity
    /// bound.
    ///
    /// Idempotent, and safe to call with keys that are no longer
    /// pending: promote simply (re)writes the posted timestamp.
    pub async fn commit<I>(&self, keys: I) -> Result<()>
    where
        I: IntoIterator<Item = DedupeKey>,
    {
        let now = self.clock.now_millis();

        for key in keys {
            self.store.promote(&key, now).await?;
        }

        self.store.collect_garbage(now).await?;
        let evicted = self.store.enforce_capacity(now).await?;
        if evicted > 0 {
            tracing::info!(evicted, "dedup history trimmed to capacity");
        }
        Ok(())
    }

    /// Commit from raw key strings as reported by the delivery
    /// collaborator, validating each tag prefix.
    pub async fn commit_raw<'a, I>(&self, keys: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let parsed = keys
            .into_iter()
            .map(DedupeKey::parse)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.commit(parsed).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Maintenance
    // ─────────────────────────────────────────────────────────────────────────

    /// Number of live entries currently tracked by the store.
    pub async fn live_count(&self) -> Result<usize> {
        Ok(self.store.live_count(self.clock.now_millis()).await?)
    }

    /// Sweep expired entries and re-establish the capacity bound now,
    /// without waiting for the next commit.
    pub async fn run_maintenance(&self) -> Result<usize> {
        let now = self.clock.now_millis();
        self.store.collect_garbage(now).await?;
        Ok(self.store.enforce_capacity(now).await?)
    }
}
