//! # Feedgate
//!
//! The deduplication engine for an RSS republishing pipeline:
//! guarantees each article is published at most once within a
//! retention window, even with multiple independent pollers running
//! concurrently against shared state and crashing mid-flight.
//!
//! ## Overview
//!
//! - **Admission**: derive a stable key for each polled article and
//!   atomically check-and-reserve it. Duplicates and in-flight keys
//!   are rejected; accepted articles carry their key downstream.
//! - **Lease**: a reservation is a time-bounded lease (`pending_ttl`).
//!   If downstream work crashes and never commits, the lease lapses
//!   and the key becomes admissible again.
//! - **Commit**: once delivery reports a terminal outcome, promote the
//!   key to a long-TTL posted record (`posted_ttl`), then sweep
//!   expired entries and evict oldest past the capacity bound.
//!
//! What the engine does *not* do: poll feeds, summarize content,
//! shorten links, or deliver anywhere. Those collaborators consume its
//! decisions and report commits back.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use feedgate::{Article, DedupeEngine, EngineConfig};
//! use feedgate::store::SqliteStore;
//!
//! async fn example() {
//!     let config = EngineConfig::default();
//!     let store = SqliteStore::open("dedupe.db", config.retention_policy()).unwrap();
//!     let engine = DedupeEngine::new(store, config);
//!
//!     let outcome = engine
//!         .admit(Article::with_link("https://example.com/a"))
//!         .await
//!         .unwrap();
//!
//!     if let Some(admitted) = outcome.into_accepted() {
//!         // forward downstream, then later:
//!         engine.commit([admitted.dedupe_key]).await.unwrap();
//!     }
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `feedgate::core` - Articles, keys, normalization, the clock
//! - `feedgate::store` - State store trait and backends

pub mod engine;
pub mod error;

// Re-export component crates
pub use feedgate_core as core;
pub use feedgate_store as store;

// Re-export main types for convenience
pub use engine::{Admission, DedupeEngine, EngineConfig};
pub use error::{EngineError, Result};

// Re-export commonly used component types
pub use feedgate_core::{
    derive_key, normalize_url, AdmittedArticle, Article, Clock, DedupeKey, KeySource, SystemClock,
    DEFAULT_TRACKING_PARAMS,
};
pub use feedgate_store::{
    GcStats, MemoryStore, ReserveOutcome, RetentionPolicy, SqliteStore, StateStore,
};
