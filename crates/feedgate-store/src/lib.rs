//! # Feedgate Store
//!
//! The dedupe state store: two time-stamped key sets (`posted` and
//! `pending`) behind a trait, with TTL expiry and capacity bounding.
//!
//! ## Overview
//!
//! The store abstracts dedupe state behind the [`StateStore`] trait,
//! allowing the engine to be storage-agnostic. [`SqliteStore`] is the
//! persistent backend; [`MemoryStore`] keeps everything in process.
//!
//! ## Key Types
//!
//! - [`StateStore`] - The async trait for all state operations
//! - [`RetentionPolicy`] - TTLs and the capacity bound
//! - [`ReserveOutcome`] - Result of an atomic check-then-reserve
//! - [`SqliteStore`] - SQLite-backed persistent state
//! - [`MemoryStore`] - In-process state
//!
//! ## Usage
//!
//! ```rust,no_run
//! use feedgate_store::{RetentionPolicy, SqliteStore, StateStore};
//!
//! async fn example() {
//!     let store = SqliteStore::open("dedupe.db", RetentionPolicy::default()).unwrap();
//!
//!     // let outcome = store.try_reserve(&key, now).await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Atomic check-then-reserve**: `try_reserve` is one critical
//!   section; concurrent callers for the same new key cannot both win
//! - **Idempotent promote**: re-promoting a key rewrites its timestamp
//! - **Opportunistic GC**: every mutation sweeps expired entries first
//! - **Advisory capacity**: oldest entries evicted past `max_keys`

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{GcStats, ReserveOutcome, RetentionPolicy, StateStore};
