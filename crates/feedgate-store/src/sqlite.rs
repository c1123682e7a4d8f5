//! SQLite implementation of the StateStore trait.
//!
//! The persistent backend: dedup state survives process restarts, so a
//! redeployed poller still refuses articles committed by its previous
//! incarnation. Uses rusqlite with bundled SQLite, wrapped in async via
//! tokio::spawn_blocking.
//!
//! Every trait method runs inside one lock acquisition (and a
//! transaction where multiple statements are involved), so the
//! check-then-reserve and promote sequences are atomic against
//! concurrent callers exactly like the in-memory store.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use feedgate_core::DedupeKey;

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{GcStats, ReserveOutcome, RetentionPolicy, StateStore};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    policy: RetentionPolicy,
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>, policy: RetentionPolicy) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            policy,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory(policy: RetentionPolicy) -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            policy,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// The policy this store was built with.
    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    /// Run a blocking operation against the locked connection.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|_| StoreError::LockPoisoned)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Background(e.to_string()))?
    }
}

/// Delete expired rows from both tables.
fn sweep(conn: &Connection, policy: &RetentionPolicy, now: i64) -> rusqlite::Result<GcStats> {
    let posted_expired = conn.execute(
        "DELETE FROM posted WHERE ?1 - inserted_at >= ?2",
        params![now, policy.posted_ttl_ms],
    )?;
    let pending_expired = conn.execute(
        "DELETE FROM pending WHERE ?1 - inserted_at >= ?2",
        params![now, policy.pending_ttl_ms],
    )?;
    Ok(GcStats {
        posted_expired,
        pending_expired,
    })
}

#[async_trait]
impl StateStore for SqliteStore {
    async fn try_reserve(&self, key: &DedupeKey, now: i64) -> Result<ReserveOutcome> {
        let key = key.as_str().to_string();
        let policy = self.policy;

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            sweep(&tx, &policy, now)?;

            // Post-sweep, any surviving row is live by construction.
            let posted_at: Option<i64> = tx
                .query_row(
                    "SELECT inserted_at FROM posted WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()?;
            if let Some(posted_at) = posted_at {
                tx.commit()?;
                return Ok(ReserveOutcome::AlreadyPosted { posted_at });
            }

            let reserved_at: Option<i64> = tx
                .query_row(
                    "SELECT inserted_at FROM pending WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()?;
            if let Some(reserved_at) = reserved_at {
                tx.commit()?;
                return Ok(ReserveOutcome::InFlight { reserved_at });
            }

            tx.execute(
                "INSERT INTO pending (key, inserted_at) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET inserted_at = excluded.inserted_at",
                params![key, now],
            )?;

            tx.commit()?;
            Ok(ReserveOutcome::Reserved)
        })
        .await
    }

    async fn promote(&self, key: &DedupeKey, now: i64) -> Result<()> {
        let key = key.as_str().to_string();
        let policy = self.policy;

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            sweep(&tx, &policy, now)?;

            tx.execute(
                "INSERT INTO posted (key, inserted_at) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET inserted_at = excluded.inserted_at",
                params![key, now],
            )?;
            tx.execute("DELETE FROM pending WHERE key = ?1", params![key])?;

            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn is_posted_live(&self, key: &DedupeKey, now: i64) -> Result<bool> {
        let key = key.as_str().to_string();
        let ttl = self.policy.posted_ttl_ms;

        self.with_conn(move |conn| {
            let live: bool = conn.query_row(
                "SELECT EXISTS(
                    SELECT 1 FROM posted WHERE key = ?1 AND ?2 - inserted_at < ?3
                )",
                params![key, now, ttl],
                |row| row.get(0),
            )?;
            Ok(live)
        })
        .await
    }

    async fn is_pending_live(&self, key: &DedupeKey, now: i64) -> Result<bool> {
        let key = key.as_str().to_string();
        let ttl = self.policy.pending_ttl_ms;

        self.with_conn(move |conn| {
            let live: bool = conn.query_row(
                "SELECT EXISTS(
                    SELECT 1 FROM pending WHERE key = ?1 AND ?2 - inserted_at < ?3
                )",
                params![key, now, ttl],
                |row| row.get(0),
            )?;
            Ok(live)
        })
        .await
    }

    async fn collect_garbage(&self, now: i64) -> Result<GcStats> {
        let policy = self.policy;

        let stats = self
            .with_conn(move |conn| {
                let tx = conn.transaction()?;
                let stats = sweep(&tx, &policy, now)?;
                tx.commit()?;
                Ok(stats)
            })
            .await?;

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
        let policy = self.policy;

        let evicted = self
            .with_conn(move |conn| {
                let tx = conn.transaction()?;

                sweep(&tx, &policy, now)?;

                let total: i64 = tx.query_row(
                    "SELECT (SELECT COUNT(*) FROM posted) + (SELECT COUNT(*) FROM pending)",
                    [],
                    |row| row.get(0),
                )?;

                let excess = (total as usize).saturating_sub(policy.max_keys);
                if excess == 0 {
                    tx.commit()?;
                    return Ok(0);
                }

                // Oldest entries across both tables, key as tie-breaker.
                let victims: Vec<(String, bool)> = {
                    let mut stmt = tx.prepare(
                        "SELECT key, is_pending FROM (
                            SELECT key, inserted_at, 0 AS is_pending FROM posted
                            UNION ALL
                            SELECT key, inserted_at, 1 AS is_pending FROM pending
                         )
                         ORDER BY inserted_at ASC, key ASC
                         LIMIT ?1",
                    )?;
                    let rows = stmt
                        .query_map(params![excess as i64], |row| {
                            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? != 0))
                        })?
                        .collect::<rusqlite::Result<Vec<_>>>()?;
                    rows
                };

                for (key, is_pending) in &victims {
                    if *is_pending {
                        tx.execute("DELETE FROM pending WHERE key = ?1", params![key])?;
                    } else {
                        tx.execute("DELETE FROM posted WHERE key = ?1", params![key])?;
                    }
                }

                tx.commit()?;
                Ok(victims.len())
            })
            .await?;

        if evicted > 0 {
            tracing::debug!(evicted, max_keys = self.policy.max_keys, "capacity eviction");
        }
        Ok(evicted)
    }

    async fn live_count(&self, now: i64) -> Result<usize> {
        let policy = self.policy;

        self.with_conn(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT
                    (SELECT COUNT(*) FROM posted WHERE ?1 - inserted_at < ?2)
                  + (SELECT COUNT(*) FROM pending WHERE ?1 - inserted_at < ?3)",
                params![now, policy.posted_ttl_ms, policy.pending_ttl_ms],
                |row| row.get(0),
            )?;
            Ok(count as usize)
        })
        .await
    }
}
