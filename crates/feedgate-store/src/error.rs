//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
///
/// The in-memory store only ever fails on lock poisoning; the SQLite
/// store also surfaces database and I/O faults.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The lock guarding the store was poisoned by a panicked holder.
    #[error("store lock poisoned")]
    LockPoisoned,

    /// A blocking database task failed to complete.
    #[error("blocking task failed: {0}")]
    Background(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
