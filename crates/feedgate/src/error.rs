//! Error types for the engine.

use feedgate_core::CoreError;
use feedgate_store::StoreError;
use thiserror::Error;

/// Errors that can occur during engine operations.
///
/// Note what is absent: unidentifiable articles, duplicates, in-flight
/// keys, expired leases, and capacity pressure are all ordinary
/// outcomes, not errors. Only storage faults and malformed key strings
/// from external collaborators surface here.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// A key string from the commit interface failed validation.
    #[error("key error: {0}")]
    Key(#[from] CoreError),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
