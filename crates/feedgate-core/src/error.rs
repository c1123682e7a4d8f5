//! Error types for Feedgate Core.

use thiserror::Error;

/// Core errors that can occur while handling dedupe keys.
///
/// Key derivation itself never fails: an unidentifiable article is a
/// filtering outcome, not an error. Errors only arise when key strings
/// come back from external collaborators (the commit interface) and
/// fail validation.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid dedupe key {0:?}: missing or unknown tag prefix")]
    InvalidKey(String),

    #[error("empty dedupe key")]
    EmptyKey,
}
