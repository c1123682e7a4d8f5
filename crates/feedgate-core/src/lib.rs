//! # Feedgate Core
//!
//! Pure primitives for the Feedgate deduplication engine: articles,
//! dedupe keys, URL canonicalization, and the clock abstraction.
//!
//! This crate contains no I/O, no storage, no locking. It is pure
//! computation over feed data.
//!
//! ## Key Types
//!
//! - [`Article`] - A polled feed item with all-optional fields
//! - [`DedupeKey`] - The stable identity string derived from an article
//! - [`AdmittedArticle`] - An article that passed admission, key attached
//! - [`Clock`] - Injectable time source (Unix milliseconds)
//!
//! ## Key Derivation
//!
//! [`derive_key`] prefers the article link (canonicalized via
//! [`normalize_url`]), falls back to the feed guid, and finally to a
//! Blake3 fingerprint over title, published date, and source. An
//! article with none of those yields no key and is filtered upstream.

pub mod article;
pub mod clock;
pub mod error;
pub mod key;
pub mod normalize;

pub use article::{AdmittedArticle, Article};
pub use clock::{Clock, SystemClock};
pub use error::CoreError;
pub use key::{derive_key, DedupeKey, KeySource};
pub use normalize::{normalize_url, DEFAULT_TRACKING_PARAMS};
