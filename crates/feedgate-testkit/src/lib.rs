//! # Feedgate Testkit
//!
//! Testing utilities for the Feedgate deduplication engine.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: known articles with expected dedupe keys
//! - **Generators**: proptest strategies for property-based testing
//! - **Fixtures**: a manual clock and pre-wired engine for scenarios
//!
//! ## Golden Vectors
//!
//! Golden vectors pin the key-derivation contract:
//!
//! ```rust
//! use feedgate_testkit::vectors::verify_all_vectors;
//!
//! verify_all_vectors().unwrap();
//! ```
//!
//! ## Test Fixtures
//!
//! The fixture owns an engine over an in-memory store and a manual
//! clock, so TTL expiry is a method call instead of a real wait:
//!
//! ```rust
//! use std::time::Duration;
//! use feedgate_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! fixture.clock.advance(Duration::from_secs(3 * 60 * 60));
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{ManualClock, TestFixture};
pub use generators::{article_from_params, ArticleParams};
pub use vectors::{all_vectors, article_from_vector, verify_all_vectors, ExpectedKey, GoldenVector};
