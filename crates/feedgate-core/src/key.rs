//! Dedupe keys: the stable identity of an article.
//!
//! A key is a string with a tagged prefix identifying how it was
//! derived:
//!
//! - `u:<normalized-url>` when the article has a link
//! - `g:<guid>` when it has a guid but no usable link
//! - `h:<hex-digest>` fingerprint of title, published date, and source
//!
//! Derivation is deterministic: the same field values always yield the
//! same key. An article with none of link, guid, or title+date+source
//! has no identity and yields no key.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::article::Article;
use crate::error::CoreError;
use crate::normalize::normalize_url;

/// Which article field a key was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// Derived from the normalized link (`u:`).
    Url,
    /// Derived from the feed guid (`g:`).
    Guid,
    /// Derived from the title/date/source fingerprint (`h:`).
    Fingerprint,
}

impl KeySource {
    const fn tag(self) -> &'static str {
        match self {
            KeySource::Url => "u:",
            KeySource::Guid => "g:",
            KeySource::Fingerprint => "h:",
        }
    }
}

/// A stable identity string for an article.
///
/// Two articles with the same logical identity (same normalized link,
/// same guid, or same fingerprint fields) always produce equal keys.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DedupeKey(String);

impl DedupeKey {
    /// Key for an article identified by its normalized link.
    pub fn from_url(normalized: &str) -> Self {
        Self(format!("u:{normalized}"))
    }

    /// Key for an article identified by its feed guid.
    pub fn from_guid(guid: &str) -> Self {
        Self(format!("g:{guid}"))
    }

    /// Fingerprint key over title, published date, and source.
    ///
    /// The digest input is `title + "::" + published_at + "::" + source`
    /// with absent fields as empty strings; the digest is Blake3,
    /// hex-encoded.
    pub fn from_fingerprint(title: &str, published_at: &str, source: &str) -> Self {
        let raw = format!("{title}::{published_at}::{source}");
        let digest = blake3::hash(raw.as_bytes());
        Self(format!("h:{}", hex::encode(digest.as_bytes())))
    }

    /// Validate a key string coming back from an external collaborator.
    ///
    /// Accepts only the known tag prefixes with a non-empty remainder.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if s.is_empty() {
            return Err(CoreError::EmptyKey);
        }
        let valid = [KeySource::Url, KeySource::Guid, KeySource::Fingerprint]
            .iter()
            .any(|src| s.len() > src.tag().len() && s.starts_with(src.tag()));
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(CoreError::InvalidKey(s.to_string()))
        }
    }

    /// Which field this key was derived from, per its tag.
    pub fn source(&self) -> KeySource {
        if self.0.starts_with("g:") {
            KeySource::Guid
        } else if self.0.starts_with("h:") {
            KeySource::Fingerprint
        } else {
            KeySource::Url
        }
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the underlying string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for DedupeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DedupeKey({})", self.0)
    }
}

impl fmt::Display for DedupeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DedupeKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<DedupeKey> for String {
    fn from(key: DedupeKey) -> Self {
        key.0
    }
}

/// Derive the dedupe key for an article.
///
/// Returns `None` when the article carries no identity at all (no
/// link, no guid, and title, published date, and source all empty).
/// That is a filtering outcome, not an error: the caller skips the
/// article and moves on.
pub fn derive_key<S: AsRef<str>>(article: &Article, denylist: &[S]) -> Option<DedupeKey> {
    if Article::has(&article.link) {
        let link = article.link.as_deref().unwrap_or_default();
        return Some(DedupeKey::from_url(&normalize_url(link, denylist)));
    }

    if Article::has(&article.guid) {
        return Some(DedupeKey::from_guid(article.guid.as_deref().unwrap_or_default()));
    }

    let title = article.title.as_deref().unwrap_or_default();
    let published_at = article.published_at.as_deref().unwrap_or_default();
    let source = article.source.as_deref().unwrap_or_default();

    if title.is_empty() && published_at.is_empty() && source.is_empty() {
        return None;
    }

    Some(DedupeKey::from_fingerprint(title, published_at, source))
}
