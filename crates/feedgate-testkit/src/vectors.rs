//! Golden test vectors for key derivation.
//!
//! These vectors pin the derivation contract: the exact normalized
//! URLs, tag prefixes, and fingerprint input layout. A change that
//! breaks one of these silently changes every deployed key space, so
//! they are verified at the facade level too.

use feedgate_core::{derive_key, Article, DedupeKey, DEFAULT_TRACKING_PARAMS};

/// What a vector expects from derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedKey {
    /// Derivation yields exactly this key string.
    Exact(&'static str),
    /// Derivation yields an `h:` fingerprint; the digest is checked by
    /// independent recomputation over the given input.
    Fingerprint { digest_input: &'static str },
    /// The article has no identity and is filtered.
    NoIdentity,
}

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub link: Option<&'static str>,
    pub guid: Option<&'static str>,
    pub title: Option<&'static str>,
    pub published_at: Option<&'static str>,
    pub source: Option<&'static str>,
    /// Expected derivation result.
    pub expected: ExpectedKey,
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "link with tracking param stripped",
            link: Some("https://example.com/a?utm_source=x&id=5"),
            guid: None,
            title: None,
            published_at: None,
            source: None,
            expected: ExpectedKey::Exact("u:https://example.com/a?id=5"),
        },
        GoldenVector {
            name: "link with fragment and trailing slashes",
            link: Some("https://Example.com/post//#comments"),
            guid: None,
            title: None,
            published_at: None,
            source: None,
            expected: ExpectedKey::Exact("u:https://example.com/post"),
        },
        GoldenVector {
            name: "link wins over guid",
            link: Some("https://example.com/a"),
            guid: Some("abc123"),
            title: None,
            published_at: None,
            source: None,
            expected: ExpectedKey::Exact("u:https://example.com/a"),
        },
        GoldenVector {
            name: "guid only",
            link: None,
            guid: Some("abc123"),
            title: None,
            published_at: None,
            source: None,
            expected: ExpectedKey::Exact("g:abc123"),
        },
        GoldenVector {
            name: "fingerprint over title, date, source",
            link: None,
            guid: None,
            title: Some("Hello"),
            published_at: Some("2024-01-01"),
            source: Some("feedA"),
            expected: ExpectedKey::Fingerprint {
                digest_input: "Hello::2024-01-01::feedA",
            },
        },
        GoldenVector {
            name: "fingerprint with only a title",
            link: None,
            guid: None,
            title: Some("Hello"),
            published_at: None,
            source: None,
            expected: ExpectedKey::Fingerprint {
                digest_input: "Hello::::",
            },
        },
        GoldenVector {
            name: "no identity at all",
            link: None,
            guid: None,
            title: None,
            published_at: None,
            source: None,
            expected: ExpectedKey::NoIdentity,
        },
        GoldenVector {
            name: "unparsable link used verbatim",
            link: Some("not a url"),
            guid: None,
            title: None,
            published_at: None,
            source: None,
            expected: ExpectedKey::Exact("u:not a url"),
        },
    ]
}

/// Build the article described by a vector.
pub fn article_from_vector(vector: &GoldenVector) -> Article {
    Article {
        link: vector.link.map(String::from),
        guid: vector.guid.map(String::from),
        title: vector.title.map(String::from),
        published_at: vector.published_at.map(String::from),
        source: vector.source.map(String::from),
        extra: serde_json::Map::new(),
    }
}

/// Verify every golden vector, including derivation determinism.
///
/// Returns the first failure as a message naming the vector.
pub fn verify_all_vectors() -> Result<(), String> {
    for vector in all_vectors() {
        let article = article_from_vector(&vector);
        let key = derive_key(&article, DEFAULT_TRACKING_PARAMS);
        let again = derive_key(&article, DEFAULT_TRACKING_PARAMS);

        if key != again {
            return Err(format!("{}: derivation not deterministic", vector.name));
        }

        match (&vector.expected, &key) {
            (ExpectedKey::NoIdentity, None) => {}
            (ExpectedKey::NoIdentity, Some(k)) => {
                return Err(format!("{}: expected no key, got {}", vector.name, k));
            }
            (_, None) => {
                return Err(format!("{}: expected a key, got none", vector.name));
            }
            (ExpectedKey::Exact(expected), Some(k)) => {
                if k.as_str() != *expected {
                    return Err(format!(
                        "{}: expected {}, got {}",
                        vector.name, expected, k
                    ));
                }
            }
            (ExpectedKey::Fingerprint { digest_input }, Some(k)) => {
                let digest = blake3::hash(digest_input.as_bytes());
                let expected = format!("h:{}", hex::encode(digest.as_bytes()));
                if k.as_str() != expected {
                    return Err(format!(
                        "{}: expected {}, got {}",
                        vector.name, expected, k
                    ));
                }
            }
        }

        // Every derived key must survive the commit-interface parse.
        if let Some(k) = key {
            if DedupeKey::parse(k.as_str()).is_err() {
                return Err(format!("{}: derived key fails parse", vector.name));
            }
        }
    }
    Ok(())
}
