//! Article records as they arrive from the feed-polling collaborator.
//!
//! Every identity-bearing field is optional: real feeds omit guids,
//! links, and dates freely, and the engine must tolerate any subset.
//! Fields the engine does not interpret are kept verbatim in `extra`
//! and forwarded untouched.

use serde::{Deserialize, Serialize};

use crate::key::DedupeKey;

/// A single polled feed item.
///
/// Deserializes from whatever the poller hands over; unknown fields
/// land in `extra` and round-trip unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Link to the article, if the feed provided one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    /// Feed-assigned guid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,

    /// Article title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Published date, kept as the raw string the feed supplied.
    #[serde(default, rename = "publishedAt", skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,

    /// Name of the originating feed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Fields the engine does not interpret, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Article {
    /// Create an article with only a link set.
    pub fn with_link(link: impl Into<String>) -> Self {
        Self {
            link: Some(link.into()),
            ..Self::default()
        }
    }

    /// Create an article with only a guid set.
    pub fn with_guid(guid: impl Into<String>) -> Self {
        Self {
            guid: Some(guid.into()),
            ..Self::default()
        }
    }

    /// True if the field is present and non-empty.
    pub(crate) fn has(field: &Option<String>) -> bool {
        field.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// An article that passed admission, with its dedupe key attached.
///
/// This is the record forwarded to the content-generation/delivery
/// collaborator. The delivery side reports the key back through the
/// commit interface once downstream work reaches a terminal outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmittedArticle {
    /// The original article, fields untouched.
    #[serde(flatten)]
    pub article: Article,

    /// The identity under which this article was reserved.
    #[serde(rename = "dedupeKey")]
    pub dedupe_key: DedupeKey,
}
