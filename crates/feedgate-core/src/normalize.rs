//! Best-effort URL canonicalization.
//!
//! Two links to the same article routinely differ in fragment,
//! trailing slashes, and tracking parameters bolted on by social
//! shares. Normalization collapses those differences so the derived
//! key is stable across polls.
//!
//! Normalization is not a correctness gate: input that does not parse
//! as a URL is returned unchanged. The function is idempotent either
//! way.
//!
//! Query-parameter order is deliberately preserved, not sorted: two
//! URLs that differ only in parameter order produce distinct keys.

use url::Url;

/// Query parameters stripped during normalization because they do not
/// affect article identity.
pub const DEFAULT_TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "gclid",
    "fbclid",
    "mc_cid",
    "mc_eid",
    "igshid",
    "ref",
    "campaign_id",
];

/// Canonicalize a URL string into a comparable form.
///
/// On parsable input: strips the fragment, strips trailing `/` from
/// the path, and removes denylisted query parameters, preserving the
/// order of whatever remains. The `url` crate additionally applies
/// WHATWG normalization on parse (lowercased host and scheme,
/// percent-encoding cleanup); that only merges more spellings of the
/// same URL and keeps the result deterministic.
///
/// On unparsable input the original string is returned unchanged.
pub fn normalize_url<S: AsRef<str>>(raw: &str, denylist: &[S]) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return raw.to_string();
    };

    url.set_fragment(None);

    let path = url.path();
    if path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        url.set_path(&trimmed);
    }

    if url.query().is_some() {
        let retained: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(name, _)| !denylist.iter().any(|d| d.as_ref() == name))
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();

        if retained.is_empty() {
            url.set_query(None);
        } else {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            for (name, value) in &retained {
                pairs.append_pair(name, value);
            }
            drop(pairs);
        }
    }

    url.to_string()
}
