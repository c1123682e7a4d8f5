//! Proptest generators for property-based testing.

use proptest::prelude::*;

use feedgate_core::Article;

/// Generate a plausible http(s) URL.
pub fn link() -> impl Strategy<Value = String> {
    (
        "[a-z][a-z0-9]{1,10}\\.(com|org|net)",
        "(/[A-Za-z0-9_-]{1,8}){0,3}",
        prop::option::of("(utm_source|id|page)=[a-z0-9]{1,6}(&(utm_medium|q)=[a-z0-9]{1,6})?"),
    )
        .prop_map(|(host, path, query)| match query {
            Some(q) => format!("https://{host}{path}?{q}"),
            None => format!("https://{host}{path}"),
        })
}

/// Generate a feed guid.
pub fn guid() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9:/._-]{1,40}".prop_map(String::from)
}

/// Generate an article title.
pub fn title() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 ,.!?'-]{1,60}".prop_map(String::from)
}

/// Generate a published-date string.
pub fn published_at() -> impl Strategy<Value = String> {
    "20[0-2][0-9]-[01][0-9]-[0-3][0-9]".prop_map(String::from)
}

/// Generate a feed source name.
pub fn source() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,15}".prop_map(String::from)
}

/// Parameters for generating an article.
///
/// Any subset of fields may be absent, mirroring real feed data.
#[derive(Debug, Clone)]
pub struct ArticleParams {
    pub link: Option<String>,
    pub guid: Option<String>,
    pub title: Option<String>,
    pub published_at: Option<String>,
    pub source: Option<String>,
}

impl Arbitrary for ArticleParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            prop::option::of(link()),
            prop::option::of(guid()),
            prop::option::of(title()),
            prop::option::of(published_at()),
            prop::option::of(source()),
        )
            .prop_map(|(link, guid, title, published_at, source)| ArticleParams {
                link,
                guid,
                title,
                published_at,
                source,
            })
            .boxed()
    }
}

/// Build an article from parameters.
pub fn article_from_params(params: &ArticleParams) -> Article {
    Article {
        link: params.link.clone(),
        guid: params.guid.clone(),
        title: params.title.clone(),
        published_at: params.published_at.clone(),
        source: params.source.clone(),
        extra: serde_json::Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedgate_core::{derive_key, normalize_url, DedupeKey, DEFAULT_TRACKING_PARAMS};

    proptest! {
        #[test]
        fn test_key_derivation_deterministic(params: ArticleParams) {
            let a1 = article_from_params(&params);
            let a2 = article_from_params(&params);

            prop_assert_eq!(
                derive_key(&a1, DEFAULT_TRACKING_PARAMS),
                derive_key(&a2, DEFAULT_TRACKING_PARAMS)
            );
        }

        #[test]
        fn test_derived_keys_parse_back(params: ArticleParams) {
            if let Some(key) = derive_key(&article_from_params(&params), DEFAULT_TRACKING_PARAMS) {
                let parsed = DedupeKey::parse(key.as_str()).unwrap();
                prop_assert_eq!(parsed, key);
            }
        }

        #[test]
        fn test_generated_links_normalize_idempotently(raw in link()) {
            let once = normalize_url(&raw, DEFAULT_TRACKING_PARAMS);
            let twice = normalize_url(&once, DEFAULT_TRACKING_PARAMS);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn test_link_identity_ignores_tracking_params(
            host in "[a-z]{3,8}\\.com",
            path in "/[a-z]{1,8}",
            tracker in "(utm_source|utm_campaign|fbclid)",
            value in "[a-z0-9]{1,8}",
        ) {
            let clean = Article::with_link(format!("https://{host}{path}"));
            let tracked = Article::with_link(format!("https://{host}{path}?{tracker}={value}"));

            prop_assert_eq!(
                derive_key(&clean, DEFAULT_TRACKING_PARAMS),
                derive_key(&tracked, DEFAULT_TRACKING_PARAMS)
            );
        }
    }
}
