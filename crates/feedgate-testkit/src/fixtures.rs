//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: a settable clock and an
//! engine wired to an in-memory store.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use feedgate::{Article, DedupeEngine, EngineConfig};
use feedgate_core::Clock;
use feedgate_store::MemoryStore;

/// A clock that only moves when told to.
///
/// TTL expiry becomes deterministic: reserve at T, advance past the
/// lease window, observe the key admissible again - no real waiting.
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Create a clock starting at the given Unix-millisecond instant.
    pub fn starting_at(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, by: Duration) {
        self.now
            .fetch_add(i64::try_from(by.as_millis()).unwrap_or(i64::MAX), Ordering::SeqCst);
    }

    /// Jump the clock to an absolute instant.
    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    /// Starts at an arbitrary fixed instant (2024-01-01T00:00:00Z).
    fn default() -> Self {
        Self::starting_at(1_704_067_200_000)
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// An engine over an in-memory store with a manual clock.
pub struct TestFixture {
    pub clock: Arc<ManualClock>,
    pub engine: DedupeEngine<MemoryStore>,
}

impl TestFixture {
    /// Default engine configuration (30d posted, 2h pending).
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Custom engine configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        let clock = Arc::new(ManualClock::default());
        let store = MemoryStore::new(config.retention_policy());
        let engine = DedupeEngine::with_clock(store, Arc::clone(&clock) as Arc<dyn Clock>, config);
        Self { clock, engine }
    }

    /// An article identified by its link.
    pub fn link_article(&self, link: &str) -> Article {
        Article::with_link(link)
    }

    /// An article identified by its guid.
    pub fn guid_article(&self, guid: &str) -> Article {
        Article::with_guid(guid)
    }

    /// An article identified only by its fingerprint fields.
    pub fn fingerprint_article(&self, title: &str, published_at: &str, source: &str) -> Article {
        Article {
            title: Some(title.to_string()),
            published_at: Some(published_at.to_string()),
            source: Some(source.to_string()),
            ..Article::default()
        }
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::starting_at(1_000);
        assert_eq!(clock.now_millis(), 1_000);

        clock.advance(Duration::from_secs(2));
        assert_eq!(clock.now_millis(), 3_000);

        clock.set(42);
        assert_eq!(clock.now_millis(), 42);
    }

    #[tokio::test]
    async fn fixture_engine_uses_manual_clock() {
        let fixture = TestFixture::new();
        let article = fixture.guid_article("abc");

        assert!(fixture.engine.admit(article.clone()).await.unwrap().is_accepted());

        // Lease expires only when the clock says so.
        fixture.clock.advance(Duration::from_secs(3 * 60 * 60));
        assert!(fixture.engine.admit(article).await.unwrap().is_accepted());
    }
}
