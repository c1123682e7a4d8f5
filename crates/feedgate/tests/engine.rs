//! End-to-end admission/commit lifecycle tests.
//!
//! All timing goes through the testkit's manual clock, so TTL windows
//! are exercised without real waits.

use std::sync::Arc;
use std::time::Duration;

use feedgate::{
    Admission, Article, Clock, DedupeEngine, DedupeKey, EngineConfig, SqliteStore, StateStore,
};
use feedgate_testkit::fixtures::TestFixture;

const HOUR: Duration = Duration::from_secs(60 * 60);
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

#[tokio::test]
async fn lifecycle_admit_commit_expire() {
    let fixture = TestFixture::new();
    let article = fixture.link_article("https://example.com/story");

    // First sight: accepted, key attached.
    let admitted = fixture
        .engine
        .admit(article.clone())
        .await
        .unwrap()
        .into_accepted()
        .unwrap();
    assert_eq!(admitted.dedupe_key.as_str(), "u:https://example.com/story");

    // Re-poll while in flight: rejected by the lease.
    assert!(matches!(
        fixture.engine.admit(article.clone()).await.unwrap(),
        Admission::InFlight(_)
    ));

    // Downstream succeeds; commit.
    fixture.engine.commit([admitted.dedupe_key]).await.unwrap();

    // One hour later: still a duplicate.
    fixture.clock.advance(HOUR);
    assert!(matches!(
        fixture.engine.admit(article.clone()).await.unwrap(),
        Admission::Duplicate(_)
    ));

    // 31 days after commit: the retention window lapsed.
    fixture.clock.advance(31 * DAY);
    assert!(fixture.engine.admit(article).await.unwrap().is_accepted());
}

#[tokio::test]
async fn abandoned_lease_recovers_after_pending_ttl() {
    let fixture = TestFixture::new();
    let article = fixture.guid_article("abc123");

    assert!(fixture.engine.admit(article.clone()).await.unwrap().is_accepted());
    // Downstream crashes; no commit ever arrives.

    // Strictly before the lease window ends: still blocked.
    fixture.clock.advance(2 * HOUR - Duration::from_millis(1));
    assert!(matches!(
        fixture.engine.admit(article.clone()).await.unwrap(),
        Admission::InFlight(_)
    ));

    // Past the window: admissible again.
    fixture.clock.advance(HOUR);
    assert!(fixture.engine.admit(article).await.unwrap().is_accepted());
}

#[tokio::test]
async fn concurrent_admissions_for_same_key_single_winner() {
    let fixture = Arc::new(TestFixture::new());

    let mut handles = Vec::new();
    for _ in 0..32 {
        let fixture = Arc::clone(&fixture);
        handles.push(tokio::spawn(async move {
            fixture
                .engine
                .admit(Article::with_link("https://example.com/contested"))
                .await
                .unwrap()
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        if handle.await.unwrap().is_accepted() {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 1);
}

#[tokio::test]
async fn batch_keeps_arrival_order_and_drops_rejects() {
    let fixture = TestFixture::new();
    let batch = vec![
        fixture.link_article("https://example.com/a?utm_source=share"),
        // Same article, different tracking decoration.
        fixture.link_article("https://example.com/a?utm_medium=mail"),
        fixture.guid_article("abc123"),
        // No identity at all.
        Article::default(),
        fixture.link_article("https://example.com/b"),
    ];

    let accepted = fixture.engine.admit_batch(batch).await.unwrap();
    let keys: Vec<&str> = accepted.iter().map(|a| a.dedupe_key.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "u:https://example.com/a",
            "g:abc123",
            "u:https://example.com/b",
        ]
    );
}

#[tokio::test]
async fn commit_is_idempotent_and_tolerates_unknown_keys() {
    let fixture = TestFixture::new();
    let article = fixture.guid_article("abc123");

    let admitted = fixture
        .engine
        .admit(article.clone())
        .await
        .unwrap()
        .into_accepted()
        .unwrap();

    let key = admitted.dedupe_key;
    fixture.engine.commit([key.clone()]).await.unwrap();
    // Re-commit after partial success downstream.
    fixture.engine.commit([key.clone()]).await.unwrap();
    // A key nothing ever reserved.
    fixture
        .engine
        .commit([DedupeKey::from_guid("never-seen")])
        .await
        .unwrap();

    assert!(matches!(
        fixture.engine.admit(article).await.unwrap(),
        Admission::Duplicate(_)
    ));
}

#[tokio::test]
async fn capacity_bound_holds_after_commit() {
    let fixture = TestFixture::with_config(EngineConfig {
        max_keys: 5,
        ..EngineConfig::default()
    });

    for i in 0..20 {
        fixture.clock.advance(Duration::from_millis(1));
        let admitted = fixture
            .engine
            .admit(fixture.guid_article(&format!("item-{i}")))
            .await
            .unwrap()
            .into_accepted()
            .unwrap();
        fixture.engine.commit([admitted.dedupe_key]).await.unwrap();
    }

    assert!(fixture.engine.live_count().await.unwrap() <= 5);

    // The newest keys survived the oldest-first eviction.
    assert!(matches!(
        fixture.engine.admit(fixture.guid_article("item-19")).await.unwrap(),
        Admission::Duplicate(_)
    ));
}

#[tokio::test]
async fn commit_raw_rejects_malformed_keys() {
    let fixture = TestFixture::new();

    fixture.engine.commit_raw(["g:abc123", "u:https://example.com/a"]).await.unwrap();
    assert!(fixture.engine.commit_raw(["untagged"]).await.is_err());
}

#[tokio::test]
async fn sqlite_backed_engine_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dedupe.db");
    let config = EngineConfig::default();

    {
        let store = SqliteStore::open(&path, config.retention_policy()).unwrap();
        let engine = DedupeEngine::new(store, config.clone());
        let admitted = engine
            .admit(Article::with_guid("durable"))
            .await
            .unwrap()
            .into_accepted()
            .unwrap();
        engine.commit([admitted.dedupe_key]).await.unwrap();
    }

    // A fresh process over the same database still refuses the repeat.
    let store = SqliteStore::open(&path, config.retention_policy()).unwrap();
    let engine = DedupeEngine::new(store, config);
    assert!(matches!(
        engine.admit(Article::with_guid("durable")).await.unwrap(),
        Admission::Duplicate(_)
    ));
}

#[tokio::test]
async fn maintenance_sweeps_without_commit() {
    let fixture = TestFixture::new();

    assert!(fixture
        .engine
        .admit(fixture.guid_article("stale"))
        .await
        .unwrap()
        .is_accepted());
    assert_eq!(fixture.engine.live_count().await.unwrap(), 1);

    fixture.clock.advance(3 * HOUR);
    fixture.engine.run_maintenance().await.unwrap();
    assert_eq!(fixture.engine.live_count().await.unwrap(), 0);
}

#[tokio::test]
async fn store_queries_reflect_engine_state() {
    let fixture = TestFixture::new();
    let key = DedupeKey::from_guid("abc123");

    assert!(fixture.engine.admit(fixture.guid_article("abc123")).await.unwrap().is_accepted());
    let now = fixture.clock.now_millis();
    assert!(fixture.engine.store().is_pending_live(&key, now).await.unwrap());

    fixture.engine.commit([key.clone()]).await.unwrap();
    assert!(fixture.engine.store().is_posted_live(&key, now).await.unwrap());
    assert!(!fixture.engine.store().is_pending_live(&key, now).await.unwrap());
}
