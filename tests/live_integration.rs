//! Integration tests for live mode
//!
//! Covers the temporal cache, fallback derivation, time filtering and
//! fixture generation against a scripted data source.

mod common;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use pretty_assertions::assert_eq;
use std::sync::Arc;

use common::{LiveHarness, ReadOnlyCacheStore, ScriptedSource, CONTENT_URL};
use interaction_verifier::core::{
    CacheStore, FixtureSample, FixtureStore, ManualClock, MemoryFixtureStore, TemporalCache,
    VerificationEngine,
};
use interaction_verifier::types::{
    ContentItem, FixtureKind, RelationshipSource, RunMode, ScoringMode, TimeFilter,
    VerificationRequest, VerifyError,
};

fn brand_thread() -> Vec<ContentItem> {
    vec![
        ContentItem::post("123", "brand"),
        ContentItem::reply("124", "alice", "123"),
    ]
}

fn alice() -> VerificationRequest {
    VerificationRequest::new("alice", CONTENT_URL, "brand")
}

#[tokio::test]
async fn test_fresh_cache_avoids_refetch() {
    let harness = LiveHarness::new(
        ScriptedSource::new()
            .with_followers(&["Alice", "carol"])
            .with_thread("123", brand_thread()),
    );

    let first = harness.engine.verify(&alice(), RunMode::Live).await.unwrap();
    assert_eq!(first.relationship_source, RelationshipSource::Live);
    assert!(!first.cache_used);
    assert_eq!(first.score, 100);
    assert_eq!(harness.cache.len(), 1);

    harness.clock.advance(Duration::hours(23));

    let second = harness.engine.verify(&alice(), RunMode::Live).await.unwrap();
    assert_eq!(second.relationship_source, RelationshipSource::Cache);
    assert!(second.cache_used);
    assert_eq!(second.score, 100);
    assert_eq!(harness.source.relationship_calls(), 1);
}

#[tokio::test]
async fn test_stale_cache_is_refetched_and_replaced() {
    let harness = LiveHarness::new(
        ScriptedSource::new()
            .with_followers(&["carol"])
            .with_thread("123", brand_thread()),
    );

    let before = harness.engine.verify(&alice(), RunMode::Live).await.unwrap();
    assert!(!before.interactions.follows);

    harness.source.set_followers(Some(common::followers(&["carol", "alice"])));
    harness.clock.advance(Duration::hours(24));

    let after = harness.engine.verify(&alice(), RunMode::Live).await.unwrap();
    assert_eq!(after.relationship_source, RelationshipSource::Live);
    assert!(after.interactions.follows);
    assert_eq!(harness.source.relationship_calls(), 2);

    let entry = harness.cache.load("followers_brand").unwrap().unwrap();
    assert_eq!(entry.records.len(), 2);
    assert_eq!(entry.retrieved_at, common::start_time() + Duration::hours(24));
}

#[tokio::test]
async fn test_zero_max_age_always_refetches() {
    let harness = LiveHarness::new(
        ScriptedSource::new()
            .with_followers(&["alice"])
            .with_thread("123", brand_thread()),
    );
    let request = alice().with_time_filter(TimeFilter {
        check_since: None,
        max_cache_age_hours: 0.0,
    });

    harness.engine.verify(&request, RunMode::Live).await.unwrap();
    let outcome = harness.engine.verify(&request, RunMode::Live).await.unwrap();

    assert_eq!(outcome.relationship_source, RelationshipSource::Live);
    assert_eq!(harness.source.relationship_calls(), 2);
}

#[tokio::test]
async fn test_cache_key_ignores_target_spelling() {
    let harness = LiveHarness::new(
        ScriptedSource::new()
            .with_followers(&["alice"])
            .with_thread("123", brand_thread()),
    );

    harness
        .engine
        .verify(&VerificationRequest::new("alice", CONTENT_URL, "@Brand"), RunMode::Live)
        .await
        .unwrap();
    let outcome = harness.engine.verify(&alice(), RunMode::Live).await.unwrap();

    assert!(outcome.cache_used);
    assert_eq!(harness.source.relationship_calls(), 1);
}

#[tokio::test]
async fn test_fallback_when_follower_list_unavailable() {
    let harness = LiveHarness::new(
        ScriptedSource::new()
            .with_recent(vec![ContentItem::post("1", "brand"), ContentItem::post("2", "brand")])
            .with_thread("1", vec![ContentItem::reply("11", "Alice", "1")])
            .with_thread("2", vec![ContentItem::reply("21", "carol", "2")])
            .with_thread("123", brand_thread()),
    );

    let outcome = harness.engine.verify(&alice(), RunMode::Live).await.unwrap();

    assert_eq!(outcome.relationship_source, RelationshipSource::Fallback);
    assert!(outcome.used_fallback());
    assert!(!outcome.cache_used);
    assert!(outcome.interactions.follows);
    assert!(!outcome.warnings.is_empty());
    assert_eq!(harness.cache.len(), 0, "approximations are never cached");
}

#[tokio::test]
async fn test_fallback_empty_union_is_negative() {
    let harness = LiveHarness::new(
        ScriptedSource::new()
            .with_recent(vec![ContentItem::post("1", "brand")])
            .with_thread("1", vec![])
            .with_thread("123", brand_thread()),
    );

    let outcome = harness.engine.verify(&alice(), RunMode::Live).await.unwrap();

    assert_eq!(outcome.relationship_source, RelationshipSource::Fallback);
    assert!(!outcome.interactions.follows);
    assert!(outcome.interactions.commented);
    assert_eq!(outcome.score, 50);
}

#[tokio::test]
async fn test_fallback_failure_is_fatal() {
    let harness = LiveHarness::new(ScriptedSource::new().with_thread("123", brand_thread()));

    let err = harness.engine.verify(&alice(), RunMode::Live).await.unwrap_err();

    match err {
        VerifyError::Upstream(message) => {
            assert!(message.contains("hidden"), "names the primary failure: {}", message);
            assert!(message.contains("fallback"), "names the fallback failure: {}", message);
        }
        other => panic!("expected Upstream, got {:?}", other),
    }
}

#[tokio::test]
async fn test_comment_failure_is_fatal() {
    let harness = LiveHarness::new(ScriptedSource::new().with_followers(&["alice"]));

    let err = harness.engine.verify(&alice(), RunMode::Live).await.unwrap_err();

    assert!(matches!(err, VerifyError::Upstream(_)));
    assert_eq!(err.code(), "R200_UPSTREAM_FAILED");
}

#[tokio::test]
async fn test_check_since_narrows_comments_to_the_day() {
    let harness = LiveHarness::new(
        ScriptedSource::new()
            .with_followers(&["alice"])
            .with_thread("123", brand_thread()),
    );
    let since = Utc.with_ymd_and_hms(2025, 7, 20, 23, 59, 59).unwrap();
    let request = alice().with_time_filter(TimeFilter::since(since));

    let outcome = harness.engine.verify(&request, RunMode::Live).await.unwrap();

    assert_eq!(outcome.check_since, Some(since));
    assert_eq!(
        harness.source.conversation_calls(),
        vec![("123".to_string(), NaiveDate::from_ymd_opt(2025, 7, 20))]
    );
    // follows is answered from the full list
    assert!(outcome.interactions.follows);
    assert_eq!(harness.source.relationship_calls(), 1);
}

#[tokio::test]
async fn test_cache_write_failure_is_not_fatal() {
    let source = Arc::new(
        ScriptedSource::new()
            .with_followers(&["alice"])
            .with_thread("123", brand_thread()),
    );
    let cache = TemporalCache::new(
        Arc::new(ReadOnlyCacheStore),
        Arc::new(ManualClock::new(common::start_time())),
    );
    let engine =
        VerificationEngine::new(cache, Arc::new(MemoryFixtureStore::new())).with_source(source);

    let outcome = engine.verify(&alice(), RunMode::Live).await.unwrap();

    assert_eq!(outcome.score, 100);
    assert_eq!(outcome.relationship_source, RelationshipSource::Live);
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].contains("read-only"));
}

#[tokio::test]
async fn test_three_action_live_fetches_repost_timeline() {
    let harness = LiveHarness::new(
        ScriptedSource::new()
            .with_followers(&["alice"])
            .with_thread("123", vec![])
            .with_reposts(vec![ContentItem::repost("900", "alice", "BRAND")]),
    )
    .scoring(ScoringMode::ThreeAction);

    let outcome = harness.engine.verify(&alice(), RunMode::Live).await.unwrap();

    assert_eq!(outcome.interactions.retweeted, Some(true));
    assert!(!outcome.interactions.commented);
    assert_eq!(outcome.score, 67);
}

#[tokio::test]
async fn test_generated_fixtures_replay_the_live_answer() {
    let harness = LiveHarness::new(
        ScriptedSource::new()
            .with_followers(&["Alice", "carol"])
            .with_thread("123", brand_thread())
            .with_reposts(vec![ContentItem::repost("900", "alice", "brand")]),
    )
    .sample(FixtureSample {
        subject: "alice".into(),
        content_url: CONTENT_URL.into(),
        target_account: "brand".into(),
    });

    let report = harness.engine.generate_fixtures(RunMode::Live).await.unwrap();

    let names: Vec<_> = report.fixtures.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "followers_of_target_page.json",
            "user_timeline_retweets.json",
            "comments_example.json",
        ]
    );
    assert_eq!(report.fixtures[0].items, 2);
    assert_eq!(report.generated_at, common::start_time());
    assert_eq!(harness.fixtures.load(FixtureKind::Comments).unwrap().items.len(), 2);

    let live = harness.engine.verify(&alice(), RunMode::Live).await.unwrap();
    let replay = harness.engine.verify(&alice(), RunMode::Replay).await.unwrap();
    assert_eq!(live.interactions, replay.interactions);
    assert_eq!(replay.relationship_source, RelationshipSource::Fixture);
}

#[tokio::test]
async fn test_fixture_generation_requires_live_mode_and_sample() {
    let harness = LiveHarness::new(ScriptedSource::new().with_followers(&["alice"]));

    let no_sample = harness.engine.generate_fixtures(RunMode::Live).await.unwrap_err();
    assert!(no_sample.is_input());

    let harness = harness.sample(FixtureSample {
        subject: "alice".into(),
        content_url: CONTENT_URL.into(),
        target_account: "brand".into(),
    });
    let replay = harness.engine.generate_fixtures(RunMode::Replay).await.unwrap_err();
    assert!(replay.is_input());
    assert_eq!(harness.source.relationship_calls(), 0);
}
