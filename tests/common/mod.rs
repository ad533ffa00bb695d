//! Shared test doubles: a scripted data source and fixture builders
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use interaction_verifier::core::{
    CacheStore, DataSource, FixtureSample, FixtureStore, ManualClock, MemoryCacheStore,
    MemoryFixtureStore, SourceError, TemporalCache, VerificationEngine,
};
use interaction_verifier::types::{
    CacheEntry, ContentItem, FixtureKind, FixtureSnapshot, RelationshipRecord, ScoringMode,
    VerifyError,
};
use interaction_verifier::FIXTURE_FORMAT_VERSION;

pub const CONTENT_URL: &str = "https://x.com/brand/status/123";

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap()
}

pub fn followers(handles: &[&str]) -> Vec<RelationshipRecord> {
    handles.iter().map(|h| RelationshipRecord::new(*h, *h)).collect()
}

/// Data source answering from in-memory scripts and recording its calls
///
/// Conversations not scripted fail with a network error.
#[derive(Default)]
pub struct ScriptedSource {
    followers: Mutex<Option<Vec<RelationshipRecord>>>,
    conversations: Mutex<HashMap<String, Vec<ContentItem>>>,
    recent: Mutex<Option<Vec<ContentItem>>>,
    reposts: Mutex<Vec<ContentItem>>,
    relationship_calls: AtomicUsize,
    conversation_calls: Mutex<Vec<(String, Option<NaiveDate>)>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_followers(self, handles: &[&str]) -> Self {
        self.set_followers(Some(followers(handles)));
        self
    }

    pub fn with_thread(self, content_id: &str, items: Vec<ContentItem>) -> Self {
        self.conversations.lock().unwrap().insert(content_id.to_string(), items);
        self
    }

    pub fn with_recent(self, items: Vec<ContentItem>) -> Self {
        *self.recent.lock().unwrap() = Some(items);
        self
    }

    pub fn with_reposts(self, items: Vec<ContentItem>) -> Self {
        *self.reposts.lock().unwrap() = items;
        self
    }

    /// `None` makes the relationship fetch fail
    pub fn set_followers(&self, records: Option<Vec<RelationshipRecord>>) {
        *self.followers.lock().unwrap() = records;
    }

    pub fn relationship_calls(&self) -> usize {
        self.relationship_calls.load(Ordering::SeqCst)
    }

    pub fn conversation_calls(&self) -> Vec<(String, Option<NaiveDate>)> {
        self.conversation_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataSource for ScriptedSource {
    async fn fetch_relationships(
        &self,
        target: &str,
    ) -> Result<Vec<RelationshipRecord>, SourceError> {
        self.relationship_calls.fetch_add(1, Ordering::SeqCst);
        self.followers
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| SourceError::Api {
                status: 403,
                message: format!("followers of {} hidden", target),
            })
    }

    async fn fetch_conversation(
        &self,
        content_id: &str,
        since: Option<NaiveDate>,
    ) -> Result<Vec<ContentItem>, SourceError> {
        self.conversation_calls.lock().unwrap().push((content_id.to_string(), since));
        self.conversations
            .lock()
            .unwrap()
            .get(content_id)
            .cloned()
            .ok_or_else(|| SourceError::Network(format!("conversation {} unavailable", content_id)))
    }

    async fn fetch_recent_content(
        &self,
        account: &str,
        limit: usize,
    ) -> Result<Vec<ContentItem>, SourceError> {
        let recent = self.recent.lock().unwrap().clone();
        recent
            .map(|mut items| {
                items.truncate(limit);
                items
            })
            .ok_or_else(|| SourceError::Timeout(format!("posts of {}", account)))
    }

    async fn fetch_repost_timeline(
        &self,
        _account: &str,
        limit: usize,
    ) -> Result<Vec<ContentItem>, SourceError> {
        let mut items = self.reposts.lock().unwrap().clone();
        items.truncate(limit);
        Ok(items)
    }
}

/// Cache store whose writes always fail
#[derive(Default)]
pub struct ReadOnlyCacheStore;

impl CacheStore for ReadOnlyCacheStore {
    fn load(&self, _key: &str) -> Result<Option<CacheEntry>, VerifyError> {
        Ok(None)
    }

    fn store(&self, key: &str, _entry: &CacheEntry) -> Result<(), VerifyError> {
        Err(VerifyError::Persistence(format!("cache for {} is read-only", key)))
    }
}

pub fn snapshot<T: Serialize>(kind: FixtureKind, items: &[T]) -> FixtureSnapshot {
    FixtureSnapshot {
        kind,
        version: FIXTURE_FORMAT_VERSION,
        generated_at: start_time(),
        items: items.iter().map(|i| serde_json::to_value(i).unwrap()).collect(),
    }
}

/// Fixtures for the brand/status/123 scenario: alice follows and replied, bob did nothing
pub fn scenario_fixtures() -> Arc<MemoryFixtureStore> {
    let store = MemoryFixtureStore::new();
    store
        .save(&snapshot(FixtureKind::Relationships, &followers(&["Carol", "Alice"])))
        .unwrap();
    store
        .save(&snapshot(
            FixtureKind::Timeline,
            &[ContentItem::repost("900", "alice", "Brand"), ContentItem::post("901", "alice")],
        ))
        .unwrap();
    store
        .save(&snapshot(
            FixtureKind::Comments,
            &[
                ContentItem::post("123", "brand"),
                ContentItem::reply("124", "alice", "123"),
                ContentItem::reply("125", "carol", "123"),
            ],
        ))
        .unwrap();
    Arc::new(store)
}

/// Live engine over a scripted source, memory cache and manual clock
pub struct LiveHarness {
    pub engine: VerificationEngine,
    pub source: Arc<ScriptedSource>,
    pub clock: Arc<ManualClock>,
    pub cache: Arc<MemoryCacheStore>,
    pub fixtures: Arc<MemoryFixtureStore>,
}

impl LiveHarness {
    pub fn new(source: ScriptedSource) -> Self {
        let source = Arc::new(source);
        let clock = Arc::new(ManualClock::new(start_time()));
        let cache = Arc::new(MemoryCacheStore::new());
        let fixtures = Arc::new(MemoryFixtureStore::new());
        let temporal = TemporalCache::new(cache.clone(), clock.clone());
        let engine =
            VerificationEngine::new(temporal, fixtures.clone()).with_source(source.clone());

        Self { engine, source, clock, cache, fixtures }
    }

    pub fn scoring(mut self, scoring: ScoringMode) -> Self {
        self.engine = self.engine.with_scoring(scoring);
        self
    }

    pub fn sample(mut self, sample: FixtureSample) -> Self {
        self.engine = self.engine.with_fixture_sample(sample);
        self
    }
}
