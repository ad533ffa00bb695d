//! Persisted cache and fixture shapes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::RelationshipRecord;

/// A timestamped follower list for one target account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub records: Vec<RelationshipRecord>,
    /// When the list was fetched
    pub retrieved_at: DateTime<Utc>,
    /// When the list was last confirmed valid
    pub last_checked_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(records: Vec<RelationshipRecord>, now: DateTime<Utc>) -> Self {
        Self {
            records,
            retrieved_at: now,
            last_checked_at: now,
        }
    }
}

/// Content type of a replay fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureKind {
    /// Follower list of the target account
    Relationships,
    /// Repost timeline of the subject
    Timeline,
    /// Comment thread of the target post
    Comments,
}

impl FixtureKind {
    /// File name under the fixture directory
    pub fn file_name(&self) -> &'static str {
        match self {
            FixtureKind::Relationships => "followers_of_target_page.json",
            FixtureKind::Timeline => "user_timeline_retweets.json",
            FixtureKind::Comments => "comments_example.json",
        }
    }
}

impl std::fmt::Display for FixtureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_name())
    }
}

/// On-disk fixture envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureSnapshot {
    pub kind: FixtureKind,
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    /// Raw items in platform JSON, validated on use
    pub items: Vec<Value>,
}

/// Summary of a fixture generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureReport {
    pub generated_at: DateTime<Utc>,
    pub fixtures: Vec<FixtureSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureSummary {
    pub kind: FixtureKind,
    pub name: String,
    pub items: usize,
}
