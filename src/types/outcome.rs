//! Verification results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::RunMode;

/// Verdict for an action public data cannot reveal
///
/// Serialized as `"unknown"`. Never scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionState {
    Unknown,
}

/// Which actions count toward the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoringMode {
    /// follows + commented
    #[default]
    TwoAction,
    /// follows + commented + retweeted
    ThreeAction,
}

impl ScoringMode {
    pub fn action_count(&self) -> usize {
        match self {
            ScoringMode::TwoAction => 2,
            ScoringMode::ThreeAction => 3,
        }
    }

    pub fn includes_retweet(&self) -> bool {
        matches!(self, ScoringMode::ThreeAction)
    }
}

impl std::fmt::Display for ScoringMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoringMode::TwoAction => write!(f, "two-action"),
            ScoringMode::ThreeAction => write!(f, "three-action"),
        }
    }
}

/// Where the follower list behind `follows` came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipSource {
    /// Replay fixture
    Fixture,
    /// Temporal cache, within max age
    Cache,
    /// Fresh primary fetch
    Live,
    /// Approximated from reply authors on the target's recent posts
    Fallback,
}

/// Per-action verdicts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interactions {
    pub follows: bool,
    pub commented: bool,
    /// Only evaluated under three-action scoring
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retweeted: Option<bool>,
    /// Always unknown: likes are not publicly observable
    pub liked: ActionState,
}

impl Interactions {
    pub fn new(follows: bool, commented: bool, retweeted: Option<bool>) -> Self {
        Self {
            follows,
            commented,
            retweeted,
            liked: ActionState::Unknown,
        }
    }

    /// Known boolean verdicts, in scoring order
    pub fn known(&self) -> Vec<bool> {
        let mut known = vec![self.follows, self.commented];
        if let Some(r) = self.retweeted {
            known.push(r);
        }
        known
    }
}

/// Final result of a verification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionOutcome {
    pub subject: String,
    pub content_url: String,
    pub content_id: String,
    pub target_account: String,
    pub interactions: Interactions,
    /// 0-100
    pub score: u8,
    pub mode: RunMode,
    pub scoring: ScoringMode,
    /// True when `follows` was answered from the temporal cache
    pub cache_used: bool,
    pub relationship_source: RelationshipSource,
    /// Lower bound applied to the comment search, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_since: Option<DateTime<Utc>>,
    pub checked_at: DateTime<Utc>,
    /// Non-fatal conditions hit while answering
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl InteractionOutcome {
    /// True when `follows` is an approximation rather than a list lookup
    pub fn used_fallback(&self) -> bool {
        self.relationship_source == RelationshipSource::Fallback
    }
}
