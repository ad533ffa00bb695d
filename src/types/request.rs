//! Verification inputs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::DEFAULT_MAX_CACHE_AGE_HOURS;

/// Where the engine reads its facts from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Recorded fixtures only, no network
    Replay,
    /// Live data source with temporal cache
    Live,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunMode::Replay => write!(f, "replay"),
            RunMode::Live => write!(f, "live"),
        }
    }
}

/// Temporal narrowing of a verification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeFilter {
    /// Only comments created on or after this day count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_since: Option<DateTime<Utc>>,
    /// Cached follower lists older than this are refetched
    #[serde(default = "default_max_cache_age")]
    pub max_cache_age_hours: f64,
}

fn default_max_cache_age() -> f64 {
    DEFAULT_MAX_CACHE_AGE_HOURS
}

impl Default for TimeFilter {
    fn default() -> Self {
        Self {
            check_since: None,
            max_cache_age_hours: DEFAULT_MAX_CACHE_AGE_HOURS,
        }
    }
}

impl TimeFilter {
    pub fn since(check_since: DateTime<Utc>) -> Self {
        Self {
            check_since: Some(check_since),
            ..Self::default()
        }
    }
}

/// A single verification request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRequest {
    /// Account whose actions are checked
    pub subject: String,
    /// URL of the target post (`.../status/<id>`)
    pub content_url: String,
    /// Account the subject should follow
    pub target_account: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_filter: Option<TimeFilter>,
}

impl VerificationRequest {
    pub fn new(
        subject: impl Into<String>,
        content_url: impl Into<String>,
        target_account: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            content_url: content_url.into(),
            target_account: target_account.into(),
            time_filter: None,
        }
    }

    pub fn with_time_filter(mut self, filter: TimeFilter) -> Self {
        self.time_filter = Some(filter);
        self
    }

    /// Effective filter (defaults when none was supplied)
    pub fn filter(&self) -> TimeFilter {
        self.time_filter.clone().unwrap_or_default()
    }
}
