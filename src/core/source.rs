//! Data source port
//!
//! The engine calls these operations and never implements them. Transport,
//! authentication, rate limiting and timeouts belong to the implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::types::{ContentItem, RelationshipRecord, VerifyError};

/// Failure reported by a data source
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unusable payload: {0}")]
    Parse(String),

    #[error("data source not configured: {0}")]
    NotConfigured(String),
}

impl From<SourceError> for VerifyError {
    fn from(e: SourceError) -> Self {
        VerifyError::Upstream(e.to_string())
    }
}

/// Retrieval of relationship lists, timelines and comment threads
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Accounts following `target`
    async fn fetch_relationships(
        &self,
        target: &str,
    ) -> Result<Vec<RelationshipRecord>, SourceError>;

    /// Items in the conversation rooted at `content_id`, created on or after `since`
    async fn fetch_conversation(
        &self,
        content_id: &str,
        since: Option<NaiveDate>,
    ) -> Result<Vec<ContentItem>, SourceError>;

    /// Most recent posts by `account`
    async fn fetch_recent_content(
        &self,
        account: &str,
        limit: usize,
    ) -> Result<Vec<ContentItem>, SourceError>;

    /// Most recent native reposts by `account`
    async fn fetch_repost_timeline(
        &self,
        account: &str,
        limit: usize,
    ) -> Result<Vec<ContentItem>, SourceError>;
}

// =============================================================================
// SEARCH QUERIES
// =============================================================================

/// Date format of the `since:` search operator
pub const SINCE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Search term for a conversation, optionally bounded below by a day
pub fn conversation_query(content_id: &str, since: Option<NaiveDate>) -> String {
    match since {
        Some(date) => format!(
            "conversation_id:{} since:{}",
            content_id,
            date.format(SINCE_DATE_FORMAT)
        ),
        None => format!("conversation_id:{}", content_id),
    }
}

/// Search term for an account's own posts
pub fn author_query(account: &str) -> String {
    format!("from:{}", account.trim().trim_start_matches('@'))
}

/// Search term for an account's native reposts
pub fn repost_query(account: &str) -> String {
    format!("{} filter:nativeretweets", author_query(account))
}
