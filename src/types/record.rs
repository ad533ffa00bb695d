//! Record schemas for data retrieved from the external platform
//!
//! Field names follow the platform's JSON (`userName`, `isReply`, ...) so raw
//! scraper dumps and fixture files deserialize without a mapping layer.
//! Items are validated one by one; an item that fails the schema is dropped.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One account known to follow (or interact with) a target account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    /// Account handle, compared after normalization
    #[serde(rename = "userName")]
    pub identifier: String,
    /// Display name
    #[serde(rename = "name", default)]
    pub display_name: String,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub following: u64,
    #[serde(rename = "isVerified", default)]
    pub verified: bool,
}

impl RelationshipRecord {
    /// Create a record with zeroed counts
    pub fn new(identifier: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: display_name.into(),
            followers: 0,
            following: 0,
            verified: false,
        }
    }
}

impl From<&AuthorSnapshot> for RelationshipRecord {
    fn from(author: &AuthorSnapshot) -> Self {
        Self {
            identifier: author.identifier.clone(),
            display_name: author.display_name.clone(),
            followers: author.followers,
            following: author.following,
            verified: author.verified,
        }
    }
}

/// Denormalized profile of a content author at retrieval time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSnapshot {
    #[serde(rename = "userName")]
    pub identifier: String,
    #[serde(rename = "name", default)]
    pub display_name: String,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub following: u64,
    #[serde(rename = "isVerified", default)]
    pub verified: bool,
}

impl AuthorSnapshot {
    pub fn new(identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        Self {
            display_name: identifier.clone(),
            identifier,
            followers: 0,
            following: 0,
            verified: false,
        }
    }
}

/// The original post behind a repost
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepostedContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorSnapshot>,
}

/// One unit of public content (a post, reply or repost)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,
    pub author: AuthorSnapshot,
    #[serde(default)]
    pub is_reply: bool,
    #[serde(default)]
    pub is_retweet: bool,
    #[serde(default)]
    pub is_quote: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    /// Platform timestamp, kept verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "retweetedTweet", default, skip_serializing_if = "Option::is_none")]
    pub reposted: Option<RepostedContent>,
}

impl ContentItem {
    /// Create a top-level post
    pub fn post(id: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            author: AuthorSnapshot::new(author),
            is_reply: false,
            is_retweet: false,
            is_quote: false,
            conversation_id: None,
            created_at: None,
            text: None,
            reposted: None,
        }
    }

    /// Create a reply inside a conversation
    pub fn reply(
        id: impl Into<String>,
        author: impl Into<String>,
        conversation_id: impl Into<String>,
    ) -> Self {
        Self {
            is_reply: true,
            conversation_id: Some(conversation_id.into()),
            ..Self::post(id, author)
        }
    }

    /// Create a repost of another account's post
    pub fn repost(
        id: impl Into<String>,
        author: impl Into<String>,
        original_author: impl Into<String>,
    ) -> Self {
        Self {
            is_retweet: true,
            reposted: Some(RepostedContent {
                id: None,
                author: Some(AuthorSnapshot::new(original_author)),
            }),
            ..Self::post(id, author)
        }
    }

    /// Handle of the reposted post's author, if this is a repost
    pub fn reposted_author(&self) -> Option<&str> {
        self.reposted
            .as_ref()
            .and_then(|r| r.author.as_ref())
            .map(|a| a.identifier.as_str())
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Semantic checks applied after a record deserializes
pub trait Validate {
    fn is_valid(&self) -> bool;
}

impl Validate for RelationshipRecord {
    fn is_valid(&self) -> bool {
        !self.identifier.trim().is_empty()
    }
}

impl Validate for ContentItem {
    fn is_valid(&self) -> bool {
        !self.id.trim().is_empty() && !self.author.identifier.trim().is_empty()
    }
}

/// Outcome of validating a batch of loose items
#[derive(Debug, Clone)]
pub struct Parsed<T> {
    pub items: Vec<T>,
    /// Items dropped because they failed the schema
    pub rejected: usize,
}

/// Parse loose JSON items into typed records, dropping invalid ones
pub fn parse_items<T>(values: Vec<Value>) -> Parsed<T>
where
    T: DeserializeOwned + Validate,
{
    let total = values.len();
    let items: Vec<T> = values
        .into_iter()
        .filter_map(|v| serde_json::from_value::<T>(v).ok())
        .filter(Validate::is_valid)
        .collect();
    let rejected = total - items.len();

    if rejected > 0 {
        tracing::debug!(total, rejected, "dropped items failing schema validation");
    }

    Parsed { items, rejected }
}
