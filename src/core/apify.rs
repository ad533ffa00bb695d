//! Apify-backed data source
//!
//! Runs scraper actors synchronously and reads their dataset items. Search
//! results are truncated client-side since the actor enforces a minimum
//! page size.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::core::source::{
    author_query, conversation_query, repost_query, DataSource, SourceError,
};
use crate::types::{parse_items, ContentItem, Parsed, RelationshipRecord};
use crate::{COMMENT_FETCH_LIMIT, RELATIONSHIP_FETCH_LIMIT};

const APIFY_BASE_URL: &str = "https://api.apify.com/v2";
const USER_AGENT: &str = concat!("interaction-verifier/", env!("CARGO_PKG_VERSION"));

/// Actor runs block until the dataset is ready
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Smallest `maxItems` the tweet scraper accepts
pub const MIN_SEARCH_ITEMS: usize = 50;

/// Tweet search actor
pub const TWEET_SCRAPER_ACTOR: &str = "61RPP7dywgiy0JPD0";

/// Follower list actor
pub const USER_SCRAPER_ACTOR: &str = "apidojo~twitter-user-scraper";

/// Data source over the Apify actor API
pub struct ApifyDataSource {
    http: reqwest::Client,
    token: String,
    base_url: String,
    comment_limit: usize,
}

impl ApifyDataSource {
    pub fn new(token: impl Into<String>) -> Result<Self, SourceError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(SourceError::NotConfigured("Apify token is empty".into()));
        }

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| SourceError::Network(e.to_string()))?;

        Ok(Self {
            http,
            token,
            base_url: APIFY_BASE_URL.to_string(),
            comment_limit: COMMENT_FETCH_LIMIT,
        })
    }

    /// Point at another API root (proxies, test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Comments fetched per conversation
    pub fn with_comment_limit(mut self, limit: usize) -> Self {
        self.comment_limit = limit;
        self
    }

    /// Run an actor and return its raw dataset items
    async fn run_actor(&self, actor: &str, input: Value) -> Result<Vec<Value>, SourceError> {
        let url = actor_url(&self.base_url, actor);
        tracing::debug!(actor, "running Apify actor");

        let response = self
            .http
            .post(&url)
            .query(&[("token", self.token.as_str())])
            .json(&input)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SourceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let items: Vec<Value> = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        tracing::debug!(actor, items = items.len(), "Apify actor finished");
        Ok(items)
    }

    async fn search(&self, term: String, limit: usize) -> Result<Vec<ContentItem>, SourceError> {
        let raw = self.run_actor(TWEET_SCRAPER_ACTOR, search_input(&term, limit)).await?;
        Ok(search_results(raw, limit))
    }
}

#[async_trait]
impl DataSource for ApifyDataSource {
    async fn fetch_relationships(
        &self,
        target: &str,
    ) -> Result<Vec<RelationshipRecord>, SourceError> {
        let raw = self.run_actor(USER_SCRAPER_ACTOR, followers_input(target)).await?;
        usable(parse_items::<RelationshipRecord>(raw), target)
    }

    async fn fetch_conversation(
        &self,
        content_id: &str,
        since: Option<NaiveDate>,
    ) -> Result<Vec<ContentItem>, SourceError> {
        self.search(conversation_query(content_id, since), self.comment_limit).await
    }

    async fn fetch_recent_content(
        &self,
        account: &str,
        limit: usize,
    ) -> Result<Vec<ContentItem>, SourceError> {
        self.search(author_query(account), limit).await
    }

    async fn fetch_repost_timeline(
        &self,
        account: &str,
        limit: usize,
    ) -> Result<Vec<ContentItem>, SourceError> {
        self.search(repost_query(account), limit).await
    }
}

/// Valid search hits, at most `limit`
///
/// An empty search yields placeholder items (`{"noResults": true}`) that fail
/// validation; that is an empty result, not an error.
fn search_results(raw: Vec<Value>, limit: usize) -> Vec<ContentItem> {
    let mut items = parse_items::<ContentItem>(raw).items;
    items.truncate(limit);
    items
}

/// A follower payload where every item failed validation is unusable
fn usable<T>(parsed: Parsed<T>, what: &str) -> Result<Vec<T>, SourceError> {
    if parsed.items.is_empty() && parsed.rejected > 0 {
        return Err(SourceError::Parse(format!(
            "all {} items for {} failed validation",
            parsed.rejected, what
        )));
    }
    Ok(parsed.items)
}

fn classify(e: reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout(e.to_string())
    } else {
        SourceError::Network(e.to_string())
    }
}

fn actor_url(base_url: &str, actor: &str) -> String {
    format!("{}/acts/{}/run-sync-get-dataset-items", base_url, actor)
}

fn search_input(term: &str, limit: usize) -> Value {
    json!({
        "searchTerms": [term],
        "maxItems": limit.max(MIN_SEARCH_ITEMS),
        "sort": "Latest",
        "includeSearchTerms": false,
        "onlyVerifiedUsers": false,
        "onlyTwitterBlue": false,
        "onlyImage": false,
        "onlyVideo": false,
        "onlyQuote": false,
    })
}

fn followers_input(target: &str) -> Value {
    json!({
        "twitterHandles": [target.trim().trim_start_matches('@')],
        "getFollowers": true,
        "maxItems": RELATIONSHIP_FETCH_LIMIT,
    })
}
