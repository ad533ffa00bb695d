//! Fallback derivation of a follower list
//!
//! When the primary follower fetch fails, approximate the list from the
//! accounts that replied to the target's recent posts. This is evidence of
//! interaction, not proof of a follow.

use std::collections::HashSet;

use crate::core::ident::normalize_handle;
use crate::core::source::DataSource;
use crate::types::{RelationshipRecord, VerifyError};
use crate::{FALLBACK_RECENT_CONTENT_LIMIT, FALLBACK_REPLIES_PER_ITEM};

/// Approximate follower list and how it was obtained
#[derive(Debug, Clone)]
pub struct FallbackOutcome {
    pub records: Vec<RelationshipRecord>,
    /// Recent posts whose threads were fetched
    pub items_scanned: usize,
    /// Threads that could not be fetched
    pub items_failed: usize,
}

/// Derives follower lists from reply authors
#[derive(Debug, Clone)]
pub struct FallbackSelector {
    recent_limit: usize,
    replies_per_item: usize,
}

impl Default for FallbackSelector {
    fn default() -> Self {
        Self::new(FALLBACK_RECENT_CONTENT_LIMIT, FALLBACK_REPLIES_PER_ITEM)
    }
}

impl FallbackSelector {
    pub fn new(recent_limit: usize, replies_per_item: usize) -> Self {
        Self {
            recent_limit,
            replies_per_item,
        }
    }

    /// Union of distinct reply authors across the target's recent posts
    ///
    /// Thread failures are skipped. Fails when the recent posts cannot be
    /// fetched, or when every thread fetch failed.
    pub async fn derive(
        &self,
        source: &dyn DataSource,
        target: &str,
    ) -> Result<FallbackOutcome, VerifyError> {
        let recent = source
            .fetch_recent_content(target, self.recent_limit)
            .await
            .map_err(|e| {
                VerifyError::Upstream(format!("fallback could not list recent posts: {}", e))
            })?;

        let target_norm = normalize_handle(target);
        let mut seen: HashSet<String> = HashSet::new();
        let mut records = Vec::new();
        let mut items_failed = 0;
        let mut last_error = None;

        for item in recent.iter().take(self.recent_limit) {
            let thread = match source.fetch_conversation(&item.id, None).await {
                Ok(thread) => thread,
                Err(e) => {
                    tracing::warn!(
                        content_id = %item.id,
                        error = %e,
                        "fallback thread unavailable, skipping"
                    );
                    items_failed += 1;
                    last_error = Some(e);
                    continue;
                }
            };

            let mut thread_authors: HashSet<String> = HashSet::new();
            for reply in thread.iter().filter(|c| c.is_reply) {
                if thread_authors.len() >= self.replies_per_item {
                    break;
                }
                let author = normalize_handle(&reply.author.identifier);
                if author.is_empty() || author == target_norm {
                    continue;
                }
                thread_authors.insert(author.clone());
                if seen.insert(author) {
                    records.push(RelationshipRecord::from(&reply.author));
                }
            }
        }

        let items_scanned = recent.len().min(self.recent_limit);
        if items_scanned > 0 && items_failed == items_scanned {
            let detail = last_error.map(|e| e.to_string()).unwrap_or_default();
            return Err(VerifyError::Upstream(format!(
                "fallback could not fetch any of {} threads: {}",
                items_scanned, detail
            )));
        }

        tracing::info!(
            target = %target,
            items_scanned,
            items_failed,
            derived = records.len(),
            "derived approximate follower list"
        );

        Ok(FallbackOutcome {
            records,
            items_scanned,
            items_failed,
        })
    }
}
