//! Any-match scans and engagement scoring
//!
//! Scans are order independent and tolerate duplicates.

use crate::core::ident::{normalize_handle, same_handle};
use crate::types::{ContentItem, Interactions, RelationshipRecord};

/// True if `subject` appears in the follower list
pub fn follows_in(subject: &str, records: &[RelationshipRecord]) -> bool {
    let subject = normalize_handle(subject);
    records
        .iter()
        .any(|r| normalize_handle(&r.identifier) == subject)
}

/// True if `subject` authored a reply among `items`
///
/// A non-reply post by the subject in the same conversation does not count.
pub fn commented_in(subject: &str, items: &[ContentItem]) -> bool {
    let subject = normalize_handle(subject);
    items
        .iter()
        .any(|i| i.is_reply && normalize_handle(&i.author.identifier) == subject)
}

/// True if the timeline holds a repost of a post by `target`
pub fn reposted_from(target: &str, timeline: &[ContentItem]) -> bool {
    timeline
        .iter()
        .any(|i| i.is_retweet && i.reposted_author().map_or(false, |a| same_handle(a, target)))
}

/// round(100 * performed / known), over known boolean verdicts only
pub fn score(interactions: &Interactions) -> u8 {
    let known = interactions.known();
    if known.is_empty() {
        return 0;
    }
    let performed = known.iter().filter(|v| **v).count();
    (100.0 * performed as f64 / known.len() as f64).round() as u8
}
