//! Interaction verifier: decides whether a subject account followed a target
//! account and commented on one of its posts, and scores the engagement.
//!
//! Runs against recorded fixtures (replay) or a live data source with a
//! temporal cache for follower lists (live).

pub mod core;
pub mod types;

// =============================================================================
// CACHE
// =============================================================================

/// Default maximum age of a cached follower list (hours)
pub const DEFAULT_MAX_CACHE_AGE_HOURS: f64 = 24.0;

/// Prefix of every follower-list cache key
pub const CACHE_KEY_PREFIX: &str = "followers_";

// =============================================================================
// FETCH LIMITS
// =============================================================================

/// Follower list size requested from the data source
pub const RELATIONSHIP_FETCH_LIMIT: usize = 5000;

/// Comments requested when verifying a single subject
pub const COMMENT_FETCH_LIMIT: usize = 100;

/// Comments recorded when generating fixtures
pub const FIXTURE_COMMENT_LIMIT: usize = 500;

/// Reposts requested from the subject's timeline
pub const REPOST_TIMELINE_LIMIT: usize = 50;

// =============================================================================
// FALLBACK DERIVATION
// =============================================================================

/// Recent posts of the target scanned when the follower list is unavailable
pub const FALLBACK_RECENT_CONTENT_LIMIT: usize = 10;

/// Distinct reply authors taken from each scanned thread
pub const FALLBACK_REPLIES_PER_ITEM: usize = 20;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// On-disk fixture envelope format
pub const FIXTURE_FORMAT_VERSION: u32 = 1;
