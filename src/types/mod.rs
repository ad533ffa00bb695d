//! Core types for the interaction verifier

mod record;
mod request;
mod outcome;
mod error;
mod cache;

pub use record::{
    RelationshipRecord, AuthorSnapshot, RepostedContent, ContentItem,
    Validate, Parsed, parse_items,
};
pub use request::{RunMode, TimeFilter, VerificationRequest};
pub use outcome::{ActionState, ScoringMode, RelationshipSource, Interactions, InteractionOutcome};
pub use error::VerifyError;
pub use cache::{CacheEntry, FixtureKind, FixtureSnapshot, FixtureReport, FixtureSummary};
