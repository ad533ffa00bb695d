//! Core modules for the interaction verifier

pub mod ident;
pub mod cache;
pub mod fixtures;
pub mod source;
pub mod scan;
pub mod fallback;
pub mod engine;
pub mod apify;
pub mod api;

pub use ident::{cache_key, extract_content_id, normalize_handle, same_handle};
pub use cache::{
    CacheStore, Clock, FileCacheStore, ManualClock, MemoryCacheStore, SystemClock, TemporalCache,
};
pub use fixtures::{load_records, FileFixtureStore, FixtureStore, MemoryFixtureStore};
pub use source::{DataSource, SourceError};
pub use scan::{commented_in, follows_in, reposted_from, score};
pub use fallback::{FallbackOutcome, FallbackSelector};
pub use engine::{FixtureSample, VerificationEngine};
pub use apify::ApifyDataSource;
pub use api::{create_router, run_server};
