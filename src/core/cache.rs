//! Temporal cache for follower lists
//!
//! Entries are fully replaced on every write and never deleted; staleness is
//! judged from `retrieved_at` at read time. There is no locking: two requests
//! that miss on the same key both fetch, and the last write wins.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};

use crate::types::{CacheEntry, RelationshipRecord, VerifyError};

// =============================================================================
// CLOCK
// =============================================================================

/// Source of "now" for age computations
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for simulating elapsed time
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: RwLock::new(start) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.write() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.now.write() {
            *guard += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.read().map(|g| *g).unwrap_or_else(|e| *e.into_inner())
    }
}

// =============================================================================
// STORAGE BACKENDS
// =============================================================================

/// Storage backend for cache entries
pub trait CacheStore: Send + Sync {
    /// `Ok(None)` when the key was never written
    fn load(&self, key: &str) -> Result<Option<CacheEntry>, VerifyError>;

    /// Replace the entry for `key`
    fn store(&self, key: &str, entry: &CacheEntry) -> Result<(), VerifyError>;
}

/// One JSON file per key under a directory
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    dir: PathBuf,
}

impl FileCacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file))
    }
}

impl CacheStore for FileCacheStore {
    fn load(&self, key: &str) -> Result<Option<CacheEntry>, VerifyError> {
        let path = self.path_for(key);
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(VerifyError::Persistence(format!(
                    "cannot open {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        serde_json::from_reader(BufReader::new(file))
            .map(Some)
            .map_err(|e| {
                VerifyError::Persistence(format!("corrupt cache file {}: {}", path.display(), e))
            })
    }

    fn store(&self, key: &str, entry: &CacheEntry) -> Result<(), VerifyError> {
        let path = self.path_for(key);
        let fail = |e: &dyn std::fmt::Display| {
            VerifyError::Persistence(format!("cannot write {}: {}", path.display(), e))
        };

        fs::create_dir_all(&self.dir).map_err(|e| fail(&e))?;
        let file = File::create(&path).map_err(|e| fail(&e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, entry).map_err(|e| fail(&e))?;
        writer.flush().map_err(|e| fail(&e))?;
        Ok(())
    }
}

/// In-process backend
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCacheStore {
    fn load(&self, key: &str) -> Result<Option<CacheEntry>, VerifyError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| VerifyError::Persistence("cache lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn store(&self, key: &str, entry: &CacheEntry) -> Result<(), VerifyError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| VerifyError::Persistence("cache lock poisoned".into()))?;
        entries.insert(key.to_string(), entry.clone());
        Ok(())
    }
}

// =============================================================================
// TEMPORAL CACHE
// =============================================================================

/// TTL-gated view over a cache store
#[derive(Clone)]
pub struct TemporalCache {
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TemporalCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemporalCache").finish_non_exhaustive()
    }
}

impl TemporalCache {
    pub fn new(store: Arc<dyn CacheStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Cache on the wall clock
    pub fn with_store(store: Arc<dyn CacheStore>) -> Self {
        Self::new(store, Arc::new(SystemClock))
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Look up an entry regardless of age
    ///
    /// Unreadable entries count as a miss.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        match self.store.load(key) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key, error = %e, "cache entry unreadable, treating as miss");
                None
            }
        }
    }

    /// Replace the entry for `key`, stamping both timestamps with now
    ///
    /// On error the returned entry is lost; callers keep using `records`.
    pub fn put(
        &self,
        key: &str,
        records: Vec<RelationshipRecord>,
    ) -> Result<CacheEntry, VerifyError> {
        let entry = CacheEntry::new(records, self.clock.now());
        self.store.store(key, &entry)?;
        tracing::debug!(key, records = entry.records.len(), "cache entry written");
        Ok(entry)
    }

    /// Hours elapsed since the entry was fetched
    pub fn age_hours(&self, entry: &CacheEntry) -> f64 {
        let elapsed = self.clock.now() - entry.retrieved_at;
        elapsed.num_milliseconds() as f64 / 3_600_000.0
    }

    /// True iff the entry is strictly younger than `max_age_hours`
    pub fn is_valid(&self, entry: &CacheEntry, max_age_hours: f64) -> bool {
        self.age_hours(entry) < max_age_hours
    }
}
