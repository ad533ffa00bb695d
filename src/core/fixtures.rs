//! Fixture store: named snapshots of retrieved data for replay mode
//!
//! Each fixture kind is stored independently and never expires. Files hold a
//! versioned envelope; a bare JSON array is accepted on load as well.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::types::{parse_items, FixtureKind, FixtureSnapshot, Validate, VerifyError};

/// Storage for replay fixtures
pub trait FixtureStore: Send + Sync {
    /// Load a fixture; `VerifyError::NotFound` when it was never generated
    fn load(&self, kind: FixtureKind) -> Result<FixtureSnapshot, VerifyError>;

    /// Replace a fixture
    fn save(&self, snapshot: &FixtureSnapshot) -> Result<(), VerifyError>;
}

/// Load a fixture and validate its items
pub fn load_records<T>(store: &dyn FixtureStore, kind: FixtureKind) -> Result<Vec<T>, VerifyError>
where
    T: DeserializeOwned + Validate,
{
    let snapshot = store.load(kind)?;
    let parsed = parse_items::<T>(snapshot.items);
    if parsed.rejected > 0 {
        tracing::debug!(
            fixture = %kind,
            rejected = parsed.rejected,
            "fixture items failed validation"
        );
    }
    Ok(parsed.items)
}

fn missing(kind: FixtureKind) -> VerifyError {
    VerifyError::NotFound(format!(
        "fixture {} is not available; run fixture generation first",
        kind.file_name()
    ))
}

/// Either the envelope or a bare item array
#[derive(Deserialize)]
#[serde(untagged)]
enum FixtureFile {
    Envelope(FixtureSnapshot),
    Bare(Vec<Value>),
}

/// Fixtures as JSON files under a directory
#[derive(Debug, Clone)]
pub struct FileFixtureStore {
    dir: PathBuf,
}

impl FileFixtureStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, kind: FixtureKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }
}

impl FixtureStore for FileFixtureStore {
    fn load(&self, kind: FixtureKind) -> Result<FixtureSnapshot, VerifyError> {
        let path = self.path_for(kind);
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(missing(kind)),
            Err(e) => {
                return Err(VerifyError::NotFound(format!(
                    "fixture {} is unreadable ({}); run fixture generation first",
                    path.display(),
                    e
                )))
            }
        };

        let parsed: FixtureFile = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            VerifyError::NotFound(format!(
                "fixture {} is corrupt ({}); run fixture generation first",
                path.display(),
                e
            ))
        })?;

        match parsed {
            FixtureFile::Envelope(snapshot) => {
                if snapshot.kind != kind {
                    return Err(VerifyError::NotFound(format!(
                        "fixture {} holds {:?} data; run fixture generation first",
                        path.display(),
                        snapshot.kind
                    )));
                }
                Ok(snapshot)
            }
            FixtureFile::Bare(items) => {
                let generated_at = fs::metadata(&path)
                    .and_then(|m| m.modified())
                    .map(chrono::DateTime::<chrono::Utc>::from)
                    .unwrap_or_default();
                Ok(FixtureSnapshot {
                    kind,
                    version: 0,
                    generated_at,
                    items,
                })
            }
        }
    }

    fn save(&self, snapshot: &FixtureSnapshot) -> Result<(), VerifyError> {
        let path = self.path_for(snapshot.kind);
        let fail = |e: &dyn std::fmt::Display| {
            VerifyError::Persistence(format!("cannot write fixture {}: {}", path.display(), e))
        };

        fs::create_dir_all(&self.dir).map_err(|e| fail(&e))?;
        let file = File::create(&path).map_err(|e| fail(&e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, snapshot).map_err(|e| fail(&e))?;
        writer.flush().map_err(|e| fail(&e))?;

        tracing::info!(fixture = %snapshot.kind, items = snapshot.items.len(), "fixture saved");
        Ok(())
    }
}

/// In-process fixtures
#[derive(Debug, Default)]
pub struct MemoryFixtureStore {
    fixtures: RwLock<HashMap<FixtureKind, FixtureSnapshot>>,
}

impl MemoryFixtureStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FixtureStore for MemoryFixtureStore {
    fn load(&self, kind: FixtureKind) -> Result<FixtureSnapshot, VerifyError> {
        let fixtures = self
            .fixtures
            .read()
            .map_err(|_| VerifyError::NotFound("fixture lock poisoned".into()))?;
        fixtures.get(&kind).cloned().ok_or_else(|| missing(kind))
    }

    fn save(&self, snapshot: &FixtureSnapshot) -> Result<(), VerifyError> {
        let mut fixtures = self
            .fixtures
            .write()
            .map_err(|_| VerifyError::Persistence("fixture lock poisoned".into()))?;
        fixtures.insert(snapshot.kind, snapshot.clone());
        Ok(())
    }
}
