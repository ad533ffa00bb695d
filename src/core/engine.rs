//! Verification engine
//!
//! Per request: ModeSelect -> {Replay | Live} -> ScoreCompute -> Done.
//!
//! - Replay reads the three fixtures and scans them. No cache, no network.
//! - Live answers `follows` from the temporal cache, refetching on miss or
//!   staleness and deriving an approximate list when the fetch fails.
//!   `commented` always goes to the data source, narrowed to the day of
//!   `check_since` when one is given. `follows` is never narrowed.
//!
//! Any fatal error aborts the request; no partial outcome is returned.

use std::sync::Arc;

use futures_util::future::try_join3;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::cache::TemporalCache;
use crate::core::fallback::FallbackSelector;
use crate::core::fixtures::{load_records, FixtureStore};
use crate::core::ident::{cache_key, extract_content_id, normalize_handle};
use crate::core::scan::{commented_in, follows_in, reposted_from, score};
use crate::core::source::{DataSource, SourceError};
use crate::types::{
    ContentItem, FixtureKind, FixtureReport, FixtureSnapshot, FixtureSummary, InteractionOutcome,
    Interactions, RelationshipRecord, RelationshipSource, RunMode, ScoringMode, TimeFilter,
    VerificationRequest, VerifyError,
};
use crate::{FIXTURE_FORMAT_VERSION, REPOST_TIMELINE_LIMIT};

/// Accounts and post recorded by fixture generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureSample {
    pub subject: String,
    pub content_url: String,
    pub target_account: String,
}

/// Request after input validation
#[derive(Debug, Clone)]
struct Validated {
    subject: String,
    target: String,
    content_id: String,
    filter: TimeFilter,
}

/// Answer to the `follows` question and where it came from
#[derive(Debug, Clone)]
struct RelationshipCheck {
    follows: bool,
    source: RelationshipSource,
    warnings: Vec<String>,
}

/// Facts gathered by either path, before scoring
#[derive(Debug, Clone)]
struct Evidence {
    interactions: Interactions,
    relationship_source: RelationshipSource,
    warnings: Vec<String>,
}

/// Orchestrates fixtures, cache, data source and fallback
pub struct VerificationEngine {
    source: Option<Arc<dyn DataSource>>,
    cache: TemporalCache,
    fixtures: Arc<dyn FixtureStore>,
    fallback: FallbackSelector,
    scoring: ScoringMode,
    sample: Option<FixtureSample>,
}

impl std::fmt::Debug for VerificationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationEngine")
            .field("has_source", &self.source.is_some())
            .field("scoring", &self.scoring)
            .field("sample", &self.sample)
            .finish_non_exhaustive()
    }
}

impl VerificationEngine {
    /// Engine without a data source (replay only)
    pub fn new(cache: TemporalCache, fixtures: Arc<dyn FixtureStore>) -> Self {
        Self {
            source: None,
            cache,
            fixtures,
            fallback: FallbackSelector::default(),
            scoring: ScoringMode::default(),
            sample: None,
        }
    }

    pub fn with_source(mut self, source: Arc<dyn DataSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_scoring(mut self, scoring: ScoringMode) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackSelector) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_fixture_sample(mut self, sample: FixtureSample) -> Self {
        self.sample = Some(sample);
        self
    }

    pub fn scoring(&self) -> ScoringMode {
        self.scoring
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    // =========================================================================
    // VERIFY
    // =========================================================================

    /// Verify one subject against one post and target account
    pub async fn verify(
        &self,
        request: &VerificationRequest,
        mode: RunMode,
    ) -> Result<InteractionOutcome, VerifyError> {
        let validated = validate(request)?;

        tracing::info!(
            subject = %validated.subject,
            target = %validated.target,
            content_id = %validated.content_id,
            %mode,
            check_since = ?validated.filter.check_since,
            "verifying interactions"
        );

        let evidence = match mode {
            RunMode::Replay => self.replay_path(&validated)?,
            RunMode::Live => self.live_path(&validated).await?,
        };

        let engagement = score(&evidence.interactions);
        let cache_used = evidence.relationship_source == RelationshipSource::Cache;

        tracing::info!(
            subject = %validated.subject,
            follows = evidence.interactions.follows,
            commented = evidence.interactions.commented,
            retweeted = ?evidence.interactions.retweeted,
            score = engagement,
            source = ?evidence.relationship_source,
            "verification complete"
        );

        Ok(InteractionOutcome {
            subject: request.subject.clone(),
            content_url: request.content_url.clone(),
            content_id: validated.content_id,
            target_account: request.target_account.clone(),
            interactions: evidence.interactions,
            score: engagement,
            mode,
            scoring: self.scoring,
            cache_used,
            relationship_source: evidence.relationship_source,
            // replay applies no time filter
            check_since: match mode {
                RunMode::Live => validated.filter.check_since,
                RunMode::Replay => None,
            },
            checked_at: self.cache.now(),
            warnings: evidence.warnings,
        })
    }

    /// Scan recorded fixtures
    fn replay_path(&self, req: &Validated) -> Result<Evidence, VerifyError> {
        let store = self.fixtures.as_ref();
        let followers: Vec<RelationshipRecord> = load_records(store, FixtureKind::Relationships)?;
        let timeline: Vec<ContentItem> = load_records(store, FixtureKind::Timeline)?;
        let comments: Vec<ContentItem> = load_records(store, FixtureKind::Comments)?;

        let retweeted = self
            .scoring
            .includes_retweet()
            .then(|| reposted_from(&req.target, &timeline));

        Ok(Evidence {
            interactions: Interactions::new(
                follows_in(&req.subject, &followers),
                commented_in(&req.subject, &comments),
                retweeted,
            ),
            relationship_source: RelationshipSource::Fixture,
            warnings: Vec::new(),
        })
    }

    /// Query cache and data source; follows and comments run concurrently
    async fn live_path(&self, req: &Validated) -> Result<Evidence, VerifyError> {
        let source = self.require_source()?;
        let since = req.filter.check_since.map(|t| t.date_naive());

        let follows = self.check_follows(source, req);

        let comments = async {
            source
                .fetch_conversation(&req.content_id, since)
                .await
                .map_err(|e| VerifyError::Upstream(format!("comment retrieval failed: {}", e)))
        };

        let reposts = async {
            if !self.scoring.includes_retweet() {
                return Ok(None);
            }
            source
                .fetch_repost_timeline(&req.subject, REPOST_TIMELINE_LIMIT)
                .await
                .map(Some)
                .map_err(|e| {
                    VerifyError::Upstream(format!("repost timeline retrieval failed: {}", e))
                })
        };

        let (relationship, comments, reposts) = try_join3(follows, comments, reposts).await?;

        Ok(Evidence {
            interactions: Interactions::new(
                relationship.follows,
                commented_in(&req.subject, &comments),
                reposts.map(|timeline| reposted_from(&req.target, &timeline)),
            ),
            relationship_source: relationship.source,
            warnings: relationship.warnings,
        })
    }

    /// Cache first, then primary fetch, then fallback derivation
    async fn check_follows(
        &self,
        source: &dyn DataSource,
        req: &Validated,
    ) -> Result<RelationshipCheck, VerifyError> {
        let key = cache_key(&req.target);
        let max_age = req.filter.max_cache_age_hours;

        match self.cache.get(&key) {
            Some(entry) if self.cache.is_valid(&entry, max_age) => {
                tracing::info!(
                    key = %key,
                    age_hours = self.cache.age_hours(&entry),
                    records = entry.records.len(),
                    "using cached follower list"
                );
                return Ok(RelationshipCheck {
                    follows: follows_in(&req.subject, &entry.records),
                    source: RelationshipSource::Cache,
                    warnings: Vec::new(),
                });
            }
            Some(entry) => {
                tracing::info!(
                    key = %key,
                    age_hours = self.cache.age_hours(&entry),
                    max_age_hours = max_age,
                    "cached follower list is stale, refetching"
                );
            }
            None => tracing::info!(key = %key, "no cached follower list, fetching"),
        }

        match source.fetch_relationships(&req.target).await {
            Ok(records) => {
                let follows = follows_in(&req.subject, &records);
                let mut warnings = Vec::new();
                if let Err(e) = self.cache.put(&key, records) {
                    tracing::warn!(key = %key, error = %e, "follower list fetched but not cached");
                    warnings.push(e.to_string());
                }
                Ok(RelationshipCheck {
                    follows,
                    source: RelationshipSource::Live,
                    warnings,
                })
            }
            Err(primary) => self.fall_back(source, req, primary).await,
        }
    }

    async fn fall_back(
        &self,
        source: &dyn DataSource,
        req: &Validated,
        primary: SourceError,
    ) -> Result<RelationshipCheck, VerifyError> {
        tracing::warn!(
            target = %req.target,
            error = %primary,
            "follower list unavailable, deriving from reply authors"
        );

        let derived = self.fallback.derive(source, &req.target).await.map_err(|e| {
            VerifyError::Upstream(format!("follower list unavailable ({}); {}", primary, e))
        })?;

        let mut warnings = vec![format!("follower list approximated from replies: {}", primary)];
        if derived.items_failed > 0 {
            warnings.push(format!(
                "{} of {} threads unavailable during approximation",
                derived.items_failed, derived.items_scanned
            ));
        }

        Ok(RelationshipCheck {
            follows: follows_in(&req.subject, &derived.records),
            source: RelationshipSource::Fallback,
            warnings,
        })
    }

    fn require_source(&self) -> Result<&dyn DataSource, VerifyError> {
        self.source.as_deref().ok_or_else(|| {
            VerifyError::Upstream("live mode requires a configured data source".into())
        })
    }

    // =========================================================================
    // FIXTURE GENERATION
    // =========================================================================

    /// Record the configured sample from the live source into the fixture store
    pub async fn generate_fixtures(&self, mode: RunMode) -> Result<FixtureReport, VerifyError> {
        if mode != RunMode::Live {
            return Err(VerifyError::Input(
                "fixture generation records live data and must run in live mode".into(),
            ));
        }
        let sample = self
            .sample
            .as_ref()
            .ok_or_else(|| VerifyError::Input("no fixture sample configured".into()))?;
        let source = self.require_source()?;
        let content_id = extract_content_id(&sample.content_url)?;

        tracing::info!(
            subject = %sample.subject,
            target = %sample.target_account,
            content_id = %content_id,
            "generating fixtures"
        );

        let followers = source.fetch_relationships(&sample.target_account).await?;
        let timeline = source
            .fetch_repost_timeline(&sample.subject, REPOST_TIMELINE_LIMIT)
            .await?;
        let comments = source.fetch_conversation(&content_id, None).await?;

        let generated_at = self.cache.now();
        let mut fixtures = Vec::new();
        for (kind, items) in [
            (FixtureKind::Relationships, to_values(&followers)?),
            (FixtureKind::Timeline, to_values(&timeline)?),
            (FixtureKind::Comments, to_values(&comments)?),
        ] {
            let count = items.len();
            self.fixtures.save(&FixtureSnapshot {
                kind,
                version: FIXTURE_FORMAT_VERSION,
                generated_at,
                items,
            })?;
            fixtures.push(FixtureSummary {
                kind,
                name: kind.file_name().to_string(),
                items: count,
            });
        }

        Ok(FixtureReport {
            generated_at,
            fixtures,
        })
    }
}

fn to_values<T: Serialize>(items: &[T]) -> Result<Vec<Value>, VerifyError> {
    items
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<_, _>>()
        .map_err(|e| VerifyError::Persistence(format!("cannot serialize fixture items: {}", e)))
}

/// Reject requests the engine cannot answer
fn validate(request: &VerificationRequest) -> Result<Validated, VerifyError> {
    let subject = normalize_handle(&request.subject);
    if subject.is_empty() {
        return Err(VerifyError::Input("subject is required".into()));
    }
    let target = normalize_handle(&request.target_account);
    if target.is_empty() {
        return Err(VerifyError::Input("target_account is required".into()));
    }
    if request.content_url.trim().is_empty() {
        return Err(VerifyError::Input("content_url is required".into()));
    }
    let content_id = extract_content_id(&request.content_url)?;

    let filter = request.filter();
    if !filter.max_cache_age_hours.is_finite() || filter.max_cache_age_hours < 0.0 {
        return Err(VerifyError::Input(format!(
            "max_cache_age_hours must be a non-negative number, got {}",
            filter.max_cache_age_hours
        )));
    }

    Ok(Validated {
        subject,
        target,
        content_id,
        filter,
    })
}
