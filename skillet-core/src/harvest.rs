//! Harvest orchestration.
//!
//! Composes discovery, extraction, validation, dedup, quality filtering,
//! ranking, and storage into a single run with run-scoped statistics. Each
//! stage absorbs its own failures at the smallest unit that failed (one
//! platform, one candidate, one write); only the aggregate `HarvestRun`
//! record crosses the orchestrator boundary.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, Semaphore};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::HarvestConfig;
use crate::dedup::{Deduplicator, KeptVersion};
use crate::discover::Discovery;
use crate::error::{DiscoveryError, ExtractError, HarvestError};
use crate::extract::RecipeExtractor;
use crate::quality::filter_quality;
use crate::store::RecipeStore;
use crate::types::{DiscoveryQuery, Platform, RawCandidate, Recipe};
use crate::validate::validate_recipe;
use crate::viral::score_and_rank;

/// Lifecycle of a harvest run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Statistics and status for a single harvest run. This record is the only
/// externally visible outcome of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestRun {
    pub run_id: String,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,

    /// Candidates discovered per platform. Platforms whose discovery failed
    /// or was skipped are absent.
    #[serde(default)]
    pub discovered: BTreeMap<Platform, usize>,
    /// Recipes successfully extracted per platform.
    #[serde(default)]
    pub extracted: BTreeMap<Platform, usize>,
    /// Error messages per platform, from discovery and extraction.
    #[serde(default)]
    pub errors: BTreeMap<Platform, Vec<String>>,

    pub total_discovered: usize,
    pub total_extracted: usize,
    pub validation_rejected: usize,
    pub duplicates_found: usize,
    pub quality_passed: usize,
    pub quality_failed: usize,
    pub stored: usize,
}

impl HarvestRun {
    fn new() -> Self {
        let mut run_id = Uuid::new_v4().simple().to_string();
        run_id.truncate(8);
        Self {
            run_id,
            status: RunStatus::Pending,
            started_at: Utc::now(),
            finished_at: None,
            discovered: BTreeMap::new(),
            extracted: BTreeMap::new(),
            errors: BTreeMap::new(),
            total_discovered: 0,
            total_extracted: 0,
            validation_rejected: 0,
            duplicates_found: 0,
            quality_passed: 0,
            quality_failed: 0,
            stored: 0,
        }
    }

    pub fn duration_seconds(&self) -> Option<f64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_milliseconds() as f64 / 1000.0)
    }

    fn record_error(&mut self, platform: Platform, message: String) {
        self.errors.entry(platform).or_default().push(message);
    }
}

/// Master coordinator for multi-platform harvest runs.
///
/// Collaborators are injected at construction; there is no ambient global
/// state. At most one run executes at a time process-wide, enforced by a
/// single-permit semaphore owned by this struct — a second `run_harvest`
/// call while one is active is rejected, not queued.
pub struct HarvestOrchestrator {
    discoverers: Vec<Arc<dyn Discovery>>,
    extractor: Arc<dyn RecipeExtractor>,
    store: Arc<dyn RecipeStore>,
    config: HarvestConfig,
    run_gate: Semaphore,
    last_run: RwLock<Option<HarvestRun>>,
}

impl HarvestOrchestrator {
    pub fn new(
        discoverers: Vec<Arc<dyn Discovery>>,
        extractor: Arc<dyn RecipeExtractor>,
        store: Arc<dyn RecipeStore>,
        config: HarvestConfig,
    ) -> Self {
        Self {
            discoverers,
            extractor,
            store,
            config,
            run_gate: Semaphore::new(1),
            last_run: RwLock::new(None),
        }
    }

    /// The most recent run record, if any run has been started.
    pub async fn last_run(&self) -> Option<HarvestRun> {
        self.last_run.read().await.clone()
    }

    /// Run a full harvest across the selected platforms (all configured
    /// discoverers when `platforms` is `None`).
    ///
    /// Returns the run record in every case except a conflict with an
    /// already-active run. Stage failures never escape: they are folded
    /// into the record's counters and error lists, and an unexpected
    /// pipeline failure yields a record with `status == Failed` carrying
    /// whatever counts had accumulated.
    pub async fn run_harvest(
        &self,
        platforms: Option<&[Platform]>,
        limit_per_platform: usize,
    ) -> Result<HarvestRun, HarvestError> {
        let _permit = self
            .run_gate
            .try_acquire()
            .map_err(|_| HarvestError::RunInProgress)?;

        let mut run = HarvestRun::new();
        run.status = RunStatus::Running;
        run.started_at = Utc::now();
        *self.last_run.write().await = Some(run.clone());

        info!(run_id = %run.run_id, "harvest run starting");

        let outcome = self
            .run_pipeline(&mut run, platforms, limit_per_platform)
            .await;

        run.finished_at = Some(Utc::now());
        run.status = match outcome {
            Ok(()) => RunStatus::Completed,
            Err(message) => {
                error!(run_id = %run.run_id, error = %message, "harvest run failed");
                RunStatus::Failed
            }
        };

        info!(
            run_id = %run.run_id,
            status = ?run.status,
            duration_secs = run.duration_seconds(),
            discovered = run.total_discovered,
            extracted = run.total_extracted,
            rejected = run.validation_rejected,
            duplicates = run.duplicates_found,
            stored = run.stored,
            "harvest run finished"
        );

        *self.last_run.write().await = Some(run.clone());
        Ok(run)
    }

    /// The staged pipeline. Stage-internal failures are absorbed into the
    /// run record; an `Err` here means something genuinely unanticipated
    /// and marks the whole run failed.
    async fn run_pipeline(
        &self,
        run: &mut HarvestRun,
        platforms: Option<&[Platform]>,
        limit_per_platform: usize,
    ) -> Result<(), String> {
        let selected: Vec<Arc<dyn Discovery>> = self
            .discoverers
            .iter()
            .filter(|d| platforms.map_or(true, |wanted| wanted.contains(&d.platform())))
            .cloned()
            .collect();

        let candidates = self.discover_all(run, &selected, limit_per_platform).await;
        run.total_discovered = run.discovered.values().sum();
        info!(
            run_id = %run.run_id,
            count = run.total_discovered,
            "discovery complete"
        );

        let recipes = self.extract_all(run, candidates).await;
        run.total_extracted = recipes.len();
        info!(
            run_id = %run.run_id,
            count = run.total_extracted,
            extractor = self.extractor.name(),
            "extraction complete"
        );

        let admitted = self.validate_all(run, recipes);

        let deduped = self.deduplicate(run, admitted).await;

        let (passed, failed) = filter_quality(deduped, self.config.min_quality_score);
        run.quality_passed = passed.len();
        run.quality_failed = failed.len();

        let ranked = score_and_rank(passed);

        self.store_all(run, &ranked).await;
        Ok(())
    }

    /// Launch one discovery task per configured platform and merge the
    /// results after all of them settle. A platform that fails (or whose
    /// task panics) is recorded and excluded; it does not fail the run.
    async fn discover_all(
        &self,
        run: &mut HarvestRun,
        discoverers: &[Arc<dyn Discovery>],
        limit_per_platform: usize,
    ) -> Vec<RawCandidate> {
        let mut handles = Vec::new();
        for discoverer in discoverers {
            let platform = discoverer.platform();
            if !discoverer.is_configured() {
                debug!(platform = %platform, "platform not configured, skipping");
                continue;
            }

            let discoverer = Arc::clone(discoverer);
            let deadline = self.config.discovery_timeout;
            let query = DiscoveryQuery::with_limit(limit_per_platform);
            handles.push((
                platform,
                tokio::spawn(async move {
                    match timeout(deadline, discoverer.discover(&query)).await {
                        Ok(result) => result,
                        Err(_) => Err(DiscoveryError::Timeout(deadline)),
                    }
                }),
            ));
        }

        let mut all = Vec::new();
        for (platform, handle) in handles {
            match handle.await {
                Ok(Ok(candidates)) => {
                    run.discovered.insert(platform, candidates.len());
                    all.extend(candidates);
                }
                Ok(Err(e)) => {
                    warn!(platform = %platform, error = %e, "discovery failed");
                    run.record_error(platform, e.to_string());
                }
                Err(join_error) => {
                    let e = DiscoveryError::TaskPanicked(join_error.to_string());
                    warn!(platform = %platform, error = %e, "discovery task died");
                    run.record_error(platform, e.to_string());
                }
            }
        }
        all
    }

    /// Extract candidates in small concurrent batches. A per-item failure
    /// is recorded against its platform and the item dropped; the rest of
    /// the batch is unaffected.
    async fn extract_all(
        &self,
        run: &mut HarvestRun,
        candidates: Vec<RawCandidate>,
    ) -> Vec<Recipe> {
        let batch_size = self.config.extract_batch_size.max(1);
        let mut recipes = Vec::new();

        for batch in candidates.chunks(batch_size) {
            let mut handles = Vec::new();
            for candidate in batch {
                let candidate = candidate.clone();
                let extractor = Arc::clone(&self.extractor);
                let deadline = self.config.extract_timeout;
                handles.push((
                    candidate.platform,
                    tokio::spawn(async move {
                        match timeout(deadline, extractor.extract(&candidate)).await {
                            Ok(result) => result,
                            Err(_) => Err(ExtractError::Timeout(deadline)),
                        }
                    }),
                ));
            }

            for (platform, handle) in handles {
                match handle.await {
                    Ok(Ok(Some(recipe))) => {
                        *run.extracted.entry(platform).or_default() += 1;
                        recipes.push(recipe);
                    }
                    Ok(Ok(None)) => {
                        debug!(platform = %platform, "candidate is not a recipe");
                    }
                    Ok(Err(e)) => {
                        warn!(platform = %platform, error = %e, "extraction failed");
                        run.record_error(platform, e.to_string());
                    }
                    Err(join_error) => {
                        let e = ExtractError::TaskPanicked(join_error.to_string());
                        warn!(platform = %platform, error = %e, "extraction task died");
                        run.record_error(platform, e.to_string());
                    }
                }
            }
        }
        recipes
    }

    /// Hard admission gate. Rejections are terminal and logged with their
    /// structured reason for offline audit.
    fn validate_all(&self, run: &mut HarvestRun, recipes: Vec<Recipe>) -> Vec<Recipe> {
        let mut admitted = Vec::new();
        for recipe in recipes {
            let result = validate_recipe(&recipe);
            match result.reason {
                None => admitted.push(recipe),
                Some(reason) => {
                    run.validation_rejected += 1;
                    info!(
                        run_id = %run.run_id,
                        title = %recipe.title,
                        url = %recipe.source_url,
                        reason = %reason,
                        "recipe rejected by validation gate"
                    );
                }
            }
        }
        admitted
    }

    /// Batch dedup in arrival order, then a corpus pass against recently
    /// stored recipes. If the corpus window cannot be read the run degrades
    /// to batch-only results instead of aborting.
    async fn deduplicate(&self, run: &mut HarvestRun, recipes: Vec<Recipe>) -> Vec<Recipe> {
        let mut deduplicator = Deduplicator::new(self.config.dedup.clone());
        let batch = deduplicator.deduplicate_batch(recipes);

        let survivors = match self.store.list_recent(self.config.corpus_window).await {
            Ok(existing) => {
                let mut kept = Vec::new();
                for recipe in batch {
                    let decision = deduplicator.check(&recipe, &existing);
                    // A more complete new version survives to upsert over
                    // the stored copy.
                    if !decision.is_duplicate || decision.kept == Some(KeptVersion::New) {
                        kept.push(recipe);
                    }
                }
                kept
            }
            Err(e) => {
                warn!(
                    run_id = %run.run_id,
                    error = %e,
                    "corpus dedup unavailable, using batch-only results"
                );
                batch
            }
        };

        run.duplicates_found = deduplicator.log().duplicates_found;
        survivors
    }

    /// Persist each survivor via upsert; a failed write is logged and
    /// skipped, the rest still attempt storage.
    async fn store_all(&self, run: &mut HarvestRun, recipes: &[Recipe]) {
        for recipe in recipes {
            match self.store.upsert(recipe).await {
                Ok(id) => {
                    debug!(id = %id, title = %recipe.title, "recipe stored");
                    run.stored += 1;
                }
                Err(e) => {
                    warn!(
                        title = %recipe.title,
                        url = %recipe.source_url,
                        error = %e,
                        "failed to store recipe, skipping"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_ids_are_short_and_unique() {
        let a = HarvestRun::new();
        let b = HarvestRun::new();
        assert_eq!(a.run_id.len(), 8);
        assert_ne!(a.run_id, b.run_id);
    }

    #[test]
    fn test_duration_requires_finish() {
        let mut run = HarvestRun::new();
        assert!(run.duration_seconds().is_none());
        run.finished_at = Some(run.started_at + chrono::Duration::milliseconds(1500));
        assert_eq!(run.duration_seconds(), Some(1.5));
    }

    #[test]
    fn test_run_record_serializes_with_platform_keys() {
        let mut run = HarvestRun::new();
        run.discovered.insert(Platform::Youtube, 12);
        run.record_error(Platform::Tiktok, "rate limited".to_string());
        let json = serde_json::to_value(&run).unwrap();
        assert_eq!(json["discovered"]["youtube"], 12);
        assert_eq!(json["errors"]["tiktok"][0], "rate limited");
    }
}
