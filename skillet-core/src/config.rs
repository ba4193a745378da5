//! Harvest configuration from defaults and environment variables.

use std::env;
use std::time::Duration;

use crate::dedup::DedupConfig;

/// Default minimum quality score a recipe must reach to be stored.
pub const DEFAULT_MIN_QUALITY_SCORE: f64 = 0.4;

/// Default number of candidates requested per platform.
pub const DEFAULT_LIMIT_PER_PLATFORM: usize = 50;

/// Default number of concurrent extraction calls per batch. Kept small to
/// respect external rate and cost limits.
pub const DEFAULT_EXTRACT_BATCH_SIZE: usize = 5;

/// Default number of recently stored recipes checked during corpus dedup.
pub const DEFAULT_CORPUS_WINDOW: usize = 500;

/// Default per-platform discovery deadline (metadata-sized lookups).
pub const DEFAULT_DISCOVERY_TIMEOUT_SECS: u64 = 30;

/// Default per-candidate extraction deadline (bulk caption/transcript text
/// plus a model round trip).
pub const DEFAULT_EXTRACT_TIMEOUT_SECS: u64 = 90;

/// Tunables for a harvest run.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Recipes scoring below this are dropped at the quality stage.
    pub min_quality_score: f64,
    /// Candidates requested from each platform per run.
    pub limit_per_platform: usize,
    /// Concurrent extraction calls per batch.
    pub extract_batch_size: usize,
    /// Recent stored recipes checked during corpus dedup.
    pub corpus_window: usize,
    /// Deadline for one platform's discovery call.
    pub discovery_timeout: Duration,
    /// Deadline for one candidate's extraction call.
    pub extract_timeout: Duration,
    /// Duplicate-detection thresholds.
    pub dedup: DedupConfig,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            min_quality_score: DEFAULT_MIN_QUALITY_SCORE,
            limit_per_platform: DEFAULT_LIMIT_PER_PLATFORM,
            extract_batch_size: DEFAULT_EXTRACT_BATCH_SIZE,
            corpus_window: DEFAULT_CORPUS_WINDOW,
            discovery_timeout: Duration::from_secs(DEFAULT_DISCOVERY_TIMEOUT_SECS),
            extract_timeout: Duration::from_secs(DEFAULT_EXTRACT_TIMEOUT_SECS),
            dedup: DedupConfig::default(),
        }
    }
}

impl HarvestConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    ///
    /// - `SKILLET_MIN_QUALITY_SCORE`
    /// - `SKILLET_LIMIT_PER_PLATFORM`
    /// - `SKILLET_EXTRACT_BATCH_SIZE`
    /// - `SKILLET_CORPUS_WINDOW`
    /// - `SKILLET_DISCOVERY_TIMEOUT_SECS`
    /// - `SKILLET_EXTRACT_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            min_quality_score: env_parse("SKILLET_MIN_QUALITY_SCORE")
                .unwrap_or(defaults.min_quality_score),
            limit_per_platform: env_parse("SKILLET_LIMIT_PER_PLATFORM")
                .unwrap_or(defaults.limit_per_platform),
            extract_batch_size: env_parse("SKILLET_EXTRACT_BATCH_SIZE")
                .unwrap_or(defaults.extract_batch_size),
            corpus_window: env_parse("SKILLET_CORPUS_WINDOW").unwrap_or(defaults.corpus_window),
            discovery_timeout: env_parse("SKILLET_DISCOVERY_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.discovery_timeout),
            extract_timeout: env_parse("SKILLET_EXTRACT_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.extract_timeout),
            dedup: DedupConfig::default(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HarvestConfig::default();
        assert_eq!(config.min_quality_score, DEFAULT_MIN_QUALITY_SCORE);
        assert_eq!(config.extract_batch_size, 5);
        assert_eq!(config.corpus_window, 500);
    }
}
