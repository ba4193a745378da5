//! Discovery seam: one collaborator per platform produces raw candidates.
//!
//! Real implementations wrap platform APIs and are responsible for their own
//! request pacing. The pipeline only sees the trait, so tests run against
//! [`MockDiscovery`].

use std::time::Duration;

use async_trait::async_trait;

use crate::error::DiscoveryError;
use crate::types::{DiscoveryQuery, Platform, RawCandidate};

/// A per-platform source of raw post candidates.
#[async_trait]
pub trait Discovery: Send + Sync {
    /// The platform this collaborator discovers from.
    fn platform(&self) -> Platform;

    /// False when required credentials are absent. An unconfigured platform
    /// is skipped by the orchestrator, never treated as an error.
    fn is_configured(&self) -> bool {
        true
    }

    /// Discover posts that likely contain recipes.
    async fn discover(&self, query: &DiscoveryQuery) -> Result<Vec<RawCandidate>, DiscoveryError>;
}

/// Canned discovery collaborator for tests and file-driven runs.
pub struct MockDiscovery {
    platform: Platform,
    candidates: Vec<RawCandidate>,
    error: Option<String>,
    configured: bool,
    delay: Option<Duration>,
}

impl MockDiscovery {
    /// A configured platform that returns nothing.
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            candidates: Vec::new(),
            error: None,
            configured: true,
            delay: None,
        }
    }

    /// A platform that returns the given candidates.
    pub fn with_candidates(platform: Platform, candidates: Vec<RawCandidate>) -> Self {
        Self {
            candidates,
            ..Self::new(platform)
        }
    }

    /// A platform whose discovery call fails.
    pub fn with_error(platform: Platform, error: &str) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new(platform)
        }
    }

    /// A platform with no credentials configured.
    pub fn unconfigured(platform: Platform) -> Self {
        Self {
            configured: false,
            ..Self::new(platform)
        }
    }

    /// Sleep before responding; lets tests hold a run open.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Discovery for MockDiscovery {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn discover(&self, query: &DiscoveryQuery) -> Result<Vec<RawCandidate>, DiscoveryError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.error {
            return Err(DiscoveryError::RequestFailed(error.clone()));
        }
        Ok(self
            .candidates
            .iter()
            .take(query.limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str) -> RawCandidate {
        RawCandidate {
            platform: Platform::Reddit,
            id: id.to_string(),
            title: format!("Post {id}"),
            description: None,
            author: None,
            author_follower_count: None,
            source_url: format!("https://reddit.com/r/fitmeals/{id}"),
            thumbnail_url: None,
            engagement: Default::default(),
            published_at: None,
        }
    }

    #[tokio::test]
    async fn test_mock_discovery_respects_limit() {
        let discovery = MockDiscovery::with_candidates(
            Platform::Reddit,
            vec![candidate("a"), candidate("b"), candidate("c")],
        );
        let found = discovery
            .discover(&DiscoveryQuery::with_limit(2))
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn test_mock_discovery_error() {
        let discovery = MockDiscovery::with_error(Platform::Reddit, "rate limited");
        let result = discovery.discover(&DiscoveryQuery::with_limit(10)).await;
        assert!(matches!(result, Err(DiscoveryError::RequestFailed(_))));
    }
}
