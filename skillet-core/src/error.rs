use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("discovery request failed: {0}")]
    RequestFailed(String),

    #[error("discovery timed out after {0:?}")]
    Timeout(Duration),

    #[error("discovery task panicked: {0}")]
    TaskPanicked(String),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("LLM error: {0}")]
    Llm(#[from] crate::llm::LlmError),

    #[error("failed to parse extraction response: {0}")]
    Parse(String),

    #[error("extraction timed out after {0:?}")]
    Timeout(Duration),

    #[error("extraction task panicked: {0}")]
    TaskPanicked(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("write failed for {url}: {message}")]
    WriteFailed { url: String, message: String },
}

/// Errors surfaced by the orchestrator itself. Stage failures inside a run
/// never appear here; they become counters and per-platform error strings
/// on the run record.
#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("a harvest run is already in progress")]
    RunInProgress,
}
