//! LLM provider abstraction for recipe extraction.
//!
//! A trait-based seam over the model API so the extractor can run against
//! the real Claude endpoint in production and a canned provider in tests.

mod claude;
mod fake;

pub use claude::ClaudeProvider;
pub use fake::FakeProvider;

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Error type for LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API returned error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// Trait for LLM providers.
///
/// Implementations should be stateless and thread-safe. The provider is
/// responsible for making API calls and returning the model's text response.
#[async_trait]
pub trait LlmProvider: Send + Sync + fmt::Debug {
    /// Send a prompt to the LLM and get a text response.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Get the provider name (e.g., "claude", "fake").
    fn provider_name(&self) -> &'static str;

    /// Get the model name.
    fn model_name(&self) -> &str;
}

/// Build a provider from environment variables.
///
/// - `SKILLET_LLM_PROVIDER`: "claude" | "fake" (default: "claude" when
///   `ANTHROPIC_API_KEY` is set, "fake" otherwise)
/// - `ANTHROPIC_API_KEY`: API key for Claude
/// - `SKILLET_LLM_MODEL`: model name override
pub fn create_provider_from_env() -> Result<Box<dyn LlmProvider>, LlmError> {
    let default_provider = if std::env::var("ANTHROPIC_API_KEY").is_ok() {
        "claude"
    } else {
        "fake"
    };
    let provider = std::env::var("SKILLET_LLM_PROVIDER")
        .unwrap_or_else(|_| default_provider.to_string());

    match provider.as_str() {
        "fake" => Ok(Box::new(FakeProvider::default())),
        "claude" => {
            let api_key = std::env::var("ANTHROPIC_API_KEY")
                .map_err(|_| LlmError::NotConfigured("ANTHROPIC_API_KEY not set".to_string()))?;
            let model = std::env::var("SKILLET_LLM_MODEL")
                .unwrap_or_else(|_| claude::DEFAULT_MODEL.to_string());
            Ok(Box::new(ClaudeProvider::new(api_key, model)))
        }
        other => Err(LlmError::NotConfigured(format!(
            "Unknown provider: {}",
            other
        ))),
    }
}
