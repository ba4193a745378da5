//! Fake LLM provider for testing.
//!
//! Returns deterministic responses based on prompt matching, so extraction
//! tests run without network access or API costs.

use super::{LlmError, LlmProvider};
use async_trait::async_trait;

/// A fake LLM provider for testing.
///
/// Responses are matched by checking if the prompt contains a registered
/// substring; the first registered match wins. Prompts matching nothing get
/// the default response, or an error when none is set.
#[derive(Debug)]
pub struct FakeProvider {
    /// (prompt substring, response) pairs in registration order.
    responses: Vec<(String, String)>,
    /// Fallback when no substring matches.
    default_response: Option<String>,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self {
            responses: Vec::new(),
            default_response: Some(r#"{"is_recipe": false}"#.to_string()),
        }
    }
}

impl FakeProvider {
    /// A provider with no registered responses and no fallback.
    pub fn new() -> Self {
        Self {
            responses: Vec::new(),
            default_response: None,
        }
    }

    /// A provider answering prompts that contain `prompt_contains`.
    pub fn with_response(prompt_contains: &str, response: &str) -> Self {
        let mut provider = Self::new();
        provider.add_response(prompt_contains, response);
        provider
    }

    /// Register a response for prompts containing a specific substring.
    pub fn add_response(&mut self, prompt_contains: &str, response: &str) {
        self.responses
            .push((prompt_contains.to_lowercase(), response.to_string()));
    }

    /// Set the fallback response for unmatched prompts.
    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_response = Some(response.to_string());
        self
    }
}

#[async_trait]
impl LlmProvider for FakeProvider {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let prompt_lower = prompt.to_lowercase();
        for (pattern, response) in &self.responses {
            if prompt_lower.contains(pattern) {
                return Ok(response.clone());
            }
        }

        match &self.default_response {
            Some(response) => Ok(response.clone()),
            None => Err(LlmError::RequestFailed(format!(
                "FakeProvider: No response configured for prompt (first 100 chars): {}",
                &prompt[..prompt.len().min(100)]
            ))),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}
