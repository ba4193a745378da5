//! Candidate-to-recipe extraction.
//!
//! Two implementations behind one trait: an LLM-backed extractor for
//! production and a regex-heuristic extractor used when no model credential
//! is configured. Returning `Ok(None)` means "this post is not a recipe",
//! which is an expected outcome, not an error.

mod ai;
mod local;

pub use ai::AiExtractor;
pub use local::LocalExtractor;

use async_trait::async_trait;

use crate::error::ExtractError;
use crate::types::{RawCandidate, Recipe};

/// Turns a raw post candidate into a structured recipe.
#[async_trait]
pub trait RecipeExtractor: Send + Sync {
    /// Extract a recipe from the candidate. `Ok(None)` when the post does
    /// not contain a recipe.
    async fn extract(&self, candidate: &RawCandidate) -> Result<Option<Recipe>, ExtractError>;

    /// Short name for logging ("ai", "local").
    fn name(&self) -> &'static str;
}
