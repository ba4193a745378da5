//! LLM-backed recipe extraction.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

use super::RecipeExtractor;
use crate::error::ExtractError;
use crate::llm::LlmProvider;
use crate::types::{Creator, Nutrition, RawCandidate, Recipe};

/// Default minimum interval between model calls, on top of the
/// orchestrator's batch-size cap.
pub const DEFAULT_REQUEST_INTERVAL_MS: u64 = 500;

const EXTRACTION_PROMPT: &str = r#"You are a recipe extraction assistant for a healthy-recipe catalog.

Given the following raw post data from {platform}, extract a structured recipe.

Raw data:
```json
{raw_data}
```

Extract and return a JSON object with these fields:
- title: Recipe title (clean, appealing)
- description: 1-2 sentence description
- ingredients: Array of {"name", "quantity"} objects
- steps: Array of step strings (numbered instructions)
- nutrition: {"calories", "protein_g", "carbs_g", "fat_g", "servings"} — estimate from ingredients if not stated
- tags: Array of relevant tags from: ["high-protein", "low-cal", "keto", "vegan", "gluten-free", "quick", "meal-prep", "dessert", "breakfast", "lunch", "dinner", "snack"]
- cook_time_minutes: estimated cook time
- difficulty: "easy", "medium", or "hard"

If the post doesn't contain a recipe, return {"is_recipe": false}.
Be accurate with nutrition estimates. When in doubt, overestimate calories.

Return ONLY valid JSON, no markdown."#;

/// What the model returns. Everything is optional; gaps are filled from the
/// candidate or left empty for the validation gate to judge.
#[derive(Debug, Deserialize)]
struct ExtractionPayload {
    #[serde(default)]
    is_recipe: Option<bool>,
    title: Option<String>,
    description: Option<String>,
    #[serde(default)]
    ingredients: Vec<IngredientPayload>,
    #[serde(default)]
    steps: Vec<String>,
    nutrition: Option<NutritionPayload>,
    #[serde(default)]
    tags: Vec<String>,
    cook_time_minutes: Option<u32>,
    difficulty: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IngredientPayload {
    Structured {
        name: String,
        #[serde(default)]
        quantity: Option<String>,
    },
    Plain(String),
}

impl IngredientPayload {
    fn into_line(self) -> String {
        match self {
            IngredientPayload::Structured {
                name,
                quantity: Some(quantity),
            } if !quantity.is_empty() => format!("{quantity} {name}"),
            IngredientPayload::Structured { name, .. } => name,
            IngredientPayload::Plain(line) => line,
        }
    }
}

#[derive(Debug, Deserialize)]
struct NutritionPayload {
    calories: Option<f64>,
    protein_g: Option<f64>,
    carbs_g: Option<f64>,
    fat_g: Option<f64>,
    sugar_g: Option<f64>,
    servings: Option<u32>,
}

/// Extractor that asks an LLM to structure the raw post.
///
/// Paces its own requests: a minimum interval is enforced between calls so
/// concurrent batches don't burst past provider rate limits.
pub struct AiExtractor {
    provider: Arc<dyn LlmProvider>,
    request_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl AiExtractor {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            request_interval: Duration::from_millis(DEFAULT_REQUEST_INTERVAL_MS),
            last_request: Mutex::new(None),
        }
    }

    /// Override the minimum interval between model calls.
    pub fn with_request_interval(mut self, interval: Duration) -> Self {
        self.request_interval = interval;
        self
    }

    async fn pace(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.request_interval {
                tokio::time::sleep(self.request_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    fn build_prompt(candidate: &RawCandidate) -> Result<String, ExtractError> {
        let raw_data = serde_json::to_string_pretty(candidate)
            .map_err(|e| ExtractError::Parse(e.to_string()))?;
        Ok(EXTRACTION_PROMPT
            .replace("{platform}", candidate.platform.as_str())
            .replace("{raw_data}", &raw_data))
    }
}

#[async_trait]
impl RecipeExtractor for AiExtractor {
    async fn extract(&self, candidate: &RawCandidate) -> Result<Option<Recipe>, ExtractError> {
        self.pace().await;

        let prompt = Self::build_prompt(candidate)?;
        let response = self.provider.complete(&prompt).await?;
        let text = strip_code_fences(&response);

        let payload: ExtractionPayload =
            serde_json::from_str(text).map_err(|e| ExtractError::Parse(e.to_string()))?;

        if payload.is_recipe == Some(false) {
            tracing::debug!(
                platform = %candidate.platform,
                title = %candidate.title,
                "post is not a recipe"
            );
            return Ok(None);
        }

        Ok(Some(build_recipe(candidate, payload)))
    }

    fn name(&self) -> &'static str {
        "ai"
    }
}

/// Models wrap JSON in markdown fences despite instructions; tolerate it.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag line ("```json")
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

fn build_recipe(candidate: &RawCandidate, payload: ExtractionPayload) -> Recipe {
    let creator = candidate.author.as_ref().map(|author| Creator {
        username: author.clone(),
        platform: candidate.platform,
        profile_url: None,
        follower_count: candidate.author_follower_count,
    });

    let nutrition = payload.nutrition.map(|n| Nutrition {
        calories: n.calories,
        protein_g: n.protein_g,
        carbs_g: n.carbs_g,
        fat_g: n.fat_g,
        sugar_g: n.sugar_g,
        servings: n.servings.unwrap_or(1),
    });

    Recipe {
        id: Uuid::new_v4().to_string(),
        title: payload.title.unwrap_or_else(|| candidate.title.clone()),
        description: payload
            .description
            .or_else(|| candidate.description.clone()),
        creator,
        platform: candidate.platform,
        source_url: candidate.source_url.clone(),
        thumbnail_url: candidate.thumbnail_url.clone(),
        video_url: None,
        ingredients: payload
            .ingredients
            .into_iter()
            .map(IngredientPayload::into_line)
            .collect(),
        steps: payload.steps,
        nutrition,
        engagement: candidate.engagement.clone(),
        tags: payload.tags,
        cook_time_minutes: payload.cook_time_minutes,
        difficulty: payload.difficulty,
        virality_score: None,
        scraped_at: chrono::Utc::now(),
        published_at: candidate.published_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::FakeProvider;
    use crate::types::Platform;

    fn candidate() -> RawCandidate {
        RawCandidate {
            platform: Platform::Tiktok,
            id: "v123".to_string(),
            title: "protein ice cream hack".to_string(),
            description: Some("3 ingredients only".to_string()),
            author: Some("broccyourbody".to_string()),
            author_follower_count: Some(500_000),
            source_url: "https://tiktok.com/@broccyourbody/video/123".to_string(),
            thumbnail_url: Some("https://cdn.tiktok.com/thumb/123.jpg".to_string()),
            engagement: Default::default(),
            published_at: None,
        }
    }

    const RESPONSE: &str = r#"{
        "title": "3-Ingredient Protein Ice Cream",
        "description": "Creamy high-protein dessert.",
        "ingredients": [
            {"name": "frozen banana", "quantity": "2 medium"},
            {"name": "protein powder", "quantity": "1 scoop"},
            {"name": "almond milk", "quantity": "1/4 cup"}
        ],
        "steps": ["Blend everything until smooth.", "Freeze for two hours.", "Scoop and serve cold."],
        "nutrition": {"calories": 320, "protein_g": 42, "carbs_g": 38, "fat_g": 4, "servings": 1},
        "tags": ["high-protein", "dessert"],
        "cook_time_minutes": 5,
        "difficulty": "easy"
    }"#;

    #[tokio::test]
    async fn test_extracts_structured_recipe() {
        let provider = Arc::new(FakeProvider::with_response("protein ice cream", RESPONSE));
        let extractor = AiExtractor::new(provider).with_request_interval(Duration::ZERO);

        let recipe = extractor.extract(&candidate()).await.unwrap().unwrap();
        assert_eq!(recipe.title, "3-Ingredient Protein Ice Cream");
        assert_eq!(recipe.ingredients[0], "2 medium frozen banana");
        assert_eq!(recipe.steps.len(), 3);
        assert_eq!(recipe.macros().unwrap().protein_g, 42.0);
        assert_eq!(recipe.creator.as_ref().unwrap().username, "broccyourbody");
        assert_eq!(recipe.source_url, candidate().source_url);
    }

    #[tokio::test]
    async fn test_not_a_recipe_returns_none() {
        let provider = Arc::new(FakeProvider::default());
        let extractor = AiExtractor::new(provider).with_request_interval(Duration::ZERO);
        let result = extractor.extract(&candidate()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_fenced_response_is_tolerated() {
        let fenced = format!("```json\n{RESPONSE}\n```");
        let provider = Arc::new(FakeProvider::with_response("protein ice cream", &fenced));
        let extractor = AiExtractor::new(provider).with_request_interval(Duration::ZERO);
        let recipe = extractor.extract(&candidate()).await.unwrap().unwrap();
        assert_eq!(recipe.tags, vec!["high-protein", "dessert"]);
    }

    #[tokio::test]
    async fn test_garbage_response_is_parse_error() {
        let provider = Arc::new(FakeProvider::with_response("protein ice cream", "not json"));
        let extractor = AiExtractor::new(provider).with_request_interval(Duration::ZERO);
        let result = extractor.extract(&candidate()).await;
        assert!(matches!(result, Err(ExtractError::Parse(_))));
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("{\"a\": 1}"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
    }
}
