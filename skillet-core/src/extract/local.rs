//! Heuristic recipe extraction without an LLM.
//!
//! Parses nutrition, ingredients, and steps out of post text with regex
//! heuristics. Structured text posts (Reddit-style) follow predictable
//! formats often enough for this to be a usable fallback when no model
//! credential is configured.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use uuid::Uuid;

use super::RecipeExtractor;
use crate::error::ExtractError;
use crate::types::{Creator, Nutrition, RawCandidate, Recipe};

const MAX_INGREDIENTS: usize = 20;
const MAX_STEPS: usize = 15;
const MAX_TAGS: usize = 5;

static CALORIE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{2,4})\s*(?:cal(?:ories?)?|kcal)\b").expect("Invalid calorie regex")
});

static PROTEIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,3})\.?\d*\s*g?\s*(?:of\s+)?protein").expect("Invalid protein regex")
});

static CARB_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,3})\.?\d*\s*g?\s*(?:of\s+)?carb").expect("Invalid carb regex")
});

static FAT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,3})\.?\d*\s*g?\s*(?:of\s+)?fat").expect("Invalid fat regex")
});

static SERVING_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:serves?|servings?|makes?)\s*:?\s*(\d+)").expect("Invalid serving regex")
});

static BULLET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\-\*•]\s+").expect("Invalid bullet regex"));

static NUMBERED_STEP_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[\.\)]\s*(.*)").expect("Invalid step regex"));

static QUANTITY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\d+\s*(?:g|oz|cup|tbsp|tsp|ml|lb|can|kg|piece|slice)")
        .expect("Invalid quantity regex")
});

static FOOD_WORD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        "(?i)chicken|beef|pork|salmon|tuna|tofu|egg|rice|pasta|bread|cheese|yogurt|\
         butter|oil|onion|garlic|pepper|salt|sugar|flour|milk|cream|broccoli|\
         spinach|tomato|potato|bean|lentil|oat|avocado|banana|berry|apple|\
         sauce|powder|spice|vinegar|lemon|lime|honey|maple|cocoa|protein|\
         squash|cottage|mozzarella|cheddar|lettuce|cucumber|carrot|celery",
    )
    .expect("Invalid food-word regex")
});

/// Verbs that start instructions rather than ingredient lines.
const INSTRUCTION_STARTS: &[&str] = &[
    "place", "cook", "bake", "mix", "stir", "heat", "add", "pour", "combine", "serve", "let",
    "remove", "slice", "chop", "preheat", "set", "put", "bring", "fold", "whisk", "cover", "turn",
];

const INGREDIENT_HEADERS: &[&str] = &["ingredient", "what you need", "you'll need", "shopping list"];
const STEP_HEADERS: &[&str] = &["instruction", "direction", "step", "method", "how to make"];

fn extract_number(regex: &Regex, text: &str) -> Option<f64> {
    regex
        .captures(text)
        .and_then(|cap| cap.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Heuristic: does this line read like an ingredient, not an instruction?
fn looks_like_ingredient(line: &str) -> bool {
    let lower = line.to_lowercase();
    for verb in INSTRUCTION_STARTS {
        if lower.starts_with(&format!("{verb} ")) {
            return false;
        }
    }
    if line.len() > 80 {
        return false;
    }
    QUANTITY_REGEX.is_match(&lower) || FOOD_WORD_REGEX.is_match(&lower)
}

fn clean_line(line: &str) -> String {
    // Undo Reddit markdown escapes, then strip the bullet prefix
    let unescaped = line.trim().replace("\\-", "-").replace("\\*", "*");
    BULLET_REGEX.replace(&unescaped, "").trim().to_string()
}

fn extract_ingredients(text: &str) -> Vec<String> {
    let mut ingredients = Vec::new();

    // Strategy 1: lines inside an explicit ingredients section
    let mut in_section = false;
    for line in text.lines() {
        let cleaned = clean_line(line);
        let lower = cleaned.to_lowercase();

        if INGREDIENT_HEADERS.iter().any(|h| lower.contains(h)) {
            in_section = true;
            continue;
        }
        if in_section && STEP_HEADERS.iter().any(|h| lower.contains(h)) {
            in_section = false;
            continue;
        }
        if in_section && cleaned.len() > 2 && looks_like_ingredient(&cleaned) {
            ingredients.push(cleaned);
        }
    }

    // Strategy 2: no section found, scan bullet lines for ingredient-like
    // content anywhere in the post
    if ingredients.is_empty() {
        for line in text.lines() {
            let trimmed = line.trim().replace("\\-", "-").replace("\\*", "*");
            if !BULLET_REGEX.is_match(&trimmed) {
                continue;
            }
            let cleaned = clean_line(&trimmed);
            if cleaned.len() > 2 && looks_like_ingredient(&cleaned) {
                ingredients.push(cleaned);
            }
        }
    }

    ingredients.truncate(MAX_INGREDIENTS);
    ingredients
}

fn extract_steps(text: &str) -> Vec<String> {
    let mut steps = Vec::new();

    let mut in_section = false;
    for line in text.lines() {
        let cleaned = clean_line(line);
        let lower = cleaned.to_lowercase();

        if STEP_HEADERS.iter().any(|h| lower.contains(h)) {
            in_section = true;
            continue;
        }
        if !in_section || cleaned.is_empty() {
            continue;
        }

        if let Some(cap) = NUMBERED_STEP_REGEX.captures(&cleaned) {
            if let Some(step) = cap.get(1) {
                steps.push(step.as_str().trim().to_string());
            }
        } else if cleaned.len() > 10 {
            steps.push(cleaned);
        }
    }

    steps.truncate(MAX_STEPS);
    steps
}

fn infer_tags(title: &str, text: &str) -> Vec<String> {
    let combined = format!("{} {}", title, text).to_lowercase();
    let tag_keywords: &[(&str, &[&str])] = &[
        ("high-protein", &["high protein", "protein", "anabolic"]),
        ("low-cal", &["low cal", "low calorie", "deficit", "1200", "1500"]),
        ("keto", &["keto", "low carb"]),
        ("vegan", &["vegan", "plant based", "plant-based"]),
        ("gluten-free", &["gluten free", "gluten-free", "celiac"]),
        ("quick", &["quick", "15 min", "20 min", "easy", "simple", "fast"]),
        ("meal-prep", &["meal prep", "batch cook"]),
        ("breakfast", &["breakfast", "morning", "oats", "smoothie"]),
        ("lunch", &["lunch", "midday"]),
        ("dinner", &["dinner", "supper", "evening"]),
        ("snack", &["snack", "bite"]),
        ("dessert", &["dessert", "sweet", "treat"]),
    ];

    let mut tags: Vec<String> = tag_keywords
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|kw| combined.contains(kw)))
        .map(|(tag, _)| tag.to_string())
        .collect();
    tags.truncate(MAX_TAGS);
    tags
}

fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}

/// Regex-heuristic extractor, used when no LLM credential is configured.
#[derive(Debug, Default)]
pub struct LocalExtractor;

impl LocalExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_sync(candidate: &RawCandidate) -> Option<Recipe> {
        let description = candidate.description.as_deref().unwrap_or_default();
        let text = format!("{}\n{}", candidate.title, description);

        let calories = extract_number(&CALORIE_REGEX, &text);
        let protein = extract_number(&PROTEIN_REGEX, &text);
        let carbs = extract_number(&CARB_REGEX, &text);
        let fat = extract_number(&FAT_REGEX, &text);
        let servings = extract_number(&SERVING_REGEX, &text).unwrap_or(1.0) as u32;

        let ingredients = extract_ingredients(description);
        let steps = extract_steps(description);

        // Nothing recipe-shaped recovered at all: not a recipe
        if ingredients.is_empty() && steps.is_empty() && calories.is_none() && protein.is_none() {
            return None;
        }

        let nutrition = if calories.is_some() || protein.is_some() {
            Some(Nutrition {
                calories,
                protein_g: protein,
                carbs_g: carbs,
                fat_g: fat,
                sugar_g: None,
                servings: servings.max(1),
            })
        } else {
            None
        };

        let creator = candidate.author.as_ref().map(|author| Creator {
            username: author.clone(),
            platform: candidate.platform,
            profile_url: None,
            follower_count: candidate.author_follower_count,
        });

        let tags = infer_tags(&candidate.title, description);

        Some(Recipe {
            id: Uuid::new_v4().to_string(),
            title: decode_entities(&candidate.title),
            description: if description.is_empty() {
                None
            } else {
                Some(description.chars().take(500).collect())
            },
            creator,
            platform: candidate.platform,
            source_url: candidate.source_url.clone(),
            thumbnail_url: candidate.thumbnail_url.clone(),
            video_url: None,
            ingredients,
            steps,
            nutrition,
            engagement: candidate.engagement.clone(),
            tags,
            cook_time_minutes: None,
            difficulty: None,
            virality_score: None,
            scraped_at: chrono::Utc::now(),
            published_at: candidate.published_at,
        })
    }
}

#[async_trait]
impl RecipeExtractor for LocalExtractor {
    async fn extract(&self, candidate: &RawCandidate) -> Result<Option<Recipe>, ExtractError> {
        Ok(Self::extract_sync(candidate))
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
