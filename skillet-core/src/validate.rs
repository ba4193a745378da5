//! Hard admission gate for extracted recipes.
//!
//! Checks run in a fixed order and the first failure wins. A rejection is a
//! terminal filtering outcome with a structured reason, not a retryable
//! error.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::types::{Macros, Nutrition, Recipe};

/// Allowed relative gap between reported calories and calories computed
/// from the macros (4 cal/g protein and carbs, 9 cal/g fat). Catches
/// garbled extraction where macros were misread from source text.
pub const MACRO_MATH_TOLERANCE: f64 = 0.5;

pub const MIN_INGREDIENTS: usize = 3;
pub const MIN_STEPS: usize = 3;

/// Cleaned ingredient text must be longer than this.
const MIN_INGREDIENT_CHARS: usize = 2;
/// Cleaned step text must be longer than this.
const MIN_STEP_CHARS: usize = 10;

/// Transcript/caption noise that marks an item as extraction garbage
/// rather than recipe content.
const NOISE_TERMS: &[&str] = &["watch", "video", "subscribe", "link", "recipe"];

/// Phrasings that indicate a multi-recipe compilation ("day in the life"
/// videos and the like), which cannot map to a single structured recipe.
static COMPILATION_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\bday\s+in\s+(?:my\s+|the\s+)?life\b", "day in the life"),
        (r"\bfull\s+day\s+of\s+eating\b", "full day of eating"),
        (r"\bwhat\s+i\s+eat\s+in\s+a\s+day\b", "what I eat in a day"),
        (r"\b\d+\s+recipes?\b", "numbered recipe count"),
        (
            r"\bmeal\s+prep\s+(?:for\s+)?(?:the\s+)?week\b",
            "meal prep for the week",
        ),
        (r"\beverything\s+i\s+ate\b", "everything I ate"),
        (r"\b24\s+hours?\s+of\s+eating\b", "24 hours of eating"),
        (r"\bmeal\s+prep\s+sunday\b", "meal prep sunday"),
        (r"\bweekly\s+meal\s+prep\b", "weekly meal prep"),
        (r"\brecipe\s+compilation\b", "recipe compilation"),
        (r"\b\d+\s+meals?\b", "numbered meal count"),
        (
            r"\b(?:first|second|third|fourth|fifth)\s+recipe\b",
            "numbered recipe list",
        ),
        (
            r"\brecipe\s+(?:one|two|three|four|five)\b",
            "numbered recipe list",
        ),
    ]
    .iter()
    .map(|(pattern, label)| {
        let regex = Regex::new(&format!("(?i){pattern}")).expect("Invalid compilation pattern");
        (regex, *label)
    })
    .collect()
});

/// Why a recipe was turned away at the gate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    MissingMacros { macros: Vec<&'static str> },
    TooFewIngredients { count: usize },
    ShortIngredient { text: String },
    NoisyIngredient { text: String },
    TooFewSteps { count: usize },
    ShortStep { text: String },
    NoisyStep { text: String },
    MissingSourceUrl,
    InvalidSourceUrl { url: String },
    MissingThumbnailUrl,
    InvalidThumbnailUrl { url: String },
    Compilation { label: &'static str },
    MacroMathMismatch { reported: f64, calculated: f64 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MissingMacros { macros } => {
                write!(f, "missing/invalid macros: {}", macros.join(", "))
            }
            RejectReason::TooFewIngredients { count } => {
                write!(f, "too few ingredients ({count} < {MIN_INGREDIENTS} minimum)")
            }
            RejectReason::ShortIngredient { text } => {
                write!(f, "ingredient too short: '{text}'")
            }
            RejectReason::NoisyIngredient { text } => {
                write!(f, "ingredient looks like transcript noise: '{text}'")
            }
            RejectReason::TooFewSteps { count } => {
                write!(f, "too few steps ({count} < {MIN_STEPS} minimum)")
            }
            RejectReason::ShortStep { text } => write!(f, "step too short: '{text}'"),
            RejectReason::NoisyStep { text } => {
                write!(f, "step looks like transcript noise: '{text}'")
            }
            RejectReason::MissingSourceUrl => write!(f, "missing source URL"),
            RejectReason::InvalidSourceUrl { url } => {
                write!(f, "invalid source URL: '{url}'")
            }
            RejectReason::MissingThumbnailUrl => write!(f, "missing thumbnail URL"),
            RejectReason::InvalidThumbnailUrl { url } => {
                write!(f, "invalid thumbnail URL: '{url}'")
            }
            RejectReason::Compilation { label } => {
                write!(f, "multi-recipe compilation detected: {label}")
            }
            RejectReason::MacroMathMismatch {
                reported,
                calculated,
            } => write!(
                f,
                "macro math doesn't add up: {reported} cal reported vs {calculated:.0} calculated"
            ),
        }
    }
}

/// Outcome of the admission gate.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
}

impl ValidationResult {
    fn pass() -> Self {
        Self {
            is_valid: true,
            reason: None,
        }
    }

    fn reject(reason: RejectReason) -> Self {
        Self {
            is_valid: false,
            reason: Some(reason),
        }
    }
}

/// All four macros, or the names of the ones that are missing or invalid.
/// Calories must be positive; the gram counts must be non-negative.
fn check_macros(nutrition: Option<&Nutrition>) -> Result<Macros, Vec<&'static str>> {
    let empty = Nutrition::default();
    let n = nutrition.unwrap_or(&empty);

    let mut bad = Vec::new();
    if !n.calories.is_some_and(|v| v > 0.0) {
        bad.push("calories");
    }
    if !n.protein_g.is_some_and(|v| v >= 0.0) {
        bad.push("protein");
    }
    if !n.carbs_g.is_some_and(|v| v >= 0.0) {
        bad.push("carbs");
    }
    if !n.fat_g.is_some_and(|v| v >= 0.0) {
        bad.push("fat");
    }

    match n.macros() {
        Some(macros) if bad.is_empty() => Ok(macros),
        _ => Err(bad),
    }
}

fn noise_term(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    NOISE_TERMS.iter().copied().find(|term| lower.contains(term))
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Run the admission checks on a recipe, first failure wins.
pub fn validate_recipe(recipe: &Recipe) -> ValidationResult {
    // 1. Macros present and numerically sane
    let macros = match check_macros(recipe.nutrition.as_ref()) {
        Ok(macros) => macros,
        Err(missing) => {
            return ValidationResult::reject(RejectReason::MissingMacros { macros: missing })
        }
    };

    // 2. Ingredient and step quality
    if recipe.ingredients.len() < MIN_INGREDIENTS {
        return ValidationResult::reject(RejectReason::TooFewIngredients {
            count: recipe.ingredients.len(),
        });
    }
    for item in &recipe.ingredients {
        let cleaned = item.trim();
        if cleaned.len() <= MIN_INGREDIENT_CHARS {
            return ValidationResult::reject(RejectReason::ShortIngredient {
                text: cleaned.to_string(),
            });
        }
        if noise_term(cleaned).is_some() {
            return ValidationResult::reject(RejectReason::NoisyIngredient {
                text: cleaned.to_string(),
            });
        }
    }

    if recipe.steps.len() < MIN_STEPS {
        return ValidationResult::reject(RejectReason::TooFewSteps {
            count: recipe.steps.len(),
        });
    }
    for step in &recipe.steps {
        let cleaned = step.trim();
        if cleaned.len() <= MIN_STEP_CHARS {
            return ValidationResult::reject(RejectReason::ShortStep {
                text: cleaned.to_string(),
            });
        }
        if noise_term(cleaned).is_some() {
            return ValidationResult::reject(RejectReason::NoisyStep {
                text: cleaned.to_string(),
            });
        }
    }

    // 3. URLs
    if recipe.source_url.trim().is_empty() {
        return ValidationResult::reject(RejectReason::MissingSourceUrl);
    }
    if !is_http_url(&recipe.source_url) {
        return ValidationResult::reject(RejectReason::InvalidSourceUrl {
            url: recipe.source_url.clone(),
        });
    }
    match recipe.thumbnail_url.as_deref().map(str::trim) {
        None | Some("") => return ValidationResult::reject(RejectReason::MissingThumbnailUrl),
        Some(url) if !is_http_url(url) => {
            return ValidationResult::reject(RejectReason::InvalidThumbnailUrl {
                url: url.to_string(),
            })
        }
        Some(_) => {}
    }

    // 4. Compilation detection over title + description
    let search_text = match recipe.description.as_deref() {
        Some(description) => format!("{} {}", recipe.title, description),
        None => recipe.title.clone(),
    };
    for (regex, label) in COMPILATION_PATTERNS.iter() {
        if regex.is_match(&search_text) {
            return ValidationResult::reject(RejectReason::Compilation { label });
        }
    }

    // 5. Macro-math sanity
    let calculated = macros.protein_g * 4.0 + macros.carbs_g * 4.0 + macros.fat_g * 9.0;
    if (calculated - macros.calories).abs() > macros.calories * MACRO_MATH_TOLERANCE {
        return ValidationResult::reject(RejectReason::MacroMathMismatch {
            reported: macros.calories,
            calculated,
        });
    }

    ValidationResult::pass()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Nutrition, Platform, Recipe};

    fn valid_recipe() -> Recipe {
        let mut recipe = Recipe::new(
            "High Protein Breakfast Burrito",
            Platform::Youtube,
            "https://youtube.com/watch?v=abc123",
        );
        recipe.thumbnail_url = Some("https://img.youtube.com/vi/abc123/hq.jpg".to_string());
        recipe.ingredients = vec![
            "2 eggs".into(),
            "1 cup shredded cheese".into(),
            "1 flour tortilla".into(),
        ];
        recipe.steps = vec![
            "Scramble the eggs over medium heat.".into(),
            "Warm the tortilla in a dry pan.".into(),
            "Assemble the burrito and serve.".into(),
        ];
        recipe.nutrition = Some(Nutrition {
            calories: Some(450.0),
            protein_g: Some(35.0),
            carbs_g: Some(28.0),
            fat_g: Some(22.0),
            ..Nutrition::default()
        });
        recipe
    }

    #[test]
    fn test_valid_recipe_passes() {
        let result = validate_recipe(&valid_recipe());
        assert!(result.is_valid, "rejected: {:?}", result.reason);
    }

    #[test]
    fn test_missing_macros_enumerated_by_name() {
        let mut recipe = valid_recipe();
        recipe.nutrition = Some(Nutrition {
            carbs_g: Some(28.0),
            fat_g: Some(22.0),
            ..Nutrition::default()
        });
        let result = validate_recipe(&recipe);
        assert_eq!(
            result.reason,
            Some(RejectReason::MissingMacros {
                macros: vec!["calories", "protein"]
            })
        );
    }

    #[test]
    fn test_no_nutrition_lists_all_four() {
        let mut recipe = valid_recipe();
        recipe.nutrition = None;
        let result = validate_recipe(&recipe);
        assert_eq!(
            result.reason,
            Some(RejectReason::MissingMacros {
                macros: vec!["calories", "protein", "carbs", "fat"]
            })
        );
    }

    #[test]
    fn test_zero_calories_is_invalid() {
        let mut recipe = valid_recipe();
        recipe.nutrition.as_mut().unwrap().calories = Some(0.0);
        let result = validate_recipe(&recipe);
        assert_eq!(
            result.reason,
            Some(RejectReason::MissingMacros {
                macros: vec!["calories"]
            })
        );
    }

    #[test]
    fn test_too_few_ingredients() {
        let mut recipe = valid_recipe();
        recipe.ingredients.truncate(2);
        let result = validate_recipe(&recipe);
        assert_eq!(result.reason, Some(RejectReason::TooFewIngredients { count: 2 }));
    }

    #[test]
    fn test_noisy_ingredient_rejected() {
        let mut recipe = valid_recipe();
        recipe.ingredients[1] = "click the link below for more".to_string();
        let result = validate_recipe(&recipe);
        assert!(matches!(
            result.reason,
            Some(RejectReason::NoisyIngredient { .. })
        ));
    }

    #[test]
    fn test_short_step_rejected() {
        let mut recipe = valid_recipe();
        recipe.steps[2] = "Serve.".to_string();
        let result = validate_recipe(&recipe);
        assert!(matches!(result.reason, Some(RejectReason::ShortStep { .. })));
    }

    #[test]
    fn test_missing_thumbnail_rejected() {
        let mut recipe = valid_recipe();
        recipe.thumbnail_url = None;
        let result = validate_recipe(&recipe);
        assert_eq!(result.reason, Some(RejectReason::MissingThumbnailUrl));
    }

    #[test]
    fn test_non_http_source_url_rejected() {
        let mut recipe = valid_recipe();
        recipe.source_url = "ftp://example.com/recipe".to_string();
        let result = validate_recipe(&recipe);
        assert!(matches!(
            result.reason,
            Some(RejectReason::InvalidSourceUrl { .. })
        ));
    }

    #[test]
    fn test_compilation_title_rejected() {
        let mut recipe = valid_recipe();
        recipe.title = "5 Recipes For Meal Prep This Week".to_string();
        let result = validate_recipe(&recipe);
        assert!(matches!(
            result.reason,
            Some(RejectReason::Compilation { .. })
        ));
    }

    #[test]
    fn test_compilation_in_description_rejected() {
        let mut recipe = valid_recipe();
        recipe.description = Some("Everything I ate today, full breakdown".to_string());
        let result = validate_recipe(&recipe);
        assert!(matches!(
            result.reason,
            Some(RejectReason::Compilation { .. })
        ));
    }

    #[test]
    fn test_macro_math_mismatch_rejected() {
        let mut recipe = valid_recipe();
        // 35g protein + 28g carbs + 22g fat = 450 calculated, 2000 reported
        recipe.nutrition.as_mut().unwrap().calories = Some(2000.0);
        let result = validate_recipe(&recipe);
        assert!(matches!(
            result.reason,
            Some(RejectReason::MacroMathMismatch { .. })
        ));
    }
}
