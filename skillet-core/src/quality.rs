//! Soft quality scoring for recipes.
//!
//! Scores each recipe 0.0-1.0 from data completeness and validity. Used to
//! filter low-value recipes and as a display signal; the hard admission
//! checks live in `validate`.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::Recipe;

pub const CALORIE_MIN: f64 = 100.0;
pub const CALORIE_MAX: f64 = 2000.0;
pub const PROTEIN_MIN: f64 = 10.0;
pub const PROTEIN_MAX: f64 = 200.0;

/// A recipe is "complete" when at least this many factors contribute.
pub const MIN_COMPLETE_FACTORS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityStatus {
    Complete,
    Incomplete,
}

/// Detailed quality assessment for a recipe.
#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    /// 0.0 - 1.0
    pub score: f64,
    pub status: QualityStatus,
    /// Contribution per factor; zero means the factor is absent.
    pub factors: BTreeMap<&'static str, f64>,
    pub warnings: Vec<String>,
}

/// Score a recipe's quality from 0.0 to 1.0.
///
/// Factor weights (sum to 1.0):
///   - title (>= 5 chars): 0.10
///   - description (>= 10 chars): 0.05
///   - ingredients: 0.20 for 2+, 0.10 for 1
///   - steps: 0.15 for 2+, 0.08 for 1
///   - nutrition present (complete macros): 0.15
///   - nutrition in range: 0.10
///   - tags: 0.05
///   - creator identified: 0.05
///   - media (thumbnail or video): 0.05
///   - any engagement metric: 0.05
///   - cook time: 0.05
pub fn score_recipe(recipe: &Recipe) -> QualityReport {
    let mut factors: BTreeMap<&'static str, f64> = BTreeMap::new();
    let mut warnings: Vec<String> = Vec::new();

    factors.insert(
        "title",
        if recipe.title.trim().len() >= 5 { 0.10 } else { 0.0 },
    );

    factors.insert(
        "description",
        if recipe.description.as_deref().is_some_and(|d| d.len() >= 10) {
            0.05
        } else {
            0.0
        },
    );

    factors.insert(
        "ingredients",
        match recipe.ingredients.len() {
            0 => 0.0,
            1 => 0.10,
            _ => 0.20,
        },
    );

    factors.insert(
        "steps",
        match recipe.steps.len() {
            0 => 0.0,
            1 => 0.08,
            _ => 0.15,
        },
    );

    match recipe.macros() {
        Some(macros) => {
            factors.insert("nutrition_present", 0.15);
            let mut valid = true;
            if !(CALORIE_MIN..=CALORIE_MAX).contains(&macros.calories) {
                warnings.push(format!(
                    "Calories {} outside range [{}, {}]",
                    macros.calories, CALORIE_MIN, CALORIE_MAX
                ));
                valid = false;
            }
            if !(PROTEIN_MIN..=PROTEIN_MAX).contains(&macros.protein_g) {
                warnings.push(format!(
                    "Protein {}g outside range [{}, {}]",
                    macros.protein_g, PROTEIN_MIN, PROTEIN_MAX
                ));
                valid = false;
            }
            factors.insert("nutrition_valid", if valid { 0.10 } else { 0.0 });
        }
        None => {
            factors.insert("nutrition_present", 0.0);
            factors.insert("nutrition_valid", 0.0);
            warnings.push("No complete nutrition data".to_string());
        }
    }

    factors.insert("tags", if recipe.tags.is_empty() { 0.0 } else { 0.05 });

    factors.insert(
        "creator",
        if recipe
            .creator
            .as_ref()
            .is_some_and(|c| !c.username.is_empty())
        {
            0.05
        } else {
            0.0
        },
    );

    factors.insert(
        "media",
        if recipe.thumbnail_url.is_some() || recipe.video_url.is_some() {
            0.05
        } else {
            0.0
        },
    );

    factors.insert(
        "engagement",
        if recipe.engagement.any_present() { 0.05 } else { 0.0 },
    );

    factors.insert(
        "cook_time",
        if recipe.cook_time_minutes.is_some_and(|m| m > 0) {
            0.05
        } else {
            0.0
        },
    );

    let total: f64 = factors.values().sum();
    let score = (total.min(1.0) * 1000.0).round() / 1000.0;

    let filled = factors.values().filter(|v| **v > 0.0).count();
    let status = if filled >= MIN_COMPLETE_FACTORS {
        QualityStatus::Complete
    } else {
        QualityStatus::Incomplete
    };

    QualityReport {
        score,
        status,
        factors,
        warnings,
    }
}

/// Split recipes into those at or above the quality threshold and those
/// below it. Tolerates arbitrarily sparse recipes; nothing here panics.
pub fn filter_quality(recipes: Vec<Recipe>, min_score: f64) -> (Vec<Recipe>, Vec<Recipe>) {
    let mut passed = Vec::new();
    let mut failed = Vec::new();
    for recipe in recipes {
        let report = score_recipe(&recipe);
        if report.score >= min_score {
            passed.push(recipe);
        } else {
            tracing::debug!(
                title = %recipe.title,
                score = report.score,
                "quality filter rejected recipe"
            );
            failed.push(recipe);
        }
    }
    (passed, failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Creator, Engagement, Nutrition, Platform, Recipe};

    fn empty_recipe() -> Recipe {
        Recipe::new("", Platform::Youtube, "")
    }

    fn full_recipe() -> Recipe {
        let mut recipe = Recipe::new(
            "High Protein Breakfast Burrito",
            Platform::Youtube,
            "https://youtube.com/watch?v=abc123",
        );
        recipe.description = Some("A filling high-protein breakfast burrito.".to_string());
        recipe.ingredients = vec![
            "2 eggs".into(),
            "1 tortilla".into(),
            "50g chicken breast".into(),
        ];
        recipe.steps = vec![
            "Scramble the eggs over medium heat.".into(),
            "Warm the tortilla and assemble.".into(),
        ];
        recipe.nutrition = Some(Nutrition {
            calories: Some(450.0),
            protein_g: Some(35.0),
            carbs_g: Some(28.0),
            fat_g: Some(22.0),
            ..Nutrition::default()
        });
        recipe.tags = vec!["high-protein".into(), "breakfast".into()];
        recipe.creator = Some(Creator {
            username: "fitcook".into(),
            platform: Platform::Youtube,
            profile_url: None,
            follower_count: Some(120_000),
        });
        recipe.thumbnail_url = Some("https://img.youtube.com/vi/abc123/hq.jpg".into());
        recipe.engagement = Engagement {
            views: Some(50_000),
            likes: Some(2_000),
            ..Engagement::default()
        };
        recipe.cook_time_minutes = Some(15);
        recipe
    }

    #[test]
    fn test_score_bounds() {
        for recipe in [empty_recipe(), full_recipe()] {
            let report = score_recipe(&recipe);
            assert!((0.0..=1.0).contains(&report.score));
        }
    }

    #[test]
    fn test_empty_recipe_scores_near_zero_and_incomplete() {
        let report = score_recipe(&empty_recipe());
        assert!(report.score < 0.1);
        assert_eq!(report.status, QualityStatus::Incomplete);
    }

    #[test]
    fn test_full_recipe_scores_high_and_complete() {
        let report = score_recipe(&full_recipe());
        assert!(report.score >= 0.8, "score was {}", report.score);
        assert_eq!(report.status, QualityStatus::Complete);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_out_of_range_nutrition_zeroes_bonus_with_warning() {
        let mut recipe = full_recipe();
        recipe.nutrition = Some(Nutrition {
            calories: Some(5000.0),
            protein_g: Some(35.0),
            carbs_g: Some(28.0),
            fat_g: Some(22.0),
            ..Nutrition::default()
        });
        let report = score_recipe(&recipe);
        assert_eq!(report.factors["nutrition_valid"], 0.0);
        assert_eq!(report.factors["nutrition_present"], 0.15);
        assert!(!report.warnings.is_empty());
    }

    #[test]
    fn test_partial_macros_count_as_no_nutrition() {
        let mut recipe = full_recipe();
        recipe.nutrition = Some(Nutrition {
            calories: Some(450.0),
            ..Nutrition::default()
        });
        let report = score_recipe(&recipe);
        assert_eq!(report.factors["nutrition_present"], 0.0);
    }

    #[test]
    fn test_filter_quality_partitions() {
        let (passed, failed) = filter_quality(vec![full_recipe(), empty_recipe()], 0.4);
        assert_eq!(passed.len(), 1);
        assert_eq!(failed.len(), 1);
        assert_eq!(passed[0].title, "High Protein Breakfast Burrito");
    }
}
