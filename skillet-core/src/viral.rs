//! Engagement-based ranking score.
//!
//! Combines normalized engagement, recency, platform credibility, and
//! nutritional quality into a 0-100 score used to rank harvested recipes.
//! Saves are the strongest "I want to make this" signal, shares expand
//! reach, comments show depth, likes are the weakest signal.

use chrono::{DateTime, Utc};

use crate::types::{Nutrition, Platform, Recipe};

pub const W_SAVES: f64 = 0.30;
pub const W_SHARES: f64 = 0.25;
pub const W_COMMENTS: f64 = 0.20;
pub const W_LIKES: f64 = 0.15;
pub const W_RECENCY: f64 = 0.10;

/// Days over which recency decays linearly from 1.0 to 0.0.
pub const RECENCY_WINDOW_DAYS: f64 = 30.0;

/// Calibration constant mapping fractional engagement rates onto the 0-100
/// display range. A viral save rate is a few percent, so raw combined rates
/// land well below 1.0; this stretch puts a ~3% save rate with good health
/// in the 80+ band. Tune here, not inline.
pub const SCALE_FACTOR: f64 = 500.0;

/// Divisor for the log10 fallback: normalizes absolute counts assuming
/// ~100M engagements as the ceiling.
const LOG_NORM_DIVISOR: f64 = 8.0;

/// Normalize an engagement metric to an engagement rate in [0.0, 1.0].
///
/// With a known follower count this is metric/followers capped at 1.0.
/// Without one, falls back to log-scaled absolute counts so mega-accounts
/// of unknown size don't saturate the score.
fn normalize_engagement(metric: Option<u64>, follower_count: Option<u64>) -> f64 {
    let metric = match metric {
        Some(m) if m > 0 => m as f64,
        _ => return 0.0,
    };

    match follower_count {
        Some(followers) if followers > 0 => (metric / followers as f64).min(1.0),
        _ => (metric.log10() / LOG_NORM_DIVISOR).min(1.0),
    }
}

/// Recency boost: 1.0 for today, linear decay to 0.0 at the window edge.
/// Unknown publish date is neutral; a future timestamp (clock skew) counts
/// as brand new.
fn recency_boost(published_at: Option<DateTime<Utc>>) -> f64 {
    let Some(published_at) = published_at else {
        return 0.5;
    };

    let days_old = (Utc::now() - published_at).num_seconds() as f64 / 86_400.0;
    if days_old < 0.0 {
        return 1.0;
    }
    (1.0 - days_old / RECENCY_WINDOW_DAYS).max(0.0)
}

/// Platform credibility multiplier; short-form recipe content indexes
/// highest for virality on TikTok.
fn platform_weight(platform: Platform) -> f64 {
    match platform {
        Platform::Tiktok => 1.0,
        Platform::Youtube => 0.9,
        Platform::Instagram => 0.85,
        Platform::Reddit => 0.75,
    }
}

/// Score 0.0-1.0 from nutritional quality; incomplete macros are neutral.
///
/// Rewards protein-dense food (ratio and absolute grams), reasonable
/// per-serving calories, and penalizes high sugar.
pub fn health_score(nutrition: Option<&Nutrition>) -> f64 {
    let Some(nutrition) = nutrition else {
        return 0.5;
    };
    let Some(macros) = nutrition.macros() else {
        return 0.5;
    };

    let mut score: f64 = 0.5;

    let calories = macros.calories.max(1.0);
    let protein = macros.protein_g;

    // Protein-to-calorie ratio (protein has 4 cal/g); 0.25+ is ideal
    let protein_cal_ratio = (protein * 4.0) / calories;
    if protein_cal_ratio >= 0.25 {
        score += 0.25;
    } else if protein_cal_ratio >= 0.15 {
        score += 0.15;
    } else {
        score += protein_cal_ratio * 0.6;
    }

    // Absolute protein bonus
    if protein >= 30.0 {
        score += 0.15;
    } else if protein >= 20.0 {
        score += 0.10;
    }

    // Per-serving calorie bonus
    let per_serving = calories / f64::from(nutrition.servings.max(1));
    if per_serving <= 400.0 {
        score += 0.10;
    } else if per_serving <= 600.0 {
        score += 0.05;
    }

    // Sugar penalty
    if nutrition.sugar_g.is_some_and(|sugar| sugar > 20.0) {
        score -= 0.10;
    }

    score.clamp(0.0, 1.0)
}

/// Compute the 0-100 ranking score for a recipe, rounded to one decimal.
pub fn compute_viral_score(recipe: &Recipe) -> f64 {
    let follower_count = recipe.creator.as_ref().and_then(|c| c.follower_count);

    // Platforms without a native save count (Reddit) proxy it from shares.
    let saves_metric = recipe.engagement.saves.or_else(|| {
        if recipe.platform == Platform::Reddit {
            recipe.engagement.shares
        } else {
            None
        }
    });

    let saves = normalize_engagement(saves_metric, follower_count);
    let shares = normalize_engagement(recipe.engagement.shares, follower_count);
    let comments = normalize_engagement(recipe.engagement.comments, follower_count);
    let likes = normalize_engagement(recipe.engagement.likes, follower_count);
    let recency = recency_boost(recipe.published_at);

    let engagement = W_SAVES * saves
        + W_SHARES * shares
        + W_COMMENTS * comments
        + W_LIKES * likes
        + W_RECENCY * recency;

    let health = health_score(recipe.nutrition.as_ref());

    // Health modulates rather than gates: a zero health score still leaves
    // half the engagement signal.
    let raw = engagement * platform_weight(recipe.platform) * (0.5 + 0.5 * health);

    let scaled = (raw * SCALE_FACTOR).clamp(0.0, 100.0);
    (scaled * 10.0).round() / 10.0
}

/// Assign a score to every recipe and return them sorted best-first.
/// The sort is stable, so equal scores keep their input order.
pub fn score_and_rank(mut recipes: Vec<Recipe>) -> Vec<Recipe> {
    for recipe in &mut recipes {
        recipe.virality_score = Some(compute_viral_score(recipe));
    }
    recipes.sort_by(|a, b| {
        b.virality_score
            .unwrap_or(0.0)
            .total_cmp(&a.virality_score.unwrap_or(0.0))
    });
    recipes
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::types::{Creator, Engagement, Recipe};

    fn recipe(platform: Platform) -> Recipe {
        Recipe::new("Protein Ice Cream", platform, "https://example.com/p/1")
    }

    #[test]
    fn test_score_bounds() {
        let mut viral = recipe(Platform::Tiktok);
        viral.engagement = Engagement {
            views: Some(10_000_000),
            likes: Some(1_000_000),
            comments: Some(100_000),
            shares: Some(100_000),
            saves: Some(500_000),
        };
        viral.published_at = Some(Utc::now());
        for r in [recipe(Platform::Reddit), viral] {
            let score = compute_viral_score(&r);
            assert!((0.0..=100.0).contains(&score), "score was {score}");
        }
    }

    #[test]
    fn test_stale_post_with_no_engagement_scores_low() {
        let mut r = recipe(Platform::Tiktok);
        r.published_at = Some(Utc::now() - Duration::days(60));
        let score = compute_viral_score(&r);
        assert!(score < 20.0, "score was {score}");
    }

    #[test]
    fn test_huge_absolute_counts_score_high() {
        let mut r = recipe(Platform::Tiktok);
        r.engagement = Engagement {
            views: Some(10_000_000),
            likes: Some(1_000_000),
            comments: Some(100_000),
            shares: Some(100_000),
            saves: None,
        };
        let score = compute_viral_score(&r);
        assert!(score > 50.0, "score was {score}");
    }

    #[test]
    fn test_platform_ordering_tiktok_above_reddit() {
        let engagement = Engagement {
            views: Some(500_000),
            likes: Some(40_000),
            comments: Some(2_000),
            shares: Some(1_500),
            saves: Some(3_000),
        };
        let mut tiktok = recipe(Platform::Tiktok);
        tiktok.engagement = engagement.clone();
        let mut reddit = recipe(Platform::Reddit);
        reddit.engagement = engagement;

        assert!(compute_viral_score(&tiktok) > compute_viral_score(&reddit));
    }

    #[test]
    fn test_follower_rate_caps_at_one() {
        let mut r = recipe(Platform::Tiktok);
        r.creator = Some(Creator {
            username: "tinyaccount".into(),
            platform: Platform::Tiktok,
            profile_url: None,
            follower_count: Some(10),
        });
        r.engagement = Engagement {
            saves: Some(1_000_000),
            ..Engagement::default()
        };
        // saves rate capped at 1.0: engagement = 0.30 + 0.10 * 0.5 recency
        let score = compute_viral_score(&r);
        assert!(score <= 100.0);
        assert!(score > 50.0);
    }

    #[test]
    fn test_future_publish_date_counts_as_new() {
        let mut r = recipe(Platform::Tiktok);
        r.published_at = Some(Utc::now() + Duration::days(2));
        let mut stale = recipe(Platform::Tiktok);
        stale.published_at = Some(Utc::now() - Duration::days(29));
        assert!(compute_viral_score(&r) > compute_viral_score(&stale));
    }

    #[test]
    fn test_health_score_neutral_without_macros() {
        assert_eq!(health_score(None), 0.5);
        let partial = Nutrition {
            calories: Some(400.0),
            ..Nutrition::default()
        };
        assert_eq!(health_score(Some(&partial)), 0.5);
    }

    #[test]
    fn test_health_score_rewards_protein_density() {
        let lean = Nutrition {
            calories: Some(400.0),
            protein_g: Some(40.0),
            carbs_g: Some(30.0),
            fat_g: Some(10.0),
            ..Nutrition::default()
        };
        let heavy = Nutrition {
            calories: Some(1200.0),
            protein_g: Some(10.0),
            carbs_g: Some(150.0),
            fat_g: Some(50.0),
            ..Nutrition::default()
        };
        assert!(health_score(Some(&lean)) > health_score(Some(&heavy)));
    }

    #[test]
    fn test_sugar_penalty() {
        let base = Nutrition {
            calories: Some(400.0),
            protein_g: Some(30.0),
            carbs_g: Some(40.0),
            fat_g: Some(10.0),
            ..Nutrition::default()
        };
        let mut sugary = base.clone();
        sugary.sugar_g = Some(35.0);
        assert!(health_score(Some(&sugary)) < health_score(Some(&base)));
    }

    #[test]
    fn test_rank_is_descending_and_assigns_scores() {
        let mut viral = recipe(Platform::Tiktok);
        viral.engagement = Engagement {
            likes: Some(1_000_000),
            shares: Some(100_000),
            comments: Some(100_000),
            ..Engagement::default()
        };
        let quiet = Recipe::new("Plain Oatmeal", Platform::Reddit, "https://example.com/p/2");

        let ranked = score_and_rank(vec![quiet, viral]);
        assert_eq!(ranked[0].title, "Protein Ice Cream");
        let scores: Vec<f64> = ranked
            .iter()
            .map(|r| r.virality_score.unwrap())
            .collect();
        assert!(scores[0] >= scores[1]);
        assert!(ranked.iter().all(|r| r.virality_score.is_some()));
    }
}
