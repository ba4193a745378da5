//! Cross-platform duplicate detection.
//!
//! The same dish gets posted to several platforms with near-identical titles
//! and macros. Duplicates are matched on normalized title similarity, with a
//! secondary macro-proximity check for looser title matches, and the more
//! complete version of a matched pair is kept.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;

use crate::types::{Platform, Recipe};

/// Filler words and phrases stripped from titles before comparison.
const STOP_PHRASES: &[&str] = &[
    "how to make",
    "the best",
    "homemade",
    "recipe",
    "easy",
    "quick",
    "my",
];

static STOP_PHRASE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(r"\b(?:{})\b", STOP_PHRASES.join("|"));
    Regex::new(&pattern).expect("Invalid stop-phrase regex")
});

static PUNCTUATION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("Invalid punctuation regex"));

static WHITESPACE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// Normalize a recipe title for comparison: lowercase, strip punctuation,
/// drop stop phrases, collapse whitespace. Idempotent.
pub fn normalize_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = PUNCTUATION_REGEX.replace_all(&lowered, "");
    let mut current = WHITESPACE_REGEX
        .replace_all(stripped.trim(), " ")
        .into_owned();

    // Removing a phrase can expose another ("how to quick make" -> "how to
    // make"), so strip until stable.
    loop {
        let removed = STOP_PHRASE_REGEX.replace_all(&current, " ");
        let collapsed = WHITESPACE_REGEX
            .replace_all(removed.trim(), " ")
            .trim()
            .to_string();
        if collapsed == current {
            return collapsed;
        }
        current = collapsed;
    }
}

/// Normalized title similarity in [0.0, 1.0].
///
/// 1.0 for identical normalized titles, 0.0 if either side normalizes to
/// nothing (all filler).
pub fn title_similarity(a: &str, b: &str) -> f64 {
    let na = normalize_title(a);
    let nb = normalize_title(b);
    if na.is_empty() || nb.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(&na, &nb)
}

/// Thresholds for duplicate detection. The values are tuned, not derived;
/// adjust here rather than inline.
#[derive(Debug, Clone)]
pub struct DedupConfig {
    /// Title similarity at or above this is a duplicate on its own.
    pub title_threshold: f64,
    /// Title similarity at or above this is a duplicate when macros also
    /// match within tolerance.
    pub near_title_threshold: f64,
    /// Calorie delta considered "the same dish".
    pub calorie_tolerance: f64,
    /// Protein delta (grams) considered "the same dish".
    pub protein_tolerance: f64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            title_threshold: 0.80,
            near_title_threshold: 0.60,
            calorie_tolerance: 50.0,
            protein_tolerance: 5.0,
        }
    }
}

/// Which version of a matched pair survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeptVersion {
    New,
    Existing,
}

/// Result of a single duplicate check.
#[derive(Debug, Clone, Serialize)]
pub struct DedupDecision {
    pub is_duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_id: Option<String>,
    pub similarity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kept: Option<KeptVersion>,
}

impl DedupDecision {
    fn unique() -> Self {
        Self {
            is_duplicate: false,
            matched_id: None,
            similarity: 0.0,
            reason: None,
            kept: None,
        }
    }
}

/// One recorded duplicate decision.
#[derive(Debug, Clone, Serialize)]
pub struct DedupLogEntry {
    pub timestamp: DateTime<Utc>,
    pub new_title: String,
    pub new_platform: Platform,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub similarity: f64,
    pub kept: Option<KeptVersion>,
}

/// Run-scoped record of every dedup decision, with aggregate counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DedupLog {
    pub entries: Vec<DedupLogEntry>,
    pub total_checked: usize,
    pub duplicates_found: usize,
    pub duplicates_replaced: usize,
    pub duplicates_skipped: usize,
}

impl DedupLog {
    fn record(&mut self, recipe: &Recipe, decision: &DedupDecision) {
        self.total_checked += 1;
        if !decision.is_duplicate {
            return;
        }
        self.duplicates_found += 1;
        match decision.kept {
            Some(KeptVersion::New) => self.duplicates_replaced += 1,
            _ => self.duplicates_skipped += 1,
        }
        self.entries.push(DedupLogEntry {
            timestamp: Utc::now(),
            new_title: recipe.title.clone(),
            new_platform: recipe.platform,
            matched_id: decision.matched_id.clone(),
            reason: decision.reason.clone(),
            similarity: (decision.similarity * 1000.0).round() / 1000.0,
            kept: decision.kept,
        });
    }
}

/// How many structural fields a recipe has populated. Used to pick the
/// better version of a duplicate pair.
fn completeness(recipe: &Recipe) -> usize {
    let mut score = recipe.ingredients.len() + recipe.steps.len();
    if recipe.nutrition.is_some() {
        score += 3;
    }
    if recipe.description.as_deref().is_some_and(|d| !d.is_empty()) {
        score += 1;
    }
    if recipe.thumbnail_url.is_some() {
        score += 1;
    }
    if !recipe.tags.is_empty() {
        score += 1;
    }
    score
}

fn macros_similar(a: &Recipe, b: &Recipe, config: &DedupConfig) -> bool {
    match (a.macros(), b.macros()) {
        (Some(ma), Some(mb)) => {
            (ma.calories - mb.calories).abs() <= config.calorie_tolerance
                && (ma.protein_g - mb.protein_g).abs() <= config.protein_tolerance
        }
        _ => false,
    }
}

/// Ties keep the already-accepted version.
fn pick_best(new: &Recipe, existing: &Recipe) -> KeptVersion {
    if completeness(new) > completeness(existing) {
        KeptVersion::New
    } else {
        KeptVersion::Existing
    }
}

/// Cross-platform duplicate detection engine with a run-scoped decision log.
#[derive(Debug)]
pub struct Deduplicator {
    config: DedupConfig,
    log: DedupLog,
}

impl Deduplicator {
    pub fn new(config: DedupConfig) -> Self {
        Self {
            config,
            log: DedupLog::default(),
        }
    }

    pub fn log(&self) -> &DedupLog {
        &self.log
    }

    /// Check one recipe against a pool of already-accepted recipes.
    pub fn check(&mut self, new: &Recipe, existing: &[Recipe]) -> DedupDecision {
        for candidate in existing {
            let similarity = title_similarity(&new.title, &candidate.title);

            let strong_title = similarity >= self.config.title_threshold;
            let near_title_with_macros = similarity >= self.config.near_title_threshold
                && macros_similar(new, candidate, &self.config);

            if strong_title || near_title_with_macros {
                let reason = if strong_title {
                    format!("title_similarity={:.2}", similarity)
                } else {
                    format!("title_similarity={:.2}+macro_match", similarity)
                };
                let decision = DedupDecision {
                    is_duplicate: true,
                    matched_id: Some(candidate.id.clone()),
                    similarity,
                    reason: Some(reason),
                    kept: Some(pick_best(new, candidate)),
                };
                self.log.record(new, &decision);
                return decision;
            }
        }

        let decision = DedupDecision::unique();
        self.log.record(new, &decision);
        decision
    }

    /// Deduplicate a batch in arrival order against the accepted set so far.
    ///
    /// A later, more complete duplicate replaces the version accepted
    /// earlier in the same batch.
    pub fn deduplicate_batch(&mut self, recipes: Vec<Recipe>) -> Vec<Recipe> {
        let mut accepted: Vec<Recipe> = Vec::new();
        for recipe in recipes {
            let decision = self.check(&recipe, &accepted);
            if !decision.is_duplicate {
                accepted.push(recipe);
            } else if decision.kept == Some(KeptVersion::New) {
                if let Some(matched_id) = &decision.matched_id {
                    accepted.retain(|r| &r.id != matched_id);
                }
                accepted.push(recipe);
            }
        }
        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Nutrition;

    fn recipe(title: &str) -> Recipe {
        Recipe::new(title, Platform::Tiktok, format!("https://example.com/{title}"))
    }

    #[test]
    fn test_normalize_strips_stop_phrases() {
        assert_eq!(
            normalize_title("The BEST Easy Homemade Chicken Curry Recipe!"),
            "chicken curry"
        );
        assert_eq!(normalize_title("How To Make Protein Pancakes"), "protein pancakes");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for title in [
            "The Best Easy Chicken Rice Bowl Recipe",
            "how to quick make pasta",
            "Creamy Garlic Shrimp!!",
            "",
            "Recipe Recipe Recipe",
        ] {
            let once = normalize_title(title);
            assert_eq!(normalize_title(&once), once, "not idempotent for {title:?}");
        }
    }

    #[test]
    fn test_normalize_keeps_word_interiors() {
        // "my" appears inside "creamy"; boundary matching must not mangle it.
        assert_eq!(normalize_title("Creamy Chicken"), "creamy chicken");
    }

    #[test]
    fn test_similarity_identity_and_symmetry() {
        assert_eq!(title_similarity("Chicken Rice Bowl", "Chicken Rice Bowl"), 1.0);
        let ab = title_similarity("Chicken Rice Bowl", "Chicken and Rice Bowl");
        let ba = title_similarity("Chicken and Rice Bowl", "Chicken Rice Bowl");
        assert_eq!(ab, ba);
        assert!(ab > 0.0 && ab <= 1.0);
    }

    #[test]
    fn test_similarity_empty_after_normalization() {
        assert_eq!(title_similarity("Easy Recipe", "Chicken Bowl"), 0.0);
    }

    #[test]
    fn test_identical_normalized_titles_are_duplicates() {
        let mut dedup = Deduplicator::new(DedupConfig::default());
        let a = recipe("Easy Chicken Rice Bowl");
        let b = recipe("Chicken Rice Bowl Recipe");
        let decision = dedup.check(&b, std::slice::from_ref(&a));
        assert!(decision.is_duplicate);
        assert_eq!(decision.similarity, 1.0);
        assert_eq!(decision.matched_id.as_deref(), Some(a.id.as_str()));
    }

    #[test]
    fn test_near_title_requires_macro_match() {
        let mut dedup = Deduplicator::new(DedupConfig::default());

        let mut a = recipe("Salmon Rice Bowl");
        a.nutrition = Some(Nutrition {
            calories: Some(500.0),
            protein_g: Some(40.0),
            carbs_g: Some(45.0),
            fat_g: Some(15.0),
            ..Nutrition::default()
        });
        let mut b = recipe("Chicken Rice Bowl");
        b.nutrition = a.nutrition.clone();

        let sim = title_similarity(&a.title, &b.title);
        assert!(sim >= 0.60 && sim < 0.80, "fixture drifted: sim={sim}");

        let decision = dedup.check(&b, std::slice::from_ref(&a));
        assert!(decision.is_duplicate);
        assert!(decision.reason.unwrap().contains("macro_match"));

        // Same titles, macros far apart: not a duplicate.
        let mut c = b.clone();
        c.id = "other".to_string();
        c.nutrition = Some(Nutrition {
            calories: Some(900.0),
            protein_g: Some(10.0),
            carbs_g: Some(100.0),
            fat_g: Some(40.0),
            ..Nutrition::default()
        });
        let decision = dedup.check(&c, std::slice::from_ref(&a));
        assert!(!decision.is_duplicate);
    }

    #[test]
    fn test_more_complete_version_wins_either_order() {
        let sparse = recipe("Chicken Rice Bowl");
        let mut full = recipe("Chicken Rice Bowl");
        full.ingredients = vec![
            "chicken breast".into(),
            "rice".into(),
            "broccoli".into(),
            "soy sauce".into(),
            "sesame oil".into(),
            "garlic".into(),
        ];
        full.steps = vec![
            "Cook the rice according to package directions.".into(),
            "Pan-sear the chicken until cooked through.".into(),
            "Combine everything in a bowl and season.".into(),
        ];
        full.nutrition = Some(Nutrition {
            calories: Some(520.0),
            protein_g: Some(45.0),
            carbs_g: Some(50.0),
            fat_g: Some(14.0),
            ..Nutrition::default()
        });

        // Sparse first, full second: full replaces it.
        let mut dedup = Deduplicator::new(DedupConfig::default());
        let survivors = dedup.deduplicate_batch(vec![sparse.clone(), full.clone()]);
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].id, full.id);
        assert_eq!(dedup.log().duplicates_replaced, 1);

        // Full first, sparse second: sparse is skipped.
        let mut dedup = Deduplicator::new(DedupConfig::default());
        let survivors = dedup.deduplicate_batch(vec![full.clone(), sparse.clone()]);
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].id, full.id);
        assert_eq!(dedup.log().duplicates_skipped, 1);
    }

    #[test]
    fn test_exact_completeness_tie_keeps_existing() {
        let first = recipe("Chicken Rice Bowl");
        let second = recipe("Chicken Rice Bowl");
        let mut dedup = Deduplicator::new(DedupConfig::default());
        let survivors = dedup.deduplicate_batch(vec![first.clone(), second]);
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].id, first.id);
    }

    #[test]
    fn test_log_counters_add_up() {
        let mut dedup = Deduplicator::new(DedupConfig::default());
        let survivors = dedup.deduplicate_batch(vec![
            recipe("Chicken Rice Bowl"),
            recipe("Chicken Rice Bowl"),
            recipe("Pasta Salad"),
        ]);
        assert_eq!(survivors.len(), 2);
        let log = dedup.log();
        assert_eq!(log.total_checked, 3);
        assert_eq!(log.duplicates_found, 1);
        assert_eq!(
            log.duplicates_found,
            log.duplicates_replaced + log.duplicates_skipped
        );
        assert_eq!(log.entries.len(), 1);
    }
}
