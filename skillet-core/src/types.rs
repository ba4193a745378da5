//! Core data model for the harvest pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content platforms we harvest from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Tiktok,
    Youtube,
    Instagram,
    Reddit,
}

impl Platform {
    /// All supported platforms.
    pub const ALL: &'static [Platform] = &[
        Platform::Tiktok,
        Platform::Youtube,
        Platform::Instagram,
        Platform::Reddit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Tiktok => "tiktok",
            Platform::Youtube => "youtube",
            Platform::Instagram => "instagram",
            Platform::Reddit => "reddit",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "tiktok" => Some(Platform::Tiktok),
            "youtube" => Some(Platform::Youtube),
            "instagram" => Some(Platform::Instagram),
            "reddit" => Some(Platform::Reddit),
            _ => None,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engagement counts from the source platform.
///
/// Every metric is optional: platforms expose different subsets, and "not
/// reported" must stay distinguishable from zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shares: Option<u64>,
    /// Save/bookmark count. Not exposed by every platform; the ranking
    /// score proxies it from shares on Reddit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saves: Option<u64>,
}

impl Engagement {
    /// True if at least one metric was reported.
    pub fn any_present(&self) -> bool {
        self.views.is_some()
            || self.likes.is_some()
            || self.comments.is_some()
            || self.shares.is_some()
            || self.saves.is_some()
    }
}

/// The account a recipe was sourced from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub username: String,
    pub platform: Platform,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follower_count: Option<u64>,
}

/// All four macros, guaranteed present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Macros {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

/// Nutrition facts as extracted.
///
/// Each macro is optional because extraction routinely recovers only some of
/// them; downstream code asks for [`Nutrition::macros`] and treats a partial
/// set as "nutrition unknown" rather than guessing at the gaps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein_g: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbs_g: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fat_g: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sugar_g: Option<f64>,
    #[serde(default = "default_servings")]
    pub servings: u32,
}

fn default_servings() -> u32 {
    1
}

fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl Nutrition {
    /// Returns the complete macro set, or `None` if any macro is missing.
    pub fn macros(&self) -> Option<Macros> {
        Some(Macros {
            calories: self.calories?,
            protein_g: self.protein_g?,
            carbs_g: self.carbs_g?,
            fat_g: self.fat_g?,
        })
    }
}

/// A structured recipe produced by extraction.
///
/// `source_url` is the canonical identity key: the store upserts on it, and
/// at most one stored recipe may carry a given source URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(default = "generate_id")]
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<Creator>,
    pub platform: Platform,
    pub source_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<Nutrition>,
    #[serde(default)]
    pub engagement: Engagement,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cook_time_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    /// Computed 0-100 ranking score; assigned during the rank stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virality_score: Option<f64>,
    #[serde(default = "Utc::now")]
    pub scraped_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl Recipe {
    /// A recipe with identity fields set and everything else empty.
    pub fn new(title: impl Into<String>, platform: Platform, source_url: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            title: title.into(),
            description: None,
            creator: None,
            platform,
            source_url: source_url.into(),
            thumbnail_url: None,
            video_url: None,
            ingredients: Vec::new(),
            steps: Vec::new(),
            nutrition: None,
            engagement: Engagement::default(),
            tags: Vec::new(),
            cook_time_minutes: None,
            difficulty: None,
            virality_score: None,
            scraped_at: Utc::now(),
            published_at: None,
        }
    }

    /// Complete macro set, if nutrition was extracted in full.
    pub fn macros(&self) -> Option<Macros> {
        self.nutrition.as_ref().and_then(Nutrition::macros)
    }
}

/// A raw post candidate produced by a discovery collaborator.
///
/// This is the typed boundary between platform scraping and the pipeline:
/// discovery validates the per-platform payload once and hands over this
/// shape, so nothing downstream touches free-form platform data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCandidate {
    pub platform: Platform,
    /// Platform-native post/video identifier.
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_follower_count: Option<u64>,
    pub source_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub engagement: Engagement,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

/// Parameters for a discovery call.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryQuery {
    /// Maximum number of candidates to return.
    pub limit: usize,
    /// Optional hashtag filters, platform-interpreted.
    pub hashtags: Vec<String>,
    /// Optional creator handles to restrict discovery to.
    pub creators: Vec<String>,
}

impl DiscoveryQuery {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_round_trip() {
        for platform in Platform::ALL {
            assert_eq!(Platform::from_str(platform.as_str()), Some(*platform));
        }
        assert_eq!(Platform::from_str("myspace"), None);
    }

    #[test]
    fn test_macros_require_all_four() {
        let partial = Nutrition {
            calories: Some(450.0),
            protein_g: Some(35.0),
            ..Nutrition::default()
        };
        assert!(partial.macros().is_none());

        let full = Nutrition {
            calories: Some(450.0),
            protein_g: Some(35.0),
            carbs_g: Some(28.0),
            fat_g: Some(22.0),
            ..Nutrition::default()
        };
        let macros = full.macros().unwrap();
        assert_eq!(macros.protein_g, 35.0);
    }

    #[test]
    fn test_engagement_any_present() {
        assert!(!Engagement::default().any_present());
        let engagement = Engagement {
            likes: Some(0),
            ..Engagement::default()
        };
        assert!(engagement.any_present());
    }

    #[test]
    fn test_recipe_serializes_without_empty_options() {
        let recipe = Recipe::new("Protein Oats", Platform::Reddit, "https://example.com/r/1");
        let json = serde_json::to_value(&recipe).unwrap();
        assert!(json.get("description").is_none());
        assert_eq!(json["platform"], "reddit");
    }
}
