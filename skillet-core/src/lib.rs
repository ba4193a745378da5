pub mod config;
pub mod dedup;
pub mod discover;
pub mod error;
pub mod extract;
pub mod harvest;
pub mod llm;
pub mod quality;
pub mod store;
pub mod types;
pub mod validate;
pub mod viral;

pub use config::HarvestConfig;
pub use dedup::{
    normalize_title, title_similarity, DedupConfig, DedupDecision, DedupLog, Deduplicator,
    KeptVersion,
};
pub use discover::{Discovery, MockDiscovery};
pub use error::{DiscoveryError, ExtractError, HarvestError, StoreError};
pub use extract::{AiExtractor, LocalExtractor, RecipeExtractor};
pub use harvest::{HarvestOrchestrator, HarvestRun, RunStatus};
pub use llm::{create_provider_from_env, ClaudeProvider, FakeProvider, LlmError, LlmProvider};
pub use quality::{filter_quality, score_recipe, QualityReport, QualityStatus};
pub use store::{MemoryStore, RecipeStore};
pub use types::{
    Creator, DiscoveryQuery, Engagement, Macros, Nutrition, Platform, RawCandidate, Recipe,
};
pub use validate::{validate_recipe, RejectReason, ValidationResult};
pub use viral::{compute_viral_score, health_score, score_and_rank};
