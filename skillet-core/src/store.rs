//! Persistence seam for harvested recipes.
//!
//! The pipeline only needs two operations: a bounded recent window for
//! corpus dedup, and an idempotent upsert keyed on `source_url`.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::types::Recipe;

#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// The most recently stored recipes, newest first.
    async fn list_recent(&self, limit: usize) -> Result<Vec<Recipe>, StoreError>;

    /// Insert or update by `source_url`. Returns the stored recipe's id,
    /// which is preserved across updates of the same source URL.
    async fn upsert(&self, recipe: &Recipe) -> Result<String, StoreError>;
}

/// In-memory store, insertion-ordered. Backs tests and file-driven CLI runs.
#[derive(Default)]
pub struct MemoryStore {
    recipes: RwLock<Vec<Recipe>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the store (corpus dedup fixtures).
    pub fn with_recipes(recipes: Vec<Recipe>) -> Self {
        Self {
            recipes: RwLock::new(recipes),
        }
    }

    pub async fn len(&self) -> usize {
        self.recipes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.recipes.read().await.is_empty()
    }

    pub async fn all(&self) -> Vec<Recipe> {
        self.recipes.read().await.clone()
    }
}

#[async_trait]
impl RecipeStore for MemoryStore {
    async fn list_recent(&self, limit: usize) -> Result<Vec<Recipe>, StoreError> {
        let recipes = self.recipes.read().await;
        Ok(recipes.iter().rev().take(limit).cloned().collect())
    }

    async fn upsert(&self, recipe: &Recipe) -> Result<String, StoreError> {
        let mut recipes = self.recipes.write().await;
        if let Some(existing) = recipes
            .iter_mut()
            .find(|r| r.source_url == recipe.source_url)
        {
            let id = existing.id.clone();
            *existing = recipe.clone();
            existing.id = id.clone();
            Ok(id)
        } else {
            recipes.push(recipe.clone());
            Ok(recipe.id.clone())
        }
    }
}
