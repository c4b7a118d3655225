//! Ingredient catalog service.

use foodbook_common::AppResult;
use foodbook_db::{entities::ingredient, repositories::IngredientRepository};

/// Ingredient service for catalog reads.
#[derive(Clone)]
pub struct IngredientService {
    ingredient_repo: IngredientRepository,
}

impl IngredientService {
    /// Create a new ingredient service.
    #[must_use]
    pub const fn new(ingredient_repo: IngredientRepository) -> Self {
        Self { ingredient_repo }
    }

    /// Get an ingredient by ID.
    pub async fn get(&self, id: &str) -> AppResult<ingredient::Model> {
        self.ingredient_repo.get_by_id(id).await
    }

    /// List ingredients, optionally filtered by name prefix.
    pub async fn list(&self, name_prefix: Option<&str>) -> AppResult<Vec<ingredient::Model>> {
        self.ingredient_repo.list(name_prefix).await
    }
}
