//! Favorite service.

use foodbook_common::{AppError, AppResult, IdGenerator};
use foodbook_db::{
    entities::favorite,
    repositories::{FavoriteRepository, RecipeRepository},
};
use sea_orm::Set;

/// Favorite service for business logic.
#[derive(Clone)]
pub struct FavoriteService {
    favorite_repo: FavoriteRepository,
    recipe_repo: RecipeRepository,
    id_gen: IdGenerator,
}

impl FavoriteService {
    /// Create a new favorite service.
    #[must_use]
    pub fn new(favorite_repo: FavoriteRepository, recipe_repo: RecipeRepository) -> Self {
        Self {
            favorite_repo,
            recipe_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Add a recipe to a user's favorites.
    pub async fn add(&self, user_id: &str, recipe_id: &str) -> AppResult<favorite::Model> {
        let recipe = self.recipe_repo.get_by_id(recipe_id).await?;

        if self.favorite_repo.is_favorited(user_id, recipe_id).await? {
            return Err(AppError::Conflict(
                "recipe is already in favorites".to_string(),
            ));
        }

        let created = self
            .favorite_repo
            .create(favorite::ActiveModel {
                id: Set(self.id_gen.generate()),
                user_id: Set(user_id.to_string()),
                recipe_id: Set(recipe.id),
                created_at: Set(chrono::Utc::now().into()),
            })
            .await?;

        tracing::debug!(user_id = %user_id, recipe_id = %recipe_id, "Recipe favorited");

        Ok(created)
    }

    /// Remove a recipe from a user's favorites.
    pub async fn remove(&self, user_id: &str, recipe_id: &str) -> AppResult<()> {
        if !self.favorite_repo.is_favorited(user_id, recipe_id).await? {
            return Err(AppError::Conflict("recipe is not in favorites".to_string()));
        }

        self.favorite_repo
            .delete_by_user_and_recipe(user_id, recipe_id)
            .await
    }

    /// Whether the user has favorited the recipe.
    pub async fn is_favorited(&self, user_id: &str, recipe_id: &str) -> AppResult<bool> {
        self.favorite_repo.is_favorited(user_id, recipe_id).await
    }
}
