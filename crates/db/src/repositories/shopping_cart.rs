//! Shopping cart repository, including the shopping-list aggregation query.

use std::sync::Arc;

use crate::entities::{Ingredient, RecipeIngredient, ShoppingCart, recipe_ingredient, shopping_cart};
use foodbook_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter,
    QueryOrder, QuerySelect,
};

use super::insert_err;

/// One aggregated shopping-list row: an ingredient with its summed amount
/// across every recipe in the cart.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct IngredientTotal {
    /// Catalog ingredient id.
    pub ingredient_id: String,
    /// Ingredient name.
    pub name: String,
    /// Measurement unit.
    pub measurement_unit: String,
    /// Summed amount.
    pub total: i64,
}

/// Shopping cart repository for database operations.
#[derive(Clone)]
pub struct ShoppingCartRepository {
    db: Arc<DatabaseConnection>,
}

impl ShoppingCartRepository {
    /// Create a new shopping cart repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a cart entry by user and recipe.
    pub async fn find_by_user_and_recipe(
        &self,
        user_id: &str,
        recipe_id: &str,
    ) -> AppResult<Option<shopping_cart::Model>> {
        ShoppingCart::find()
            .filter(shopping_cart::Column::UserId.eq(user_id))
            .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a recipe is in the user's cart.
    pub async fn is_in_cart(&self, user_id: &str, recipe_id: &str) -> AppResult<bool> {
        Ok(self
            .find_by_user_and_recipe(user_id, recipe_id)
            .await?
            .is_some())
    }

    /// Create a new cart entry.
    pub async fn create(
        &self,
        model: shopping_cart::ActiveModel,
    ) -> AppResult<shopping_cart::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| insert_err(e, "shopping cart entry"))
    }

    /// Delete a cart entry by user and recipe.
    pub async fn delete_by_user_and_recipe(
        &self,
        user_id: &str,
        recipe_id: &str,
    ) -> AppResult<()> {
        ShoppingCart::delete_many()
            .filter(shopping_cart::Column::UserId.eq(user_id))
            .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// IDs of all recipes currently in the user's cart.
    pub async fn recipe_ids_for_user(&self, user_id: &str) -> AppResult<Vec<String>> {
        let entries = ShoppingCart::find()
            .filter(shopping_cart::Column::UserId.eq(user_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(entries.into_iter().map(|e| e.recipe_id).collect())
    }

    /// Sum the required amount per distinct ingredient across every recipe
    /// in the user's cart. Rows come back ordered by ingredient id
    /// ascending, which keeps the rendered document deterministic.
    pub async fn sum_ingredients(&self, user_id: &str) -> AppResult<Vec<IngredientTotal>> {
        let recipe_ids = self.recipe_ids_for_user(user_id).await?;
        if recipe_ids.is_empty() {
            return Ok(Vec::new());
        }

        RecipeIngredient::find()
            .select_only()
            .column(recipe_ingredient::Column::IngredientId)
            .column(crate::entities::ingredient::Column::Name)
            .column(crate::entities::ingredient::Column::MeasurementUnit)
            .column_as(recipe_ingredient::Column::Amount.sum(), "total")
            .inner_join(Ingredient)
            .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids))
            .group_by(recipe_ingredient::Column::IngredientId)
            .group_by(crate::entities::ingredient::Column::Name)
            .group_by(crate::entities::ingredient::Column::MeasurementUnit)
            .order_by_asc(recipe_ingredient::Column::IngredientId)
            .into_model::<IngredientTotal>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};

    fn create_test_entry(id: &str, user_id: &str, recipe_id: &str) -> shopping_cart::Model {
        shopping_cart::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            recipe_id: recipe_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_is_in_cart() {
        let entry = create_test_entry("sc1", "user1", "r1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[entry]])
                .into_connection(),
        );

        let repo = ShoppingCartRepository::new(db);
        assert!(repo.is_in_cart("user1", "r1").await.unwrap());
    }

    #[tokio::test]
    async fn test_sum_ingredients_empty_cart_skips_aggregation() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<shopping_cart::Model>::new()])
                .into_connection(),
        );

        let repo = ShoppingCartRepository::new(db);
        let totals = repo.sum_ingredients("user1").await.unwrap();

        assert!(totals.is_empty());
    }

    #[tokio::test]
    async fn test_sum_ingredients_returns_totals() {
        let entry = create_test_entry("sc1", "user1", "r1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![entry]])
                .append_query_results([vec![
                    btreemap! {
                        "ingredient_id" => Value::from("i1"),
                        "name" => Value::from("мука"),
                        "measurement_unit" => Value::from("г"),
                        "total" => Value::from(300i64),
                    },
                    btreemap! {
                        "ingredient_id" => Value::from("i2"),
                        "name" => Value::from("сахар"),
                        "measurement_unit" => Value::from("г"),
                        "total" => Value::from(50i64),
                    },
                ]])
                .into_connection(),
        );

        let repo = ShoppingCartRepository::new(db);
        let totals = repo.sum_ingredients("user1").await.unwrap();

        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].name, "мука");
        assert_eq!(totals[0].total, 300);
        assert_eq!(totals[1].total, 50);
    }
}
