//! Recipe repository.
//!
//! A recipe is persisted together with its tag links and its
//! ingredient-amount links as one transactional unit.

use std::sync::Arc;

use crate::entities::{
    Ingredient, Recipe, RecipeIngredient, RecipeTag, Tag, ingredient, recipe, recipe_ingredient,
    recipe_tag, tag,
};
use foodbook_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};

use super::insert_err;

/// An ingredient row of a recipe, with its required amount.
#[derive(Debug, Clone)]
pub struct RecipeIngredientRow {
    /// The catalog ingredient.
    pub ingredient: ingredient::Model,
    /// Required amount of the ingredient.
    pub amount: i32,
}

/// Recipe repository for database operations.
#[derive(Clone)]
pub struct RecipeRepository {
    db: Arc<DatabaseConnection>,
}

impl RecipeRepository {
    /// Create a new recipe repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a recipe by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<recipe::Model>> {
        Recipe::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a recipe by ID, failing if absent.
    pub async fn get_by_id(&self, id: &str) -> AppResult<recipe::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::RecipeNotFound(id.to_string()))
    }

    /// List recipes newest first, optionally filtered by author.
    pub async fn find_page(
        &self,
        limit: u64,
        offset: u64,
        author_id: Option<&str>,
    ) -> AppResult<Vec<recipe::Model>> {
        let mut query = Recipe::find()
            .order_by_desc(recipe::Column::Id)
            .limit(limit)
            .offset(offset);

        if let Some(author) = author_id {
            query = query.filter(recipe::Column::AuthorId.eq(author));
        }

        query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find all recipes by an author, newest first.
    pub async fn find_by_author(&self, author_id: &str) -> AppResult<Vec<recipe::Model>> {
        Recipe::find()
            .filter(recipe::Column::AuthorId.eq(author_id))
            .order_by_desc(recipe::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count recipes by an author.
    pub async fn count_by_author(&self, author_id: &str) -> AppResult<u64> {
        Recipe::find()
            .filter(recipe::Column::AuthorId.eq(author_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Persist a new recipe with its tag and ingredient links in one
    /// transaction, so a failed link insert never leaves a bare recipe row.
    pub async fn create_graph(
        &self,
        recipe: recipe::ActiveModel,
        tags: Vec<recipe_tag::ActiveModel>,
        ingredients: Vec<recipe_ingredient::ActiveModel>,
    ) -> AppResult<recipe::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let created = recipe
            .insert(&txn)
            .await
            .map_err(|e| insert_err(e, "recipe"))?;

        if !tags.is_empty() {
            RecipeTag::insert_many(tags)
                .exec(&txn)
                .await
                .map_err(|e| insert_err(e, "recipe tag link"))?;
        }

        if !ingredients.is_empty() {
            RecipeIngredient::insert_many(ingredients)
                .exec(&txn)
                .await
                .map_err(|e| insert_err(e, "recipe ingredient link"))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(created)
    }

    /// Apply a recipe update in one transaction.
    ///
    /// `tags` and `ingredients`, when supplied, fully replace the existing
    /// link sets; `None` leaves them untouched.
    pub async fn update_graph(
        &self,
        recipe_id: &str,
        recipe: recipe::ActiveModel,
        tags: Option<Vec<recipe_tag::ActiveModel>>,
        ingredients: Option<Vec<recipe_ingredient::ActiveModel>>,
    ) -> AppResult<recipe::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let updated = recipe
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if let Some(tag_links) = tags {
            RecipeTag::delete_many()
                .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            if !tag_links.is_empty() {
                RecipeTag::insert_many(tag_links)
                    .exec(&txn)
                    .await
                    .map_err(|e| insert_err(e, "recipe tag link"))?;
            }
        }

        if let Some(ingredient_links) = ingredients {
            RecipeIngredient::delete_many()
                .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            if !ingredient_links.is_empty() {
                RecipeIngredient::insert_many(ingredient_links)
                    .exec(&txn)
                    .await
                    .map_err(|e| insert_err(e, "recipe ingredient link"))?;
            }
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(updated)
    }

    /// Delete a recipe; link rows cascade at the storage layer.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Recipe::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Tags attached to a recipe, ordered by name.
    pub async fn tags_of(&self, recipe_id: &str) -> AppResult<Vec<tag::Model>> {
        Tag::find()
            .inner_join(RecipeTag)
            .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
            .order_by_asc(tag::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Ingredient-amount pairs of a recipe, ordered by ingredient id.
    pub async fn ingredients_of(&self, recipe_id: &str) -> AppResult<Vec<RecipeIngredientRow>> {
        let rows = RecipeIngredient::find()
            .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
            .order_by_asc(recipe_ingredient::Column::IngredientId)
            .find_also_related(Ingredient)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .filter_map(|(link, ingredient)| {
                ingredient.map(|ingredient| RecipeIngredientRow {
                    ingredient,
                    amount: link.amount,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn create_test_recipe(id: &str, author_id: &str, name: &str) -> recipe::Model {
        recipe::Model {
            id: id.to_string(),
            author_id: author_id.to_string(),
            name: name.to_string(),
            image: "/media/recipes/test.png".to_string(),
            text: "Mix and bake".to_string(),
            cooking_time: 30,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let recipe = create_test_recipe("r1", "user1", "Сырники");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[recipe.clone()]])
                .into_connection(),
        );

        let repo = RecipeRepository::new(db);
        let result = repo.find_by_id("r1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().name, "Сырники");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<recipe::Model>::new()])
                .into_connection(),
        );

        let repo = RecipeRepository::new(db);
        let result = repo.get_by_id("nope").await;

        assert!(matches!(result, Err(AppError::RecipeNotFound(_))));
    }

    #[tokio::test]
    async fn test_find_page() {
        let r1 = create_test_recipe("r1", "user1", "Борщ");
        let r2 = create_test_recipe("r2", "user2", "Окрошка");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[r2, r1]])
                .into_connection(),
        );

        let repo = RecipeRepository::new(db);
        let result = repo.find_page(10, 0, None).await.unwrap();

        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_create_graph_writes_recipe_and_links() {
        let created = create_test_recipe("r1", "user1", "Борщ");

        // recipe insert, then the two link inserts
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[created.clone()]])
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );

        let repo = RecipeRepository::new(Arc::clone(&db));

        let recipe_model = recipe::ActiveModel {
            id: Set(created.id.clone()),
            author_id: Set(created.author_id.clone()),
            name: Set(created.name.clone()),
            image: Set(created.image.clone()),
            text: Set(created.text.clone()),
            cooking_time: Set(created.cooking_time),
            created_at: Set(created.created_at),
        };
        let tag_links = vec![recipe_tag::ActiveModel {
            id: Set("rt1".to_string()),
            recipe_id: Set("r1".to_string()),
            tag_id: Set("t1".to_string()),
        }];
        let ingredient_links = vec![recipe_ingredient::ActiveModel {
            id: Set("ri1".to_string()),
            recipe_id: Set("r1".to_string()),
            ingredient_id: Set("i1".to_string()),
            amount: Set(200),
        }];

        let result = repo
            .create_graph(recipe_model, tag_links, ingredient_links)
            .await
            .unwrap();

        assert_eq!(result.id, "r1");
        assert_eq!(result.name, "Борщ");

        drop(repo);
        let log = format!("{:?}", Arc::into_inner(db).unwrap().into_transaction_log());
        assert!(log.contains("recipe_tag"));
        assert!(log.contains("recipe_ingredient"));
    }

    #[tokio::test]
    async fn test_update_graph_ingredients_only_keeps_tags() {
        let updated = create_test_recipe("r1", "user1", "Борщ");

        // scalar update, old link delete, replacement insert
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[updated.clone()]])
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );

        let repo = RecipeRepository::new(Arc::clone(&db));

        let mut model = recipe::ActiveModel::from(updated);
        model.cooking_time = Set(45);
        let ingredient_links = vec![recipe_ingredient::ActiveModel {
            id: Set("ri2".to_string()),
            recipe_id: Set("r1".to_string()),
            ingredient_id: Set("i2".to_string()),
            amount: Set(300),
        }];

        let result = repo
            .update_graph("r1", model, None, Some(ingredient_links))
            .await
            .unwrap();

        assert_eq!(result.id, "r1");

        drop(repo);
        let log = format!("{:?}", Arc::into_inner(db).unwrap().into_transaction_log());
        assert!(log.contains("recipe_ingredient"));
        assert!(!log.contains("recipe_tag"));
    }

    #[tokio::test]
    async fn test_ingredients_of_joins_catalog() {
        let link = recipe_ingredient::Model {
            id: "ri1".to_string(),
            recipe_id: "r1".to_string(),
            ingredient_id: "i1".to_string(),
            amount: 200,
        };
        let flour = ingredient::Model {
            id: "i1".to_string(),
            name: "мука".to_string(),
            measurement_unit: "г".to_string(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[(link, flour)]])
                .into_connection(),
        );

        let repo = RecipeRepository::new(db);
        let rows = repo.ingredients_of("r1").await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ingredient.name, "мука");
        assert_eq!(rows[0].amount, 200);
    }
}
