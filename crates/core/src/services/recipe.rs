//! Recipe service.
//!
//! Persists a recipe together with its tag set and its ingredient-amount
//! associations as one logical unit, and serves the assembled detail view.

use std::collections::HashSet;
use std::sync::Arc;

use foodbook_common::{
    AppError, AppResult, IdGenerator, StorageBackend, decode_data_url, generate_storage_key,
};
use foodbook_db::{
    entities::{recipe, recipe_ingredient, recipe_tag, tag, user},
    repositories::{
        IngredientRepository, RecipeIngredientRow, RecipeRepository, TagRepository, UserRepository,
    },
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// One (ingredient, amount) pair of a recipe payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IngredientAmountInput {
    /// Catalog ingredient id.
    pub id: String,

    /// Required amount, must be positive.
    #[validate(range(min = 1))]
    pub amount: i32,
}

/// Input for creating a recipe.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRecipeInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    /// Base64 data URL of the recipe image.
    #[validate(length(min = 1))]
    pub image: String,

    #[validate(length(min = 1))]
    pub text: String,

    /// Cooking time in minutes.
    #[validate(range(min = 1))]
    pub cooking_time: i32,

    /// Tag ids, at least one.
    pub tags: Vec<String>,

    /// Ingredient-amount pairs, at least one.
    #[validate(nested)]
    pub ingredients: Vec<IngredientAmountInput>,
}

/// Input for updating a recipe. Omitted fields are left unchanged;
/// supplied `tags`/`ingredients` fully replace the existing sets.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateRecipeInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,

    /// Base64 data URL of a replacement image.
    pub image: Option<String>,

    #[validate(length(min = 1))]
    pub text: Option<String>,

    #[validate(range(min = 1))]
    pub cooking_time: Option<i32>,

    pub tags: Option<Vec<String>>,

    #[validate(nested)]
    pub ingredients: Option<Vec<IngredientAmountInput>>,
}

/// A recipe with its associations resolved.
#[derive(Debug, Clone)]
pub struct RecipeDetail {
    /// The recipe row.
    pub recipe: recipe::Model,
    /// The recipe's author.
    pub author: user::Model,
    /// Attached tags, ordered by name.
    pub tags: Vec<tag::Model>,
    /// Ingredient-amount pairs, ordered by ingredient id.
    pub ingredients: Vec<RecipeIngredientRow>,
}

/// Recipe service for business logic.
#[derive(Clone)]
pub struct RecipeService {
    recipe_repo: RecipeRepository,
    ingredient_repo: IngredientRepository,
    tag_repo: TagRepository,
    user_repo: UserRepository,
    storage: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
}

impl RecipeService {
    /// Create a new recipe service.
    #[must_use]
    pub fn new(
        recipe_repo: RecipeRepository,
        ingredient_repo: IngredientRepository,
        tag_repo: TagRepository,
        user_repo: UserRepository,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        Self {
            recipe_repo,
            ingredient_repo,
            tag_repo,
            user_repo,
            storage,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a recipe with its tag and ingredient links.
    pub async fn create(&self, author_id: &str, input: CreateRecipeInput) -> AppResult<recipe::Model> {
        input.validate()?;

        if input.tags.is_empty() {
            return Err(AppError::Validation(
                "recipe must have at least one tag".to_string(),
            ));
        }
        if input.ingredients.is_empty() {
            return Err(AppError::Validation(
                "recipe must have at least one ingredient".to_string(),
            ));
        }

        self.check_links(&input.tags, &input.ingredients).await?;

        let image_url = self.store_image(&input.image).await?;

        let recipe_id = self.id_gen.generate();
        let recipe_model = recipe::ActiveModel {
            id: Set(recipe_id.clone()),
            author_id: Set(author_id.to_string()),
            name: Set(input.name),
            image: Set(image_url),
            text: Set(input.text),
            cooking_time: Set(input.cooking_time),
            created_at: Set(chrono::Utc::now().into()),
        };

        let tag_links = self.tag_links(&recipe_id, &input.tags);
        let ingredient_links = self.ingredient_links(&recipe_id, &input.ingredients);

        let created = self
            .recipe_repo
            .create_graph(recipe_model, tag_links, ingredient_links)
            .await?;

        tracing::info!(recipe_id = %created.id, author_id = %author_id, "Recipe created");

        Ok(created)
    }

    /// Update a recipe. Only the author may do this.
    pub async fn update(
        &self,
        actor_id: &str,
        recipe_id: &str,
        input: UpdateRecipeInput,
    ) -> AppResult<recipe::Model> {
        input.validate()?;

        let existing = self.recipe_repo.get_by_id(recipe_id).await?;
        if existing.author_id != actor_id {
            return Err(AppError::Forbidden(
                "only the author may modify a recipe".to_string(),
            ));
        }

        if let Some(tags) = &input.tags {
            if tags.is_empty() {
                return Err(AppError::Validation(
                    "recipe must have at least one tag".to_string(),
                ));
            }
        }
        if let Some(ingredients) = &input.ingredients {
            if ingredients.is_empty() {
                return Err(AppError::Validation(
                    "recipe must have at least one ingredient".to_string(),
                ));
            }
        }

        let empty_tags = Vec::new();
        let empty_ingredients = Vec::new();
        self.check_links(
            input.tags.as_deref().unwrap_or(&empty_tags),
            input.ingredients.as_deref().unwrap_or(&empty_ingredients),
        )
        .await?;

        let mut model: recipe::ActiveModel = existing.into();
        if let Some(name) = input.name {
            model.name = Set(name);
        }
        if let Some(image) = input.image {
            model.image = Set(self.store_image(&image).await?);
        }
        if let Some(text) = input.text {
            model.text = Set(text);
        }
        if let Some(cooking_time) = input.cooking_time {
            model.cooking_time = Set(cooking_time);
        }

        let tag_links = input.tags.map(|tags| self.tag_links(recipe_id, &tags));
        let ingredient_links = input
            .ingredients
            .map(|ingredients| self.ingredient_links(recipe_id, &ingredients));

        self.recipe_repo
            .update_graph(recipe_id, model, tag_links, ingredient_links)
            .await
    }

    /// Delete a recipe. Only the author may do this.
    pub async fn delete(&self, actor_id: &str, recipe_id: &str) -> AppResult<()> {
        let existing = self.recipe_repo.get_by_id(recipe_id).await?;
        if existing.author_id != actor_id {
            return Err(AppError::Forbidden(
                "only the author may delete a recipe".to_string(),
            ));
        }

        self.recipe_repo.delete(recipe_id).await?;

        tracing::info!(recipe_id = %recipe_id, "Recipe deleted");

        Ok(())
    }

    /// Get a recipe row.
    pub async fn get(&self, recipe_id: &str) -> AppResult<recipe::Model> {
        self.recipe_repo.get_by_id(recipe_id).await
    }

    /// Get a recipe with author, tags and ingredients resolved.
    pub async fn get_detail(&self, recipe_id: &str) -> AppResult<RecipeDetail> {
        let recipe = self.recipe_repo.get_by_id(recipe_id).await?;
        self.detail_of(recipe).await
    }

    /// Resolve associations for an already-loaded recipe row.
    pub async fn detail_of(&self, recipe: recipe::Model) -> AppResult<RecipeDetail> {
        let author = self.user_repo.get_by_id(&recipe.author_id).await?;
        let tags = self.recipe_repo.tags_of(&recipe.id).await?;
        let ingredients = self.recipe_repo.ingredients_of(&recipe.id).await?;

        Ok(RecipeDetail {
            recipe,
            author,
            tags,
            ingredients,
        })
    }

    /// List recipes newest first.
    pub async fn list(
        &self,
        limit: u64,
        offset: u64,
        author_id: Option<&str>,
    ) -> AppResult<Vec<recipe::Model>> {
        self.recipe_repo.find_page(limit, offset, author_id).await
    }

    /// Validate referenced tag and ingredient ids.
    ///
    /// A repeated ingredient id in one payload is rejected rather than
    /// producing duplicate association rows; the unique (recipe,
    /// ingredient) constraint would turn it into a confusing conflict
    /// otherwise.
    async fn check_links(
        &self,
        tags: &[String],
        ingredients: &[IngredientAmountInput],
    ) -> AppResult<()> {
        let unique_tags: HashSet<&str> = tags.iter().map(String::as_str).collect();
        if unique_tags.len() != tags.len() {
            return Err(AppError::Validation("duplicate tag in payload".to_string()));
        }

        let unique_ingredients: HashSet<&str> =
            ingredients.iter().map(|i| i.id.as_str()).collect();
        if unique_ingredients.len() != ingredients.len() {
            return Err(AppError::Validation(
                "duplicate ingredient in payload".to_string(),
            ));
        }

        if !tags.is_empty() {
            let found = self.tag_repo.find_by_ids(tags).await?;
            if found.len() != tags.len() {
                return Err(AppError::Validation("unknown tag id".to_string()));
            }
        }

        if !ingredients.is_empty() {
            let ids: Vec<String> = ingredients.iter().map(|i| i.id.clone()).collect();
            let found = self.ingredient_repo.find_by_ids(&ids).await?;
            if found.len() != ingredients.len() {
                return Err(AppError::Validation("unknown ingredient id".to_string()));
            }
        }

        Ok(())
    }

    /// Decode a base64 data-URL image and persist it.
    async fn store_image(&self, data_url: &str) -> AppResult<String> {
        let image = decode_data_url(data_url)?;
        let key = generate_storage_key(&image.data, image.extension);
        let stored = self
            .storage
            .upload(&key, &image.data, &image.content_type)
            .await?;
        Ok(stored.url)
    }

    fn tag_links(&self, recipe_id: &str, tags: &[String]) -> Vec<recipe_tag::ActiveModel> {
        tags.iter()
            .map(|tag_id| recipe_tag::ActiveModel {
                id: Set(self.id_gen.generate()),
                recipe_id: Set(recipe_id.to_string()),
                tag_id: Set(tag_id.clone()),
            })
            .collect()
    }

    fn ingredient_links(
        &self,
        recipe_id: &str,
        ingredients: &[IngredientAmountInput],
    ) -> Vec<recipe_ingredient::ActiveModel> {
        ingredients
            .iter()
            .map(|entry| recipe_ingredient::ActiveModel {
                id: Set(self.id_gen.generate()),
                recipe_id: Set(recipe_id.to_string()),
                ingredient_id: Set(entry.id.clone()),
                amount: Set(entry.amount),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use foodbook_common::LocalStorage;
    use foodbook_db::entities::{ingredient, recipe};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_recipe(id: &str, author_id: &str) -> recipe::Model {
        recipe::Model {
            id: id.to_string(),
            author_id: author_id.to_string(),
            name: "Борщ".to_string(),
            image: "/media/recipes/abc.png".to_string(),
            text: "Варить час".to_string(),
            cooking_time: 60,
            created_at: Utc::now().into(),
        }
    }

    fn test_storage() -> Arc<dyn StorageBackend> {
        let dir = std::env::temp_dir().join(format!("foodbook-recipes-{}", std::process::id()));
        Arc::new(LocalStorage::new(dir, "/media".to_string()))
    }

    fn service_with(
        recipe_db: Arc<sea_orm::DatabaseConnection>,
        ingredient_db: Arc<sea_orm::DatabaseConnection>,
        tag_db: Arc<sea_orm::DatabaseConnection>,
        user_db: Arc<sea_orm::DatabaseConnection>,
    ) -> RecipeService {
        RecipeService::new(
            RecipeRepository::new(recipe_db),
            IngredientRepository::new(ingredient_db),
            TagRepository::new(tag_db),
            UserRepository::new(user_db),
            test_storage(),
        )
    }

    fn empty_db() -> Arc<sea_orm::DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    fn valid_input() -> CreateRecipeInput {
        CreateRecipeInput {
            name: "Борщ".to_string(),
            image: "data:image/png;base64,iVBORw0KGgo=".to_string(),
            text: "Варить час".to_string(),
            cooking_time: 60,
            tags: vec!["t1".to_string()],
            ingredients: vec![IngredientAmountInput {
                id: "i1".to_string(),
                amount: 200,
            }],
        }
    }

    #[tokio::test]
    async fn test_create_persists_recipe_with_links() {
        let tag_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[foodbook_db::entities::tag::Model {
                    id: "t1".to_string(),
                    name: "ужин".to_string(),
                    color: "#123456".to_string(),
                    slug: "dinner".to_string(),
                }]])
                .into_connection(),
        );
        let ingredient_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[ingredient::Model {
                    id: "i1".to_string(),
                    name: "мука".to_string(),
                    measurement_unit: "г".to_string(),
                }]])
                .into_connection(),
        );
        // recipe insert, tag link insert, ingredient link insert
        let recipe_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_recipe("r1", "user1")]])
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

        let service = service_with(recipe_db, ingredient_db, tag_db, empty_db());

        let created = service.create("user1", valid_input()).await.unwrap();

        assert_eq!(created.id, "r1");
        assert_eq!(created.author_id, "user1");
    }

    #[tokio::test]
    async fn test_create_rejects_empty_tags() {
        let service = service_with(empty_db(), empty_db(), empty_db(), empty_db());

        let mut input = valid_input();
        input.tags.clear();

        let result = service.create("user1", input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_ingredients() {
        let service = service_with(empty_db(), empty_db(), empty_db(), empty_db());

        let mut input = valid_input();
        input.ingredients.clear();

        let result = service.create("user1", input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_nonpositive_amount() {
        let service = service_with(empty_db(), empty_db(), empty_db(), empty_db());

        let mut input = valid_input();
        input.ingredients[0].amount = 0;

        let result = service.create("user1", input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_nonpositive_cooking_time() {
        let service = service_with(empty_db(), empty_db(), empty_db(), empty_db());

        let mut input = valid_input();
        input.cooking_time = 0;

        let result = service.create("user1", input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_ingredient() {
        let service = service_with(empty_db(), empty_db(), empty_db(), empty_db());

        let mut input = valid_input();
        input.ingredients.push(IngredientAmountInput {
            id: "i1".to_string(),
            amount: 50,
        });

        let result = service.create("user1", input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_ingredient() {
        let tag_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[foodbook_db::entities::tag::Model {
                    id: "t1".to_string(),
                    name: "ужин".to_string(),
                    color: "#123456".to_string(),
                    slug: "dinner".to_string(),
                }]])
                .into_connection(),
        );
        // Catalog lookup finds nothing for the referenced id
        let ingredient_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<ingredient::Model>::new()])
                .into_connection(),
        );

        let service = service_with(empty_db(), ingredient_db, tag_db, empty_db());

        let result = service.create("user1", valid_input()).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_rejects_non_owner() {
        let recipe_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_recipe("r1", "owner")]])
                .into_connection(),
        );

        let service = service_with(recipe_db, empty_db(), empty_db(), empty_db());

        let result = service
            .update("intruder", "r1", UpdateRecipeInput::default())
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_delete_rejects_non_owner() {
        let recipe_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_recipe("r1", "owner")]])
                .into_connection(),
        );

        let service = service_with(recipe_db, empty_db(), empty_db(), empty_db());

        let result = service.delete("intruder", "r1").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_recipe_is_not_found() {
        let recipe_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<recipe::Model>::new()])
                .into_connection(),
        );

        let service = service_with(recipe_db, empty_db(), empty_db(), empty_db());

        let result = service.delete("user1", "nope").await;
        assert!(matches!(result, Err(AppError::RecipeNotFound(_))));
    }
}
