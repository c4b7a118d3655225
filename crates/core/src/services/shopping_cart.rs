//! Shopping cart service.
//!
//! Besides the toggle, this owns the aggregated shopping list: total
//! required amount of each distinct ingredient across every recipe in
//! the cart, and its plain-text rendering for download.

use foodbook_common::{AppError, AppResult, IdGenerator};
use foodbook_db::{
    entities::shopping_cart,
    repositories::{IngredientTotal, RecipeRepository, ShoppingCartRepository},
};
use sea_orm::Set;

/// Header line of the rendered shopping list.
const SHOPPING_LIST_HEADER: &str = "Список покупок:";

/// Shopping cart service for business logic.
#[derive(Clone)]
pub struct ShoppingCartService {
    cart_repo: ShoppingCartRepository,
    recipe_repo: RecipeRepository,
    id_gen: IdGenerator,
}

impl ShoppingCartService {
    /// Create a new shopping cart service.
    #[must_use]
    pub fn new(cart_repo: ShoppingCartRepository, recipe_repo: RecipeRepository) -> Self {
        Self {
            cart_repo,
            recipe_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Add a recipe to a user's shopping cart.
    pub async fn add(&self, user_id: &str, recipe_id: &str) -> AppResult<shopping_cart::Model> {
        let recipe = self.recipe_repo.get_by_id(recipe_id).await?;

        if self.cart_repo.is_in_cart(user_id, recipe_id).await? {
            return Err(AppError::Conflict(
                "recipe is already in the shopping cart".to_string(),
            ));
        }

        let created = self
            .cart_repo
            .create(shopping_cart::ActiveModel {
                id: Set(self.id_gen.generate()),
                user_id: Set(user_id.to_string()),
                recipe_id: Set(recipe.id),
                created_at: Set(chrono::Utc::now().into()),
            })
            .await?;

        tracing::debug!(user_id = %user_id, recipe_id = %recipe_id, "Recipe added to cart");

        Ok(created)
    }

    /// Remove a recipe from a user's shopping cart.
    pub async fn remove(&self, user_id: &str, recipe_id: &str) -> AppResult<()> {
        if !self.cart_repo.is_in_cart(user_id, recipe_id).await? {
            return Err(AppError::Conflict(
                "recipe is not in the shopping cart".to_string(),
            ));
        }

        self.cart_repo
            .delete_by_user_and_recipe(user_id, recipe_id)
            .await
    }

    /// Whether the recipe is in the user's shopping cart.
    pub async fn is_in_cart(&self, user_id: &str, recipe_id: &str) -> AppResult<bool> {
        self.cart_repo.is_in_cart(user_id, recipe_id).await
    }

    /// Aggregate the cart into per-ingredient totals, amounts summed
    /// across every occurrence, ordered by ingredient id ascending.
    pub async fn shopping_list(&self, user_id: &str) -> AppResult<Vec<IngredientTotal>> {
        self.cart_repo.sum_ingredients(user_id).await
    }

    /// Render the aggregated cart as a plain-text document.
    pub async fn render_shopping_list(&self, user_id: &str) -> AppResult<String> {
        let totals = self.shopping_list(user_id).await?;
        Ok(render_shopping_list(&totals))
    }
}

/// One line per ingredient, `<name>(<unit>) - <total>`, under a header.
fn render_shopping_list(totals: &[IngredientTotal]) -> String {
    let mut out = String::from(SHOPPING_LIST_HEADER);
    out.push('\n');
    for entry in totals {
        out.push_str(&format!(
            "{}({}) - {}\n",
            entry.name, entry.measurement_unit, entry.total
        ));
    }
    out
}
