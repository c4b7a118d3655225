//! Business logic services.

pub mod favorite;
pub mod ingredient;
pub mod recipe;
pub mod shopping_cart;
pub mod subscription;
pub mod tag;
pub mod user;

pub use favorite::FavoriteService;
pub use ingredient::IngredientService;
pub use recipe::{
    CreateRecipeInput, IngredientAmountInput, RecipeDetail, RecipeService, UpdateRecipeInput,
};
pub use shopping_cart::ShoppingCartService;
pub use subscription::{FolloweeWithRecipes, SubscriptionService};
pub use tag::TagService;
pub use user::{CreateUserInput, UserService};
