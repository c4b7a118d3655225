//! Database repositories.

mod favorite;
mod ingredient;
mod recipe;
mod shopping_cart;
mod subscription;
mod tag;
mod user;

pub use favorite::FavoriteRepository;
pub use ingredient::IngredientRepository;
pub use recipe::{RecipeIngredientRow, RecipeRepository};
pub use shopping_cart::{IngredientTotal, ShoppingCartRepository};
pub use subscription::SubscriptionRepository;
pub use tag::TagRepository;
pub use user::UserRepository;

use foodbook_common::AppError;
use sea_orm::{DbErr, SqlErr};

/// Map an insert failure, surfacing unique-constraint violations as
/// conflicts. Concurrent duplicate creates race past the service-level
/// existence checks and are resolved here by the storage layer.
pub(crate) fn insert_err(e: DbErr, what: &str) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict(format!("{what} already exists"))
        }
        _ => AppError::Database(e.to_string()),
    }
}
