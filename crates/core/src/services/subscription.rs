//! Subscription service.

use foodbook_common::{AppError, AppResult, IdGenerator};
use foodbook_db::{
    entities::{recipe, subscription, user},
    repositories::{RecipeRepository, SubscriptionRepository, UserRepository},
};
use sea_orm::Set;

/// A followed author with their recipes, for the subscriptions listing.
#[derive(Debug, Clone)]
pub struct FolloweeWithRecipes {
    /// The followed user.
    pub user: user::Model,
    /// The followee's recipes, newest first.
    pub recipes: Vec<recipe::Model>,
    /// Total recipe count of the followee.
    pub recipes_count: u64,
}

/// Subscription service for business logic.
#[derive(Clone)]
pub struct SubscriptionService {
    subscription_repo: SubscriptionRepository,
    user_repo: UserRepository,
    recipe_repo: RecipeRepository,
    id_gen: IdGenerator,
}

impl SubscriptionService {
    /// Create a new subscription service.
    #[must_use]
    pub fn new(
        subscription_repo: SubscriptionRepository,
        user_repo: UserRepository,
        recipe_repo: RecipeRepository,
    ) -> Self {
        Self {
            subscription_repo,
            user_repo,
            recipe_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Subscribe `follower_id` to `followee_id`.
    ///
    /// Self-subscription is rejected outright, before any state check.
    pub async fn subscribe(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> AppResult<subscription::Model> {
        if follower_id == followee_id {
            return Err(AppError::Validation(
                "cannot subscribe to yourself".to_string(),
            ));
        }

        let followee = self.user_repo.get_by_id(followee_id).await?;

        if self
            .subscription_repo
            .is_subscribed(follower_id, followee_id)
            .await?
        {
            return Err(AppError::Conflict("already subscribed".to_string()));
        }

        let created = self
            .subscription_repo
            .create(subscription::ActiveModel {
                id: Set(self.id_gen.generate()),
                follower_id: Set(follower_id.to_string()),
                followee_id: Set(followee.id),
                created_at: Set(chrono::Utc::now().into()),
            })
            .await?;

        tracing::info!(follower_id = %follower_id, followee_id = %followee_id, "Subscribed");

        Ok(created)
    }

    /// Remove the subscription of `follower_id` to `followee_id`.
    pub async fn unsubscribe(&self, follower_id: &str, followee_id: &str) -> AppResult<()> {
        if follower_id == followee_id {
            return Err(AppError::Validation(
                "cannot unsubscribe from yourself".to_string(),
            ));
        }

        if !self
            .subscription_repo
            .is_subscribed(follower_id, followee_id)
            .await?
        {
            return Err(AppError::Conflict("not subscribed".to_string()));
        }

        self.subscription_repo
            .delete_by_pair(follower_id, followee_id)
            .await
    }

    /// Whether `follower_id` is subscribed to `followee_id`.
    pub async fn is_subscribed(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        self.subscription_repo
            .is_subscribed(follower_id, followee_id)
            .await
    }

    /// Followed author with their recipes, for a subscribe response.
    pub async fn followee_with_recipes(&self, followee_id: &str) -> AppResult<FolloweeWithRecipes> {
        let user = self.user_repo.get_by_id(followee_id).await?;
        let recipes = self.recipe_repo.find_by_author(followee_id).await?;
        let recipes_count = self.recipe_repo.count_by_author(followee_id).await?;

        Ok(FolloweeWithRecipes {
            user,
            recipes,
            recipes_count,
        })
    }

    /// Page through the users `follower_id` is subscribed to, each with
    /// their recipes and recipe count.
    pub async fn subscriptions(
        &self,
        follower_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<FolloweeWithRecipes>> {
        let followees = self
            .subscription_repo
            .find_followees(follower_id, limit, offset)
            .await?;

        let mut out = Vec::with_capacity(followees.len());
        for user in followees {
            let recipes = self.recipe_repo.find_by_author(&user.id).await?;
            let recipes_count = self.recipe_repo.count_by_author(&user.id).await?;
            out.push(FolloweeWithRecipes {
                user,
                recipes,
                recipes_count,
            });
        }

        Ok(out)
    }

    /// Total number of users `follower_id` is subscribed to.
    pub async fn subscription_count(&self, follower_id: &str) -> AppResult<u64> {
        self.subscription_repo.count_by_follower(follower_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            username: id.to_string(),
            first_name: "Иван".to_string(),
            last_name: "Иванов".to_string(),
            password: "hash".to_string(),
            token: None,
            created_at: Utc::now().into(),
        }
    }

    fn create_test_subscription(follower_id: &str, followee_id: &str) -> subscription::Model {
        subscription::Model {
            id: "s1".to_string(),
            follower_id: follower_id.to_string(),
            followee_id: followee_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn empty_db() -> Arc<sea_orm::DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    #[tokio::test]
    async fn test_self_subscription_is_rejected() {
        let service = SubscriptionService::new(
            SubscriptionRepository::new(empty_db()),
            UserRepository::new(empty_db()),
            RecipeRepository::new(empty_db()),
        );

        let result = service.subscribe("user1", "user1").await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result = service.unsubscribe("user1", "user1").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_subscribe_to_missing_user_is_not_found() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let service = SubscriptionService::new(
            SubscriptionRepository::new(empty_db()),
            UserRepository::new(user_db),
            RecipeRepository::new(empty_db()),
        );

        let result = service.subscribe("user1", "nope").await;
        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_subscribe_twice_is_conflict() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("user2")]])
                .into_connection(),
        );
        let subscription_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_subscription("user1", "user2")]])
                .into_connection(),
        );

        let service = SubscriptionService::new(
            SubscriptionRepository::new(subscription_db),
            UserRepository::new(user_db),
            RecipeRepository::new(empty_db()),
        );

        let result = service.subscribe("user1", "user2").await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_unsubscribe_absent_is_conflict() {
        let subscription_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<subscription::Model>::new()])
                .into_connection(),
        );

        let service = SubscriptionService::new(
            SubscriptionRepository::new(subscription_db),
            UserRepository::new(empty_db()),
            RecipeRepository::new(empty_db()),
        );

        let result = service.unsubscribe("user1", "user2").await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }
}
