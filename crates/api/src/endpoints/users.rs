//! Users endpoints.

use axum::{
    Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use foodbook_common::AppResult;
use foodbook_db::entities::user;
use serde::Serialize;

use super::recipes::RecipeShortResponse;
use crate::{
    extractors::{AuthUser, MaybeAuthUser, Pagination},
    middleware::AppState,
    response::ApiResponse,
};

/// User response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserResponse {
    pub fn new(user: user::Model, is_subscribed: bool) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed,
        }
    }
}

/// A followed author with their recipes.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolloweeResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub recipes: Vec<RecipeShortResponse>,
    pub recipes_count: u64,
}

/// Get current user.
async fn me(AuthUser(user): AuthUser) -> ApiResponse<UserResponse> {
    ApiResponse::ok(UserResponse::new(user, false))
}

/// Get a user by ID.
async fn show(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.get(&id).await?;

    let is_subscribed = match &viewer {
        Some(viewer) => {
            state
                .subscription_service
                .is_subscribed(&viewer.id, &user.id)
                .await?
        }
        None => false,
    };

    Ok(ApiResponse::ok(UserResponse::new(user, is_subscribed)))
}

/// Subscribe to a user.
async fn subscribe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<FolloweeResponse>> {
    state.subscription_service.subscribe(&user.id, &id).await?;

    let followee = state.subscription_service.followee_with_recipes(&id).await?;

    Ok(ApiResponse::ok(FolloweeResponse {
        user: UserResponse::new(followee.user, true),
        recipes: followee
            .recipes
            .into_iter()
            .map(RecipeShortResponse::from)
            .collect(),
        recipes_count: followee.recipes_count,
    }))
}

/// Unsubscribe from a user.
async fn unsubscribe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl axum::response::IntoResponse> {
    state.subscription_service.unsubscribe(&user.id, &id).await?;

    Ok(crate::response::ok())
}

/// List the users the current user is subscribed to.
async fn subscriptions(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<ApiResponse<Vec<FolloweeResponse>>> {
    let followees = state
        .subscription_service
        .subscriptions(&user.id, pagination.limit, pagination.offset())
        .await?;

    let items = followees
        .into_iter()
        .map(|f| FolloweeResponse {
            user: UserResponse::new(f.user, true),
            recipes: f.recipes.into_iter().map(RecipeShortResponse::from).collect(),
            recipes_count: f.recipes_count,
        })
        .collect();

    Ok(ApiResponse::ok(items))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/subscriptions", get(subscriptions))
        .route("/{id}", get(show))
        .route("/{id}/subscribe", post(subscribe).delete(unsubscribe))
}
