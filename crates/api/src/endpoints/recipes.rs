//! Recipes endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use foodbook_common::AppResult;
use foodbook_core::{CreateRecipeInput, IngredientAmountInput, RecipeDetail, UpdateRecipeInput};
use foodbook_db::entities::{recipe, user};
use serde::{Deserialize, Serialize};

use super::users::UserResponse;
use crate::{
    extractors::{AuthUser, MaybeAuthUser, Pagination},
    middleware::AppState,
    response::ApiResponse,
};

/// Short recipe body, used in favorite/cart responses and subscriptions.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeShortResponse {
    pub id: String,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<recipe::Model> for RecipeShortResponse {
    fn from(recipe: recipe::Model) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            image: recipe.image,
            cooking_time: recipe.cooking_time,
        }
    }
}

/// One ingredient line of a recipe response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeIngredientResponse {
    pub id: String,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Full recipe response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeResponse {
    pub id: String,
    pub author: UserResponse,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub created_at: String,
    pub tags: Vec<super::tags::TagResponse>,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

/// Assemble a full recipe response for the given viewer.
///
/// All viewer-derived flags are false for anonymous requests.
async fn recipe_response(
    state: &AppState,
    viewer: Option<&user::Model>,
    detail: RecipeDetail,
) -> AppResult<RecipeResponse> {
    let (is_favorited, is_in_shopping_cart, is_subscribed) = match viewer {
        Some(viewer) => (
            state
                .favorite_service
                .is_favorited(&viewer.id, &detail.recipe.id)
                .await?,
            state
                .shopping_cart_service
                .is_in_cart(&viewer.id, &detail.recipe.id)
                .await?,
            state
                .subscription_service
                .is_subscribed(&viewer.id, &detail.author.id)
                .await?,
        ),
        None => (false, false, false),
    };

    Ok(RecipeResponse {
        id: detail.recipe.id,
        author: UserResponse::new(detail.author, is_subscribed),
        name: detail.recipe.name,
        image: detail.recipe.image,
        text: detail.recipe.text,
        cooking_time: detail.recipe.cooking_time,
        created_at: detail.recipe.created_at.to_rfc3339(),
        tags: detail.tags.into_iter().map(Into::into).collect(),
        ingredients: detail
            .ingredients
            .into_iter()
            .map(|row| RecipeIngredientResponse {
                id: row.ingredient.id,
                name: row.ingredient.name,
                measurement_unit: row.ingredient.measurement_unit,
                amount: row.amount,
            })
            .collect(),
        is_favorited,
        is_in_shopping_cart,
    })
}

/// List query parameters.
#[derive(Debug, Deserialize)]
pub struct ListRecipesQuery {
    #[serde(default)]
    pub page: Option<u64>,

    #[serde(default)]
    pub limit: Option<u64>,

    /// Filter by author id.
    pub author: Option<String>,
}

impl ListRecipesQuery {
    fn pagination(&self) -> Pagination {
        let defaults = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(defaults.page),
            limit: self.limit.unwrap_or(defaults.limit),
        }
    }
}

/// List recipes, newest first.
async fn list(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListRecipesQuery>,
) -> AppResult<ApiResponse<Vec<RecipeResponse>>> {
    let pagination = query.pagination();
    let recipes = state
        .recipe_service
        .list(pagination.limit, pagination.offset(), query.author.as_deref())
        .await?;

    let mut items = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        let detail = state.recipe_service.detail_of(recipe).await?;
        items.push(recipe_response(&state, viewer.as_ref(), detail).await?);
    }

    Ok(ApiResponse::ok(items))
}

/// Get a recipe by ID.
async fn show(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<RecipeResponse>> {
    let detail = state.recipe_service.get_detail(&id).await?;

    Ok(ApiResponse::ok(
        recipe_response(&state, viewer.as_ref(), detail).await?,
    ))
}

/// Ingredient entry of a recipe payload.
#[derive(Debug, Deserialize)]
pub struct IngredientAmountRequest {
    pub id: String,
    pub amount: i32,
}

impl From<IngredientAmountRequest> for IngredientAmountInput {
    fn from(req: IngredientAmountRequest) -> Self {
        Self {
            id: req.id,
            amount: req.amount,
        }
    }
}

/// Create recipe request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecipeRequest {
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub tags: Vec<String>,
    pub ingredients: Vec<IngredientAmountRequest>,
}

/// Create a new recipe.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateRecipeRequest>,
) -> AppResult<ApiResponse<RecipeResponse>> {
    let input = CreateRecipeInput {
        name: req.name,
        image: req.image,
        text: req.text,
        cooking_time: req.cooking_time,
        tags: req.tags,
        ingredients: req.ingredients.into_iter().map(Into::into).collect(),
    };

    let created = state.recipe_service.create(&user.id, input).await?;
    let detail = state.recipe_service.detail_of(created).await?;

    Ok(ApiResponse::ok(
        recipe_response(&state, Some(&user), detail).await?,
    ))
}

/// Update recipe request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecipeRequest {
    pub name: Option<String>,
    pub image: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    pub tags: Option<Vec<String>>,
    pub ingredients: Option<Vec<IngredientAmountRequest>>,
}

/// Update a recipe. Only the author may do this.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateRecipeRequest>,
) -> AppResult<ApiResponse<RecipeResponse>> {
    let input = UpdateRecipeInput {
        name: req.name,
        image: req.image,
        text: req.text,
        cooking_time: req.cooking_time,
        tags: req.tags,
        ingredients: req
            .ingredients
            .map(|entries| entries.into_iter().map(Into::into).collect()),
    };

    let updated = state.recipe_service.update(&user.id, &id, input).await?;
    let detail = state.recipe_service.detail_of(updated).await?;

    Ok(ApiResponse::ok(
        recipe_response(&state, Some(&user), detail).await?,
    ))
}

/// Delete a recipe. Only the author may do this.
async fn remove(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.recipe_service.delete(&user.id, &id).await?;

    Ok(crate::response::ok())
}

/// Add a recipe to favorites.
async fn favorite(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<RecipeShortResponse>> {
    state.favorite_service.add(&user.id, &id).await?;
    let recipe = state.recipe_service.get(&id).await?;

    Ok(ApiResponse::ok(recipe.into()))
}

/// Remove a recipe from favorites.
async fn unfavorite(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.favorite_service.remove(&user.id, &id).await?;

    Ok(crate::response::ok())
}

/// Add a recipe to the shopping cart.
async fn add_to_cart(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<RecipeShortResponse>> {
    state.shopping_cart_service.add(&user.id, &id).await?;
    let recipe = state.recipe_service.get(&id).await?;

    Ok(ApiResponse::ok(recipe.into()))
}

/// Remove a recipe from the shopping cart.
async fn remove_from_cart(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.shopping_cart_service.remove(&user.id, &id).await?;

    Ok(crate::response::ok())
}

/// Download the aggregated shopping list as plain text.
async fn download_shopping_cart(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let body = state
        .shopping_cart_service
        .render_shopping_list(&user.id)
        .await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"shopping_cart.txt\"",
            ),
        ],
        body,
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/download_shopping_cart", get(download_shopping_cart))
        .route("/{id}", get(show).patch(update).delete(remove))
        .route("/{id}/favorite", post(favorite).delete(unfavorite))
        .route("/{id}/shopping_cart", post(add_to_cart).delete(remove_from_cart))
}
