//! Ingredients endpoints.

use axum::{
    Router,
    extract::{Path, Query, State},
    routing::get,
};
use foodbook_common::AppResult;
use foodbook_db::entities::ingredient;
use serde::{Deserialize, Serialize};

use crate::{middleware::AppState, response::ApiResponse};

/// Ingredient response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientResponse {
    pub id: String,
    pub name: String,
    pub measurement_unit: String,
}

impl From<ingredient::Model> for IngredientResponse {
    fn from(ingredient: ingredient::Model) -> Self {
        Self {
            id: ingredient.id,
            name: ingredient.name,
            measurement_unit: ingredient.measurement_unit,
        }
    }
}

/// List query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListIngredientsQuery {
    /// Case-sensitive name prefix filter.
    pub name: Option<String>,
}

/// List ingredients, optionally filtered by name prefix.
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListIngredientsQuery>,
) -> AppResult<ApiResponse<Vec<IngredientResponse>>> {
    let ingredients = state.ingredient_service.list(query.name.as_deref()).await?;

    Ok(ApiResponse::ok(
        ingredients.into_iter().map(IngredientResponse::from).collect(),
    ))
}

/// Get an ingredient by ID.
async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<IngredientResponse>> {
    let ingredient = state.ingredient_service.get(&id).await?;

    Ok(ApiResponse::ok(ingredient.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{id}", get(show))
}
