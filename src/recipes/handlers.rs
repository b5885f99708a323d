use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{Map, Value};
use tracing::instrument;

use super::{dto::DataResponse, repo_types::Recipe, services};
use crate::{auth::extractors::AuthUser, error::ApiError, extract::JsonBody, state::AppState};

pub type RecipeJson = Json<DataResponse<Recipe>>;
pub type RecipeListJson = Json<DataResponse<Vec<Recipe>>>;

pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route(
            "/recipes/:id",
            get(show_recipe)
                .put(update_recipe)
                .patch(update_recipe)
                .delete(delete_recipe),
        )
        .route("/recipes/difficulty/:level", get(filter_by_difficulty))
        .route("/search/recipes", get(search_recipes))
}

// AuthUser comes first in every handler so unauthenticated calls stop before any parsing.

#[instrument(skip(state, auth), fields(user_id = %auth.user_id))]
pub async fn list_recipes(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<RecipeListJson, ApiError> {
    let recipes = services::list(state.recipes.as_ref()).await?;
    Ok(Json(DataResponse::new(recipes)))
}

#[instrument(skip(state, auth, body), fields(user_id = %auth.user_id))]
pub async fn create_recipe(
    auth: AuthUser,
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Map<String, Value>>,
) -> Result<(StatusCode, RecipeJson), ApiError> {
    let recipe = services::create(state.recipes.as_ref(), &body).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(recipe))))
}

#[instrument(skip(state, auth), fields(user_id = %auth.user_id))]
pub async fn show_recipe(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<RecipeJson, ApiError> {
    let id = services::parse_id(&id)?;
    let recipe = services::get(state.recipes.as_ref(), id).await?;
    Ok(Json(DataResponse::new(recipe)))
}

#[instrument(skip(state, auth, body), fields(user_id = %auth.user_id))]
pub async fn update_recipe(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<Map<String, Value>>,
) -> Result<RecipeJson, ApiError> {
    let id = services::parse_id(&id)?;
    let recipe = services::update(state.recipes.as_ref(), id, &body).await?;
    Ok(Json(DataResponse::new(recipe)))
}

#[instrument(skip(state, auth), fields(user_id = %auth.user_id))]
pub async fn delete_recipe(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = services::parse_id(&id)?;
    services::delete(state.recipes.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, auth), fields(user_id = %auth.user_id))]
pub async fn filter_by_difficulty(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(level): Path<String>,
) -> Result<RecipeListJson, ApiError> {
    let recipes = services::filter_by_difficulty(state.recipes.as_ref(), &level).await?;
    Ok(Json(DataResponse::new(recipes)))
}

#[instrument(skip(state, auth), fields(user_id = %auth.user_id))]
pub async fn search_recipes(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<RecipeListJson, ApiError> {
    let recipes = services::search(state.recipes.as_ref(), &query).await?;
    Ok(Json(DataResponse::new(recipes)))
}
