use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::dto::{QuickSearchParams, RecipeRequest, RecipeResponse, RecipeSearch};
use crate::{auth::jwt::AuthUser, error::AppError, state::AppState};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route("/recipes/search", get(quick_search).post(search_recipes))
        .route("/recipes/top", get(top_recipes))
        .route(
            "/recipes/:id",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
}

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/user/recipes", get(my_recipes))
}

#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
) -> Result<Json<Vec<RecipeResponse>>, AppError> {
    Ok(Json(state.recipes.get_all().await?))
}

#[instrument(skip(state))]
pub async fn top_recipes(
    State(state): State<AppState>,
) -> Result<Json<Vec<RecipeResponse>>, AppError> {
    Ok(Json(state.recipes.get_top_recipes().await?))
}

/// POST /recipes/search; an empty body searches everything public.
#[instrument(skip(state, body))]
pub async fn search_recipes(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Vec<RecipeResponse>>, AppError> {
    let search = if body.iter().all(u8::is_ascii_whitespace) {
        RecipeSearch::default()
    } else {
        serde_json::from_slice::<RecipeSearch>(&body)
            .map_err(|e| AppError::validation(format!("invalid search body: {e}")))?
    };
    Ok(Json(state.recipes.get_recipes(&search).await?))
}

/// GET /recipes/search?q=&desc=&difficulty=&time=&tags=a,b
#[instrument(skip(state))]
pub async fn quick_search(
    State(state): State<AppState>,
    Query(params): Query<QuickSearchParams>,
) -> Result<Json<Vec<RecipeResponse>>, AppError> {
    let search = RecipeSearch::from(params);
    Ok(Json(state.recipes.get_recipes(&search).await?))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RecipeResponse>, AppError> {
    Ok(Json(state.recipes.get_recipe_by_id(&id).await?))
}

#[instrument(skip(state, body), fields(user_id = %user.id))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<RecipeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let recipe = state.recipes.create_recipe(body, &user).await?;
    let location = format!("/recipes/{}", recipe.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(recipe)))
}

#[instrument(skip(state, body), fields(user_id = %user.id))]
pub async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<RecipeRequest>,
) -> Result<Json<RecipeResponse>, AppError> {
    Ok(Json(state.recipes.update_recipe(body, &id, &user).await?))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.recipes.delete_recipe(&id, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn my_recipes(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<RecipeResponse>>, AppError> {
    let recipes = state.recipes.get_recipes_by_user(&user.id.to_string()).await?;
    Ok(Json(recipes))
}
