use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::instrument;

use super::dto::{SaveCountResponse, SaveRecipeRequest, SavedRecipeResponse};
use crate::{
    auth::jwt::AuthUser, error::AppError, recipes::dto::RecipeResponse, state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/saved-recipes", get(list_saved).post(save_recipe))
        .route("/saved-recipes/:id", delete(unsave_recipe))
        .route("/recipes/:id/saves", get(count_saves))
        .route("/recipes/most-saved", get(most_saved))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn save_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<SaveRecipeRequest>,
) -> Result<(StatusCode, Json<SavedRecipeResponse>), AppError> {
    let saved = state.saved.save_recipe(&body.recipe_id, &user).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn list_saved(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<RecipeResponse>>, AppError> {
    Ok(Json(state.saved.get_recipes_saved_by_user(&user).await?))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn unsave_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(recipe_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.saved.unsave_recipe(&user, &recipe_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn count_saves(
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
) -> Result<Json<SaveCountResponse>, AppError> {
    let count = state.saved.get_saved_count_by_recipe(&recipe_id).await?;
    let recipe_id = crate::error::parse_id(&recipe_id)?;
    Ok(Json(SaveCountResponse { recipe_id, count }))
}

#[instrument(skip(state))]
pub async fn most_saved(
    State(state): State<AppState>,
) -> Result<Json<Vec<SaveCountResponse>>, AppError> {
    let top = state.saved.get_top10_most_saved().await?;
    Ok(Json(top.into_iter().map(Into::into).collect()))
}
