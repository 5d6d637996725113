use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::dto::{RateRecipeRequest, RatingResponse, RatingSummaryResponse};
use crate::{auth::jwt::AuthUser, error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/recipes/:id/rating", get(get_summary).post(rate_recipe))
        .route("/recipes/:id/rating/me", get(get_mine))
}

#[instrument(skip(state))]
pub async fn get_summary(
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
) -> Result<Json<RatingSummaryResponse>, AppError> {
    let summary = state.ratings.get_rating_by_recipe(&recipe_id).await?;
    Ok(Json(summary.into()))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn rate_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(recipe_id): Path<String>,
    Json(body): Json<RateRecipeRequest>,
) -> Result<Json<RatingResponse>, AppError> {
    let rating = state
        .ratings
        .rate_recipe(body.stars, &recipe_id, &user)
        .await?;
    Ok(Json(rating))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn get_mine(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(recipe_id): Path<String>,
) -> Result<Json<RatingResponse>, AppError> {
    Ok(Json(state.ratings.get_user_rating(&recipe_id, &user).await?))
}
