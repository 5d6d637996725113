use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::dto::{CommentRequest, CommentResponse};
use crate::{auth::jwt::AuthUser, error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/comments", post(create_comment))
        .route("/comments/:id", get(get_comment).delete(delete_comment))
        .route("/recipes/:id/comments", get(list_for_recipe))
}

#[instrument(skip(state, body), fields(user_id = %user.id))]
pub async fn create_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<CommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let comment = state.comments.create_comment(body, &user).await?;
    let location = format!("/comments/{}", comment.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(comment)))
}

#[instrument(skip(state, _user))]
pub async fn get_comment(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<CommentResponse>, AppError> {
    Ok(Json(state.comments.get_comment_by_id(&id).await?))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.comments.delete_comment(&id, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn list_for_recipe(
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
) -> Result<Json<Vec<CommentResponse>>, AppError> {
    Ok(Json(state.comments.get_comments_by_recipe(&recipe_id).await?))
}
