use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::instrument;

use super::dto::{UpdatePasswordRequest, UpdateUserRequest, UserLookup, UserResponse};
use crate::{auth::jwt::AuthUser, error::AppError, state::AppState};

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/user", put(update_me).delete(delete_me))
        .route("/user/me", get(get_me))
        .route("/user/password", put(change_password))
        .route("/users/lookup", get(lookup))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(state.users.get_user_by_id(&user.id.to_string()).await?))
}

/// GET /users/lookup?name= or ?email=; name wins when both are given.
#[instrument(skip(state, _user))]
pub async fn lookup(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Query(q): Query<UserLookup>,
) -> Result<Json<UserResponse>, AppError> {
    let user = match (q.name.as_deref(), q.email.as_deref()) {
        (Some(name), _) if !name.trim().is_empty() => state.users.get_user_by_name(name).await?,
        (_, Some(email)) if !email.trim().is_empty() => {
            state.users.get_user_by_email(email).await?
        }
        _ => return Err(AppError::validation("name or email is required")),
    };
    Ok(Json(user))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let updated = state
        .users
        .update_user(&user.id.to_string(), &body.name)
        .await?;
    Ok(Json(updated))
}

#[instrument(skip(state, body), fields(user_id = %user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<UpdatePasswordRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let updated = state
        .users
        .update_password(&user.id.to_string(), &body.old_password, &body.new_password)
        .await?;
    Ok(Json(updated))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn delete_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<StatusCode, AppError> {
    state.users.delete_user(&user.id.to_string()).await?;
    Ok(StatusCode::NO_CONTENT)
}
