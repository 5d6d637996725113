use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tracing::{error, info, instrument, warn};

use super::google::new_state;
use crate::{
    error::AppError,
    state::AppState,
    users::dto::{AuthResponse, LoginRequest, RegisterRequest, UserResponse},
};

const STATE_COOKIE: &str = "oauth_state";
const STATE_COOKIE_PATH: &str = "/auth/google";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/auth/google/login", get(google_login))
        .route("/auth/google/callback", get(google_callback))
}

fn issue(state: &AppState, user: UserResponse) -> Result<AuthResponse, AppError> {
    let token = state.jwt.sign(user.id, &user.email, user.role)?;
    Ok(AuthResponse { token, user })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let user = state.users.create_user(payload).await?;
    Ok((StatusCode::CREATED, Json(issue(&state, user)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state
        .users
        .authenticate(&payload.email, &payload.password)
        .await?;
    info!(user_id = %user.id, "user logged in");
    Ok(Json(issue(&state, user)?))
}

/// Redirect to the provider's consent page, remembering a one-off state value
/// in a cookie.
#[instrument(skip(state, jar))]
pub async fn google_login(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let Some(identity) = state.identity.as_ref() else {
        return Err(AppError::not_found("google login is not configured"));
    };
    let oauth_state = new_state();
    let url = identity.authorize_url(&oauth_state)?;
    let cookie = Cookie::build((STATE_COOKIE, oauth_state))
        .path(STATE_COOKIE_PATH)
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(10));
    Ok((jar.add(cookie), Redirect::temporary(&url)).into_response())
}

fn clear_state(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(STATE_COOKIE).path(STATE_COOKIE_PATH))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[instrument(skip(state, jar, params))]
pub async fn google_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Response {
    let frontend = state.config.frontend_url.trim_end_matches('/');
    let fail = |reason: &str| {
        let target = format!("{frontend}/login?error={reason}");
        (clear_state(jar.clone()), Redirect::temporary(&target)).into_response()
    };

    let Some(identity) = state.identity.as_ref() else {
        return fail("google_not_configured");
    };
    if let Some(reason) = params.error.as_deref() {
        warn!(%reason, "google login refused by provider");
        return fail("access_denied");
    }
    let expected = jar.get(STATE_COOKIE).map(|c| c.value_trimmed().to_string());
    if expected.is_none() || expected.as_deref() != params.state.as_deref() {
        warn!("google callback with mismatched state");
        return fail("invalid_state");
    }
    let Some(code) = params.code.as_deref() else {
        return fail("missing_code");
    };

    let federated = match identity.exchange(code).await {
        Ok(f) => f,
        Err(e) => {
            error!(error = ?e, "google code exchange failed");
            return fail("exchange_failed");
        }
    };
    let user = match state.users.login_or_register_federated(federated).await {
        Ok(u) => u,
        Err(e) => {
            warn!(error = %e, "federated login rejected");
            return fail("login_failed");
        }
    };
    let auth = match issue(&state, user) {
        Ok(a) => a,
        Err(e) => {
            error!(error = %e, "session token signing failed");
            return fail("login_failed");
        }
    };

    info!(user_id = %auth.user.id, "user logged in with google");
    let target = format!("{frontend}?token={}", auth.token);
    (clear_state(jar), Redirect::temporary(&target)).into_response()
}
