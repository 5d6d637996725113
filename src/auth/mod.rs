use crate::state::AppState;
use axum::Router;

pub mod google;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod policy;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
