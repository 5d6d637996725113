use std::sync::Arc;

use anyhow::Context;

mod app;
mod auth;
mod comments;
mod config;
mod db;
mod error;
mod ratings;
mod recipes;
mod saved;
mod state;
mod users;

#[cfg(test)]
mod testing;

use crate::{app::build_app, config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "burned=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = Arc::new(AppConfig::from_env()?);
    let pool = db::connect(&config).await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("running database migrations")?;
    tracing::info!("database migrations applied");

    let state = AppState::from_pool(config.clone(), pool)?;
    let app = build_app(state);
    app::serve(app, &config).await
}
