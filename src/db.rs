use std::{str::FromStr, time::Duration};

use anyhow::Context;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};

use crate::config::AppConfig;

/// Open the connection pool. Every statement runs under a server-side
/// `statement_timeout` so a slow store cannot hang a request.
pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let timeout = Duration::from_secs(config.store_timeout_secs);
    let statement_timeout = format!("{}s", config.store_timeout_secs);

    let options = PgConnectOptions::from_str(&config.database_url)
        .context("parse DATABASE_URL")?
        .options([("statement_timeout", statement_timeout.as_str())]);

    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(timeout)
        .connect_with(options)
        .await
        .context("connect to database")
}
