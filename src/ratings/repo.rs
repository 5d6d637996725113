use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Rating, RatingSummary};

const RATING_COLUMNS: &str = "id, user_id, recipe_id, stars, created_at, updated_at";

#[async_trait]
pub trait RatingRepo: Send + Sync {
    /// Insert the rating, or on an existing (user, recipe) pair overwrite only
    /// `stars` and `updated_at`. Returns the stored row.
    async fn upsert(&self, rating: &Rating) -> anyhow::Result<Rating>;
    async fn find_by_user_and_recipe(
        &self,
        user_id: Uuid,
        recipe_id: Uuid,
    ) -> anyhow::Result<Option<Rating>>;
    async fn summary(&self, recipe_id: Uuid) -> anyhow::Result<RatingSummary>;
}

pub struct PgRatingRepo {
    db: PgPool,
}

impl PgRatingRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RatingRepo for PgRatingRepo {
    async fn upsert(&self, rating: &Rating) -> anyhow::Result<Rating> {
        let row = sqlx::query_as::<_, Rating>(&format!(
            r#"
            INSERT INTO ratings (id, user_id, recipe_id, stars, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, recipe_id)
            DO UPDATE SET stars = EXCLUDED.stars, updated_at = EXCLUDED.updated_at
            RETURNING {RATING_COLUMNS}
            "#
        ))
        .bind(rating.id)
        .bind(rating.user_id)
        .bind(rating.recipe_id)
        .bind(rating.stars)
        .bind(rating.created_at)
        .bind(rating.updated_at)
        .fetch_one(&self.db)
        .await
        .context("upsert rating")?;
        Ok(row)
    }

    async fn find_by_user_and_recipe(
        &self,
        user_id: Uuid,
        recipe_id: Uuid,
    ) -> anyhow::Result<Option<Rating>> {
        let row = sqlx::query_as::<_, Rating>(&format!(
            "SELECT {RATING_COLUMNS} FROM ratings WHERE user_id = $1 AND recipe_id = $2"
        ))
        .bind(user_id)
        .bind(recipe_id)
        .fetch_optional(&self.db)
        .await
        .context("find rating")?;
        Ok(row)
    }

    async fn summary(&self, recipe_id: Uuid) -> anyhow::Result<RatingSummary> {
        let summary = sqlx::query_as::<_, RatingSummary>(
            r#"
            SELECT COALESCE(AVG(stars)::float8, 0) AS average, COUNT(*) AS count
              FROM ratings
             WHERE recipe_id = $1
            "#,
        )
        .bind(recipe_id)
        .fetch_one(&self.db)
        .await
        .context("aggregate ratings")?;
        Ok(summary)
    }
}
